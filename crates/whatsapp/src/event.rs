//! Webhook event types delivered by the WhatsApp provider.

use serde::{Deserialize, Serialize};

/// A webhook event as POSTed by the provider.
///
/// Every field is defaulted so partially-formed payloads still
/// deserialize; validating the minimal required shape (presence of
/// `data.key`) is the pipeline's job, not serde's.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event type name (e.g., "messages.upsert").
    #[serde(default)]
    pub event: String,

    /// Name of the provider instance that received the message.
    #[serde(default)]
    pub instance: String,

    /// Event payload.
    #[serde(default)]
    pub data: Option<EventData>,
}

/// Payload of a message event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Message key identifying chat, direction, and message id.
    #[serde(default)]
    pub key: Option<MessageKey>,

    /// Sender's display name ("push name") if the provider knows it.
    #[serde(default)]
    pub push_name: Option<String>,

    /// Message content. Absent for some event shapes.
    #[serde(default)]
    pub message: Option<MessageContent>,

    /// Provider message kind (e.g., "conversation", "imageMessage").
    #[serde(default)]
    pub message_type: String,

    /// Message timestamp in epoch seconds.
    #[serde(default)]
    pub message_timestamp: i64,

    /// Delivery status reported by the provider.
    #[serde(default)]
    pub status: Option<String>,

    /// Whether the message was sent by the account itself.
    #[serde(default)]
    pub from_me: bool,
}

/// Key structure identifying one message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Opaque chat identifier (individual or group jid).
    #[serde(default)]
    pub remote_jid: String,

    /// Whether the message was sent by the account itself.
    #[serde(default)]
    pub from_me: bool,

    /// Provider-assigned message id, unique per instance.
    #[serde(default)]
    pub id: String,
}

/// Message body. The actual text lives in exactly one of several
/// mutually-exclusive optional fields depending on the message kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// Plain conversation text.
    #[serde(default)]
    pub conversation: Option<String>,

    /// Text with link previews or formatting metadata.
    #[serde(default)]
    pub extended_text_message: Option<ExtendedText>,

    /// Image attachment, possibly captioned.
    #[serde(default)]
    pub image_message: Option<MediaContent>,

    /// Video attachment, possibly captioned.
    #[serde(default)]
    pub video_message: Option<MediaContent>,

    /// Document attachment, possibly captioned.
    #[serde(default)]
    pub document_message: Option<MediaContent>,
}

/// Extended text payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedText {
    /// The message text.
    #[serde(default)]
    pub text: String,
}

/// A media attachment; only the caption matters for ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    /// Caption text, if any.
    #[serde(default)]
    pub caption: Option<String>,
}
