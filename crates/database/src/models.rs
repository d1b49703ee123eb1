//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A chat contact, keyed by the provider's opaque chat identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    /// Internal row id; messages reference this, not the chat id.
    pub id: i64,
    /// Provider-assigned chat identifier (individual or group jid).
    pub chat_id: String,
    /// Display name from the provider's push name.
    pub name: String,
    /// Formatted phone number, or the raw chat id when unformattable.
    pub phone: String,
    /// Whether the chat identifier denotes a group.
    pub is_group: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Fields for creating or refreshing a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub chat_id: String,
    pub name: String,
    pub phone: String,
    pub is_group: bool,
}

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Internal row id.
    pub id: i64,
    /// Owning contact's internal id.
    pub contact_id: i64,
    /// Provider-assigned message id, unique per instance.
    pub provider_message_id: String,
    /// Chat identifier the message belongs to.
    pub chat_id: String,
    /// Extracted text body.
    pub body: String,
    /// Message kind (e.g., "conversation", "imageMessage").
    pub kind: String,
    /// Direction flag: true for outbound.
    pub from_me: bool,
    /// Message timestamp in epoch milliseconds.
    pub timestamp_ms: i64,
    /// Delivery status (defaults to "received").
    pub status: String,
    /// Provider instance that received the message.
    pub instance: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for storing a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub contact_id: i64,
    pub provider_message_id: String,
    pub chat_id: String,
    pub body: String,
    pub kind: String,
    pub from_me: bool,
    pub timestamp_ms: i64,
    pub status: String,
    pub instance: String,
}
