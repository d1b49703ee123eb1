//! Pure payload normalization: phone formatting, text extraction,
//! event classification.
//!
//! All functions here are total. Every input shape produces some
//! output; unrecognized shapes fall back to lenient display defaults
//! rather than errors.

use crate::event::MessageContent;

/// Suffix the provider appends to individual chat identifiers.
const INDIVIDUAL_SUFFIX: &str = "@s.whatsapp.net";

/// Suffix the provider appends to group chat identifiers.
const GROUP_SUFFIX: &str = "@g.us";

/// Brazilian country calling code.
const COUNTRY_CODE: &str = "55";

/// Body stored for media messages that carry no caption.
pub const MEDIA_PLACEHOLDER: &str = "[Mídia]";

/// Display name stored when the provider sends no push name.
pub const DEFAULT_CONTACT_NAME: &str = "Contato";

/// Message kind stored when the provider sends none.
pub const DEFAULT_MESSAGE_KIND: &str = "text";

/// Delivery status stored when the provider sends none.
pub const DEFAULT_STATUS: &str = "received";

/// Event names the provider uses for a new inbound message. The
/// provider emits several synonymous spellings for the same semantic
/// event; all are treated as equivalent.
const MESSAGE_EVENTS: [&str; 3] = ["messages.upsert", "MESSAGES_UPSERT", "message.upsert"];

/// Whether an event name denotes a new message.
pub fn is_message_event(event: &str) -> bool {
    MESSAGE_EVENTS.contains(&event)
}

/// Whether a chat identifier denotes a group chat.
pub fn is_group(chat_id: &str) -> bool {
    chat_id.ends_with(GROUP_SUFFIX)
}

/// Format an individual Brazilian mobile jid as a display phone number.
///
/// `5521999998888@s.whatsapp.net` becomes `(21) 99999-8888` and
/// `552199998888@s.whatsapp.net` becomes `(21) 9999-8888`. Anything
/// else (group jids, foreign numbers, unrecognized lengths) is
/// returned unchanged; this is a display fallback, not a validated
/// phone number.
pub fn format_phone(chat_id: &str) -> String {
    let Some(digits) = chat_id.strip_suffix(INDIVIDUAL_SUFFIX) else {
        return chat_id.to_string();
    };

    if !digits.starts_with(COUNTRY_CODE) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return chat_id.to_string();
    }

    // Country code + 2-digit area code + 8 or 9 digit subscriber number.
    let local = &digits[COUNTRY_CODE.len()..];
    if local.len() != 10 && local.len() != 11 {
        return chat_id.to_string();
    }

    let area = &local[..2];
    let subscriber = &local[2..];
    let split = subscriber.len() - 4;
    format!("({}) {}-{}", area, &subscriber[..split], &subscriber[split..])
}

/// Extract the text body from a message object.
///
/// The body lives in exactly one of several optional fields; they are
/// tried in a fixed priority order. A message object with none of them
/// yields the media placeholder; a missing message object yields an
/// empty string.
pub fn extract_text(message: Option<&MessageContent>) -> String {
    let Some(message) = message else {
        return String::new();
    };

    if let Some(text) = non_empty(message.conversation.as_deref()) {
        return text.to_string();
    }
    if let Some(extended) = &message.extended_text_message {
        if let Some(text) = non_empty(Some(&extended.text)) {
            return text.to_string();
        }
    }
    for media in [
        &message.image_message,
        &message.video_message,
        &message.document_message,
    ]
    .into_iter()
    .flatten()
    {
        if let Some(caption) = non_empty(media.caption.as_deref()) {
            return caption.to_string();
        }
    }

    MEDIA_PLACEHOLDER.to_string()
}

/// Resolve the stored display name from an optional push name.
pub fn display_name(push_name: Option<&str>) -> String {
    match non_empty(push_name) {
        Some(name) => name.to_string(),
        None => DEFAULT_CONTACT_NAME.to_string(),
    }
}

/// Resolve the stored message kind from the provider's message type.
pub fn message_kind(message_type: &str) -> String {
    match non_empty(Some(message_type)) {
        Some(kind) => kind.to_string(),
        None => DEFAULT_MESSAGE_KIND.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExtendedText, MediaContent};

    #[test]
    fn test_format_phone_nine_digit_subscriber() {
        assert_eq!(
            format_phone("5521999998888@s.whatsapp.net"),
            "(21) 99999-8888"
        );
    }

    #[test]
    fn test_format_phone_eight_digit_subscriber() {
        assert_eq!(format_phone("552199998888@s.whatsapp.net"), "(21) 9999-8888");
    }

    #[test]
    fn test_format_phone_group_unchanged() {
        let group = "120363041234567890@g.us";
        assert_eq!(format_phone(group), group);
    }

    #[test]
    fn test_format_phone_foreign_number_unchanged() {
        let foreign = "4915112345678@s.whatsapp.net";
        assert_eq!(format_phone(foreign), foreign);
    }

    #[test]
    fn test_format_phone_odd_length_unchanged() {
        let short = "5521999@s.whatsapp.net";
        assert_eq!(format_phone(short), short);
    }

    #[test]
    fn test_is_group() {
        assert!(is_group("120363041234567890@g.us"));
        assert!(!is_group("5521999998888@s.whatsapp.net"));
    }

    #[test]
    fn test_is_message_event_synonyms() {
        assert!(is_message_event("messages.upsert"));
        assert!(is_message_event("MESSAGES_UPSERT"));
        assert!(is_message_event("message.upsert"));
        assert!(!is_message_event("connection.update"));
        assert!(!is_message_event(""));
    }

    #[test]
    fn test_extract_text_conversation_wins() {
        let message = MessageContent {
            conversation: Some("plain text".to_string()),
            extended_text_message: Some(ExtendedText {
                text: "extended text".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(extract_text(Some(&message)), "plain text");
    }

    #[test]
    fn test_extract_text_extended_fallback() {
        let message = MessageContent {
            extended_text_message: Some(ExtendedText {
                text: "extended text".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(extract_text(Some(&message)), "extended text");
    }

    #[test]
    fn test_extract_text_image_caption() {
        let message = MessageContent {
            image_message: Some(MediaContent {
                caption: Some("look at this".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(extract_text(Some(&message)), "look at this");
    }

    #[test]
    fn test_extract_text_uncaptioned_media_placeholder() {
        let message = MessageContent {
            image_message: Some(MediaContent { caption: None }),
            ..Default::default()
        };
        assert_eq!(extract_text(Some(&message)), MEDIA_PLACEHOLDER);
    }

    #[test]
    fn test_extract_text_empty_message_placeholder() {
        assert_eq!(extract_text(Some(&MessageContent::default())), MEDIA_PLACEHOLDER);
    }

    #[test]
    fn test_extract_text_missing_message_empty() {
        assert_eq!(extract_text(None), "");
    }

    #[test]
    fn test_display_name_defaults() {
        assert_eq!(display_name(Some("João Silva")), "João Silva");
        assert_eq!(display_name(Some("  ")), DEFAULT_CONTACT_NAME);
        assert_eq!(display_name(None), DEFAULT_CONTACT_NAME);
    }

    #[test]
    fn test_message_kind_defaults() {
        assert_eq!(message_kind("imageMessage"), "imageMessage");
        assert_eq!(message_kind(""), DEFAULT_MESSAGE_KIND);
    }
}
