//! WhatsApp provider webhook payload model and normalization.
//!
//! The provider delivers deeply-nested, partially-optional JSON payloads.
//! This crate provides the typed model of those payloads plus the pure
//! helpers that turn them into the canonical fields the storage layer
//! needs: a formatted phone number, a display name, and a message body.
//!
//! # Example
//!
//! ```
//! use whatsapp::normalize;
//!
//! assert_eq!(
//!     normalize::format_phone("5521999998888@s.whatsapp.net"),
//!     "(21) 99999-8888"
//! );
//! assert!(normalize::is_message_event("messages.upsert"));
//! ```

pub mod event;
pub mod normalize;

pub use event::{EventData, ExtendedText, MediaContent, MessageContent, MessageKey, WebhookEvent};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
