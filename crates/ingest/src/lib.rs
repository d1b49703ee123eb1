//! The webhook ingestion pipeline.
//!
//! One implementation of normalize → contact upsert → message upsert,
//! invoked by whatever transport adapter receives the provider event.
//! Adapters do request parsing and response formatting only; every
//! storage decision lives here.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//! use ingest::{Ingestor, Outcome};
//! use whatsapp::WebhookEvent;
//!
//! # async fn example(event: WebhookEvent) -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:mesa.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let ingestor = Ingestor::new(db);
//! match ingestor.ingest(&event).await? {
//!     Outcome::Ignored { event } => println!("ignored {event}"),
//!     Outcome::Stored(ingested) => println!("contact #{}", ingested.contact.id),
//! }
//! # Ok(())
//! # }
//! ```

use database::{contact, message, Contact, Database, DatabaseError, Message, NewContact, NewMessage};
use thiserror::Error;
use tracing::{debug, error, info};
use whatsapp::normalize;
use whatsapp::WebhookEvent;

/// Errors that abort a webhook delivery.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload lacked the minimal required envelope shape. Nothing
    /// was written; the adapter should reject the delivery outright.
    #[error("malformed payload: {0}")]
    Malformed(&'static str),

    /// Storage failure while resolving the contact. The remaining
    /// pipeline steps are skipped; the provider is expected to retry.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Outcome of handling one webhook delivery.
#[derive(Debug)]
pub enum Outcome {
    /// Event type is not a new-message event; acknowledged without
    /// touching storage.
    Ignored { event: String },

    /// Event was processed through the pipeline.
    Stored(Ingested),
}

/// Records produced by a processed delivery.
#[derive(Debug)]
pub struct Ingested {
    /// The resolved contact (created or refreshed).
    pub contact: Contact,

    /// The stored message, or `None` when the message step failed
    /// after the contact was already saved (partial success).
    pub message: Option<Message>,

    /// True when the message id had already been stored by an earlier
    /// delivery and this one was a no-op replay.
    pub duplicate: bool,
}

/// The ingestion pipeline, dependency-injected with its storage.
///
/// Stateless across requests; cloning shares the underlying pool.
#[derive(Clone)]
pub struct Ingestor {
    db: Database,
}

impl Ingestor {
    /// Create a pipeline over the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Handle one webhook delivery.
    ///
    /// At most four database round trips: one contact write, one
    /// contact read fallback, one message write, one message read
    /// fallback.
    pub async fn ingest(&self, event: &WebhookEvent) -> Result<Outcome, IngestError> {
        if !normalize::is_message_event(&event.event) {
            if event.event.is_empty() {
                return Err(IngestError::Malformed("missing event type"));
            }
            debug!(event = %event.event, "ignoring non-message event");
            return Ok(Outcome::Ignored {
                event: event.event.clone(),
            });
        }

        let data = event
            .data
            .as_ref()
            .ok_or(IngestError::Malformed("missing data.key"))?;
        let key = data
            .key
            .as_ref()
            .filter(|k| !k.remote_jid.is_empty())
            .ok_or(IngestError::Malformed("missing data.key"))?;

        let chat_id = key.remote_jid.clone();
        let new_contact = NewContact {
            chat_id: chat_id.clone(),
            name: normalize::display_name(data.push_name.as_deref()),
            phone: normalize::format_phone(&chat_id),
            is_group: normalize::is_group(&chat_id),
        };
        let stored_contact = contact::upsert_contact(self.db.pool(), &new_contact).await?;

        let new_message = NewMessage {
            contact_id: stored_contact.id,
            provider_message_id: key.id.clone(),
            chat_id,
            body: normalize::extract_text(data.message.as_ref()),
            kind: normalize::message_kind(&data.message_type),
            from_me: key.from_me || data.from_me,
            // Provider timestamps are epoch seconds. Saturate rather
            // than overflow on garbage input; the pipeline stays total.
            timestamp_ms: data.message_timestamp.saturating_mul(1000),
            status: data
                .status
                .clone()
                .unwrap_or_else(|| normalize::DEFAULT_STATUS.to_string()),
            instance: event.instance.clone(),
        };

        match message::insert_message_if_absent(self.db.pool(), &new_message).await {
            Ok((stored_message, inserted)) => {
                if inserted {
                    info!(
                        contact_id = stored_contact.id,
                        provider_message_id = %stored_message.provider_message_id,
                        "message stored"
                    );
                } else {
                    debug!(
                        provider_message_id = %stored_message.provider_message_id,
                        "duplicate delivery, message already stored"
                    );
                }
                Ok(Outcome::Stored(Ingested {
                    contact: stored_contact,
                    message: Some(stored_message),
                    duplicate: !inserted,
                }))
            }
            // Partial success: the contact is saved but the message is
            // not. Surfaced as a missing message rather than an error
            // so the adapter can report it distinctly.
            Err(e) => {
                error!(
                    contact_id = stored_contact.id,
                    provider_message_id = %key.id,
                    error = %e,
                    "message step failed after contact upsert"
                );
                Ok(Outcome::Stored(Ingested {
                    contact: stored_contact,
                    message: None,
                    duplicate: false,
                }))
            }
        }
    }
}
