//! Message storage operations.
//!
//! Messages are never mutated or deleted by the pipeline; the only
//! write is an insert-if-absent keyed by the provider's message id, so
//! replayed webhook deliveries are no-ops.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, NewMessage};

/// Store a message unless one with the same provider message id
/// already exists.
///
/// Returns the stored row and whether this call inserted it. First
/// successful insert wins; a replay returns the original row with
/// `false`. The insert is a single atomic statement backed by the
/// UNIQUE constraint on `provider_message_id`.
pub async fn insert_message_if_absent(
    pool: &SqlitePool,
    message: &NewMessage,
) -> Result<(Message, bool)> {
    let row = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages
            (contact_id, provider_message_id, chat_id, body, kind,
             from_me, timestamp_ms, status, instance)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(provider_message_id) DO NOTHING
        RETURNING id, contact_id, provider_message_id, chat_id, body, kind,
                  from_me, timestamp_ms, status, instance, created_at
        "#,
    )
    .bind(message.contact_id)
    .bind(&message.provider_message_id)
    .bind(&message.chat_id)
    .bind(&message.body)
    .bind(&message.kind)
    .bind(message.from_me)
    .bind(message.timestamp_ms)
    .bind(&message.status)
    .bind(&message.instance)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(message) => Ok((message, true)),
        // Conflict: an earlier delivery already stored this message.
        None => {
            let existing =
                get_message_by_provider_id(pool, &message.provider_message_id).await?;
            Ok((existing, false))
        }
    }
}

/// Get a message by provider message id.
pub async fn get_message_by_provider_id(
    pool: &SqlitePool,
    provider_message_id: &str,
) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, contact_id, provider_message_id, chat_id, body, kind,
               from_me, timestamp_ms, status, instance, created_at
        FROM messages
        WHERE provider_message_id = ?
        "#,
    )
    .bind(provider_message_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: provider_message_id.to_string(),
    })
}

/// List a contact's messages in chronological order.
///
/// Ordering is by the provider timestamp, not insertion order, so
/// out-of-order deliveries read back as a coherent history.
pub async fn list_messages_for_contact(
    pool: &SqlitePool,
    contact_id: i64,
) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, contact_id, provider_message_id, chat_id, body, kind,
               from_me, timestamp_ms, status, instance, created_at
        FROM messages
        WHERE contact_id = ?
        ORDER BY timestamp_ms ASC, id ASC
        "#,
    )
    .bind(contact_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Count total messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContact;
    use crate::{contact, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn test_contact(db: &Database) -> i64 {
        let contact = contact::upsert_contact(
            db.pool(),
            &NewContact {
                chat_id: "5521999998888@s.whatsapp.net".to_string(),
                name: "João".to_string(),
                phone: "(21) 99999-8888".to_string(),
                is_group: false,
            },
        )
        .await
        .unwrap();
        contact.id
    }

    fn sample_message(contact_id: i64, provider_id: &str, timestamp_ms: i64) -> NewMessage {
        NewMessage {
            contact_id,
            provider_message_id: provider_id.to_string(),
            chat_id: "5521999998888@s.whatsapp.net".to_string(),
            body: "Oi, tem mesa para hoje?".to_string(),
            kind: "conversation".to_string(),
            from_me: false,
            timestamp_ms,
            status: "received".to_string(),
            instance: "restaurante-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_message() {
        let db = test_db().await;
        let contact_id = test_contact(&db).await;

        let (message, inserted) =
            insert_message_if_absent(db.pool(), &sample_message(contact_id, "MSG-1", 1_700_000_000_000))
                .await
                .unwrap();

        assert!(inserted);
        assert_eq!(message.provider_message_id, "MSG-1");
        assert_eq!(message.contact_id, contact_id);
        assert_eq!(count_messages(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_noop() {
        let db = test_db().await;
        let contact_id = test_contact(&db).await;
        let new_message = sample_message(contact_id, "MSG-1", 1_700_000_000_000);

        let (first, inserted) = insert_message_if_absent(db.pool(), &new_message)
            .await
            .unwrap();
        assert!(inserted);

        // Replayed delivery with a different body must not overwrite.
        let mut replay = new_message.clone();
        replay.body = "different body".to_string();
        let (second, inserted) = insert_message_if_absent(db.pool(), &replay).await.unwrap();

        assert!(!inserted);
        assert_eq!(second, first);
        assert_eq!(count_messages(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_delivery() {
        let db = test_db().await;
        let contact_id = test_contact(&db).await;

        // Newer message arrives first.
        insert_message_if_absent(db.pool(), &sample_message(contact_id, "MSG-2", 1_700_000_060_000))
            .await
            .unwrap();
        insert_message_if_absent(db.pool(), &sample_message(contact_id, "MSG-1", 1_700_000_000_000))
            .await
            .unwrap();

        let messages = list_messages_for_contact(db.pool(), contact_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].provider_message_id, "MSG-1");
        assert_eq!(messages[1].provider_message_id, "MSG-2");
    }

    #[tokio::test]
    async fn test_get_message_not_found() {
        let db = test_db().await;

        let result = get_message_by_provider_id(db.pool(), "MSG-404").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
