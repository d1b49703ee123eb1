//! Contact upsert and lookup operations.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Contact, NewContact};

/// Ensure exactly one contact row exists for a chat identifier.
///
/// A single atomic statement: inserts the contact, or refreshes the
/// name and update timestamp when one already exists under a different
/// name. An unchanged name is a no-write. Concurrent deliveries for
/// the same new chat id resolve through the UNIQUE constraint rather
/// than a lookup-then-insert pair.
pub async fn upsert_contact(pool: &SqlitePool, contact: &NewContact) -> Result<Contact> {
    let row = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (chat_id, name, phone, is_group)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET
            name = excluded.name,
            updated_at = datetime('now')
        WHERE contacts.name <> excluded.name
        RETURNING id, chat_id, name, phone, is_group, created_at, updated_at
        "#,
    )
    .bind(&contact.chat_id)
    .bind(&contact.name)
    .bind(&contact.phone)
    .bind(contact.is_group)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(contact) => Ok(contact),
        // The conditional update was skipped: the stored row already
        // carries this name.
        None => {
            debug!(chat_id = %contact.chat_id, "contact unchanged");
            get_contact_by_chat_id(pool, &contact.chat_id).await
        }
    }
}

/// Get a contact by internal id.
pub async fn get_contact(pool: &SqlitePool, id: i64) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, chat_id, name, phone, is_group, created_at, updated_at
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Contact",
        id: id.to_string(),
    })
}

/// Get a contact by chat identifier.
pub async fn get_contact_by_chat_id(pool: &SqlitePool, chat_id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, chat_id, name, phone, is_group, created_at, updated_at
        FROM contacts
        WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Contact",
        id: chat_id.to_string(),
    })
}

/// List all contacts, most recently active first.
pub async fn list_contacts(pool: &SqlitePool) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, chat_id, name, phone, is_group, created_at, updated_at
        FROM contacts
        ORDER BY updated_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Count total contacts.
pub async fn count_contacts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM contacts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn joao() -> NewContact {
        NewContact {
            chat_id: "5521999998888@s.whatsapp.net".to_string(),
            name: "João".to_string(),
            phone: "(21) 99999-8888".to_string(),
            is_group: false,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_contact() {
        let db = test_db().await;

        let contact = upsert_contact(db.pool(), &joao()).await.unwrap();
        assert_eq!(contact.chat_id, "5521999998888@s.whatsapp.net");
        assert_eq!(contact.name, "João");
        assert_eq!(contact.phone, "(21) 99999-8888");
        assert!(!contact.is_group);
        assert_eq!(count_contacts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_updates_name_without_second_row() {
        let db = test_db().await;

        let first = upsert_contact(db.pool(), &joao()).await.unwrap();

        let renamed = NewContact {
            name: "João Silva".to_string(),
            ..joao()
        };
        let second = upsert_contact(db.pool(), &renamed).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "João Silva");
        assert_eq!(count_contacts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_unchanged_name_is_noop() {
        let db = test_db().await;

        let first = upsert_contact(db.pool(), &joao()).await.unwrap();
        let second = upsert_contact(db.pool(), &joao()).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(count_contacts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_contact_not_found() {
        let db = test_db().await;

        let result = get_contact_by_chat_id(db.pool(), "none@s.whatsapp.net").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = get_contact(db.pool(), 42).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_contacts() {
        let db = test_db().await;

        upsert_contact(db.pool(), &joao()).await.unwrap();
        upsert_contact(
            db.pool(),
            &NewContact {
                chat_id: "120363041234567890@g.us".to_string(),
                name: "Equipe Salão".to_string(),
                phone: "120363041234567890@g.us".to_string(),
                is_group: true,
            },
        )
        .await
        .unwrap();

        let contacts = list_contacts(db.pool()).await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().any(|c| c.is_group));
    }
}
