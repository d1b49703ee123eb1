//! SQLite persistence layer for Mesa.
//!
//! This crate provides async database operations for the contacts and
//! messages written by the webhook ingestion pipeline, using SQLx with
//! SQLite. Both tables carry UNIQUE natural keys (`contacts.chat_id`,
//! `messages.provider_message_id`) so the upsert operations are atomic
//! and safe under concurrent or retried webhook delivery.
//!
//! # Example
//!
//! ```no_run
//! use database::{contact, models::NewContact, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:mesa.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let contact = contact::upsert_contact(
//!         db.pool(),
//!         &NewContact {
//!             chat_id: "5521999998888@s.whatsapp.net".to_string(),
//!             name: "João".to_string(),
//!             phone: "(21) 99999-8888".to_string(),
//!             is_group: false,
//!         },
//!     )
//!     .await?;
//!     println!("contact #{}", contact.id);
//!
//!     Ok(())
//! }
//! ```

pub mod contact;
pub mod error;
pub mod message;
pub mod models;

pub use error::{DatabaseError, Result};
pub use models::{Contact, Message, NewContact, NewMessage};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for concurrent webhook deliveries against a small SQLite file.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for an in-memory database (for testing).
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
