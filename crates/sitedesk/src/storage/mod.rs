//! Storage layer for sitedesk.
//!
//! This module provides `SQLite`-based persistent storage for users,
//! tickets and comments, plus the single-user session the CLI keeps
//! between invocations.

pub mod migrations;
pub mod schema;
mod seed;
mod tickets;
mod users;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use tickets::{TicketFilter, TicketStats};
pub use users::{BatchReport, RowError};

/// Metadata key holding the id of the logged-in user.
const SESSION_KEY: &str = "session_user_id";

/// Storage engine for the ticket desk.
///
/// Provides persistent storage using `SQLite` with support for:
/// - User accounts and contact lookup
/// - Tickets with comments
/// - Filtering and dashboard counts
/// - A persisted login session
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed the demo accounts and tickets into empty tables.
    ///
    /// Tables that already hold rows are left untouched. Returns `true` if
    /// anything was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_demo_data(&self) -> Result<bool> {
        seed::seed_if_empty(self)
    }

    /// Remember `user_id` as the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_session(&self, user_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (SESSION_KEY, user_id),
        )?;
        debug!(user_id, "Session saved");
        Ok(())
    }

    /// Get the logged-in user, if any.
    ///
    /// A session that points to a user who no longer exists reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn session(&self) -> Result<Option<crate::model::User>> {
        let user_id: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [SESSION_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) => self.user_by_id(&id),
            None => Ok(None),
        }
    }

    /// Forget the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_session(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM metadata WHERE key = ?1", [SESSION_KEY])?;
        debug!("Session cleared");
        Ok(())
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            users: count("users")?,
            tickets: count("tickets")?,
            comments: count("comments")?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of registered users.
    pub users: i64,
    /// Number of tickets.
    pub tickets: i64,
    /// Number of comments across all tickets.
    pub comments: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Format a timestamp for storage.
///
/// Fixed-width so that string order equals time order.
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to now for corrupt values.
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| {
            tracing::warn!("Unparseable timestamp {value:?}, using now");
            Utc::now()
        },
        |dt| dt.with_timezone(&Utc),
    )
}
