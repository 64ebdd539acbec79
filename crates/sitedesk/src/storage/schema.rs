//! `SQLite` schema definitions for sitedesk.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    email TEXT,
    phone TEXT
)
";

/// SQL statement to create the tickets table.
pub const CREATE_TICKETS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    ticket_type TEXT NOT NULL,
    category TEXT NOT NULL,
    status TEXT NOT NULL,
    source TEXT NOT NULL,
    author_id TEXT NOT NULL,
    author_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the comments table.
pub const CREATE_COMMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id INTEGER NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
    author_id TEXT NOT NULL,
    author_name TEXT NOT NULL,
    author_role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Index for newest-first ticket listing.
pub const CREATE_TICKETS_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_created ON tickets(created_at DESC)
";

/// Index for the per-resident ticket view.
pub const CREATE_TICKETS_AUTHOR_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_author ON tickets(author_id)
";

/// Index for status filtering.
pub const CREATE_TICKETS_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status)
";

/// Index for loading a ticket's comments.
pub const CREATE_COMMENTS_TICKET_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_comments_ticket ON comments(ticket_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_TICKETS_TABLE,
    CREATE_COMMENTS_TABLE,
    CREATE_TICKETS_CREATED_INDEX,
    CREATE_TICKETS_AUTHOR_INDEX,
    CREATE_TICKETS_STATUS_INDEX,
    CREATE_COMMENTS_TICKET_INDEX,
    CREATE_METADATA_TABLE,
];
