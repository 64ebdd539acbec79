//! `sitedesk` - A complaint and request desk for a housing complex
//!
//! Residents file tickets about their building and follow the replies;
//! administrators triage them, register residents, and route incoming
//! email and WhatsApp messages into tickets with keyword-based
//! classification.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod classifier;
pub mod cli;
pub mod config;
pub mod desk;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod storage;

pub use classifier::{Classification, Classifier};
pub use config::Config;
pub use desk::{Desk, TicketDraft};
pub use error::{Error, Result};
pub use ingest::{InboundMessage, IngestOutcome, IngestSettings, Mailbox, SimulatedMailbox};
pub use logging::init_logging;
pub use model::{
    Comment, NewUser, Ticket, TicketCategory, TicketSource, TicketStatus, TicketType, User,
    UserRole,
};
pub use storage::{Storage, StorageStats, TicketFilter, TicketStats};
