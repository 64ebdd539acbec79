//! Routing of messages that arrive outside the resident panel.
//!
//! An email or WhatsApp message is matched to a resident by the sender's
//! address or phone number, classified by keyword, and filed as an open
//! ticket. Senders nobody recognises still get their ticket, under a
//! provisional author name.

mod mailbox;

pub use mailbox::{check_inbox, InboxReport, Mailbox, SimulatedMailbox};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::model::{NewTicket, TicketCategory, TicketSource, TicketStatus, TicketType, User};
use crate::storage::Storage;

/// Author id recorded for senders without an account.
pub const UNKNOWN_AUTHOR_ID: &str = "unknown";

/// A message delivered by an external channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel the message came through.
    pub source: TicketSource,
    /// Email address or phone number of the sender.
    pub sender: String,
    /// Message body.
    pub content: String,
}

impl InboundMessage {
    /// Create a message.
    #[must_use]
    pub fn new(source: TicketSource, sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source,
            sender: sender.into(),
            content: content.into(),
        }
    }

    /// An email, with the subject folded into the body.
    #[must_use]
    pub fn email(sender: impl Into<String>, subject: &str, body: &str) -> Self {
        Self::new(TicketSource::Email, sender, format!("{subject}: {body}"))
    }
}

/// Knobs for turning a message into a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Characters of the message shown in the ticket title.
    pub title_preview_chars: usize,
    /// Appended to the sender to name an unregistered author.
    pub unregistered_suffix: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestConfig::default().into()
    }
}

impl From<IngestConfig> for IngestSettings {
    fn from(config: IngestConfig) -> Self {
        Self {
            title_preview_chars: config.title_preview_chars,
            unregistered_suffix: config.unregistered_suffix,
        }
    }
}

impl IngestSettings {
    /// Ticket title for a message from `source`.
    #[must_use]
    pub fn title_for(&self, source: TicketSource, content: &str) -> String {
        let preview: String = content.chars().take(self.title_preview_chars).collect();
        format!("{} Bildirimi: {preview}...", source.label())
    }

    fn provisional_name(&self, sender: &str) -> String {
        format!("{sender} {}", self.unregistered_suffix)
    }
}

/// What became of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// The ticket that was filed.
    pub ticket_id: i64,
    /// The resident the sender resolved to, if any.
    pub matched_user: Option<User>,
    /// Classified type.
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Classified category.
    pub category: TicketCategory,
    /// One-line summary for the operator.
    pub message: String,
}

/// File `message` as an open ticket.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the sender or content is blank, or a
/// storage error if the ticket cannot be saved.
pub fn process_incoming_message(
    storage: &Storage,
    classifier: &Classifier,
    settings: &IngestSettings,
    message: &InboundMessage,
) -> Result<IngestOutcome> {
    let sender = message.sender.trim();
    if sender.is_empty() {
        return Err(Error::invalid_input("sender must not be empty"));
    }
    if message.content.trim().is_empty() {
        return Err(Error::invalid_input("message content must not be empty"));
    }

    let matched_user = storage.find_user_by_contact(sender)?;
    let (author_id, author_name) = match &matched_user {
        Some(user) => (user.id.clone(), user.name.clone()),
        None => (UNKNOWN_AUTHOR_ID.to_string(), settings.provisional_name(sender)),
    };
    debug!(
        sender,
        matched = matched_user.is_some(),
        "Resolved inbound sender"
    );

    let classification = classifier.classify(&message.content);
    let ticket = storage.create_ticket(&NewTicket {
        title: settings.title_for(message.source, &message.content),
        description: message.content.clone(),
        ticket_type: classification.ticket_type,
        category: classification.category,
        status: TicketStatus::Open,
        source: message.source,
        author_id,
        author_name,
    })?;

    let recorded = format!(
        "{} ({})",
        classification.ticket_type.label(),
        classification.category.label()
    );
    let summary = match &matched_user {
        Some(user) => format!("User found ({}). Recorded as {recorded}.", user.name),
        None => {
            format!("No matching user. Recorded as {recorded} for an unregistered sender.")
        }
    };
    info!(
        ticket_id = ticket.id,
        source = %message.source,
        "Ingested message"
    );

    Ok(IngestOutcome {
        ticket_id: ticket.id,
        matched_user,
        ticket_type: classification.ticket_type,
        category: classification.category,
        message: summary,
    })
}
