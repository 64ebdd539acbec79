//! Role-aware operations on top of storage.
//!
//! Every operation that acts on behalf of somebody takes the acting
//! [`User`]. Residents see and comment on their own tickets only; status
//! changes, account management and message intake are for admins.

use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::ingest::{
    self, InboundMessage, InboxReport, IngestOutcome, IngestSettings, Mailbox,
};
use crate::model::{
    NewComment, NewTicket, NewUser, Ticket, TicketCategory, TicketSource, TicketStatus,
    TicketType, User,
};
use crate::storage::{BatchReport, Storage, TicketFilter, TicketStats};

/// A ticket as typed into the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDraft {
    /// Short summary.
    pub title: String,
    /// Full text.
    pub description: String,
    /// Explicit type; detected from the text when absent.
    pub ticket_type: Option<TicketType>,
    /// Explicit category; detected from the text when absent.
    pub category: Option<TicketCategory>,
}

/// The ticket desk.
#[derive(Debug)]
pub struct Desk {
    storage: Storage,
    classifier: Classifier,
    settings: IngestSettings,
}

impl Desk {
    /// Create a desk over `storage`.
    #[must_use]
    pub fn new(storage: Storage, settings: IngestSettings) -> Self {
        Self {
            storage,
            classifier: Classifier::new(),
            settings,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Log in and remember the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if the username and password
    /// don't match an account.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.storage.authenticate(username, password)? else {
            warn!(username, "Failed login");
            return Err(Error::InvalidCredentials);
        };
        self.storage.save_session(&user.id)?;
        info!(username, role = %user.role, "Logged in");
        Ok(user)
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn logout(&self) -> Result<()> {
        self.storage.clear_session()
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if there is no session.
    pub fn current_user(&self) -> Result<User> {
        self.storage.session()?.ok_or(Error::NotLoggedIn)
    }

    /// File a ticket from the panel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the title or description is blank.
    pub fn submit_ticket(&self, actor: &User, draft: &TicketDraft) -> Result<Ticket> {
        let title = draft.title.trim();
        let description = draft.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(Error::invalid_input("title and description are required"));
        }

        let text = format!("{title} {description}");
        let ticket_type = draft
            .ticket_type
            .unwrap_or_else(|| self.classifier.classify_type(&text));
        let category = draft
            .category
            .unwrap_or_else(|| self.classifier.classify_category(&text));

        self.storage.create_ticket(&NewTicket {
            title: title.to_string(),
            description: description.to_string(),
            ticket_type,
            category,
            status: TicketStatus::Open,
            source: TicketSource::Web,
            author_id: actor.id.clone(),
            author_name: actor.name.clone(),
        })
    }

    /// Tickets `actor` may see that match `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn visible_tickets(&self, actor: &User, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.storage.query_tickets(&scoped(actor, filter))
    }

    /// Open one ticket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TicketNotFound`] if it doesn't exist, or
    /// [`Error::PermissionDenied`] if a resident asks for someone else's.
    pub fn ticket(&self, actor: &User, id: i64) -> Result<Ticket> {
        let ticket = self
            .storage
            .ticket(id)?
            .ok_or(Error::TicketNotFound { id })?;
        ensure_can_view(actor, &ticket)?;
        Ok(ticket)
    }

    /// Reply to a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank comment, plus the errors of
    /// [`Desk::ticket`].
    pub fn comment(&self, actor: &User, id: i64, content: &str) -> Result<Ticket> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::invalid_input("comment must not be empty"));
        }
        self.ticket(actor, id)?;

        self.storage
            .add_comment(id, &NewComment::by(actor, content))?
            .ok_or(Error::TicketNotFound { id })
    }

    /// Move a ticket to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents and
    /// [`Error::TicketNotFound`] for unknown tickets.
    pub fn set_status(&self, actor: &User, id: i64, status: TicketStatus) -> Result<Ticket> {
        ensure_admin(actor, "change ticket status")?;
        self.storage
            .update_ticket_status(id, status)?
            .ok_or(Error::TicketNotFound { id })
    }

    /// All accounts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents.
    pub fn users(&self, actor: &User) -> Result<Vec<User>> {
        ensure_admin(actor, "list users")?;
        self.storage.users()
    }

    /// Register a resident.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents,
    /// [`Error::InvalidInput`] if a required field is blank, and
    /// [`Error::UsernameTaken`] for a duplicate username.
    pub fn create_user(&self, actor: &User, new_user: &NewUser) -> Result<User> {
        ensure_admin(actor, "create users")?;
        if !new_user.is_complete() {
            return Err(Error::invalid_input(
                "name, username and password are required",
            ));
        }
        self.storage.create_user(new_user)
    }

    /// Register many residents at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents.
    pub fn import_users(&self, actor: &User, rows: &[NewUser]) -> Result<BatchReport> {
        ensure_admin(actor, "import users")?;
        self.storage.create_users_batch(rows)
    }

    /// Set a new password for `username`. Needs no session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for blank fields and
    /// [`Error::UserNotFound`] for an unknown username.
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<()> {
        if username.trim().is_empty() || new_password.is_empty() {
            return Err(Error::invalid_input("username and new password are required"));
        }
        if self.storage.reset_password(username, new_password)? {
            Ok(())
        } else {
            Err(Error::UserNotFound {
                username: username.to_string(),
            })
        }
    }

    /// File an email or WhatsApp message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents, plus the errors of
    /// [`ingest::process_incoming_message`].
    pub fn ingest(&self, actor: &User, message: &InboundMessage) -> Result<IngestOutcome> {
        ensure_admin(actor, "ingest messages")?;
        ingest::process_incoming_message(&self.storage, &self.classifier, &self.settings, message)
    }

    /// Poll the management inbox once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] for residents, plus the errors of
    /// [`ingest::check_inbox`].
    pub async fn check_inbox(&self, actor: &User, mailbox: &dyn Mailbox) -> Result<InboxReport> {
        ensure_admin(actor, "check the inbox")?;
        ingest::check_inbox(&self.storage, &self.classifier, &self.settings, mailbox).await
    }

    /// Dashboard counts over the tickets `actor` may see.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, actor: &User) -> Result<TicketStats> {
        self.storage
            .ticket_stats(&scoped(actor, &TicketFilter::default()))
    }
}

/// `filter`, narrowed to the actor's own tickets unless they are an admin.
fn scoped(actor: &User, filter: &TicketFilter) -> TicketFilter {
    if actor.is_admin() {
        filter.clone()
    } else {
        filter.clone().with_author(actor.id.clone())
    }
}

fn ensure_admin(actor: &User, action: &str) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        warn!(user = %actor.username, action, "Permission denied");
        Err(Error::permission_denied(action))
    }
}

fn ensure_can_view(actor: &User, ticket: &Ticket) -> Result<()> {
    if actor.is_admin() || ticket.author_id == actor.id {
        Ok(())
    } else {
        Err(Error::permission_denied(format!("view ticket {}", ticket.id)))
    }
}
