//! Tickets and their comments.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{format_timestamp, parse_timestamp, Storage};
use crate::error::Result;
use crate::model::{
    Comment, NewComment, NewTicket, Ticket, TicketCategory, TicketSource, TicketStatus,
    TicketType, UserRole,
};

const TICKET_COLUMNS: &str = "id, title, description, ticket_type, category, status, source, \
                              author_id, author_name, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, ticket_id, author_id, author_name, author_role, content, created_at";

/// Criteria for listing tickets. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Only tickets in this state.
    pub status: Option<TicketStatus>,
    /// Only tickets of this type.
    pub ticket_type: Option<TicketType>,
    /// Only tickets in this category.
    pub category: Option<TicketCategory>,
    /// Only tickets filed by this user id.
    pub author_id: Option<String>,
    /// Case-insensitive text that must appear in the title or description.
    pub search: Option<String>,
}

impl TicketFilter {
    /// A filter that matches every ticket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a status.
    #[must_use]
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a type.
    #[must_use]
    pub fn with_type(mut self, ticket_type: TicketType) -> Self {
        self.ticket_type = Some(ticket_type);
        self
    }

    /// Restrict to a category.
    #[must_use]
    pub fn with_category(mut self, category: TicketCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to tickets filed by `author_id`.
    #[must_use]
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Restrict to tickets mentioning `term`.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    fn matches_search(&self, ticket: &Ticket) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let term = term.to_lowercase();
        ticket.title.to_lowercase().contains(&term)
            || ticket.description.to_lowercase().contains(&term)
    }
}

/// Dashboard counts over a set of tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    /// Number of tickets counted.
    pub total: usize,
    /// Tickets per status; every status is present.
    pub by_status: BTreeMap<TicketStatus, usize>,
    /// Tickets per type; every type is present.
    pub by_type: BTreeMap<TicketType, usize>,
    /// Tickets per category; every category is present.
    pub by_category: BTreeMap<TicketCategory, usize>,
}

impl TicketStats {
    /// Count `tickets`.
    #[must_use]
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut by_status: BTreeMap<_, _> = TicketStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_type: BTreeMap<_, _> = TicketType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut by_category: BTreeMap<_, _> =
            TicketCategory::ALL.iter().map(|c| (*c, 0)).collect();

        for ticket in tickets {
            *by_status.entry(ticket.status).or_insert(0) += 1;
            *by_type.entry(ticket.ticket_type).or_insert(0) += 1;
            *by_category.entry(ticket.category).or_insert(0) += 1;
        }

        Self {
            total: tickets.len(),
            by_status,
            by_type,
            by_category,
        }
    }
}

impl Storage {
    /// Get all tickets, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn tickets(&self) -> Result<Vec<Ticket>> {
        self.query_tickets(&TicketFilter::default())
    }

    /// Get a ticket with its comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1");
        let ticket = self.conn.query_row(&sql, [id], row_to_ticket).optional()?;

        match ticket {
            Some(mut ticket) => {
                ticket.comments = self.comments_for(id)?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    /// Get tickets matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn query_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        let mut push = |column: &str, value: String| {
            values.push(value);
            clauses.push(format!("{column} = ?{}", values.len()));
        };
        if let Some(status) = filter.status {
            push("status", status.as_str().to_string());
        }
        if let Some(ticket_type) = filter.ticket_type {
            push("ticket_type", ticket_type.as_str().to_string());
        }
        if let Some(category) = filter.category {
            push("category", category.as_str().to_string());
        }
        if let Some(author_id) = &filter.author_id {
            push("author_id", author_id.clone());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets {where_clause} ORDER BY created_at DESC, id DESC"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut tickets = stmt
            .query_map(params_from_iter(values.iter()), row_to_ticket)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        tickets.retain(|t| filter.matches_search(t));

        let mut comments = self.all_comments()?;
        for ticket in &mut tickets {
            ticket.comments = comments.remove(&ticket.id).unwrap_or_default();
        }

        debug!(count = tickets.len(), "Queried tickets");
        Ok(tickets)
    }

    /// Count tickets matching `filter` per status, type and category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn ticket_stats(&self, filter: &TicketFilter) -> Result<TicketStats> {
        Ok(TicketStats::from_tickets(&self.query_tickets(filter)?))
    }

    /// File a new ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_ticket(&self, new_ticket: &NewTicket) -> Result<Ticket> {
        let now = Utc::now();
        let id = self.insert_ticket_at(new_ticket, now, now)?;
        info!(
            id,
            source = %new_ticket.source,
            ticket_type = %new_ticket.ticket_type,
            category = %new_ticket.category,
            "Created ticket"
        );

        Ok(Ticket {
            id,
            title: new_ticket.title.clone(),
            description: new_ticket.description.clone(),
            ticket_type: new_ticket.ticket_type,
            category: new_ticket.category,
            status: new_ticket.status,
            source: new_ticket.source,
            author_id: new_ticket.author_id.clone(),
            author_name: new_ticket.author_name.clone(),
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        })
    }

    /// Append a comment to a ticket.
    ///
    /// Returns the updated ticket, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn add_comment(&self, ticket_id: i64, comment: &NewComment) -> Result<Option<Ticket>> {
        if !self.ticket_exists(ticket_id)? {
            return Ok(None);
        }

        let now = Utc::now();
        let tx = self.conn.unchecked_transaction()?;
        self.insert_comment_at(ticket_id, comment, now)?;
        self.touch(ticket_id, now)?;
        tx.commit()?;

        debug!(ticket_id, author = %comment.author_id, "Added comment");
        self.ticket(ticket_id)
    }

    /// Change a ticket's status.
    ///
    /// Returns the updated ticket, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_ticket_status(
        &self,
        ticket_id: i64,
        status: TicketStatus,
    ) -> Result<Option<Ticket>> {
        let affected = self.conn.execute(
            "UPDATE tickets SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_timestamp(Utc::now()), ticket_id],
        )?;
        if affected == 0 {
            return Ok(None);
        }

        info!(ticket_id, %status, "Updated ticket status");
        self.ticket(ticket_id)
    }

    /// Insert a ticket with explicit timestamps and return its id.
    pub(super) fn insert_ticket_at(
        &self,
        ticket: &NewTicket,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tickets (title, description, ticket_type, category, status, source,
                                  author_id, author_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                ticket.title,
                ticket.description,
                ticket.ticket_type.as_str(),
                ticket.category.as_str(),
                ticket.status.as_str(),
                ticket.source.as_str(),
                ticket.author_id,
                ticket.author_name,
                format_timestamp(created_at),
                format_timestamp(updated_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a comment with an explicit timestamp.
    pub(super) fn insert_comment_at(
        &self,
        ticket_id: i64,
        comment: &NewComment,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO comments (ticket_id, author_id, author_name, author_role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ticket_id,
                comment.author_id,
                comment.author_name,
                comment.author_role.as_str(),
                comment.content,
                format_timestamp(created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn ticket_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn touch(&self, ticket_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE tickets SET updated_at = ?1 WHERE id = ?2",
            params![format_timestamp(at), ticket_id],
        )?;
        Ok(())
    }

    fn comments_for(&self, ticket_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE ticket_id = ?1 ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments = stmt
            .query_map([ticket_id], |row| row_to_comment(row).map(|(_, c)| c))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn all_comments(&self) -> Result<HashMap<i64, Vec<Comment>>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut grouped: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in stmt.query_map([], row_to_comment)? {
            let (ticket_id, comment) = row?;
            grouped.entry(ticket_id).or_default().push(comment);
        }
        Ok(grouped)
    }
}

fn parse_or_default<T: std::str::FromStr>(value: &str, what: &str, fallback: T) -> T {
    value.parse().unwrap_or_else(|_| {
        warn!("Unknown {what}: {value}, using default");
        fallback
    })
}

fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    let ticket_type: String = row.get(3)?;
    let category: String = row.get(4)?;
    let status: String = row.get(5)?;
    let source: String = row.get(6)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        ticket_type: parse_or_default(&ticket_type, "ticket type", TicketType::Request),
        category: parse_or_default(&category, "category", TicketCategory::General),
        status: parse_or_default(&status, "status", TicketStatus::Open),
        source: parse_or_default(&source, "source", TicketSource::Web),
        author_id: row.get(7)?,
        author_name: row.get(8)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        comments: Vec::new(),
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<(i64, Comment)> {
    let author_role: String = row.get(4)?;
    let created_at: String = row.get(6)?;

    Ok((
        row.get(1)?,
        Comment {
            id: row.get(0)?,
            author_id: row.get(2)?,
            author_name: row.get(3)?,
            author_role: parse_or_default(&author_role, "role", UserRole::Resident),
            content: row.get(5)?,
            created_at: parse_timestamp(&created_at),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn new_ticket(title: &str, author: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: format!("{title} hakkında"),
            ticket_type: TicketType::Request,
            category: TicketCategory::General,
            status: TicketStatus::Open,
            source: TicketSource::Web,
            author_id: author.to_string(),
            author_name: format!("{author} (Daire 1)"),
        }
    }

    fn admin_comment(content: &str) -> NewComment {
        NewComment {
            author_id: "admin1".to_string(),
            author_name: "Yönetim".to_string(),
            author_role: UserRole::Admin,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_create_and_get_ticket() {
        let storage = create_test_storage();
        let created = storage.create_ticket(&new_ticket("Lamba", "u1")).unwrap();

        assert_eq!(created.created_at, created.updated_at);
        assert!(created.comments.is_empty());

        let fetched = storage.ticket(created.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Lamba");
        assert_eq!(fetched.author_id, "u1");
        assert_eq!(fetched.status, TicketStatus::Open);
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            created.created_at.timestamp_micros()
        );
    }

    #[test]
    fn test_get_nonexistent_ticket() {
        let storage = create_test_storage();
        assert!(storage.ticket(99_999).unwrap().is_none());
    }

    #[test]
    fn test_tickets_newest_first() {
        let storage = create_test_storage();
        let first = storage.create_ticket(&new_ticket("Bir", "u1")).unwrap();
        let second = storage.create_ticket(&new_ticket("İki", "u1")).unwrap();

        let ids: Vec<_> = storage.tickets().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_add_comment_bumps_updated_at() {
        let storage = create_test_storage();
        let ticket = storage.create_ticket(&new_ticket("Çöp", "u1")).unwrap();

        let updated = storage
            .add_comment(ticket.id, &admin_comment("Bakıyoruz"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.comments.len(), 1);
        assert_eq!(updated.comments[0].content, "Bakıyoruz");
        assert_eq!(updated.comments[0].author_role, UserRole::Admin);
        assert!(updated.updated_at >= ticket.updated_at);

        let updated = storage
            .add_comment(ticket.id, &admin_comment("Tamamlandı"))
            .unwrap()
            .unwrap();
        let contents: Vec<_> = updated.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["Bakıyoruz", "Tamamlandı"]);
    }

    #[test]
    fn test_add_comment_missing_ticket() {
        let storage = create_test_storage();
        assert!(storage
            .add_comment(42, &admin_comment("Merhaba"))
            .unwrap()
            .is_none());
        assert_eq!(storage.stats().unwrap().comments, 0);
    }

    #[test]
    fn test_update_status() {
        let storage = create_test_storage();
        let ticket = storage.create_ticket(&new_ticket("Kapı", "u1")).unwrap();

        let updated = storage
            .update_ticket_status(ticket.id, TicketStatus::Resolved)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TicketStatus::Resolved);
        assert!(updated.updated_at >= ticket.updated_at);
    }

    #[test]
    fn test_update_status_missing_ticket() {
        let storage = create_test_storage();
        assert!(storage
            .update_ticket_status(7, TicketStatus::Closed)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_includes_comments() {
        let storage = create_test_storage();
        let a = storage.create_ticket(&new_ticket("A", "u1")).unwrap();
        let b = storage.create_ticket(&new_ticket("B", "u2")).unwrap();
        storage.add_comment(a.id, &admin_comment("a1")).unwrap();

        let tickets = storage.tickets().unwrap();
        let a = tickets.iter().find(|t| t.id == a.id).unwrap();
        let b = tickets.iter().find(|t| t.id == b.id).unwrap();
        assert_eq!(a.comments.len(), 1);
        assert!(b.comments.is_empty());
    }

    #[test]
    fn test_filter_by_fields() {
        let storage = create_test_storage();
        let mut complaint = new_ticket("Asansör", "u1");
        complaint.ticket_type = TicketType::Complaint;
        complaint.category = TicketCategory::Technical;
        storage.create_ticket(&complaint).unwrap();

        let other = storage.create_ticket(&new_ticket("Bank", "u2")).unwrap();
        storage
            .update_ticket_status(other.id, TicketStatus::InProgress)
            .unwrap();

        let by_type = storage
            .query_tickets(&TicketFilter::new().with_type(TicketType::Complaint))
            .unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].title, "Asansör");

        let by_category = storage
            .query_tickets(&TicketFilter::new().with_category(TicketCategory::General))
            .unwrap();
        assert_eq!(by_category.len(), 1);

        let by_status = storage
            .query_tickets(&TicketFilter::new().with_status(TicketStatus::InProgress))
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, other.id);

        let by_author = storage
            .query_tickets(&TicketFilter::new().with_author("u1"))
            .unwrap();
        assert_eq!(by_author.len(), 1);

        let combined = storage
            .query_tickets(
                &TicketFilter::new()
                    .with_author("u1")
                    .with_status(TicketStatus::InProgress),
            )
            .unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn test_search_title_or_description_case_insensitive() {
        let storage = create_test_storage();
        storage.create_ticket(&new_ticket("Havuz", "u1")).unwrap();
        let mut ticket = new_ticket("Bahçe", "u1");
        ticket.description = "Havuz kenarındaki çimler".to_string();
        storage.create_ticket(&ticket).unwrap();
        storage.create_ticket(&new_ticket("Otopark", "u1")).unwrap();

        let found = storage
            .query_tickets(&TicketFilter::new().with_search("HAVUZ"))
            .unwrap();
        assert_eq!(found.len(), 2);

        let all = storage
            .query_tickets(&TicketFilter::new().with_search(""))
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_ticket_stats() {
        let storage = create_test_storage();
        let mut complaint = new_ticket("Asansör", "u1");
        complaint.ticket_type = TicketType::Complaint;
        storage.create_ticket(&complaint).unwrap();
        storage.create_ticket(&new_ticket("Bank", "u1")).unwrap();
        let resolved = storage.create_ticket(&new_ticket("Kamera", "u2")).unwrap();
        storage
            .update_ticket_status(resolved.id, TicketStatus::Resolved)
            .unwrap();

        let stats = storage.ticket_stats(&TicketFilter::new()).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status[&TicketStatus::Open], 2);
        assert_eq!(stats.by_status[&TicketStatus::Resolved], 1);
        assert_eq!(stats.by_status[&TicketStatus::Closed], 0);
        assert_eq!(stats.by_type[&TicketType::Complaint], 1);
        assert_eq!(stats.by_type[&TicketType::Request], 2);
        assert_eq!(stats.by_category[&TicketCategory::General], 3);

        let mine = storage
            .ticket_stats(&TicketFilter::new().with_author("u2"))
            .unwrap();
        assert_eq!(mine.total, 1);
    }

    #[test]
    fn test_stats_serialize_with_keys() {
        let stats = TicketStats::from_tickets(&[]);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"in_progress\":0"));
        assert!(json.contains("\"suggestion\":0"));
        assert!(json.contains("\"parking\":0"));
    }
}
