//! Text rendering for command output.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

use crate::classifier::Classification;
use crate::ingest::{InboxReport, IngestOutcome};
use crate::model::{Ticket, TicketCategory, TicketStatus, TicketType, User};
use crate::storage::{BatchReport, TicketStats};

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

/// One line per ticket.
#[must_use]
pub fn ticket_lines(tickets: &[Ticket]) -> String {
    let mut out = String::new();
    for t in tickets {
        let _ = writeln!(
            out,
            "#{} [{}] {} ({} / {}) - {}",
            t.id,
            t.status.label(),
            t.title,
            t.ticket_type.label(),
            t.category.label(),
            t.author_name
        );
    }
    out
}

/// Aligned table of tickets.
#[must_use]
pub fn ticket_table(tickets: &[Ticket]) -> String {
    let mut out = format!(
        "{:<5} {:<9} {:<8} {:<12} {:<10} {:<36} {:<24} {}\n",
        "ID", "STATUS", "TYPE", "CATEGORY", "SOURCE", "TITLE", "AUTHOR", "CREATED"
    );
    for t in tickets {
        let _ = writeln!(
            out,
            "{:<5} {:<9} {:<8} {:<12} {:<10} {:<36} {:<24} {}",
            t.id,
            t.status.label(),
            t.ticket_type.label(),
            t.category.label(),
            t.source.label(),
            truncate(&t.title, 36),
            truncate(&t.author_name, 24),
            local_time(t.created_at)
        );
    }
    let _ = write!(out, "{} ticket(s)", tickets.len());
    out
}

/// A ticket with its comment thread.
#[must_use]
pub fn ticket_detail(ticket: &Ticket) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", ticket.id, ticket.title);
    let _ = writeln!(
        out,
        "{} | {} | {} | {}",
        ticket.status.label(),
        ticket.ticket_type.label(),
        ticket.category.label(),
        ticket.source.label()
    );
    let _ = writeln!(
        out,
        "{} | created {} | updated {}",
        ticket.author_name,
        local_time(ticket.created_at),
        local_time(ticket.updated_at)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", ticket.description);

    if !ticket.comments.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Comments ({})", ticket.comments.len());
        for comment in &ticket.comments {
            let _ = writeln!(
                out,
                "  {} ({}, {}): {}",
                comment.author_name,
                comment.author_role.label(),
                local_time(comment.created_at),
                comment.content
            );
        }
    }
    out
}

/// Aligned table of accounts.
#[must_use]
pub fn user_table(users: &[User]) -> String {
    let mut out = format!(
        "{:<10} {:<12} {:<10} {:<28} {:<24} {}\n",
        "ID", "USERNAME", "ROLE", "NAME", "EMAIL", "PHONE"
    );
    for u in users {
        let _ = writeln!(
            out,
            "{:<10} {:<12} {:<10} {:<28} {:<24} {}",
            u.id,
            u.username,
            u.role.label(),
            truncate(&u.name, 28),
            u.email.as_deref().unwrap_or("-"),
            u.phone.as_deref().unwrap_or("-")
        );
    }
    let _ = write!(out, "{} user(s)", users.len());
    out
}

/// One line per account.
#[must_use]
pub fn user_lines(users: &[User]) -> String {
    let mut out = String::new();
    for u in users {
        let _ = writeln!(out, "{} {} ({})", u.username, u.name, u.role.label());
    }
    out
}

/// Summary of a bulk import.
#[must_use]
pub fn batch_report(report: &BatchReport) -> String {
    let mut out = format!(
        "Created {} user(s), skipped {} row(s)\n",
        report.created,
        report.errors.len()
    );
    for error in &report.errors {
        let _ = writeln!(out, "  {error}");
    }
    out
}

/// Dashboard counts.
#[must_use]
pub fn stats(stats: &TicketStats) -> String {
    let mut out = format!("Total tickets: {}\n", stats.total);

    let _ = writeln!(out, "\nBy status");
    for status in TicketStatus::ALL {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            status.label(),
            stats.by_status.get(status).copied().unwrap_or(0)
        );
    }

    let _ = writeln!(out, "\nBy type");
    for ticket_type in TicketType::ALL {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            ticket_type.label(),
            stats.by_type.get(ticket_type).copied().unwrap_or(0)
        );
    }

    let _ = writeln!(out, "\nBy category");
    for category in TicketCategory::ALL {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            category.label(),
            stats.by_category.get(category).copied().unwrap_or(0)
        );
    }
    out
}

/// Result of filing an inbound message.
#[must_use]
pub fn ingest_outcome(outcome: &IngestOutcome) -> String {
    format!("Ticket #{}: {}", outcome.ticket_id, outcome.message)
}

/// Result of an inbox check.
#[must_use]
pub fn inbox_report(report: &InboxReport) -> String {
    match &report.outcome {
        Some(outcome) => format!(
            "Checked {}: 1 new message\n{}",
            report.address,
            ingest_outcome(outcome)
        ),
        None => format!("Checked {}: no new messages", report.address),
    }
}

/// Detected type and category.
#[must_use]
pub fn classification(result: &Classification) -> String {
    format!(
        "Type:     {} (keyword: {})\nCategory: {} (keyword: {})",
        result.ticket_type.label(),
        result.type_keyword.unwrap_or("-"),
        result.category.label(),
        result.category_keyword.unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, TicketSource, UserRole};
    use crate::storage::RowError;

    fn ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: 7,
            title: "Asansör yine çalışmıyor".to_string(),
            description: "B Blok sağ asansör takılıyor".to_string(),
            ticket_type: TicketType::Complaint,
            category: TicketCategory::Technical,
            status: TicketStatus::Open,
            source: TicketSource::Web,
            author_id: "u1".to_string(),
            author_name: "Ahmet Yılmaz (Daire 14)".to_string(),
            created_at: now,
            updated_at: now,
            comments: vec![Comment {
                id: 1,
                author_id: "admin1".to_string(),
                author_name: "Yönetim".to_string(),
                author_role: UserRole::Admin,
                content: "Servis çağrıldı".to_string(),
                created_at: now,
            }],
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("kısa", 10), "kısa");
        assert_eq!(truncate("çok uzun başlık", 5), "çok …");
    }

    #[test]
    fn test_ticket_lines() {
        let out = ticket_lines(&[ticket()]);
        assert!(out.starts_with("#7 [Açık] Asansör yine çalışmıyor"));
        assert!(out.contains("Ahmet Yılmaz"));
    }

    #[test]
    fn test_ticket_table_has_header_and_count() {
        let out = ticket_table(&[ticket()]);
        assert!(out.starts_with("ID"));
        assert!(out.ends_with("1 ticket(s)"));
    }

    #[test]
    fn test_ticket_detail_lists_comments() {
        let out = ticket_detail(&ticket());
        assert!(out.contains("Comments (1)"));
        assert!(out.contains("Yönetim (Yönetici"));
        assert!(out.contains("Servis çağrıldı"));
    }

    #[test]
    fn test_stats_lists_every_bucket() {
        let out = stats(&TicketStats::from_tickets(&[ticket()]));
        assert!(out.starts_with("Total tickets: 1"));
        for status in TicketStatus::ALL {
            assert!(out.contains(status.label()));
        }
        for category in TicketCategory::ALL {
            assert!(out.contains(category.label()));
        }
    }

    #[test]
    fn test_batch_report() {
        let report = BatchReport {
            created: 2,
            errors: vec![RowError::MissingFields { row: 3 }],
        };
        let out = batch_report(&report);
        assert!(out.starts_with("Created 2 user(s), skipped 1 row(s)"));
        assert!(out.contains("row 3"));
    }

    #[test]
    fn test_empty_inbox_report() {
        let report = InboxReport {
            address: "ugurhersek@gmail.com".to_string(),
            outcome: None,
        };
        assert_eq!(
            inbox_report(&report),
            "Checked ugurhersek@gmail.com: no new messages"
        );
    }
}
