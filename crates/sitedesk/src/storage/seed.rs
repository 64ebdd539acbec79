//! Demo accounts and tickets for a fresh database.

use chrono::{Duration, Utc};
use rusqlite::OptionalExtension;
use tracing::info;

use super::Storage;
use crate::error::Result;
use crate::model::{
    NewComment, NewTicket, TicketCategory, TicketSource, TicketStatus, TicketType, User, UserRole,
};

fn demo_users() -> Vec<User> {
    let user = |id: &str, name: &str, role, username: &str, email: &str, phone: &str| User {
        id: id.to_string(),
        name: name.to_string(),
        role,
        username: username.to_string(),
        password: "123".to_string(),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
    };

    vec![
        user(
            "admin1",
            "Site Yönetimi",
            UserRole::Admin,
            "admin",
            "yonetim@site.com",
            "5550000000",
        ),
        user(
            "u1",
            "Ahmet Yılmaz (Daire 14)",
            UserRole::Resident,
            "ahmet",
            "ahmet@gmail.com",
            "5551112233",
        ),
        user(
            "u2",
            "Ayşe Demir (Daire 5)",
            UserRole::Resident,
            "ayse",
            "ayse@hotmail.com",
            "5554445566",
        ),
    ]
}

/// A demo ticket with its age in days at creation and at last update.
struct DemoTicket {
    ticket: NewTicket,
    created_days_ago: i64,
    updated_days_ago: i64,
    comments: Vec<(NewComment, i64)>,
}

fn demo_tickets() -> Vec<DemoTicket> {
    vec![
        DemoTicket {
            ticket: NewTicket {
                title: "Asansör yine çalışmıyor".to_string(),
                description: "B Blok sağ asansör 3. katta takılıyor ve garip sesler çıkarıyor. \
                              Acil kontrol edilmeli."
                    .to_string(),
                ticket_type: TicketType::Complaint,
                category: TicketCategory::Technical,
                status: TicketStatus::Open,
                source: TicketSource::Web,
                author_id: "u1".to_string(),
                author_name: "Ahmet Yılmaz (Daire 14)".to_string(),
            },
            created_days_ago: 2,
            updated_days_ago: 2,
            comments: Vec::new(),
        },
        DemoTicket {
            ticket: NewTicket {
                title: "Havuz temizliği hakkında".to_string(),
                description: "Havuzun dip temizliği yeterince sık yapılmıyor gibi görünüyor. \
                              Programı sıklaştırabilir miyiz?"
                    .to_string(),
                ticket_type: TicketType::Suggestion,
                category: TicketCategory::Cleaning,
                status: TicketStatus::InProgress,
                source: TicketSource::Web,
                author_id: "u2".to_string(),
                author_name: "Ayşe Demir (Daire 5)".to_string(),
            },
            created_days_ago: 5,
            updated_days_ago: 1,
            comments: vec![(
                NewComment {
                    author_id: "admin1".to_string(),
                    author_name: "Yönetim".to_string(),
                    author_role: UserRole::Admin,
                    content: "Merhaba Ayşe Hanım, konuyla ilgili temizlik firmasıyla görüştük. \
                              Bu hafta ekstra bir temizlik yapılacak."
                        .to_string(),
                },
                1,
            )],
        },
        DemoTicket {
            ticket: NewTicket {
                title: "Misafir otoparkı sorunu".to_string(),
                description: "Misafir otoparkına sürekli yabancı araçlar park ediyor. \
                              Güvenlik daha dikkatli olmalı."
                    .to_string(),
                ticket_type: TicketType::Complaint,
                category: TicketCategory::Security,
                status: TicketStatus::Resolved,
                source: TicketSource::WhatsApp,
                author_id: "u3".to_string(),
                author_name: "Mehmet Öz (Daire 22)".to_string(),
            },
            created_days_ago: 10,
            updated_days_ago: 9,
            comments: Vec::new(),
        },
    ]
}

fn is_empty(storage: &Storage, table: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {table} LIMIT 1");
    let row: Option<i64> = storage
        .conn
        .query_row(&sql, [], |row| row.get(0))
        .optional()?;
    Ok(row.is_none())
}

/// Insert the demo users and tickets into whichever tables are empty.
pub(super) fn seed_if_empty(storage: &Storage) -> Result<bool> {
    let mut seeded = false;
    let tx = storage.conn.unchecked_transaction()?;

    if is_empty(storage, "users")? {
        let users = demo_users();
        for user in &users {
            storage.insert_user(user)?;
        }
        info!(count = users.len(), "Seeded demo users");
        seeded = true;
    }

    if is_empty(storage, "tickets")? {
        let now = Utc::now();
        let tickets = demo_tickets();
        for demo in &tickets {
            let id = storage.insert_ticket_at(
                &demo.ticket,
                now - Duration::days(demo.created_days_ago),
                now - Duration::days(demo.updated_days_ago),
            )?;
            for (comment, days_ago) in &demo.comments {
                storage.insert_comment_at(id, comment, now - Duration::days(*days_ago))?;
            }
        }
        info!(count = tickets.len(), "Seeded demo tickets");
        seeded = true;
    }

    tx.commit()?;
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewUser;
    use crate::storage::TicketFilter;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_seed_fresh_database() {
        let storage = create_test_storage();
        assert!(seed_if_empty(&storage).unwrap());

        let usernames: Vec<_> = storage
            .users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(usernames, vec!["admin", "ahmet", "ayse"]);

        let admin = storage.authenticate("admin", "123").unwrap().unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.id, "admin1");
    }

    #[test]
    fn test_seed_tickets_newest_first() {
        let storage = create_test_storage();
        seed_if_empty(&storage).unwrap();

        let tickets = storage.tickets().unwrap();
        let titles: Vec<_> = tickets.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Asansör yine çalışmıyor",
                "Havuz temizliği hakkında",
                "Misafir otoparkı sorunu",
            ]
        );

        let pool = &tickets[1];
        assert_eq!(pool.status, TicketStatus::InProgress);
        assert_eq!(pool.comments.len(), 1);
        assert_eq!(pool.comments[0].author_name, "Yönetim");
        assert!(pool.updated_at > pool.created_at);

        let parking = &tickets[2];
        assert_eq!(parking.source, TicketSource::WhatsApp);
        assert_eq!(parking.author_id, "u3");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let storage = create_test_storage();
        assert!(seed_if_empty(&storage).unwrap());
        assert!(!seed_if_empty(&storage).unwrap());

        let stats = storage.stats().unwrap();
        assert_eq!(stats.users, 3);
        assert_eq!(stats.tickets, 3);
    }

    #[test]
    fn test_seed_skips_populated_tables() {
        let storage = create_test_storage();
        storage
            .create_user(&NewUser {
                name: "Zeynep".to_string(),
                username: "zeynep".to_string(),
                password: "pw".to_string(),
                email: None,
                phone: None,
            })
            .unwrap();

        assert!(seed_if_empty(&storage).unwrap());
        assert_eq!(storage.users().unwrap().len(), 1);
        assert_eq!(storage.tickets().unwrap().len(), 3);
    }

    #[test]
    fn test_seed_resident_sees_own_tickets() {
        let storage = create_test_storage();
        seed_if_empty(&storage).unwrap();

        let mine = storage
            .query_tickets(&TicketFilter::new().with_author("u1"))
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].category, TicketCategory::Technical);
    }
}
