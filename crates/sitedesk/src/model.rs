//! Core ticket desk types.
//!
//! Users, tickets and comments, plus the small closed vocabularies
//! (role, type, category, status, source) that describe them. Every
//! vocabulary has a stable snake_case key used for storage, JSON and the
//! CLI, and a display label shown to residents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Generates `as_str`, `label`, `ALL`, `Display` and `FromStr` for a
/// fieldless vocabulary enum.
macro_rules! vocabulary {
    ($name:ident, $kind:literal, { $($variant:ident => $key:literal, $label:literal;)+ }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable storage key.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($key => Ok(Self::$variant),)+
                    other => Err(Error::invalid_input(format!(
                        concat!("unknown ", $kind, ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// A resident of the complex.
    Resident,
    /// Site management.
    Admin,
}

vocabulary!(UserRole, "role", {
    Resident => "resident", "Sakin";
    Admin => "admin", "Yönetici";
});

/// What kind of ticket this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    /// Something is wrong.
    Complaint,
    /// Something is wanted.
    Request,
    /// Something could be better.
    Suggestion,
}

vocabulary!(TicketType, "ticket type", {
    Complaint => "complaint", "Şikayet";
    Request => "request", "İstek";
    Suggestion => "suggestion", "Öneri";
});

/// Which area of the complex a ticket concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    /// Nothing more specific matched.
    General,
    /// Guards, gates, cameras.
    Security,
    /// Cleaning and hygiene.
    Cleaning,
    /// Gardens and greenery.
    Landscape,
    /// Repairs, utilities, elevators.
    Technical,
    /// Noise between neighbours.
    Noise,
    /// Car park and vehicles.
    Parking,
}

vocabulary!(TicketCategory, "category", {
    General => "general", "Genel";
    Security => "security", "Güvenlik";
    Cleaning => "cleaning", "Temizlik";
    Landscape => "landscape", "Peyzaj";
    Technical => "technical", "Teknik/Tamirat";
    Noise => "noise", "Gürültü";
    Parking => "parking", "Otopark";
});

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Filed, nobody has picked it up.
    Open,
    /// Management is working on it.
    InProgress,
    /// Fixed.
    Resolved,
    /// Closed without further action.
    Closed,
}

vocabulary!(TicketStatus, "status", {
    Open => "open", "Açık";
    InProgress => "in_progress", "İşlemde";
    Resolved => "resolved", "Çözüldü";
    Closed => "closed", "Kapandı";
});

/// Channel a ticket arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketSource {
    /// The resident panel.
    Web,
    /// An email to the management inbox.
    Email,
    /// A WhatsApp message.
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

vocabulary!(TicketSource, "source", {
    Web => "web", "Web Paneli";
    Email => "email", "E-Posta";
    WhatsApp => "whatsapp", "WhatsApp";
});

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier.
    pub id: String,
    /// Display name, usually including the flat number.
    pub name: String,
    /// Account role.
    pub role: UserRole,
    /// Login name, unique.
    pub username: String,
    /// Login password (stored as entered).
    #[serde(skip_serializing)]
    pub password: String,
    /// Contact email, used to match inbound emails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone, used to match inbound WhatsApp messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    /// Whether this user belongs to site management.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Fields for a new resident account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name.
    #[serde(default, alias = "Ad Soyad", alias = "ad soyad", alias = "Name")]
    pub name: String,
    /// Login name.
    #[serde(
        default,
        alias = "Kullanıcı Adı",
        alias = "kullanıcı adı",
        alias = "Username"
    )]
    pub username: String,
    /// Login password.
    #[serde(default, alias = "Şifre", alias = "şifre", alias = "Password")]
    pub password: String,
    /// Contact email.
    #[serde(default, alias = "E-Posta", alias = "e-posta", alias = "Email")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, alias = "Telefon", alias = "telefon", alias = "Phone")]
    pub phone: Option<String>,
}

impl NewUser {
    /// Whether all mandatory fields are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

/// A reply on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Id of the writing user.
    pub author_id: String,
    /// Name shown next to the comment.
    pub author_name: String,
    /// Role of the writer at the time of writing.
    pub author_role: UserRole,
    /// Comment body.
    pub content: String,
    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

/// Fields for a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Id of the writing user.
    pub author_id: String,
    /// Name shown next to the comment.
    pub author_name: String,
    /// Role of the writer.
    pub author_role: UserRole,
    /// Comment body.
    pub content: String,
}

impl NewComment {
    /// Build a comment written by `user`.
    #[must_use]
    pub fn by(user: &User, content: impl Into<String>) -> Self {
        Self {
            author_id: user.id.clone(),
            author_name: user.name.clone(),
            author_role: user.role,
            content: content.into(),
        }
    }
}

/// A complaint, request or suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Short summary.
    pub title: String,
    /// Full text.
    pub description: String,
    /// Complaint, request or suggestion.
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Area of the complex.
    pub category: TicketCategory,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Channel the ticket came in through.
    pub source: TicketSource,
    /// Id of the filing user, or the unregistered marker.
    pub author_id: String,
    /// Name of the filing user, e.g. "Ahmet Yılmaz (Daire 14)".
    pub author_name: String,
    /// When the ticket was filed.
    pub created_at: DateTime<Utc>,
    /// Last status change or comment.
    pub updated_at: DateTime<Utc>,
    /// Replies, oldest first.
    pub comments: Vec<Comment>,
}

/// Fields for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Short summary.
    pub title: String,
    /// Full text.
    pub description: String,
    /// Complaint, request or suggestion.
    pub ticket_type: TicketType,
    /// Area of the complex.
    pub category: TicketCategory,
    /// Initial state.
    pub status: TicketStatus,
    /// Channel.
    pub source: TicketSource,
    /// Id of the filing user.
    pub author_id: String,
    /// Name of the filing user.
    pub author_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_keys_round_trip() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>().unwrap(), *status);
        }
        for category in TicketCategory::ALL {
            assert_eq!(
                category.as_str().parse::<TicketCategory>().unwrap(),
                *category
            );
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(TicketType::Complaint.label(), "Şikayet");
        assert_eq!(TicketCategory::Technical.label(), "Teknik/Tamirat");
        assert_eq!(TicketStatus::InProgress.label(), "İşlemde");
        assert_eq!(TicketSource::Email.label(), "E-Posta");
    }

    #[test]
    fn test_display_uses_key() {
        assert_eq!(TicketStatus::InProgress.to_string(), "in_progress");
        assert_eq!(TicketSource::WhatsApp.to_string(), "whatsapp");
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "pending".parse::<TicketStatus>().unwrap_err();
        assert!(err.to_string().contains("unknown status: pending"));
    }

    #[test]
    fn test_serde_matches_storage_key() {
        let json = serde_json::to_string(&TicketSource::WhatsApp).unwrap();
        assert_eq!(json, "\"whatsapp\"");
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: "u9".to_string(),
            name: "Zeynep Kaya (Daire 3)".to_string(),
            role: UserRole::Resident,
            username: "zeynep".to_string(),
            password: "gizli".to_string(),
            email: None,
            phone: Some("5550001122".to_string()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("gizli"));
        assert!(!json.contains("email"));
        assert!(json.contains("5550001122"));
    }

    #[test]
    fn test_new_user_accepts_import_headers() {
        let json = r#"{"Ad Soyad": "Can Er", "Kullanıcı Adı": "can", "Şifre": "1", "Telefon": "555"}"#;
        let row: NewUser = serde_json::from_str(json).unwrap();
        assert_eq!(row.name, "Can Er");
        assert_eq!(row.username, "can");
        assert_eq!(row.password, "1");
        assert_eq!(row.phone.as_deref(), Some("555"));
        assert!(row.is_complete());
    }

    #[test]
    fn test_new_user_incomplete() {
        let row = NewUser {
            name: "Can Er".to_string(),
            username: "can".to_string(),
            ..Default::default()
        };
        assert!(!row.is_complete());
    }

    #[test]
    fn test_new_comment_by_user() {
        let user = User {
            id: "admin1".to_string(),
            name: "Site Yönetimi".to_string(),
            role: UserRole::Admin,
            username: "admin".to_string(),
            password: "123".to_string(),
            email: None,
            phone: None,
        };
        let comment = NewComment::by(&user, "Bakıyoruz");
        assert_eq!(comment.author_id, "admin1");
        assert_eq!(comment.author_role, UserRole::Admin);
        assert!(user.is_admin());
    }
}
