//! Keyword-based ticket classification.
//!
//! Assigns a ticket type and category to free text using two ordered
//! keyword tables:
//!
//! - **Type**: complaint keywords win, then suggestion keywords, and
//!   anything else is a request.
//! - **Category**: tables are checked in the order security, cleaning,
//!   technical, landscape, noise, parking; the first table with a matching
//!   keyword wins, and anything else is general.
//!
//! Matching is a case-insensitive substring test, so short keywords such as
//! `su` also match inside longer words.
//!
//! # Example
//!
//! ```
//! use sitedesk::classifier::Classifier;
//! use sitedesk::model::{TicketCategory, TicketType};
//!
//! let classifier = Classifier::new();
//! let result = classifier.classify("B blok asansörü yine çalışmıyor");
//!
//! assert_eq!(result.ticket_type, TicketType::Complaint);
//! assert_eq!(result.category, TicketCategory::Technical);
//! ```

mod keywords;
mod rules;

pub use keywords::{category_tables, type_tables, KeywordTable, COMPLAINT, SUGGESTION};
pub use rules::{Classification, Classifier};
