//! First-match-wins classification over the keyword tables.

use serde::Serialize;
use tracing::trace;

use super::keywords::{category_tables, type_tables, KeywordTable};
use crate::model::{TicketCategory, TicketType};

/// Outcome of classifying a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Detected ticket type.
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Detected category.
    pub category: TicketCategory,
    /// Keyword that decided the type, `None` for the request default.
    pub type_keyword: Option<&'static str>,
    /// Keyword that decided the category, `None` for the general default.
    pub category_keyword: Option<&'static str>,
}

/// Rule-based ticket classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    types: Vec<(TicketType, KeywordTable)>,
    categories: Vec<(TicketCategory, KeywordTable)>,
}

impl Classifier {
    /// Create a classifier with the built-in tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: type_tables().to_vec(),
            categories: category_tables().to_vec(),
        }
    }

    /// Classify `text` into a type and a category.
    #[must_use]
    pub fn classify(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();
        let (ticket_type, type_keyword) = self.match_type(&lowered);
        let (category, category_keyword) = self.match_category(&lowered);

        trace!(
            %ticket_type,
            %category,
            type_keyword = type_keyword.unwrap_or("-"),
            category_keyword = category_keyword.unwrap_or("-"),
            "Classified text"
        );

        Classification {
            ticket_type,
            category,
            type_keyword,
            category_keyword,
        }
    }

    /// Detect only the ticket type.
    #[must_use]
    pub fn classify_type(&self, text: &str) -> TicketType {
        self.match_type(&text.to_lowercase()).0
    }

    /// Detect only the category.
    #[must_use]
    pub fn classify_category(&self, text: &str) -> TicketCategory {
        self.match_category(&text.to_lowercase()).0
    }

    fn match_type(&self, lowered: &str) -> (TicketType, Option<&'static str>) {
        self.types
            .iter()
            .find_map(|(ticket_type, table)| table.find(lowered).map(|k| (*ticket_type, Some(k))))
            .unwrap_or((TicketType::Request, None))
    }

    fn match_category(&self, lowered: &str) -> (TicketCategory, Option<&'static str>) {
        self.categories
            .iter()
            .find_map(|(category, table)| table.find(lowered).map(|k| (*category, Some(k))))
            .unwrap_or((TicketCategory::General, None))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
