//! Built-in keyword tables.
//!
//! Keywords are lower-case Turkish fragments matched as substrings of the
//! lower-cased message text.

use crate::model::{TicketCategory, TicketType};

/// A named set of keyword fragments.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    /// Name of the table for identification in logs.
    pub name: &'static str,

    /// Fragments that make this table match.
    pub keywords: &'static [&'static str],
}

impl KeywordTable {
    /// Create a new keyword table.
    #[must_use]
    pub const fn new(name: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { name, keywords }
    }

    /// Return the first keyword contained in `lowered`, if any.
    ///
    /// `lowered` must already be lower-cased.
    #[must_use]
    pub fn find(&self, lowered: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|k| lowered.contains(k))
    }
}

/// Words that mark a message as a complaint.
pub const COMPLAINT: KeywordTable = KeywordTable::new(
    "complaint",
    &[
        "şikayet",
        "bozuk",
        "çalışmıyor",
        "arızalı",
        "kötü",
        "rezalet",
        "berbat",
        "kirli",
        "kokuyor",
        "yanmıyor",
        "akıtıyor",
        "patlak",
        "tehlike",
        "sorun",
        "rahatsız",
        "gürültü",
        "yavaş",
        "kırık",
    ],
);

/// Words that mark a message as a suggestion.
pub const SUGGESTION: KeywordTable = KeywordTable::new(
    "suggestion",
    &[
        "öneri",
        "tavsiye",
        "fikir",
        "olsa iyi olur",
        "yapılmalı",
        "eklense",
        "düşünülebilir",
        "bence",
        "koysak",
        "yapsak",
        "daha iyi olur",
    ],
);

const SECURITY: KeywordTable = KeywordTable::new(
    "security",
    &["güvenlik", "bekçi", "kapı", "hırsız", "kamera", "giriş", "kimlik"],
);

const CLEANING: KeywordTable = KeywordTable::new(
    "cleaning",
    &[
        "temizlik", "çöp", "kir", "paspas", "süpürge", "hijyen", "toz", "leke",
    ],
);

const TECHNICAL: KeywordTable = KeywordTable::new(
    "technical",
    &[
        "elektrik", "lamba", "ampul", "asansör", "su", "musluk", "tamir", "bakım", "internet",
        "sigorta",
    ],
);

const LANDSCAPE: KeywordTable = KeywordTable::new(
    "landscape",
    &["bahçe", "çim", "ağaç", "sulama", "çiçek", "peyzaj", "budama"],
);

const NOISE: KeywordTable = KeywordTable::new(
    "noise",
    &["ses", "gürültü", "müzik", "bağırma", "köpek", "havlama", "tadilat"],
);

const PARKING: KeywordTable = KeywordTable::new(
    "parking",
    &["park", "otopark", "araç", "araba", "plaka", "yer"],
);

/// Type tables in precedence order. Anything unmatched is a request.
#[must_use]
pub fn type_tables() -> [(TicketType, KeywordTable); 2] {
    [
        (TicketType::Complaint, COMPLAINT),
        (TicketType::Suggestion, SUGGESTION),
    ]
}

/// Category tables in precedence order. Anything unmatched is general.
#[must_use]
pub fn category_tables() -> [(TicketCategory, KeywordTable); 6] {
    [
        (TicketCategory::Security, SECURITY),
        (TicketCategory::Cleaning, CLEANING),
        (TicketCategory::Technical, TECHNICAL),
        (TicketCategory::Landscape, LANDSCAPE),
        (TicketCategory::Noise, NOISE),
        (TicketCategory::Parking, PARKING),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_find_returns_first_listed() {
        let table = KeywordTable::new("t", &["bozuk", "kırık"]);
        assert_eq!(table.find("kırık ve bozuk"), Some("bozuk"));
        assert_eq!(table.find("sağlam"), None);
    }

    #[test]
    fn test_keyword_table_matches_substrings() {
        assert_eq!(COMPLAINT.find("asansörler bozuktu"), Some("bozuk"));
        assert_eq!(SUGGESTION.find("bir bank koysak güzel olur"), Some("koysak"));
        assert_eq!(COMPLAINT.find("teşekkürler"), None);
    }

    #[test]
    fn test_all_keywords_are_lowercase() {
        let tables = type_tables()
            .into_iter()
            .map(|(_, t)| t)
            .chain(category_tables().into_iter().map(|(_, t)| t));
        for table in tables {
            assert!(!table.keywords.is_empty(), "{} is empty", table.name);
            for keyword in table.keywords {
                assert_eq!(*keyword, keyword.to_lowercase(), "{}", table.name);
            }
        }
    }

    #[test]
    fn test_category_order() {
        let order: Vec<_> = category_tables().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                TicketCategory::Security,
                TicketCategory::Cleaning,
                TicketCategory::Technical,
                TicketCategory::Landscape,
                TicketCategory::Noise,
                TicketCategory::Parking,
            ]
        );
    }
}
