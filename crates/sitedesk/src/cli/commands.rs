//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{TicketCategory, TicketSource, TicketStatus, TicketType};
use crate::storage::TicketFilter;

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account username
    pub username: String,

    /// Account password
    pub password: String,
}

/// Forgot-password command arguments.
#[derive(Debug, Args)]
pub struct PasswordResetCommand {
    /// Account username
    pub username: String,

    /// The new password
    pub new_password: String,
}

/// Account management commands (admin only).
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a resident
    Add {
        /// Full name, e.g. "Zeynep Kaya (Daire 8)"
        #[arg(short, long)]
        name: String,

        /// Login name
        #[arg(short, long)]
        username: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Email address used to match inbound email
        #[arg(short, long)]
        email: Option<String>,

        /// Phone number used to match inbound WhatsApp messages
        #[arg(long)]
        phone: Option<String>,
    },

    /// Register residents from a JSON array of rows
    Import {
        /// Path to the JSON file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// List all accounts
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Ticket commands.
#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// File a new ticket
    New {
        /// Short summary
        #[arg(short, long)]
        title: String,

        /// Full description
        #[arg(short, long)]
        description: String,

        /// Ticket type (detected from the text if omitted)
        #[arg(short = 'k', long = "type", value_enum)]
        ticket_type: Option<TicketTypeArg>,

        /// Category (detected from the text if omitted)
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// List tickets
    List(TicketListCommand),

    /// Show a ticket with its comments
    Show {
        /// Ticket id
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Reply to a ticket
    Comment {
        /// Ticket id
        id: i64,

        /// Comment text
        text: String,
    },

    /// Change a ticket's status (admin only)
    Status {
        /// Ticket id
        id: i64,

        /// New status
        #[arg(value_enum)]
        status: StatusArg,
    },
}

/// Ticket list arguments.
#[derive(Debug, Args)]
pub struct TicketListCommand {
    /// Only tickets in this status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Only tickets of this type
    #[arg(short = 'k', long = "type", value_enum)]
    pub ticket_type: Option<TicketTypeArg>,

    /// Only tickets in this category
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Text to look for in title or description
    #[arg(long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl TicketListCommand {
    /// The storage filter these arguments describe.
    #[must_use]
    pub fn filter(&self) -> TicketFilter {
        TicketFilter {
            status: self.status.map(Into::into),
            ticket_type: self.ticket_type.map(Into::into),
            category: self.category.map(Into::into),
            author_id: None,
            search: self.search.clone(),
        }
    }
}

/// Ingest command arguments (admin only).
#[derive(Debug, Args)]
pub struct IngestCommand {
    /// Channel the message came through
    #[arg(short, long, value_enum)]
    pub source: SourceArg,

    /// Sender email address or phone number
    pub sender: String,

    /// Message text
    pub content: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Management inbox commands (admin only).
#[derive(Debug, Subcommand)]
pub enum InboxCommand {
    /// Poll the inbox once and file any new message
    Check {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Classify command arguments.
#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// Text to classify
    pub text: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Ticket type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TicketTypeArg {
    /// Something is wrong
    Complaint,
    /// Something is wanted
    Request,
    /// Something could be better
    Suggestion,
}

impl From<TicketTypeArg> for TicketType {
    fn from(arg: TicketTypeArg) -> Self {
        match arg {
            TicketTypeArg::Complaint => Self::Complaint,
            TicketTypeArg::Request => Self::Request,
            TicketTypeArg::Suggestion => Self::Suggestion,
        }
    }
}

/// Category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Anything else
    General,
    /// Gates, cameras, guards
    Security,
    /// Garbage and common areas
    Cleaning,
    /// Gardens and trees
    Landscape,
    /// Lifts, water, electricity
    Technical,
    /// Neighbours, pets, renovation
    Noise,
    /// Car park
    Parking,
}

impl From<CategoryArg> for TicketCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::General => Self::General,
            CategoryArg::Security => Self::Security,
            CategoryArg::Cleaning => Self::Cleaning,
            CategoryArg::Landscape => Self::Landscape,
            CategoryArg::Technical => Self::Technical,
            CategoryArg::Noise => Self::Noise,
            CategoryArg::Parking => Self::Parking,
        }
    }
}

/// Status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Not yet picked up
    Open,
    /// Being worked on
    InProgress,
    /// Fixed
    Resolved,
    /// Closed without further action
    Closed,
}

impl From<StatusArg> for TicketStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => Self::Open,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Resolved => Self::Resolved,
            StatusArg::Closed => Self::Closed,
        }
    }
}

/// Inbound channel argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Email to the management inbox
    Email,
    /// WhatsApp message
    #[value(name = "whatsapp")]
    WhatsApp,
}

impl From<SourceArg> for TicketSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Email => Self::Email,
            SourceArg::WhatsApp => Self::WhatsApp,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(TicketStatus::from(StatusArg::Open), TicketStatus::Open);
        assert_eq!(
            TicketStatus::from(StatusArg::InProgress),
            TicketStatus::InProgress
        );
        assert_eq!(
            TicketStatus::from(StatusArg::Resolved),
            TicketStatus::Resolved
        );
        assert_eq!(TicketStatus::from(StatusArg::Closed), TicketStatus::Closed);
    }

    #[test]
    fn test_arg_enums_cover_model() {
        assert_eq!(
            TicketTypeArg::value_variants().len(),
            TicketType::ALL.len()
        );
        assert_eq!(
            CategoryArg::value_variants().len(),
            TicketCategory::ALL.len()
        );
        assert_eq!(StatusArg::value_variants().len(), TicketStatus::ALL.len());
    }

    #[test]
    fn test_category_arg_conversion_matches_keys() {
        for arg in CategoryArg::value_variants() {
            let name = arg.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(TicketCategory::from(*arg).as_str(), name);
        }
    }

    #[test]
    fn test_source_arg_names() {
        let names: Vec<_> = SourceArg::value_variants()
            .iter()
            .map(|v| v.to_possible_value().unwrap().get_name().to_string())
            .collect();
        assert_eq!(names, vec!["email", "whatsapp"]);
        assert_eq!(TicketSource::from(SourceArg::WhatsApp), TicketSource::WhatsApp);
    }

    #[test]
    fn test_list_filter() {
        let cmd = TicketListCommand {
            status: Some(StatusArg::InProgress),
            ticket_type: None,
            category: Some(CategoryArg::Cleaning),
            search: Some("havuz".to_string()),
            format: OutputFormat::Table,
        };
        let filter = cmd.filter();

        assert_eq!(filter.status, Some(TicketStatus::InProgress));
        assert_eq!(filter.ticket_type, None);
        assert_eq!(filter.category, Some(TicketCategory::Cleaning));
        assert_eq!(filter.author_id, None);
        assert_eq!(filter.search.as_deref(), Some("havuz"));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
