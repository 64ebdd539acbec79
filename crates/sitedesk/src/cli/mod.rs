//! Command-line interface for sitedesk.
//!
//! This module provides the CLI structure, argument types and output
//! rendering for the `sitedesk` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CategoryArg, ClassifyCommand, ConfigCommand, InboxCommand, IngestCommand, LoginCommand,
    OutputFormat, PasswordResetCommand, SourceArg, StatusArg, StatusCommand, TicketCommand,
    TicketListCommand, TicketTypeArg, UserCommand,
};

/// sitedesk - Complaint and request desk for a housing complex
///
/// Residents file tickets and follow replies; the management triages them,
/// registers residents, and turns incoming email and WhatsApp messages
/// into tickets.
#[derive(Debug, Parser)]
#[command(name = "sitedesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login(LoginCommand),

    /// End the session
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set a new password for an account
    PasswordReset(PasswordResetCommand),

    /// Manage resident accounts
    #[command(subcommand)]
    User(UserCommand),

    /// File, list and answer tickets
    #[command(subcommand)]
    Ticket(TicketCommand),

    /// File an email or WhatsApp message as a ticket
    Ingest(IngestCommand),

    /// Work with the management inbox
    #[command(subcommand)]
    Inbox(InboxCommand),

    /// Show ticket counts by status, type and category
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show database status
    Status(StatusCommand),

    /// Show how a text would be classified
    Classify(ClassifyCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            crate::logging::Verbosity::from_count(self.verbose)
        }
    }
}
