//! `sitedesk` - CLI for the housing complex ticket desk
//!
//! This binary provides the command-line interface for residents and
//! administrators: logging in, filing and answering tickets, managing
//! accounts and routing inbound messages.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Serialize;

use sitedesk::cli::{
    output, ClassifyCommand, Cli, Command, ConfigCommand, InboxCommand, IngestCommand,
    OutputFormat, TicketCommand, UserCommand,
};
use sitedesk::{
    init_logging, Classifier, Config, Desk, InboundMessage, NewUser, SimulatedMailbox, Storage,
    TicketDraft, User,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    run(&config, cli.command).await
}

fn open_desk(config: &Config) -> anyhow::Result<Desk> {
    let storage = Storage::open(config.database_path())?;
    if config.storage.seed_demo_data {
        storage.seed_demo_data()?;
    }
    Ok(Desk::new(storage, config.ingest.clone().into()))
}

/// Dispatch one command. Only commands that touch tickets or accounts open
/// the database.
async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let desk = || open_desk(config);
    match command {
        Command::Login(cmd) => {
            let user = desk()?.login(&cmd.username, &cmd.password)?;
            println!("Logged in as {} ({})", user.name, user.role.label());
        }
        Command::Logout => {
            desk()?.logout()?;
            println!("Logged out.");
        }
        Command::Whoami { json } => {
            let user = actor(&desk()?)?;
            if json {
                print_json(&user)?;
            } else {
                println!("{} ({}, {})", user.name, user.username, user.role.label());
            }
        }
        Command::PasswordReset(cmd) => {
            desk()?.reset_password(&cmd.username, &cmd.new_password)?;
            println!("Password updated for {}.", cmd.username);
        }
        Command::User(user_cmd) => handle_user(&desk()?, user_cmd)?,
        Command::Ticket(ticket_cmd) => handle_ticket(&desk()?, ticket_cmd)?,
        Command::Ingest(ingest_cmd) => handle_ingest(&desk()?, &ingest_cmd)?,
        Command::Inbox(InboxCommand::Check { json }) => {
            let desk = desk()?;
            let user = actor(&desk)?;
            let mailbox = SimulatedMailbox::from_config(config);
            let report = desk.check_inbox(&user, &mailbox).await?;
            if json {
                print_json(&report)?;
            } else {
                println!("{}", output::inbox_report(&report));
            }
        }
        Command::Stats { json } => {
            let desk = desk()?;
            let stats = desk.stats(&actor(&desk)?)?;
            if json {
                print_json(&stats)?;
            } else {
                print!("{}", output::stats(&stats));
            }
        }
        Command::Status(status_cmd) => handle_status(&desk()?, status_cmd.json)?,
        Command::Config(config_cmd) => handle_config(config, config_cmd)?,
        Command::Classify(classify_cmd) => handle_classify(&classify_cmd)?,
    }
    Ok(())
}

/// The logged-in user, with a hint when there is none.
fn actor(desk: &Desk) -> anyhow::Result<User> {
    desk.current_user().map_err(|e| {
        if e.is_not_logged_in() {
            anyhow!("not logged in; run `sitedesk login <username> <password>` first")
        } else {
            e.into()
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_user(desk: &Desk, cmd: UserCommand) -> anyhow::Result<()> {
    let user = actor(desk)?;
    match cmd {
        UserCommand::Add {
            name,
            username,
            password,
            email,
            phone,
        } => {
            let created = desk.create_user(
                &user,
                &NewUser {
                    name,
                    username,
                    password,
                    email,
                    phone,
                },
            )?;
            println!("Created {} ({})", created.username, created.id);
        }
        UserCommand::Import { file, format } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let rows: Vec<NewUser> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of users", file.display()))?;
            let report = desk.import_users(&user, &rows)?;
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Plain | OutputFormat::Table => {
                    print!("{}", output::batch_report(&report));
                }
            }
        }
        UserCommand::List { format } => {
            let users = desk.users(&user)?;
            match format {
                OutputFormat::Json => print_json(&users)?,
                OutputFormat::Table => println!("{}", output::user_table(&users)),
                OutputFormat::Plain => print!("{}", output::user_lines(&users)),
            }
        }
    }
    Ok(())
}

fn handle_ticket(desk: &Desk, cmd: TicketCommand) -> anyhow::Result<()> {
    let user = actor(desk)?;
    match cmd {
        TicketCommand::New {
            title,
            description,
            ticket_type,
            category,
            format,
        } => {
            let draft = TicketDraft {
                title,
                description,
                ticket_type: ticket_type.map(Into::into),
                category: category.map(Into::into),
            };
            let ticket = desk.submit_ticket(&user, &draft)?;
            match format {
                OutputFormat::Json => print_json(&ticket)?,
                OutputFormat::Plain | OutputFormat::Table => println!(
                    "Filed ticket #{} as {} ({})",
                    ticket.id,
                    ticket.ticket_type.label(),
                    ticket.category.label()
                ),
            }
        }
        TicketCommand::List(list_cmd) => {
            let tickets = desk.visible_tickets(&user, &list_cmd.filter())?;
            match list_cmd.format {
                OutputFormat::Json => print_json(&tickets)?,
                OutputFormat::Table => println!("{}", output::ticket_table(&tickets)),
                OutputFormat::Plain => print!("{}", output::ticket_lines(&tickets)),
            }
        }
        TicketCommand::Show { id, format } => {
            let ticket = desk.ticket(&user, id)?;
            match format {
                OutputFormat::Json => print_json(&ticket)?,
                OutputFormat::Plain | OutputFormat::Table => {
                    print!("{}", output::ticket_detail(&ticket));
                }
            }
        }
        TicketCommand::Comment { id, text } => {
            let ticket = desk.comment(&user, id, &text)?;
            println!(
                "Comment added to #{} ({} comment(s))",
                ticket.id,
                ticket.comments.len()
            );
        }
        TicketCommand::Status { id, status } => {
            let ticket = desk.set_status(&user, id, status.into())?;
            println!("Ticket #{} is now {}", ticket.id, ticket.status.label());
        }
    }
    Ok(())
}

fn handle_ingest(desk: &Desk, cmd: &IngestCommand) -> anyhow::Result<()> {
    let user = actor(desk)?;
    let message = InboundMessage::new(cmd.source.into(), &cmd.sender, &cmd.content);
    let outcome = desk.ingest(&user, &message)?;
    if cmd.json {
        print_json(&outcome)?;
    } else {
        println!("{}", output::ingest_outcome(&outcome));
    }
    Ok(())
}

fn handle_status(desk: &Desk, json: bool) -> anyhow::Result<()> {
    let stats = desk.storage().stats()?;
    let session = desk.storage().session()?;

    if json {
        let status = serde_json::json!({
            "database_path": desk.storage().path(),
            "users": stats.users,
            "tickets": stats.tickets,
            "comments": stats.comments,
            "db_size_bytes": stats.db_size_bytes,
            "logged_in_as": session.as_ref().map(|u| u.username.as_str()),
        });
        print_json(&status)?;
    } else {
        println!("sitedesk status");
        println!("---------------");
        println!("Database:      {}", desk.storage().path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Users:         {}", stats.users);
        println!("Tickets:       {}", stats.tickets);
        println!("Comments:      {}", stats.comments);
        println!(
            "Logged in as:  {}",
            session.map_or_else(|| "-".to_string(), |u| u.username)
        );
    }
    Ok(())
}

fn handle_classify(cmd: &ClassifyCommand) -> anyhow::Result<()> {
    let result = Classifier::new().classify(&cmd.text);
    if cmd.json {
        print_json(&result)?;
    } else {
        println!("{}", output::classification(&result));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Seed demo data:     {}", config.storage.seed_demo_data);
                println!();
                println!("[Ingest]");
                println!(
                    "  Title preview:      {} chars",
                    config.ingest.title_preview_chars
                );
                println!(
                    "  Unregistered tag:   {}",
                    config.ingest.unregistered_suffix
                );
                println!();
                println!("[Inbox]");
                println!("  Address:            {}", config.inbox.address);
                println!("  Poll delay:         {} ms", config.inbox.poll_delay_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("configuration error in {}", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
