//! Inbox polling.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use super::{process_incoming_message, InboundMessage, IngestOutcome, IngestSettings};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;

/// A source of inbound messages for the management inbox.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Address this mailbox receives for.
    fn address(&self) -> &str;

    /// Fetch the next unread message, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be read.
    async fn fetch(&self) -> Result<Option<InboundMessage>>;
}

/// Canned resident emails: sender, subject, body.
const SAMPLE_EMAILS: &[(&str, &str, &str)] = &[
    (
        "ahmet@gmail.com",
        "Musluk Arızası",
        "Merhaba Uğur Bey, dairemdeki banyo musluğu sürekli damlatıyor, teknik servis \
         bakabilir mi? (Daire 14)",
    ),
    (
        "ayse@hotmail.com",
        "Kapı Hakkında",
        "Uğur Bey selamlar, sitenin girişindeki otomatik kapı çok yavaş açılıyor, güvenlik \
         riski oluşturabilir.",
    ),
    (
        "mehmet_yeni@gmail.com",
        "Gürültü Şikayeti",
        "İyi günler, alt komşunun köpeği gece çok havlıyor uyuyamıyoruz. Lütfen uyarır mısınız?",
    ),
];

/// A mailbox that, after a delay, always has one of a few sample emails.
#[derive(Debug, Clone)]
pub struct SimulatedMailbox {
    address: String,
    delay: Duration,
}

impl SimulatedMailbox {
    /// Create a simulated mailbox for `address`.
    #[must_use]
    pub fn new(address: impl Into<String>, delay: Duration) -> Self {
        Self {
            address: address.into(),
            delay,
        }
    }

    /// Create a simulated mailbox from the `[inbox]` configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.inbox.address.clone(), config.poll_delay())
    }

    fn pick() -> Option<InboundMessage> {
        SAMPLE_EMAILS
            .choose(&mut rand::thread_rng())
            .map(|(sender, subject, body)| InboundMessage::email(*sender, subject, body))
    }
}

#[async_trait]
impl Mailbox for SimulatedMailbox {
    fn address(&self) -> &str {
        &self.address
    }

    async fn fetch(&self) -> Result<Option<InboundMessage>> {
        debug!(address = %self.address, delay_ms = self.delay.as_millis(), "Polling inbox");
        tokio::time::sleep(self.delay).await;
        Ok(Self::pick())
    }
}

/// Result of one inbox check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboxReport {
    /// The inbox that was checked.
    pub address: String,
    /// The message that was ingested, if any arrived.
    pub outcome: Option<IngestOutcome>,
}

/// Fetch one message from `mailbox` and file it as a ticket.
///
/// # Errors
///
/// Returns an error if the mailbox cannot be read or the message cannot be
/// ingested.
pub async fn check_inbox(
    storage: &Storage,
    classifier: &Classifier,
    settings: &IngestSettings,
    mailbox: &dyn Mailbox,
) -> Result<InboxReport> {
    let address = mailbox.address().to_string();

    let outcome = match mailbox.fetch().await? {
        Some(message) => Some(process_incoming_message(
            storage, classifier, settings, &message,
        )?),
        None => None,
    };

    info!(%address, ingested = outcome.is_some(), "Inbox checked");
    Ok(InboxReport { address, outcome })
}
