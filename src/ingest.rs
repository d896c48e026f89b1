use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::domain::Transaction;
use crate::email::EmailMeta;
use crate::error::IngestError;
use crate::parsing::{self, TemplateParser};
use crate::resolve::{AccountDirectory, AccountResolver};

/// Inbound mailbox. Fetching must not mark the message; `mark_processed`
/// is called only once the message's fate is settled.
pub trait MessageSource {
    async fn unread_ids(&self) -> Result<Vec<String>>;
    async fn fetch(&self, id: &str) -> Result<Vec<u8>>;
    async fn mark_processed(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Created,
    Duplicate,
}

pub trait TransactionSink {
    async fn create_transaction(&self, tx: &Transaction) -> Result<SinkOutcome>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub dropped: usize,
    pub deferred: usize,
}

enum Outcome {
    Stored,
    Duplicate,
    NoParser,
}

/// Drives one batch of unread messages through decode -> match -> parse ->
/// resolve -> sink, isolating failures per message.
pub struct Processor<S, D, K> {
    source: S,
    directory: D,
    sink: K,
    registry: Vec<TemplateParser>,
    overrides: HashMap<String, String>,
    default_account: Option<i64>,
    auto_create: bool,
}

impl<S: MessageSource, D: AccountDirectory, K: TransactionSink> Processor<S, D, K> {
    pub fn new(
        source: S,
        directory: D,
        sink: K,
        registry: Vec<TemplateParser>,
        overrides: HashMap<String, String>,
        default_account: Option<i64>,
        auto_create: bool,
    ) -> Self {
        Self {
            source,
            directory,
            sink,
            registry,
            overrides,
            default_account,
            auto_create,
        }
    }

    pub async fn run_once(&self) -> Result<RunReport> {
        let ids = self
            .source
            .unread_ids()
            .await
            .context("error listing unread messages")?;

        let mut report = RunReport {
            fetched: ids.len(),
            ..RunReport::default()
        };

        if ids.is_empty() {
            return Ok(report);
        }

        // one account snapshot per run; provisioned ids are recorded into it
        let accounts = self
            .directory
            .list_accounts()
            .await
            .context("error fetching account directory")?;
        let mut resolver = AccountResolver::new(
            &accounts,
            self.overrides.clone(),
            self.default_account,
            self.auto_create,
        );

        for id in &ids {
            match self.process_message(id, &mut resolver).await {
                Ok(Outcome::Stored) => {
                    report.stored += 1;
                    self.mark(id).await;
                }
                Ok(Outcome::Duplicate) => {
                    info!("transaction for {id} already stored, skipping duplicate");
                    report.duplicates += 1;
                    self.mark(id).await;
                }
                Ok(Outcome::NoParser) => {
                    report.unmatched += 1;
                    self.mark(id).await;
                }
                Err(err) if err.is_retryable() => {
                    warn!("remote call failed for {id}, will retry next run: {err:#}");
                    report.deferred += 1;
                }
                Err(err) => {
                    warn!("dropping message {id}: {err}");
                    report.dropped += 1;
                    self.mark(id).await;
                }
            }
        }

        Ok(report)
    }

    async fn process_message(
        &self,
        id: &str,
        resolver: &mut AccountResolver,
    ) -> Result<Outcome, IngestError> {
        let raw = self
            .source
            .fetch(id)
            .await
            .with_context(|| format!("error fetching message {id}"))?;

        let meta = EmailMeta::from_raw(id, &raw)?;

        let Some(parser) = parsing::find(&self.registry, &meta) else {
            info!("no parser matched {id}, subject {:?}", meta.subject);
            return Ok(Outcome::NoParser);
        };

        let mut tx = parser.parse(&meta).inspect_err(|err| {
            if let IngestError::FieldNotFound(_) = err {
                debug!("email text for {id}: {}", meta.text);
            }
        })?;

        resolver.resolve(&self.directory, &mut tx).await?;

        debug!(
            "sending {id} to sink: parser {}, account {:?}, amount {}",
            parser.name, tx.account_id, tx.amount
        );

        match self
            .sink
            .create_transaction(&tx)
            .await
            .context("error creating transaction")?
        {
            SinkOutcome::Created => Ok(Outcome::Stored),
            SinkOutcome::Duplicate => Ok(Outcome::Duplicate),
        }
    }

    async fn mark(&self, id: &str) {
        if let Err(err) = self.source.mark_processed(id).await {
            warn!("error marking message {id} processed: {err:#}");
        }
    }
}
