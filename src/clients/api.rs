use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::{Direction, Transaction};
use crate::ingest::{SinkOutcome, TransactionSink};
use crate::resolve::{AccountDirectory, AccountRef};

/// Accounting-backend client: account directory plus transaction sink. The
/// backend treats `email_id` as the idempotency key and answers 409 for a
/// transaction it has already stored.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ApiAccount {
    id: i64,
    bank: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    name: &'a str,
    bank: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTransactionRequest<'a> {
    account_id: i64,
    email_id: &'a str,
    tx_date: String,
    /// Exact decimal string, passed through unconverted.
    tx_amount: &'a str,
    tx_direction: Direction,
    tx_desc: &'a str,
    tx_currency: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    category: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    user_notes: &'a str,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("error creating api http client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }
}

impl AccountDirectory for ApiClient {
    async fn list_accounts(&self) -> Result<Vec<AccountRef>> {
        let res = self
            .client
            .get(format!("{base}/api/accounts", base = self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("error making accounts req")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("accounts req error {status}: {text}"));
        }

        let accounts = res
            .json::<Vec<ApiAccount>>()
            .await
            .context("error parsing accounts res")?;

        Ok(accounts
            .into_iter()
            .map(|account| AccountRef {
                id: account.id,
                institution: account.bank,
                label: account.name,
            })
            .collect())
    }

    async fn create_account(&self, label: &str, institution: &str) -> Result<i64> {
        let res = self
            .client
            .post(format!("{base}/api/accounts", base = self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CreateAccountRequest {
                name: label,
                bank: institution,
            })
            .send()
            .await
            .context("error making create account req")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("create account req error {status}: {text}"));
        }

        let account = res
            .json::<ApiAccount>()
            .await
            .context("error parsing create account res")?;

        Ok(account.id)
    }
}

impl TransactionSink for ApiClient {
    async fn create_transaction(&self, tx: &Transaction) -> Result<SinkOutcome> {
        let account_id = tx
            .account_id
            .ok_or_else(|| anyhow!("transaction {} has no resolved account", tx.email_id))?;

        let payload = CreateTransactionRequest {
            account_id,
            email_id: &tx.email_id,
            tx_date: tx.tx_date.to_rfc3339(),
            tx_amount: &tx.amount,
            tx_direction: tx.direction,
            tx_desc: &tx.description,
            tx_currency: &tx.currency,
            category: &tx.category,
            user_notes: &tx.user_notes,
        };

        let res = self
            .client
            .post(format!("{base}/api/transactions", base = self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("error making create transaction req")?;

        match res.status() {
            StatusCode::CREATED => Ok(SinkOutcome::Created),
            StatusCode::CONFLICT => Ok(SinkOutcome::Duplicate),
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(anyhow!("create transaction req error {status}: {text}"))
            }
        }
    }
}
