use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::ingest::MessageSource;

/// Mailbox client over the Mailpit HTTP API. Fetching a message does not
/// mark it read; `mark_processed` does, so messages that failed on a remote
/// call stay unread and are retried next run.
pub struct MailpitClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesPage {
    messages: Vec<MessageSummary>,
}

#[derive(Debug, Deserialize)]
struct MessageSummary {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Read")]
    read: bool,
}

impl MailpitClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("error creating mailbox http client")?;

        Ok(Self {
            client,
            base_url: config.mailpit_url.trim_end_matches('/').to_owned(),
            username: config.mailpit_username.clone(),
            password: config.mailpit_password.clone(),
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => req.basic_auth(user, Some(pass)),
            _ => req,
        }
    }
}

impl MessageSource for MailpitClient {
    async fn unread_ids(&self) -> Result<Vec<String>> {
        let res = self
            .authed(
                self.client
                    .get(format!("{base}/api/v1/messages", base = self.base_url)),
            )
            .send()
            .await
            .context("error making messages req")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("messages req error {status}: {text}"));
        }

        let page = res
            .json::<MessagesPage>()
            .await
            .context("error parsing messages res")?;

        Ok(page
            .messages
            .into_iter()
            .filter(|m| !m.read)
            .map(|m| m.id)
            .collect())
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>> {
        let res = self
            .authed(self.client.get(format!(
                "{base}/api/v1/message/{id}/raw",
                base = self.base_url
            )))
            .send()
            .await
            .context("error making raw message req")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("raw message req error {status}: {text}"));
        }

        let bytes = res.bytes().await.context("error reading raw message")?;
        Ok(bytes.to_vec())
    }

    async fn mark_processed(&self, id: &str) -> Result<()> {
        let res = self
            .authed(
                self.client
                    .put(format!("{base}/api/v1/messages", base = self.base_url)),
            )
            .json(&json!({ "IDs": [id], "Read": true }))
            .send()
            .await
            .context("error making mark-read req")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow!("mark-read req error {status}: {text}"));
        }

        Ok(())
    }
}
