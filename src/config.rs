use anyhow::Context;
use dotenv::dotenv;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub mailpit_url: String,
    pub mailpit_username: Option<String>,
    pub mailpit_password: Option<String>,
    pub api_base_url: String,
    pub api_key: String,
    pub default_account_id: Option<i64>,
    #[serde(default)]
    pub auto_create_accounts: bool,
    pub account_overrides_path: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn new() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let envs = envy::from_env::<Self>().context("invalid environment variables")?;

        return Ok(envs);
    }
}
