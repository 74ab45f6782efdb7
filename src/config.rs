use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};

use crate::notes_app::Account;

pub const DEFAULT_API_URL: &str = "https://saas-backend.vercel.app";
const LOG_FILE_NAME: &str = "saas_notes.log";

/// Terminal client for the SaaS Notes API.
#[derive(Debug, Parser)]
#[command(name = "saas_notes", version, about)]
pub struct Config {
    /// Base URL of the notes API.
    #[arg(long, env = "SAAS_NOTES_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Extra account listed on the login screen (needs --password too).
    #[arg(long, env = "SAAS_NOTES_EMAIL", requires = "password")]
    pub email: Option<String>,

    #[arg(long, env = "SAAS_NOTES_PASSWORD", hide_env_values = true, requires = "email")]
    pub password: Option<String>,

    /// Where logs go; the terminal is owned by the UI.
    #[arg(long, env = "SAAS_NOTES_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Check that the API is reachable and exit.
    #[arg(long)]
    pub check: bool,
}

impl Config {
    /// Validated API URL without a trailing slash.
    pub fn api_url(&self) -> Result<String> {
        let trimmed = self.api_url.trim();
        if trimmed.is_empty() {
            return Err(eyre!("API URL must not be empty"));
        }
        url::Url::parse(trimmed).wrap_err_with(|| format!("Invalid API URL: {trimmed}"))?;
        Ok(trimmed.trim_end_matches('/').to_string())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE_NAME))
    }

    /// The configured account, if any, followed by the demo accounts.
    pub fn accounts(&self) -> Vec<Account> {
        let mut accounts = Vec::new();
        if let (Some(email), Some(password)) = (&self.email, &self.password) {
            accounts.push(Account::new(&format!("Login as {email}"), email, password));
        }
        accounts.extend(Account::demo_accounts());
        accounts
    }
}
