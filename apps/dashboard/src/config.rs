use anyhow::{bail, Context, Result};
use uuid::Uuid;

/// Which dashboard this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardRole {
    Guide,
    Programmer,
}

impl DashboardRole {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "guide" => Ok(DashboardRole::Guide),
            "programmer" => Ok(DashboardRole::Programmer),
            other => bail!("USER_ROLE must be 'guide' or 'programmer', got '{other}'"),
        }
    }
}

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub user_id: Uuid,
    pub role: DashboardRole,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let user_id = require_env("USER_ID")?;
        Ok(Config {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            user_id: Uuid::parse_str(&user_id).context("USER_ID must be a valid UUID")?,
            role: DashboardRole::parse(&require_env("USER_ROLE")?)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
