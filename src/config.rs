//! Configuration for the dashboard.

use std::env;
use std::time::Duration;

use crate::columns::Entity;
use crate::error::{DashboardError, Result};

/// Storage buckets holding attachment files
#[derive(Debug, Clone)]
pub struct Buckets {
    pub abstracts: String,
    pub receipts: String,
}

impl Buckets {
    /// Bucket holding the attachments of `entity`, if it has any
    pub fn for_entity(&self, entity: Entity) -> Option<&str> {
        match entity {
            Entity::Abstracts => Some(&self.abstracts),
            Entity::PaymentReceipts => Some(&self.receipts),
            _ => None,
        }
    }
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            abstracts: "abstracts".to_string(),
            receipts: "payment-receipts".to_string(),
        }
    }
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend, without trailing slash
    pub backend_url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Address the web server listens on
    pub bind_addr: String,
    pub buckets: Buckets,
    /// Per-request timeout of the HTTP client
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            bind_addr: "127.0.0.1:3000".to_string(),
            buckets: Buckets::default(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Build the configuration from `SUPABASE_URL`, `SUPABASE_ANON_KEY`,
    /// `DASHBOARD_BIND`, `ABSTRACTS_BUCKET`, `RECEIPTS_BUCKET` and
    /// `HTTP_TIMEOUT_SECS`. The first two are required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DashboardError::Config(format!("{key} is not set")))
        };

        let backend_url = required("SUPABASE_URL")?.trim_end_matches('/').to_string();
        let api_key = required("SUPABASE_ANON_KEY")?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    DashboardError::Config(format!("HTTP_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        Ok(Self {
            backend_url,
            api_key,
            bind_addr: lookup("DASHBOARD_BIND").unwrap_or(defaults.bind_addr),
            buckets: Buckets {
                abstracts: lookup("ABSTRACTS_BUCKET").unwrap_or(defaults.buckets.abstracts),
                receipts: lookup("RECEIPTS_BUCKET").unwrap_or(defaults.buckets.receipts),
            },
            http_timeout,
        })
    }
}
