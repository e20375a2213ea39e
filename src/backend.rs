//! Backend collaborators
//!
//! The hosted backend is reached through two narrow seams: a table query that
//! returns raw rows, and an object-storage fetch that returns attachment
//! bytes. [`SupabaseClient`] implements both over HTTP; tests substitute
//! in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::normalize::RawRecord;

/// Source of raw rows
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All rows of `table`, oldest first by `created_at`
    async fn fetch_table(&self, table: &str) -> Result<Vec<RawRecord>>;
}

/// Source of attachment files
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn fetch_attachment(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;
}

#[cfg(feature = "web")]
pub use supabase::SupabaseClient;

#[cfg(feature = "web")]
mod supabase {
    use async_trait::async_trait;
    use log::{debug, warn};
    use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
    use serde::Deserialize;

    use super::{AttachmentSource, RecordSource};
    use crate::config::Config;
    use crate::error::{DashboardError, Result};
    use crate::normalize::RawRecord;

    /// Error payload returned by the REST and storage APIs
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    /// HTTP client for a Supabase-style backend (PostgREST + storage)
    pub struct SupabaseClient {
        base_url: String,
        client: reqwest::Client,
    }

    impl SupabaseClient {
        pub fn new(config: &Config) -> Result<Self> {
            let mut headers = HeaderMap::new();
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| DashboardError::Config(format!("invalid api key: {e}")))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| DashboardError::Config(format!("invalid api key: {e}")))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);

            let client = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .default_headers(headers)
                .build()?;

            Ok(Self {
                base_url: config.backend_url.clone(),
                client,
            })
        }

        fn table_url(&self, table: &str) -> String {
            format!(
                "{}/rest/v1/{}?select=*&order=created_at.asc",
                self.base_url, table
            )
        }

        fn object_url(&self, bucket: &str, path: &str) -> String {
            let encoded = path
                .split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/");
            format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, encoded)
        }

        /// Turn a non-success response into a backend error carrying its message
        async fn error_from(resp: reqwest::Response) -> DashboardError {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or_else(|| format!("request failed with status {status}"));
            DashboardError::Backend(message)
        }
    }

    #[async_trait]
    impl RecordSource for SupabaseClient {
        async fn fetch_table(&self, table: &str) -> Result<Vec<RawRecord>> {
            let url = self.table_url(table);
            debug!("fetching table {table}");
            let resp = self.client.get(&url).send().await?;
            if !resp.status().is_success() {
                let err = Self::error_from(resp).await;
                warn!("table {table} fetch failed: {err}");
                return Err(err);
            }
            let rows: Vec<serde_json::Value> = resp.json().await?;
            Ok(rows.into_iter().map(RawRecord::from).collect())
        }
    }

    #[async_trait]
    impl AttachmentSource for SupabaseClient {
        async fn fetch_attachment(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
            let url = self.object_url(bucket, path);
            let resp = self.client.get(&url).send().await?;
            if !resp.status().is_success() {
                return Err(Self::error_from(resp).await);
            }
            Ok(resp.bytes().await?.to_vec())
        }
    }
}
