//! PostgREST-backed question store.
//!
//! Reads the pool from and writes labels to a table exposed at
//! `{base_url}/rest/v1/{table}` (the layout Supabase serves).
//!
//! # Example
//!
//! ```ignore
//! use banksort_store::{PostgrestConfig, PostgrestStore};
//!
//! let store = PostgrestStore::new(PostgrestConfig::new("https://xyz.supabase.co"))?;
//! let pool = store.fetch_unassigned("EduTest").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use banksort_core::{ItemId, RAW_LABEL, RawItem, SetLabel};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result, SinkError};
use crate::traits::{CensusRow, ItemSink, QuestionSource};

/// Default table holding the question bank.
pub const DEFAULT_TABLE: &str = "educoach_questions";

/// Default number of rows requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POOL_COLUMNS: &str = "id,test_section,sub_skill,difficulty,set_id";
const CENSUS_COLUMNS: &str = "set_id,test_section";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// A question row as PostgREST returns it.
#[derive(Debug, Deserialize)]
struct QuestionRow {
    id: ItemId,
    #[serde(default)]
    test_section: Option<String>,
    #[serde(default)]
    sub_skill: Option<String>,
    /// Numbers and numeric strings are accepted; anything else counts as missing.
    #[serde(default)]
    difficulty: Option<serde_json::Value>,
    #[serde(default)]
    set_id: Option<String>,
}

impl From<QuestionRow> for RawItem {
    fn from(row: QuestionRow) -> Self {
        let difficulty = row.difficulty.and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        RawItem {
            id: row.id,
            section: row.test_section,
            sub_skill: row.sub_skill,
            difficulty,
            set_label: row.set_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CensusRecord {
    #[serde(default)]
    set_id: Option<String>,
    #[serde(default)]
    test_section: Option<String>,
}

#[derive(Debug, Serialize)]
struct LabelPatch {
    set_id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// PostgrestStore
// ────────────────────────────────────────────────────────────────────────────

/// Connection settings for [`PostgrestStore`].
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub base_url: String,
    pub table: String,
    /// Sent as `apikey` and bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub page_size: usize,
}

impl PostgrestConfig {
    /// Settings for `base_url` with default table, timeout and paging.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            table: DEFAULT_TABLE.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the table name.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Question source and label sink speaking the PostgREST protocol.
pub struct PostgrestStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    page_size: usize,
}

impl PostgrestStore {
    /// Build a store from its settings.
    pub fn new(config: PostgrestConfig) -> Result<Self> {
        if config.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be at least 1".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.base_url.trim_end_matches('/'),
                config.table
            ),
            api_key: config.api_key,
            page_size: config.page_size,
        })
    }

    /// The table endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let builder = self.client.request(method, &self.endpoint);
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }

    /// Fetch every row matching `filters`, one page at a time.
    ///
    /// The server may cap a response below `page_size` (PostgREST `max-rows`),
    /// so only an empty page ends the scan.
    async fn fetch_all<T>(&self, select: &str, filters: &[(&str, String)]) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut rows = Vec::new();
        loop {
            let offset = rows.len();
            let response = self
                .request(Method::GET)
                .query(&[("select", select), ("order", "id.asc")])
                .query(filters)
                .query(&[("limit", self.page_size), ("offset", offset)])
                .send()
                .await
                .map_err(|e| Error::SourceUnavailable(format!("cannot reach {}: {e}", self.endpoint)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::SourceUnavailable(format!(
                    "query returned status {status}: {body}"
                )));
            }
            let page: Vec<T> = response
                .json()
                .await
                .map_err(|e| Error::SourceUnavailable(format!("malformed query response: {e}")))?;

            if page.is_empty() {
                return Ok(rows);
            }
            rows.extend(page);
            debug!(total = rows.len(), "fetched page");
        }
    }
}

#[async_trait]
impl QuestionSource for PostgrestStore {
    async fn fetch_unassigned(&self, test_type: &str) -> Result<Vec<RawItem>> {
        let filters = [
            ("test_type", format!("eq.{test_type}")),
            ("set_id", format!("eq.{RAW_LABEL}")),
        ];
        let rows: Vec<QuestionRow> = self.fetch_all(POOL_COLUMNS, &filters).await?;
        Ok(rows.into_iter().map(RawItem::from).collect())
    }

    async fn fetch_census(&self, test_type: &str) -> Result<Vec<CensusRow>> {
        let filters = [("test_type", format!("eq.{test_type}"))];
        let rows: Vec<CensusRecord> = self.fetch_all(CENSUS_COLUMNS, &filters).await?;
        Ok(rows
            .into_iter()
            .map(|row| CensusRow {
                set_label: row.set_id,
                section: row.test_section,
            })
            .collect())
    }
}

#[async_trait]
impl ItemSink for PostgrestStore {
    async fn write_label(&self, id: &ItemId, label: &SetLabel) -> std::result::Result<(), SinkError> {
        let response = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&LabelPatch {
                set_id: label.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
