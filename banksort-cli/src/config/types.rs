use std::time::Duration;

use anyhow::{Result, bail};
use banksort_core::{AllocationConfig, SectionQuota};
use banksort_store::{PersistConfig, PostgrestConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEST_TYPE: &str = "EduTest";
pub const DEFAULT_TABLE: &str = banksort_store::postgrest::DEFAULT_TABLE;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = banksort_store::postgrest::DEFAULT_PAGE_SIZE;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBanksortConfig {
    #[serde(default)]
    pub allocation: RawAllocationConfig,

    #[serde(default)]
    pub persist: RawPersistConfig,

    #[serde(default)]
    pub store: RawStoreConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAllocationConfig {
    pub test_type: Option<String>,
    pub practice_instances: Option<u32>,
    /// Replaces the default list wholesale when set
    pub sections: Option<Vec<SectionQuota>>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPersistConfig {
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStoreConfig {
    pub url: Option<String>,
    pub table: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<usize>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BanksortConfig {
    #[serde(default)]
    pub allocation: AllocationSection,

    #[serde(default)]
    pub persist: PersistConfig,

    #[serde(default)]
    pub store: StoreSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSection {
    pub test_type: String,
    pub practice_instances: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Drawn in this order for every practice instance
    pub sections: Vec<SectionQuota>,
}

impl Default for AllocationSection {
    fn default() -> Self {
        let engine = AllocationConfig::default();
        Self {
            test_type: DEFAULT_TEST_TYPE.to_string(),
            practice_instances: engine.practice_instances,
            sections: engine.sections,
            seed: None,
        }
    }
}

impl AllocationSection {
    /// The subset the allocation engine consumes
    pub fn engine(&self) -> AllocationConfig {
        AllocationConfig {
            practice_instances: self.practice_instances,
            sections: self.sections.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Project URL (falls back to SUPABASE_URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub table: String,

    /// Service key (falls back to SUPABASE_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub timeout_secs: u64,

    pub page_size: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            url: None,
            table: DEFAULT_TABLE.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreSection {
    /// Connection settings for the PostgREST store
    pub fn postgrest(&self) -> Result<PostgrestConfig> {
        let Some(url) = self.url.as_deref().filter(|url| !url.trim().is_empty()) else {
            bail!("no store URL configured; set store.url or SUPABASE_URL");
        };
        let mut config = PostgrestConfig::new(url).with_table(&self.table);
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.page_size = self.page_size;
        Ok(config)
    }
}

impl BanksortConfig {
    /// Fail fast on settings no command can work with
    pub fn validate(&self) -> Result<()> {
        self.allocation.engine().validate()?;
        self.persist.validate()?;
        if self.allocation.test_type.trim().is_empty() {
            bail!("allocation.test_type must not be empty");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be at least 1");
        }
        if self.store.page_size == 0 {
            bail!("store.page_size must be at least 1");
        }
        Ok(())
    }

    /// Copy safe to print: the API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.store.api_key.is_some() {
            config.store.api_key = Some("********".to_string());
        }
        config
    }
}
