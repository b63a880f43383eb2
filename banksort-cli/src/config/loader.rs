use super::types::{
    AllocationSection, BanksortConfig, DEFAULT_PAGE_SIZE, DEFAULT_TABLE, DEFAULT_TEST_TYPE,
    DEFAULT_TIMEOUT_SECS, RawAllocationConfig, RawBanksortConfig, RawPersistConfig,
    RawStoreConfig, StoreSection,
};
use anyhow::{Context, Result};
use banksort_store::PersistConfig;
use std::path::{Path, PathBuf};

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_KEY";
pub const PROJECT_DIR_ENV: &str = "BANKSORT_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + environment)
    pub fn load() -> Result<BanksortConfig> {
        let layers = [Self::user_config_path(), Self::project_config_path()];
        let raw = Self::load_layers(&layers)?;
        Ok(Self::finalize(raw))
    }

    /// Read and merge every existing file, later files overriding earlier ones
    pub fn load_layers(paths: &[PathBuf]) -> Result<RawBanksortConfig> {
        let mut raw = RawBanksortConfig::default();
        for path in paths.iter().filter(|path| path.exists()) {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }
        Ok(raw)
    }

    fn read_raw(path: &Path) -> Result<RawBanksortConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// User config path ($XDG_CONFIG_HOME/banksort/config.toml)
    pub fn user_config_path() -> PathBuf {
        banksort_paths::config_file()
    }

    /// Project config path
    /// Can be overridden with BANKSORT_PROJECT_CONFIG_DIR (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".banksort/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawBanksortConfig, overlay: RawBanksortConfig) -> RawBanksortConfig {
        RawBanksortConfig {
            allocation: RawAllocationConfig {
                test_type: overlay.allocation.test_type.or(base.allocation.test_type),
                practice_instances: overlay
                    .allocation
                    .practice_instances
                    .or(base.allocation.practice_instances),
                sections: overlay.allocation.sections.or(base.allocation.sections),
                seed: overlay.allocation.seed.or(base.allocation.seed),
            },
            persist: RawPersistConfig {
                batch_size: overlay.persist.batch_size.or(base.persist.batch_size),
                concurrency: overlay.persist.concurrency.or(base.persist.concurrency),
                max_retries: overlay.persist.max_retries.or(base.persist.max_retries),
                retry_backoff_ms: overlay
                    .persist
                    .retry_backoff_ms
                    .or(base.persist.retry_backoff_ms),
            },
            store: RawStoreConfig {
                url: overlay.store.url.or(base.store.url),
                table: overlay.store.table.or(base.store.table),
                api_key: overlay.store.api_key.or(base.store.api_key),
                timeout_secs: overlay.store.timeout_secs.or(base.store.timeout_secs),
                page_size: overlay.store.page_size.or(base.store.page_size),
            },
        }
    }

    /// Convert raw config to final config with defaults and env fallbacks applied
    pub fn finalize(raw: RawBanksortConfig) -> BanksortConfig {
        let allocation_defaults = AllocationSection::default();
        let persist_defaults = PersistConfig::default();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        BanksortConfig {
            allocation: AllocationSection {
                test_type: raw
                    .allocation
                    .test_type
                    .unwrap_or_else(|| DEFAULT_TEST_TYPE.to_string()),
                practice_instances: raw
                    .allocation
                    .practice_instances
                    .unwrap_or(allocation_defaults.practice_instances),
                seed: raw.allocation.seed,
                sections: raw
                    .allocation
                    .sections
                    .unwrap_or(allocation_defaults.sections),
            },
            persist: PersistConfig {
                batch_size: raw.persist.batch_size.unwrap_or(persist_defaults.batch_size),
                concurrency: raw.persist.concurrency.unwrap_or(persist_defaults.concurrency),
                max_retries: raw.persist.max_retries.unwrap_or(persist_defaults.max_retries),
                retry_backoff_ms: raw
                    .persist
                    .retry_backoff_ms
                    .unwrap_or(persist_defaults.retry_backoff_ms),
            },
            store: StoreSection {
                url: raw.store.url.or_else(|| env(URL_ENV)),
                table: raw.store.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                api_key: raw.store.api_key.or_else(|| env(KEY_ENV)),
                timeout_secs: raw.store.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                page_size: raw.store.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            },
        }
    }
}
