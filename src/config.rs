use crate::search::{DELEGATED_FLOOR, FALLBACK_FLOOR, RESULT_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default request timeout against the embedding provider. Generous
/// because a sleeping hosted model can take a while to answer its first
/// call.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
/// Default request timeout against the catalog store.
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

/// Embedding provider endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the embedding service.
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// Catalog store endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the PostgREST-style catalog API.
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// API key, sent as both `apikey` and bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: String::new(),
            timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
        }
    }
}

/// Tunables for the ranking paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of results per search.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Similarity floor for the delegated (store-side) path.
    #[serde(default = "default_delegated_floor")]
    pub delegated_floor: f32,

    /// Similarity floor for the fallback full-scan path.
    #[serde(default = "default_fallback_floor")]
    pub fallback_floor: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: RESULT_LIMIT,
            delegated_floor: DELEGATED_FLOOR,
            fallback_floor: FALLBACK_FLOOR,
        }
    }
}

fn default_provider_url() -> String {
    "http://localhost:7860".to_string()
}

fn default_catalog_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

fn default_catalog_timeout_secs() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_result_limit() -> usize {
    RESULT_LIMIT
}

fn default_delegated_floor() -> f32 {
    DELEGATED_FLOOR
}

fn default_fallback_floor() -> f32 {
    FALLBACK_FLOOR
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) {
        if url::Url::parse(&self.provider.base_url).is_err() {
            panic!(
                "provider.base_url is not a valid URL: '{}'",
                self.provider.base_url
            );
        }
        if url::Url::parse(&self.catalog.base_url).is_err() {
            panic!(
                "catalog.base_url is not a valid URL: '{}'",
                self.catalog.base_url
            );
        }

        if self.provider.timeout_secs == 0 {
            panic!("provider.timeout_secs must be greater than 0");
        }
        if self.catalog.timeout_secs == 0 {
            panic!("catalog.timeout_secs must be greater than 0");
        }

        if self.search.result_limit == 0 {
            panic!("search.result_limit must be greater than 0");
        }
        for (name, floor) in [
            ("search.delegated_floor", self.search.delegated_floor),
            ("search.fallback_floor", self.search.fallback_floor),
        ] {
            if !(-1.0..=1.0).contains(&floor) {
                panic!("{name} must be between -1.0 and 1.0, got {floor}");
            }
        }
    }

    /// Resolve the config directory: `VITRINE_DIR` if set, otherwise
    /// `~/.config/vitrine`.
    pub fn base_path() -> PathBuf {
        if let Ok(dir) = std::env::var("VITRINE_DIR") {
            return PathBuf::from(dir);
        }

        homedir::my_home()
            .ok()
            .flatten()
            .map(|home| home.join(".config").join("vitrine"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn load() -> Self {
        Self::load_with(&Self::base_path())
    }

    pub fn load_with(base_path: &Path) -> Self {
        let config_path = base_path.join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::create_dir_all(base_path).expect("cannot create config directory");
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default()).unwrap(),
            )
            .expect("cannot write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not readable");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_path_buf();
        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config
    }

    pub fn save(&self) {
        let config_path = self.base_path.join("config.yaml");
        let config_str = serde_yml::to_string(&self).unwrap();
        std::fs::write(config_path, config_str).expect("cannot write config");
    }
}
