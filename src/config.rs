use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Effective settings for one run. Built once, then handed to a driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    #[serde(default)]
    pub primary_files: PrimaryFileConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scenes: Option<usize>,
    pub test_mode: bool,
    pub within_seconds: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_scenes: None,
            test_mode: false,
            within_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Merge every duplicate into the scene with the best file
    Merge,
    /// Keep the best scoring scene and delete the others
    KeepBest,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DuplicateConfig {
    pub phash_distance: u32,
    pub batch_size: usize,
    pub merge_delay_ms: u64,
    pub strategy: MergeStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_path: Option<String>,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            phash_distance: 8,
            batch_size: 10,
            merge_delay_ms: 500,
            strategy: MergeStrategy::Merge,
            dump_path: Some("phash_duplicates.json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrimaryFileConfig {
    pub batch_size: usize,
    pub confirm_batches: bool,
}

impl Default for PrimaryFileConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            confirm_batches: true,
        }
    }
}

fn default_dry_run() -> bool {
    true
}

fn default_rate_limit_delay_ms() -> u64 {
    100
}

impl AppConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: String::new(),
            dry_run: default_dry_run(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            markers: MarkerConfig::default(),
            duplicates: DuplicateConfig::default(),
            primary_files: PrimaryFileConfig::default(),
        }
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn merge_delay(&self) -> Duration {
        Duration::from_millis(self.duplicates.merge_delay_ms)
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.url.trim().trim_end_matches('/'))
    }
}

/// Load `Config.*` (optional) and `STASH_*` environment variables.
///
/// `STASH_URL` and `STASH_API_KEY` map to `url` and `api_key`; nested keys use
/// a double underscore, e.g. `STASH_MARKERS__WITHIN_SECONDS=1.5`.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("STASH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Load credentials from `stash.env`, then `.env`. Missing files are fine.
pub fn load_env_files() {
    dotenv::from_filename("stash.env").ok();
    dotenv::dotenv().ok();
}
