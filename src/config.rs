use crate::storage::{self, StorageManager};
use anyhow::{bail, Context};
use homedir::my_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_LISTEN: &str = "0.0.0.0:8787";
const DEFAULT_STATIC_DIR: &str = "docs";
const DEFAULT_DATA_FILE: &str = "data.json";
/// DuckDuckGo request timeout in seconds
const DEFAULT_EXTERNAL_SEARCH_TIMEOUT_SECS: u64 = 8;
const DEFAULT_EXTERNAL_SEARCH_MAX_RESULTS: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address the daemon binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory served for `/` and any non-api path
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Entry store, relative to the base path
    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_external_search_timeout_secs")]
    pub external_search_timeout_secs: u64,

    #[serde(default = "default_external_search_max_results")]
    pub external_search_max_results: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            data_file: default_data_file(),
            external_search_timeout_secs: DEFAULT_EXTERNAL_SEARCH_TIMEOUT_SECS,
            external_search_max_results: DEFAULT_EXTERNAL_SEARCH_MAX_RESULTS,
            base_path: PathBuf::new(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_static_dir() -> String {
    DEFAULT_STATIC_DIR.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_external_search_timeout_secs() -> u64 {
    DEFAULT_EXTERNAL_SEARCH_TIMEOUT_SECS
}

fn default_external_search_max_results() -> usize {
    DEFAULT_EXTERNAL_SEARCH_MAX_RESULTS
}

/// `$TAGMARK_BASE_PATH`, else `~/.local/share/tagmark`.
pub fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("TAGMARK_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .context("couldnt read home dir")?
        .context("couldnt find home dir")?;

    Ok(home.join(".local/share/tagmark"))
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.listen.trim().is_empty() {
            bail!("listen must not be empty");
        }

        if self.data_file.trim().is_empty() {
            bail!("data_file must not be empty");
        }

        if self.external_search_timeout_secs == 0 {
            bail!("external_search_timeout_secs must be greater than 0");
        }

        if self.external_search_max_results == 0 {
            bail!("external_search_max_results must be greater than 0");
        }

        Ok(())
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(base_path()?)
    }

    pub fn load_with(base_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let base_path = base_path.into();
        let store = storage::BackendLocal::new(&base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            log::info!("writing default config to {}", base_path.display());
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str =
            String::from_utf8(store.read(CONFIG_FILE)?).context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path;

        config.validate()?;

        // resave in case new fields were filled with defaults
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}
