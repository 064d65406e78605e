//! Engine configuration, read from `config.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use meridian_pricefeed::LookbackPolicy;
use meridian_stablecoin::{ModuleAccounts, StablecoinDenoms};
use meridian_types::AccountId;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "MERIDIAN_DATA_DIR";

/// Database file inside the data directory.
pub const DB_FILE: &str = "meridian.db";

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pricefeed: PriceFeedConfig,
    #[serde(default)]
    pub vpool: VpoolConfig,
    #[serde(default)]
    pub stablecoin: StablecoinConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Oracle price feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Longest TWAP window, in seconds.
    #[serde(default = "default_twap_lookback")]
    pub twap_lookback_secs: u64,
}

/// Virtual pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpoolConfig {
    /// Reserve snapshot retention and TWAP window, in seconds.
    #[serde(default = "default_twap_lookback")]
    pub twap_lookback_secs: u64,
}

/// Denominations and module accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StablecoinConfig {
    pub stable_denom: String,
    pub collateral_denom: String,
    pub governance_denom: String,
    pub module_account: String,
    pub ecosystem_fund_account: String,
    pub treasury_account: String,
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = `$MERIDIAN_DATA_DIR` or `~/.meridian`.
    #[serde(default)]
    pub data_dir: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. "info" or "meridian_pricefeed=debug".
    /// `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_twap_lookback() -> u64 {
    900
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            twap_lookback_secs: default_twap_lookback(),
        }
    }
}

impl Default for VpoolConfig {
    fn default() -> Self {
        Self {
            twap_lookback_secs: default_twap_lookback(),
        }
    }
}

impl Default for StablecoinConfig {
    fn default() -> Self {
        let denoms = StablecoinDenoms::default();
        let accounts = ModuleAccounts::default();
        Self {
            stable_denom: denoms.stable,
            collateral_denom: denoms.collateral,
            governance_denom: denoms.governance,
            module_account: accounts.module.0,
            ecosystem_fund_account: accounts.ecosystem_fund.0,
            treasury_account: accounts.treasury.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl StablecoinConfig {
    pub fn denoms(&self) -> StablecoinDenoms {
        StablecoinDenoms {
            stable: self.stable_denom.clone(),
            collateral: self.collateral_denom.clone(),
            governance: self.governance_denom.clone(),
        }
    }

    pub fn accounts(&self) -> ModuleAccounts {
        ModuleAccounts {
            module: AccountId::new(&self.module_account),
            ecosystem_fund: AccountId::new(&self.ecosystem_fund_account),
            treasury: AccountId::new(&self.treasury_account),
        }
    }
}

impl PriceFeedConfig {
    pub fn lookback(&self) -> LookbackPolicy {
        LookbackPolicy::new(self.twap_lookback_secs)
    }
}

impl EngineConfig {
    /// Load `config.toml` from the default data directory.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = default_data_dir().join("config.toml");
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        if config.pricefeed.twap_lookback_secs == 0 || config.vpool.twap_lookback_secs == 0 {
            anyhow::bail!("twap_lookback_secs must be positive");
        }
        Ok(config)
    }

    /// The configured data directory, or the default.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE)
    }
}

/// `$MERIDIAN_DATA_DIR`, else `~/.meridian`.
fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".meridian"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/meridian"))
}
