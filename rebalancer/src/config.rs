//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use nanofolio::{AssetFormatAdapter, CanonicalAdapter, DegiroAdapter, Strategy, TableLoader};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    #[serde(default = "default_allocation")]
    pub allocation: PathBuf,
    #[serde(default)]
    pub adapter: AdapterKind,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            allocation: default_allocation(),
            adapter: AdapterKind::default(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_assets() -> PathBuf {
    "assets.csv".into()
}
fn default_allocation() -> PathBuf {
    "allocation.csv".into()
}
fn default_delimiter() -> String {
    ",".into()
}

/// Which broker export layout the assets file uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Six positional columns as exported by Degiro
    #[default]
    Degiro,
    /// Named canonical headers in any order
    Canonical,
}

impl AdapterKind {
    pub fn adapter(self) -> &'static dyn AssetFormatAdapter {
        match self {
            AdapterKind::Degiro => &DegiroAdapter,
            AdapterKind::Canonical => &CanonicalAdapter,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "EUR".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub format: OutputFormat,
}

/// How the rebalance is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width terminal table
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Audit trail file name inside `dir`; no audit trail when unset.
    #[serde(default)]
    pub audit_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: None,
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub assets: Option<PathBuf>,
    pub allocation: Option<PathBuf>,
    pub currency: Option<String>,
    pub adapter: Option<AdapterKind>,
    pub delimiter: Option<String>,
    pub strategy: Option<Strategy>,
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise, then apply overrides.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(assets) = overrides.assets {
            self.input.assets = assets;
        }
        if let Some(allocation) = overrides.allocation {
            self.input.allocation = allocation;
        }
        if let Some(currency) = overrides.currency {
            self.portfolio.currency = currency;
        }
        if let Some(adapter) = overrides.adapter {
            self.input.adapter = adapter;
        }
        if let Some(delimiter) = overrides.delimiter {
            self.input.delimiter = delimiter;
        }
        if let Some(strategy) = overrides.strategy {
            self.output.strategy = strategy;
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.input.assets.as_os_str().is_empty() {
            return Err(Error::Config("assets path must not be empty".into()));
        }
        if self.input.allocation.as_os_str().is_empty() {
            return Err(Error::Config("allocation path must not be empty".into()));
        }
        if self.portfolio.currency.trim().is_empty() {
            return Err(Error::Config("currency must not be empty".into()));
        }
        self.delimiter()?;
        if self.logging.audit_file.as_deref() == Some("") {
            return Err(Error::Config("audit_file must not be empty when set".into()));
        }
        Ok(())
    }

    /// The input delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        match self.input.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(Error::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            ))),
        }
    }

    /// Table loader for both input files.
    pub fn loader(&self) -> Result<TableLoader> {
        Ok(TableLoader::new().with_delimiter(self.delimiter()?))
    }

    pub fn currency(&self) -> &str {
        self.portfolio.currency.trim()
    }

    /// Full path to the audit log file, if auditing is enabled.
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.logging
            .audit_file
            .as_ref()
            .map(|file| Path::new(&self.logging.dir).join(file))
    }
}
