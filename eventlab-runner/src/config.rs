//! Serializable study configuration, loaded from TOML.
//!
//! ```toml
//! model = "market_model"
//! event_window = { start = -10, end = 10 }
//! estimation_size = 300
//! buffer_size = 30
//!
//! [returns]
//! path = "data/returns.csv"
//!
//! [fama_french]
//! path = "data/famafrench.csv"
//!
//! [events]
//! path = "data/events.csv"
//! ```

use std::path::{Path, PathBuf};

use eventlab_core::data::DEFAULT_MAX_PROBE_DAYS;
use eventlab_core::{EventStudyError, EventWindow, ModelKind, ReturnStore, WindowSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::batch::BatchOptions;
use crate::data_loader::{import_fama_french, import_returns, ImportError, ReturnsImport};
use crate::events::{events_from_csv, EventDescriptor};

/// Content-addressable identifier of a study configuration.
pub type StudyId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse study TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Window(#[from] EventStudyError),
}

fn default_model() -> ModelKind {
    ModelKind::MarketModel
}

fn default_estimation_size() -> usize {
    300
}

fn default_buffer_size() -> usize {
    30
}

fn default_max_probe_days() -> u32 {
    DEFAULT_MAX_PROBE_DAYS
}

fn yes() -> bool {
    true
}

fn iso_date() -> String {
    "%Y-%m-%d".into()
}

fn compact_date() -> String {
    "%Y%m%d".into()
}

/// Where and how security and market returns are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsSource {
    pub path: PathBuf,
    #[serde(default)]
    pub is_price: bool,
    #[serde(default = "yes")]
    pub log_return: bool,
    #[serde(default = "iso_date")]
    pub date_format: String,
}

impl ReturnsSource {
    pub fn import_options(&self) -> ReturnsImport {
        ReturnsImport {
            is_price: self.is_price,
            log_return: self.log_return,
            date_format: self.date_format.clone(),
        }
    }
}

/// Fama-French factor file, in the published percent layout by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSource {
    pub path: PathBuf,
    #[serde(default = "yes")]
    pub rescale_factor: bool,
    #[serde(default = "compact_date")]
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsSource {
    pub path: PathBuf,
    #[serde(default = "compact_date")]
    pub date_format: String,
}

/// Everything needed to reproduce one batch study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default = "default_model")]
    pub model: ModelKind,

    #[serde(default)]
    pub event_window: EventWindow,

    #[serde(default = "default_estimation_size")]
    pub estimation_size: usize,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Calendar days probed forward when an event date is not a trading day.
    #[serde(default = "default_max_probe_days")]
    pub max_probe_days: u32,

    #[serde(default)]
    pub keep_model: bool,

    #[serde(default = "yes")]
    pub ignore_errors: bool,

    #[serde(default = "yes")]
    pub parallel: bool,

    pub returns: ReturnsSource,

    #[serde(default)]
    pub fama_french: Option<FactorSource>,

    pub events: EventsSource,
}

impl StudyConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    /// Parse and validate. Relative paths are kept as written.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window_spec()?;
        if self.model.needs_factors() && self.fama_french.is_none() {
            return Err(ConfigError::Invalid(format!(
                "model '{}' needs a [fama_french] section",
                self.model
            )));
        }
        Ok(())
    }

    pub fn window_spec(&self) -> Result<WindowSpec, EventStudyError> {
        WindowSpec::new(self.event_window, self.estimation_size, self.buffer_size)
    }

    pub fn batch_options(&self) -> Result<BatchOptions, EventStudyError> {
        Ok(BatchOptions {
            model: self.model,
            spec: self.window_spec()?,
            keep_model: self.keep_model,
            ignore_errors: self.ignore_errors,
            parallel: self.parallel,
        })
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two identical configs share a study id, so output directories can be
    /// keyed on it.
    pub fn study_id(&self) -> StudyId {
        let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }

    /// Import every configured table into a fresh store.
    pub fn load_store(&self) -> Result<ReturnStore, ImportError> {
        let mut store = ReturnStore::new().with_max_probe_days(self.max_probe_days);
        store.insert(import_returns(&self.returns.path, &self.returns.import_options())?);
        if let Some(ff) = &self.fama_french {
            store.insert(import_fama_french(&ff.path, ff.rescale_factor, &ff.date_format)?);
        }
        info!(study_id = %self.study_id(), "data imported");
        Ok(store)
    }

    pub fn load_events(&self) -> Result<Vec<EventDescriptor>, ImportError> {
        events_from_csv(&self.events.path, &self.events.date_format)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.returns.path);
        resolve(&mut self.events.path);
        if let Some(ff) = self.fama_french.as_mut() {
            resolve(&mut ff.path);
        }
    }
}
