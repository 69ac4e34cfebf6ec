//! Shared configuration loader for the formula toolchain.
//!
//! `defaults/formula.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`FormulaConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use formula_babel::mode::{HostCapabilities, PipelineConfig};
use formula_babel::service::ServiceEndpoints;
use formula_babel::{PipelineOptions, ServiceError, WireFormat};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/formula.default.toml");

/// Top-level configuration consumed by formula applications.
#[derive(Debug, Clone, Deserialize)]
pub struct FormulaConfig {
    pub pipeline: PipelineConfig,
    pub host: HostCapabilities,
    pub rendering: RenderingConfig,
    pub markup: WireFormat,
    pub service: ServiceConfig,
}

/// How rendered images are requested and decorated.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderingConfig {
    pub set_size: bool,
    pub accessibility: bool,
    pub language: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Where the content service lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub service_path: String,
    pub image_path: String,
    /// Path of a JSON answer table; empty when the remote service is used.
    #[serde(default)]
    pub table: String,
}

impl ServiceConfig {
    pub fn endpoints(&self) -> Result<ServiceEndpoints, ServiceError> {
        ServiceEndpoints::from_base(&self.base_url, &self.service_path, &self.image_path)
    }

    pub fn table_path(&self) -> Option<&Path> {
        let table = self.table.trim();
        (!table.is_empty()).then(|| Path::new(table))
    }
}

impl From<&FormulaConfig> for PipelineOptions {
    fn from(config: &FormulaConfig) -> Self {
        PipelineOptions {
            config: config.pipeline.clone(),
            capabilities: config.host,
            wire: config.markup.clone(),
            set_size: config.rendering.set_size,
            accessibility: config.rendering.accessibility,
            language: config.rendering.language.clone(),
            render_params: config
                .rendering
                .params
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}

impl From<FormulaConfig> for PipelineOptions {
    fn from(config: FormulaConfig) -> Self {
        PipelineOptions::from(&config)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `pipeline.save_mode = "safeXml"`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<FormulaConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<FormulaConfig, ConfigError> {
    Loader::new().build()
}
