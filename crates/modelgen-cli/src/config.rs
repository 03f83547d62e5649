//! Configuration for the `modelgen` command.
//!
//! Loads config from:
//! 1. Global: ~/.config/modelgen/config.toml
//! 2. Per-project: modelgen.toml in the working directory, or the file
//!    given with `--config` (overrides global)
//!
//! Command-line flags override both.
//!
//! Example modelgen.toml:
//! ```toml
//! backend = "pydantic"
//!
//! [source]
//! locator = "https://example.com/a2a.json"
//! timeout-secs = 10
//!
//! [generate]
//! root-name = "A2A"
//! base-class = "a2a._base.A2ABaseModel"
//! snake-case-fields = true
//! ```

use anyhow::{Context, Result};
use modelgen::{
    CollectionStyle, DefaultStyle, Dialect, EnumStyle, FieldOrder, GeneratorOptions, UnionStyle,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG: &str = "modelgen.toml";

/// Where the schema comes from.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SourceConfig {
    /// URL, file path, or `-` for stdin.
    pub locator: Option<String>,
    pub dialect: Option<Dialect>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

impl SourceConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            locator: other.locator.or(self.locator),
            dialect: other.dialect.or(self.dialect),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            retries: other.retries.or(self.retries),
        }
    }
}

/// Generation options; unset keys keep their defaults.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GenerateConfig {
    pub root_name: Option<String>,
    pub base_class: Option<String>,
    pub enum_style: Option<EnumStyle>,
    pub collapse_single_enums: Option<bool>,
    pub default_style: Option<DefaultStyle>,
    pub collection_style: Option<CollectionStyle>,
    pub union_style: Option<UnionStyle>,
    pub include_docs: Option<bool>,
    pub include_timestamp: Option<bool>,
    pub field_order: Option<FieldOrder>,
    pub snake_case_fields: Option<bool>,
}

impl GenerateConfig {
    /// Keys set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            root_name: other.root_name.or(self.root_name),
            base_class: other.base_class.or(self.base_class),
            enum_style: other.enum_style.or(self.enum_style),
            collapse_single_enums: other.collapse_single_enums.or(self.collapse_single_enums),
            default_style: other.default_style.or(self.default_style),
            collection_style: other.collection_style.or(self.collection_style),
            union_style: other.union_style.or(self.union_style),
            include_docs: other.include_docs.or(self.include_docs),
            include_timestamp: other.include_timestamp.or(self.include_timestamp),
            field_order: other.field_order.or(self.field_order),
            snake_case_fields: other.snake_case_fields.or(self.snake_case_fields),
        }
    }

    pub fn to_options(&self) -> GeneratorOptions {
        let defaults = GeneratorOptions::default();
        GeneratorOptions {
            root_name: self.root_name.clone().unwrap_or(defaults.root_name),
            base_class: self.base_class.clone().or(defaults.base_class),
            enum_style: self.enum_style.unwrap_or(defaults.enum_style),
            collapse_single_enums: self
                .collapse_single_enums
                .unwrap_or(defaults.collapse_single_enums),
            default_style: self.default_style.unwrap_or(defaults.default_style),
            collection_style: self.collection_style.unwrap_or(defaults.collection_style),
            union_style: self.union_style.unwrap_or(defaults.union_style),
            include_docs: self.include_docs.unwrap_or(defaults.include_docs),
            include_timestamp: self.include_timestamp.unwrap_or(defaults.include_timestamp),
            field_order: self.field_order.unwrap_or(defaults.field_order),
            snake_case_fields: self.snake_case_fields.unwrap_or(defaults.snake_case_fields),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ModelgenConfig {
    pub source: SourceConfig,
    /// Backend name, e.g. "pydantic" or "rust".
    pub backend: Option<String>,
    pub generate: GenerateConfig,
}

impl ModelgenConfig {
    /// Load configuration for a run in `root`.
    ///
    /// An explicit `--config` file must exist; the implicit files are
    /// skipped when missing.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        Self::load_layers(Self::global_config_path().as_deref(), root, explicit)
    }

    fn load_layers(global: Option<&Path>, root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global) = global {
            if let Some(layer) = Self::load_file(global)? {
                tracing::debug!(path = %global.display(), "loaded global config");
                config = config.merge(layer);
            }
        }

        match explicit {
            Some(path) => {
                let layer = Self::load_file(path)?
                    .with_context(|| format!("config file {} not found", path.display()))?;
                config = config.merge(layer);
            }
            None => {
                let project = root.join(PROJECT_CONFIG);
                if let Some(layer) = Self::load_file(&project)? {
                    tracing::debug!(path = %project.display(), "loaded project config");
                    config = config.merge(layer);
                }
            }
        }

        Ok(config)
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("modelgen").join("config.toml"))
    }

    /// Parse a config file; `None` when it does not exist.
    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// Values set in `other` take precedence.
    pub fn merge(self, other: Self) -> Self {
        Self {
            source: self.source.merge(other.source),
            backend: other.backend.or(self.backend),
            generate: self.generate.merge(other.generate),
        }
    }
}
