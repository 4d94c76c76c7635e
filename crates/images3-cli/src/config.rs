//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `IMAGES3__SECTION__KEY` environment variables
//! 3. Config file (`--config`, else `images3.toml` in the current directory,
//!    else the user config directory)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use images3_adapters::DEFAULT_PAGE_SIZE;
use images3_core::domain::{DomainError, ResizingConfig, ResizingUnit};
use serde::{Deserialize, Serialize};

pub const LOCAL_CONFIG_FILE: &str = "images3.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Resizing of the bootstrap template every plant starts with.
    pub bootstrap: BootstrapConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub unit: ResizingUnit,
    pub width: u32,
    pub height: u32,
    pub keep_proportions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub directory: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bootstrap: BootstrapConfig {
                unit: ResizingUnit::Pixel,
                width: 2048,
                height: 2048,
                keep_proportions: true,
            },
            storage: StorageConfig {
                page_size: DEFAULT_PAGE_SIZE,
            },
            output: OutputConfig {
                no_color: false,
                directory: PathBuf::from("images3-out"),
            },
        }
    }
}

impl BootstrapConfig {
    pub fn resizing_config(&self) -> Result<ResizingConfig, DomainError> {
        ResizingConfig::new(self.unit, self.width, self.height, self.keep_proportions)
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the file, then the environment.
    ///
    /// An explicit `config_file` must exist; the default locations are optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to serialise built-in defaults")?;

        let mut builder = Config::builder().add_source(defaults);
        builder = match config_file {
            Some(path) => builder.add_source(toml_file(path).required(true)),
            None => builder
                .add_source(toml_file(&Self::config_path()).required(false))
                .add_source(toml_file(Path::new(LOCAL_CONFIG_FILE)).required(false)),
        };

        let config: Self = builder
            .add_source(
                Environment::with_prefix("IMAGES3")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config
            .bootstrap
            .resizing_config()
            .context("Invalid [bootstrap] section")?;
        Ok(config)
    }

    /// Path to the user-level configuration file.
    ///
    /// Uses `directories::ProjectDirs`, falling back to `images3.toml` in the
    /// current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("io", "images3", "images3")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }
}

fn toml_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml)
}
