//! Layered application configuration.
//!
//! Values are merged with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (the platform config dir, or `--config PATH`)
//! 3. `DUPSWEEP_*` environment variables
//! 4. Command-line flags (applied by [`crate::run_app`])
//!
//! A missing file means defaults. A value that cannot be parsed, such as an
//! unknown algorithm name, is an error and nothing is scanned.
//!
//! ```toml
//! algorithm = "sha256"
//! io_threads = 4
//! keep_strategy = "shortest_name"
//! use_trash = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::KeepStrategy;
use crate::scanner::{HashAlgorithm, DEFAULT_CHUNK_SIZE};

/// Prefix for environment overrides, e.g. `DUPSWEEP_IO_THREADS=8`.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprint algorithm.
    pub algorithm: HashAlgorithm,
    /// Hashing pool size.
    pub io_threads: usize,
    /// Hashing read buffer size in bytes.
    pub chunk_size: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Ignore zero-byte files.
    pub skip_empty: bool,
    /// Which copy survives when deleting.
    pub keep_strategy: KeepStrategy,
    /// Move deleted files to the trash instead of removing them.
    pub use_trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            io_threads: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            skip_empty: false,
            keep_strategy: KeepStrategy::default(),
            use_trash: true,
        }
    }
}

impl Config {
    /// Load from the default platform-specific path plus the environment.
    ///
    /// # Errors
    ///
    /// Returns the figment error when a value cannot be parsed, such as an
    /// unknown algorithm name. A missing file is not an error.
    pub fn load() -> Result<Self, figment::Error> {
        let path = Self::config_path();
        Self::figment(path.as_deref()).extract()
    }

    /// Load from `path` plus the environment. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_path(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(Some(path)).extract()
    }

    /// The provider stack used by the loaders.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens for unrepresentable values.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write this configuration to `path` as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the file already exists, or on any serialization or I/O error.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        log::info!("Configuration written to {}", path.display());
        Ok(())
    }
}
