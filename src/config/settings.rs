//! Calculator settings loaded from a TOML file.
//!
//! Every field has a default, so a partial file (or none at all) works.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculator::{Base, EvalOptions, FormatOptions, Mode};

/// Upper limit for `precision`.
pub const MAX_PRECISION: u32 = 20;

const CONFIG_DIR: &str = "abacus";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Input length limits per mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxLength {
    pub standard: usize,
    pub programmer: usize,
    pub scientific: usize,
}

impl Default for MaxLength {
    fn default() -> Self {
        Self {
            standard: Mode::Standard.default_max_length(),
            programmer: Mode::Programmer.default_max_length(),
            scientific: Mode::Scientific.default_max_length(),
        }
    }
}

/// The settings record consumed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Digits after the decimal point in standard mode.
    pub precision: u32,
    pub use_fractions: bool,
    pub use_thousands_separator: bool,
    pub mode: Mode,
    /// Base for programmer mode; other modes always use decimal.
    pub base: Base,
    pub max_length: MaxLength,
    /// How long the length-limit notice stays visible.
    pub notice_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision: 10,
            use_fractions: false,
            use_thousands_separator: false,
            mode: Mode::Standard,
            base: Base::Dec,
            max_length: MaxLength::default(),
            notice_timeout_ms: 2000,
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/abacus/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load settings from `path`, or from the default location.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => {
                    debug!("no config directory, using default settings");
                    return Ok(Self::default());
                }
            },
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loading settings");
                Self::from_toml_str(&content)
            }
            Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using default settings");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings.clamped())
    }

    fn clamped(mut self) -> Self {
        if self.precision > MAX_PRECISION {
            warn!(precision = self.precision, max = MAX_PRECISION, "precision clamped");
            self.precision = MAX_PRECISION;
        }
        self
    }

    /// Base in effect for the current mode.
    pub fn active_base(&self) -> Base {
        if self.mode.is_programmer() {
            self.base
        } else {
            Base::Dec
        }
    }

    pub fn max_length_for(&self, mode: Mode) -> usize {
        match mode {
            Mode::Standard => self.max_length.standard,
            Mode::Programmer => self.max_length.programmer,
            Mode::Scientific => self.max_length.scientific,
        }
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions::new(self.active_base(), self.mode)
            .with_max_length(self.max_length_for(self.mode))
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            base: self.active_base(),
            mode: self.mode,
            precision: self.precision.min(MAX_PRECISION),
            use_fractions: self.use_fractions,
            use_thousands_separator: self.use_thousands_separator,
            ..Default::default()
        }
    }
}
