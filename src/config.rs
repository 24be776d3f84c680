use serde::Deserialize;

use crate::error::Result;

/// Settings handed to [`DataLoader`](crate::data_loader::DataLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Log every request and its outcome at `info` instead of `debug`.
    pub debug: bool,
    /// Replace `Close` with the adjusted close and rescale `Open`/`High`/`Low`.
    pub auto_adjust: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            debug: false,
            auto_adjust: true,
        }
    }
}

impl LoaderConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }

    /// Parses a TOML snippet such as `debug = true`; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
