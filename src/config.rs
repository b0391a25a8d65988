use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hardware::peripheral::display::DisplayAdapter;

/// Which graphics card the session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GfxCard {
    /// The motherboard's onboard video, if the model has one.
    #[default]
    Internal,
    None,
    External(DisplayAdapter),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub rom_path: PathBuf,

    /// Only check that the firmware is there, build no hardware.
    pub check_only: bool,

    pub gfx_card: GfxCard,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rom_path: PathBuf::from("roms"),
            check_only: false,
            gfx_card: GfxCard::Internal,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfig {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn set_rom_path(mut self, rom_path: impl Into<PathBuf>) -> Self {
        self.rom_path = rom_path.into();
        self
    }

    pub fn check_only(mut self) -> Self {
        self.check_only = true;
        self
    }

    pub fn set_check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    pub fn set_gfx_card(mut self, gfx_card: GfxCard) -> Self {
        self.gfx_card = gfx_card;
        self
    }
}
