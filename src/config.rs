use crate::error::{PalfixError, Result};
use crate::timing::RationalFactor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Executables to run for each external tool. Bare names are looked up on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub mkvmerge: PathBuf,
    pub mkvextract: PathBuf,
    pub mkvinfo: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            mkvmerge: PathBuf::from("mkvmerge"),
            mkvextract: PathBuf::from("mkvextract"),
            mkvinfo: PathBuf::from("mkvinfo"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ratio by which video, subtitle and chapter timestamps are stretched.
    pub factor: RationalFactor,
    pub tools: ToolPaths,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            factor: RationalFactor::PAL,
            tools: ToolPaths::default(),
            show_progress: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = Self::from_toml(&contents)?;
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override fields from environment-style variables.
    fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(factor) = var("PALFIX_FACTOR") {
            self.factor = factor.parse()?;
        }
        if let Some(path) = var("PALFIX_MKVMERGE") {
            self.tools.mkvmerge = PathBuf::from(path);
        }
        if let Some(path) = var("PALFIX_MKVEXTRACT") {
            self.tools.mkvextract = PathBuf::from(path);
        }
        if let Some(path) = var("PALFIX_MKVINFO") {
            self.tools.mkvinfo = PathBuf::from(path);
        }
        if let Some(path) = var("PALFIX_FFMPEG") {
            self.tools.ffmpeg = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let tools = [
            ("mkvmerge", &self.tools.mkvmerge),
            ("mkvextract", &self.tools.mkvextract),
            ("mkvinfo", &self.tools.mkvinfo),
            ("ffmpeg", &self.tools.ffmpeg),
        ];

        for (name, path) in tools {
            if path.as_os_str().is_empty() {
                return Err(PalfixError::Config(format!(
                    "Path for {name} must not be empty"
                )));
            }
        }

        if self.factor.is_identity() {
            return Err(PalfixError::Config(format!(
                "Correction factor {} would leave the file unchanged",
                self.factor
            )));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("palfix").join("config.toml"))
    }
}
