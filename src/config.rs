//! Host configuration read from `host_config.json` beside the executable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    constants,
    host_types::{Point, Size},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub title: String,
    pub origin: Point,
    pub size: Size,
    /// Root containing `data/`. Defaults to the executable's directory.
    pub data_dir: Option<PathBuf>,
    /// Directory holding `flutter_windows.dll`. Defaults to the executable's directory.
    pub dll_dir: Option<PathBuf>,
    pub dart_entrypoint: Option<String>,
    /// Prepended to the process command-line arguments.
    pub dart_entrypoint_args: Vec<String>,
    pub forward_command_line: bool,
    pub log_filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: constants::DEFAULT_WINDOW_TITLE.to_string(),
            origin: constants::DEFAULT_WINDOW_ORIGIN,
            size: constants::DEFAULT_WINDOW_SIZE,
            data_dir: None,
            dll_dir: None,
            dart_entrypoint: None,
            dart_entrypoint_args: Vec::new(),
            forward_command_line: true,
            log_filter: constants::DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: HostConfig = serde_json::from_str(text).context("parsing host config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Loads `host_config.json` from `dir`; defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(constants::CONFIG_FILE_NAME);
        if !path.is_file() {
            info!("[Config] No {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        info!("[Config] Loading {}", path.display());
        Self::load(&path)
    }

    /// Entrypoint arguments: configured ones followed by command-line ones.
    pub fn entrypoint_arguments<I>(&self, command_line: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = self.dart_entrypoint_args.clone();
        if self.forward_command_line {
            args.extend(command_line);
        }
        args
    }

    fn validate(&self) -> Result<()> {
        if self.size.width == 0 || self.size.height == 0 {
            anyhow::bail!(
                "window size must be non-zero (got {}×{})",
                self.size.width,
                self.size.height
            );
        }
        Ok(())
    }
}
