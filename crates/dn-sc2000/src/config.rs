//! Controller configuration schema and loader
//!
//! Configuration is stored as YAML.
//! Default location: ~/.config/dn-sc2000/controller.yaml

use crate::routing::Route;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default effect knob resolution (detents from 0.0 to 1.0)
pub const DEFAULT_FX_KNOB_QUANT: u32 = 32;

/// Root controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Port name substring to match (case-insensitive)
    pub port_match: String,

    /// Effect knob resolution
    pub fx_knob_quant: u32,

    /// Scratch model parameters used when a platter is touched
    pub scratch: ScratchConfig,

    /// Input routes appended to the built-in hotcue and effect knob routes
    pub routes: Vec<Route>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            port_match: "DN-SC2000".to_string(),
            fx_knob_quant: DEFAULT_FX_KNOB_QUANT,
            scratch: ScratchConfig::default(),
            routes: Vec::new(),
        }
    }
}

/// Scratch model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Platter ticks per revolution
    pub resolution: u32,
    /// Reference platter speed
    pub rpm: f64,
    /// Filter gain
    pub alpha: f64,
    /// Filter velocity gain
    pub beta: f64,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        let alpha = 1.0 / 8.0;
        Self {
            resolution: 2250,
            rpm: 33.0 + 1.0 / 3.0,
            alpha,
            beta: alpha / 32.0,
        }
    }
}

/// Get the default controller config file path
///
/// Returns: ~/.config/dn-sc2000/controller.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dn-sc2000")
        .join("controller.yaml")
}

/// Load controller configuration from a YAML file
///
/// If the file doesn't exist, returns the default config.
/// If the file exists but is invalid, logs a warning and returns the default config.
pub fn load_config(path: &Path) -> ControllerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return ControllerConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<ControllerConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: port_match '{}', fx_knob_quant {}, {} extra route(s)",
                    config.port_match,
                    config.fx_knob_quant,
                    config.routes.len()
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}", e);
                ControllerConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}", e);
            ControllerConfig::default()
        }
    }
}

/// Save controller configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &ControllerConfig, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize controller config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write controller config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}
