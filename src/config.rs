//! Configuration management
//!
//! YAML configuration with per-field defaults. Everything here is read once
//! at startup and fixed for the process lifetime - the device channel in
//! particular must match the console's own MIDI setting, so there is no hot
//! reload.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub osc: OscConfig,
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// OSC listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OscConfig {
    /// Address the OSC UDP server binds
    #[serde(default = "default_osc_bind")]
    pub bind: String,
}

/// Outbound MIDI configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// MIDI channel the console listens on (Utility > General > MIDI), 1-16
    #[serde(default = "default_device_channel")]
    pub device_channel: u8,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where encoded frames go
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputConfig {
    /// MIDI-over-UDP, one frame per datagram (the console's network port)
    Udp {
        #[serde(default = "default_udp_target")]
        target: String,
    },
    /// Local MIDI output port, matched by name substring
    Port { name: String },
}

/// Simulator listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Address the simulator binds; defaults to the console's MIDI port
    #[serde(default = "default_simulator_bind")]
    pub bind: String,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self { bind: default_osc_bind() }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            device_channel: default_device_channel(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::Udp { target: default_udp_target() }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { bind: default_simulator_bind() }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path).await
        } else {
            debug!("No config file at {}, using defaults", path);
            Ok(Self::default())
        }
    }
}

// Default value functions
fn default_osc_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_udp_target() -> String {
    "127.0.0.1:51325".to_string()
}
fn default_simulator_bind() -> String {
    "0.0.0.0:51325".to_string()
}
fn default_device_channel() -> u8 {
    1
}
