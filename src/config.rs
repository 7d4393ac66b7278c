// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine configuration.
//!
//! Every field has a default matching the tool's stock behaviour, so an
//! empty or partial YAML file is valid.

use crate::util::geometry::{EDGE_TOLERANCE, HANDLE_TOLERANCE, MIN_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "FRAMEMARK_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_edge_tolerance")]
    pub edge_tolerance: f64,
    #[serde(default = "default_handle_tolerance")]
    pub handle_tolerance: f64,
    #[serde(default = "default_min_size")]
    pub min_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Largest key distance accepted by the nearest-frame fallback
    #[serde(default = "default_fallback_distance")]
    pub fallback_distance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_max_screens")]
    pub max_screens: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

// Default value functions
fn default_edge_tolerance() -> f64 {
    EDGE_TOLERANCE
}

fn default_handle_tolerance() -> f64 {
    HANDLE_TOLERANCE
}

fn default_min_size() -> f64 {
    MIN_SIZE
}

fn default_fallback_distance() -> u64 {
    5
}

fn default_interval_ms() -> u64 {
    200
}

fn default_max_screens() -> usize {
    4
}

fn default_load_timeout_ms() -> u64 {
    30_000
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: default_edge_tolerance(),
            handle_tolerance: default_handle_tolerance(),
            min_size: default_min_size(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fallback_distance: default_fallback_distance(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_screens: default_max_screens(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl MediaConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

impl EngineConfig {
    /// Load a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Config named by `$FRAMEMARK_CONFIG`, or defaults. A broken file is
    /// logged and replaced by defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::error!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }
}
