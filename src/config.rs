// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Runtime configuration.
//!
//! A `Config` is built once (defaults, or a user TOML file) and handed to the
//! stroke processor, the layout engine and the canvas session. Missing keys
//! fall back to their defaults, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! default_child_scale = 0.5
//!
//! [pressure_curve]
//! x1 = 0.3
//! y1 = 0.7
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Control point of the quadratic pressure curve `(0,0)-(x1,y1)-(1,1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureCurve {
    pub x1: f64,
    pub y1: f64,
}

impl Default for PressureCurve {
    fn default() -> Self {
        Self { x1: 0.2, y1: 0.8 }
    }
}

/// Gaussian smoothing applied to raw pen samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Smoothing {
    /// Strength of the smoothing kernel
    pub factor: f64,
    /// Only smooth a sample whose summed squared distance to its neighbours
    /// is below this
    pub near: f64,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            factor: 0.6,
            near: 7.0,
        }
    }
}

/// Line simplification of smoothed strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Simplify {
    /// Maximum distance error tolerated when dropping a sample
    pub tolerance: f64,
    /// Multiplier on the pressure channel so it weighs comparably with
    /// position in the distance metric
    pub pressure_weight: f64,
}

impl Default for Simplify {
    fn default() -> Self {
        Self {
            tolerance: 0.18,
            pressure_weight: 10.0,
        }
    }
}

/// All tunable inputs of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pressure_curve: PressureCurve,
    pub smoothing: Smoothing,
    pub simplify: Simplify,
    /// Scale given to stems created directly under a depth-0 stem
    pub default_child_scale: f64,
    /// Pointer travel (in item units) below which a press is not a drag
    pub no_move_threshold: f64,
    /// Hold time after which a press turns into a new-branch gesture
    pub long_press_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pressure_curve: PressureCurve::default(),
            smoothing: Smoothing::default(),
            simplify: Simplify::default(),
            default_child_scale: 0.6,
            no_move_threshold: 2.0,
            long_press_ms: 800,
        }
    }
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Look for a user config in the usual places, falling back to defaults.
    ///
    /// A config file that exists but fails to parse is reported and ignored.
    pub fn discover() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(dir).join("nexus").join("config.toml"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("nexus")
                    .join("config.toml"),
            );
        }
        paths
    }
}
