// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render and camera settings, named presets, and the process-wide store.

use std::sync::{OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::Easing;

/// Which nodes are considered and how far ahead of the edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CullSettings {
    /// Viewport padding on every side, as a fraction of its diagonal.
    pub pad_fraction: f64,
    /// Extra padding on top and bottom, in pixels.
    pub vertical_pad_px: f64,
    /// Nodes smaller than this on screen are not drawn and not descended into.
    pub min_node_radius_px: f64,
    /// Upper bound on hydration requests issued from one frame.
    pub max_requests_per_frame: usize,
}

impl Default for CullSettings {
    fn default() -> Self {
        Preset::Balanced.settings().cull
    }
}

/// Label thresholds and the placement grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSettings {
    /// Edge of a label grid cell, in pixels.
    pub cell_px: f64,
    /// Minimum screen radius for a labelled node.
    pub min_radius_px: f64,
    /// Font size as a fraction of screen radius.
    pub font_scale: f64,
    /// Minimum effective font size.
    pub min_font_px: f64,
    /// Effective font sizes are capped here.
    pub max_font_px: f64,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Preset::Balanced.settings().labels
    }
}

impl LabelSettings {
    /// Font size a node of `radius_px` would be labelled at.
    pub fn font_px(&self, radius_px: f64) -> f64 {
        (radius_px * self.font_scale).min(self.max_font_px)
    }
}

/// Camera animation defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    /// Length of click-to-zoom transitions in milliseconds.
    pub animation_ms: u64,
    /// Curve.
    pub easing: Easing,
    /// Free margin around a zoomed-to circle, as a fraction of the short side.
    pub fit_margin: f64,
    /// Smallest scale.
    pub min_k: f64,
    /// Largest scale.
    pub max_k: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Preset::Balanced.settings().camera
    }
}

/// Everything a viewport reads per frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Culling.
    pub cull: CullSettings,
    /// Labels.
    pub labels: LabelSettings,
    /// Camera.
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Preset::Balanced.settings()
    }
}

/// Could not read settings.
#[derive(Debug, thiserror::Error)]
#[error("invalid settings: {0}")]
pub struct SettingsError(#[from] serde_json::Error);

impl Settings {
    /// Parse settings from JSON. Missing fields take their `Balanced` values.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SettingsError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The enumerated setting bundles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    /// Wide padding, small nodes and dense labels.
    Quality,
    /// The default.
    #[default]
    Balanced,
    /// Tight padding and aggressive culling for slow machines or huge trees.
    Performance,
}

impl Preset {
    /// Every preset, in menu order.
    pub const ALL: [Self; 3] = [Self::Quality, Self::Balanced, Self::Performance];

    /// The settings this preset stands for.
    pub fn settings(self) -> Settings {
        let (cull, labels, animation_ms) = match self {
            Self::Quality => (
                CullSettings {
                    pad_fraction: 0.25,
                    vertical_pad_px: 80.0,
                    min_node_radius_px: 0.5,
                    max_requests_per_frame: 32,
                },
                LabelSettings {
                    cell_px: 48.0,
                    min_radius_px: 10.0,
                    font_scale: 0.3,
                    min_font_px: 9.0,
                    max_font_px: 28.0,
                },
                750,
            ),
            Self::Balanced => (
                CullSettings {
                    pad_fraction: 0.15,
                    vertical_pad_px: 48.0,
                    min_node_radius_px: 1.0,
                    max_requests_per_frame: 16,
                },
                LabelSettings {
                    cell_px: 64.0,
                    min_radius_px: 14.0,
                    font_scale: 0.3,
                    min_font_px: 10.0,
                    max_font_px: 24.0,
                },
                600,
            ),
            Self::Performance => (
                CullSettings {
                    pad_fraction: 0.05,
                    vertical_pad_px: 16.0,
                    min_node_radius_px: 2.5,
                    max_requests_per_frame: 6,
                },
                LabelSettings {
                    cell_px: 96.0,
                    min_radius_px: 20.0,
                    font_scale: 0.28,
                    min_font_px: 11.0,
                    max_font_px: 20.0,
                },
                400,
            ),
        };
        Settings {
            cull,
            labels,
            camera: CameraSettings {
                animation_ms,
                easing: Easing::CubicInOut,
                fit_margin: 0.1,
                min_k: 1e-4,
                max_k: 1e7,
            },
        }
    }
}

#[derive(Debug)]
struct Current {
    settings: Settings,
    preset: Option<Preset>,
}

/// A shared settings value with read snapshots.
///
/// Components take a [`Settings`] snapshot at construction or per frame;
/// they never hold the lock. [`SettingsStore::global`] is the process-wide
/// instance; tests and embedders can create private ones.
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<Current>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl SettingsStore {
    /// A store holding a preset's settings.
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            current: RwLock::new(Current {
                settings: preset.settings(),
                preset: Some(preset),
            }),
        }
    }

    /// A store holding custom settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            current: RwLock::new(Current {
                settings,
                preset: None,
            }),
        }
    }

    /// The process-wide store, created on first use with the default preset.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<SettingsStore> = OnceLock::new();
        GLOBAL.get_or_init(Self::default)
    }

    /// A copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .settings
            .clone()
    }

    /// The preset the current settings came from, if they were not customised.
    pub fn preset(&self) -> Option<Preset> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .preset
    }

    /// Replace the settings with a preset's.
    pub fn apply_preset(&self, preset: Preset) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.settings = preset.settings();
        current.preset = Some(preset);
        tracing::info!(?preset, "settings preset applied");
    }

    /// Edit the settings in place. The result no longer counts as a preset.
    pub fn update(&self, edit: impl FnOnce(&mut Settings)) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        edit(&mut current.settings);
        current.preset = None;
    }
}
