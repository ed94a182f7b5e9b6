// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor View: cameras, projection, and viewport settings.
//!
//! - [`Camera`] is `(x, y, k)`: the world point at the viewport centre and the
//!   pixels-per-unit scale.
//! - [`CameraController`] is a two-state machine (`Idle`, `Animating`) that
//!   eases the camera toward a target. Time is injected, so the same
//!   controller runs under a frame callback, a test clock, or a tokio task.
//! - [`Projection`] maps world and screen coordinates for a viewport size.
//! - [`Settings`] and [`Preset`] hold the per-frame thresholds;
//!   [`SettingsStore`] shares them across the process.
//!
//! ```
//! use core::time::Duration;
//! use arbor_view::{Camera, CameraController};
//!
//! let mut ctl = CameraController::new(Camera::new(0.0, 0.0, 1.0));
//! ctl.animate_to(Camera::new(100.0, 100.0, 2.0), Duration::from_millis(300), Duration::ZERO);
//! assert!(ctl.tick(Duration::from_millis(100)));
//! assert!(ctl.camera().x > 0.0 && ctl.camera().x < 100.0);
//! ctl.tick(Duration::from_millis(300));
//! assert!(!ctl.is_animating());
//! ```

mod camera;
mod projection;
mod settings;

pub use camera::{Animation, Camera, CameraController, CameraState, Easing};
pub use projection::Projection;
pub use settings::{
    CameraSettings, CullSettings, LabelSettings, Preset, Settings, SettingsError, SettingsStore,
};
