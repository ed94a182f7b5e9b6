// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera value and the eased animation state machine that drives it.

use core::time::Duration;

/// A view onto the layout plane: `(x, y)` is the world point shown at the
/// viewport centre, `k` the scale from world units to pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// World x at the viewport centre.
    pub x: f64,
    /// World y at the viewport centre.
    pub y: f64,
    /// Pixels per world unit.
    pub k: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl Camera {
    /// A camera centred on `(x, y)` at scale `k`.
    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    /// Componentwise linear interpolation; `t` is not clamped.
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }
}

/// Easing curve applied to the elapsed fraction of an animation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// Cubic ease-in-out.
    #[default]
    CubicInOut,
    /// No easing.
    Linear,
}

impl Easing {
    /// Map `t` in `[0, 1]` onto the curve. Fixes both endpoints.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

/// One interpolation from a captured start camera to a target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Animation {
    /// Camera at the moment the animation started.
    pub from: Camera,
    /// Camera at the end.
    pub to: Camera,
    /// Clock reading at the start.
    pub start: Duration,
    /// Length of the animation; never zero.
    pub duration: Duration,
    /// Curve.
    pub easing: Easing,
}

impl Animation {
    /// Elapsed fraction at `now`, in `[0, 1]`.
    pub fn progress(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Camera at `now`.
    pub fn sample(&self, now: Duration) -> Camera {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(t))
    }
}

/// Where the controller is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CameraState {
    /// Camera equals its target.
    Idle,
    /// Interpolating toward the target.
    Animating(Animation),
}

/// Holds the live camera and its target, and interpolates between them.
///
/// Time is whatever the caller says it is: every method that needs the clock
/// takes `now` as a [`Duration`] since an arbitrary fixed origin. A new
/// [`animate_to`](Self::animate_to) while animating restarts from the current
/// camera and drops the old target.
#[derive(Clone, Debug)]
pub struct CameraController {
    camera: Camera,
    target: Camera,
    state: CameraState,
    easing: Easing,
    min_k: f64,
    max_k: f64,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

impl CameraController {
    /// An idle controller at `camera`.
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            target: camera,
            state: CameraState::Idle,
            easing: Easing::default(),
            min_k: 1e-6,
            max_k: 1e9,
        }
    }

    /// Use `easing` for subsequent animations.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Clamp every target scale into `[min_k, max_k]`. Swapped bounds are reordered.
    #[must_use]
    pub fn with_zoom_limits(mut self, min_k: f64, max_k: f64) -> Self {
        let (lo, hi) = if min_k <= max_k {
            (min_k, max_k)
        } else {
            (max_k, min_k)
        };
        self.min_k = lo;
        self.max_k = hi;
        self
    }

    /// The camera as of the last tick.
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Where the camera is headed. Equals [`camera`](Self::camera) when idle.
    pub fn target(&self) -> Camera {
        self.target
    }

    /// Current state.
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Whether an animation is running.
    pub fn is_animating(&self) -> bool {
        matches!(self.state, CameraState::Animating(_))
    }

    /// Scale limits.
    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_k, self.max_k)
    }

    fn clamp(&self, mut camera: Camera) -> Camera {
        camera.k = camera.k.clamp(self.min_k, self.max_k);
        camera
    }

    /// Start animating toward `target`, replacing any animation in flight.
    ///
    /// The start point is the camera as it is at `now`, so an interrupted
    /// animation continues smoothly. A zero duration jumps.
    pub fn animate_to(&mut self, target: Camera, duration: Duration, now: Duration) {
        let target = self.clamp(target);
        if let CameraState::Animating(anim) = self.state {
            self.camera = anim.sample(now);
        }
        if duration.is_zero() {
            self.jump_to(target);
            return;
        }
        self.target = target;
        self.state = CameraState::Animating(Animation {
            from: self.camera,
            to: target,
            start: now,
            duration,
            easing: self.easing,
        });
        tracing::trace!(?target, ?duration, "camera animation started");
    }

    /// Set camera and target and go idle.
    pub fn jump_to(&mut self, camera: Camera) {
        let camera = self.clamp(camera);
        self.camera = camera;
        self.target = camera;
        self.state = CameraState::Idle;
    }

    /// Advance to `now`. Returns whether the camera moved, i.e. whether a
    /// render is needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        let CameraState::Animating(anim) = self.state else {
            return false;
        };
        self.camera = anim.sample(now);
        if anim.progress(now) >= 1.0 {
            self.camera = anim.to;
            self.state = CameraState::Idle;
        }
        true
    }
}
