// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera state machine: an eased flight, interrupted halfway.
//!
//! Run:
//! - `cargo run -p arbor_demos --example camera_animation`

use std::time::Duration;

use arbor_view::{Camera, CameraController, CameraState, Easing};

fn main() {
    let mut controller = CameraController::new(Camera::new(0.0, 0.0, 1.0));
    controller.animate_to(Camera::new(100.0, 100.0, 2.0), Duration::from_millis(300), Duration::ZERO);

    println!("cubic in-out, 300 ms:");
    for ms in (0..=300).step_by(50) {
        controller.tick(Duration::from_millis(ms));
        let c = controller.camera();
        println!("  t={ms:>3}ms  x={:>7.2} y={:>7.2} k={:.3}", c.x, c.y, c.k);
    }
    assert_eq!(controller.state(), CameraState::Idle);

    // Retarget mid-flight: the new animation starts where the old one was.
    let mut controller = CameraController::new(Camera::new(0.0, 0.0, 1.0)).with_easing(Easing::Linear);
    controller.animate_to(Camera::new(100.0, 0.0, 1.0), Duration::from_millis(200), Duration::ZERO);
    controller.tick(Duration::from_millis(100));
    println!("linear, retargeted at 100 ms from x={:.1}:", controller.camera().x);
    controller.animate_to(Camera::new(0.0, 50.0, 4.0), Duration::from_millis(200), Duration::from_millis(100));
    for ms in (100..=300).step_by(50) {
        controller.tick(Duration::from_millis(ms));
        let c = controller.camera();
        println!("  t={ms:>3}ms  x={:>7.2} y={:>7.2} k={:.3}", c.x, c.y, c.k);
    }
}
