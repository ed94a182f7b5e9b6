// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! World-to-screen projection for a camera and viewport.

use kurbo::{Circle, Point, Rect, Size, Vec2};

use crate::Camera;

/// Maps between the layout plane and a viewport of a given pixel size.
///
/// `screen = (world - camera) * k + centre`, radii scale by `k`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Viewport size in pixels.
    pub viewport: Size,
}

impl Projection {
    /// A projection onto a `viewport`-sized surface.
    pub fn new(viewport: Size) -> Self {
        Self { viewport }
    }

    /// Viewport centre in pixels.
    pub fn center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// The viewport as a rectangle at the origin.
    pub fn screen_rect(&self) -> Rect {
        self.viewport.to_rect()
    }

    /// Project a world point.
    pub fn world_to_screen(&self, camera: Camera, pt: Point) -> Point {
        let c = self.center();
        Point::new((pt.x - camera.x) * camera.k + c.x, (pt.y - camera.y) * camera.k + c.y)
    }

    /// Project a world circle.
    pub fn circle_to_screen(&self, camera: Camera, circle: Circle) -> Circle {
        Circle::new(
            self.world_to_screen(camera, circle.center),
            circle.radius * camera.k,
        )
    }

    /// Unproject a screen point.
    pub fn screen_to_world(&self, camera: Camera, pt: Point) -> Point {
        let c = self.center();
        Point::new((pt.x - c.x) / camera.k + camera.x, (pt.y - c.y) / camera.k + camera.y)
    }

    /// The viewport grown by `pad_fraction` of its diagonal on every side and
    /// by `vertical_pad_px` more on top and bottom, in screen space.
    pub fn padded_viewport(&self, pad_fraction: f64, vertical_pad_px: f64) -> Rect {
        let pad = pad_fraction.max(0.0) * self.viewport.width.hypot(self.viewport.height);
        let vpad = pad + vertical_pad_px.max(0.0);
        Rect::new(
            -pad,
            -vpad,
            self.viewport.width + pad,
            self.viewport.height + vpad,
        )
    }

    /// The world rectangle covered by `screen`.
    pub fn screen_rect_to_world(&self, camera: Camera, screen: Rect) -> Rect {
        Rect::from_points(
            self.screen_to_world(camera, Point::new(screen.x0, screen.y0)),
            self.screen_to_world(camera, Point::new(screen.x1, screen.y1)),
        )
    }

    /// A camera that centres `circle` and leaves `margin` of the shorter
    /// viewport side free around it (`0.1` leaves ten percent).
    pub fn fit_circle(&self, circle: Circle, margin: f64) -> Camera {
        let side = self.viewport.width.min(self.viewport.height);
        let fill = (1.0 - margin).clamp(0.05, 1.0);
        let k = if circle.radius > 0.0 {
            side * fill / (2.0 * circle.radius)
        } else {
            1.0
        };
        Camera::new(circle.center.x, circle.center.y, k)
    }

    /// Scale by `factor` while keeping the world point under `anchor` fixed.
    pub fn zoom_about(&self, camera: Camera, anchor: Point, factor: f64) -> Camera {
        let world = self.screen_to_world(camera, anchor);
        let k = camera.k * factor;
        let c = self.center();
        Camera::new(world.x - (anchor.x - c.x) / k, world.y - (anchor.y - c.y) / k, k)
    }

    /// Move the view by a screen-space drag delta.
    pub fn pan_by(&self, camera: Camera, delta: Vec2) -> Camera {
        Camera::new(camera.x - delta.x / camera.k, camera.y - delta.y / camera.k, camera.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj() -> Projection {
        Projection::new(Size::new(800.0, 600.0))
    }

    #[test]
    fn projects_and_unprojects() {
        let cam = Camera::new(10.0, -5.0, 2.0);
        let p = proj().world_to_screen(cam, Point::new(20.0, 0.0));
        assert_eq!(p, Point::new(420.0, 310.0));
        assert_eq!(proj().screen_to_world(cam, p), Point::new(20.0, 0.0));
        assert_eq!(proj().circle_to_screen(cam, Circle::new((10.0, -5.0), 3.0)).radius, 6.0);
    }

    #[test]
    fn padded_viewport_grows_by_diagonal() {
        let r = proj().padded_viewport(0.1, 20.0);
        assert_eq!(r, Rect::new(-100.0, -120.0, 900.0, 720.0));
    }

    #[test]
    fn fit_circle_fills_short_side() {
        let cam = proj().fit_circle(Circle::new((5.0, 5.0), 10.0), 0.0);
        assert_eq!(cam, Camera::new(5.0, 5.0, 30.0));
        let r = proj().circle_to_screen(cam, Circle::new((5.0, 5.0), 10.0));
        assert_eq!(r.center, proj().center());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let cam = Camera::new(3.0, 4.0, 1.5);
        let anchor = Point::new(100.0, 500.0);
        let before = proj().screen_to_world(cam, anchor);
        let zoomed = proj().zoom_about(cam, anchor, 4.0);
        let after = proj().screen_to_world(zoomed, anchor);
        assert!((before - after).hypot() < 1e-9);
        assert_eq!(zoomed.k, 6.0);
    }

    #[test]
    fn pan_moves_opposite_to_drag() {
        let cam = proj().pan_by(Camera::new(0.0, 0.0, 2.0), Vec2::new(10.0, -4.0));
        assert_eq!(cam, Camera::new(-5.0, 2.0, 2.0));
    }
}
