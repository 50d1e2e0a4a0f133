//! Pan/zoom/rotate state and world <-> screen conversion.
//!
//! The screen matrix is `T(t) · T(c) · R(θ) · T(-c) · S(s)` where `t` is the translation, `c` the
//! view center, `θ` the raw rotation and `s` the uniform scale. Rotation is stored exactly as
//! requested so that relative rotations compose across full turns; only
//! [`Transform::rotation_normalized`] folds it into `[0, 2π)`.

use std::f64::consts::TAU;

use nalgebra::{Matrix3, Vector3};
use narwhal_scene::Bounds;
use serde::{Deserialize, Serialize};

pub type Point = nalgebra::Point2<f64>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, ViewportError>;

fn finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ViewportError::NonFinite { what, value })
    }
}

fn positive(what: &'static str, value: f64) -> Result<f64> {
    if finite(what, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ViewportError::NonPositive { what, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportOptions {
    pub width: f64,
    pub height: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// World-space box `[[min_x, min_y], [max_x, max_y]]` the view center may not leave.
    pub translate_extent: Option<[[f64; 2]; 2]>,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            min_zoom: 0.01,
            max_zoom: 10.0,
            translate_extent: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    /// Raw accumulated rotation in radians.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    /// Rotation folded into `[0, 2π)`, for display.
    pub fn rotation_normalized(&self) -> f64 {
        let r = self.rotation.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs.
        if r >= TAU { 0.0 } else { r }
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_normalized().to_degrees()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Viewport {
    options: ViewportOptions,
    transform: Transform,
}

impl Viewport {
    pub fn new(options: ViewportOptions) -> Result<Self> {
        positive("width", options.width)?;
        positive("height", options.height)?;
        positive("minZoom", options.min_zoom)?;
        positive("maxZoom", options.max_zoom)?;
        if options.min_zoom > options.max_zoom {
            return Err(ViewportError::NonPositive {
                what: "maxZoom - minZoom",
                value: options.max_zoom - options.min_zoom,
            });
        }
        if let Some(extent) = options.translate_extent {
            for v in extent.iter().flatten() {
                finite("translateExtent", *v)?;
            }
        }
        let scale = 1.0f64.clamp(options.min_zoom, options.max_zoom);
        Ok(Self {
            options,
            transform: Transform {
                scale,
                ..Transform::default()
            },
        })
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    pub fn size(&self) -> (f64, f64) {
        (self.options.width, self.options.height)
    }

    /// View center in screen coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.options.width / 2.0, self.options.height / 2.0)
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        let Transform {
            translate_x,
            translate_y,
            scale,
            rotation,
        } = self.transform;
        let c = self.center();
        let (sin, cos) = rotation.sin_cos();
        // Rotation about c, then translation.
        let tx = translate_x + c.x - (cos * c.x - sin * c.y);
        let ty = translate_y + c.y - (sin * c.x + cos * c.y);
        Matrix3::new(
            cos * scale,
            -sin * scale,
            tx,
            sin * scale,
            cos * scale,
            ty,
            0.0,
            0.0,
            1.0,
        )
    }

    pub fn inverse_matrix(&self) -> Matrix3<f64> {
        let m = self.matrix();
        let s = self.transform.scale;
        let (sin, cos) = self.transform.rotation.sin_cos();
        let (tx, ty) = (m[(0, 2)], m[(1, 2)]);
        // (R·s)^-1 = Rᵀ / s
        let (a, b, c, d) = (cos / s, sin / s, -sin / s, cos / s);
        Matrix3::new(
            a,
            b,
            -(a * tx + b * ty),
            c,
            d,
            -(c * tx + d * ty),
            0.0,
            0.0,
            1.0,
        )
    }

    /// The six affine coefficients `[a, b, c, d, e, f]` in canvas `setTransform` order.
    pub fn affine(&self) -> [f64; 6] {
        let m = self.matrix();
        [m[(0, 0)], m[(1, 0)], m[(0, 1)], m[(1, 1)], m[(0, 2)], m[(1, 2)]]
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        apply(&self.matrix(), p)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        apply(&self.inverse_matrix(), p)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<()> {
        finite("dx", dx)?;
        finite("dy", dy)?;
        self.guarded(|vp| {
            vp.transform.translate_x += dx;
            vp.transform.translate_y += dy;
            vp.clamp_to_extent();
        })
    }

    /// Sets the scale (clamped to the zoom range) keeping `anchor` (screen space, defaulting to
    /// the view center) fixed on screen.
    pub fn zoom_to(&mut self, scale: f64, anchor: Option<Point>) -> Result<()> {
        finite("scale", scale)?;
        let anchor = self.anchor(anchor)?;
        self.guarded(|vp| {
            let pinned = vp.screen_to_world(anchor);
            vp.transform.scale = scale.clamp(vp.options.min_zoom, vp.options.max_zoom);
            vp.keep_on_screen(pinned, anchor);
            vp.clamp_to_extent();
        })
    }

    pub fn zoom_by(&mut self, ratio: f64, anchor: Option<Point>) -> Result<()> {
        finite("ratio", ratio)?;
        self.zoom_to(self.transform.scale * ratio, anchor)
    }

    /// Sets the raw rotation, pivoting about the view center.
    pub fn rotate_to(&mut self, radians: f64) -> Result<()> {
        finite("rotation", radians)?;
        self.guarded(|vp| {
            let center = vp.center();
            let pinned = vp.screen_to_world(center);
            vp.transform.rotation = radians;
            vp.keep_on_screen(pinned, center);
        })
    }

    pub fn rotate_by(&mut self, delta: f64) -> Result<()> {
        finite("rotation delta", delta)?;
        self.rotate_to(self.transform.rotation + delta)
    }

    pub fn rotate_to_degrees(&mut self, degrees: f64) -> Result<()> {
        finite("rotation", degrees)?;
        self.rotate_to(degrees.to_radians())
    }

    /// Changes the view size. The world point under the old center stays centered.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        positive("width", width)?;
        positive("height", height)?;
        self.guarded(|vp| {
            let pinned = vp.screen_to_world(vp.center());
            vp.options.width = width;
            vp.options.height = height;
            vp.center_on(pinned);
        })
    }

    /// Scales and translates so `bounds` (world space) fills the view minus `padding`, honoring
    /// the current rotation.
    pub fn fit_view(&mut self, bounds: Bounds, padding: f64) -> Result<()> {
        finite("padding", padding)?;
        for v in [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y] {
            finite("bounds", v)?;
        }
        self.guarded(|vp| {
            let (sin, cos) = vp.transform.rotation.sin_cos();
            let (w, h) = (bounds.width(), bounds.height());
            let rotated_w = (w * cos).abs() + (h * sin).abs();
            let rotated_h = (w * sin).abs() + (h * cos).abs();
            let avail_w = (vp.options.width - 2.0 * padding).max(1.0);
            let avail_h = (vp.options.height - 2.0 * padding).max(1.0);

            let fitted = (avail_w / rotated_w).min(avail_h / rotated_h);
            if fitted.is_finite() {
                vp.transform.scale = fitted.clamp(vp.options.min_zoom, vp.options.max_zoom);
            }
            let (cx, cy) = bounds.center();
            vp.center_on(Point::new(cx, cy));
        })
    }

    /// Translates so the world point `p` sits at the view center.
    pub fn fit_center(&mut self, p: Point) -> Result<()> {
        finite("center.x", p.x)?;
        finite("center.y", p.y)?;
        self.guarded(|vp| vp.center_on(p))
    }

    fn center_on(&mut self, p: Point) {
        let center = self.center();
        self.keep_on_screen(p, center);
        self.clamp_to_extent();
    }

    /// Applies `update`, restoring the previous state if the transform ends up non-finite.
    fn guarded(&mut self, update: impl FnOnce(&mut Self)) -> Result<()> {
        let before = (self.transform, self.options.width, self.options.height);
        update(self);
        let t = self.transform;
        let broken = [
            ("translateX", t.translate_x),
            ("translateY", t.translate_y),
            ("scale", t.scale),
            ("rotation", t.rotation),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite());
        if let Some((what, value)) = broken {
            (self.transform, self.options.width, self.options.height) = before;
            return Err(ViewportError::NonFinite { what, value });
        }
        Ok(())
    }

    fn anchor(&self, anchor: Option<Point>) -> Result<Point> {
        match anchor {
            Some(a) => {
                finite("anchor.x", a.x)?;
                finite("anchor.y", a.y)?;
                Ok(a)
            }
            None => Ok(self.center()),
        }
    }

    /// Adjusts the translation so `world` maps onto `screen`.
    fn keep_on_screen(&mut self, world: Point, screen: Point) {
        let now = self.world_to_screen(world);
        self.transform.translate_x += screen.x - now.x;
        self.transform.translate_y += screen.y - now.y;
    }

    fn clamp_to_extent(&mut self) {
        let Some([[min_x, min_y], [max_x, max_y]]) = self.options.translate_extent else {
            return;
        };
        let center = self.center();
        let focus = self.screen_to_world(center);
        let clamped = Point::new(
            focus.x.clamp(min_x.min(max_x), max_x.max(min_x)),
            focus.y.clamp(min_y.min(max_y), max_y.max(min_y)),
        );
        if clamped != focus {
            self.keep_on_screen(clamped, center);
        }
    }
}

fn apply(m: &Matrix3<f64>, p: Point) -> Point {
    let v = m * Vector3::new(p.x, p.y, 1.0);
    Point::new(v.x, v.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn inverse_matrix_is_exact_inverse() {
        let mut vp = Viewport::default();
        vp.pan(13.0, -7.0).unwrap();
        vp.zoom_to(2.5, Some(Point::new(100.0, 50.0))).unwrap();
        vp.rotate_to(1.1).unwrap();
        let product = vp.matrix() * vp.inverse_matrix();
        assert!((product - Matrix3::identity()).norm() < 1e-9);
    }

    #[test]
    fn rotation_pivots_about_view_center() {
        let mut vp = Viewport::default();
        vp.pan(40.0, 10.0).unwrap();
        let center = vp.center();
        let before = vp.screen_to_world(center);
        vp.rotate_to(0.7).unwrap();
        assert!(close(vp.world_to_screen(before), center));
    }

    #[test]
    fn negative_rotation_normalizes_into_range() {
        let t = Transform {
            rotation: -std::f64::consts::FRAC_PI_2,
            ..Default::default()
        };
        assert!((t.rotation_degrees() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(
            Viewport::new(ViewportOptions {
                width: 0.0,
                ..Default::default()
            })
            .is_err()
        );
        assert!(
            Viewport::new(ViewportOptions {
                min_zoom: 4.0,
                max_zoom: 2.0,
                ..Default::default()
            })
            .is_err()
        );
    }
}
