//! Map-style perspective camera: orbits a target point, pans in screen space
//! and dollies towards the target on scroll. It starts looking straight down
//! -z at the book.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

const FOV_Y_DEGREES: f32 = 20.0;
const NEAR_CLIP: f32 = 0.1;
const FAR_CLIP: f32 = 1500.0;
const START_DISTANCE: f32 = 1000.0;
const MIN_DISTANCE: f32 = 100.0;
const MAX_DISTANCE: f32 = 1200.0;
const ZOOM_SPEED: f32 = 0.5;
/// Distance factor per wheel notch before `ZOOM_SPEED` is applied.
const ZOOM_BASE: f32 = 0.95;
/// Keeps the polar angle off the poles, where `Vec3::Y` stops being a usable
/// up vector.
const POLE_MARGIN: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Right, up and forward unit vectors of the view.
#[derive(Debug, Clone, Copy)]
struct ViewBasis {
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

#[derive(Debug, Clone)]
pub struct MapCamera {
    target: Vec3,
    distance: f32,
    /// Rotation of the eye about the target's y axis; 0 puts it on +z.
    azimuth: f32,
    /// Angle between +y and the eye's offset from the target.
    polar: f32,
    aspect: f32,
}

impl MapCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            distance: START_DISTANCE,
            azimuth: 0.0,
            polar: PI * 0.5,
            aspect: 1.0,
        };
        camera.set_viewport(width, height);
        camera
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        let offset = Vec3::new(
            sin_polar * sin_azimuth,
            cos_polar,
            sin_polar * cos_azimuth,
        );
        self.target + offset * self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Reversed-z projection (near maps to 1, far to 0); pair with a
    /// `Greater` depth test cleared to 0. Stacked sheets sit one unit apart
    /// at ~1000 units from the eye, which a forward depth range cannot
    /// separate.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), self.aspect, FAR_CLIP, NEAR_CLIP)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Drags the view by a pointer delta in physical pixels; the point under
    /// the cursor on the plane through the target stays under the cursor.
    pub fn pan_pixels(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        if viewport_height == 0 {
            return;
        }
        let units_per_pixel = self.visible_height() / viewport_height as f32;
        let basis = self.basis();
        self.target += (basis.up * dy - basis.right * dx) * units_per_pixel;
    }

    /// Orbits the eye around the target. A drag across the full viewport
    /// height turns the view one full revolution.
    pub fn orbit_pixels(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        if viewport_height == 0 {
            return;
        }
        let radians_per_pixel = TAU / viewport_height as f32;
        self.azimuth = (self.azimuth - dx * radians_per_pixel).rem_euclid(TAU);
        self.polar = (self.polar - dy * radians_per_pixel).clamp(POLE_MARGIN, PI - POLE_MARGIN);
    }

    /// Positive `notches` (scroll up) move closer.
    pub fn zoom(&mut self, notches: f32) {
        if !notches.is_finite() || notches == 0.0 {
            return;
        }
        let factor = ZOOM_BASE.powf(ZOOM_SPEED * notches);
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Ray from the eye through a point in normalised device coordinates.
    pub fn ray(&self, ndc: [f32; 2]) -> Ray {
        let half_height = (FOV_Y_DEGREES.to_radians() * 0.5).tan();
        let half_width = half_height * self.aspect;
        let basis = self.basis();
        let direction = (basis.forward
            + basis.right * (ndc[0] * half_width)
            + basis.up * (ndc[1] * half_height))
            .normalize();
        Ray {
            origin: self.position(),
            direction,
        }
    }

    /// Same basis `look_at_rh` derives from the eye, target and `Vec3::Y`.
    fn basis(&self) -> ViewBasis {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        ViewBasis { right, up, forward }
    }

    fn visible_height(&self) -> f32 {
        2.0 * self.distance * (FOV_Y_DEGREES.to_radians() * 0.5).tan()
    }
}

/// Converts a cursor position in physical pixels to normalised device
/// coordinates (`y` up).
pub fn cursor_to_ndc(x: f64, y: f64, width: u32, height: u32) -> [f32; 2] {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));
    [
        ((x / width) * 2.0 - 1.0) as f32,
        (1.0 - (y / height) * 2.0) as f32,
    ]
}
