// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding spheres.

use crate::field::Vec3f;
use crate::transform::Transform3d;

/// A bounding sphere, or one of the two degenerate states.
///
/// An *empty* sphere bounds nothing and is the identity for
/// [`extend`](Self::extend). A *maximized* sphere stands for an unknown
/// extent; it absorbs everything it is unioned with and never culls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    center: Vec3f,
    radius: f32,
}

impl BoundingSphere {
    /// The empty sphere.
    pub const EMPTY: Self = Self {
        center: Vec3f::ZERO,
        radius: -1.0,
    };

    /// The maximized sphere (unknown extent).
    pub const MAX: Self = Self {
        center: Vec3f::ZERO,
        radius: f32::INFINITY,
    };

    /// Creates a sphere. A negative radius yields [`EMPTY`](Self::EMPTY).
    #[must_use]
    pub fn new(center: Vec3f, radius: f32) -> Self {
        if radius < 0.0 {
            Self::EMPTY
        } else {
            Self { center, radius }
        }
    }

    /// Sphere circumscribing an axis-aligned box of `size` centered at the
    /// origin.
    #[must_use]
    pub fn from_box_size(size: Vec3f) -> Self {
        Self::new(Vec3f::ZERO, (size * 0.5).length())
    }

    /// Center of the sphere. Meaningless when empty or maximized.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Vec3f {
        self.center
    }

    /// Radius of the sphere; negative when empty, infinite when maximized.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether this sphere bounds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    /// Whether this sphere stands for an unknown extent.
    #[inline]
    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.radius == f32::INFINITY
    }

    /// Grows the sphere to contain `p`.
    pub fn extend_point(&mut self, p: Vec3f) {
        self.extend(&Self::new(p, 0.0));
    }

    /// Grows the sphere to contain `other`.
    ///
    /// The union of two disjoint or overlapping spheres is the smallest
    /// sphere containing both: its diameter spans the far sides of the two
    /// along the line through their centers.
    pub fn extend(&mut self, other: &Self) {
        if other.is_empty() || self.is_maximized() {
            return;
        }
        if self.is_empty() || other.is_maximized() {
            *self = *other;
            return;
        }
        let delta = other.center - self.center;
        let d = delta.length();
        if d + other.radius <= self.radius {
            return;
        }
        if d + self.radius <= other.radius {
            *self = *other;
            return;
        }
        let radius = (d + self.radius + other.radius) * 0.5;
        self.center = self.center + delta * ((radius - self.radius) / d);
        self.radius = radius;
    }

    /// Image of this sphere under `m`. Non-uniform scale is handled
    /// conservatively by scaling the radius by the largest axis scale. A
    /// non-finite `m` yields [`MAX`](Self::MAX).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "radius stays single precision like the field values it comes from"
    )]
    pub fn transform(&self, m: &Transform3d) -> Self {
        if self.is_empty() || self.is_maximized() {
            return *self;
        }
        if !m.is_finite() {
            return Self::MAX;
        }
        Self {
            center: m.transform_point(self.center),
            radius: (f64::from(self.radius) * m.max_axis_scale()) as f32,
        }
    }

    /// Whether `p` lies within the sphere.
    #[must_use]
    pub fn contains(&self, p: Vec3f) -> bool {
        !self.is_empty() && (self.is_maximized() || (p - self.center).length() <= self.radius)
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::EMPTY
    }
}
