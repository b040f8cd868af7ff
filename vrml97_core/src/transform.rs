// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal column-major 4×4 transform.
//!
//! Covers what the scene graph needs: identity, multiply, the VRML97
//! `Transform` composition, point mapping, and the largest axis scale used to
//! keep bounding spheres conservative.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::field::{Rotation, Vec3f};

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation of `radians` about `axis`.
    ///
    /// A zero-length axis yields the identity.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3f, radians: f64) -> Self {
        let (x, y, z) = (f64::from(axis.x), f64::from(axis.y), f64::from(axis.z));
        let len = (x * x + y * y + z * z).sqrt();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        let t = 1.0 - c;
        Self {
            cols: [
                [t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0],
                [t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0],
                [t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates the matrix of an `SFRotation`.
    #[inline]
    #[must_use]
    pub fn from_rotation(rotation: Rotation) -> Self {
        Self::from_axis_angle(rotation.axis, f64::from(rotation.angle))
    }

    /// Composes the VRML97 `Transform` node matrix:
    /// `T × C × R × SR × S × -SR × -C`.
    #[must_use]
    pub fn from_vrml(
        translation: Vec3f,
        center: Vec3f,
        rotation: Rotation,
        scale: Vec3f,
        scale_orientation: Rotation,
    ) -> Self {
        let t = Self::from_translation(
            f64::from(translation.x),
            f64::from(translation.y),
            f64::from(translation.z),
        );
        let c = Self::from_translation(
            f64::from(center.x),
            f64::from(center.y),
            f64::from(center.z),
        );
        let neg_c = Self::from_translation(
            -f64::from(center.x),
            -f64::from(center.y),
            -f64::from(center.z),
        );
        let r = Self::from_rotation(rotation);
        let sr = Self::from_rotation(scale_orientation);
        let neg_sr = Self::from_rotation(scale_orientation.inverse());
        let s = Self::from_scale(f64::from(scale.x), f64::from(scale.y), f64::from(scale.z));
        t * c * r * sr * s * neg_sr * neg_c
    }

    /// Maps a point through this transform (w = 1).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "points are SFVec3f; the product is computed in f64"
    )]
    pub fn transform_point(&self, p: Vec3f) -> Vec3f {
        let c = &self.cols;
        let (x, y, z) = (f64::from(p.x), f64::from(p.y), f64::from(p.z));
        Vec3f::new(
            (c[0][0] * x + c[1][0] * y + c[2][0] * z + c[3][0]) as f32,
            (c[0][1] * x + c[1][1] * y + c[2][1] * z + c[3][1]) as f32,
            (c[0][2] * x + c[1][2] * y + c[2][2] * z + c[3][2]) as f32,
        )
    }

    /// Largest length of the three basis-column images.
    ///
    /// Multiplying a radius by this value bounds the image of a sphere under
    /// any non-uniform scale.
    #[must_use]
    pub fn max_axis_scale(&self) -> f64 {
        let mut max = 0.0_f64;
        for col in &self.cols[..3] {
            let len = (col[0] * col[0] + col[1] * col[1] + col[2] * col[2]).sqrt();
            if len > max {
                max = len;
            }
        }
        max
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: Vec3f, b: Vec3f) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
    }

    #[test]
    fn translation_moves_points() {
        let t = Transform3d::from_translation(10.0, 0.0, -2.0);
        assert_eq!(
            t.transform_point(Vec3f::new(1.0, 1.0, 1.0)),
            Vec3f::new(11.0, 1.0, -1.0)
        );
    }

    #[test]
    fn quarter_turn_about_z() {
        let r = Transform3d::from_axis_angle(Vec3f::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let p = r.transform_point(Vec3f::new(1.0, 0.0, 0.0));
        assert!(approx(p, Vec3f::new(0.0, 1.0, 0.0)), "got {p:?}");
    }

    #[test]
    fn zero_axis_is_identity() {
        assert_eq!(
            Transform3d::from_axis_angle(Vec3f::ZERO, 1.0),
            Transform3d::IDENTITY
        );
    }

    #[test]
    fn vrml_composition_scales_about_center() {
        let m = Transform3d::from_vrml(
            Vec3f::ZERO,
            Vec3f::new(1.0, 0.0, 0.0),
            Rotation::IDENTITY,
            Vec3f::new(2.0, 2.0, 2.0),
            Rotation::IDENTITY,
        );
        // The center is a fixed point of the scale.
        assert!(approx(m.transform_point(Vec3f::new(1.0, 0.0, 0.0)), Vec3f::new(1.0, 0.0, 0.0)));
        assert!(approx(m.transform_point(Vec3f::new(2.0, 0.0, 0.0)), Vec3f::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn max_axis_scale_is_conservative() {
        let s = Transform3d::from_scale(1.0, 3.0, 2.0);
        assert_eq!(s.max_axis_scale(), 3.0);
        let rs = Transform3d::from_axis_angle(Vec3f::new(1.0, 1.0, 0.0), 0.7) * s;
        assert!((rs.max_axis_scale() - 3.0).abs() < 1e-9, "rotation preserves column lengths");
    }

    #[test]
    fn mul_applies_rhs_first() {
        let t = Transform3d::from_translation(5.0, 0.0, 0.0);
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let p = (t * s).transform_point(Vec3f::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3f::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn finite_check() {
        assert!(Transform3d::IDENTITY.is_finite(), "identity is finite");
        assert!(
            !Transform3d::from_translation(f64::NAN, 0.0, 0.0).is_finite(),
            "NaN is not finite"
        );
    }
}
