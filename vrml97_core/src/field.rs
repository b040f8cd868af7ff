// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field value types.
//!
//! Every interface of a node carries one [`FieldType`]. Values travel between
//! nodes as [`FieldValue`]s, a closed tagged union over the VRML97 single
//! (`SF*`) and multiple (`MF*`) value types. Values have plain `Clone` value
//! semantics; node references are [`NodeId`] handles, so cloning a value
//! never clones a node.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::node::NodeId;

/// A 2-component single-precision vector (`SFVec2f`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2f {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2f {
    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 3-component single-precision vector (`SFVec3f`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3f {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3f {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean length.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "length is computed in f64 and stored back as an SFFloat"
    )]
    pub fn length(self) -> f32 {
        let (x, y, z) = (f64::from(self.x), f64::from(self.y), f64::from(self.z));
        (x * x + y * y + z * z).sqrt() as f32
    }

    /// Returns the unit vector in the same direction, or `self` if the
    /// length is zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 { self } else { self * (1.0 / len) }
    }

    /// Linear interpolation between `self` and `rhs`.
    #[inline]
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f32) -> Self {
        self + (rhs - self) * t
    }
}

impl Add for Vec3f {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3f {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3f {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3f {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// An RGB color with components in `[0, 1]` (`SFColor`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

impl Color {
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    /// White.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Component-wise linear interpolation.
    #[inline]
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f32) -> Self {
        Self::new(
            self.r + (rhs.r - self.r) * t,
            self.g + (rhs.g - self.g) * t,
            self.b + (rhs.b - self.b) * t,
        )
    }
}

/// An axis-angle rotation (`SFRotation`), angle in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Rotation axis. Not required to be normalized.
    pub axis: Vec3f,
    /// Angle in radians.
    pub angle: f32,
}

impl Rotation {
    /// The null rotation about +Z.
    pub const IDENTITY: Self = Self::new(Vec3f::new(0.0, 0.0, 1.0), 0.0);

    /// Creates a rotation from an axis and an angle in radians.
    #[inline]
    #[must_use]
    pub const fn new(axis: Vec3f, angle: f32) -> Self {
        Self { axis, angle }
    }

    /// Returns the rotation about the same axis by the opposite angle.
    #[inline]
    #[must_use]
    pub fn inverse(self) -> Self {
        Self::new(self.axis, -self.angle)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An `SFImage`: `components` bytes per pixel, bottom row first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel, 1 to 4.
    pub components: u8,
    /// `width * height * components` bytes.
    pub pixels: Vec<u8>,
}

impl Image {
    /// Unpacks VRML's one integer per pixel, highest-order component first
    /// (`0xFF0000` is red in a 3-component image). Returns `None` if the
    /// component count is out of range or the pixel count does not match.
    #[must_use]
    pub fn from_packed(width: u32, height: u32, components: u8, packed: &[i32]) -> Option<Self> {
        if !(1..=4).contains(&components) {
            return None;
        }
        let count = usize::try_from(width).ok()?.checked_mul(usize::try_from(height).ok()?)?;
        if packed.len() != count {
            return None;
        }
        let mut pixels = Vec::with_capacity(count * usize::from(components));
        for &p in packed {
            for shift in (0..components).rev() {
                pixels.push(p.to_be_bytes()[usize::from(3 - shift)]);
            }
        }
        Some(Self {
            width,
            height,
            components,
            pixels,
        })
    }

    /// Whether the image has pixels and its buffer matches its dimensions.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(usize::from(self.components)));
        (1..=4).contains(&self.components) && expected.is_some_and(|n| n > 0 && n == self.pixels.len())
    }
}

/// The type tag of an interface or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// `SFBool`
    SfBool,
    /// `SFColor`
    SfColor,
    /// `SFFloat`
    SfFloat,
    /// `SFImage`
    SfImage,
    /// `SFInt32`
    SfInt32,
    /// `SFNode`
    SfNode,
    /// `SFRotation`
    SfRotation,
    /// `SFString`
    SfString,
    /// `SFTime`
    SfTime,
    /// `SFVec2f`
    SfVec2f,
    /// `SFVec3f`
    SfVec3f,
    /// `MFColor`
    MfColor,
    /// `MFFloat`
    MfFloat,
    /// `MFInt32`
    MfInt32,
    /// `MFNode`
    MfNode,
    /// `MFRotation`
    MfRotation,
    /// `MFString`
    MfString,
    /// `MFTime`
    MfTime,
    /// `MFVec2f`
    MfVec2f,
    /// `MFVec3f`
    MfVec3f,
}

impl FieldType {
    /// Returns the VRML97 default value for this type.
    #[must_use]
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::SfBool => FieldValue::SfBool(false),
            Self::SfColor => FieldValue::SfColor(Color::BLACK),
            Self::SfFloat => FieldValue::SfFloat(0.0),
            Self::SfImage => FieldValue::SfImage(Image::default()),
            Self::SfInt32 => FieldValue::SfInt32(0),
            Self::SfNode => FieldValue::SfNode(None),
            Self::SfRotation => FieldValue::SfRotation(Rotation::IDENTITY),
            Self::SfString => FieldValue::SfString(String::new()),
            Self::SfTime => FieldValue::SfTime(0.0),
            Self::SfVec2f => FieldValue::SfVec2f(Vec2f::default()),
            Self::SfVec3f => FieldValue::SfVec3f(Vec3f::ZERO),
            Self::MfColor => FieldValue::MfColor(Vec::new()),
            Self::MfFloat => FieldValue::MfFloat(Vec::new()),
            Self::MfInt32 => FieldValue::MfInt32(Vec::new()),
            Self::MfNode => FieldValue::MfNode(Vec::new()),
            Self::MfRotation => FieldValue::MfRotation(Vec::new()),
            Self::MfString => FieldValue::MfString(Vec::new()),
            Self::MfTime => FieldValue::MfTime(Vec::new()),
            Self::MfVec2f => FieldValue::MfVec2f(Vec::new()),
            Self::MfVec3f => FieldValue::MfVec3f(Vec::new()),
        }
    }

    /// Whether values of this type hold node references.
    #[inline]
    #[must_use]
    pub const fn is_node(self) -> bool {
        matches!(self, Self::SfNode | Self::MfNode)
    }

    /// The VRML97 spelling of the type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SfBool => "SFBool",
            Self::SfColor => "SFColor",
            Self::SfFloat => "SFFloat",
            Self::SfImage => "SFImage",
            Self::SfInt32 => "SFInt32",
            Self::SfNode => "SFNode",
            Self::SfRotation => "SFRotation",
            Self::SfString => "SFString",
            Self::SfTime => "SFTime",
            Self::SfVec2f => "SFVec2f",
            Self::SfVec3f => "SFVec3f",
            Self::MfColor => "MFColor",
            Self::MfFloat => "MFFloat",
            Self::MfInt32 => "MFInt32",
            Self::MfNode => "MFNode",
            Self::MfRotation => "MFRotation",
            Self::MfString => "MFString",
            Self::MfTime => "MFTime",
            Self::MfVec2f => "MFVec2f",
            Self::MfVec3f => "MFVec3f",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// `SFBool`
    SfBool(bool),
    /// `SFColor`
    SfColor(Color),
    /// `SFFloat`
    SfFloat(f32),
    /// `SFImage`
    SfImage(Image),
    /// `SFInt32`
    SfInt32(i32),
    /// `SFNode`; `None` is the VRML `NULL`.
    SfNode(Option<NodeId>),
    /// `SFRotation`
    SfRotation(Rotation),
    /// `SFString`
    SfString(String),
    /// `SFTime`
    SfTime(f64),
    /// `SFVec2f`
    SfVec2f(Vec2f),
    /// `SFVec3f`
    SfVec3f(Vec3f),
    /// `MFColor`
    MfColor(Vec<Color>),
    /// `MFFloat`
    MfFloat(Vec<f32>),
    /// `MFInt32`
    MfInt32(Vec<i32>),
    /// `MFNode`
    MfNode(Vec<NodeId>),
    /// `MFRotation`
    MfRotation(Vec<Rotation>),
    /// `MFString`
    MfString(Vec<String>),
    /// `MFTime`
    MfTime(Vec<f64>),
    /// `MFVec2f`
    MfVec2f(Vec<Vec2f>),
    /// `MFVec3f`
    MfVec3f(Vec<Vec3f>),
}

impl FieldValue {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::SfBool(_) => FieldType::SfBool,
            Self::SfColor(_) => FieldType::SfColor,
            Self::SfFloat(_) => FieldType::SfFloat,
            Self::SfImage(_) => FieldType::SfImage,
            Self::SfInt32(_) => FieldType::SfInt32,
            Self::SfNode(_) => FieldType::SfNode,
            Self::SfRotation(_) => FieldType::SfRotation,
            Self::SfString(_) => FieldType::SfString,
            Self::SfTime(_) => FieldType::SfTime,
            Self::SfVec2f(_) => FieldType::SfVec2f,
            Self::SfVec3f(_) => FieldType::SfVec3f,
            Self::MfColor(_) => FieldType::MfColor,
            Self::MfFloat(_) => FieldType::MfFloat,
            Self::MfInt32(_) => FieldType::MfInt32,
            Self::MfNode(_) => FieldType::MfNode,
            Self::MfRotation(_) => FieldType::MfRotation,
            Self::MfString(_) => FieldType::MfString,
            Self::MfTime(_) => FieldType::MfTime,
            Self::MfVec2f(_) => FieldType::MfVec2f,
            Self::MfVec3f(_) => FieldType::MfVec3f,
        }
    }

    /// Node handles referenced by this value, in order. Empty for non-node
    /// values and for a `NULL` `SFNode`.
    #[must_use]
    pub fn node_refs(&self) -> &[NodeId] {
        match self {
            Self::SfNode(node) => node.as_slice(),
            Self::MfNode(nodes) => nodes,
            _ => &[],
        }
    }

    // -- Typed accessors --

    /// `SFBool` payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::SfBool(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFFloat` payload.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::SfFloat(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFInt32` payload.
    #[must_use]
    pub const fn as_int32(&self) -> Option<i32> {
        match self {
            Self::SfInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFTime` payload.
    #[must_use]
    pub const fn as_time(&self) -> Option<f64> {
        match self {
            Self::SfTime(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFColor` payload.
    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::SfColor(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFVec2f` payload.
    #[must_use]
    pub const fn as_vec2f(&self) -> Option<Vec2f> {
        match self {
            Self::SfVec2f(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFVec3f` payload.
    #[must_use]
    pub const fn as_vec3f(&self) -> Option<Vec3f> {
        match self {
            Self::SfVec3f(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFRotation` payload.
    #[must_use]
    pub const fn as_rotation(&self) -> Option<Rotation> {
        match self {
            Self::SfRotation(v) => Some(*v),
            _ => None,
        }
    }

    /// `SFString` payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::SfString(v) => Some(v),
            _ => None,
        }
    }

    /// `SFImage` payload.
    #[must_use]
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Self::SfImage(v) => Some(v),
            _ => None,
        }
    }

    /// `SFNode` payload. The outer `Option` is `None` for non-`SFNode`
    /// values.
    #[must_use]
    pub const fn as_node(&self) -> Option<Option<NodeId>> {
        match self {
            Self::SfNode(v) => Some(*v),
            _ => None,
        }
    }

    /// `MFFloat` payload.
    #[must_use]
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            Self::MfFloat(v) => Some(v),
            _ => None,
        }
    }

    /// `MFColor` payload.
    #[must_use]
    pub fn as_colors(&self) -> Option<&[Color]> {
        match self {
            Self::MfColor(v) => Some(v),
            _ => None,
        }
    }

    /// `MFVec3f` payload.
    #[must_use]
    pub fn as_vec3fs(&self) -> Option<&[Vec3f]> {
        match self {
            Self::MfVec3f(v) => Some(v),
            _ => None,
        }
    }

    /// `MFString` payload.
    #[must_use]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::MfString(v) => Some(v),
            _ => None,
        }
    }
}
