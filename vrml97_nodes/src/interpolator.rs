// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear interpolators: `PositionInterpolator`, `ScalarInterpolator`,
//! `ColorInterpolator`.
//!
//! `set_fraction` picks the key segment containing the fraction and emits
//! `value_changed`, linearly interpolated between the segment's key values.
//! Fractions outside the keys clamp to the first or last key value.

use vrml97_core::Error;
use vrml97_core::field::{Color, FieldType, FieldValue, Vec3f};
use vrml97_core::node::NodeContext;
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};

/// Piecewise-linear lookup of `fraction` in `key`/`values`.
///
/// `None` when there are no keys. Extra keys or values beyond the shorter
/// of the two are ignored.
pub fn interpolate<T: Copy>(
    key: &[f32],
    values: &[T],
    fraction: f32,
    lerp: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    let n = key.len().min(values.len());
    if n == 0 {
        return None;
    }
    let last = n - 1;
    if fraction < key[0] {
        return Some(values[0]);
    }
    if fraction > key[last] {
        return Some(values[last]);
    }
    for i in 0..last {
        if key[i] <= fraction && fraction <= key[i + 1] {
            let span = key[i + 1] - key[i];
            if span <= 0.0 {
                return Some(values[i + 1]);
            }
            return Some(lerp(values[i], values[i + 1], (fraction - key[i]) / span));
        }
    }
    Some(values[last])
}

/// Shared `set_fraction` handler: reads `key` and `keyValue`, emits
/// `value_changed`.
fn set_fraction(ctx: &mut NodeContext<'_>, value: &FieldValue, timestamp: f64) -> Result<(), Error> {
    let &FieldValue::SfFloat(fraction) = value else {
        return Ok(());
    };
    let view = ctx.view();
    let key = view.floats("key").unwrap_or_default();
    let out = match view.field("keyValue") {
        Some(FieldValue::MfVec3f(values)) => {
            interpolate(key, values, fraction, Vec3f::lerp).map(FieldValue::SfVec3f)
        }
        Some(FieldValue::MfFloat(values)) => {
            interpolate(key, values, fraction, |a, b, t| a + (b - a) * t).map(FieldValue::SfFloat)
        }
        Some(FieldValue::MfColor(values)) => {
            interpolate(key, values, fraction, Color::lerp).map(FieldValue::SfColor)
        }
        _ => None,
    };
    match out {
        Some(out) => ctx.emit("value_changed", out, timestamp),
        None => Ok(()),
    }
}

static POSITION_INTERPOLATOR_INTERFACES: [InterfaceDecl; 4] = [
    InterfaceDecl::event_in(FieldType::SfFloat, "set_fraction", set_fraction),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "key"),
    InterfaceDecl::exposed_field(FieldType::MfVec3f, "keyValue"),
    InterfaceDecl::event_out(FieldType::SfVec3f, "value_changed"),
];

/// `PositionInterpolator`
pub static POSITION_INTERPOLATOR: ClassDecl = ClassDecl::new(&POSITION_INTERPOLATOR_INTERFACES);

static SCALAR_INTERPOLATOR_INTERFACES: [InterfaceDecl; 4] = [
    InterfaceDecl::event_in(FieldType::SfFloat, "set_fraction", set_fraction),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "key"),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "keyValue"),
    InterfaceDecl::event_out(FieldType::SfFloat, "value_changed"),
];

/// `ScalarInterpolator`
pub static SCALAR_INTERPOLATOR: ClassDecl = ClassDecl::new(&SCALAR_INTERPOLATOR_INTERFACES);

static COLOR_INTERPOLATOR_INTERFACES: [InterfaceDecl; 4] = [
    InterfaceDecl::event_in(FieldType::SfFloat, "set_fraction", set_fraction),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "key"),
    InterfaceDecl::exposed_field(FieldType::MfColor, "keyValue"),
    InterfaceDecl::event_out(FieldType::SfColor, "value_changed"),
];

/// `ColorInterpolator`
pub static COLOR_INTERPOLATOR: ClassDecl = ClassDecl::new(&COLOR_INTERPOLATOR_INTERFACES);

#[cfg(test)]
mod tests {
    use vrml97_core::field::{Color, FieldValue, Vec3f};

    use super::interpolate;
    use crate::testing::{probed, scene, take_seen};

    fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    #[test]
    fn clamps_outside_the_keys() {
        let key = [0.25, 0.75];
        let values = [10.0, 20.0];
        assert_eq!(interpolate(&key, &values, 0.0, lerp), Some(10.0));
        assert_eq!(interpolate(&key, &values, 1.0, lerp), Some(20.0));
        assert_eq!(interpolate(&key, &values, 0.5, lerp), Some(15.0));
    }

    #[test]
    fn picks_the_containing_segment() {
        let key = [0.0, 0.5, 1.0];
        let values = [0.0, 10.0, 0.0];
        assert_eq!(interpolate(&key, &values, 0.75, lerp), Some(5.0));
        assert_eq!(interpolate(&key, &values, 0.5, lerp), Some(10.0));
    }

    #[test]
    fn repeated_key_steps() {
        let key = [0.0, 0.5, 0.5, 1.0];
        let values = [0.0, 1.0, 5.0, 5.0];
        assert_eq!(interpolate(&key, &values, 0.5, lerp), Some(1.0), "first segment wins");
        assert_eq!(interpolate(&key, &values, 0.75, lerp), Some(5.0));
    }

    #[test]
    fn no_keys_no_value() {
        assert_eq!(interpolate(&[], &[1.0_f32], 0.5, lerp), None);
        assert_eq!(interpolate(&[0.0], &[] as &[f32], 0.5, lerp), None);
    }

    #[test]
    fn position_interpolator_emits_value_changed() {
        let mut scene = scene();
        let interp = scene
            .create_default_node(
                "PositionInterpolator",
                None,
                &[
                    ("key", FieldValue::MfFloat(vec![0.0, 1.0])),
                    (
                        "keyValue",
                        FieldValue::MfVec3f(vec![Vec3f::ZERO, Vec3f::new(4.0, 0.0, -2.0)]),
                    ),
                ],
            )
            .unwrap();
        let _recorder = probed(&mut scene, interp, &[("value_changed", "vec3f")]);
        scene
            .process_event(interp, "set_fraction", FieldValue::SfFloat(0.5), 1.0)
            .unwrap();
        assert_eq!(
            take_seen(),
            vec![("vec3f".into(), FieldValue::SfVec3f(Vec3f::new(2.0, 0.0, -1.0)))],
        );
        assert_eq!(
            scene.field(interp, "value_changed").unwrap(),
            &FieldValue::SfVec3f(Vec3f::new(2.0, 0.0, -1.0)),
        );
    }

    #[test]
    fn color_interpolator_driven_by_a_time_sensor() {
        let mut scene = scene();
        let ts = scene.create_default_node("TimeSensor", None, &[]).unwrap();
        let interp = scene
            .create_default_node(
                "ColorInterpolator",
                None,
                &[
                    ("key", FieldValue::MfFloat(vec![0.0, 1.0])),
                    ("keyValue", FieldValue::MfColor(vec![Color::BLACK, Color::WHITE])),
                ],
            )
            .unwrap();
        scene.add_root(ts).unwrap();
        scene.initialize(0.0);
        assert!(scene.add_route(ts, "fraction_changed", interp, "set_fraction").unwrap());
        let _recorder = probed(&mut scene, interp, &[("value_changed", "color")]);

        scene.tick(0.5);
        assert_eq!(take_seen(), vec![("color".into(), FieldValue::SfColor(Color::new(0.5, 0.5, 0.5)))]);
    }
}
