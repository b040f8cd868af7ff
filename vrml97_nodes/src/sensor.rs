// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sensors: `TimeSensor`, `TouchSensor`, and `VisibilitySensor`.

use vrml97_core::bounds::BoundingSphere;
use vrml97_core::field::{FieldType, FieldValue, Vec3f};
use vrml97_core::node::capability::{
    Capabilities, PointerEvent, PointingDeviceSensorNode, TimeDependentNode,
};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeContext, NodeId};
use vrml97_core::render::Renderer;
use vrml97_core::viewer::Intersection;

/// Emits `value` from `event_out` if the node's type exposes it.
fn emit(ctx: &mut NodeContext<'_>, event_out: &str, value: FieldValue, timestamp: f64) {
    if !ctx.view().node_type().has_interface(event_out) {
        return;
    }
    // Only allocation failure is left; the cascade drops the event.
    _ = ctx.emit(event_out, value, timestamp);
}

// -- TimeSensor --

static TIME_SENSOR_INTERFACES: [InterfaceDecl; 9] = [
    InterfaceDecl::exposed_field(FieldType::SfTime, "cycleInterval")
        .with_default(|| FieldValue::SfTime(1.0)),
    InterfaceDecl::exposed_field(FieldType::SfBool, "enabled")
        .with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::exposed_field(FieldType::SfBool, "loop"),
    InterfaceDecl::exposed_field(FieldType::SfTime, "startTime"),
    InterfaceDecl::exposed_field(FieldType::SfTime, "stopTime"),
    InterfaceDecl::event_out(FieldType::SfTime, "cycleTime"),
    InterfaceDecl::event_out(FieldType::SfFloat, "fraction_changed"),
    InterfaceDecl::event_out(FieldType::SfBool, "isActive"),
    InterfaceDecl::event_out(FieldType::SfTime, "time"),
];

/// `TimeSensor`
///
/// Updated every tick. While active it emits `fraction_changed` and `time`;
/// it emits `cycleTime` when it activates and at every cycle boundary, and
/// `isActive` on each transition.
pub static TIME_SENSOR: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        time_dependent: Some(TimeDependentNode {
            update: update_time_sensor,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&TIME_SENSOR_INTERFACES)
};

/// The interval latched at activation and the index of the cycle last
/// reported.
#[derive(Clone, Copy, Debug)]
struct Running {
    interval: f64,
    cycle: f64,
}

#[derive(Clone, Copy, Debug)]
struct TimeSensorParams {
    cycle_interval: f64,
    enabled: bool,
    looping: bool,
    start_time: f64,
    stop_time: f64,
    active: bool,
}

impl TimeSensorParams {
    fn read(ctx: &NodeContext<'_>) -> Self {
        let view = ctx.view();
        Self {
            cycle_interval: view.time("cycleInterval").unwrap_or(1.0),
            enabled: view.bool("enabled").unwrap_or(true),
            looping: view.bool("loop").unwrap_or(false),
            start_time: view.time("startTime").unwrap_or(0.0),
            stop_time: view.time("stopTime").unwrap_or(0.0),
            active: view.bool("isActive").unwrap_or(false),
        }
    }
}

/// Fraction of the current cycle; the end of a cycle reports 1, not 0.
#[expect(
    clippy::cast_possible_truncation,
    reason = "SFFloat fraction of an SFTime ratio"
)]
fn fraction(elapsed: f64, interval: f64) -> f32 {
    let f = (elapsed / interval).fract();
    if f == 0.0 && elapsed > 0.0 {
        1.0
    } else {
        f as f32
    }
}

/// A non-positive `cycleInterval` keeps an inactive sensor from starting;
/// an active one runs on the interval it started with.
fn update_time_sensor(ctx: &mut NodeContext<'_>, now: f64) {
    let p = TimeSensorParams::read(ctx);
    let running = ctx.state::<Running>().copied().filter(|_| p.active);
    let interval = running.map_or(p.cycle_interval, |r| r.interval);
    if interval <= 0.0 {
        return;
    }
    if !p.enabled {
        if p.active {
            emit(ctx, "isActive", FieldValue::SfBool(false), now);
        }
        return;
    }

    let elapsed = now - p.start_time;
    let stopped = p.stop_time > p.start_time && now >= p.stop_time;
    let finished = !p.looping && elapsed >= interval;
    if now < p.start_time || stopped || finished {
        if p.active {
            let last = if finished && !stopped {
                1.0
            } else {
                fraction(elapsed, interval)
            };
            emit(ctx, "fraction_changed", FieldValue::SfFloat(last), now);
            emit(ctx, "time", FieldValue::SfTime(now), now);
            emit(ctx, "isActive", FieldValue::SfBool(false), now);
        }
        return;
    }

    let cycle = (elapsed / interval).floor();
    if !p.active {
        emit(ctx, "isActive", FieldValue::SfBool(true), now);
        emit(ctx, "cycleTime", FieldValue::SfTime(now), now);
    } else if running.is_some_and(|r| r.cycle != cycle) {
        emit(ctx, "cycleTime", FieldValue::SfTime(now), now);
    }
    ctx.set_state(Running { interval, cycle });
    emit(ctx, "fraction_changed", FieldValue::SfFloat(fraction(elapsed, interval)), now);
    emit(ctx, "time", FieldValue::SfTime(now), now);
}

// -- TouchSensor --

static TOUCH_SENSOR_INTERFACES: [InterfaceDecl; 7] = [
    InterfaceDecl::exposed_field(FieldType::SfBool, "enabled")
        .with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::event_out(FieldType::SfVec3f, "hitNormal_changed"),
    InterfaceDecl::event_out(FieldType::SfVec3f, "hitPoint_changed"),
    InterfaceDecl::event_out(FieldType::SfVec2f, "hitTexCoord_changed"),
    InterfaceDecl::event_out(FieldType::SfBool, "isActive"),
    InterfaceDecl::event_out(FieldType::SfBool, "isOver"),
    InterfaceDecl::event_out(FieldType::SfTime, "touchTime"),
];

/// `TouchSensor`
///
/// Reacts to pointer input over the geometry of its siblings. Releasing the
/// button while still over the geometry emits `touchTime`.
pub static TOUCH_SENSOR: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        pointing_device_sensor: Some(PointingDeviceSensorNode {
            activate: activate_touch_sensor,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&TOUCH_SENSOR_INTERFACES)
};

fn activate_touch_sensor(ctx: &mut NodeContext<'_>, event: &PointerEvent) {
    let view = ctx.view();
    if !view.bool("enabled").unwrap_or(true) {
        return;
    }
    let was_over = view.bool("isOver").unwrap_or(false);
    let was_active = view.bool("isActive").unwrap_or(false);
    let t = event.timestamp;

    if event.over != was_over {
        emit(ctx, "isOver", FieldValue::SfBool(event.over), t);
    }
    if event.over {
        emit(ctx, "hitPoint_changed", FieldValue::SfVec3f(event.point), t);
    }
    if event.active != was_active {
        emit(ctx, "isActive", FieldValue::SfBool(event.active), t);
        if was_active && event.over {
            emit(ctx, "touchTime", FieldValue::SfTime(t), t);
        }
    }
}

// -- VisibilitySensor --

static VISIBILITY_SENSOR_INTERFACES: [InterfaceDecl; 6] = [
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "center"),
    InterfaceDecl::exposed_field(FieldType::SfBool, "enabled")
        .with_default(|| FieldValue::SfBool(true))
        .with_side_effect(visibility_enabled_changed),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "size"),
    InterfaceDecl::event_out(FieldType::SfTime, "enterTime"),
    InterfaceDecl::event_out(FieldType::SfTime, "exitTime"),
    InterfaceDecl::event_out(FieldType::SfBool, "isActive"),
];

/// `VisibilitySensor { center 0 0 0 enabled TRUE size 0 0 0 }`
///
/// Tested while drawing: the sphere enclosing the box is intersected with
/// the view volume under the accumulated transform. Becoming visible emits
/// `isActive TRUE` and `enterTime`; leaving the view emits `isActive FALSE`
/// and `exitTime`. A sensor inside a culled group keeps its state until the
/// group is drawn again.
pub static VISIBILITY_SENSOR: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        ..Capabilities::NONE
    },
    render: Some(render_visibility_sensor),
    ..ClassDecl::new(&VISIBILITY_SENSOR_INTERFACES)
};

fn render_visibility_sensor(renderer: &mut Renderer<'_>, id: NodeId) {
    let view = renderer.scene().view(id);
    if !view.bool("enabled").unwrap_or(true) {
        return;
    }
    let center = view.vec3f("center").unwrap_or(Vec3f::ZERO);
    let size = view.vec3f("size").unwrap_or(Vec3f::ZERO);
    let was_visible = view.bool("isActive").unwrap_or(false);
    let now = renderer.scene().current_time();

    let sphere = BoundingSphere::new(center, size.length() * 0.5);
    let visible = renderer.viewer().intersect_view_volume(&sphere) != Intersection::Outside;
    let mut ctx = renderer.node_context(id);
    if visible != was_visible {
        let edge = if visible { "enterTime" } else { "exitTime" };
        emit(&mut ctx, "isActive", FieldValue::SfBool(visible), now);
        emit(&mut ctx, edge, FieldValue::SfTime(now), now);
    }
    // Keeps enclosing groups from being replayed by reference.
    ctx.set_modified(true);
}

fn visibility_enabled_changed(ctx: &mut NodeContext<'_>, value: &FieldValue, timestamp: f64) {
    let view = ctx.view();
    if *value == FieldValue::SfBool(false) && view.bool("isActive").unwrap_or(false) {
        emit(ctx, "isActive", FieldValue::SfBool(false), timestamp);
        emit(ctx, "exitTime", FieldValue::SfTime(timestamp), timestamp);
    }
}

#[cfg(test)]
mod tests {
    use vrml97_core::bounds::BoundingSphere;
    use vrml97_core::field::{FieldValue, Vec3f};
    use vrml97_core::node::capability::PointerEvent;

    use crate::testing::{
        BrowserCall, RecordingBrowser, RecordingViewer, notifications, probed, scene,
        take_seen as take,
    };

    #[test]
    fn time_sensor_runs_one_cycle() {
        let mut scene = scene();
        let log = RecordingBrowser::install(&mut scene);
        let ts = scene
            .create_default_node(
                "TimeSensor",
                None,
                &[
                    ("cycleInterval", FieldValue::SfTime(2.0)),
                    ("startTime", FieldValue::SfTime(1.0)),
                ],
            )
            .unwrap();
        scene.add_root(ts).unwrap();
        scene.initialize(0.0);
        let _recorder = probed(
            &mut scene,
            ts,
            &[("isActive", "bool"), ("fraction_changed", "float"), ("cycleTime", "cycle")],
        );

        let summary = scene.tick(0.5);
        assert_eq!(summary.time_dependents, 1, "sensor updated");
        assert!(take().is_empty(), "not started yet");

        scene.tick(1.5);
        assert_eq!(
            take(),
            vec![
                ("bool".into(), FieldValue::SfBool(true)),
                ("cycle".into(), FieldValue::SfTime(1.5)),
                ("float".into(), FieldValue::SfFloat(0.25)),
            ],
        );

        scene.tick(2.0);
        assert_eq!(take(), vec![("float".into(), FieldValue::SfFloat(0.5))]);

        scene.tick(3.5);
        assert_eq!(
            take(),
            vec![
                ("float".into(), FieldValue::SfFloat(1.0)),
                ("bool".into(), FieldValue::SfBool(false)),
            ],
            "cycle completed",
        );
        scene.tick(4.0);
        assert!(take().is_empty(), "stays inactive");
        assert_eq!(notifications(&log), vec![BrowserCall::AddTimeDependent(ts)]);
    }

    #[test]
    fn looping_time_sensor_reports_cycles() {
        let mut scene = scene();
        let ts = scene
            .create_default_node("TimeSensor", None, &[("loop", FieldValue::SfBool(true))])
            .unwrap();
        scene.add_root(ts).unwrap();
        scene.initialize(0.0);
        let _recorder = probed(&mut scene, ts, &[("cycleTime", "cycle")]);

        scene.tick(0.5);
        scene.tick(0.75);
        scene.tick(1.25);
        scene.tick(2.5);
        assert_eq!(
            take(),
            vec![
                ("cycle".into(), FieldValue::SfTime(0.5)),
                ("cycle".into(), FieldValue::SfTime(1.25)),
                ("cycle".into(), FieldValue::SfTime(2.5)),
            ],
        );
        assert_eq!(scene.field(ts, "isActive").unwrap(), &FieldValue::SfBool(true));
    }

    #[test]
    fn disabling_deactivates() {
        let mut scene = scene();
        let ts = scene
            .create_default_node("TimeSensor", None, &[("loop", FieldValue::SfBool(true))])
            .unwrap();
        scene.add_root(ts).unwrap();
        scene.initialize(0.0);
        scene.tick(0.5);
        scene.set_field(ts, "enabled", FieldValue::SfBool(false)).unwrap();
        scene.tick(0.6);
        assert_eq!(scene.field(ts, "isActive").unwrap(), &FieldValue::SfBool(false));
    }

    #[test]
    fn non_positive_intervals_are_ignored() {
        let mut scene = scene();
        let idle = scene
            .create_default_node("TimeSensor", None, &[("cycleInterval", FieldValue::SfTime(0.0))])
            .unwrap();
        let ts = scene.create_default_node("TimeSensor", None, &[]).unwrap();
        scene.add_root(idle).unwrap();
        scene.add_root(ts).unwrap();
        scene.initialize(0.0);
        let _recorder = probed(&mut scene, ts, &[("isActive", "bool"), ("fraction_changed", "float")]);

        scene.tick(0.25);
        assert_eq!(scene.field(idle, "isActive").unwrap(), &FieldValue::SfBool(false));
        assert_eq!(
            take(),
            vec![
                ("bool".into(), FieldValue::SfBool(true)),
                ("float".into(), FieldValue::SfFloat(0.25)),
            ],
        );

        scene
            .process_event(ts, "set_cycleInterval", FieldValue::SfTime(-1.0), 0.3)
            .unwrap();
        scene.tick(0.5);
        assert_eq!(take(), vec![("float".into(), FieldValue::SfFloat(0.5))], "old interval");

        scene.tick(1.5);
        assert_eq!(
            take(),
            vec![
                ("float".into(), FieldValue::SfFloat(1.0)),
                ("bool".into(), FieldValue::SfBool(false)),
            ],
            "cycle still ends",
        );
        scene.tick(2.0);
        assert!(take().is_empty(), "does not restart");
    }

    #[test]
    fn touch_sensor_click() {
        let mut scene = scene();
        let touch = scene.create_default_node("TouchSensor", None, &[]).unwrap();
        let group = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![touch]))])
            .unwrap();
        scene.add_root(group).unwrap();
        scene.initialize(0.0);
        let _recorder = probed(&mut scene, touch, &[("isActive", "bool"), ("touchTime", "time")]);

        let at = |over, active, timestamp| PointerEvent {
            over,
            active,
            point: Vec3f::new(0.0, 1.0, 0.0),
            timestamp,
        };
        assert_eq!(scene.pointer_event(group, &at(true, false, 1.0)), 1, "one sensor");
        assert_eq!(scene.field(touch, "isOver").unwrap(), &FieldValue::SfBool(true));
        scene.pointer_event(group, &at(true, true, 2.0));
        scene.pointer_event(group, &at(true, false, 3.0));
        assert_eq!(
            take(),
            vec![
                ("bool".into(), FieldValue::SfBool(true)),
                ("bool".into(), FieldValue::SfBool(false)),
                ("time".into(), FieldValue::SfTime(3.0)),
            ],
        );
        assert_eq!(
            scene.field(touch, "hitPoint_changed").unwrap(),
            &FieldValue::SfVec3f(Vec3f::new(0.0, 1.0, 0.0)),
        );
    }

    #[test]
    fn visibility_sensor_reports_entering_and_leaving_the_view() {
        let mut scene = scene();
        let vs = scene
            .create_default_node(
                "VisibilitySensor",
                None,
                &[
                    ("center", FieldValue::SfVec3f(Vec3f::new(0.0, 0.0, -5.0))),
                    ("size", FieldValue::SfVec3f(Vec3f::new(2.0, 2.0, 2.0))),
                ],
            )
            .unwrap();
        let group = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![vs]))])
            .unwrap();
        scene.add_root(group).unwrap();
        scene.initialize(0.0);
        let _recorder = probed(
            &mut scene,
            vs,
            &[("isActive", "bool"), ("enterTime", "time"), ("exitTime", "cycle")],
        );
        let mut viewer = RecordingViewer {
            view_volume: Some(BoundingSphere::new(Vec3f::ZERO, 10.0)),
            ..RecordingViewer::default()
        };

        scene.tick(1.0);
        scene.render(&mut viewer);
        assert_eq!(
            take(),
            vec![
                ("bool".into(), FieldValue::SfBool(true)),
                ("time".into(), FieldValue::SfTime(1.0)),
            ],
        );
        scene.tick(2.0);
        scene.render(&mut viewer);
        assert!(take().is_empty(), "still visible");

        viewer.view_volume = Some(BoundingSphere::new(Vec3f::new(0.0, 0.0, 20.0), 10.0));
        scene.tick(3.0);
        scene.render(&mut viewer);
        assert_eq!(
            take(),
            vec![
                ("bool".into(), FieldValue::SfBool(false)),
                ("cycle".into(), FieldValue::SfTime(3.0)),
            ],
            "left the view",
        );
    }

    #[test]
    fn disabling_a_visible_sensor_ends_it() {
        let mut scene = scene();
        let vs = scene.create_default_node("VisibilitySensor", None, &[]).unwrap();
        scene.add_root(vs).unwrap();
        scene.initialize(0.0);
        let mut viewer = RecordingViewer::default();
        scene.render(&mut viewer);
        assert_eq!(scene.field(vs, "isActive").unwrap(), &FieldValue::SfBool(true));
        assert!(scene.modified(vs), "tested again next frame");

        scene.set_field(vs, "enabled", FieldValue::SfBool(false)).unwrap();
        assert_eq!(scene.field(vs, "isActive").unwrap(), &FieldValue::SfBool(false));
        scene.render(&mut viewer);
        assert_eq!(scene.field(vs, "isActive").unwrap(), &FieldValue::SfBool(false), "disabled");
        assert!(!scene.modified(vs));
    }
}
