//! End-to-end scenarios on box scenes.

use sonoprobe_core::error::{Result, SonoProbeError};
use sonoprobe_core::gate::{ActivityGate, AlwaysAudible};
use sonoprobe_core::math::Vec3;
use sonoprobe_core::params::{ChannelParameterSink, InstanceId, ParameterStore};
use sonoprobe_core::scanner::{
    OcclusionScanner, RoomScanMode, RoomScanner, ScanContext, ScannerStatus,
};
use sonoprobe_core::scene::{Aabb, AabbScene, Face, LayerMask, RayHit, RayTracer};
use sonoprobe_core::{
    ActivityFlag, GateDecision, OcclusionScannerDesc, RoomScannerDesc, SonoProbeWorld,
    SonoProbeWorldDesc, TickOutcome,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const FRAME: f32 = 1.0 / 60.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counts queries and can be switched offline
struct ProbeCounter<T> {
    inner: T,
    queries: AtomicUsize,
    offline: AtomicBool,
}

impl<T: RayTracer> ProbeCounter<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }
}

impl<T: RayTracer> RayTracer for ProbeCounter<T> {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Result<Option<RayHit>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            return Err(SonoProbeError::QueryUnavailable("physics world locked".into()));
        }
        self.inner.cast_ray(origin, direction, max_distance, layers)
    }
}

/// 10 x 10 x 10 room centered on the origin, with the listed walls missing
fn room(open: &[Face]) -> AabbScene {
    let mut scene = AabbScene::new();
    scene.add_room(Vec3::ZERO, Vec3::splat(5.0), 0.5, open);
    scene
}

/// Room whose -Z wall has a 2 m wide, full-height doorway
fn room_with_doorway() -> AabbScene {
    let mut scene = room(&[Face::NegZ]);
    scene.add_box(Aabb::new(Vec3::new(-5.5, -5.5, -5.5), Vec3::new(-1.0, 5.5, -5.0)));
    scene.add_box(Aabb::new(Vec3::new(1.0, -5.5, -5.5), Vec3::new(5.5, 5.5, -5.0)));
    scene
}

/// Full-height wall across the z axis between z = 4.9 and z = 5.1
fn dividing_wall() -> AabbScene {
    let mut scene = AabbScene::new();
    scene.add_box(Aabb::new(Vec3::new(-50.0, -50.0, 4.9), Vec3::new(50.0, 50.0, 5.1)));
    scene
}

#[test]
fn room_with_one_wall_removed() {
    init_logger();
    let scene = room(&[Face::NegZ]);
    let mut scanner = RoomScanner::new(RoomScannerDesc::default(), RoomScanMode::Global);
    let mut params = ParameterStore::new();

    let ctx = ScanContext::new(Vec3::ZERO, Vec3::ZERO, &AlwaysAudible, &scene);
    assert_eq!(scanner.tick(FRAME, &ctx, &mut params), TickOutcome::Scanned { queries: 32 });

    let estimate = scanner.estimate().unwrap();
    assert!(
        (0.85..=0.95).contains(&estimate.enclosure_factor),
        "enclosure {}",
        estimate.enclosure_factor
    );
    assert!(
        (5.0..=10.0).contains(&estimate.room_size),
        "room size {}",
        estimate.room_size
    );

    let raw = scanner.last_raw().unwrap();
    assert_eq!(raw.samples, 32);
    assert_eq!(raw.hits, 28);
}

#[test]
fn closed_room_is_fully_enclosed() {
    init_logger();
    let scene = room(&[]);
    let mut scanner = RoomScanner::new(RoomScannerDesc::default(), RoomScanMode::Global);
    let mut params = ParameterStore::new();
    scanner.tick(FRAME, &ScanContext::new(Vec3::ZERO, Vec3::ZERO, &AlwaysAudible, &scene), &mut params);

    let estimate = scanner.estimate().unwrap();
    assert_eq!(estimate.enclosure_factor, 1.0);
    assert!(estimate.room_size >= 5.0 && estimate.room_size <= 5.0 * 3f32.sqrt() + 1e-3);
}

#[test]
fn source_behind_full_wall_is_fully_occluded() {
    init_logger();
    let scene = dividing_wall();
    let desc = OcclusionScannerDesc::default().with_sample_count(8);
    let mut scanner = OcclusionScanner::new(desc, InstanceId(1));
    let mut params = ParameterStore::new();

    let listener = Vec3::new(0.0, 1.7, 10.0);
    let ctx = ScanContext::new(listener, Vec3::new(0.0, 1.0, 0.0), &AlwaysAudible, &scene);
    assert_eq!(scanner.tick(FRAME, &ctx, &mut params), TickOutcome::Scanned { queries: 9 });

    let raw = scanner.last_raw().unwrap();
    assert!(raw.center_blocked);
    assert_eq!(raw.blocked, 8);
    assert_eq!(scanner.estimate().unwrap().occlusion_ratio, 1.0);
    assert_eq!(params.instance(InstanceId(1), "occlusion"), Some(1.0));
}

#[test]
fn near_field_wall_beside_listener_is_ignored() {
    init_logger();
    let mut scene = AabbScene::new();
    scene.add_box(Aabb::new(Vec3::new(0.03, -1.0, 0.38), Vec3::new(0.2, 1.0, 0.6)));
    let listener = Vec3::new(0.0, 0.0, 0.5);
    let ctx = ScanContext::new(listener, Vec3::ZERO, &AlwaysAudible, &scene);
    let mut params = ParameterStore::new();

    let mut corrected = OcclusionScanner::new(OcclusionScannerDesc::default(), InstanceId(1));
    corrected.tick(FRAME, &ctx, &mut params);
    assert_eq!(corrected.estimate().unwrap().occlusion_ratio, 0.0);
    assert!(corrected.last_raw().unwrap().near_field_ignored > 0);

    let mut uncorrected = OcclusionScanner::new(
        OcclusionScannerDesc::default().with_near_field_threshold(0.0),
        InstanceId(2),
    );
    uncorrected.tick(FRAME, &ctx, &mut params);
    let ratio = uncorrected.estimate().unwrap().occlusion_ratio;
    assert!(ratio > 0.0 && ratio < 1.0, "ratio {}", ratio);
}

#[test]
fn culled_source_issues_no_queries() {
    init_logger();
    let tracer = Arc::new(ProbeCounter::new(dividing_wall()));
    let desc = SonoProbeWorldDesc::default()
        .with_room(None)
        .with_occlusion(OcclusionScannerDesc::default().with_gate(ActivityGate::culling_at(10.0)));
    let mut world = SonoProbeWorld::new(desc, tracer.clone()).unwrap();
    let id = world
        .add_source(InstanceId(1), Vec3::new(0.0, 0.0, 15.0), ActivityFlag::new(true))
        .unwrap();

    let mut params = ParameterStore::new();
    for _ in 0..120 {
        let report = world.update(FRAME, &mut params);
        assert_eq!(report.skipped, 1);
    }
    assert_eq!(tracer.queries(), 0);
    assert!(params.is_empty());
    assert!(matches!(
        world.occlusion_scanner(id).unwrap().status(),
        ScannerStatus::Frozen(GateDecision::Culled { .. })
    ));

    // Walking into range resumes scanning straight away
    world.set_source_position(id, Vec3::new(0.0, 0.0, 9.0)).unwrap();
    let report = world.update(FRAME, &mut params);
    assert_eq!(report.scans, 1);
    assert_eq!(tracer.queries(), 7);
}

#[test]
fn source_max_distance_culls_without_override() {
    init_logger();
    let tracer = Arc::new(ProbeCounter::new(AabbScene::new()));
    let mut world = SonoProbeWorld::new(SonoProbeWorldDesc::default().with_room(None), tracer.clone()).unwrap();
    world
        .add_source(InstanceId(1), Vec3::new(30.0, 0.0, 0.0), ActivityFlag::with_max_distance(true, 25.0))
        .unwrap();

    let mut params = ParameterStore::new();
    world.update(FRAME, &mut params);
    assert_eq!(tracer.queries(), 0);
}

#[test]
fn inactive_source_issues_no_queries_at_any_distance() {
    init_logger();
    let tracer = Arc::new(ProbeCounter::new(dividing_wall()));
    let mut world = SonoProbeWorld::new(SonoProbeWorldDesc::default().with_room(None), tracer.clone()).unwrap();
    let flag = ActivityFlag::new(false);
    let mut ids = Vec::new();
    for (i, distance) in [0.0, 0.5, 3.0, 12.0, 400.0].into_iter().enumerate() {
        let id = world
            .add_source(InstanceId(i as u64), Vec3::new(0.0, 0.0, distance), flag.clone())
            .unwrap();
        world.enable_local_room_scan(id, RoomScannerDesc::default()).unwrap();
        ids.push(id);
    }

    let mut params = ParameterStore::new();
    for _ in 0..60 {
        world.update(FRAME, &mut params);
    }
    assert_eq!(tracer.queries(), 0);
    assert!(params.is_empty());
    for id in ids {
        assert!(world.occlusion_estimate(id).unwrap().is_none());
    }
}

#[test]
fn identical_inputs_give_identical_aggregates() {
    init_logger();
    let scene = room_with_doorway();
    let listener = Vec3::new(1.0, 0.5, -2.0);
    let emitter = Vec3::new(-2.0, 0.0, -8.0);
    let ctx = ScanContext::new(listener, emitter, &AlwaysAudible, &scene);
    let mut params = ParameterStore::new();

    let mut room_scanner = RoomScanner::new(RoomScannerDesc::default(), RoomScanMode::Global);
    let mut occlusion = OcclusionScanner::new(OcclusionScannerDesc::default(), InstanceId(1));

    room_scanner.tick(0.0, &ctx, &mut params);
    occlusion.tick(0.0, &ctx, &mut params);
    let first_room = *room_scanner.last_raw().unwrap();
    let first_occlusion = *occlusion.last_raw().unwrap();

    room_scanner.tick(1.0, &ctx, &mut params);
    occlusion.tick(1.0, &ctx, &mut params);
    assert_eq!(room_scanner.scans_completed(), 2);
    assert_eq!(occlusion.scans_completed(), 2);
    assert_eq!(*room_scanner.last_raw().unwrap(), first_room);
    assert_eq!(*occlusion.last_raw().unwrap(), first_occlusion);
}

#[test]
fn probe_failure_keeps_estimate_and_retries() {
    init_logger();
    let tracer = ProbeCounter::new(dividing_wall());
    let ctx = ScanContext::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, &AlwaysAudible, &tracer);
    let mut scanner = OcclusionScanner::new(OcclusionScannerDesc::default(), InstanceId(1));
    let mut params = ParameterStore::new();

    assert!(scanner.tick(FRAME, &ctx, &mut params).did_scan());
    let before = scanner.estimate().unwrap();
    assert_eq!(before.occlusion_ratio, 1.0);

    tracer.set_offline(true);
    let mut failures = 0;
    for _ in 0..30 {
        if scanner.tick(FRAME, &ctx, &mut params) == TickOutcome::ProbeFailed {
            failures += 1;
        }
    }
    assert!(failures > 0);
    assert_eq!(scanner.estimate().unwrap(), before);
    assert_eq!(scanner.scans_completed(), 1);

    // The first tick after recovery scans without waiting another interval
    tracer.set_offline(false);
    assert!(scanner.tick(FRAME, &ctx, &mut params).did_scan());
    assert_eq!(scanner.scans_completed(), 2);
}

#[test]
fn misconfigured_scanners_are_disabled() {
    init_logger();
    let tracer = ProbeCounter::new(room(&[]));
    let ctx = ScanContext::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), &AlwaysAudible, &tracer);
    let mut params = ParameterStore::new();

    let mut scanners = vec![
        RoomScanner::new(RoomScannerDesc::default().with_sample_count(0), RoomScanMode::Global),
        RoomScanner::new(RoomScannerDesc::default().with_scan_interval(0.0), RoomScanMode::Global),
        RoomScanner::new(RoomScannerDesc::default().with_scan_interval(-1.0), RoomScanMode::Global),
    ];
    let mut occlusion = OcclusionScanner::new(
        OcclusionScannerDesc::default().with_sample_count(0),
        InstanceId(1),
    );

    for _ in 0..30 {
        for scanner in scanners.iter_mut() {
            assert_eq!(scanner.tick(FRAME, &ctx, &mut params), TickOutcome::Disabled);
        }
        assert_eq!(occlusion.tick(FRAME, &ctx, &mut params), TickOutcome::Disabled);
    }
    assert_eq!(tracer.queries(), 0);
    assert!(params.is_empty());
}

#[test]
fn colocated_source_is_unoccluded_without_queries() {
    init_logger();
    let tracer = ProbeCounter::new(room(&[]));
    let position = Vec3::new(1.0, -2.0, 0.5);
    let ctx = ScanContext::new(position, position, &AlwaysAudible, &tracer);
    let mut scanner = OcclusionScanner::new(OcclusionScannerDesc::default(), InstanceId(1));
    let mut params = ParameterStore::new();

    assert_eq!(scanner.tick(FRAME, &ctx, &mut params), TickOutcome::Scanned { queries: 0 });
    assert_eq!(scanner.estimate().unwrap().occlusion_ratio, 0.0);
    assert_eq!(tracer.queries(), 0);
}

#[test]
fn enclosure_converges_without_overshoot() {
    init_logger();
    let tracer = Arc::new(room(&[Face::NegZ]));
    let mut world = SonoProbeWorld::new(SonoProbeWorldDesc::default(), tracer).unwrap();
    let mut params = ParameterStore::new();

    // Far outside: open field
    world.set_listener_position(Vec3::new(0.0, 0.0, 100.0));
    world.update(FRAME, &mut params);
    assert_eq!(world.room_estimate().unwrap().enclosure_factor, 0.0);

    world.set_listener_position(Vec3::ZERO);
    let mut previous = 0.0;
    for _ in 0..180 {
        world.update(FRAME, &mut params);
        let enclosure = world.room_estimate().unwrap().enclosure_factor;
        assert!(enclosure >= previous, "{} after {}", enclosure, previous);
        assert!(enclosure <= 0.875 + 1e-6, "overshoot {}", enclosure);
        previous = enclosure;
    }
    assert!((previous - 0.875).abs() < 1e-3, "enclosure {}", previous);
}

#[test]
fn walk_through_doorway_keeps_parameters_in_range() {
    init_logger();
    let tracer = Arc::new(ProbeCounter::new(room_with_doorway()));
    let mut world = SonoProbeWorld::new(SonoProbeWorldDesc::default(), tracer.clone()).unwrap();
    let (mut sink, receiver) = ChannelParameterSink::channel();

    let inside = world
        .add_source(InstanceId(1), Vec3::new(3.0, 0.0, 3.0), ActivityFlag::new(true))
        .unwrap();
    let outside = world
        .add_source(InstanceId(2), Vec3::new(-3.0, 0.0, -12.0), ActivityFlag::new(true))
        .unwrap();
    world.enable_local_room_scan(outside, RoomScannerDesc::default()).unwrap();

    let mut params = ParameterStore::new();
    let mut total = 0;
    // Walk from the middle of the room out through the doorway, 4 seconds
    for frame in 0..240 {
        let z = -(frame as f32) * 0.05;
        world.set_listener_position(Vec3::new(0.0, 0.0, z));
        let report = world.update(FRAME, &mut sink);
        total += report.queries;

        for command in receiver.try_iter() {
            params.apply(&command);
        }

        if let Some(room) = world.room_estimate() {
            assert!((0.0..=1.0).contains(&room.enclosure_factor));
            assert!((0.0..=20.0).contains(&room.room_size));
        }
        for id in [inside, outside] {
            if let Some(occlusion) = world.occlusion_estimate(id).unwrap() {
                assert!((0.0..=1.0).contains(&occlusion.occlusion_ratio));
                assert!(occlusion.diffraction_amount >= 0.0);
            }
        }
    }

    assert_eq!(total, tracer.queries());
    let enclosure = params.global("enclosure").unwrap();
    let room_size = params.global("room_size").unwrap();
    assert!((0.0..=1.0).contains(&enclosure));
    assert!((0.0..=1.0).contains(&room_size));
    let cutoff = params.instance(InstanceId(2), "lowpass_cutoff").unwrap();
    assert!((800.0..=22_000.0).contains(&cutoff));
    assert!(params.instance(InstanceId(2), "enclosure").is_some());

    // Outside in the open the listener is far less enclosed than in the room
    assert!(world.room_estimate().unwrap().enclosure_factor < 0.8);
}
