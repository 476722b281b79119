use crate::level;
use crate::profiling::UpdateProfiler;
use anyhow::Result;
use sonoprobe_core::math::Vec3;
use sonoprobe_core::params::{ParameterStore, ParameterTarget};
use sonoprobe_core::{
    ActivityFlag, ActivityGate, ChannelParameterSink, InstanceId, OcclusionScannerDesc,
    RoomScannerDesc, SonoProbeWorld, SonoProbeWorldDesc, SourceId,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const FRAME_RATE: f32 = 60.0;
const WALK_SPEED: f32 = 1.4;

const RADIO_INSTANCE: InstanceId = InstanceId(1);
const FOUNTAIN_INSTANCE: InstanceId = InstanceId(2);

/// Walks the listener through the level, logging parameters twice a second.
pub fn run_walk() -> Result<()> {
    let scene = Arc::new(level::build());
    let desc = SonoProbeWorldDesc::default().with_occlusion(
        OcclusionScannerDesc::default()
            .with_sample_count(8)
            .with_gate(ActivityGate::culling_at(30.0)),
    );
    log::debug!("World settings: {}", serde_json::to_string(&desc)?);
    let mut world = SonoProbeWorld::new(desc, scene)?;

    let radio_playing = ActivityFlag::new(true);
    let radio = world.add_source(RADIO_INSTANCE, level::RADIO, radio_playing.clone())?;
    let fountain = world.add_source(FOUNTAIN_INSTANCE, level::FOUNTAIN, ActivityFlag::new(true))?;
    world.enable_local_room_scan(fountain, RoomScannerDesc::default().with_sample_count(16))?;

    // The "audio thread" applies parameter changes as they arrive
    let (mut sink, receiver) = ChannelParameterSink::channel();
    let audio_thread = thread::Builder::new()
        .name("demo-audio".to_string())
        .spawn(move || {
            let mut store = ParameterStore::new();
            for command in receiver.iter() {
                log::trace!("{:?} {} = {:.3}", command.target, command.name, command.value);
                store.apply(&command);
            }
            store
        })?;

    let dt = 1.0 / FRAME_RATE;
    let frames = (level::path_length() / WALK_SPEED * FRAME_RATE).ceil() as usize;
    let mut profiler = UpdateProfiler::new(600);
    log::info!("Walking {:.1} m over {} frames", level::path_length(), frames);

    for frame in 0..=frames {
        let position = level::position_along(frame as f32 * dt * WALK_SPEED);
        world.set_listener_position(position);

        // The radio is switched off halfway through
        if frame == frames / 2 {
            log::info!("Radio stopped");
            radio_playing.set_playing(false);
        }

        let started = Instant::now();
        let report = world.update(dt, &mut sink);
        profiler.record(started.elapsed(), report);

        if frame % (FRAME_RATE as usize / 2) == 0 {
            log_frame(&world, frame as f32 * dt, position, radio)?;
        }
    }

    world.remove_source(radio)?;
    drop(sink);
    let store = audio_thread
        .join()
        .map_err(|_| anyhow::anyhow!("audio thread panicked"))?;

    profiler.log_summary(Duration::from_secs_f32(dt));
    log_final_parameters(&store);
    Ok(())
}

/// Many sources spread over the level, to see what a frame costs.
pub fn run_stress(source_count: usize) -> Result<()> {
    let scene = Arc::new(level::build());
    let desc = SonoProbeWorldDesc::default().with_max_sources(source_count.max(1));
    let mut world = SonoProbeWorld::new(desc, scene)?;
    let mut flags = Vec::with_capacity(source_count);

    for i in 0..source_count {
        let angle = i as f32 * 2.399_963;
        let radius = 2.0 + (i % 12) as f32 * 1.5;
        let position = Vec3::new(radius * angle.cos(), -1.0, radius * angle.sin() - 4.0);
        // Every third source is silent and should cost nothing
        let flag = ActivityFlag::with_max_distance(i % 3 != 0, 25.0);
        world.add_source(InstanceId(100 + i as u64), position, flag.clone())?;
        flags.push(flag);
    }

    let mut sink = ParameterStore::new();
    let dt = 1.0 / FRAME_RATE;
    let mut profiler = UpdateProfiler::new(1200);
    for frame in 0..(FRAME_RATE as usize * 10) {
        let t = frame as f32 * dt;
        world.set_listener_position(Vec3::new(
            4.0 * (t * 0.3).sin(),
            0.0,
            -4.0 + 8.0 * (t * 0.2).cos(),
        ));
        let started = Instant::now();
        let report = world.update(dt, &mut sink);
        profiler.record(started.elapsed(), report);
    }

    let silent = flags.iter().filter(|f| !f.is_playing()).count();
    log::info!("{} sources ({} silent), {} parameters written", source_count, silent, sink.writes());
    profiler.log_summary(Duration::from_secs_f32(dt));
    Ok(())
}

fn log_frame(
    world: &SonoProbeWorld,
    time: f32,
    position: Vec3,
    radio: SourceId,
) -> Result<()> {
    let room = world
        .room_estimate()
        .map(|r| format!("enclosure {:.2}, size {:.1} m", r.enclosure_factor, r.room_size))
        .unwrap_or_else(|| "no scan yet".to_string());
    log::info!("t={:5.2}s listener ({:5.1}, {:5.1}) | {}", time, position.x, position.z, room);

    for id in world.source_ids() {
        let label = if id == radio { "radio" } else { "fountain" };
        match world.occlusion_estimate(id)? {
            Some(o) => log::info!(
                "    {:8} occlusion {:.2}, diffraction {:.2}",
                label,
                o.occlusion_ratio,
                o.diffraction_amount
            ),
            None => log::info!("    {:8} idle", label),
        }
    }
    Ok(())
}

fn log_final_parameters(store: &ParameterStore) {
    log::info!("=== Final parameters ({} writes) ===", store.writes());
    let lines = [
        ("global", ParameterTarget::Global, "enclosure"),
        ("global", ParameterTarget::Global, "room_size"),
        ("radio", ParameterTarget::Instance(RADIO_INSTANCE), "occlusion"),
        ("fountain", ParameterTarget::Instance(FOUNTAIN_INSTANCE), "occlusion"),
        ("fountain", ParameterTarget::Instance(FOUNTAIN_INSTANCE), "lowpass_cutoff"),
        ("fountain", ParameterTarget::Instance(FOUNTAIN_INSTANCE), "enclosure"),
    ];
    for (owner, target, name) in lines {
        match store.get(target, name) {
            Some(value) => log::info!("{:8} {:15} {:.3}", owner, name, value),
            None => log::info!("{:8} {:15} -", owner, name),
        }
    }
}
