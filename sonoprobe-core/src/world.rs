use crate::config::{OcclusionScannerDesc, RoomScannerDesc, SonoProbeWorldDesc};
use crate::error::{Result, SonoProbeError};
use crate::events::TickOutcome;
use crate::gate::{AlwaysAudible, AudioActivity};
use crate::math::Vec3;
use crate::params::{InstanceId, ParameterSink};
use crate::scanner::{
    OcclusionEstimate, OcclusionScanner, RoomEstimate, RoomScanMode, RoomScanner, ScanContext,
};
use crate::scene::RayTracer;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle of a source tracked by a [`SonoProbeWorld`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

/// Totals over every scanner ticked by one [`SonoProbeWorld::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Completed scans
    pub scans: usize,
    /// Ray queries issued
    pub queries: usize,
    /// Ticks refused by an activity gate
    pub skipped: usize,
    /// Scans discarded because the geometry backend failed
    pub failures: usize,
}

impl UpdateReport {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Scanned { queries } => {
                self.scans += 1;
                self.queries += queries;
            }
            TickOutcome::Skipped(_) => self.skipped += 1,
            TickOutcome::ProbeFailed => self.failures += 1,
            TickOutcome::Waiting | TickOutcome::Disabled => {}
        }
    }
}

struct SourceEntry {
    instance: InstanceId,
    position: Vec3,
    activity: Box<dyn AudioActivity + Send>,
    occlusion: OcclusionScanner,
    local_room: Option<RoomScanner>,
}

/// Owner of the listener, the listener-global room scanner and every
/// per-source scanner.
///
/// `SonoProbeWorld` is driven from the host's frame loop: move the listener
/// and sources, then call [`update`](Self::update) once per frame with the
/// frame time. Each scanner runs on its own schedule; most frames issue no
/// ray queries at all.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sonoprobe_core::math::Vec3;
/// use sonoprobe_core::params::{InstanceId, ParameterStore};
/// use sonoprobe_core::scene::{AabbScene, Face};
/// use sonoprobe_core::{ActivityFlag, SonoProbeWorld, SonoProbeWorldDesc};
///
/// let mut scene = AabbScene::new();
/// scene.add_room(Vec3::ZERO, Vec3::splat(5.0), 0.5, &[Face::NegZ]);
///
/// let mut world = SonoProbeWorld::new(SonoProbeWorldDesc::default(), Arc::new(scene)).unwrap();
/// world.set_listener_position(Vec3::new(0.0, 0.0, 1.0));
/// let radio = world
///     .add_source(InstanceId(1), Vec3::new(2.0, 0.0, -2.0), ActivityFlag::new(true))
///     .unwrap();
///
/// let mut params = ParameterStore::new();
/// let report = world.update(1.0 / 60.0, &mut params);
/// assert_eq!(report.scans, 2);
///
/// assert!(world.room_estimate().unwrap().enclosure_factor > 0.5);
/// assert_eq!(world.occlusion_estimate(radio).unwrap().unwrap().occlusion_ratio, 0.0);
/// assert!(params.global("enclosure").is_some());
/// ```
pub struct SonoProbeWorld {
    desc: SonoProbeWorldDesc,
    tracer: Arc<dyn RayTracer>,
    listener: Vec3,
    room: Option<RoomScanner>,
    sources: BTreeMap<SourceId, SourceEntry>,
    next_source_id: u64,
}

impl SonoProbeWorld {
    /// Creates a world probing `tracer`.
    ///
    /// # Errors
    ///
    /// Returns `SonoProbeError::Configuration` if `desc.max_sources` is zero.
    pub fn new(desc: SonoProbeWorldDesc, tracer: Arc<dyn RayTracer>) -> Result<Self> {
        if desc.max_sources == 0 {
            return Err(SonoProbeError::Configuration(
                "max_sources must be at least 1".to_string(),
            ));
        }

        let room = desc
            .room
            .clone()
            .map(|room_desc| RoomScanner::new(room_desc, RoomScanMode::Global));
        log::info!(
            "SonoProbe world created (room scan: {}, max sources: {})",
            room.is_some(),
            desc.max_sources
        );

        Ok(Self {
            desc,
            tracer,
            listener: Vec3::ZERO,
            room,
            sources: BTreeMap::new(),
            next_source_id: 1,
        })
    }

    pub fn desc(&self) -> &SonoProbeWorldDesc {
        &self.desc
    }

    pub fn listener(&self) -> Vec3 {
        self.listener
    }

    pub fn set_listener_position(&mut self, position: Vec3) {
        self.listener = position;
    }

    /// Starts tracking a source with the world's default occlusion settings.
    ///
    /// # Arguments
    ///
    /// * `instance` - Event instance the occlusion parameters are written to
    /// * `position` - Initial world-space position
    /// * `activity` - Playing state of the source, usually an [`ActivityFlag`](crate::ActivityFlag)
    ///   shared with the audio side
    ///
    /// # Errors
    ///
    /// Returns `SonoProbeError::Configuration` once `max_sources` sources are tracked.
    pub fn add_source(
        &mut self,
        instance: InstanceId,
        position: Vec3,
        activity: impl AudioActivity + Send + 'static,
    ) -> Result<SourceId> {
        let desc = self.desc.occlusion.clone();
        self.add_source_with_desc(instance, position, activity, desc)
    }

    /// Like [`add_source`](Self::add_source), with source-specific occlusion settings.
    pub fn add_source_with_desc(
        &mut self,
        instance: InstanceId,
        position: Vec3,
        activity: impl AudioActivity + Send + 'static,
        desc: OcclusionScannerDesc,
    ) -> Result<SourceId> {
        if self.sources.len() >= self.desc.max_sources {
            return Err(SonoProbeError::Configuration(format!(
                "Source limit of {} reached",
                self.desc.max_sources
            )));
        }

        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;
        self.sources.insert(
            id,
            SourceEntry {
                instance,
                position,
                activity: Box::new(activity),
                occlusion: OcclusionScanner::new(desc, instance),
                local_room: None,
            },
        );
        log::info!("Added source {} for {}", id, instance);
        Ok(id)
    }

    /// Stops tracking a source. Its parameters keep their last published values.
    pub fn remove_source(&mut self, id: SourceId) -> Result<()> {
        self.sources
            .remove(&id)
            .map(|entry| log::info!("Removed source {} ({})", id, entry.instance))
            .ok_or_else(|| unknown_source(id))
    }

    pub fn set_source_position(&mut self, id: SourceId, position: Vec3) -> Result<()> {
        self.entry_mut(id)?.position = position;
        Ok(())
    }

    pub fn source_position(&self, id: SourceId) -> Result<Vec3> {
        Ok(self.entry(id)?.position)
    }

    pub fn source_instance(&self, id: SourceId) -> Result<InstanceId> {
        Ok(self.entry(id)?.instance)
    }

    pub fn contains_source(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Tracked sources in the order they are updated
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.keys().copied().collect()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Attaches a room scanner to a source, writing to the source's instance.
    ///
    /// The scan is centered on the listener like the global one, but it is
    /// gated by the source's activity, so it costs nothing while the source
    /// is silent. Replaces any previous local scanner of that source.
    pub fn enable_local_room_scan(&mut self, id: SourceId, desc: RoomScannerDesc) -> Result<()> {
        let entry = self.entry_mut(id)?;
        entry.local_room = Some(RoomScanner::new(desc, RoomScanMode::Local(entry.instance)));
        log::debug!("Local room scan enabled for {}", id);
        Ok(())
    }

    pub fn disable_local_room_scan(&mut self, id: SourceId) -> Result<()> {
        self.entry_mut(id)?.local_room = None;
        Ok(())
    }

    /// Advances every scanner by `dt` seconds and publishes into `sink`.
    ///
    /// The global room scanner runs first, then each source in id order.
    pub fn update(&mut self, dt: f32, sink: &mut dyn ParameterSink) -> UpdateReport {
        let mut report = UpdateReport::default();
        let tracer: &dyn RayTracer = self.tracer.as_ref();
        let listener = self.listener;

        if let Some(room) = self.room.as_mut() {
            let ctx = ScanContext::new(listener, listener, &AlwaysAudible, tracer);
            report.record(room.tick(dt, &ctx, sink));
        }

        for entry in self.sources.values_mut() {
            let ctx = ScanContext::new(listener, entry.position, &*entry.activity, tracer);
            report.record(entry.occlusion.tick(dt, &ctx, sink));
            if let Some(local_room) = entry.local_room.as_mut() {
                report.record(local_room.tick(dt, &ctx, sink));
            }
        }

        log::trace!("SonoProbe update: {:?}", report);
        report
    }

    /// Smoothed listener-global room estimate, once the first scan completed
    pub fn room_estimate(&self) -> Option<RoomEstimate> {
        self.room.as_ref().and_then(|room| room.estimate())
    }

    pub fn occlusion_estimate(&self, id: SourceId) -> Result<Option<OcclusionEstimate>> {
        Ok(self.entry(id)?.occlusion.estimate())
    }

    /// Estimate of the source's local room scanner, if one is attached and has scanned
    pub fn local_room_estimate(&self, id: SourceId) -> Result<Option<RoomEstimate>> {
        Ok(self
            .entry(id)?
            .local_room
            .as_ref()
            .and_then(|room| room.estimate()))
    }

    pub fn room_scanner(&self) -> Option<&RoomScanner> {
        self.room.as_ref()
    }

    pub fn occlusion_scanner(&self, id: SourceId) -> Result<&OcclusionScanner> {
        Ok(&self.entry(id)?.occlusion)
    }

    fn entry(&self, id: SourceId) -> Result<&SourceEntry> {
        self.sources.get(&id).ok_or_else(|| unknown_source(id))
    }

    fn entry_mut(&mut self, id: SourceId) -> Result<&mut SourceEntry> {
        self.sources.get_mut(&id).ok_or_else(|| unknown_source(id))
    }
}

fn unknown_source(id: SourceId) -> SonoProbeError {
    SonoProbeError::UnknownSource(id.to_string())
}
