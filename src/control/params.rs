//! Shared parameter state between the control thread and the audio thread.
//!
//! Every parameter is an independent atomic scalar: last writer wins and no
//! parameter is ever half-written. Groups (room x/y/z, positions) are not
//! transactional; the audio thread may pick up a partially updated group for
//! one block and the rest on the next.
//!
//! Writers flag what changed in a dirty mask (Release). The audio thread
//! swaps the mask out at a block boundary (Acquire) and re-reads only the
//! flagged groups.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use super::atomic::AtomicF32;
use super::scene::{apply_scene_event, ChannelRing, SceneEvent};
use crate::config::ReverbConfig;
use crate::geometry::Vector3D;
use crate::N_BANDS;

pub const DIRTY_T60: u32 = 1 << 0;
pub const DIRTY_CROSSOVERS: u32 = 1 << 1;
pub const DIRTY_ROOM: u32 = 1 << 2;
pub const DIRTY_SOURCE: u32 = 1 << 3;
pub const DIRTY_LISTENER: u32 = 1 << 4;
pub const DIRTY_TRACKING: u32 = 1 << 5;

/// Shortest accepted reverberation time, seconds.
pub const MIN_T60: f32 = 0.01;
/// Lowest accepted crossover frequency, Hz.
pub const MIN_CROSSOVER_HZ: f32 = 20.0;
/// Highest accepted crossover, as a fraction of the sample rate.
pub const MAX_CROSSOVER_RATIO: f32 = 0.45;
pub const MAX_GAIN: f32 = 2.0;
/// Smallest radius of the reverb-source ring, meters.
pub const MIN_RING_RADIUS: f32 = 0.1;

#[derive(Debug)]
pub struct ControlState {
    gain: AtomicF32,
    mix: AtomicF32,
    fdn_gain: AtomicF32,
    ism_gain: AtomicF32,
    t60: [AtomicF32; N_BANDS],
    crossovers: [AtomicF32; 2],
    room: [AtomicF32; 3],
    source: [AtomicF32; 3],
    listener: [AtomicF32; 3],
    tracked_id: AtomicU32,
    tracking: AtomicBool,
    ring_radius: AtomicF32,
    dirty: AtomicU32,

    sample_rate: f32,
    n_channels: usize,
    max_t60: f32,
    min_extent: f32,
    max_extent: f32,
}

fn vector_atomics(v: Vector3D) -> [AtomicF32; 3] {
    [AtomicF32::new(v.x), AtomicF32::new(v.y), AtomicF32::new(v.z)]
}

fn load_vector(atomics: &[AtomicF32; 3]) -> Vector3D {
    Vector3D::new(atomics[0].load(), atomics[1].load(), atomics[2].load())
}

impl ControlState {
    pub fn new(config: &ReverbConfig) -> Self {
        Self {
            gain: AtomicF32::new(config.gain.clamp(0.0, MAX_GAIN)),
            mix: AtomicF32::new(config.mix.clamp(0.0, 1.0)),
            fdn_gain: AtomicF32::new(config.fdn_gain.clamp(0.0, MAX_GAIN)),
            ism_gain: AtomicF32::new(config.ism_gain.clamp(0.0, MAX_GAIN)),
            t60: config.t60.map(AtomicF32::new),
            crossovers: config.crossovers.map(AtomicF32::new),
            room: config.room.map(AtomicF32::new),
            source: vector_atomics(config.source),
            listener: vector_atomics(config.listener),
            tracked_id: AtomicU32::new(0),
            tracking: AtomicBool::new(false),
            ring_radius: AtomicF32::new(config.ring_radius),
            dirty: AtomicU32::new(0),
            sample_rate: config.sample_rate,
            n_channels: config.n_channels,
            max_t60: config.max_t60,
            min_extent: config.min_room_extent,
            max_extent: config.max_room_extent,
        }
    }

    #[inline]
    fn mark(&self, flags: u32) {
        self.dirty.fetch_or(flags, Ordering::Release);
    }

    /// Take and reset the dirty mask. Audio thread only.
    #[inline]
    pub fn take_dirty(&self) -> u32 {
        self.dirty.swap(0, Ordering::Acquire)
    }

    pub fn gain(&self) -> f32 {
        self.gain.load()
    }

    pub fn mix(&self) -> f32 {
        self.mix.load()
    }

    pub fn fdn_gain(&self) -> f32 {
        self.fdn_gain.load()
    }

    pub fn ism_gain(&self) -> f32 {
        self.ism_gain.load()
    }

    pub fn t60(&self, band: usize) -> f32 {
        self.t60[band].load()
    }

    pub fn crossovers(&self) -> [f32; 2] {
        [self.crossovers[0].load(), self.crossovers[1].load()]
    }

    pub fn room(&self) -> [f32; 3] {
        [self.room[0].load(), self.room[1].load(), self.room[2].load()]
    }

    pub fn source(&self) -> Vector3D {
        load_vector(&self.source)
    }

    pub fn listener(&self) -> Vector3D {
        load_vector(&self.listener)
    }

    pub fn tracked_source(&self) -> u32 {
        self.tracked_id.load(Ordering::Relaxed)
    }

    pub fn tracking(&self) -> bool {
        self.tracking.load(Ordering::Relaxed)
    }

    pub fn set_tracked_source(&self, id: u32) {
        self.tracked_id.store(id, Ordering::Relaxed);
        self.mark(DIRTY_TRACKING);
    }

    pub fn set_tracking(&self, tracking: bool) {
        self.tracking.store(tracking, Ordering::Relaxed);
        self.mark(DIRTY_TRACKING);
    }

    /// Store a source position. Non-finite positions are refused. RT-safe.
    pub fn store_source(&self, position: Vector3D) -> bool {
        if !position.is_finite() {
            return false;
        }
        for (a, v) in self.source.iter().zip(position.to_array()) {
            a.store(v);
        }
        self.mark(DIRTY_SOURCE);
        true
    }

    /// Store a listener position. Non-finite positions are refused. RT-safe.
    pub fn store_listener(&self, position: Vector3D) -> bool {
        if !position.is_finite() {
            return false;
        }
        for (a, v) in self.listener.iter().zip(position.to_array()) {
            a.store(v);
        }
        self.mark(DIRTY_LISTENER);
        true
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Ring of reverb sources at the current radius. The audio path never
    /// reads it, so changing the radius sets no dirty flag.
    pub fn channel_ring(&self) -> ChannelRing {
        ChannelRing::new(self.n_channels, self.ring_radius.load())
    }
}

/// Control surface handed to the GUI / host. Cheap to clone, usable from any
/// thread.
///
/// Out-of-range values are clamped and logged, never returned as errors.
#[derive(Debug, Clone)]
pub struct ReverbControl {
    state: Arc<ControlState>,
}

impl ReverbControl {
    pub fn new(state: Arc<ControlState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ControlState> {
        &self.state
    }

    fn clamp_logged(name: &str, value: f32, min: f32, max: f32) -> Option<f32> {
        if !value.is_finite() {
            warn!("{name}: ignoring non-finite value {value}");
            return None;
        }
        let clamped = value.clamp(min, max);
        if clamped != value {
            debug!("{name}: {value} clamped to {clamped}");
        }
        Some(clamped)
    }

    /// Output gain in [0, 2].
    pub fn set_gain(&self, gain: f32) {
        if let Some(v) = Self::clamp_logged("gain", gain, 0.0, MAX_GAIN) {
            self.state.gain.store(v);
        }
    }

    /// FDN share in [0, 1]; the rest goes to the image sources.
    pub fn set_mix(&self, mix: f32) {
        if let Some(v) = Self::clamp_logged("mix", mix, 0.0, 1.0) {
            self.state.mix.store(v);
        }
    }

    pub fn set_fdn_gain(&self, gain: f32) {
        if let Some(v) = Self::clamp_logged("fdn gain", gain, 0.0, MAX_GAIN) {
            self.state.fdn_gain.store(v);
        }
    }

    pub fn set_ism_gain(&self, gain: f32) {
        if let Some(v) = Self::clamp_logged("ism gain", gain, 0.0, MAX_GAIN) {
            self.state.ism_gain.store(v);
        }
    }

    /// Reverberation time of one band (0 = low, 1 = mid, 2 = high).
    pub fn set_t60(&self, t60: f32, band: usize) {
        if band >= N_BANDS {
            warn!("t60: band {band} out of range, ignored");
            return;
        }
        if let Some(v) = Self::clamp_logged("t60", t60, MIN_T60, self.state.max_t60) {
            self.state.t60[band].store(v);
            self.state.mark(DIRTY_T60);
        }
    }

    /// Band edges in Hz. Swapped if reversed, clamped into the audible range
    /// below Nyquist.
    pub fn set_crossovers(&self, low_hz: f32, high_hz: f32) {
        let max = self.state.sample_rate * MAX_CROSSOVER_RATIO;
        let (Some(a), Some(b)) = (
            Self::clamp_logged("crossover", low_hz, MIN_CROSSOVER_HZ, max),
            Self::clamp_logged("crossover", high_hz, MIN_CROSSOVER_HZ, max),
        ) else {
            return;
        };
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        if low == high {
            warn!("crossovers: both edges at {low} Hz, ignored");
            return;
        }
        self.state.crossovers[0].store(low);
        self.state.crossovers[1].store(high);
        self.state.mark(DIRTY_CROSSOVERS);
    }

    /// Room extents in meters, each clamped into the configured bounds.
    pub fn set_room_size(&self, x: f32, y: f32, z: f32) {
        let (min, max) = (self.state.min_extent, self.state.max_extent);
        let mut extents = [0.0; 3];
        for (e, v) in extents.iter_mut().zip([x, y, z]) {
            match Self::clamp_logged("room", v, min, max) {
                Some(c) => *e = c,
                None => return,
            }
        }
        for (a, e) in self.state.room.iter().zip(extents) {
            a.store(e);
        }
        self.state.mark(DIRTY_ROOM);
    }

    pub fn set_source_position(&self, position: Vector3D) {
        if !self.state.store_source(position) {
            warn!("source position {position} is not finite, ignored");
        }
    }

    pub fn set_listener_position(&self, position: Vector3D) {
        if !self.state.store_listener(position) {
            warn!("listener position {position} is not finite, ignored");
        }
    }

    /// Follow scene source `id`, starting from its current (x, y).
    pub fn set_tracked_source(&self, id: u32, x: f32, y: f32) {
        self.state.set_tracked_source(id);
        let z = self.state.source().z;
        self.set_source_position(Vector3D::new(x, y, z));
    }

    pub fn set_tracking(&self, tracking: bool) {
        debug!("source tracking {}", if tracking { "on" } else { "off" });
        self.state.set_tracking(tracking);
    }

    /// Radius of the ring of reverb sources around the listener, clamped into
    /// [0.1 m, max room extent].
    pub fn set_ring_radius(&self, radius: f32) {
        if let Some(v) =
            Self::clamp_logged("ring radius", radius, MIN_RING_RADIUS, self.state.max_extent)
        {
            self.state.ring_radius.store(v);
        }
    }

    pub fn ring_radius(&self) -> f32 {
        self.state.ring_radius.load()
    }

    pub fn channel_ring(&self) -> ChannelRing {
        self.state.channel_ring()
    }

    /// Where the scene service should place the reverb sources: the channel
    /// ring centred on the current listener.
    pub fn reverb_source_positions(&self) -> Vec<Vector3D> {
        self.state.channel_ring().positions(self.state.listener())
    }

    /// Position callback for scene services that push events directly
    /// instead of through a ring buffer.
    pub fn handle_scene_event(&self, event: SceneEvent) -> bool {
        apply_scene_event(event, &self.state)
    }

    pub fn tracking(&self) -> bool {
        self.state.tracking()
    }

    pub fn tracked_source(&self) -> u32 {
        self.state.tracked_source()
    }

    pub fn gain(&self) -> f32 {
        self.state.gain()
    }

    pub fn mix(&self) -> f32 {
        self.state.mix()
    }

    pub fn fdn_gain(&self) -> f32 {
        self.state.fdn_gain()
    }

    pub fn ism_gain(&self) -> f32 {
        self.state.ism_gain()
    }

    pub fn t60(&self, band: usize) -> f32 {
        self.state.t60(band)
    }

    pub fn crossovers(&self) -> [f32; 2] {
        self.state.crossovers()
    }

    pub fn room_size(&self) -> [f32; 3] {
        self.state.room()
    }

    pub fn source_position(&self) -> Vector3D {
        self.state.source()
    }

    pub fn listener_position(&self) -> Vector3D {
        self.state.listener()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> ReverbControl {
        ReverbControl::new(Arc::new(ControlState::new(&ReverbConfig::default())))
    }

    #[test]
    fn test_gain_and_mix_clamped() {
        let control = control();
        control.set_gain(3.0);
        assert_eq!(control.gain(), 2.0);
        control.set_gain(-1.0);
        assert_eq!(control.gain(), 0.0);
        control.set_mix(1.5);
        assert_eq!(control.mix(), 1.0);
        control.set_mix(f32::NAN);
        assert_eq!(control.mix(), 1.0);
    }

    #[test]
    fn test_t60_clamped_and_flagged() {
        let control = control();
        let state = control.state().clone();
        state.take_dirty();

        control.set_t60(20.0, 0);
        assert_eq!(control.t60(0), 8.0);
        assert_eq!(state.take_dirty(), DIRTY_T60);

        control.set_t60(1.0, 5);
        assert_eq!(state.take_dirty(), 0);
    }

    #[test]
    fn test_crossovers_ordered() {
        let control = control();
        control.set_crossovers(4000.0, 500.0);
        assert_eq!(control.crossovers(), [500.0, 4000.0]);

        control.set_crossovers(5.0, 1e6);
        let [low, high] = control.crossovers();
        assert_eq!(low, MIN_CROSSOVER_HZ);
        assert!(high < 48_000.0 * 0.5);
    }

    #[test]
    fn test_room_clamped_to_bounds() {
        let control = control();
        control.set_room_size(0.1, 6.0, 100.0);
        assert_eq!(control.room_size(), [1.0, 6.0, 30.0]);

        control.set_room_size(f32::INFINITY, 2.0, 2.0);
        assert_eq!(control.room_size(), [1.0, 6.0, 30.0]);
    }

    #[test]
    fn test_positions_flag_dirty() {
        let control = control();
        let state = control.state().clone();
        state.take_dirty();

        control.set_source_position(Vector3D::new(1.0, 2.0, 1.0));
        control.set_listener_position(Vector3D::new(3.0, 2.0, 1.0));
        assert_eq!(state.take_dirty(), DIRTY_SOURCE | DIRTY_LISTENER);

        control.set_source_position(Vector3D::new(f32::NAN, 0.0, 0.0));
        assert_eq!(state.take_dirty(), 0);
        assert_eq!(control.source_position(), Vector3D::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_tracked_source_moves_source() {
        let control = control();
        control.set_source_position(Vector3D::new(1.0, 1.0, 1.4));
        control.set_tracked_source(9, 2.0, 3.0);
        assert_eq!(control.tracked_source(), 9);
        assert_eq!(control.source_position(), Vector3D::new(2.0, 3.0, 1.4));
    }

    #[test]
    fn test_handle_scene_event_respects_tracking() {
        let control = control();
        control.set_tracked_source(2, 1.0, 1.0);
        assert!(!control.handle_scene_event(SceneEvent::SourceMoved { id: 2, x: 4.0, y: 4.0 }));
        control.set_tracking(true);
        assert!(control.handle_scene_event(SceneEvent::SourceMoved { id: 2, x: 4.0, y: 4.0 }));
        assert_eq!(control.source_position().x, 4.0);
    }

    #[test]
    fn test_ring_follows_listener() {
        let control = control();
        assert_eq!(control.channel_ring(), ChannelRing::new(8, 1.2));

        control.set_listener_position(Vector3D::new(2.0, 3.0, 1.5));
        control.set_ring_radius(2.0);
        let positions = control.reverb_source_positions();
        assert_eq!(positions.len(), 8);
        for p in &positions {
            assert!((p.distance_to(Vector3D::new(2.0, 3.0, 1.5)) - 2.0).abs() < 1e-5);
            assert_eq!(p.z, 1.5);
        }

        control.set_ring_radius(0.0);
        assert_eq!(control.ring_radius(), MIN_RING_RADIUS);
        control.set_ring_radius(f32::NAN);
        assert_eq!(control.ring_radius(), MIN_RING_RADIUS);
    }

    #[test]
    fn test_clones_share_state() {
        let a = control();
        let b = a.clone();
        a.set_gain(0.5);
        assert_eq!(b.gain(), 0.5);
    }
}
