//! Scene updates from a remote position service.
//!
//! The service reports where its sources and the reference (listener) are.
//! Events travel to the audio thread over a wait-free ring buffer and are
//! applied at the next block boundary.

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use std::f32::consts::TAU;

use super::params::ControlState;
use crate::geometry::Vector3D;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SceneEvent {
    /// A scene source moved. Only the tracked id moves the reverb source.
    SourceMoved { id: u32, x: f32, y: f32 },
    /// The listener moved.
    ReferenceMoved { x: f32, y: f32 },
}

pub trait SceneReceiver {
    fn pop(&mut self) -> Option<SceneEvent>;
}

#[cfg(feature = "rtrb")]
impl SceneReceiver for Consumer<SceneEvent> {
    fn pop(&mut self) -> Option<SceneEvent> {
        Consumer::pop(self).ok()
    }
}

/// Ring buffer pair for feeding scene events to a
/// [`DynamicFdn`](crate::reverb::DynamicFdn).
#[cfg(feature = "rtrb")]
pub fn scene_channel(capacity: usize) -> (Producer<SceneEvent>, Consumer<SceneEvent>) {
    RingBuffer::new(capacity)
}

/// Apply one event to the shared state. Heights are kept; the service is
/// two-dimensional.
///
/// Returns `true` if a position changed.
pub fn apply_scene_event(event: SceneEvent, state: &ControlState) -> bool {
    match event {
        SceneEvent::SourceMoved { id, x, y } => {
            if !state.tracking() || id != state.tracked_source() {
                return false;
            }
            let z = state.source().z;
            state.store_source(Vector3D::new(x, y, z))
        }
        SceneEvent::ReferenceMoved { x, y } => {
            let z = state.listener().z;
            state.store_listener(Vector3D::new(x, y, z))
        }
    }
}

/// Drains queued scene events into the shared state on the audio thread.
pub struct SourceTracker {
    receiver: Box<dyn SceneReceiver + Send>,
}

impl SourceTracker {
    pub fn new(receiver: impl SceneReceiver + Send + 'static) -> Self {
        Self {
            receiver: Box::new(receiver),
        }
    }

    /// Apply everything queued. Returns the number of events consumed.
    pub fn drain(&mut self, state: &ControlState) -> usize {
        let mut n = 0;
        while let Some(event) = self.receiver.pop() {
            apply_scene_event(event, state);
            n += 1;
        }
        n
    }
}

/// Placement of the reverb output channels as virtual sources on a circle
/// around the listener, for scene services that render them as objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRing {
    pub n_channels: usize,
    pub radius: f32,
}

impl ChannelRing {
    pub fn new(n_channels: usize, radius: f32) -> Self {
        Self { n_channels, radius }
    }

    pub fn azimuth(&self, channel: usize) -> f32 {
        TAU * channel as f32 / self.n_channels as f32
    }

    /// Position of one channel's source at the listener's height.
    pub fn position(&self, channel: usize, listener: Vector3D) -> Vector3D {
        let a = self.azimuth(channel);
        listener + Vector3D::new(a.cos(), a.sin(), 0.0) * self.radius
    }

    pub fn positions(&self, listener: Vector3D) -> Vec<Vector3D> {
        (0..self.n_channels)
            .map(|c| self.position(c, listener))
            .collect()
    }
}
