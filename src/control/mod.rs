//! Control-thread side of the engine: shared parameters and scene events.
//!
//! Nothing here blocks the audio thread. Parameters are atomics read at block
//! boundaries; scene events arrive through a wait-free ring buffer.

pub mod atomic;
pub mod params;
pub mod scene;

pub use atomic::AtomicF32;
pub use params::{ControlState, ReverbControl};
#[cfg(feature = "rtrb")]
pub use scene::scene_channel;
pub use scene::{apply_scene_event, ChannelRing, SceneEvent, SceneReceiver, SourceTracker};
