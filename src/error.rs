//! Construction-time errors.
//!
//! Only building an engine can fail. Once an engine renders, degenerate
//! runtime states (a source outside the room, a zero distance, an oversized
//! delay) are absorbed locally by muting or clamping.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReverbError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReverbError {
    #[error("feedback path count {0} is not a power of two or 24")]
    InvalidPathCount(usize),

    #[error("invalid room dimensions: {x} x {y} x {z} m")]
    InvalidRoom { x: f32, y: f32, z: f32 },

    #[error("plane directions are parallel, no normal can be derived")]
    DegeneratePlane,

    #[error("reflection order must be at least 1, got {0}")]
    InvalidOrder(usize),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    #[error("channel count must be at least 1, got {0}")]
    InvalidChannelCount(usize),

    #[error("block size {0} outside 1..={max}", max = crate::MAX_BLOCK_SIZE)]
    InvalidBlockSize(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
