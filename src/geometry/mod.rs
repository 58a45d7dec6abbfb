//! Room geometry: vectors, wall planes and image sources.

/// Oriented planes (walls) with mirroring and intersection.
pub mod plane;
/// Shoebox rooms and closed-form image-source expansion.
pub mod room;
/// Three-component vector algebra.
pub mod vector;

pub use plane::Plane3D;
pub use room::{n_mirror_sources, shell_size, srcs_per_plane, MirrorSourceSet, Room};
pub use vector::Vector3D;
