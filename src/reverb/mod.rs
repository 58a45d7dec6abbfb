//! The reverb engines and their shared render interface.

mod render;

pub mod dynamic;
pub mod fdn;
pub mod ism;

pub use dynamic::DynamicFdn;
pub use fdn::Fdn;
pub use ism::{IsmVerb, Reflection};
pub use render::AudioRender;
