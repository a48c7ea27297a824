//! Rendering module
//!
//! Rasterizes the scene into the pixel buffer used as the RL observation, and
//! draws that buffer as text for terminal front ends.

pub mod observation;
pub mod scene;
pub mod terminal;

pub use observation::Observation;
pub use scene::{colors, render, render_into};
