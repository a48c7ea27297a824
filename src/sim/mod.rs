//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Integer pixel positions only
//! - No RNG (obstacle placement is decided by the episode controller)
//! - No rendering or platform dependencies

pub mod jump;
pub mod state;
pub mod step;

pub use jump::JumpState;
pub use state::{Agent, EpisodeState, Obstacle, Obstacles};
pub use step::{Action, Contact, apply_action, detect_contact, step_physics};
