//! Error types
//!
//! The simulation has no I/O, so every error is a violated precondition
//! reported synchronously to the caller.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JumpError {
    /// Sizes or positions that do not fit the screen, or zero/negative sizes
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// `step`/`get_state` before any `reset`, or `step` after a terminal state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    /// Action index unknown, or not in the enabled action set
    #[error("invalid action: {0}")]
    InvalidAction(String),
}

pub type Result<T> = std::result::Result<T, JumpError>;
