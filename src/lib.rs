//! Jumping Task - a deterministic 2D side-scrolling RL benchmark
//!
//! An agent walks or jumps across a floor toward the right edge of the screen
//! while avoiding one or two fixed obstacles.
//!
//! Core modules:
//! - `geometry`: Rectangles, overlap tests, floor-relative coordinates
//! - `sim`: Deterministic simulation (entities, jump arc, stepper)
//! - `renderer`: Pixel-buffer observations and a terminal display
//! - `env`: Episode controller (`reset` / `step` / `get_state`)
//! - `config`: Episode configuration with JSON load/save
//! - `input`: Key mapping for interactive front ends

pub mod config;
pub mod env;
pub mod error;
pub mod geometry;
pub mod input;
pub mod renderer;
pub mod sim;

pub use config::{EpisodeConfig, ObservationMode, ObstacleColor, RewardConfig};
pub use env::{Action, JumpTaskEnv, Outcome, Placement, StepResult};
pub use error::{JumpError, Result};
pub use geometry::{Rect, has_reached_goal, rectangles_intersect};
pub use renderer::Observation;

/// Benchmark constants
pub mod consts {
    /// Default screen dimensions (pixels)
    pub const SCREEN_WIDTH: i32 = 60;
    pub const SCREEN_HEIGHT: i32 = 60;
    pub const FLOOR_HEIGHT: i32 = 10;

    /// Agent defaults
    pub const AGENT_WIDTH: i32 = 5;
    pub const AGENT_HEIGHT: i32 = 10;
    pub const AGENT_SPEED: i32 = 1;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: i32 = 9;
    pub const OBSTACLE_HEIGHT: i32 = 10;

    pub const MAX_NUMBER_OF_STEPS: u32 = 600;
    pub const ZOOM: u32 = 8;
    pub const SEED: u64 = 42;

    /// The jump is a "hat": straight diagonal up past this height, then down
    pub const JUMP_HEIGHT: i32 = 15;
    /// Vertical pixels per tick, multiplied by the agent speed
    pub const JUMP_VERTICAL_SPEED: i32 = 1;
    /// Horizontal pixels per tick while airborne, multiplied by the agent speed
    pub const JUMP_HORIZONTAL_SPEED: i32 = 1;

    /// Fixed obstacle x positions in two-obstacle mode
    pub const OBSTACLE_1: i32 = 20;
    pub const OBSTACLE_2: i32 = 55;

    /// The six training settings used in the paper (x positions × floor heights)
    pub const ALLOWED_OBSTACLE_X: [i32; 3] = [20, 30, 40];
    pub const ALLOWED_OBSTACLE_Y: [i32; 2] = [10, 20];

    /// Generalization grid bounds: obstacle x in [LEFT, RIGHT), floor in [DOWN, UP)
    pub const LEFT: i32 = 14;
    pub const RIGHT: i32 = 48;
    pub const DOWN: i32 = 0;
    pub const UP: i32 = 41;

    /// Reward for first touching a green obstacle under color rules
    pub const GREEN_COLLISION_BONUS: i32 = 100;

    /// Real-time pacing delay used by interactive front ends
    pub const SLOW_MOTION_DELAY_MS: u64 = 100;
}
