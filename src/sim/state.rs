//! Entity model and episode state
//!
//! All positions are floor-relative: `x` from the left screen edge, vertical
//! offset measured upward from the floor line.

use serde::{Deserialize, Serialize};

use super::jump::{self, JumpState};
use crate::config::EpisodeConfig;
use crate::consts::{JUMP_HORIZONTAL_SPEED, OBSTACLE_1, OBSTACLE_2};
use crate::geometry::Rect;

/// The controllable agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub x: i32,
    pub width: i32,
    pub height: i32,
    /// Signed horizontal velocity (pixels/tick) carried through a jump
    pub velocity_x: i32,
    pub jump_state: JumpState,
    /// Offset of the agent's bottom edge above the floor
    pub vertical_position: i32,
    /// Ticks elapsed in the current jump (0 when grounded)
    pub jump_height_counter: u32,
    /// Lateral speed (pixels per step)
    pub speed: i32,
}

impl Agent {
    pub fn new(x: i32, width: i32, height: i32, speed: i32) -> Self {
        Self {
            x,
            width,
            height,
            velocity_x: speed * JUMP_HORIZONTAL_SPEED,
            jump_state: JumpState::Grounded,
            vertical_position: 0,
            jump_height_counter: 0,
            speed,
        }
    }

    /// Floor-relative bounding box
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.vertical_position, self.width, self.height)
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.jump_state == JumpState::Grounded
    }

    /// Move right by `speed`, clamped to `max_x`
    pub fn move_right(&mut self, speed: i32, max_x: i32) {
        self.x = self.x.saturating_add(speed).min(max_x);
        self.velocity_x = speed * JUMP_HORIZONTAL_SPEED;
    }

    /// Move left by `speed`, clamped at x = 0.
    ///
    /// Blocked at the wall, the agent keeps no horizontal velocity, so a
    /// following jump goes straight up.
    pub fn move_left(&mut self, speed: i32) {
        if self.x > 0 {
            self.x = self.x.saturating_sub(speed).max(0);
            self.velocity_x = -speed * JUMP_HORIZONTAL_SPEED;
        } else {
            self.velocity_x = 0;
        }
    }

    /// Leave the ground. Returns false (and does nothing) when airborne.
    pub fn start_jump(&mut self) -> bool {
        if !self.is_grounded() {
            return false;
        }
        self.jump_state = JumpState::Ascending;
        self.jump_height_counter = 0;
        true
    }

    /// Advance one tick along the jump arc, carrying horizontal velocity.
    ///
    /// No-op when grounded. The arc is driven by `jump_state` and
    /// `vertical_position` alone; `jump_height_counter` only records the
    /// ticks spent airborne.
    pub fn advance_jump(&mut self, max_x: i32) {
        if self.is_grounded() {
            return;
        }
        self.x = self.x.saturating_add(self.velocity_x).clamp(0, max_x);
        let (state, offset) = jump::transition(self.jump_state, self.vertical_position, self.speed);
        self.jump_state = state;
        self.vertical_position = offset;
        self.jump_height_counter = if state == JumpState::Grounded {
            0
        } else {
            self.jump_height_counter + 1
        };
    }
}

/// A static obstacle sitting on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: i32,
    pub width: i32,
    pub height: i32,
}

impl Obstacle {
    pub fn new(x: i32, (width, height): (i32, i32)) -> Self {
        Self { x, width, height }
    }

    /// Floor-relative bounding box
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, 0, self.width, self.height)
    }
}

/// Obstacle set for an episode: one configurable or two fixed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obstacles {
    Single(Obstacle),
    Pair(Obstacle, Obstacle),
}

impl Obstacles {
    /// The fixed two-obstacle layout
    pub fn fixed_pair(size: (i32, i32)) -> Self {
        Obstacles::Pair(Obstacle::new(OBSTACLE_1, size), Obstacle::new(OBSTACLE_2, size))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        let (first, second) = match self {
            Obstacles::Single(a) => (a, None),
            Obstacles::Pair(a, b) => (a, Some(b)),
        };
        std::iter::once(first).chain(second)
    }

    /// Leftmost obstacle (reference point for coordinate observations)
    pub fn first(&self) -> &Obstacle {
        match self {
            Obstacles::Single(a) | Obstacles::Pair(a, _) => a,
        }
    }
}

/// Mutable state of a single episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeState {
    pub step_count: u32,
    pub done: bool,
    /// Floor height for this episode
    pub floor_height: i32,
    pub agent: Agent,
    pub obstacles: Obstacles,
    /// Set on the first obstacle touch that does not end the episode
    pub already_collided: bool,
}

impl EpisodeState {
    /// Fresh episode: agent grounded at its initial position
    pub fn new(config: &EpisodeConfig, floor_height: i32, obstacles: Obstacles) -> Self {
        Self {
            step_count: 0,
            done: false,
            floor_height,
            agent: Agent::new(
                config.agent_init_pos,
                config.agent_w,
                config.agent_h,
                config.agent_speed,
            ),
            obstacles,
            already_collided: false,
        }
    }
}
