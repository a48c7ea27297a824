//! Physics stepper
//!
//! Applies one action to the agent and resolves contacts. In `finish_jump`
//! mode a jump is resolved to completion within a single external step.

use serde::{Deserialize, Serialize};

use super::state::{Agent, EpisodeState};
use crate::config::EpisodeConfig;
use crate::error::{JumpError, Result};
use crate::geometry::{has_reached_goal, rectangles_intersect};

/// Discrete agent actions, indexed 0 = Right, 1 = Jump, 2 = Left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Right,
    Jump,
    /// Only available with `with_left_action`
    Left,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Right, Action::Jump, Action::Left];

    pub fn index(&self) -> usize {
        match self {
            Action::Right => 0,
            Action::Jump => 1,
            Action::Left => 2,
        }
    }

    /// Short symbol used by scripted action strings
    pub fn symbol(&self) -> char {
        match self {
            Action::Right => 'R',
            Action::Jump => 'J',
            Action::Left => 'L',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Action::Right),
            'J' => Some(Action::Jump),
            'L' => Some(Action::Left),
            _ => None,
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = JumpError;

    fn try_from(index: usize) -> Result<Self> {
        Action::ALL.get(index).copied().ok_or_else(|| {
            JumpError::InvalidAction(format!("unknown action index {index}, expected 0..=2"))
        })
    }
}

/// Contacts after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contact {
    /// Agent overlaps an obstacle (failure)
    pub collision: bool,
    /// Agent reached the right edge (success)
    pub goal: bool,
}

impl Contact {
    pub fn any(&self) -> bool {
        self.collision || self.goal
    }
}

/// Apply a single tick of `action` to the agent.
///
/// An airborne agent ignores the action and continues its arc.
pub fn apply_action(agent: &mut Agent, action: Action, config: &EpisodeConfig) {
    let max_x = config.max_agent_x();
    if !agent.is_grounded() {
        agent.advance_jump(max_x);
        return;
    }
    match action {
        Action::Right => agent.move_right(config.agent_speed, max_x),
        Action::Jump => {
            agent.start_jump();
            agent.advance_jump(max_x);
        }
        Action::Left => agent.move_left(config.agent_speed),
    }
}

/// Check the agent against every obstacle and the right screen edge
pub fn detect_contact(state: &EpisodeState, config: &EpisodeConfig) -> Contact {
    let agent = state.agent.rect();
    Contact {
        collision: state
            .obstacles
            .iter()
            .any(|obstacle| rectangles_intersect(&agent, &obstacle.rect())),
        goal: has_reached_goal(&agent, config.screen_w),
    }
}

/// Advance the physics by one external step and report contacts.
///
/// With `finish_jump`, a jump keeps advancing tick by tick until the agent
/// lands or touches something. Once `already_collided` is latched, obstacle
/// overlap no longer interrupts the jump.
pub fn step_physics(state: &mut EpisodeState, action: Action, config: &EpisodeConfig) -> Contact {
    apply_action(&mut state.agent, action, config);
    let mut contact = detect_contact(state, config);
    if config.finish_jump {
        let interrupts =
            |c: &Contact, latched: bool| c.goal || (c.collision && !latched);
        while !state.agent.is_grounded() && !interrupts(&contact, state.already_collided) {
            state.agent.advance_jump(config.max_agent_x());
            contact = detect_contact(state, config);
        }
    }
    contact
}
