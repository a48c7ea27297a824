//! Jump arc state machine
//!
//! The arc is a "hat": the agent rises one vertical step per tick until its
//! offset exceeds [`JUMP_HEIGHT`], then descends one step per tick until it is
//! back on the floor. The apex check happens before moving, so with a step of 1
//! the offsets are 1..=16 followed by 15..=0 (32 ticks).
//!
//! With the canonical geometry (agent 5 wide and 10 tall, obstacle 9 wide and
//! 10 tall) the agent is at least 10 pixels up for exactly 13 consecutive
//! ticks, which is the horizontal span over which it overlaps the obstacle.
//! Only one take-off position clears it.

use serde::{Deserialize, Serialize};

use crate::consts::{JUMP_HEIGHT, JUMP_VERTICAL_SPEED};

/// Vertical phase of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JumpState {
    #[default]
    Grounded,
    Ascending,
    Descending,
}

/// Pure transition: next phase and offset after one tick.
///
/// `speed` is the agent speed; the vertical step is `speed * JUMP_VERTICAL_SPEED`.
/// Grounded is a fixed point.
pub fn transition(state: JumpState, offset: i32, speed: i32) -> (JumpState, i32) {
    let step = speed * JUMP_VERTICAL_SPEED;
    let state = match state {
        JumpState::Ascending if offset > JUMP_HEIGHT => JumpState::Descending,
        other => other,
    };
    match state {
        JumpState::Grounded => (JumpState::Grounded, offset),
        JumpState::Ascending => (JumpState::Ascending, offset.saturating_add(step)),
        JumpState::Descending => {
            let offset = (offset - step).max(0);
            if offset == 0 {
                (JumpState::Grounded, 0)
            } else {
                (JumpState::Descending, offset)
            }
        }
    }
}

/// Offsets visited by a full jump starting from the floor (excludes the start)
pub fn arc(speed: i32) -> Vec<i32> {
    let mut offsets = Vec::new();
    let (mut state, mut offset) = (JumpState::Ascending, 0);
    while state != JumpState::Grounded {
        (state, offset) = transition(state, offset, speed);
        offsets.push(offset);
    }
    offsets
}
