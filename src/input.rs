//! Key mapping for interactive play
//!
//! Front ends read one key name per line: arrows by name, or WASD-style
//! letters.

use crate::sim::Action;

/// What a key press asks the game loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Act(Action),
    Exit,
    Unknown,
}

/// Map a key name to a command. Left maps to `Unknown` unless enabled.
pub fn map_key(key: &str, with_left_action: bool) -> KeyCommand {
    match key.trim().to_lowercase().as_str() {
        "right" | "d" | "" => KeyCommand::Act(Action::Right),
        "up" | "w" | "jump" => KeyCommand::Act(Action::Jump),
        "left" | "a" if with_left_action => KeyCommand::Act(Action::Left),
        "e" | "exit" | "q" | "quit" => KeyCommand::Exit,
        _ => KeyCommand::Unknown,
    }
}
