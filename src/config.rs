//! Episode configuration
//!
//! Immutable for the lifetime of an episode; replaced only through
//! [`JumpTaskEnv::reset_with`](crate::env::JumpTaskEnv::reset_with).
//! Serialized as JSON, with every field optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{JumpError, Result};

/// Pixel layout of the observation buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObservationMode {
    /// Shape `(screen_h, screen_w)`
    #[default]
    Grayscale,
    /// Shape `(screen_h, screen_w, 3)`
    Rgb,
}

impl ObservationMode {
    pub fn channels(&self) -> usize {
        match self {
            ObservationMode::Grayscale => 1,
            ObservationMode::Rgb => 3,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grayscale" | "greyscale" | "gray" | "grey" => Some(ObservationMode::Grayscale),
            "rgb" | "color" | "colour" => Some(ObservationMode::Rgb),
            _ => None,
        }
    }
}

/// Obstacle tint in RGB observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleColor {
    Red,
    #[default]
    Green,
}

impl ObstacleColor {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(ObstacleColor::Red),
            "green" => Some(ObstacleColor::Green),
            _ => None,
        }
    }

    /// RGB channel carrying the obstacle intensity
    pub fn channel(&self) -> usize {
        match self {
            ObstacleColor::Red => 0,
            ObstacleColor::Green => 1,
        }
    }
}

/// Terminal reward shaping on top of the per-pixel displacement reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Added to the step reward when the agent reaches the right edge
    pub exit_bonus: i32,
    /// Replaces the step reward when the agent hits an obstacle
    pub collision_reward: Option<i32>,
    /// Paid once for the first grounded touch of a green obstacle under
    /// `color_rules`
    pub green_collision_bonus: i32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            exit_bonus: 0,
            collision_reward: None,
            green_collision_bonus: GREEN_COLLISION_BONUS,
        }
    }
}

impl RewardConfig {
    /// Terminal rewards from the paper: +100 exit, -1 on collision
    pub fn paper() -> Self {
        Self {
            exit_bonus: 100,
            collision_reward: Some(-1),
            ..Default::default()
        }
    }
}

/// Full episode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub screen_w: i32,
    pub screen_h: i32,
    /// Floor band height, also the obstacle's floor for `reset`
    pub floor_height: i32,
    pub agent_w: i32,
    pub agent_h: i32,
    /// Initial x position of the agent (on the floor)
    pub agent_init_pos: i32,
    /// Lateral speed in pixels per step
    pub agent_speed: i32,
    /// Default obstacle x position for `reset`
    pub obstacle_position: i32,
    /// Obstacle (width, height)
    pub obstacle_size: (i32, i32),
    /// Ask front ends to display the game
    pub rendering: bool,
    /// Display scale factor for front ends
    pub zoom: u32,
    /// Ask front ends to pace steps at human speed
    pub slow_motion: bool,
    pub with_left_action: bool,
    pub max_number_of_steps: u32,
    /// Use the two fixed obstacles instead of `obstacle_position`
    pub two_obstacles: bool,
    /// Resolve a whole jump within a single step
    pub finish_jump: bool,
    /// Seed for `reset_random`
    pub seed: u64,
    pub observation_mode: ObservationMode,
    pub obstacle_color: ObstacleColor,
    /// Obstacle color changes the game: touching a green obstacle pays
    /// `rewards.green_collision_bonus` and does not end the episode, a red
    /// one ends it as usual. Requires RGB observations.
    pub color_rules: bool,
    pub rewards: RewardConfig,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            screen_w: SCREEN_WIDTH,
            screen_h: SCREEN_HEIGHT,
            floor_height: FLOOR_HEIGHT,
            agent_w: AGENT_WIDTH,
            agent_h: AGENT_HEIGHT,
            agent_init_pos: 0,
            agent_speed: AGENT_SPEED,
            obstacle_position: 0,
            obstacle_size: (OBSTACLE_WIDTH, OBSTACLE_HEIGHT),
            rendering: false,
            zoom: ZOOM,
            slow_motion: false,
            with_left_action: false,
            max_number_of_steps: MAX_NUMBER_OF_STEPS,
            two_obstacles: false,
            finish_jump: false,
            seed: SEED,
            observation_mode: ObservationMode::Grayscale,
            obstacle_color: ObstacleColor::Green,
            color_rules: false,
            rewards: RewardConfig::default(),
        }
    }
}

fn invalid(msg: String) -> JumpError {
    JumpError::InvalidConfiguration(msg)
}

impl EpisodeConfig {
    /// Check that every entity fits on the screen
    pub fn validate(&self) -> Result<()> {
        let (obstacle_w, obstacle_h) = self.obstacle_size;
        for (name, value) in [
            ("screen_w", self.screen_w),
            ("screen_h", self.screen_h),
            ("agent_w", self.agent_w),
            ("agent_h", self.agent_h),
            ("agent_speed", self.agent_speed),
            ("obstacle width", obstacle_w),
            ("obstacle height", obstacle_h),
        ] {
            if value <= 0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.zoom == 0 {
            return Err(invalid("zoom must be positive".into()));
        }
        if self.max_number_of_steps == 0 {
            return Err(invalid("max_number_of_steps must be positive".into()));
        }
        if self.agent_speed > self.screen_w {
            return Err(invalid(format!(
                "agent_speed {} must not exceed screen width {}",
                self.agent_speed, self.screen_w
            )));
        }
        if self.color_rules && self.observation_mode != ObservationMode::Rgb {
            return Err(invalid("color_rules requires rgb observation mode".into()));
        }
        if self.agent_w > self.screen_w || obstacle_w > self.screen_w {
            return Err(invalid(format!(
                "agent width {} and obstacle width {obstacle_w} must fit in screen width {}",
                self.agent_w, self.screen_w
            )));
        }
        self.check_floor_height(self.floor_height)?;
        if self.agent_init_pos < 0 || self.agent_init_pos > self.max_agent_x() {
            return Err(invalid(format!(
                "agent_init_pos must be in [0, {}], got {}",
                self.max_agent_x(),
                self.agent_init_pos
            )));
        }
        if !self.two_obstacles {
            self.check_obstacle_position(self.obstacle_position)?;
        }
        Ok(())
    }

    /// A floor height leaving room for the agent and obstacle above it
    pub fn check_floor_height(&self, floor_height: i32) -> Result<()> {
        let tallest = self.agent_h.max(self.obstacle_size.1);
        if floor_height < 0 || floor_height > self.screen_h - tallest {
            return Err(invalid(format!(
                "floor height must be in [0, {}], got {floor_height}",
                self.screen_h - tallest
            )));
        }
        Ok(())
    }

    /// An obstacle x position whose left edge lies on the screen
    pub fn check_obstacle_position(&self, x: i32) -> Result<()> {
        if x < 0 || x >= self.screen_w {
            return Err(invalid(format!(
                "obstacle position must be in [0, {}), got {x}",
                self.screen_w
            )));
        }
        Ok(())
    }

    /// Rightmost x position the agent may occupy
    #[inline]
    pub fn max_agent_x(&self) -> i32 {
        self.screen_w - self.agent_w
    }

    /// Number of enabled actions (Right, Jump, and optionally Left)
    pub fn action_count(&self) -> usize {
        if self.with_left_action { 3 } else { 2 }
    }

    /// Observation buffer shape: `[h, w]` or `[h, w, 3]`
    pub fn observation_shape(&self) -> Vec<usize> {
        let (h, w) = (self.screen_h as usize, self.screen_w as usize);
        match self.observation_mode {
            ObservationMode::Grayscale => vec![h, w],
            ObservationMode::Rgb => vec![h, w, 3],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| invalid(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        std::fs::write(path.as_ref(), self.to_json())?;
        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
