//! Scene rasterization
//!
//! Draw order: background, floor band, obstacles, agent. The whole buffer is
//! overwritten on every call.

use super::Observation;
use crate::config::{EpisodeConfig, ObservationMode, ObstacleColor};
use crate::geometry::{Rect, clip_to_screen, floor_line, floor_to_screen};
use crate::sim::EpisodeState;

/// Intensities for the four scene regions
pub mod colors {
    pub const BACKGROUND: f32 = 0.0;
    pub const FLOOR: f32 = 0.5;
    pub const OBSTACLE: f32 = 0.75;
    pub const AGENT: f32 = 1.0;

    pub const RGB_BACKGROUND: [f32; 3] = [BACKGROUND; 3];
    pub const RGB_FLOOR: [f32; 3] = [FLOOR; 3];
    pub const RGB_AGENT: [f32; 3] = [AGENT; 3];
}

/// Per-region colors for one observation mode
struct Palette {
    background: [f32; 3],
    floor: [f32; 3],
    obstacle: [f32; 3],
    agent: [f32; 3],
}

impl Palette {
    fn new(mode: ObservationMode, obstacle_color: ObstacleColor) -> Self {
        match mode {
            // Only the first channel is read for grayscale buffers
            ObservationMode::Grayscale => Self {
                background: [colors::BACKGROUND; 3],
                floor: [colors::FLOOR; 3],
                obstacle: [colors::OBSTACLE; 3],
                agent: [colors::AGENT; 3],
            },
            ObservationMode::Rgb => {
                let mut obstacle = [0.0; 3];
                obstacle[obstacle_color.channel()] = colors::OBSTACLE;
                Self {
                    background: colors::RGB_BACKGROUND,
                    floor: colors::RGB_FLOOR,
                    obstacle,
                    agent: colors::RGB_AGENT,
                }
            }
        }
    }
}

/// Render the episode into a new buffer
pub fn render(state: &EpisodeState, config: &EpisodeConfig) -> Observation {
    let mut obs = Observation::new(
        config.screen_h as usize,
        config.screen_w as usize,
        config.observation_mode.channels(),
    );
    render_into(&mut obs, state, config);
    obs
}

/// Render the episode into `obs`, reshaping it if the screen changed
pub fn render_into(obs: &mut Observation, state: &EpisodeState, config: &EpisodeConfig) {
    let (w, h) = (config.screen_w, config.screen_h);
    obs.ensure_shape(h as usize, w as usize, config.observation_mode.channels());
    let palette = Palette::new(config.observation_mode, config.obstacle_color);

    obs.fill(&palette.background);

    let floor_top = floor_line(h, state.floor_height);
    let floor = Rect::new(0, floor_top, w, state.floor_height);
    if let Some(floor) = clip_to_screen(&floor, w, h) {
        obs.fill_rect(&floor, &palette.floor);
    }

    for obstacle in state.obstacles.iter() {
        let screen = floor_to_screen(&obstacle.rect(), h, state.floor_height);
        if let Some(rect) = clip_to_screen(&screen, w, h) {
            obs.fill_rect(&rect, &palette.obstacle);
        }
    }

    let agent = floor_to_screen(&state.agent.rect(), h, state.floor_height);
    if let Some(rect) = clip_to_screen(&agent, w, h) {
        obs.fill_rect(&rect, &palette.agent);
    }
}
