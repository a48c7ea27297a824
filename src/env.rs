//! Episode controller
//!
//! Owns the configuration and episode state, and exposes the public
//! environment API: `reset`, `step` and `get_state`.
//!
//! Lifecycle: `NotStarted -> Running -> Terminated`. `reset` always returns to
//! `Running`; stepping in any other phase is an error.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{EpisodeConfig, ObstacleColor};
use crate::consts::{ALLOWED_OBSTACLE_X, ALLOWED_OBSTACLE_Y, OBSTACLE_1, OBSTACLE_2};
use crate::error::{JumpError, Result};
use crate::renderer::{Observation, render_into};
use crate::sim::step::step_physics;
use crate::sim::{EpisodeState, Obstacle, Obstacles};

pub use crate::sim::Action;

/// Episode lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Running,
    Terminated,
}

/// Why an episode terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Agent reached the right edge
    Success,
    /// Agent touched an obstacle
    Collision,
    /// Step budget exhausted
    Timeout,
}

/// Obstacle x position(s) for an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstaclePosition {
    Single(i32),
    Pair(i32, i32),
}

/// Per-episode layout chosen at reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub floor_height: i32,
    pub obstacle: ObstaclePosition,
}

impl Placement {
    pub fn single(obstacle_x: i32, floor_height: i32) -> Self {
        Self {
            floor_height,
            obstacle: ObstaclePosition::Single(obstacle_x),
        }
    }

    pub fn pair(first_x: i32, second_x: i32, floor_height: i32) -> Self {
        Self {
            floor_height,
            obstacle: ObstaclePosition::Pair(first_x, second_x),
        }
    }

    /// Layout described by the configuration alone
    pub fn from_config(config: &EpisodeConfig) -> Self {
        if config.two_obstacles {
            Self::pair(OBSTACLE_1, OBSTACLE_2, config.floor_height)
        } else {
            Self::single(config.obstacle_position, config.floor_height)
        }
    }
}

/// Result of a single `step`
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    /// Rightward pixels travelled this step, plus any terminal shaping
    pub reward: i32,
    /// True on success, collision or timeout
    pub terminal: bool,
    /// Cause of termination when `terminal` is set
    pub outcome: Option<Outcome>,
    /// The agent touched an obstacle this step
    pub collision: bool,
}

/// The jumping task environment
#[derive(Debug)]
pub struct JumpTaskEnv {
    config: EpisodeConfig,
    phase: Phase,
    state: Option<EpisodeState>,
    /// Last rendered frame, overwritten on every reset/step
    frame: Observation,
    rng: Pcg32,
}

impl JumpTaskEnv {
    /// Create an environment; call a `reset` variant before stepping
    pub fn new(config: EpisodeConfig) -> Result<Self> {
        config.validate()?;
        let frame = Observation::new(
            config.screen_h as usize,
            config.screen_w as usize,
            config.observation_mode.channels(),
        );
        let rng = Pcg32::seed_from_u64(config.seed);
        Ok(Self {
            config,
            phase: Phase::NotStarted,
            state: None,
            frame,
            rng,
        })
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current episode state (None before the first reset)
    pub fn state(&self) -> Option<&EpisodeState> {
        self.state.as_ref()
    }

    /// Actions accepted by `step` under the current configuration
    pub fn legal_actions(&self) -> Vec<Action> {
        Action::ALL[..self.config.action_count()].to_vec()
    }

    pub fn action_count(&self) -> usize {
        self.config.action_count()
    }

    /// Start a new episode with the layout from the configuration
    pub fn reset_default(&mut self) -> Result<Observation> {
        let placement = Placement::from_config(&self.config);
        self.reset(placement)
    }

    /// Start a new episode at one of the six training settings, chosen with
    /// the seeded generator
    pub fn reset_random(&mut self) -> Result<Observation> {
        let x = ALLOWED_OBSTACLE_X[self.rng.random_range(0..ALLOWED_OBSTACLE_X.len())];
        let floor = ALLOWED_OBSTACLE_Y[self.rng.random_range(0..ALLOWED_OBSTACLE_Y.len())];
        self.reset(Placement::single(x, floor))
    }

    /// Replace the configuration, then start a new episode.
    ///
    /// On error the environment keeps its previous configuration and episode.
    pub fn reset_with(&mut self, config: EpisodeConfig, placement: Placement) -> Result<Observation> {
        config.validate()?;
        let obstacles = build_obstacles(&config, &placement)?;
        if config.seed != self.config.seed {
            self.rng = Pcg32::seed_from_u64(config.seed);
        }
        self.config = config;
        Ok(self.start(placement, obstacles))
    }

    /// Start a new episode, discarding any previous one
    pub fn reset(&mut self, placement: Placement) -> Result<Observation> {
        let obstacles = build_obstacles(&self.config, &placement)?;
        Ok(self.start(placement, obstacles))
    }

    fn start(&mut self, placement: Placement, obstacles: Obstacles) -> Observation {
        log::debug!(
            "Reset: floor_height={}, obstacles={:?}",
            placement.floor_height,
            placement.obstacle
        );

        let state = EpisodeState::new(&self.config, placement.floor_height, obstacles);
        render_into(&mut self.frame, &state, &self.config);
        self.state = Some(state);
        self.phase = Phase::Running;
        self.frame.clone()
    }

    /// Advance the episode by one action
    pub fn step(&mut self, action: Action) -> Result<StepResult> {
        match self.phase {
            Phase::NotStarted => return Err(JumpError::InvalidState("step called before reset")),
            Phase::Terminated => {
                return Err(JumpError::InvalidState(
                    "step called after the episode terminated; call reset first",
                ));
            }
            Phase::Running => {}
        }
        if action == Action::Left && !self.config.with_left_action {
            return Err(JumpError::InvalidAction(
                "Left is disabled (with_left_action = false)".into(),
            ));
        }
        let Some(state) = self.state.as_mut() else {
            return Err(JumpError::InvalidState("no episode state"));
        };
        let config = &self.config;

        let start_x = state.agent.x;
        let contact = step_physics(state, action, config);
        state.step_count += 1;

        // Under color rules a green obstacle only counts on the first touch
        // and never ends the episode
        let green = config.color_rules && config.obstacle_color == ObstacleColor::Green;
        let collision = contact.collision && !(green && state.already_collided);
        if green && collision {
            state.already_collided = true;
        }

        let outcome = if collision && !green {
            Some(Outcome::Collision)
        } else if contact.goal {
            Some(Outcome::Success)
        } else if state.step_count >= config.max_number_of_steps {
            Some(Outcome::Timeout)
        } else {
            None
        };

        let mut reward = (state.agent.x - start_x).max(0);
        if collision {
            if let Some(r) = config.rewards.collision_reward {
                reward = r;
            }
            if green && state.agent.is_grounded() {
                reward += config.rewards.green_collision_bonus;
            }
        } else if outcome == Some(Outcome::Success) {
            reward += config.rewards.exit_bonus;
        }

        let terminal = outcome.is_some();
        state.done = terminal;
        if let Some(outcome) = outcome {
            log::debug!(
                "Episode terminated: {:?} after {} steps at x={}",
                outcome,
                state.step_count,
                state.agent.x
            );
            self.phase = Phase::Terminated;
        }

        render_into(&mut self.frame, state, config);
        Ok(StepResult {
            observation: self.frame.clone(),
            reward,
            terminal,
            outcome,
            collision,
        })
    }

    /// Step with a raw action index (0 = Right, 1 = Jump, 2 = Left)
    pub fn step_index(&mut self, index: usize) -> Result<StepResult> {
        self.step(Action::try_from(index)?)
    }

    /// Current observation; does not advance the simulation
    pub fn get_state(&self) -> Result<Observation> {
        if self.phase == Phase::NotStarted {
            return Err(JumpError::InvalidState("get_state called before reset"));
        }
        Ok(self.frame.clone())
    }

    /// Compact observation: `[agent_x - obstacle_x, agent height above floor]`
    /// relative to the first obstacle
    pub fn coordinates(&self) -> Result<[i32; 2]> {
        let state = self
            .state
            .as_ref()
            .ok_or(JumpError::InvalidState("coordinates requested before reset"))?;
        Ok([
            state.agent.x - state.obstacles.first().x,
            state.agent.vertical_position,
        ])
    }
}

/// Check a placement against `config` and build its obstacles
fn build_obstacles(config: &EpisodeConfig, placement: &Placement) -> Result<Obstacles> {
    config.check_floor_height(placement.floor_height)?;
    Ok(match placement.obstacle {
        ObstaclePosition::Single(x) => {
            config.check_obstacle_position(x)?;
            Obstacles::Single(Obstacle::new(x, config.obstacle_size))
        }
        ObstaclePosition::Pair(a, b) => {
            config.check_obstacle_position(a)?;
            config.check_obstacle_position(b)?;
            Obstacles::Pair(
                Obstacle::new(a.min(b), config.obstacle_size),
                Obstacle::new(a.max(b), config.obstacle_size),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardConfig;
    use crate::consts::{AGENT_WIDTH, SCREEN_WIDTH};

    fn env(config: EpisodeConfig) -> JumpTaskEnv {
        JumpTaskEnv::new(config).unwrap()
    }

    /// Right everywhere except a single Jump when the agent is at `jump_x`
    fn run_single_jump(env: &mut JumpTaskEnv, jump_x: i32) -> (Outcome, i32) {
        let mut total = 0;
        loop {
            let state = env.state().unwrap();
            let action = if state.agent.is_grounded() && state.agent.x == jump_x {
                Action::Jump
            } else {
                Action::Right
            };
            let result = env.step(action).unwrap();
            total += result.reward;
            if result.terminal {
                return (result.outcome.unwrap(), total);
            }
        }
    }

    #[test]
    fn test_step_before_reset_is_invalid_state() {
        let mut env = env(EpisodeConfig::default());
        assert_eq!(env.phase(), Phase::NotStarted);
        assert!(matches!(
            env.step(Action::Right),
            Err(JumpError::InvalidState(_))
        ));
        assert!(matches!(env.get_state(), Err(JumpError::InvalidState(_))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EpisodeConfig {
            agent_h: -3,
            ..Default::default()
        };
        assert!(matches!(
            JumpTaskEnv::new(config),
            Err(JumpError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_reset_rejects_out_of_bounds_placement() {
        let mut env = env(EpisodeConfig::default());
        assert!(env.reset(Placement::single(60, 10)).is_err());
        assert!(env.reset(Placement::single(20, 51)).is_err());
        assert!(env.reset(Placement::pair(20, -1, 10)).is_err());
        assert_eq!(env.phase(), Phase::NotStarted);
    }

    #[test]
    fn test_collision_at_start_position() {
        // Obstacle at x=0 overlaps the agent's start: the first step collides
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(0, 10)).unwrap();
        let mut total = 0;
        let mut steps = 0;
        for _ in 0..60 {
            let result = env.step(Action::Right).unwrap();
            total += result.reward;
            steps += 1;
            if result.terminal {
                assert_eq!(result.outcome, Some(Outcome::Collision));
                break;
            }
        }
        assert_eq!(steps, 1);
        assert_eq!(total, env.state().unwrap().agent.x);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_walking_into_obstacle() {
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(30, 10)).unwrap();
        let mut total = 0;
        let mut last = None;
        for _ in 0..60 {
            let result = env.step(Action::Right).unwrap();
            total += result.reward;
            if result.terminal {
                last = result.outcome;
                break;
            }
        }
        assert_eq!(last, Some(Outcome::Collision));
        // Right edge at 31 first overlaps the obstacle's left edge at 30
        assert_eq!(env.state().unwrap().agent.x, 26);
        assert_eq!(total, 26);
    }

    #[test]
    fn test_step_after_terminal_is_invalid_state() {
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(0, 10)).unwrap();
        assert!(env.step(Action::Right).unwrap().terminal);
        assert_eq!(env.phase(), Phase::Terminated);
        assert!(matches!(
            env.step(Action::Right),
            Err(JumpError::InvalidState(_))
        ));
        // Observation still available, and reset recovers
        assert!(env.get_state().is_ok());
        env.reset(Placement::single(30, 10)).unwrap();
        assert_eq!(env.phase(), Phase::Running);
        assert_eq!(env.state().unwrap().step_count, 0);
    }

    #[test]
    fn test_left_rejected_unless_enabled() {
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(30, 10)).unwrap();
        assert!(matches!(
            env.step(Action::Left),
            Err(JumpError::InvalidAction(_))
        ));
        assert!(matches!(env.step_index(2), Err(JumpError::InvalidAction(_))));
        assert!(matches!(env.step_index(7), Err(JumpError::InvalidAction(_))));
        assert_eq!(env.legal_actions(), vec![Action::Right, Action::Jump]);
        // Rejected actions do not consume a step
        assert_eq!(env.state().unwrap().step_count, 0);
    }

    #[test]
    fn test_left_moves_back_with_zero_reward() {
        let config = EpisodeConfig {
            with_left_action: true,
            ..Default::default()
        };
        let mut env = env(config);
        env.reset(Placement::single(30, 10)).unwrap();
        assert_eq!(env.legal_actions().len(), 3);
        assert_eq!(env.step(Action::Right).unwrap().reward, 1);
        let result = env.step(Action::Left).unwrap();
        assert_eq!(result.reward, 0);
        assert_eq!(env.state().unwrap().agent.x, 0);
        // Blocked at the wall
        assert_eq!(env.step_index(2).unwrap().reward, 0);
        assert_eq!(env.state().unwrap().agent.x, 0);
    }

    #[test]
    fn test_single_correct_jump_clears_training_settings() {
        for &x in &ALLOWED_OBSTACLE_X {
            for &floor in &ALLOWED_OBSTACLE_Y {
                let mut env = env(EpisodeConfig::default());
                env.reset(Placement::single(x, floor)).unwrap();
                let (outcome, total) = run_single_jump(&mut env, x - 14);
                assert_eq!(outcome, Outcome::Success, "obstacle {x}, floor {floor}");
                assert_eq!(total, SCREEN_WIDTH - AGENT_WIDTH);
            }
        }
    }

    #[test]
    fn test_only_one_take_off_position_clears() {
        for &x in &ALLOWED_OBSTACLE_X {
            let clearing: Vec<i32> = (0..x)
                .filter(|&jump_x| {
                    let mut env = env(EpisodeConfig::default());
                    env.reset(Placement::single(x, 10)).unwrap();
                    run_single_jump(&mut env, jump_x).0 == Outcome::Success
                })
                .collect();
            assert_eq!(clearing, vec![x - 14], "obstacle at {x}");
        }
    }

    #[test]
    fn test_finish_jump_is_atomic() {
        let config = EpisodeConfig {
            finish_jump: true,
            ..Default::default()
        };
        let mut env = env(config);
        env.reset(Placement::single(40, 10)).unwrap();
        for _ in 0..26 {
            env.step(Action::Right).unwrap();
        }
        let result = env.step(Action::Jump).unwrap();
        // Goal reached mid-air at x = 55, three ticks before landing
        assert!(result.terminal);
        assert_eq!(result.outcome, Some(Outcome::Success));
        assert_eq!(result.reward, 29);
        assert_eq!(env.state().unwrap().step_count, 27);
    }

    #[test]
    fn test_finish_jump_lands_in_one_step() {
        let config = EpisodeConfig {
            finish_jump: true,
            ..Default::default()
        };
        let mut env = env(config);
        env.reset(Placement::single(20, 10)).unwrap();
        for _ in 0..6 {
            env.step(Action::Right).unwrap();
        }
        let result = env.step(Action::Jump).unwrap();
        assert!(!result.terminal);
        assert_eq!(result.reward, 32);
        let agent = &env.state().unwrap().agent;
        assert!(agent.is_grounded());
        assert_eq!(agent.x, 38);
    }

    #[test]
    fn test_timeout() {
        let config = EpisodeConfig {
            max_number_of_steps: 5,
            ..Default::default()
        };
        let mut env = env(config);
        env.reset(Placement::single(40, 10)).unwrap();
        for _ in 0..4 {
            assert!(!env.step(Action::Right).unwrap().terminal);
        }
        let result = env.step(Action::Right).unwrap();
        assert!(result.terminal);
        assert_eq!(result.outcome, Some(Outcome::Timeout));
        assert_eq!(result.reward, 1);
    }

    #[test]
    fn test_paper_rewards() {
        let config = EpisodeConfig {
            rewards: RewardConfig::paper(),
            ..Default::default()
        };
        let mut env = env(config);
        env.reset(Placement::single(30, 10)).unwrap();
        let mut last = None;
        for _ in 0..60 {
            let result = env.step(Action::Right).unwrap();
            if result.terminal {
                last = Some(result);
                break;
            }
        }
        let last = last.unwrap();
        assert_eq!(last.outcome, Some(Outcome::Collision));
        assert_eq!(last.reward, -1);

        env.reset(Placement::single(30, 10)).unwrap();
        let (outcome, total) = run_single_jump(&mut env, 16);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(total, 55 + 100);
    }

    #[test]
    fn test_two_obstacles_layout() {
        let config = EpisodeConfig {
            two_obstacles: true,
            ..Default::default()
        };
        let mut env = env(config);
        env.reset_default().unwrap();
        let xs: Vec<i32> = env.state().unwrap().obstacles.iter().map(|o| o.x).collect();
        assert_eq!(xs, vec![OBSTACLE_1, OBSTACLE_2]);
        // Clear the first obstacle, then walk into the second
        let (outcome, total) = run_single_jump(&mut env, OBSTACLE_1 - 14);
        assert_eq!(outcome, Outcome::Collision);
        assert_eq!(total, 51);
    }

    #[test]
    fn test_get_state_is_idempotent() {
        let mut env = env(EpisodeConfig::default());
        let initial = env.reset(Placement::single(30, 20)).unwrap();
        let a = env.get_state().unwrap();
        let b = env.get_state().unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a, initial);

        let stepped = env.step(Action::Jump).unwrap().observation;
        assert_eq!(env.get_state().unwrap(), stepped);
        assert_ne!(stepped, initial);
    }

    #[test]
    fn test_reset_random_is_seeded() {
        let picks = |seed: u64| {
            let mut env = env(EpisodeConfig {
                seed,
                ..Default::default()
            });
            (0..20)
                .map(|_| {
                    env.reset_random().unwrap();
                    let state = env.state().unwrap();
                    (state.obstacles.first().x, state.floor_height)
                })
                .collect::<Vec<_>>()
        };
        let first = picks(42);
        assert_eq!(first, picks(42));
        for (x, floor) in &first {
            assert!(ALLOWED_OBSTACLE_X.contains(x));
            assert!(ALLOWED_OBSTACLE_Y.contains(floor));
        }
    }

    #[test]
    fn test_coordinates() {
        let mut env = env(EpisodeConfig::default());
        assert!(env.coordinates().is_err());
        env.reset(Placement::single(30, 20)).unwrap();
        assert_eq!(env.coordinates().unwrap(), [-30, 0]);
        env.step(Action::Jump).unwrap();
        assert_eq!(env.coordinates().unwrap(), [-29, 1]);
    }

    #[test]
    fn test_failed_reset_with_keeps_previous_episode() {
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(59, 10)).unwrap();
        for _ in 0..40 {
            env.step(Action::Right).unwrap();
        }
        let config = EpisodeConfig {
            screen_w: 30,
            seed: 7,
            ..Default::default()
        };
        assert!(matches!(
            env.reset_with(config, Placement::single(40, 10)),
            Err(JumpError::InvalidConfiguration(_))
        ));
        assert_eq!(env.config().screen_w, 60);
        assert_eq!(env.config().seed, 42);
        assert_eq!(env.phase(), Phase::Running);
        assert_eq!(env.get_state().unwrap().shape(), vec![60, 60]);

        let result = env.step(Action::Right).unwrap();
        assert!(!result.terminal);
        assert_eq!(result.reward, 1);
        assert_eq!(result.observation.shape(), vec![60, 60]);
        assert_eq!(env.state().unwrap().agent.x, 41);
    }

    fn color_config(obstacle_color: ObstacleColor) -> EpisodeConfig {
        EpisodeConfig {
            color_rules: true,
            obstacle_color,
            observation_mode: crate::config::ObservationMode::Rgb,
            ..Default::default()
        }
    }

    #[test]
    fn test_green_obstacle_pays_once_and_continues() {
        let mut env = env(color_config(ObstacleColor::Green));
        env.reset(Placement::single(30, 10)).unwrap();
        let mut total = 0;
        let mut touches = 0;
        for _ in 0..50 {
            let result = env.step(Action::Right).unwrap();
            assert!(!result.terminal);
            total += result.reward;
            touches += usize::from(result.collision);
        }
        assert_eq!(touches, 1);
        assert!(env.state().unwrap().already_collided);
        assert_eq!(env.state().unwrap().agent.x, 50);
        assert_eq!(total, 50 + 100);
    }

    #[test]
    fn test_green_obstacle_touched_in_the_air_pays_nothing() {
        let mut env = env(color_config(ObstacleColor::Green));
        env.reset(Placement::single(30, 10)).unwrap();
        // Taking off at 20 clips the obstacle on the way up
        let (outcome, total) = run_single_jump(&mut env, 20);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(total, SCREEN_WIDTH - AGENT_WIDTH);
        assert!(env.state().unwrap().already_collided);
    }

    #[test]
    fn test_red_obstacle_ends_episode_under_color_rules() {
        let mut env = env(color_config(ObstacleColor::Red));
        env.reset(Placement::single(30, 10)).unwrap();
        let mut last = None;
        for _ in 0..60 {
            let result = env.step(Action::Right).unwrap();
            if result.terminal {
                last = Some(result);
                break;
            }
        }
        let last = last.unwrap();
        assert_eq!(last.outcome, Some(Outcome::Collision));
        assert!(last.collision);
        assert_eq!(last.reward, 1);
        assert_eq!(env.state().unwrap().agent.x, 26);
    }

    #[test]
    fn test_reset_clears_collision_latch() {
        let mut env = env(color_config(ObstacleColor::Green));
        env.reset(Placement::single(0, 10)).unwrap();
        let first = env.step(Action::Right).unwrap();
        assert!(first.collision);
        assert_eq!(first.reward, 101);
        env.reset(Placement::single(0, 10)).unwrap();
        assert!(!env.state().unwrap().already_collided);
        assert_eq!(env.step(Action::Right).unwrap().reward, 101);
    }

    #[test]
    fn test_reset_with_new_config() {
        let mut env = env(EpisodeConfig::default());
        env.reset(Placement::single(30, 10)).unwrap();
        let config = EpisodeConfig {
            screen_w: 80,
            with_left_action: true,
            ..Default::default()
        };
        let obs = env.reset_with(config, Placement::single(70, 10)).unwrap();
        assert_eq!(obs.shape(), vec![60, 80]);
        assert_eq!(env.action_count(), 3);
        assert_eq!(env.state().unwrap().obstacles.first().x, 70);
    }
}
