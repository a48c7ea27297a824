//! Jumping Task entry point
//!
//! Terminal front end: interactive play, scripted runs, and the
//! generalization sweep over obstacle positions and floor heights.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use jumping_task::consts::{DOWN, LEFT, RIGHT, SLOW_MOTION_DELAY_MS, UP};
use jumping_task::input::{KeyCommand, map_key};
use jumping_task::renderer::terminal;
use jumping_task::{
    Action, EpisodeConfig, JumpTaskEnv, ObservationMode, ObstacleColor, Outcome, Placement,
    StepResult,
};

#[derive(Parser, Debug)]
#[command(name = "jumping-task", about = "Deterministic 2D jumping task for RL")]
struct Cli {
    #[command(flatten)]
    options: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play interactively: d/right, w/up, a/left (if enabled), e to exit
    Play {
        /// Start at a seeded random training setting
        #[arg(long)]
        random: bool,
    },
    /// Run a scripted action string such as "RRRRRRJRRR" (R, J, L)
    Run {
        actions: String,
        /// Start at a seeded random training setting
        #[arg(long)]
        random: bool,
    },
    /// Jump once at `obstacle_x - offset` across the generalization grid
    Sweep {
        /// Take-off distance before the obstacle
        #[arg(long, default_value_t = 14)]
        offset: i32,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Command-line overrides; unset values keep the file or default value
#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    scr_w: Option<i32>,
    #[arg(long, global = true)]
    scr_h: Option<i32>,
    #[arg(long, global = true)]
    floor_height: Option<i32>,
    #[arg(long, global = true)]
    agent_w: Option<i32>,
    #[arg(long, global = true)]
    agent_h: Option<i32>,
    #[arg(long, global = true)]
    agent_init_pos: Option<i32>,
    #[arg(long, global = true)]
    agent_speed: Option<i32>,
    #[arg(long, global = true)]
    obstacle_position: Option<i32>,
    /// Obstacle width and height
    #[arg(long, global = true, num_args = 2, value_names = ["W", "H"])]
    obstacle_size: Option<Vec<i32>>,
    /// Draw every frame in scripted runs
    #[arg(long, global = true)]
    rendering: bool,
    /// Terminal cells per pixel
    #[arg(long, global = true)]
    zoom: Option<u32>,
    /// Pause between steps
    #[arg(long, global = true)]
    slow_motion: bool,
    #[arg(long, global = true)]
    with_left_action: bool,
    #[arg(long, global = true)]
    max_number_of_steps: Option<u32>,
    #[arg(long, global = true)]
    two_obstacles: bool,
    #[arg(long, global = true)]
    finish_jump: bool,
    /// grayscale or rgb
    #[arg(long, global = true)]
    observation_mode: Option<String>,
    /// red or green
    #[arg(long, global = true)]
    obstacle_color: Option<String>,
    /// Green obstacles reward a touch instead of ending the episode
    #[arg(long, global = true)]
    color_rules: bool,
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl ConfigArgs {
    fn to_config(&self) -> anyhow::Result<EpisodeConfig> {
        let mut config = match &self.config {
            Some(path) => EpisodeConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EpisodeConfig::default(),
        };

        let overrides = [
            (self.scr_w, &mut config.screen_w),
            (self.scr_h, &mut config.screen_h),
            (self.floor_height, &mut config.floor_height),
            (self.agent_w, &mut config.agent_w),
            (self.agent_h, &mut config.agent_h),
            (self.agent_init_pos, &mut config.agent_init_pos),
            (self.agent_speed, &mut config.agent_speed),
            (self.obstacle_position, &mut config.obstacle_position),
        ];
        for (value, target) in overrides {
            if let Some(value) = value {
                *target = value;
            }
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some(steps) = self.max_number_of_steps {
            config.max_number_of_steps = steps;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        if let Some(size) = &self.obstacle_size {
            config.obstacle_size = (size[0], size[1]);
        }
        if let Some(mode) = &self.observation_mode {
            config.observation_mode = ObservationMode::from_str(mode)
                .with_context(|| format!("unknown observation mode '{mode}'"))?;
        }
        if let Some(color) = &self.obstacle_color {
            config.obstacle_color = ObstacleColor::from_str(color)
                .with_context(|| format!("unknown obstacle color '{color}'"))?;
        }
        config.rendering |= self.rendering;
        config.slow_motion |= self.slow_motion;
        config.with_left_action |= self.with_left_action;
        config.two_obstacles |= self.two_obstacles;
        config.finish_jump |= self.finish_jump;
        config.color_rules |= self.color_rules;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.options.to_config()?;
    log::info!("Jumping task starting...");

    match cli.command {
        Command::Play { random } => play(config, random),
        Command::Run { actions, random } => run_script(config, &actions, random),
        Command::Sweep { offset } => sweep(config, offset),
        Command::Config => {
            println!("{}", config.to_json());
            Ok(())
        }
    }
}

fn show(env: &JumpTaskEnv) -> anyhow::Result<()> {
    let frame = env.get_state()?;
    let mut out = io::stdout().lock();
    write!(out, "{}", terminal::draw(&frame, env.config().zoom))?;
    out.flush()?;
    Ok(())
}

fn report(env: &JumpTaskEnv, action: Action, result: &StepResult) {
    let x = env.state().map(|s| s.agent.x).unwrap_or_default();
    println!(
        "Action: {} | Agent position: {:2} | Reward: {:3} | Terminal: {}",
        action.symbol(),
        x,
        result.reward,
        result.terminal
    );
}

fn start(env: &mut JumpTaskEnv, random: bool) -> anyhow::Result<()> {
    if random {
        env.reset_random()?;
    } else {
        env.reset_default()?;
    }
    Ok(())
}

fn finish(score: i64, outcome: Option<Outcome>) {
    println!("---------------");
    if let Some(outcome) = outcome {
        println!("Outcome: {outcome:?}");
    }
    println!("Final score: {score:2}");
    println!("---------------");
}

fn pace(config: &EpisodeConfig) {
    if config.slow_motion {
        thread::sleep(Duration::from_millis(SLOW_MOTION_DELAY_MS));
    }
}

fn play(config: EpisodeConfig, random: bool) -> anyhow::Result<()> {
    let with_left = config.with_left_action;
    let mut env = JumpTaskEnv::new(config)?;
    start(&mut env, random)?;
    show(&env)?;

    let mut score = 0i64;
    let mut outcome = None;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let action = match map_key(&line?, with_left) {
            KeyCommand::Act(action) => action,
            KeyCommand::Exit => break,
            KeyCommand::Unknown => {
                println!(
                    "We did not recognize that action. Use d/w{} to move the agent or 'e' to exit.",
                    if with_left { "/a" } else { "" }
                );
                continue;
            }
        };
        let result = env.step(action)?;
        pace(env.config());
        show(&env)?;
        report(&env, action, &result);
        score += i64::from(result.reward);
        if result.terminal {
            outcome = result.outcome;
            break;
        }
    }
    finish(score, outcome);
    Ok(())
}

fn run_script(config: EpisodeConfig, actions: &str, random: bool) -> anyhow::Result<()> {
    let rendering = config.rendering;
    let mut env = JumpTaskEnv::new(config)?;
    start(&mut env, random)?;

    let mut score = 0i64;
    let mut outcome = None;
    for c in actions.chars().filter(|c| !c.is_whitespace()) {
        let Some(action) = Action::from_symbol(c) else {
            bail!("unknown action symbol '{c}', expected R, J or L");
        };
        let result = env.step(action)?;
        pace(env.config());
        if rendering {
            show(&env)?;
        }
        report(&env, action, &result);
        score += i64::from(result.reward);
        if result.terminal {
            outcome = result.outcome;
            break;
        }
    }
    finish(score, outcome);
    Ok(())
}

/// Run one episode: Right everywhere, Jump once when grounded at `jump_x`
fn single_jump_episode(env: &mut JumpTaskEnv, jump_x: i32) -> anyhow::Result<Outcome> {
    loop {
        let agent = &env.state().context("episode not started")?.agent;
        let action = if agent.is_grounded() && agent.x == jump_x {
            Action::Jump
        } else {
            Action::Right
        };
        let result = env.step(action)?;
        if let Some(outcome) = result.outcome {
            return Ok(outcome);
        }
    }
}

fn sweep(config: EpisodeConfig, offset: i32) -> anyhow::Result<()> {
    let mut env = JumpTaskEnv::new(config)?;
    let mut successes = 0;
    let mut total = 0;

    println!("floor \\ obstacle x: {LEFT}..{RIGHT}");
    for floor in (DOWN..UP).rev() {
        let mut row = String::with_capacity((RIGHT - LEFT) as usize);
        for x in LEFT..RIGHT {
            if env.reset(Placement::single(x, floor)).is_err() {
                row.push(' ');
                continue;
            }
            let outcome = single_jump_episode(&mut env, x - offset)?;
            total += 1;
            if outcome == Outcome::Success {
                successes += 1;
                row.push('.');
            } else {
                row.push('x');
            }
        }
        println!("{floor:3} {row}");
    }

    log::info!("Sweep finished: {successes}/{total} settings cleared");
    println!("Cleared {successes} of {total} settings with take-off offset {offset}");
    Ok(())
}
