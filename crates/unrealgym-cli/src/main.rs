//! unrealgym CLI
//!
//! Inspect spaces and drive environments against the scripted scene.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use unrealgym::env::PEAK_COLLISIONS;
use unrealgym::prelude::*;
use unrealgym_envs::{demo_setting, MockUnreal};

#[derive(Parser)]
#[command(name = "unrealgym")]
#[command(version, about = "unrealgym - multi-agent environments over Unreal Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Setting file (JSON); the built-in demo map when omitted
    #[arg(long)]
    setting: Option<PathBuf>,

    /// Walkers in the demo map
    #[arg(long, default_value = "2")]
    players: usize,

    /// Observation mode (Color, Depth, Mask, Rgbd, CG, MaskDepth, ColorMask, Pose)
    #[arg(long, default_value = "Color")]
    mode: String,

    /// Action type (Discrete, Continuous, Mixed)
    #[arg(long, default_value = "Discrete")]
    action_type: String,

    /// Frame width
    #[arg(long, default_value = "160")]
    width: usize,

    /// Frame height
    #[arg(long, default_value = "120")]
    height: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every agent's action and observation space
    Spaces {
        #[command(flatten)]
        scene: SceneArgs,
    },

    /// Run random actions and report per-step geometry
    Demo {
        #[command(flatten)]
        scene: SceneArgs,

        /// Number of steps
        #[arg(long, default_value = "10")]
        steps: usize,

        /// Reset every this many steps
        #[arg(long, default_value = "50")]
        episode_length: usize,

        /// Also append episode metrics to this JSON-lines file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },

    /// Resize the roster and print the resulting cameras
    Population {
        #[command(flatten)]
        scene: SceneArgs,

        /// Target number of agents
        #[arg(long)]
        target: usize,
    },

    /// List observation modes
    Modes,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Spaces { scene } => spaces(&scene)?,
        Commands::Demo {
            scene,
            steps,
            episode_length,
            metrics,
        } => demo(&scene, steps, episode_length, metrics.as_deref())?,
        Commands::Population { scene, target } => population(&scene, target)?,
        Commands::Modes => list_modes(),
    }

    Ok(())
}

fn build_env(scene: &SceneArgs) -> Result<UnrealEnv<MockUnreal>> {
    let setting = match &scene.setting {
        Some(path) => EnvSetting::from_json_file(path)?,
        None => demo_setting(scene.players),
    };
    let config = EnvConfig::default()
        .with_observation_mode(scene.mode.parse()?)
        .with_action_type(scene.action_type.parse()?)
        .with_resolution(scene.width, scene.height)
        .with_seed(scene.seed);

    tracing::info!(map = %setting.env_name, agents = setting.agents.len(), "building environment");
    let service = MockUnreal::from_setting(&setting, config.resolution);
    Ok(UnrealEnv::new(service, setting, config)?)
}

fn print_roster(env: &UnrealEnv<MockUnreal>) {
    let registry = env.registry();
    for (index, record) in registry.records().iter().enumerate() {
        println!(
            "  [{}] {:<16} {:<8} cam={:<3} action={:<10} obs={:?}",
            index,
            record.name(),
            record.config.category.to_string(),
            record.cam_id(),
            record.action_space.kind(),
            record.observation_space.shape()
        );
    }
}

fn spaces(scene: &SceneArgs) -> Result<()> {
    let mut env = build_env(scene)?;
    env.reset()?;

    println!(
        "Map {} ({} agents, {} observations)",
        env.setting().env_name,
        env.num_agents(),
        env.config().observation_mode
    );
    print_roster(&env);
    env.close()?;
    Ok(())
}

fn demo(scene: &SceneArgs, steps: usize, episode_length: usize, metrics: Option<&Path>) -> Result<()> {
    let env = build_env(scene)?;
    let mut logger = CompositeLogger::new(vec![Box::new(ConsoleLogger::new())]);
    if let Some(path) = metrics {
        logger.add(Box::new(JsonlLogger::create(path)?));
    }
    let mut env = EpisodeStats::with_logger(env, Box::new(logger));
    let mut rng = StdRng::seed_from_u64(scene.seed);

    let obs = env.reset()?;
    println!("Reset: observation shape {:?}", obs.shape());

    for step in 0..steps {
        if episode_length > 0 && step > 0 && step % episode_length == 0 {
            env.reset()?;
            println!("Episode boundary at step {}", step);
        }

        let actions: Vec<Option<AgentAction>> = env
            .action_spaces()
            .into_iter()
            .map(|space| Some(space.sample(&mut rng)))
            .collect();
        let out = env.step(&actions)?;

        let collisions = out
            .info
            .collision
            .indexed_iter()
            .filter(|((j, i), v)| j != i && **v > 0.0)
            .count();
        println!(
            "Step {}: collisions={}, mean_distance={:.1}",
            out.info.steps, collisions, out.info.mean_distance
        );
    }

    let summary = env.current();
    println!(
        "Episode so far: length={}, collisions={}, peak={}",
        summary.get("episode_length").unwrap_or(0.0),
        summary.get("episode_collisions").unwrap_or(0.0),
        summary.get(PEAK_COLLISIONS).unwrap_or(0.0)
    );
    env.close()?;
    Ok(())
}

fn population(scene: &SceneArgs, target: usize) -> Result<()> {
    let mut env = build_env(scene)?;
    env.reset()?;
    println!("Before: {} agents", env.num_agents());
    print_roster(&env);

    env.set_population(target)?;
    println!("After: {} agents", env.num_agents());
    print_roster(&env);

    let obs = env.reset()?;
    println!("Reset: observation shape {:?}", obs.shape());
    env.close()?;
    Ok(())
}

fn list_modes() {
    println!("Observation modes:");
    println!();
    for mode in ObservationMode::ALL {
        match mode.channels() {
            Some(channels) => println!("  {:<10} {} channel image", mode.to_string(), channels),
            None => println!("  {:<10} 6-float pose per agent", mode.to_string()),
        }
    }
}
