use itertools::Itertools;
use replay_sim::envs::grid_maze::GridMaze;
use replay_sim::*;
use serde_json::json;
use std::fs::File;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Sutton & Barto's Dyna maze.
const MAZE: [&str; 6] = [
    ".......#G",
    "..#....#.",
    "S.#....#.",
    "..#......",
    ".....#...",
    ".........",
];

const SIMULATIONS: u64 = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Usage: replay-sim [params.json] [outcomes.json]
    let params = match std::env::args().nth(1) {
        Some(path) => Params::from_json_file(path)?,
        None => Params::default(),
    };
    let maze = GridMaze::from_desc(&MAZE, 1.)?;
    info!(env = %maze.name(), ?params, "starting");
    debug!("layout:\n{}", maze.render());

    let variants = [
        ("prioritized_replay", params.clone()),
        ("dyna_q", params.clone().dyna_q()),
        ("q_learning", params.clone().q_learning()),
    ];

    let mut summary = serde_json::Map::new();
    let mut outcomes = serde_json::Map::new();
    for (name, params) in variants {
        let runs = (0..SIMULATIONS)
            .map(|seed| -> Result<LearnOutcome> {
                let mut env = maze.clone();
                let mut agent = ReplayAgent::new(env.n_s(), env.n_a(), params.clone())?;
                Ok(agent.learn(&mut env, seed))
            })
            .collect::<Result<Vec<_>>>()?;

        let mean_steps = (0..params.episodes)
            .map(|ep| {
                runs.iter()
                    .map(|r| r.steps_per_episode[ep] as f64)
                    .sum::<f64>()
                    / runs.len() as f64
            })
            .collect::<Vec<_>>();

        info!(
            variant = name,
            "mean steps per episode: {}",
            mean_steps.iter().map(|s| format!("{s:.1}")).join(" ")
        );
        summary.insert(name.to_string(), json!({ "mean_steps": mean_steps }));
        outcomes.insert(name.to_string(), serde_json::to_value(&runs)?);
    }

    if let Some(path) = std::env::args().nth(2) {
        serde_json::to_writer(File::create(&path)?, &outcomes)?;
        info!(%path, "wrote learning outcomes");
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
