mod autopilot;
mod clock;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ledgerun_platformer::config::PlatformerConfig;
use ledgerun_platformer::encounter::EncounterPhase;
use ledgerun_platformer::physics::Animation;
use ledgerun_platformer::{Platformer, RunStats};

use autopilot::Autopilot;
use clock::FrameClock;

/// Host settings read from the environment.
#[derive(Debug, Clone)]
struct SimOptions {
    ticks: u64,
    realtime: bool,
    tick_rate_hz: f32,
}

impl SimOptions {
    fn from_env(cfg: &PlatformerConfig) -> Self {
        let ticks = std::env::var("LEDGERUN_TICKS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1800);
        let realtime = std::env::var("LEDGERUN_REALTIME")
            .map(|v| v != "0")
            .unwrap_or(true);
        let tick_rate_hz = std::env::var("LEDGERUN_TICK_RATE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(cfg.physics.fps);
        Self {
            ticks,
            realtime,
            tick_rate_hz,
        }
    }
}

/// Printed as JSON when the run ends.
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    skipped_frames: u64,
    player_x: f32,
    player_y: f32,
    health: f32,
    animation: Animation,
    live_blocks: usize,
    generated_sections: usize,
    live_monsters: usize,
    encounter: EncounterPhase,
    boss_countdown: f32,
    stats: RunStats,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = PlatformerConfig::load();
    let opts = SimOptions::from_env(&cfg);
    tracing::info!(
        seed = cfg.generator.seed,
        ticks = opts.ticks,
        realtime = opts.realtime,
        "Ledgerun simulation starting"
    );

    let mut game = Platformer::new(cfg);
    let mut pilot = Autopilot::new();
    let mut clock = FrameClock::new(opts.tick_rate_hz, opts.realtime);
    let dt = clock.dt();

    for _ in 0..opts.ticks {
        clock.wait();
        let input = pilot.next_input(game.player());
        game.apply_input(&input);
        for event in game.update(dt) {
            tracing::trace!(?event, "sim event");
        }
    }

    let player = game.player();
    let summary = RunSummary {
        seed: game.generator().seed(),
        ticks: game.stats().ticks,
        skipped_frames: clock.skipped(),
        player_x: player.rect.x,
        player_y: player.rect.y,
        health: player.health,
        animation: game.animation(),
        live_blocks: game.world().len(),
        generated_sections: game.generator().generated_sections().count(),
        live_monsters: game.actors().len(),
        encounter: game.encounter().phase(),
        boss_countdown: game.encounter().remaining(),
        stats: game.stats().clone(),
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to encode run summary: {e}"),
    }
}
