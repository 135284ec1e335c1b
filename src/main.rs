use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use void_drift::config::SimulationConfig;
use void_drift::game::events::WorldEvent;
use void_drift::game::input::{Intent, IntentError, IntentSender};
use void_drift::game::snapshot::WorldSnapshot;
use void_drift::game::world::Simulation;
use void_drift::util::vec2::Vec2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Void Drift v{}", env!("CARGO_PKG_VERSION"));

    let config = SimulationConfig::load_or_default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid simulation config")?;
    info!(
        "Configuration loaded: chunk_size={}, load_distance={}, seed={}, tick_rate={}",
        config.chunk_size, config.load_distance, config.world_seed, config.tick_rate
    );

    let max_ticks: Option<u64> = std::env::var("MAX_TICKS").ok().and_then(|s| s.parse().ok());
    let snapshot_path = std::env::var("SNAPSHOT_PATH").ok();

    let mut sim = match &snapshot_path {
        Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
            let bytes = tokio::fs::read(path).await.with_context(|| format!("reading {}", path))?;
            let snapshot = WorldSnapshot::from_bytes(&bytes)?;
            info!("Resuming from {}", path);
            Simulation::restore(snapshot)?
        }
        _ => Simulation::new(config.clone()),
    };

    let tick_rate = sim.config().tick_rate;
    let dt = sim.config().tick_dt();

    // Scripted pilot standing in for a real input device
    let autopilot = tokio::spawn(autopilot(sim.sender()));

    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = sim.tick(dt);
                report(&events);

                let tick = sim.tick_count();
                if tick % (u64::from(tick_rate) * 5) == 0 {
                    let position = sim.player_position();
                    info!(
                        "tick {} | player ({:.0}, {:.0}) | score {} | {} chunks | {} loaded / {} total entities",
                        tick,
                        position.x,
                        position.y,
                        sim.score(),
                        sim.state().store.chunk_count(),
                        sim.state().loaded.len(),
                        sim.state().store.entity_count()
                    );
                }
                if sim.is_game_over() {
                    info!("Player destroyed, final score {}", sim.score());
                    break;
                }
                if max_ticks.is_some_and(|max| tick >= max) {
                    info!("Reached MAX_TICKS");
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
        }
    }

    autopilot.abort();

    if let Some(path) = snapshot_path {
        let bytes = sim.snapshot().to_bytes()?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path))?;
        info!("Saved snapshot to {} ({} bytes)", path, bytes.len());
    }

    info!("Simulation stopped after {} ticks", sim.tick_count());
    Ok(())
}

fn report(events: &[WorldEvent]) {
    for event in events {
        match event {
            WorldEvent::ScoreChanged { score, delta } => info!("+{} points (score {})", delta, score),
            WorldEvent::Docked { station } => info!("Docked at station {}", station),
            WorldEvent::Undocked { station } => info!("Left station {}", station),
            WorldEvent::ChunkGenerated { coord, content } if !content.is_empty() => {
                info!("Discovered {:?} at chunk {}", content, coord)
            }
            _ => {}
        }
    }
}

/// Fly a slow spiral outwards, shooting now and then
async fn autopilot(sender: IntentSender) {
    let mut interval = tokio::time::interval(Duration::from_millis(250));
    let mut step: u32 = 0;
    loop {
        interval.tick().await;
        step = step.wrapping_add(1);

        let heading = step as f32 * 0.05;
        let mut intents = vec![Intent::Move(Vec2::from_angle(heading)), Intent::Turn(0.5)];
        if step % 4 == 0 {
            intents.push(Intent::Shoot);
        }
        if step % 20 == 0 {
            // Boost for every other 5 second stretch
            intents.push(Intent::Boost(step % 40 == 0));
        }

        for intent in intents {
            match sender.try_send(intent) {
                Ok(()) => {}
                Err(IntentError::Full) => warn!("Intent queue full, dropping {:?}", intent),
                Err(IntentError::Disconnected) => return,
            }
        }
    }
}
