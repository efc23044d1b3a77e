//! Voidreign - arcade boss-rush simulation core with a headless demo driver

mod arena;
mod boss;
mod combat;
mod combo;
mod config;
mod drops;
mod minion;
mod particles;
mod player;
mod projectile;
mod score;
mod session;
mod visuals;

use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec2;
use input::{Button, InputState};

use config::GameConfig;
use session::{GameSession, SessionPhase};

/// Seconds of sim time between status lines.
const STATUS_INTERVAL: f64 = 5.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════╗");
    println!("║                    VOIDREIGN                     ║");
    println!("╠══════════════════════════════════════════════════╣");
    println!("║  Headless demo: a scripted pilot fights the boss ║");
    println!("║  at a fixed 60 Hz simulation rate, driven by     ║");
    println!("║  variable wall-clock frame deltas.               ║");
    println!("╚══════════════════════════════════════════════════╝");

    let config = GameConfig::load();
    log::info!(
        "Starting Voidreign: {} Hz sim, {} projectile cap, {} particle slots",
        config.fixed_hz,
        config.max_projectiles,
        config.particle_capacity
    );

    let demo_seconds = f64::from(config.demo_seconds);
    let mut input = InputState::new();
    let mut session = GameSession::new(config, "profile.ron", 0xC0FF_EE00);

    // The scripted pilot holds the trigger the entire run.
    input.process_button(Button::Fire, true);

    let mut last = Instant::now();
    let mut next_status = STATUS_INTERVAL;
    let mut total_steps: u64 = 0;
    let mut uploads: u64 = 0;

    loop {
        // Pace the driver near a display refresh without depending on one.
        std::thread::sleep(Duration::from_millis(8));
        let now = Instant::now();
        let wall_dt = (now - last).as_secs_f32();
        last = now;

        input.begin_frame();
        // Circle-strafe so radial bursts sweep past instead of landing.
        let t = session.now();
        input.set_move_axis(Vec2::new((t * 0.9).cos() as f32, (t * 0.9).sin() as f32));

        let report = session.advance(wall_dt, input.snapshot());
        total_steps += u64::from(report.steps);
        if session.take_particle_upload() {
            // A renderer would re-upload particle instance buffers here.
            uploads += 1;
        }

        if session.now() >= next_status {
            next_status += STATUS_INTERVAL;
            log::info!(
                "t={:5.1}s score={:6} x{} boss={:3.0}% phase={} hp={:3.0}% shots={:3} minions={:2} drops={:2} particles={:3}",
                session.now(),
                session.score(),
                session.multiplier(),
                session.boss_health_fraction() * 100.0,
                session.boss_phase(),
                session.player_health_fraction() * 100.0,
                session.active_projectiles(),
                session.alive_minions(),
                session.active_drops(),
                session.active_particles(),
            );
        }

        match session.phase() {
            SessionPhase::Victory => {
                log::info!("VICTORY in {:.1}s", session.now());
                break;
            }
            SessionPhase::Defeat => {
                log::info!("DEFEAT at {:.1}s", session.now());
                break;
            }
            SessionPhase::Playing | SessionPhase::Paused => {}
        }
        if session.now() >= demo_seconds {
            log::info!("Demo window elapsed");
            break;
        }
    }

    log::info!(
        "Final score {} (high score {}), {} fixed steps, {} buffer uploads",
        session.score(),
        session.high_score(),
        total_steps,
        uploads
    );
    Ok(())
}
