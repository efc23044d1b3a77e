//! The game session: one boss fight from first step to terminal state.
//!
//! Owns every piece of simulation state — clock, task queue, visual pools,
//! particle buffer, entity collections, combatants — and is the only thing
//! that mutates any of it. The render callback hands `advance` a wall
//! delta and an input snapshot; everything else happens inside the fixed
//! steps budgeted by the clock. All deferred work flows through the single
//! task queue, which is cancelled en masse on pause, restart or a terminal
//! transition so a stale callback can never touch torn-down state.

use std::path::PathBuf;

use engine_core::{CancelSource, Lifetime, SimClock, TaskQueue, Vec3, Vec4, World};
use input::InputSnapshot;
use rand::prelude::*;

use crate::arena::Arena;
use crate::boss::{Boss, EVOLVE_STAGE_DELAY, EVOLVE_TOTAL_DELAY};
use crate::combat::{self, Strike};
use crate::combo::ComboTracker;
use crate::config::GameConfig;
use crate::drops::{DropKind, DropSet, ItemDrop, DROP_LIFETIME};
use crate::minion::{self, MinionSpawner};
use crate::particles::{EmitterParams, ParticleBuffer};
use crate::player::Player;
use crate::projectile::{Owner, Projectile, ProjectileSet, ShotRequest};
use crate::score::ScoreBoard;
use crate::visuals::{VisualHandle, VisualKind, VisualPools};

const PLAYER_SHOT_SPEED: f32 = 22.0;
const PROJECTILE_LIFETIME: f32 = 6.0;
const PICKUP_RADIUS: f32 = 1.6;
/// Chance that a scoring kill leaves a pickup behind.
const DROP_CHANCE: f64 = 0.15;
const HIT_BURST_COUNT: usize = 12;
/// Seconds a pooled hit-flash visual stays checked out.
const FLASH_LIFETIME: f32 = 0.3;

const BOSS_HIT_COLOR: Vec4 = Vec4::new(1.0, 0.7, 0.2, 1.0);
const MINION_HIT_COLOR: Vec4 = Vec4::new(0.9, 0.3, 0.3, 1.0);
const PLAYER_HIT_COLOR: Vec4 = Vec4::new(0.4, 0.7, 1.0, 1.0);
const EVOLVE_COLOR: Vec4 = Vec4::new(0.8, 0.2, 1.0, 1.0);
const COMBO_FADE_COLOR: Vec4 = Vec4::new(0.6, 0.6, 0.6, 0.8);

/// Where the session is in its lifecycle. Victory and Defeat are ordinary
/// outcomes, not errors; restart leaves either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    Paused,
    Victory,
    Defeat,
}

/// What one `advance` call did, for the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    /// Fixed steps executed this frame.
    pub steps: u32,
    /// Interpolation factor for blending the last two simulation states.
    pub alpha: f32,
}

/// Pooled hit-flash visuals with a short checkout lifetime. Kept in a
/// plain collection rather than behind deferred tasks so teardown can
/// always hand every handle back to its pool.
#[derive(Default)]
struct FlashSet {
    live: Vec<(Lifetime, VisualHandle)>,
}

impl FlashSet {
    fn spawn(&mut self, pools: &mut VisualPools) {
        let visual = pools.acquire(VisualKind::Burst);
        self.live.push((Lifetime::new(FLASH_LIFETIME), visual));
    }

    fn update(&mut self, dt: f32, pools: &mut VisualPools) {
        let mut i = 0;
        while i < self.live.len() {
            if self.live[i].0.update(dt) {
                let (_, visual) = self.live.swap_remove(i);
                pools.release(visual);
            } else {
                i += 1;
            }
        }
    }

    fn dispose_all(&mut self, pools: &mut VisualPools) {
        for (_, visual) in self.live.drain(..) {
            pools.release(visual);
        }
    }
}

pub struct GameSession {
    config: GameConfig,
    arena: Arena,
    clock: SimClock,
    tasks: TaskQueue<GameSession>,
    pools: VisualPools,
    particles: ParticleBuffer,
    projectiles: ProjectileSet,
    drops: DropSet,
    flashes: FlashSet,
    player: Player,
    boss: Boss,
    minions: World,
    spawner: MinionSpawner,
    combo: ComboTracker,
    score: ScoreBoard,
    phase: SessionPhase,
    rng: StdRng,
    /// Cancellation for session-wide deferred effects; replaced wholesale
    /// on teardown.
    effects: CancelSource,
    /// Reused per-step scratch so firing never allocates.
    shot_buf: Vec<ShotRequest>,
}

impl GameSession {
    pub fn new(config: GameConfig, profile_path: impl Into<PathBuf>, seed: u64) -> Self {
        let arena = Arena::new(config.arena_shape, config.floor_y, config.ceiling_y);
        let mut pools = VisualPools::new(
            config.max_projectiles + 8,
            32,
            config.max_drops + 16,
        );
        pools.warm();

        Self {
            arena,
            clock: SimClock::new(
                config.fixed_step(),
                config.max_frame_delta,
                config.max_steps_per_frame,
            ),
            tasks: TaskQueue::new(),
            pools,
            particles: ParticleBuffer::new(config.particle_capacity, seed ^ 0x9e37_79b9),
            projectiles: ProjectileSet::new(config.max_projectiles, config.max_projectiles_per_owner),
            drops: DropSet::new(config.max_drops),
            flashes: FlashSet::default(),
            player: Player::new(player_spawn(&arena), config.player_health),
            boss: Boss::new(config.boss_health),
            minions: World::new(),
            spawner: MinionSpawner::new(config.max_minions, seed.wrapping_add(1)),
            combo: ComboTracker::new(config.combo_window),
            score: ScoreBoard::load(profile_path),
            phase: SessionPhase::Playing,
            rng: StdRng::seed_from_u64(seed),
            effects: CancelSource::new(),
            shot_buf: Vec::with_capacity(64),
            config,
        }
    }

    /// Feed one frame's wall delta and the frame's input snapshot. Every
    /// budgeted fixed step of this call sees the same snapshot.
    pub fn advance(&mut self, wall_dt: f32, snap: InputSnapshot) -> FrameReport {
        if snap.restart_pressed {
            self.restart();
        } else if snap.pause_pressed {
            match self.phase {
                SessionPhase::Playing => self.pause(),
                SessionPhase::Paused => self.resume(),
                _ => {}
            }
        }

        if self.phase != SessionPhase::Playing {
            return FrameReport {
                steps: 0,
                alpha: self.clock.accumulator() / self.clock.fixed_step(),
            };
        }

        let batch = self.clock.advance(wall_dt);
        for _ in 0..batch.steps {
            self.clock.step();
            self.fixed_step(&snap, batch.fixed_step);
            if self.phase != SessionPhase::Playing {
                break;
            }
        }
        FrameReport {
            steps: batch.steps,
            alpha: batch.alpha,
        }
    }

    fn fixed_step(&mut self, snap: &InputSnapshot, dt: f32) {
        let now = self.clock.now();

        // Work deferred by earlier steps runs before this step mutates
        // anything, so it always sees a settled world.
        let due = self.tasks.drain_due(now);
        for task in due {
            task.run(self);
        }

        self.player.update(snap, dt, &self.arena);
        if snap.fire_held && !self.boss.is_defeated() && self.player.try_fire() {
            let dir = (self.boss.position - self.player.position).normalize_or_zero();
            if dir != Vec3::ZERO {
                self.shot_buf.push(ShotRequest {
                    position: self.player.position + dir * 0.8,
                    velocity: dir * PLAYER_SHOT_SPEED,
                    damage: self.player.damage,
                    owner: Owner::Player,
                });
            }
        }

        if self.boss.ready_to_evolve() {
            self.stage_evolution(now);
        }
        self.boss.update(dt, self.player.position, &mut self.shot_buf);

        self.spawner
            .update(&mut self.minions, dt, &self.arena, self.boss.phase());
        minion::update_minions(
            &mut self.minions,
            dt,
            self.player.position,
            &self.arena,
            &mut self.shot_buf,
        );

        // Admit this step's shots through the caps.
        for i in 0..self.shot_buf.len() {
            let shot = self.shot_buf[i];
            self.admit_shot(shot);
        }
        self.shot_buf.clear();

        self.projectiles.update(dt, &self.arena, &mut self.pools);

        let strikes = combat::resolve(
            &mut self.projectiles,
            &mut self.pools,
            &mut self.player,
            Some(&mut self.boss),
            &mut self.minions,
            &mut self.combo,
            &mut self.score,
            now,
        );
        for strike in strikes {
            self.queue_strike_feedback(strike);
        }
        minion::reap_defeated(&mut self.minions);

        let collected = self
            .drops
            .update(dt, self.player.position, PICKUP_RADIUS, &mut self.pools);
        for kind in collected {
            if kind == DropKind::Bounty {
                let points = self.score.award(kind.value() as u32, self.combo.multiplier());
                log::debug!("bounty collected for {points}");
            }
            self.player.apply_drop(kind);
        }

        if self.combo.tick(now) {
            let at = self.player.position;
            let token = self.effects.token();
            self.tasks.defer(token, move |s| {
                let now = s.clock.now();
                s.particles
                    .emit_burst(&burst_params(at, COMBO_FADE_COLOR), 6, now);
            });
        }

        // The boss trails engine particles continuously; bursts come in
        // through the deferred feedback tasks.
        if !self.boss.is_defeated() {
            let trail = trail_params(self.boss.position);
            self.particles.update_emission(&trail, dt, now);
        }
        self.particles.update(dt, now);
        self.flashes.update(dt, &mut self.pools);

        if self.boss.is_defeated() {
            self.enter_victory();
        } else if !self.player.is_alive() {
            self.enter_defeat();
        }
    }

    fn admit_shot(&mut self, shot: ShotRequest) {
        let projectile = Projectile {
            position: shot.position,
            velocity: shot.velocity,
            damage: shot.damage,
            owner: shot.owner,
            lifetime: Lifetime::new(PROJECTILE_LIFETIME),
            visual: self.pools.acquire(VisualKind::Projectile),
        };
        self.projectiles.try_spawn(projectile, &mut self.pools);
    }

    /// Queue the non-critical fallout of a hit for the next drain: the
    /// physics step that detected the hit never pays for feedback work.
    fn queue_strike_feedback(&mut self, strike: Strike) {
        let token = self.effects.token();
        match strike {
            Strike::Boss { position, .. } => {
                self.tasks
                    .defer(token, move |s| s.spawn_hit_burst(position, BOSS_HIT_COLOR));
                self.maybe_queue_drop(position);
            }
            Strike::Minion { position, defeated } => {
                self.tasks
                    .defer(token, move |s| s.spawn_hit_burst(position, MINION_HIT_COLOR));
                if defeated {
                    self.maybe_queue_drop(position);
                }
            }
            Strike::Player { position, .. } => {
                self.tasks
                    .defer(token, move |s| s.spawn_hit_burst(position, PLAYER_HIT_COLOR));
            }
        }
    }

    fn spawn_hit_burst(&mut self, position: Vec3, color: Vec4) {
        let now = self.clock.now();
        self.particles
            .emit_burst(&burst_params(position, color), HIT_BURST_COUNT, now);
        self.flashes.spawn(&mut self.pools);
    }

    /// Roll the pickup chance and, on success, queue the spawn for the
    /// next drain.
    fn maybe_queue_drop(&mut self, position: Vec3) {
        if !self.rng.gen_bool(DROP_CHANCE) {
            return;
        }
        let kind = match self.rng.gen_range(0..4u8) {
            0 => DropKind::Repair,
            1 => DropKind::RapidFire,
            2 => DropKind::Shield,
            _ => DropKind::Bounty,
        };
        let token = self.effects.token();
        self.tasks.defer(token, move |s| s.spawn_drop(kind, position));
    }

    fn spawn_drop(&mut self, kind: DropKind, position: Vec3) {
        let floor = Vec3::new(position.x, self.arena.floor_y(), position.z);
        let drop = ItemDrop {
            kind,
            position: self.arena.clamp(floor),
            lifetime: Lifetime::new(DROP_LIFETIME),
            visual: self.pools.acquire(VisualKind::Effect),
        };
        self.drops.spawn(drop, &mut self.pools);
        log::debug!("{kind:?} dropped");
    }

    /// Begin the boss's staged evolution: the flourish and the stat commit
    /// are delayed tasks under the boss's cancel source, so teardown mid-
    /// sequence cannot leave a half-evolved boss behind.
    fn stage_evolution(&mut self, now: f64) {
        let token = self.boss.begin_evolution();
        self.tasks.schedule(now + EVOLVE_STAGE_DELAY, token.clone(), |s| {
            let position = s.boss.position;
            s.spawn_hit_burst(position, EVOLVE_COLOR);
        });
        self.tasks.schedule(now + EVOLVE_TOTAL_DELAY, token, |s| {
            s.boss.complete_evolution();
            log::info!("boss reached phase {}", s.boss.phase());
        });
    }

    /// Drop every queued task and settle anything mid-sequence. Shared by
    /// pause, restart and the terminal transitions.
    fn cancel_deferred(&mut self) {
        self.tasks.cancel_all();
        self.effects.cancel();
        self.effects = CancelSource::new();
        self.boss.cancel_pending();
        self.boss.settle_evolution();
    }

    pub fn pause(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.phase = SessionPhase::Paused;
        self.cancel_deferred();
        log::info!("session paused");
    }

    pub fn resume(&mut self) {
        if self.phase != SessionPhase::Paused {
            return;
        }
        self.phase = SessionPhase::Playing;
        log::info!("session resumed");
    }

    /// Tear the fight down and start over. Every live entity goes back
    /// through its disposal contract; the high score survives.
    pub fn restart(&mut self) {
        self.cancel_deferred();
        self.projectiles.dispose_all(&mut self.pools);
        self.drops.dispose_all(&mut self.pools);
        self.flashes.dispose_all(&mut self.pools);
        self.particles.clear();
        self.minions.clear();
        self.score.reset();
        self.combo.reset();
        self.player = Player::new(player_spawn(&self.arena), self.config.player_health);
        self.boss = Boss::new(self.config.boss_health);
        self.spawner = MinionSpawner::new(self.config.max_minions, self.rng.gen());
        self.clock = SimClock::new(
            self.config.fixed_step(),
            self.config.max_frame_delta,
            self.config.max_steps_per_frame,
        );
        self.shot_buf.clear();
        self.phase = SessionPhase::Playing;
        log::info!("session restarted");
    }

    fn enter_victory(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.phase = SessionPhase::Victory;
        self.cancel_deferred();
        self.score.commit();
        log::info!("boss defeated, final score {}", self.score.score());
    }

    fn enter_defeat(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.phase = SessionPhase::Defeat;
        self.cancel_deferred();
        self.score.commit();
        log::info!("player defeated, final score {}", self.score.score());
    }

    // ── Read-side accessors for the presentation layer ──────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Monotonic simulation time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn score(&self) -> u64 {
        self.score.score()
    }

    pub fn high_score(&self) -> u64 {
        self.score.high_score()
    }

    pub fn multiplier(&self) -> u32 {
        self.combo.multiplier()
    }

    pub fn boss_phase(&self) -> u32 {
        self.boss.phase()
    }

    pub fn boss_health_fraction(&self) -> f32 {
        self.boss.health.fraction()
    }

    pub fn player_health_fraction(&self) -> f32 {
        self.player.health.fraction()
    }

    pub fn active_projectiles(&self) -> usize {
        self.projectiles.active()
    }

    pub fn active_projectiles_for(&self, owner: Owner) -> usize {
        self.projectiles.active_for(owner)
    }

    pub fn active_drops(&self) -> usize {
        self.drops.active()
    }

    pub fn active_particles(&self) -> usize {
        self.particles.active_count()
    }

    pub fn alive_minions(&self) -> usize {
        minion::alive_count(&self.minions)
    }

    /// True when the particle buffer reached a decimated upload point; the
    /// presentation layer re-uploads its instance data then, not per tick.
    pub fn take_particle_upload(&mut self) -> bool {
        self.particles.take_upload_notification()
    }
}

fn player_spawn(arena: &Arena) -> Vec3 {
    arena.clamp(Vec3::new(0.0, arena.floor_y() + 1.0, -10.0))
}

fn burst_params(origin: Vec3, color: Vec4) -> EmitterParams {
    EmitterParams {
        origin,
        spread: Vec3::splat(0.3),
        base_velocity: Vec3::new(0.0, 2.5, 0.0),
        velocity_variance: Vec3::splat(3.0),
        acceleration: Vec3::new(0.0, -6.0, 0.0),
        base_color: color,
        color_variance: Vec3::splat(0.08),
        max_size: 0.5,
        emission_rate: 0.0,
        lifetime: 0.7,
    }
}

fn trail_params(origin: Vec3) -> EmitterParams {
    EmitterParams {
        origin,
        spread: Vec3::new(0.8, 0.2, 0.8),
        base_velocity: Vec3::new(0.0, -1.0, 0.0),
        velocity_variance: Vec3::splat(0.4),
        acceleration: Vec3::ZERO,
        base_color: Vec4::new(0.5, 0.3, 0.9, 0.6),
        color_variance: Vec3::splat(0.05),
        max_size: 0.35,
        emission_rate: 24.0,
        lifetime: 1.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaShape;

    fn profile(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "voidreign-session-{}-{}.ron",
            name,
            std::process::id()
        ))
    }

    fn config() -> GameConfig {
        GameConfig {
            arena_shape: ArenaShape::Circle { radius: 40.0 },
            ..GameConfig::default()
        }
    }

    fn firing() -> InputSnapshot {
        InputSnapshot {
            fire_held: true,
            ..Default::default()
        }
    }

    #[test]
    fn five_second_stall_is_bounded() {
        let mut session = GameSession::new(config(), profile("stall"), 1);
        let report = session.advance(5.0, InputSnapshot::default());
        // The clamped delta plus the step budget keep a stall from turning
        // into a catch-up burst.
        assert!(report.steps <= config().max_steps_per_frame);
        assert!(report.steps > 0);
        assert!(report.alpha >= 0.0 && report.alpha < 1.0);
    }

    #[test]
    fn projectile_caps_hold_under_sustained_fire() {
        // Both combatants get absurd health so neither side wins before
        // thirty seconds of churn have exercised the caps.
        let cfg = GameConfig {
            player_health: 1.0e9,
            boss_health: 1.0e9,
            ..config()
        };
        let mut session = GameSession::new(cfg.clone(), profile("caps"), 2);
        for _ in 0..1800 {
            session.advance(1.0 / 60.0, firing());
            assert!(session.active_projectiles() <= cfg.max_projectiles);
            for owner in [Owner::Player, Owner::Boss, Owner::Minion] {
                if let Some(cap) = cfg.max_projectiles_per_owner {
                    assert!(session.active_projectiles_for(owner) <= cap);
                }
            }
            assert!((1..=5).contains(&session.multiplier()));
        }
        // Half a minute of combat definitely put shots in the air.
        assert!(session.now() > 29.0);
    }

    #[test]
    fn particle_buffer_stays_within_capacity() {
        let cfg = GameConfig {
            particle_capacity: 64,
            player_health: 1.0e9,
            boss_health: 1.0e9,
            ..config()
        };
        let mut session = GameSession::new(cfg, profile("particles"), 3);
        for _ in 0..1800 {
            session.advance(1.0 / 60.0, firing());
            assert!(session.active_particles() <= 64);
        }
    }

    #[test]
    fn pause_freezes_time_and_resume_continues() {
        let mut session = GameSession::new(config(), profile("pause"), 4);
        session.advance(0.1, InputSnapshot::default());
        let frozen = session.now();

        let pause = InputSnapshot {
            pause_pressed: true,
            ..Default::default()
        };
        session.advance(1.0 / 60.0, pause);
        assert_eq!(session.phase(), SessionPhase::Paused);
        let report = session.advance(0.5, InputSnapshot::default());
        assert_eq!(report.steps, 0);
        assert_eq!(session.now(), frozen);

        session.advance(1.0 / 60.0, pause);
        assert_eq!(session.phase(), SessionPhase::Playing);
        session.advance(0.1, InputSnapshot::default());
        assert!(session.now() > frozen);
    }

    #[test]
    fn restart_tears_everything_down() {
        let mut session = GameSession::new(config(), profile("restart"), 5);
        for _ in 0..300 {
            session.advance(1.0 / 60.0, firing());
        }
        assert!(session.active_projectiles() > 0);

        let restart = InputSnapshot {
            restart_pressed: true,
            ..Default::default()
        };
        session.advance(1.0 / 60.0, restart);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.active_projectiles(), 0);
        assert_eq!(session.active_drops(), 0);
        assert_eq!(session.active_particles(), 0);
        assert_eq!(session.alive_minions(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.multiplier(), 1);
    }

    #[test]
    fn whittling_the_boss_down_ends_in_victory() {
        let cfg = GameConfig {
            boss_health: 1.0,
            player_health: 10_000.0,
            ..config()
        };
        let path = profile("victory");
        let _ = std::fs::remove_file(&path);
        let mut session = GameSession::new(cfg, path.clone(), 6);
        for _ in 0..7200 {
            session.advance(1.0 / 60.0, firing());
            if session.phase() != SessionPhase::Playing {
                break;
            }
        }
        assert_eq!(session.phase(), SessionPhase::Victory);
        assert!(session.score() > 0);
        // Terminal transition committed the high score.
        assert_eq!(session.high_score(), session.score());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn terminal_phase_stops_the_simulation() {
        let cfg = GameConfig {
            boss_health: 1.0,
            player_health: 10_000.0,
            ..config()
        };
        let mut session = GameSession::new(cfg, profile("terminal"), 7);
        for _ in 0..7200 {
            session.advance(1.0 / 60.0, firing());
            if session.phase() == SessionPhase::Victory {
                break;
            }
        }
        assert_eq!(session.phase(), SessionPhase::Victory);
        let t = session.now();
        let report = session.advance(0.5, firing());
        assert_eq!(report.steps, 0);
        assert_eq!(session.now(), t);
    }

    #[test]
    fn restart_leaves_a_terminal_phase() {
        let cfg = GameConfig {
            boss_health: 1.0,
            player_health: 10_000.0,
            ..config()
        };
        let mut session = GameSession::new(cfg, profile("rematch"), 8);
        for _ in 0..7200 {
            session.advance(1.0 / 60.0, firing());
            if session.phase() == SessionPhase::Victory {
                break;
            }
        }
        let restart = InputSnapshot {
            restart_pressed: true,
            ..Default::default()
        };
        session.advance(1.0 / 60.0, restart);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.score(), 0);
        assert!(session.boss_health_fraction() > 0.99);
    }
}
