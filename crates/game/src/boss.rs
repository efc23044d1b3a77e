//! Boss combatant: orbit movement, attack patterns, staged evolution.

use engine_core::{CancelSource, CancelToken, Health, Vec3};

use crate::projectile::{Owner, ShotRequest};

/// Number of evolution phases, counting the opening one.
pub const PHASE_COUNT: u32 = 3;

/// Seconds between evolution stage flourish and the stat commit.
pub const EVOLVE_STAGE_DELAY: f64 = 0.6;
/// Seconds until the evolution sequence completes.
pub const EVOLVE_TOTAL_DELAY: f64 = 1.4;

const RADIAL_INTERVAL: f32 = 3.2;
const VOLLEY_INTERVAL: f32 = 1.7;
const SHOT_SPEED: f32 = 14.0;

pub struct Boss {
    pub position: Vec3,
    pub health: Health,
    phase: u32,
    evolving: bool,
    orbit_angle: f32,
    orbit_radius: f32,
    radial_timer: f32,
    volley_timer: f32,
    /// Cancellation for this boss's staged tasks; replaced wholesale on
    /// teardown so a new sequence never shares a flag with a dead one.
    cancel: CancelSource,
}

impl Boss {
    pub fn new(max_health: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 8.0),
            health: Health::new(max_health),
            phase: 1,
            evolving: false,
            orbit_angle: 0.0,
            orbit_radius: 8.0,
            radial_timer: RADIAL_INTERVAL,
            volley_timer: VOLLEY_INTERVAL,
            cancel: CancelSource::new(),
        }
    }

    /// One fixed step of movement and attack pattern timing. Shots are
    /// pushed into `out`; the session admits them through the projectile
    /// caps. No shots while defeated or mid-evolution.
    pub fn update(&mut self, dt: f32, player_pos: Vec3, out: &mut Vec<ShotRequest>) {
        if self.health.is_defeated() {
            return;
        }

        // Slow orbit around the arena center, faster each phase.
        self.orbit_angle += dt * (0.25 + 0.1 * self.phase as f32);
        self.position = Vec3::new(
            self.orbit_angle.cos() * self.orbit_radius,
            self.position.y,
            self.orbit_angle.sin() * self.orbit_radius,
        );

        if self.evolving {
            return;
        }

        let cadence = 1.0 + 0.35 * (self.phase - 1) as f32;

        self.radial_timer -= dt * cadence;
        if self.radial_timer <= 0.0 {
            self.radial_timer += RADIAL_INTERVAL;
            self.radial_burst(out);
        }

        self.volley_timer -= dt * cadence;
        if self.volley_timer <= 0.0 {
            self.volley_timer += VOLLEY_INTERVAL;
            self.aimed_volley(player_pos, out);
        }
    }

    /// Ring of shots outward from the boss, denser each phase.
    fn radial_burst(&self, out: &mut Vec<ShotRequest>) {
        let count = 8 + 4 * (self.phase - 1) as usize;
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
            out.push(ShotRequest {
                position: self.position + dir * 1.5,
                velocity: dir * SHOT_SPEED,
                damage: 8.0,
                owner: Owner::Boss,
            });
        }
    }

    /// Short burst aimed at the player's current position.
    fn aimed_volley(&self, player_pos: Vec3, out: &mut Vec<ShotRequest>) {
        let to_player = player_pos - self.position;
        if to_player.length_squared() < 1.0e-4 {
            return;
        }
        let dir = to_player.normalize();
        for i in 0..self.phase {
            // Slight fan so later phases spread the volley.
            let spread = (i as f32 - (self.phase - 1) as f32 * 0.5) * 0.12;
            let rotated = Vec3::new(
                dir.x * spread.cos() - dir.z * spread.sin(),
                dir.y,
                dir.x * spread.sin() + dir.z * spread.cos(),
            );
            out.push(ShotRequest {
                position: self.position + rotated * 1.5,
                velocity: rotated * (SHOT_SPEED * 1.3),
                damage: 12.0,
                owner: Owner::Boss,
            });
        }
    }

    /// Phase this boss should be in for its current health.
    fn target_phase(&self) -> u32 {
        let fraction = self.health.fraction();
        let band = if fraction < 1.0 / 3.0 {
            3
        } else if fraction < 2.0 / 3.0 {
            2
        } else {
            1
        };
        band.min(PHASE_COUNT)
    }

    /// Set when health has crossed into the next phase band and no
    /// evolution is already staged.
    pub fn ready_to_evolve(&self) -> bool {
        !self.evolving && !self.health.is_defeated() && self.target_phase() > self.phase
    }

    /// Enter the evolution sequence. Returns the token the session
    /// attaches to the staged tasks.
    pub fn begin_evolution(&mut self) -> CancelToken {
        self.evolving = true;
        log::info!("boss evolving toward phase {}", self.phase + 1);
        self.cancel.token()
    }

    /// Commit the staged evolution: next phase, re-armed patterns.
    pub fn complete_evolution(&mut self) {
        if !self.evolving {
            return;
        }
        self.evolving = false;
        self.phase = (self.phase + 1).min(PHASE_COUNT);
        // Open the new phase with an immediate radial.
        self.radial_timer = 0.5;
        self.volley_timer = 1.0;
    }

    /// Finish any in-flight evolution immediately. Used when the staged
    /// tasks are about to be cancelled (pause, restart) so the boss can't
    /// be stranded mid-transition.
    pub fn settle_evolution(&mut self) {
        if self.evolving {
            self.complete_evolution();
        }
    }

    /// Cancel every staged task owned by this boss and arm a fresh source.
    pub fn cancel_pending(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelSource::new();
    }

    /// Apply a hit. Returns `true` exactly once, when the boss falls.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health.take_damage(amount)
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn is_evolving(&self) -> bool {
        self.evolving
    }

    pub fn is_defeated(&self) -> bool {
        self.health.is_defeated()
    }
}
