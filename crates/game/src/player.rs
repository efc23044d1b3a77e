//! Player combatant: movement, firing cooldown, and drop effects.

use engine_core::{Health, Vec3};
use input::InputSnapshot;

use crate::arena::Arena;
use crate::drops::DropKind;

/// Seconds between shots at base fire rate.
const BASE_FIRE_INTERVAL: f32 = 0.14;
/// Dash speed multiplier while the burst is active.
const DASH_MULTIPLIER: f32 = 2.6;
const DASH_DURATION: f32 = 0.22;
const DASH_COOLDOWN: f32 = 1.1;

pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: Health,
    pub move_speed: f32,
    pub damage: f32,
    fire_cooldown: f32,
    rapid_fire_timer: f32,
    shield_timer: f32,
    dash_timer: f32,
    dash_cooldown: f32,
}

impl Player {
    pub fn new(position: Vec3, max_health: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            health: Health::new(max_health),
            move_speed: 9.0,
            damage: 12.0,
            fire_cooldown: 0.0,
            rapid_fire_timer: 0.0,
            shield_timer: 0.0,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
        }
    }

    /// Apply one fixed step of movement and timer decay.
    pub fn update(&mut self, snap: &InputSnapshot, dt: f32, arena: &Arena) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.rapid_fire_timer = (self.rapid_fire_timer - dt).max(0.0);
        self.shield_timer = (self.shield_timer - dt).max(0.0);
        self.dash_timer = (self.dash_timer - dt).max(0.0);
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);

        if snap.dash_pressed && self.dash_cooldown <= 0.0 {
            self.dash_timer = DASH_DURATION;
            self.dash_cooldown = DASH_COOLDOWN;
        }

        let speed = if self.dash_timer > 0.0 {
            self.move_speed * DASH_MULTIPLIER
        } else {
            self.move_speed
        };
        self.velocity = Vec3::new(snap.move_axis.x, 0.0, snap.move_axis.y) * speed;
        self.position = arena.clamp(self.position + self.velocity * dt);
    }

    /// Consume the fire cooldown if ready. The session turns a successful
    /// attempt into a projectile spawn aimed at the boss.
    pub fn try_fire(&mut self) -> bool {
        if self.fire_cooldown > 0.0 {
            return false;
        }
        self.fire_cooldown = if self.rapid_fire_timer > 0.0 {
            BASE_FIRE_INTERVAL * 0.5
        } else {
            BASE_FIRE_INTERVAL
        };
        true
    }

    /// Incoming hit. An armed shield absorbs the hit and breaks; otherwise
    /// damage lands on health. Returns `true` exactly once, on the hit
    /// that defeats the player.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.health.is_defeated() {
            return false;
        }
        if self.shield_timer > 0.0 {
            self.shield_timer = 0.0;
            log::debug!("shield absorbed {:.0} damage", amount);
            return false;
        }
        self.health.take_damage(amount)
    }

    /// Apply a collected pickup. Bounty is scored by the session, not here.
    pub fn apply_drop(&mut self, kind: DropKind) {
        match kind {
            DropKind::Repair => self.health.heal(kind.value()),
            DropKind::RapidFire => {
                self.rapid_fire_timer = kind.duration().unwrap_or(0.0);
            }
            DropKind::Shield => {
                self.shield_timer = kind.duration().unwrap_or(0.0);
            }
            DropKind::Bounty => {}
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.health.is_defeated()
    }

    pub fn is_shielded(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub fn has_rapid_fire(&self) -> bool {
        self.rapid_fire_timer > 0.0
    }
}
