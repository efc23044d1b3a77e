//! Minion wave entities and their spawner.
//!
//! Minions live in the ECS world: a marker component plus position and
//! health. The spawner tops the population up to a cap on a cadence that
//! tightens as the boss evolves, so later phases add pressure without any
//! one wave exceeding the budget.

use engine_core::{Entity, Health, Position, Vec3, World};
use rand::prelude::*;

use crate::arena::Arena;
use crate::projectile::{Owner, ShotRequest};

pub const MINION_HEALTH: f32 = 30.0;

const MOVE_SPEED: f32 = 4.5;
/// Lateral distance a minion tries to hold from the player.
const PREFERRED_RANGE: f32 = 9.0;
/// Beyond this it holds fire instead of spraying across the arena.
const FIRE_RANGE: f32 = 24.0;
const FIRE_INTERVAL: f32 = 2.4;
const SHOT_SPEED: f32 = 11.0;
const SHOT_DAMAGE: f32 = 5.0;

/// Marker + per-minion combat state.
pub struct Minion {
    fire_timer: f32,
    /// +1 or -1, fixed at spawn so a wave spreads both ways.
    strafe_dir: f32,
}

/// Spawn one minion at `position` with randomized fire phase and strafe
/// direction.
pub fn spawn_minion(world: &mut World, position: Vec3, rng: &mut StdRng) -> Entity {
    let minion = Minion {
        fire_timer: rng.gen_range(0.8..FIRE_INTERVAL),
        strafe_dir: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
    };
    world.spawn((Position(position), Health::new(MINION_HEALTH), minion))
}

/// One fixed step of minion movement and firing. Shots land in `out`; the
/// session admits them through the projectile caps.
pub fn update_minions(
    world: &mut World,
    dt: f32,
    player_pos: Vec3,
    arena: &Arena,
    out: &mut Vec<ShotRequest>,
) {
    for (_, (pos, health, minion)) in world.query_mut::<(&mut Position, &Health, &mut Minion)>() {
        if health.is_defeated() {
            continue;
        }

        let to_player = player_pos - pos.0;
        let lateral = Vec3::new(to_player.x, 0.0, to_player.z);
        let dist = lateral.length();
        if dist > 1.0e-3 {
            let toward = lateral / dist;
            // Hold the preferred range with a dead band, strafing sideways
            // the whole time so the player can't line up free shots.
            let radial = if dist > PREFERRED_RANGE + 1.0 {
                toward
            } else if dist < PREFERRED_RANGE - 1.0 {
                -toward
            } else {
                Vec3::ZERO
            };
            let tangent = Vec3::new(-toward.z, 0.0, toward.x) * minion.strafe_dir;
            let direction = (radial + tangent * 0.6).normalize_or_zero();
            pos.0 = arena.clamp(pos.0 + direction * MOVE_SPEED * dt);
        }

        minion.fire_timer -= dt;
        if minion.fire_timer <= 0.0 {
            minion.fire_timer += FIRE_INTERVAL;
            if dist <= FIRE_RANGE {
                let dir = to_player.normalize_or_zero();
                if dir != Vec3::ZERO {
                    out.push(ShotRequest {
                        position: pos.0 + dir * 0.8,
                        velocity: dir * SHOT_SPEED,
                        damage: SHOT_DAMAGE,
                        owner: Owner::Minion,
                    });
                }
            }
        }
    }
}

/// Despawn every defeated minion. Runs once per fixed step so a corpse
/// never survives into the next step's collision pass.
pub fn reap_defeated(world: &mut World) -> usize {
    let dead: Vec<Entity> = world
        .query::<&Health>()
        .with::<&Minion>()
        .iter()
        .filter(|(_, health)| health.is_defeated())
        .map(|(entity, _)| entity)
        .collect();
    for &entity in &dead {
        let _ = world.despawn(entity);
    }
    dead.len()
}

/// Count of live (not yet defeated) minions.
pub fn alive_count(world: &World) -> usize {
    world
        .query::<&Health>()
        .with::<&Minion>()
        .iter()
        .filter(|(_, health)| !health.is_defeated())
        .count()
}

/// Tops the minion population up to a cap on a phase-scaled cadence.
pub struct MinionSpawner {
    interval: f32,
    timer: f32,
    max_alive: usize,
    rng: StdRng,
}

impl MinionSpawner {
    pub fn new(max_alive: usize, seed: u64) -> Self {
        Self {
            interval: 3.5,
            // First wave arrives shortly after the fight opens.
            timer: 1.5,
            max_alive,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance the spawn cadence. Boss phase tightens it; the population
    /// cap always wins over the timer.
    pub fn update(&mut self, world: &mut World, dt: f32, arena: &Arena, boss_phase: u32) {
        let cadence = 1.0 + 0.4 * boss_phase.saturating_sub(1) as f32;
        self.timer -= dt * cadence;
        if self.timer > 0.0 {
            return;
        }
        self.timer += self.interval;

        if alive_count(world) >= self.max_alive {
            return;
        }
        let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
        let position = arena.edge_point(angle) + Vec3::new(0.0, 0.5, 0.0);
        spawn_minion(world, position, &mut self.rng);
        log::debug!("minion wave: {} alive", alive_count(world));
    }
}
