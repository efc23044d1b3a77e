//! Item drops: pickups spawned by combat, aged out or collected.

use std::collections::VecDeque;

use engine_core::{Lifetime, Vec3};

use crate::visuals::{VisualHandle, VisualPools};

/// Seconds a drop stays on the floor before despawning.
pub const DROP_LIFETIME: f32 = 30.0;

/// What a pickup does when collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    /// Restores a chunk of player health.
    Repair,
    /// Halves the player's fire interval for a while.
    RapidFire,
    /// Absorbs the next hit taken.
    Shield,
    /// Straight score, multiplied by the current combo.
    Bounty,
}

impl DropKind {
    /// Effect magnitude: heal amount, score base, etc.
    pub fn value(&self) -> f32 {
        match self {
            DropKind::Repair => 25.0,
            DropKind::RapidFire => 1.0,
            DropKind::Shield => 1.0,
            DropKind::Bounty => 250.0,
        }
    }

    /// Duration for timed effects.
    pub fn duration(&self) -> Option<f32> {
        match self {
            DropKind::RapidFire => Some(6.0),
            DropKind::Shield => Some(8.0),
            DropKind::Repair | DropKind::Bounty => None,
        }
    }
}

/// A live pickup on the arena floor.
#[derive(Debug)]
pub struct ItemDrop {
    pub kind: DropKind,
    pub position: Vec3,
    pub lifetime: Lifetime,
    pub visual: VisualHandle,
}

/// Capacity-capped drop collection, ordered oldest-first. Exceeding the
/// cap disposes the single oldest drop to make room.
pub struct DropSet {
    live: VecDeque<ItemDrop>,
    max_active: usize,
}

impl DropSet {
    pub fn new(max_active: usize) -> Self {
        Self {
            live: VecDeque::with_capacity(max_active),
            max_active: max_active.max(1),
        }
    }

    pub fn spawn(&mut self, drop: ItemDrop, pools: &mut VisualPools) {
        if self.live.len() >= self.max_active {
            if let Some(oldest) = self.live.pop_front() {
                pools.release(oldest.visual);
            }
        }
        self.live.push_back(drop);
    }

    /// Age drops out and collect any within `pickup_radius` of the player.
    /// Returns the kinds collected this step, in pickup order.
    pub fn update(
        &mut self,
        dt: f32,
        player_pos: Vec3,
        pickup_radius: f32,
        pools: &mut VisualPools,
    ) -> Vec<DropKind> {
        let mut collected = Vec::new();
        let radius_sq = pickup_radius * pickup_radius;
        let mut i = 0;
        while i < self.live.len() {
            let drop = &mut self.live[i];
            let expired = drop.lifetime.update(dt);
            let picked = drop.position.distance_squared(player_pos) <= radius_sq;
            if picked {
                collected.push(drop.kind);
            }
            if expired || picked {
                if let Some(d) = self.live.remove(i) {
                    pools.release(d.visual);
                }
            } else {
                i += 1;
            }
        }
        collected
    }

    /// Dispose every live drop (session teardown).
    pub fn dispose_all(&mut self, pools: &mut VisualPools) {
        while let Some(d) = self.live.pop_front() {
            pools.release(d.visual);
        }
    }

    pub fn active(&self) -> usize {
        self.live.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDrop> {
        self.live.iter()
    }
}
