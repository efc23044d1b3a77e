//! Projectile entities and the capacity-capped collection that owns them.
//!
//! Two caps compose: a global cap protecting the whole frame budget, which
//! evicts the oldest live projectile of any owner (FIFO), and an optional
//! per-owner sub-cap throttling one shooter, which rejects that shooter's
//! newest shot instead. The asymmetry is deliberate: the global cap sheds
//! the stalest work, the owner cap refuses new work from the saturating
//! owner without punishing anyone else.

use std::collections::VecDeque;

use engine_core::{Lifetime, Vec3};

use crate::arena::Arena;
use crate::visuals::{VisualHandle, VisualPools};

/// Extra distance past the arena bounds before a projectile is culled, so
/// a shot visually exits instead of popping at the edge.
pub const BOUNDS_MARGIN: f32 = 0.5;

/// Who fired a projectile. The collision compatibility matrix matches on
/// this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Player,
    Boss,
    Minion,
}

/// A spawn request produced by a combatant's firing logic. The session
/// attaches the pooled visual and admits it through [`ProjectileSet`].
#[derive(Debug, Clone, Copy)]
pub struct ShotRequest {
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
    pub owner: Owner,
}

/// A live projectile. Owned by exactly one slot in a [`ProjectileSet`]
/// from spawn until disposal.
#[derive(Debug)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
    pub owner: Owner,
    pub lifetime: Lifetime,
    pub visual: VisualHandle,
}

/// Capacity-capped projectile collection, ordered oldest-first.
pub struct ProjectileSet {
    live: VecDeque<Projectile>,
    max_active: usize,
    max_per_owner: Option<usize>,
}

impl ProjectileSet {
    pub fn new(max_active: usize, max_per_owner: Option<usize>) -> Self {
        Self {
            live: VecDeque::with_capacity(max_active),
            max_active: max_active.max(1),
            max_per_owner,
        }
    }

    /// Admit a projectile under both caps. Returns `false` when the shot
    /// was rejected by the owner sub-cap (its visual is disposed here).
    pub fn try_spawn(&mut self, projectile: Projectile, pools: &mut VisualPools) -> bool {
        if let Some(cap) = self.max_per_owner {
            if self.active_for(projectile.owner) >= cap {
                log::trace!("{:?} projectile rejected at owner cap {}", projectile.owner, cap);
                pools.release(projectile.visual);
                return false;
            }
        }
        if self.live.len() >= self.max_active {
            if let Some(oldest) = self.live.pop_front() {
                pools.release(oldest.visual);
            }
        }
        self.live.push_back(projectile);
        true
    }

    /// Advance every projectile and cull anything out of bounds or past
    /// its lifetime. Culling happens on the step the condition appears; a
    /// projectile never survives a tick outside the margin.
    pub fn update(&mut self, dt: f32, arena: &Arena, pools: &mut VisualPools) {
        let mut i = 0;
        while i < self.live.len() {
            let p = &mut self.live[i];
            p.position += p.velocity * dt;
            let expired = p.lifetime.update(dt);
            if expired || !arena.contains(p.position, BOUNDS_MARGIN) {
                self.dispose_at(i, pools);
            } else {
                i += 1;
            }
        }
    }

    /// Remove and dispose the projectile at `index` (hit consumption).
    pub fn dispose_at(&mut self, index: usize, pools: &mut VisualPools) {
        if let Some(p) = self.live.remove(index) {
            pools.release(p.visual);
        }
    }

    /// Dispose every live projectile (session teardown).
    pub fn dispose_all(&mut self, pools: &mut VisualPools) {
        while let Some(p) = self.live.pop_front() {
            pools.release(p.visual);
        }
    }

    pub fn active(&self) -> usize {
        self.live.len()
    }

    pub fn active_for(&self, owner: Owner) -> usize {
        self.live.iter().filter(|p| p.owner == owner).count()
    }

    pub fn get(&self, index: usize) -> Option<&Projectile> {
        self.live.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.live.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaShape;
    use crate::visuals::VisualKind;

    fn arena() -> Arena {
        Arena::new(ArenaShape::Circle { radius: 20.0 }, 0.0, 10.0)
    }

    fn pools() -> VisualPools {
        VisualPools::new(128, 16, 16)
    }

    fn shot(owner: Owner, position: Vec3, velocity: Vec3, pools: &mut VisualPools) -> Projectile {
        Projectile {
            position,
            velocity,
            damage: 10.0,
            owner,
            lifetime: Lifetime::new(5.0),
            visual: pools.acquire(VisualKind::Projectile),
        }
    }

    #[test]
    fn global_cap_evicts_oldest() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(100, None);
        // 150 spawns in one tick batch leave exactly 100 live, the 50
        // oldest evicted.
        for i in 0..150 {
            let p = shot(
                Owner::Player,
                Vec3::new(i as f32 * 0.01, 1.0, 0.0),
                Vec3::ZERO,
                &mut pools,
            );
            set.try_spawn(p, &mut pools);
        }
        assert_eq!(set.active(), 100);
        // Oldest survivor is spawn #50.
        let oldest = set.get(0).expect("nonempty");
        assert!((oldest.position.x - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn owner_cap_rejects_newest() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(100, Some(3));
        for _ in 0..5 {
            let p = shot(Owner::Boss, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, &mut pools);
            set.try_spawn(p, &mut pools);
        }
        assert_eq!(set.active_for(Owner::Boss), 3);
        // Another owner is unaffected by the boss's saturation.
        let p = shot(Owner::Player, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, &mut pools);
        assert!(set.try_spawn(p, &mut pools));
        assert_eq!(set.active(), 4);
    }

    #[test]
    fn out_of_bounds_is_removed_next_step() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(16, None);
        // Just inside the margin, moving straight out.
        let p = shot(
            Owner::Player,
            Vec3::new(20.4, 1.0, 0.0),
            Vec3::new(50.0, 0.0, 0.0),
            &mut pools,
        );
        set.try_spawn(p, &mut pools);
        set.update(1.0 / 60.0, &arena(), &mut pools);
        assert_eq!(set.active(), 0);
    }

    #[test]
    fn leaving_height_band_is_removed() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(16, None);
        let p = shot(
            Owner::Boss,
            Vec3::new(0.0, 9.9, 0.0),
            Vec3::new(0.0, 60.0, 0.0),
            &mut pools,
        );
        set.try_spawn(p, &mut pools);
        set.update(1.0 / 60.0, &arena(), &mut pools);
        assert_eq!(set.active(), 0);
    }

    #[test]
    fn lifetime_expiry_disposes() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(16, None);
        let mut p = shot(Owner::Minion, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, &mut pools);
        p.lifetime = Lifetime::new(0.01);
        set.try_spawn(p, &mut pools);
        set.update(1.0 / 60.0, &arena(), &mut pools);
        assert_eq!(set.active(), 0);
        // The visual went back to the pool.
        assert!(pools.idle(VisualKind::Projectile) > 0);
    }

    #[test]
    fn integration_moves_by_velocity_times_dt() {
        let mut pools = pools();
        let mut set = ProjectileSet::new(16, None);
        let p = shot(
            Owner::Player,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            &mut pools,
        );
        set.try_spawn(p, &mut pools);
        set.update(0.5, &arena(), &mut pools);
        let moved = set.get(0).expect("still live");
        assert!((moved.position.x - 3.0).abs() < 1.0e-6);
    }
}
