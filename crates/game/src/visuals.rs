//! Pooled presentation-resource handles and the registry that recycles them.
//!
//! Every live entity that the presentation layer renders owns a
//! [`VisualHandle`]. The handle's `dispose` is the disposal contract: the
//! simulation calls it exactly once when removing the entity, and the slot
//! is never touched again until the pool resets it for reuse. The registry
//! keeps one capacity-bounded pool per churned category so a burst of
//! shooting or particle effects recycles instead of reallocating.

use engine_core::ObjectPool;

/// Categories of pooled visuals, sized independently by expected peak
/// concurrent usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    /// Projectile tracer meshes.
    Projectile,
    /// Hit-feedback burst effects.
    Burst,
    /// Generic effect visuals (item drops, flourishes).
    Effect,
}

/// Handle to a presentation-layer resource (mesh/material instance).
///
/// The id is opaque to the simulation; the presentation layer maps it to
/// GPU resources. `disposed` is the idempotence latch for the disposal
/// contract.
#[derive(Debug)]
pub struct VisualHandle {
    id: u32,
    kind: VisualKind,
    disposed: bool,
}

impl VisualHandle {
    fn new(id: u32, kind: VisualKind) -> Self {
        Self {
            id,
            kind,
            disposed: false,
        }
    }

    /// Release the presentation resources behind this handle. Safe to call
    /// more than once; only the first call does anything.
    pub fn dispose(&mut self) {
        if self.disposed {
            log::trace!("visual {:?}#{} already disposed", self.kind, self.id);
            return;
        }
        self.disposed = true;
        log::trace!("visual {:?}#{} disposed", self.kind, self.id);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> VisualKind {
        self.kind
    }
}

/// Named pools for every churned visual category. Constructed once at
/// startup and passed by reference into whatever spawns or removes
/// entities; there is deliberately no global accessor.
pub struct VisualPools {
    projectiles: ObjectPool<VisualHandle>,
    bursts: ObjectPool<VisualHandle>,
    effects: ObjectPool<VisualHandle>,
}

fn make_pool(kind: VisualKind, capacity: usize) -> ObjectPool<VisualHandle> {
    let mut next_id = 0u32;
    ObjectPool::new(capacity, move || {
        next_id += 1;
        VisualHandle::new(next_id, kind)
    })
    .with_reset(|handle| handle.disposed = false)
}

impl VisualPools {
    /// Pool capacities follow expected peak concurrency: one tracer per
    /// live projectile, a handful of simultaneous bursts, effects sized to
    /// the drop cap plus flourish headroom.
    pub fn new(projectile_capacity: usize, burst_capacity: usize, effect_capacity: usize) -> Self {
        Self {
            projectiles: make_pool(VisualKind::Projectile, projectile_capacity),
            bursts: make_pool(VisualKind::Burst, burst_capacity),
            effects: make_pool(VisualKind::Effect, effect_capacity),
        }
    }

    fn pool_mut(&mut self, kind: VisualKind) -> &mut ObjectPool<VisualHandle> {
        match kind {
            VisualKind::Projectile => &mut self.projectiles,
            VisualKind::Burst => &mut self.bursts,
            VisualKind::Effect => &mut self.effects,
        }
    }

    /// Take a live handle for a newly spawned entity.
    pub fn acquire(&mut self, kind: VisualKind) -> VisualHandle {
        self.pool_mut(kind).acquire()
    }

    /// Dispose a handle and recycle it. Disposal runs here exactly once
    /// per removal (the handle's latch absorbs redundant calls), and the
    /// pool's reset clears the latch before the handle can be reused.
    pub fn release(&mut self, mut handle: VisualHandle) {
        handle.dispose();
        let kind = handle.kind;
        self.pool_mut(kind).release(handle);
    }

    /// Pre-fill every pool so the opening volley allocates nothing.
    pub fn warm(&mut self) {
        let p = self.projectiles.capacity();
        self.projectiles.warm(p);
        let b = self.bursts.capacity();
        self.bursts.warm(b);
        let e = self.effects.capacity();
        self.effects.warm(e);
    }

    /// Idle handles currently held per category.
    pub fn idle(&self, kind: VisualKind) -> usize {
        match kind {
            VisualKind::Projectile => self.projectiles.len(),
            VisualKind::Burst => self.bursts.len(),
            VisualKind::Effect => self.effects.len(),
        }
    }
}
