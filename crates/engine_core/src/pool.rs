//! Capacity-bounded object pooling.
//!
//! Projectile visuals, particle visuals and effect visuals are created and
//! destroyed continuously during combat. Pooling recycles them instead of
//! reallocating; the capacity cap keeps a quiet pool from hoarding the peak
//! working set of a loud one forever.

/// A capacity-bounded LIFO recycling container.
///
/// `acquire` pops the most recently released instance (warm caches) or
/// constructs a fresh one through the factory. `release` applies the reset
/// closure and retains the object only while the pool is below capacity;
/// overflow objects are dropped to normal reclamation.
pub struct ObjectPool<T> {
    items: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    reset: Option<Box<dyn Fn(&mut T)>>,
    capacity: usize,
}

impl<T> ObjectPool<T> {
    /// Create a pool holding at most `capacity` idle instances.
    pub fn new(capacity: usize, factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            factory: Box::new(factory),
            reset: None,
            capacity,
        }
    }

    /// Attach a reset closure applied to every released object before it
    /// re-enters the pool.
    pub fn with_reset(mut self, reset: impl Fn(&mut T) + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Pop a recycled instance, or construct a new one.
    pub fn acquire(&mut self) -> T {
        match self.items.pop() {
            Some(obj) => obj,
            None => (self.factory)(),
        }
    }

    /// Return an object to the pool. Objects beyond capacity are dropped.
    pub fn release(&mut self, mut obj: T) {
        if let Some(reset) = &self.reset {
            reset(&mut obj);
        }
        if self.items.len() < self.capacity {
            self.items.push(obj);
        }
    }

    /// Pre-fill the pool with up to `count` idle instances (capped at
    /// capacity) so the first combat burst allocates nothing.
    pub fn warm(&mut self, count: usize) {
        let target = count.min(self.capacity);
        while self.items.len() < target {
            let obj = (self.factory)();
            self.items.push(obj);
        }
    }

    /// Drop all held instances.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of idle instances currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of idle instances the pool will retain.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
