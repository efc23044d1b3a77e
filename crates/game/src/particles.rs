//! Fixed-capacity particle simulation.
//!
//! Struct-of-arrays storage: every attribute lives in its own parallel
//! vector so the per-tick integration pass walks contiguous memory. A
//! negative lifetime is the inactive sentinel; a slot is eligible for
//! reuse exactly when its lifetime is negative, and no allocation ever
//! happens after construction. Emission requests that find no free slot
//! are silently dropped — bounded cost beats completeness for decorative
//! effects.

use engine_core::{Vec3, Vec4};
use rand::prelude::*;

/// Sentinel for an inactive slot.
const INACTIVE: f32 = -1.0;

/// Explicit handle to a buffer slot, valid while the slot stays active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleSlot(usize);

impl ParticleSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Emission shape for one particle system.
#[derive(Debug, Clone, Copy)]
pub struct EmitterParams {
    pub origin: Vec3,
    /// Half-extent of the random spawn offset per axis.
    pub spread: Vec3,
    pub base_velocity: Vec3,
    /// Half-extent of the random velocity offset per axis.
    pub velocity_variance: Vec3,
    pub acceleration: Vec3,
    pub base_color: Vec4,
    /// Random RGB offset half-extent (alpha comes from the base).
    pub color_variance: Vec3,
    pub max_size: f32,
    /// Particles per second for rate-driven emission.
    pub emission_rate: f32,
    pub lifetime: f32,
}

/// Fixed-capacity struct-of-arrays particle buffer.
pub struct ParticleBuffer {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    accelerations: Vec<Vec3>,
    /// Color at emission; the fade pass derives the current color from it.
    base_colors: Vec<[f32; 4]>,
    /// Current color, uploaded to the presentation layer.
    colors: Vec<[f32; 4]>,
    sizes: Vec<f32>,
    /// Remaining lifetime; negative marks the slot inactive.
    lifetimes: Vec<f32>,
    /// Sim time at emission, for the stateless fade ratio.
    spawn_times: Vec<f32>,

    /// Wrap-around hint so emission doesn't rescan dead prefix slots.
    cursor: usize,
    emit_timer: f32,
    tick: u64,
    /// Color fade runs only every k-th tick; position/size run every tick.
    /// Deliberate accuracy-for-cost tradeoff for decorative state — do not
    /// "fix" this to per-tick.
    color_decimation: u64,
    /// Buffer-upload notifications are decimated on their own cadence,
    /// same tradeoff as the color pass.
    upload_decimation: u64,
    upload_pending: bool,
    rng: StdRng,
}

impl ParticleBuffer {
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            positions: vec![Vec3::ZERO; capacity],
            velocities: vec![Vec3::ZERO; capacity],
            accelerations: vec![Vec3::ZERO; capacity],
            base_colors: vec![[0.0; 4]; capacity],
            colors: vec![[0.0; 4]; capacity],
            sizes: vec![0.0; capacity],
            lifetimes: vec![INACTIVE; capacity],
            spawn_times: vec![0.0; capacity],
            cursor: 0,
            emit_timer: 0.0,
            tick: 0,
            color_decimation: 3,
            upload_decimation: 2,
            upload_pending: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn rand_offset(rng: &mut StdRng, half_extent: Vec3) -> Vec3 {
        Vec3::new(
            (rng.gen::<f32>() * 2.0 - 1.0) * half_extent.x,
            (rng.gen::<f32>() * 2.0 - 1.0) * half_extent.y,
            (rng.gen::<f32>() * 2.0 - 1.0) * half_extent.z,
        )
    }

    /// Activate one free slot with randomized parameters. Returns `None`
    /// (request dropped) when every slot is live.
    pub fn emit(&mut self, params: &EmitterParams, now: f64) -> Option<ParticleSlot> {
        let capacity = self.lifetimes.len();
        let mut slot = None;
        for offset in 0..capacity {
            let i = (self.cursor + offset) % capacity;
            if self.lifetimes[i] < 0.0 {
                slot = Some(i);
                self.cursor = (i + 1) % capacity;
                break;
            }
        }
        let i = slot?;

        self.positions[i] = params.origin + Self::rand_offset(&mut self.rng, params.spread);
        self.velocities[i] =
            params.base_velocity + Self::rand_offset(&mut self.rng, params.velocity_variance);
        self.accelerations[i] = params.acceleration;
        let tint = Self::rand_offset(&mut self.rng, params.color_variance);
        let color = [
            (params.base_color.x + tint.x).clamp(0.0, 1.0),
            (params.base_color.y + tint.y).clamp(0.0, 1.0),
            (params.base_color.z + tint.z).clamp(0.0, 1.0),
            params.base_color.w.clamp(0.0, 1.0),
        ];
        self.base_colors[i] = color;
        self.colors[i] = color;
        self.sizes[i] = params.max_size * (0.5 + 0.5 * self.rng.gen::<f32>());
        self.lifetimes[i] = params.lifetime.max(0.0);
        self.spawn_times[i] = now as f32;
        Some(ParticleSlot(i))
    }

    /// Emit up to `count` particles at once (hit bursts, death puffs).
    /// Returns how many actually found a slot.
    pub fn emit_burst(&mut self, params: &EmitterParams, count: usize, now: f64) -> usize {
        let mut emitted = 0;
        for _ in 0..count {
            if self.emit(params, now).is_none() {
                break;
            }
            emitted += 1;
        }
        emitted
    }

    /// Rate-driven continuous emission. The interval may be much smaller
    /// than the timestep, in which case several particles come out of one
    /// call.
    pub fn update_emission(&mut self, params: &EmitterParams, dt: f32, now: f64) {
        if params.emission_rate <= 0.0 {
            return;
        }
        let interval = 1.0 / params.emission_rate;
        self.emit_timer += dt;
        while self.emit_timer >= interval {
            self.emit_timer -= interval;
            // Dropped requests still consume their slice of the timer,
            // otherwise a full buffer would burst-emit on the first free slot.
            let _ = self.emit(params, now);
        }
    }

    /// Advance every active slot by `dt`.
    pub fn update(&mut self, dt: f32, now: f64) {
        self.tick += 1;
        let color_pass = self.tick % self.color_decimation == 0;
        let now = now as f32;

        for i in 0..self.lifetimes.len() {
            let remaining = self.lifetimes[i];
            if remaining < 0.0 {
                continue;
            }
            let next = remaining - dt;
            if next < 0.0 {
                self.lifetimes[i] = INACTIVE;
                self.sizes[i] = 0.0;
                continue;
            }
            self.lifetimes[i] = next;

            // Semi-implicit Euler.
            self.velocities[i] += self.accelerations[i] * dt;
            self.positions[i] += self.velocities[i] * dt;

            // Shrink with the remaining-lifetime ratio. remaining > 0 here,
            // since remaining == 0 lands in the deactivate branch above.
            self.sizes[i] *= next / remaining;

            if color_pass {
                let age = (now - self.spawn_times[i]).max(0.0);
                let total = age + next;
                let fade = if total > 0.0 { next / total } else { 0.0 };
                let base = self.base_colors[i];
                self.colors[i] = [base[0], base[1], base[2], base[3] * fade];
            }
        }

        if self.tick % self.upload_decimation == 0 {
            self.upload_pending = true;
        }
    }

    /// True when a decimated upload point was reached since the last call.
    pub fn take_upload_notification(&mut self) -> bool {
        std::mem::take(&mut self.upload_pending)
    }

    /// Deactivate every slot.
    pub fn clear(&mut self) {
        for i in 0..self.lifetimes.len() {
            self.lifetimes[i] = INACTIVE;
            self.sizes[i] = 0.0;
        }
        self.emit_timer = 0.0;
    }

    pub fn capacity(&self) -> usize {
        self.lifetimes.len()
    }

    pub fn active_count(&self) -> usize {
        self.lifetimes.iter().filter(|&&l| l >= 0.0).count()
    }

    pub fn is_active(&self, slot: ParticleSlot) -> bool {
        self.lifetimes.get(slot.0).is_some_and(|&l| l >= 0.0)
    }

    // Raw attribute views for the presentation layer's interleave-free
    // instance-buffer upload.

    pub fn positions_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn colors_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn sizes_raw(&self) -> &[f32] {
        &self.sizes
    }

    pub fn lifetimes_raw(&self) -> &[f32] {
        &self.lifetimes
    }
}
