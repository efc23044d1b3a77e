//! Fixed-timestep simulation clock.
//!
//! The render callback reports variable wall-clock deltas; the clock turns
//! them into zero or more constant-size simulation steps so combat timing
//! never depends on framerate. Deltas are clamped and the step count per
//! frame is bounded, so a tab suspend or debugger pause degrades precision
//! instead of triggering an ever-growing catch-up burst.

/// Result of feeding one frame's wall-clock delta to the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBatch {
    /// Number of fixed steps to run this frame (bounded).
    pub steps: u32,
    /// Size of each step in seconds.
    pub fixed_step: f32,
    /// Interpolation factor in [0, 1) for blending the last two simulation
    /// states at render time.
    pub alpha: f32,
}

/// Fixed-timestep accumulator driving the whole simulation.
#[derive(Debug)]
pub struct SimClock {
    /// Leftover wall time not yet consumed by a full step.
    accumulator: f32,
    /// Monotonic simulation time in seconds (sum of executed steps).
    current_time: f64,
    /// Step size in seconds (1/60 by default).
    fixed_step: f32,
    /// Largest wall delta accepted per frame.
    max_frame_delta: f32,
    /// Hard ceiling on steps per `advance` call.
    max_steps_per_frame: u32,
    /// Total steps executed since creation.
    step_count: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 1.0 / 15.0, 5)
    }
}

impl SimClock {
    /// Create a clock with explicit tuning. `fixed_step` must be positive;
    /// `max_frame_delta` is raised to at least one step so a clamped frame
    /// can always make progress.
    pub fn new(fixed_step: f32, max_frame_delta: f32, max_steps_per_frame: u32) -> Self {
        let fixed_step = fixed_step.max(1.0e-4);
        Self {
            accumulator: 0.0,
            current_time: 0.0,
            fixed_step,
            max_frame_delta: max_frame_delta.max(fixed_step),
            max_steps_per_frame: max_steps_per_frame.max(1),
            step_count: 0,
        }
    }

    /// Consume one frame's wall-clock delta and return the step budget for
    /// this frame plus the render interpolation factor. The driver commits
    /// each budgeted step with [`SimClock::step`] before running it, so sim
    /// time stays step-granular for anything scheduled against it.
    pub fn advance(&mut self, wall_delta: f32) -> StepBatch {
        // Negative deltas (clock going backwards on a misbehaving driver)
        // are treated as an empty frame.
        let dt = wall_delta.clamp(0.0, self.max_frame_delta);
        self.accumulator += dt;

        let mut steps = 0u32;
        while self.accumulator >= self.fixed_step && steps < self.max_steps_per_frame {
            self.accumulator -= self.fixed_step;
            steps += 1;
        }

        // Budget exhausted with backlog remaining: shed it, otherwise every
        // following frame would start behind and the backlog only grows.
        if self.accumulator >= self.fixed_step {
            let shed = self.accumulator - (self.accumulator % self.fixed_step);
            self.accumulator %= self.fixed_step;
            log::debug!("simulation overloaded, shed {:.3}s of backlog", shed);
        }

        StepBatch {
            steps,
            fixed_step: self.fixed_step,
            alpha: self.accumulator / self.fixed_step,
        }
    }

    /// Commit one budgeted step: advances monotonic sim time.
    pub fn step(&mut self) {
        self.current_time += f64::from(self.fixed_step);
        self.step_count += 1;
    }

    /// Monotonic simulation time in seconds.
    pub fn now(&self) -> f64 {
        self.current_time
    }

    /// Step size in seconds.
    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    /// Total fixed steps executed since creation.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Leftover accumulated time (always less than one step).
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}
