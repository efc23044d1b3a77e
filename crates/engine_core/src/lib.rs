//! Core simulation types for Voidreign.
//!
//! This crate provides the foundational types used across the simulation:
//! - Fixed-timestep clock decoupling gameplay from render framerate
//! - Capacity-bounded object pooling for churned resources
//! - Deferred task queue with cancellation for delayed effects
//! - Common combatant components (health, position, lifetime)

pub mod components;
pub mod pool;
pub mod tasks;
pub mod time;

pub use components::*;
pub use pool::*;
pub use tasks::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
