//! Arena bounds queries.
//!
//! The arena itself (geometry, props, lighting) is built elsewhere; the
//! simulation only holds the bounds snapshot it needs for clamping and
//! out-of-bounds culling. Both rectangular and circular footprints are
//! supported, with a shared playable height band.

use glam::{Vec2, Vec3};

use crate::config::ArenaShape;

/// Bounds snapshot consulted by projectile, drop and combatant updates.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    shape: ArenaShape,
    floor_y: f32,
    ceiling_y: f32,
}

impl Arena {
    pub fn new(shape: ArenaShape, floor_y: f32, ceiling_y: f32) -> Self {
        Self {
            shape,
            floor_y,
            ceiling_y: ceiling_y.max(floor_y),
        }
    }

    /// Whether `p` is inside the arena expanded outward by `margin`.
    /// The height band is checked with the same margin.
    pub fn contains(&self, p: Vec3, margin: f32) -> bool {
        if p.y < self.floor_y - margin || p.y > self.ceiling_y + margin {
            return false;
        }
        match self.shape {
            ArenaShape::Rect {
                half_width,
                half_depth,
            } => p.x.abs() <= half_width + margin && p.z.abs() <= half_depth + margin,
            ArenaShape::Circle { radius } => {
                Vec2::new(p.x, p.z).length_squared() <= (radius + margin) * (radius + margin)
            }
        }
    }

    /// Clamp `p` to the playable volume (no margin).
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        let y = p.y.clamp(self.floor_y, self.ceiling_y);
        match self.shape {
            ArenaShape::Rect {
                half_width,
                half_depth,
            } => Vec3::new(
                p.x.clamp(-half_width, half_width),
                y,
                p.z.clamp(-half_depth, half_depth),
            ),
            ArenaShape::Circle { radius } => {
                let lateral = Vec2::new(p.x, p.z);
                let len = lateral.length();
                if len > radius && len > 0.0 {
                    let scaled = lateral * (radius / len);
                    Vec3::new(scaled.x, y, scaled.y)
                } else {
                    Vec3::new(p.x, y, p.z)
                }
            }
        }
    }

    /// A point on the arena edge at the given lateral angle, on the floor.
    pub fn edge_point(&self, angle: f32) -> Vec3 {
        let dir = Vec2::new(angle.cos(), angle.sin());
        let dist = match self.shape {
            ArenaShape::Rect {
                half_width,
                half_depth,
            } => half_width.min(half_depth),
            ArenaShape::Circle { radius } => radius,
        };
        Vec3::new(dir.x * dist * 0.95, self.floor_y, dir.y * dist * 0.95)
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    pub fn ceiling_y(&self) -> f32 {
        self.ceiling_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle() -> Arena {
        Arena::new(ArenaShape::Circle { radius: 10.0 }, 0.0, 5.0)
    }

    fn rect() -> Arena {
        Arena::new(
            ArenaShape::Rect {
                half_width: 10.0,
                half_depth: 20.0,
            },
            0.0,
            5.0,
        )
    }

    #[test]
    fn circle_contains_with_margin() {
        let a = circle();
        assert!(a.contains(Vec3::new(10.4, 1.0, 0.0), 0.5));
        assert!(!a.contains(Vec3::new(10.6, 1.0, 0.0), 0.5));
    }

    #[test]
    fn rect_contains_checks_both_axes() {
        let a = rect();
        assert!(a.contains(Vec3::new(9.0, 1.0, 19.0), 0.0));
        assert!(!a.contains(Vec3::new(11.0, 1.0, 0.0), 0.0));
        assert!(!a.contains(Vec3::new(0.0, 1.0, 21.0), 0.0));
    }

    #[test]
    fn height_band_is_enforced() {
        let a = circle();
        assert!(!a.contains(Vec3::new(0.0, -1.0, 0.0), 0.5));
        assert!(!a.contains(Vec3::new(0.0, 6.0, 0.0), 0.5));
        assert!(a.contains(Vec3::new(0.0, 5.4, 0.0), 0.5));
    }

    #[test]
    fn clamp_pulls_back_inside_circle() {
        let a = circle();
        let p = a.clamp(Vec3::new(30.0, 9.0, 0.0));
        assert!((p.x - 10.0).abs() < 1.0e-4);
        assert_eq!(p.y, 5.0);
    }

    #[test]
    fn clamp_is_identity_inside() {
        let a = rect();
        let p = Vec3::new(3.0, 2.0, -4.0);
        assert_eq!(a.clamp(p), p);
    }
}
