//! Golden-angle (Fibonacci) placement of cards on a sphere.
//!
//! Index 0 sits on the north pole and index `n - 1` on the south pole; in
//! between, each step descends by an equal slice of height and turns by the
//! golden angle, which gives near-equal-area spacing without polar clustering.

use crate::constants::{EQUATOR_SIZE_BOOST, MIN_SPHERE_RADIUS, POLE_UP_SWITCH};
use glam::{Mat3, Quat, Vec3};
use std::f32::consts::PI;

/// `π·(3 − √5)`
pub fn golden_angle() -> f32 {
    PI * (3.0 - 5.0_f32.sqrt())
}

/// Spatial placement of one card. `size` is the card width before aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub orientation: Quat,
    pub size: f32,
}

impl Placement {
    /// Outward unit normal of the card face.
    pub fn normal(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutParams {
    pub sphere_radius: f32,
    pub shrink_factor: f32,
}

impl From<&crate::config::LayoutConfig> for LayoutParams {
    fn from(cfg: &crate::config::LayoutConfig) -> Self {
        Self {
            sphere_radius: cfg.sphere_radius,
            shrink_factor: cfg.shrink_factor,
        }
    }
}

/// Place `n` cards on a sphere of `sphere_radius` with the default shrink factor.
pub fn layout(n: usize, sphere_radius: f32) -> Vec<Placement> {
    layout_with(
        n,
        LayoutParams {
            sphere_radius,
            shrink_factor: crate::constants::CARD_SHRINK_FACTOR,
        },
    )
}

pub fn layout_with(n: usize, params: LayoutParams) -> Vec<Placement> {
    let radius = sanitize_radius(params.sphere_radius);
    let shrink = if params.shrink_factor.is_finite() && params.shrink_factor > 0.0 {
        params.shrink_factor
    } else {
        crate::constants::CARD_SHRINK_FACTOR
    };
    if n == 0 {
        return Vec::new();
    }

    // n - 1 guarded so a single item lands on the pole instead of dividing by zero
    let last = (n - 1).max(1) as f32;
    let avg_distance = 2.0 * PI * radius / (n as f32).sqrt();
    let base_size = avg_distance * shrink;
    let golden = golden_angle();

    (0..n)
        .map(|i| {
            let normalized_y = 1.0 - (i as f32 / last) * 2.0;
            let radius_at_y = (1.0 - normalized_y * normalized_y).max(0.0).sqrt();
            let theta = i as f32 * golden;
            let position = radius
                * Vec3::new(
                    theta.cos() * radius_at_y,
                    normalized_y,
                    theta.sin() * radius_at_y,
                );
            // sin(inclination) == radius_at_y: 1 on the equator, 0 on the poles
            let pole_factor = radius_at_y;
            let size = base_size * (1.0 + EQUATOR_SIZE_BOOST * (2.0 * pole_factor - 1.0));
            Placement {
                position,
                orientation: facing_center(position, radius),
                size,
            }
        })
        .collect()
}

/// Orientation whose +Z points away from the origin (card faces outward,
/// drawn double-sided). Near the poles the up hint switches to +Z.
pub fn facing_center(position: Vec3, radius: f32) -> Quat {
    let z = position.try_normalize().unwrap_or(Vec3::Z);
    let up = if position.y.abs() > POLE_UP_SWITCH * radius {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let x = up
        .cross(z)
        .try_normalize()
        .unwrap_or_else(|| z.any_orthonormal_vector());
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() && radius >= MIN_SPHERE_RADIUS {
        radius
    } else {
        log::warn!(
            "[layout] degenerate sphere radius {radius}; clamping to {MIN_SPHERE_RADIUS}"
        );
        MIN_SPHERE_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one_items() {
        assert!(layout(0, 5.0).is_empty());
        let one = layout(1, 5.0);
        assert_eq!(one.len(), 1);
        assert!((one[0].position - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
        assert!(one[0].size.is_finite() && one[0].size > 0.0);
    }

    #[test]
    fn cards_face_outward() {
        for p in layout(40, 3.0) {
            let outward = p.position.normalize();
            assert!(p.normal().dot(outward) > 0.999, "normal {:?}", p.normal());
        }
    }

    #[test]
    fn equator_cards_are_larger_than_polar_cards() {
        let cards = layout(101, 5.0);
        let pole = cards[0].size;
        let equator = cards[50].size;
        assert!(equator > pole);
        let ratio = equator / pole;
        assert!((ratio - 1.08 / 0.92).abs() < 1e-3, "ratio {ratio}");
    }

    #[test]
    fn degenerate_radius_is_clamped() {
        for r in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let cards = layout(10, r);
            assert_eq!(cards.len(), 10);
            for c in cards {
                assert!(c.position.is_finite());
                assert!(c.orientation.is_finite());
                assert!(c.size.is_finite());
            }
        }
    }
}
