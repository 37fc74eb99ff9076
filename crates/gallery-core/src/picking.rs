use crate::state::{Camera, Viewport};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Re-express the ray in a local frame given that frame's world transform.
    /// The direction is not renormalized, so `t` stays comparable across frames
    /// sharing one transform.
    pub fn to_local(&self, world_from_local: Mat4) -> Ray {
        let inv = world_from_local.inverse();
        Ray {
            origin: inv.transform_point3(self.origin),
            dir: inv.transform_vector3(self.dir),
        }
    }
}

/// One pickable card, in scene-local space.
#[derive(Clone, Copy, Debug)]
pub struct PickCandidate {
    pub index: usize,
    pub center: Vec3,
    pub orientation: Quat,
    pub half_extents: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub index: usize,
    pub distance: f32,
}

/// Compute a world-space ray from pixel coordinates on the surface.
///
/// - `px`: pointer position in the surface's backing store pixels
///
/// Returns a ray starting at the camera eye.
pub fn screen_to_world_ray(camera: &Camera, viewport: Viewport, px: Vec2) -> Ray {
    let size = viewport.size();
    let ndc_x = (2.0 * px.x / size.x) - 1.0;
    let ndc_y = 1.0 - (2.0 * px.y / size.y);
    let inv = camera.view_projection().inverse();
    let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
    let p1: Vec3 = p_far.truncate() / p_far.w;
    let ro = camera.eye;
    let rd = (p1 - ro).try_normalize().unwrap_or(Vec3::NEG_Z);
    Ray {
        origin: ro,
        dir: rd,
    }
}

#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let a = ray_dir.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t_near = (-b - sq) / a;
    let t_far = (-b + sq) / a;
    if t_near >= 0.0 {
        Some(t_near)
    } else if t_far >= 0.0 {
        // origin inside the sphere
        Some(0.0)
    } else {
        None
    }
}

/// Ray against a double-sided rectangle. Returns the ray parameter of the hit.
pub fn ray_card(ray: &Ray, card: &PickCandidate) -> Option<f32> {
    // cheap reject against the card's bounding sphere
    ray_sphere(ray.origin, ray.dir, card.center, card.half_extents.length())?;
    let normal = card.orientation * Vec3::Z;
    let denom = ray.dir.dot(normal);
    if denom.abs() < 1e-8 {
        return None;
    }
    let t = (card.center - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }
    let local = card.orientation.inverse() * (ray.at(t) - card.center);
    (local.x.abs() <= card.half_extents.x && local.y.abs() <= card.half_extents.y).then_some(t)
}

/// Nearest hit along the ray; ties resolve to the smaller distance, then the
/// lower index.
pub fn nearest_hit(ray: &Ray, candidates: &[PickCandidate]) -> Option<PickHit> {
    let mut best = None::<PickHit>;
    for c in candidates {
        if let Some(t) = ray_card(ray, c) {
            match best {
                Some(b) if t >= b.distance => {}
                _ => {
                    best = Some(PickHit {
                        index: c.index,
                        distance: t,
                    })
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_at(index: usize, center: Vec3) -> PickCandidate {
        PickCandidate {
            index,
            center,
            orientation: Quat::IDENTITY,
            half_extents: Vec2::new(0.5, 0.7),
        }
    }

    #[test]
    fn ray_sphere_from_inside_hits_at_origin() {
        let t = ray_sphere(Vec3::ZERO, Vec3::X, Vec3::ZERO, 2.0);
        assert_eq!(t, Some(0.0));
        assert!(ray_sphere(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn nearest_of_two_stacked_cards_wins() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            dir: Vec3::NEG_Z,
        };
        let far = card_at(0, Vec3::new(0.0, 0.0, -2.0));
        let near = card_at(1, Vec3::new(0.0, 0.0, 3.0));
        let hit = nearest_hit(&ray, &[far, near]).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.distance - 7.0).abs() < 1e-5);
    }

    #[test]
    fn misses_outside_card_extent_and_behind_origin() {
        let ray = Ray {
            origin: Vec3::new(0.6, 0.0, 10.0),
            dir: Vec3::NEG_Z,
        };
        assert!(nearest_hit(&ray, &[card_at(0, Vec3::ZERO)]).is_none());
        let behind = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            dir: Vec3::Z,
        };
        assert!(nearest_hit(&behind, &[card_at(0, Vec3::ZERO)]).is_none());
    }

    #[test]
    fn center_pixel_looks_down_negative_z() {
        let mut cam = Camera::new(75f32.to_radians(), 0.1, 1000.0);
        cam.set_distance(15.0);
        cam.aspect = 2.0;
        let ray = screen_to_world_ray(&cam, Viewport::new(800, 400), Vec2::new(400.0, 200.0));
        assert!((ray.origin - Vec3::new(0.0, 0.0, 15.0)).length() < 1e-5);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
    }
}
