//! Ray geometry and attack target selection.
//!
//! Attacks are resolved as 2D rays tested against entity bounding boxes. The
//! obstruction test is segment-versus-rectangle-edge using orientation signs;
//! a ray that starts and ends inside a box crosses no edge and therefore does
//! not hit it. Distance to a candidate is approximated as the minimum
//! pairwise distance between three sample points on each side (center plus
//! the two bounding-box corners), which is cheap and close enough for
//! ordering targets along a ray.

use cellmap::{GridIndex, Rect, Shared};
use glam::Vec2;

use crate::entity::{Caps, Entity, EntityId};

/// Sample points used for approximate distances: center and both
/// bounding-box corners.
#[must_use]
pub(crate) fn sample_points(pos: Vec2, extent: Vec2) -> [Vec2; 3] {
    let rect = Rect::from_center(pos, extent);
    [pos, rect.min, rect.max]
}

/// The point `dist` units from `origin` along `heading_deg`.
#[must_use]
pub(crate) fn ray_endpoint(origin: Vec2, heading_deg: f32, dist: f32) -> Vec2 {
    let radians = heading_deg.to_radians();
    origin + Vec2::new(radians.cos(), radians.sin()) * dist
}

/// Signed area orientation of the triangle `a`, `b`, `c`.
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Whether segments `p1p2` and `q1q2` properly intersect. Endpoints exactly
/// on the other segment's line count as non-crossing.
fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);
    ((o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0))
        && ((o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0))
}

/// Whether the segment `p1p2` crosses any edge of `rect`.
pub(crate) fn segment_hits_rect(p1: Vec2, p2: Vec2, rect: &Rect) -> bool {
    let corners = [
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        rect.max,
        Vec2::new(rect.min.x, rect.max.y),
    ];
    (0..4).any(|i| segments_intersect(p1, p2, corners[i], corners[(i + 1) % 4]))
}

/// Minimum pairwise distance between the two sample sets.
pub(crate) fn approx_distance(a: &[Vec2; 3], b: &[Vec2; 3]) -> f32 {
    let mut best = f32::INFINITY;
    for pa in a {
        for pb in b {
            best = best.min(pa.distance(*pb));
        }
    }
    best
}

/// A candidate struck by a ray.
pub(crate) struct RayHit {
    /// Struck entity.
    pub id: EntityId,
    /// Approximate distance from the shooter.
    pub distance: f32,
    /// Handle into the index.
    pub handle: Shared<Entity>,
}

/// Finds the nearest live, solid, damageable entity whose bounds the ray
/// `from..to` crosses. Acquirable entities never obstruct. Ties on distance
/// resolve to the lowest id, so repeated casts are deterministic.
pub(crate) fn nearest_hit(
    shooter_id: EntityId,
    shooter_samples: &[Vec2; 3],
    from: Vec2,
    to: Vec2,
    solids: &GridIndex<EntityId, Entity>,
) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;
    for handle in solids.query(from.x, from.y, to.x, to.y) {
        let candidate = {
            let entity = handle.read();
            if entity.id() == shooter_id
                || !entity.is_alive()
                || !entity.has(Caps::SOLID)
                || !entity.has(Caps::DAMAGEABLE)
                || entity.has(Caps::ACQUIRABLE)
                || !segment_hits_rect(from, to, &entity.bounds())
            {
                continue;
            }
            let samples = sample_points(entity.pos, entity.extent);
            (entity.id(), approx_distance(shooter_samples, &samples))
        };
        let (id, distance) = candidate;
        let closer = match &best {
            None => true,
            Some(hit) => distance < hit.distance || (distance == hit.distance && id < hit.id),
        };
        if closer {
            best = Some(RayHit {
                id,
                distance,
                handle,
            });
        }
    }
    best
}
