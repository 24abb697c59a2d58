use assert2::debug_assert;
use simba::simd::SimdValue as _;

use crate::{
    geometry::{
        BarycentricCoordinates, FloatType, PACK_LANES, Ray, Triangle, WorldPoint, WorldPoint8,
    },
    util::bit_iter,
};

use super::RayHit;

/// Nearest hit search of single rays against a fixed set of triangle packs.
pub(super) struct Worker<'a> {
    packs: &'a [Triangle<WorldPoint8>],
    triangle_count: usize,
}

impl<'a> Worker<'a> {
    pub fn new(packs: &'a [Triangle<WorldPoint8>], triangle_count: usize) -> Self {
        Worker {
            packs,
            triangle_count,
        }
    }

    /// Finds the nearest triangle hit by the ray.
    /// On equal distances the triangle with the lower index wins.
    pub fn nearest_hit(&self, ray: &Option<Ray>) -> Option<RayHit> {
        let ray = ray.as_ref()?;
        let mut best = NearestHit {
            t: FloatType::INFINITY,
            triangle: None,
            uv: BarycentricCoordinates::default(),
        };

        for (pack_index, pack) in self.packs.iter().enumerate() {
            let (mask, t, uv) = pack.intersect(ray);
            for lane in bit_iter(mask) {
                let t = t.extract(lane);
                if t < best.t {
                    best.t = t;
                    best.triangle = Some(pack_index * PACK_LANES + lane);
                    best.uv = uv.extract(lane);
                }
            }
        }

        let triangle = best.triangle?;
        debug_assert!(triangle < self.triangle_count, "padding lane was hit");
        Some(RayHit {
            distance: best.t,
            point: ray.point_at(best.t),
            triangle,
            barycentric: best.uv,
        })
    }
}

struct NearestHit {
    t: FloatType,
    triangle: Option<usize>,
    uv: BarycentricCoordinates<FloatType>,
}

/// Splits triangles into SIMD packs, the last pack is padded with degenerate triangles.
pub(super) fn pack_triangles(triangles: &[Triangle<WorldPoint>]) -> Vec<Triangle<WorldPoint8>> {
    triangles
        .chunks(PACK_LANES)
        .map(Triangle::<WorldPoint8>::pack)
        .collect()
}
