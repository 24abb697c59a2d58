use simba::simd::{SimdPartialOrd as _, SimdValue, WideF32x8};

use crate::util::simba::fma_dot;

use super::{BarycentricCoordinates, EPSILON, Ray, SimdFloatType, Triangle, WorldPoint8};
#[cfg(test)]
use super::{FloatType, WorldPoint};

/// Scalar version, only used to check the SIMD one.
#[cfg(test)]
impl Triangle<WorldPoint> {
    /// Calculates ray intersection with the (two sided) triangle.
    /// Returns distance along the ray and barycentric uv coordinates of the hit.
    /// Hits closer than EPSILON to the triangle edges or to the ray origin are rejected.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect(
        &self,
        ray: &Ray,
    ) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let [e1, e2] = self.edges();

        let ray_cross_e2 = ray.direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);
        if det.abs() < EPSILON {
            return None; // Parallel to the triangle plane
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);
        if u < EPSILON || u > 1.0 - EPSILON {
            return None;
        }

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * ray.direction.dot(&s_cross_e1);
        if v < EPSILON || u + v > 1.0 - EPSILON {
            return None;
        }

        let t = inv_det * e2.dot(&s_cross_e1);
        (t > EPSILON).then_some((t, BarycentricCoordinates { u, v }))
    }
}

impl Triangle<WorldPoint8> {
    /// Calculates ray intersection with the (two sided) triangle pack.
    /// Returns bit mask of valid intersections, distance along ray, and barycentric uv coordinates.
    /// Hits closer than EPSILON to the triangle edges or to the ray origin are rejected.
    pub fn intersect(
        &self,
        ray: &Ray,
    ) -> (u64, SimdFloatType, BarycentricCoordinates<SimdFloatType>) {
        let origin = ray.origin.map(|x| SimdFloatType::splat(x));
        let direction = ray.direction.map(|x| SimdFloatType::splat(x));
        let epsilon = SimdFloatType::splat(EPSILON);
        let one = SimdFloatType::splat(1.0);
        let upper = one - epsilon;

        let e1 = self[1] - self[0];
        let e2 = self[2] - self[0];

        let ray_cross_e2 = direction.cross(&e2);
        let det = fma_dot(&e1, &ray_cross_e2);

        let inv_det = one / det; // May be infinite
        let s = origin - self[0];
        let u = inv_det * fma_dot(&s, &ray_cross_e2);

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * fma_dot(&direction, &s_cross_e1);
        let t = inv_det * fma_dot(&e2, &s_cross_e1);

        // NaN lanes (degenerate triangles) fail every comparison
        let mask = WideF32x8(det.0.abs()).simd_ge(epsilon)
            & u.simd_ge(epsilon)
            & u.simd_le(upper)
            & v.simd_ge(epsilon)
            & (u + v).simd_le(upper)
            & t.simd_gt(epsilon);

        (
            mask.0.move_mask() as u64,
            t,
            BarycentricCoordinates { u, v },
        )
    }
}
