mod ray_triangle_intersection;
mod triangle;

use nalgebra::{Matrix4, Point2, Point3, Unit, Vector3};
use simba::simd::WideF32x8;

use crate::error::{Error, Result};

pub use triangle::{BarycentricCoordinates, Triangle};

pub type FloatType = f32;
pub type SimdFloatType = WideF32x8;

/// Number of triangles intersected at once by a single SIMD pack.
pub const PACK_LANES: usize = 8;

/// Tolerance for rejecting near parallel rays and near boundary barycentric coordinates.
pub const EPSILON: FloatType = 1e-7;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldPoint8 = Point3<SimdFloatType>;
pub type WorldVector8 = Vector3<SimdFloatType>;
pub type TexturePoint = Point2<FloatType>;

/// Affine 4x4 matrix in row-vector convention (translation in the last row).
pub type Matrix = Matrix4<FloatType>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: Unit<WorldVector>,
}

impl Ray {
    /// Creates a ray, normalizing the direction.
    /// Returns None if the direction is zero or not finite.
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Option<Ray> {
        if !direction.iter().all(|x| x.is_finite()) {
            return None;
        }
        let direction = Unit::try_new(direction, 0.0)?;
        Some(Ray { origin, direction })
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction.as_ref() * distance
    }
}

/// Converts a flat `[x0, y0, z0, x1, ...]` buffer to points.
pub fn points_from_flat(what: &'static str, flat: &[FloatType]) -> Result<Vec<WorldPoint>> {
    if flat.len() % 3 != 0 {
        return Err(Error::shape(
            what,
            "a multiple of 3 coordinates",
            format!("{} coordinates", flat.len()),
        ));
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| WorldPoint::new(c[0], c[1], c[2]))
        .collect())
}

/// Converts a flat `[x0, y0, z0, x1, ...]` buffer to vectors.
pub fn vectors_from_flat(what: &'static str, flat: &[FloatType]) -> Result<Vec<WorldVector>> {
    Ok(points_from_flat(what, flat)?
        .into_iter()
        .map(|p| p.coords)
        .collect())
}

/// Converts a slice holding exactly one 3D point.
pub fn point_from_slice(what: &'static str, coords: &[FloatType]) -> Result<WorldPoint> {
    match coords {
        &[x, y, z] => Ok(WorldPoint::new(x, y, z)),
        _ => Err(Error::shape(
            what,
            "a single 3D point",
            format!("{} coordinates", coords.len()),
        )),
    }
}

/// Transforms a point by an affine matrix in row-vector convention (`[x y z 1] * m`).
pub fn transform_point(m: &Matrix, p: &WorldPoint) -> WorldPoint {
    let row = p.to_homogeneous().transpose() * m;
    WorldPoint::new(row[0], row[1], row[2])
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::{assert, let_assert};
    use proptest::prelude::*;
    use test_case::test_case;

    fn simple_float() -> BoxedStrategy<FloatType> {
        (-1_000_000i32..1_000_000i32)
            .prop_map(|n| n as FloatType * 1e-4)
            .boxed()
    }

    pub fn world_point_strategy() -> impl Strategy<Value = WorldPoint> {
        (simple_float(), simple_float(), simple_float()).prop_map(|(x, y, z)| WorldPoint::new(x, y, z))
    }

    pub fn nonzero_world_vector_strategy() -> impl Strategy<Value = WorldVector> {
        (simple_float(), simple_float(), simple_float())
            .prop_map(|(x, y, z)| WorldVector::new(x, y, z))
            .prop_filter("vector is zero", |v| v.norm() > 1e-3)
    }

    #[test]
    fn ray_normalizes_direction() {
        let_assert!(
            Some(ray) = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, -4.0))
        );
        assert!(ray.direction.as_ref() == &WorldVector::new(0.0, 0.0, -1.0));
        assert!(ray.point_at(2.0) == WorldPoint::new(0.0, 0.0, -2.0));
    }

    #[test_case(WorldVector::zeros() ; "zero")]
    #[test_case(WorldVector::new(FloatType::NAN, 0.0, 1.0) ; "nan")]
    #[test_case(WorldVector::new(FloatType::INFINITY, 0.0, 1.0) ; "infinite")]
    fn degenerate_direction_is_rejected(direction: WorldVector) {
        assert!(Ray::new(WorldPoint::origin(), direction).is_none());
    }

    #[test]
    fn flat_points() {
        let_assert!(Ok(points) = points_from_flat("points", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        assert!(points == vec![WorldPoint::new(1.0, 2.0, 3.0), WorldPoint::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn flat_points_not_rectangular() {
        let_assert!(Err(Error::Shape { what, .. }) = vectors_from_flat("rays", &[1.0, 2.0]));
        assert!(what == "rays");
    }

    #[test_case(&[] ; "empty")]
    #[test_case(&[1.0, 2.0] ; "too_short")]
    #[test_case(&[1.0, 2.0, 3.0, 4.0] ; "too_long")]
    fn single_point_wrong_length(coords: &[FloatType]) {
        assert!(point_from_slice("origin", coords).is_err());
    }

    #[test]
    fn transform_point_row_vector_convention() {
        let mut m = Matrix::identity();
        m[(3, 0)] = 1.0;
        m[(3, 1)] = 2.0;
        m[(3, 2)] = 3.0;
        assert!(
            transform_point(&m, &WorldPoint::new(1.0, 1.0, 1.0)) == WorldPoint::new(2.0, 3.0, 4.0)
        );
    }
}
