use std::{
    array,
    ops::{Add, Index, Mul, Sub},
};

use num_traits::One;
use simba::simd::SimdValue as _;

use super::{FloatType, PACK_LANES, SimdFloatType, WorldPoint, WorldPoint8, WorldVector};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a Point> {
        self.0.iter()
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> Triangle<Point2> {
        Triangle([f(&self[0]), f(&self[1]), f(&self[2])])
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<Point> From<[Point; 3]> for Triangle<Point> {
    fn from(value: [Point; 3]) -> Self {
        Triangle(value)
    }
}

impl Triangle<WorldPoint> {
    /// Returns edge vectors, coming from self[0]
    pub fn edges(&self) -> [WorldVector; 2] {
        [self[1] - self[0], self[2] - self[0]]
    }

    /// Returns a normal vector of the triangle, not normalized.
    pub fn normal(&self) -> WorldVector {
        let [e1, e2] = self.edges();
        e1.cross(&e2)
    }
}

impl Triangle<WorldPoint8> {
    /// Packs up to PACK_LANES triangles into SIMD lanes.
    /// Unused lanes hold a degenerate triangle at the origin.
    pub fn pack(triangles: &[Triangle<WorldPoint>]) -> Triangle<WorldPoint8> {
        assert2::debug_assert!(triangles.len() <= PACK_LANES);

        let coordinate = |vertex: usize, axis: usize| -> SimdFloatType {
            let lanes: [FloatType; PACK_LANES] =
                array::from_fn(|lane| triangles.get(lane).map_or(0.0, |t| t[vertex][axis]));
            lanes.into()
        };
        let vertex = |vertex: usize| {
            WorldPoint8::new(
                coordinate(vertex, 0),
                coordinate(vertex, 1),
                coordinate(vertex, 2),
            )
        };

        Triangle([vertex(0), vertex(1), vertex(2)])
    }
}

/// Position inside a triangle, weights of vertices 1 and 2.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BarycentricCoordinates<T> {
    pub u: T,
    pub v: T,
}

impl<T> BarycentricCoordinates<T>
where
    T: One + Copy + Sub<Output = T>,
{
    pub fn interpolate<T2>(&self, a: &T2, b: &T2, c: &T2) -> T2
    where
        for<'a> &'a T2: Mul<T, Output = T2>,
        T2: Add<Output = T2>,
    {
        let w = T::one() - self.u - self.v;
        a * w + b * self.u + c * self.v
    }

    pub fn interpolate_triangle<T2>(&self, triangle: &Triangle<T2>) -> T2
    where
        for<'a> &'a T2: Mul<T, Output = T2>,
        T2: Add<Output = T2>,
    {
        self.interpolate(&triangle[0], &triangle[1], &triangle[2])
    }
}

impl BarycentricCoordinates<SimdFloatType> {
    pub fn extract(&self, lane: usize) -> BarycentricCoordinates<FloatType> {
        BarycentricCoordinates {
            u: self.u.extract(lane),
            v: self.v.extract(lane),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use nalgebra::Vector2;
    use simba::simd::SimdValue as _;

    #[test]
    fn normal_right_handed() {
        let t = Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        );
        assert!(t.normal() == WorldVector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn pack_keeps_lane_order() {
        let triangles: Vec<_> = (0..3)
            .map(|i| {
                let x = i as FloatType;
                Triangle::new(
                    WorldPoint::new(x, 0.0, 0.0),
                    WorldPoint::new(x, 1.0, 0.0),
                    WorldPoint::new(x, 0.0, 1.0),
                )
            })
            .collect();
        let pack = Triangle::<WorldPoint8>::pack(&triangles);

        for lane in 0..3 {
            assert!(pack[0].x.extract(lane) == lane as FloatType);
            assert!(pack[1].y.extract(lane) == 1.0);
            assert!(pack[2].z.extract(lane) == 1.0);
        }
        for lane in 3..PACK_LANES {
            assert!(pack[1].y.extract(lane) == 0.0);
        }
    }

    #[test]
    fn interpolate_corners_and_center() {
        let t = Triangle::new(
            Vector2::new(0.0f32, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        );
        let at_b = BarycentricCoordinates { u: 1.0f32, v: 0.0 };
        let at_c = BarycentricCoordinates { u: 0.0f32, v: 1.0 };
        let center = BarycentricCoordinates {
            u: 1.0f32 / 3.0,
            v: 1.0 / 3.0,
        };

        assert!(at_b.interpolate_triangle(&t) == t[1]);
        assert!(at_c.interpolate_triangle(&t) == t[2]);
        let c = center.interpolate_triangle(&t);
        assert!((c - Vector2::new(1.0 / 3.0, 1.0 / 3.0)).norm() < 1e-6);
    }
}
