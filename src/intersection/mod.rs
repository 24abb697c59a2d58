mod machinery;
mod worker;

use std::num::NonZeroUsize;

use itertools::izip;
use tracing::{trace, warn};

use crate::{
    error::{Error, Result},
    geometry::{
        self, BarycentricCoordinates, FloatType, Ray, Triangle, WorldPoint, WorldVector,
    },
};

const DEFAULT_RAY_BLOCK_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker per logical CPU
    #[default]
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    pub fn get(&self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Manual(count) => count.get(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, bon::Builder)]
pub struct IntersectionSettings {
    /// Number of rays a worker takes at once.
    /// Batches of at most one block are computed on the calling thread.
    #[builder(default = DEFAULT_RAY_BLOCK_SIZE)]
    pub ray_block_size: NonZeroUsize,
    #[builder(default)]
    pub worker_count: WorkerCount,
}

impl Default for IntersectionSettings {
    fn default() -> Self {
        IntersectionSettings::builder().build()
    }
}

/// Nearest intersection of a ray with a triangle set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Euclidean distance from the ray origin
    pub distance: FloatType,
    pub point: WorldPoint,
    /// Index of the hit triangle in the input
    pub triangle: usize,
    pub barycentric: BarycentricCoordinates<FloatType>,
}

/// Data-parallel Möller-Trumbore nearest hit search of many rays against many triangles.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntersectionEngine {
    settings: IntersectionSettings,
}

impl IntersectionEngine {
    pub fn new(settings: IntersectionSettings) -> IntersectionEngine {
        IntersectionEngine { settings }
    }

    pub fn settings(&self) -> &IntersectionSettings {
        &self.settings
    }

    /// Computes the nearest hit for each ray from flat coordinate buffers.
    ///
    /// `origin` holds a single point, `rays` the ray directions and `v0s`, `v1s`, `v2s` the first,
    /// second and third vertices of the triangles, each as `[x0, y0, z0, x1, ...]`.
    /// All shapes are validated before any computation starts.
    pub fn compute(
        &self,
        origin: &[FloatType],
        rays: &[FloatType],
        v0s: &[FloatType],
        v1s: &[FloatType],
        v2s: &[FloatType],
    ) -> Result<Vec<Option<RayHit>>> {
        let origin = geometry::point_from_slice("ray origin", origin)?;
        let rays = geometry::vectors_from_flat("ray directions", rays)?;
        let v0s = geometry::points_from_flat("first triangle vertices", v0s)?;
        let v1s = geometry::points_from_flat("second triangle vertices", v1s)?;
        let v2s = geometry::points_from_flat("third triangle vertices", v2s)?;

        if v1s.len() != v0s.len() || v2s.len() != v0s.len() {
            return Err(Error::shape(
                "triangle vertices",
                "the same number of first, second and third vertices",
                format!("{}, {} and {}", v0s.len(), v1s.len(), v2s.len()),
            ));
        }

        let triangles: Vec<_> = izip!(v0s, v1s, v2s)
            .map(|(a, b, c)| Triangle::new(a, b, c))
            .collect();
        self.compute_triangles(&origin, &rays, &triangles)
    }

    /// Computes the nearest hit for each ray direction, all rays starting at `origin`.
    /// Rays with zero or non-finite direction never hit anything.
    pub fn compute_triangles(
        &self,
        origin: &WorldPoint,
        rays: &[WorldVector],
        triangles: &[Triangle<WorldPoint>],
    ) -> Result<Vec<Option<RayHit>>> {
        self.compute_rays(&prepare_rays(origin, rays), triangles)
    }

    /// Computes the nearest hit for rays already prepared by [`prepare_rays`].
    pub fn compute_rays(
        &self,
        rays: &[Option<Ray>],
        triangles: &[Triangle<WorldPoint>],
    ) -> Result<Vec<Option<RayHit>>> {
        if rays.is_empty() || triangles.is_empty() {
            return Ok(vec![None; rays.len()]);
        }

        let packs = worker::pack_triangles(triangles);
        trace!(
            rays = rays.len(),
            triangles = triangles.len(),
            packs = packs.len(),
            "computing intersections"
        );

        let worker = worker::Worker::new(&packs, triangles.len());
        machinery::compute_hits(&worker, rays, &self.settings)
    }
}

/// Builds rays with normalized directions sharing a single origin.
/// Directions that are zero or not finite give `None`.
pub fn prepare_rays(origin: &WorldPoint, directions: &[WorldVector]) -> Vec<Option<Ray>> {
    let rays: Vec<Option<Ray>> = directions
        .iter()
        .map(|direction| Ray::new(*origin, *direction))
        .collect();

    let invalid_rays = rays.iter().filter(|ray| ray.is_none()).count();
    if invalid_rays > 0 {
        warn!(invalid_rays, "ignoring rays with zero or non-finite direction");
    }
    rays
}
