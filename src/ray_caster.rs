use tracing::{debug, trace};

use crate::{
    error::Result,
    geometry::{self, FloatType, TexturePoint, WorldPoint, WorldVector},
    intersection::{IntersectionEngine, IntersectionSettings, RayHit, prepare_rays},
    mesh::Mesh,
    scene::{NodeIdx, SceneGraph},
};

/// Nearest hit of a single ray over a whole scene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CastHit {
    /// Index of the ray in the cast input
    pub ray_index: usize,
    pub point: WorldPoint,
    pub distance: FloatType,
    /// Node owning the hit mesh
    pub node: NodeIdx,
    /// Index of the mesh in the node's mesh collection
    pub mesh: usize,
    /// Index of the triangle in the mesh's index table
    pub triangle: usize,
    /// Interpolated texture coordinates, if the mesh has them
    pub uv: Option<TexturePoint>,
}

/// Hits of a cast, only for the rays that hit something, ordered by ray index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CastResult {
    hits: Vec<CastHit>,
}

impl CastResult {
    pub fn hits(&self) -> &[CastHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hit of the ray with the given input index.
    pub fn for_ray(&self, ray_index: usize) -> Option<&CastHit> {
        self.hits
            .binary_search_by_key(&ray_index, |hit| hit.ray_index)
            .ok()
            .map(|i| &self.hits[i])
    }

    pub fn points(&self) -> impl Iterator<Item = WorldPoint> + '_ {
        self.hits.iter().map(|hit| hit.point)
    }

    pub fn distances(&self) -> impl Iterator<Item = FloatType> + '_ {
        self.hits.iter().map(|hit| hit.distance)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.hits.iter().map(|hit| hit.node)
    }
}

impl IntoIterator for CastResult {
    type Item = CastHit;
    type IntoIter = std::vec::IntoIter<CastHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

/// Finds the nearest hit of each ray over all visible geometry of a scene.
#[derive(Copy, Clone, Debug, Default)]
pub struct RayCaster {
    engine: IntersectionEngine,
}

impl RayCaster {
    pub fn new(settings: IntersectionSettings) -> RayCaster {
        RayCaster {
            engine: IntersectionEngine::new(settings),
        }
    }

    pub fn engine(&self) -> &IntersectionEngine {
        &self.engine
    }

    /// Casts rays from a single origin against all visible geometry nodes reachable from `roots`.
    ///
    /// Triangles of all meshes are gathered in depth-first pre-order over `roots` (then mesh
    /// order, then triangle order) and intersected in a single engine call. A hit only
    /// replaces a strictly farther one, so on equal distances the first gathered node, mesh
    /// and triangle wins.
    /// Rays with zero or non-finite direction are reported as not hitting anything.
    pub fn cast(
        &self,
        origin: &WorldPoint,
        rays: &[WorldVector],
        scene: &SceneGraph,
        roots: &[NodeIdx],
    ) -> Result<CastResult> {
        let walk = scene.walk_pre_order(roots)?;
        if rays.is_empty() {
            return Ok(CastResult::default());
        }

        let mut targets: Vec<CastTarget<'_>> = Vec::new();
        let mut triangles = Vec::new();
        let mut cast_nodes = 0usize;

        for node_index in walk {
            let node = scene.node(node_index)?;
            let Some(meshes) = node.kind().meshes().filter(|_| node.is_visible()) else {
                continue;
            };
            cast_nodes += 1;

            let matrix = scene.global_matrix(node_index)?;
            for (mesh_index, mesh) in meshes.iter().enumerate() {
                trace!(
                    node = node.name(),
                    mesh = mesh.name(),
                    triangles = mesh.triangles().len(),
                    "gathering mesh"
                );
                targets.push(CastTarget {
                    node: node_index,
                    mesh_index,
                    mesh,
                    first_triangle: triangles.len(),
                });
                triangles.extend(mesh.global_triangles(&matrix));
            }
        }

        let rays = prepare_rays(origin, rays);
        let hits: Vec<CastHit> = self
            .engine
            .compute_rays(&rays, &triangles)?
            .into_iter()
            .enumerate()
            .filter_map(|(ray_index, hit)| {
                let hit = hit?;
                // Last target starting at or before the hit triangle, empty meshes are skipped
                let position = targets.partition_point(|t| t.first_triangle <= hit.triangle);
                let target = &targets[position.checked_sub(1)?];
                let triangle = hit.triangle - target.first_triangle;
                Some(CastHit {
                    ray_index,
                    point: hit.point,
                    distance: hit.distance,
                    node: target.node,
                    mesh: target.mesh_index,
                    triangle,
                    uv: interpolate_uv(target.mesh, triangle, &hit),
                })
            })
            .collect();

        debug!(
            rays = rays.len(),
            nodes = cast_nodes,
            triangles = triangles.len(),
            hits = hits.len(),
            "cast finished"
        );
        Ok(CastResult { hits })
    }

    /// Same as [`RayCaster::cast`], with origin and ray directions given as flat
    /// `[x0, y0, z0, x1, ...]` buffers.
    pub fn cast_flat(
        &self,
        origin: &[FloatType],
        rays: &[FloatType],
        scene: &SceneGraph,
        roots: &[NodeIdx],
    ) -> Result<CastResult> {
        let origin = geometry::point_from_slice("ray origin", origin)?;
        let rays = geometry::vectors_from_flat("ray directions", rays)?;
        self.cast(&origin, &rays, scene, roots)
    }
}

/// Mesh whose global triangles start at `first_triangle` in the gathered triangle list.
struct CastTarget<'a> {
    node: NodeIdx,
    mesh_index: usize,
    mesh: &'a Mesh,
    first_triangle: usize,
}

fn interpolate_uv(mesh: &Mesh, triangle: usize, hit: &RayHit) -> Option<TexturePoint> {
    let uvs = mesh.texture_coordinates()?;
    let triangle = mesh.triangles()[triangle].map(|&i| uvs[i].coords);
    Some(hit.barycentric.interpolate_triangle(&triangle).into())
}
