mod error;
pub mod geometry;
pub mod intersection;
pub mod mesh;
mod ray_caster;
pub mod scene;
pub mod transform;
mod util;

pub use crate::ray_caster::{CastHit, CastResult, RayCaster};
pub use error::{Error, Result};
pub use intersection::{IntersectionEngine, IntersectionSettings, WorkerCount};
pub use mesh::{Material, Mesh, MeshCollection, MeshKind, MeshMaterials};
pub use scene::{NodeIdx, NodeKind, SceneGraph};
pub use transform::{Eulers, Pivot, Space, Spatial, SpatialMut, Transform};
