use thiserror::Error;

use crate::scene::NodeIdx;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid shape of {what}: expected {expected}, found {found}")]
    Shape {
        what: &'static str,
        expected: String,
        found: String,
    },

    #[error("Face range {start}..{end} is outside of the index table ({triangle_count} triangles)")]
    FaceRangeOutOfBounds {
        start: usize,
        end: usize,
        triangle_count: usize,
    },

    #[error("Face range {start}..{end} overlaps another range of material {material:?}")]
    OverlappingFaceRange {
        material: String,
        start: usize,
        end: usize,
    },

    #[error("Matrix is not invertible")]
    SingularMatrix,

    #[error("Attempt to modify vertices of static mesh {mesh:?}")]
    AttemptToMutateStatic { mesh: String },

    #[error("Mesh materials do not contain material {name:?}")]
    MaterialNotFound { name: String },

    #[error("Scene graph does not contain node {node:?}")]
    NodeNotFound { node: NodeIdx },

    #[error("Binding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeIdx, child: NodeIdx },

    #[error("Failed to start intersection worker thread: {message}")]
    WorkerSpawn { message: String },
}

impl Error {
    pub(crate) fn shape(
        what: &'static str,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        Error::Shape {
            what,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
