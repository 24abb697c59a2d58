use crate::{
    geometry::Matrix,
    transform::{Spatial, SpatialMut},
};

use super::{NodeIdx, SceneGraph};

/// Read view of a node's transform, parented to the transform of the node's parent.
#[derive(Copy, Clone)]
pub struct NodeTransform<'a> {
    pub(super) graph: &'a SceneGraph,
    pub(super) node: NodeIdx,
}

impl Spatial for NodeTransform<'_> {
    fn local_matrix(&self) -> Matrix {
        self.graph.nodes[self.node].transform.local_matrix()
    }

    fn parent_global_matrix(&self) -> Matrix {
        self.graph.parent_global_matrix(self.node)
    }
}

/// Write view of a node's transform.
/// Mutations only touch the local matrix of the node.
pub struct NodeTransformMut<'a> {
    pub(super) graph: &'a mut SceneGraph,
    pub(super) node: NodeIdx,
}

impl Spatial for NodeTransformMut<'_> {
    fn local_matrix(&self) -> Matrix {
        self.graph.nodes[self.node].transform.local_matrix()
    }

    fn parent_global_matrix(&self) -> Matrix {
        self.graph.parent_global_matrix(self.node)
    }
}

impl SpatialMut for NodeTransformMut<'_> {
    fn set_local_matrix(&mut self, value: Matrix) {
        self.graph.nodes[self.node].transform.set_local_matrix(value);
    }
}
