//! Scene graph: an arena of nodes linked by parent indices.
//!
//! Nodes never own each other, the graph owns all of them and a node refers to its parent
//! and children by [`NodeIdx`]. Nodes without a parent are the top-level nodes of the
//! scene, their transforms are parented to the identity root.

mod behaviour;
mod node_transform;
mod walk;

use std::fmt;

use index_vec::IndexVec;
use nalgebra::Unit;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    geometry::{Matrix, WorldPoint, WorldVector},
    mesh::MeshCollection,
    ray_caster::{CastResult, RayCaster},
    transform::{Space, Spatial as _, Transform},
};

pub use behaviour::{NodeBehaviour, Timer};
pub use node_transform::{NodeTransform, NodeTransformMut};
pub use walk::{PostOrder, PreOrder};

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
}

#[derive(Clone, Debug, Default)]
pub enum NodeKind {
    /// Grouping node without geometry
    #[default]
    Empty,
    Geometry(MeshCollection),
    /// Virtual camera, looking along the forward axis of its transform
    Camera,
}

impl NodeKind {
    pub fn has_mesh(&self) -> bool {
        matches!(self, NodeKind::Geometry(_))
    }

    pub fn meshes(&self) -> Option<&MeshCollection> {
        match self {
            NodeKind::Geometry(meshes) => Some(meshes),
            _ => None,
        }
    }

    pub fn meshes_mut(&mut self) -> Option<&mut MeshCollection> {
        match self {
            NodeKind::Geometry(meshes) => Some(meshes),
            _ => None,
        }
    }
}

pub struct SceneNode {
    name: String,
    /// Local transform, relative to the parent node
    transform: Transform,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
    kind: NodeKind,
    visible: bool,
    behaviour: Option<Box<dyn NodeBehaviour>>,
    setup_done: bool,
}

impl SceneNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn parent(&self) -> Option<NodeIdx> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIdx] {
        &self.children
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Visible node with geometry.
    pub fn is_castable(&self) -> bool {
        self.visible && self.kind.has_mesh()
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("visible", &self.visible)
            .field("has_behaviour", &self.behaviour.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: IndexVec<NodeIdx, SceneNode>,
    ray_caster: RayCaster,
}

impl SceneGraph {
    pub fn new() -> SceneGraph {
        SceneGraph::default()
    }

    /// Empty scene whose [`SceneGraph::cast_rays_from_origin`] uses the given caster.
    pub fn with_ray_caster(ray_caster: RayCaster) -> SceneGraph {
        SceneGraph {
            nodes: IndexVec::new(),
            ray_caster,
        }
    }

    /// Adds a new top-level node with identity transform.
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeIdx {
        self.nodes.push(SceneNode {
            name: name.into(),
            transform: Transform::identity(),
            parent: None,
            children: Vec::new(),
            kind,
            visible: true,
            behaviour: None,
            setup_done: false,
        })
    }

    /// Adds a new node as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeIdx,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeIdx> {
        self.check(parent)?;
        let child = self.add_node(name, kind);
        self.bind(parent, child)?;
        Ok(child)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node: NodeIdx) -> Result<&SceneNode> {
        self.nodes.get(node).ok_or(Error::NodeNotFound { node })
    }

    pub fn node_mut(&mut self, node: NodeIdx) -> Result<&mut SceneNode> {
        self.nodes.get_mut(node).ok_or(Error::NodeNotFound { node })
    }

    /// First node with the given name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeIdx> {
        self.nodes
            .iter_enumerated()
            .find_map(|(idx, node)| (node.name == name).then_some(idx))
    }

    fn check(&self, node: NodeIdx) -> Result<()> {
        self.node(node).map(|_| ())
    }

    /// Makes `child` the last child of `parent`, detaching it from its previous parent.
    /// The local matrix of the child is kept, so its global transform follows the new parent.
    /// Fails without modifying the graph if `child` is `parent` or one of its ancestors.
    pub fn bind(&mut self, parent: NodeIdx, child: NodeIdx) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;

        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == child {
                return Err(Error::Cycle { parent, child });
            }
            ancestor = self.nodes[node].parent;
        }

        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        trace!(?parent, ?child, "bound node");
        Ok(())
    }

    /// Detaches a node from its parent, making it a top-level node.
    pub fn unbind(&mut self, node: NodeIdx) -> Result<()> {
        self.check(node)?;
        self.detach(node);
        Ok(())
    }

    fn detach(&mut self, node: NodeIdx) {
        if let Some(old_parent) = self.nodes[node].parent.take() {
            self.nodes[old_parent].children.retain(|&c| c != node);
        }
    }

    pub fn parent(&self, node: NodeIdx) -> Result<Option<NodeIdx>> {
        Ok(self.node(node)?.parent)
    }

    pub fn children(&self, node: NodeIdx) -> Result<&[NodeIdx]> {
        Ok(self.node(node)?.children())
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes
            .iter_enumerated()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(idx, _)| idx)
    }

    pub fn set_visible(&mut self, node: NodeIdx, visible: bool) -> Result<()> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    pub fn set_behaviour(&mut self, node: NodeIdx, behaviour: Box<dyn NodeBehaviour>) -> Result<()> {
        let node = self.node_mut(node)?;
        node.behaviour = Some(behaviour);
        node.setup_done = false;
        Ok(())
    }

    pub fn meshes_mut(&mut self, node: NodeIdx) -> Result<Option<&mut MeshCollection>> {
        Ok(self.node_mut(node)?.kind.meshes_mut())
    }

    /// Lazy depth-first walk over all nodes reachable from `roots`, parents first.
    /// A node reachable from several of the roots is visited once per root.
    pub fn walk_pre_order(&self, roots: &[NodeIdx]) -> Result<PreOrder<'_>> {
        roots.iter().try_for_each(|&root| self.check(root))?;
        Ok(PreOrder::new(self, roots))
    }

    /// Lazy depth-first walk over all nodes reachable from `roots`, children first.
    pub fn walk_post_order(&self, roots: &[NodeIdx]) -> Result<PostOrder<'_>> {
        roots.iter().try_for_each(|&root| self.check(root))?;
        Ok(PostOrder::new(self, roots))
    }

    pub fn transform(&self, node: NodeIdx) -> Result<NodeTransform<'_>> {
        self.check(node)?;
        Ok(NodeTransform { graph: self, node })
    }

    pub fn transform_mut(&mut self, node: NodeIdx) -> Result<NodeTransformMut<'_>> {
        self.check(node)?;
        Ok(NodeTransformMut { graph: self, node })
    }

    /// Product of the local matrices of all ancestors of a valid node.
    /// Recomputed on every call.
    fn parent_global_matrix(&self, node: NodeIdx) -> Matrix {
        let mut matrix = Matrix::identity();
        let mut ancestor = self.nodes[node].parent;
        while let Some(a) = ancestor {
            matrix = matrix * self.nodes[a].transform.matrix();
            ancestor = self.nodes[a].parent;
        }
        matrix
    }

    pub fn global_matrix(&self, node: NodeIdx) -> Result<Matrix> {
        Ok(self.transform(node)?.get_matrix(Space::Global))
    }

    /// Global forward direction of a (camera) node.
    pub fn view_direction(&self, node: NodeIdx) -> Result<Unit<WorldVector>> {
        Ok(self.transform(node)?.get_forward(Space::Global))
    }

    /// Casts rays against everything reachable from the top-level nodes.
    pub fn cast_rays_from_origin(
        &self,
        origin: &WorldPoint,
        rays: &[WorldVector],
    ) -> Result<CastResult> {
        let roots: Vec<NodeIdx> = self.roots().collect();
        self.ray_caster.cast(origin, rays, self, &roots)
    }

    /// Advances the timer and runs the behaviours of all nodes, children before parents.
    /// Behaviours may modify the graph, the visiting order is fixed before the first one runs.
    pub fn update(&mut self, timer: &mut Timer) -> Result<()> {
        timer.update();
        self.run_behaviours(timer)
    }

    fn run_behaviours(&mut self, timer: &Timer) -> Result<()> {
        let roots: Vec<NodeIdx> = self.roots().collect();
        let order: Vec<NodeIdx> = PostOrder::new(self, &roots).collect();
        debug!(nodes = order.len(), frame = timer.frame(), "updating scene");

        for node in order {
            let Some(mut behaviour) = self.nodes[node].behaviour.take() else {
                continue;
            };

            let result = self.run_behaviour(behaviour.as_mut(), node, timer);

            let slot = &mut self.nodes[node];
            if slot.behaviour.is_none() {
                slot.behaviour = Some(behaviour);
            }
            result?;
        }
        Ok(())
    }

    fn run_behaviour(
        &mut self,
        behaviour: &mut dyn NodeBehaviour,
        node: NodeIdx,
        timer: &Timer,
    ) -> Result<()> {
        if !self.nodes[node].setup_done {
            behaviour.setup(self, node, timer)?;
            if self.nodes[node].behaviour.is_some() {
                // Replaced during setup, the replacement gets its own setup next update
                return Ok(());
            }
            self.nodes[node].setup_done = true;
        }
        behaviour.update(self, node, timer)
    }
}
