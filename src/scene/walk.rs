use super::{NodeIdx, SceneGraph};

/// Depth-first walk visiting every node before its children.
/// Roots and children are visited in their stored order.
pub struct PreOrder<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeIdx>,
}

impl<'a> PreOrder<'a> {
    pub(super) fn new(graph: &'a SceneGraph, roots: &[NodeIdx]) -> Self {
        PreOrder {
            graph,
            stack: roots.iter().rev().copied().collect(),
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.graph.nodes[node].children.iter().rev().copied());
        Some(node)
    }
}

/// Depth-first walk visiting every node after all of its children.
pub struct PostOrder<'a> {
    graph: &'a SceneGraph,
    /// Nodes with a flag telling whether their children were already pushed
    stack: Vec<(NodeIdx, bool)>,
}

impl<'a> PostOrder<'a> {
    pub(super) fn new(graph: &'a SceneGraph, roots: &[NodeIdx]) -> Self {
        PostOrder {
            graph,
            stack: roots.iter().rev().map(|&root| (root, false)).collect(),
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node);
            }
            self.stack.push((node, true));
            self.stack.extend(
                self.graph.nodes[node]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, false)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::scene::{NodeIdx, NodeKind, SceneGraph};
    use assert2::{assert, let_assert};

    /// ```text
    /// a        e
    /// +- b
    /// |  +- c
    /// +- d
    /// ```
    fn tree() -> (SceneGraph, [NodeIdx; 5]) {
        let mut graph = SceneGraph::new();
        let a = graph.add_node("a", NodeKind::Empty);
        let b = graph.add_child(a, "b", NodeKind::Empty).unwrap();
        let c = graph.add_child(b, "c", NodeKind::Empty).unwrap();
        let d = graph.add_child(a, "d", NodeKind::Empty).unwrap();
        let e = graph.add_node("e", NodeKind::Empty);
        (graph, [a, b, c, d, e])
    }

    #[test]
    fn pre_order_parents_first() {
        let (graph, [a, b, c, d, e]) = tree();
        let_assert!(Ok(walk) = graph.walk_pre_order(&[a, e]));
        assert!(walk.collect::<Vec<_>>() == vec![a, b, c, d, e]);
    }

    #[test]
    fn post_order_children_first() {
        let (graph, [a, b, c, d, e]) = tree();
        let_assert!(Ok(walk) = graph.walk_post_order(&[a, e]));
        assert!(walk.collect::<Vec<_>>() == vec![c, b, d, a, e]);
    }

    #[test]
    fn walk_from_inner_node() {
        let (graph, [_, b, c, _, _]) = tree();
        let_assert!(Ok(walk) = graph.walk_post_order(&[b]));
        assert!(walk.collect::<Vec<_>>() == vec![c, b]);
    }

    #[test]
    fn walk_is_lazy() {
        let (graph, [a, b, ..]) = tree();
        let mut walk = graph.walk_pre_order(&[a]).unwrap();
        assert!(walk.next() == Some(a));
        assert!(walk.next() == Some(b));
    }

    #[test]
    fn walk_empty_roots() {
        let (graph, _) = tree();
        assert!(graph.walk_pre_order(&[]).unwrap().next().is_none());
    }
}
