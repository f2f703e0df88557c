//! Dynamic bounding-box tree.

use std::collections::BTreeMap;

use crate::{
    collision::broadphase::SpatialIndex,
    core::bb::BB,
    utils::{allocator::ShapeId, math::Vect},
};

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf(ShapeId),
    Branch(usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bb: BB,
    parent: Option<usize>,
    kind: NodeKind,
}

/// Binary tree of bounding boxes, balanced greedily by merged area on insert.
///
/// A leaf keeps its box until the shape moves outside of it, so slowly drifting
/// shapes do not restructure the tree every step.
#[derive(Debug, Clone, Default)]
pub struct BBTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
    leaves: BTreeMap<ShapeId, usize>,
}

impl BBTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if let NodeKind::Branch(a, b) = &mut self.nodes[parent].kind {
            if *a == old {
                *a = new;
            } else {
                debug_assert_eq!(*b, old, "Node is not a child of its parent");
                *b = new;
            }
        }
    }

    fn refit(&mut self, mut node: Option<usize>) {
        while let Some(index) = node {
            if let NodeKind::Branch(a, b) = self.nodes[index].kind {
                self.nodes[index].bb = self.nodes[a].bb.merge(&self.nodes[b].bb);
            }
            node = self.nodes[index].parent;
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        let Some(root) = self.root else {
            self.nodes[leaf].parent = None;
            self.root = Some(leaf);
            return;
        };

        let leaf_bb = self.nodes[leaf].bb;
        let mut sibling = root;
        while let NodeKind::Branch(a, b) = self.nodes[sibling].kind {
            let cost_a = self.nodes[b].bb.area() + self.nodes[a].bb.merged_area(&leaf_bb);
            let cost_b = self.nodes[a].bb.area() + self.nodes[b].bb.merged_area(&leaf_bb);
            sibling = if cost_b < cost_a { b } else { a };
        }

        let parent = self.nodes[sibling].parent;
        let branch = self.alloc(Node {
            bb: self.nodes[sibling].bb.merge(&leaf_bb),
            parent,
            kind: NodeKind::Branch(sibling, leaf),
        });
        self.nodes[sibling].parent = Some(branch);
        self.nodes[leaf].parent = Some(branch);

        match parent {
            Some(p) => self.replace_child(p, sibling, branch),
            None => self.root = Some(branch),
        }
        self.refit(parent);
    }

    fn detach_leaf(&mut self, leaf: usize) {
        let Some(parent) = self.nodes[leaf].parent else {
            self.root = None;
            return;
        };

        let sibling = match self.nodes[parent].kind {
            NodeKind::Branch(a, b) if a == leaf => b,
            NodeKind::Branch(a, _) => a,
            NodeKind::Leaf(_) => unreachable!("Leaf nodes have no children"),
        };

        let grandparent = self.nodes[parent].parent;
        self.nodes[sibling].parent = grandparent;
        match grandparent {
            Some(g) => self.replace_child(g, parent, sibling),
            None => self.root = Some(sibling),
        }
        self.free.push(parent);
        self.nodes[leaf].parent = None;
        self.refit(grandparent);
    }

    fn visit(&self, mut overlaps: impl FnMut(&BB) -> bool, mut leaf: impl FnMut(ShapeId, &BB)) {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !overlaps(&node.bb) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf(id) => leaf(id, &node.bb),
                NodeKind::Branch(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }
            }
        }
    }

    /// Height of the tree, mainly useful for diagnostics.
    pub fn depth(&self) -> usize {
        fn depth_of(tree: &BBTree, index: usize) -> usize {
            match tree.nodes[index].kind {
                NodeKind::Leaf(_) => 1,
                NodeKind::Branch(a, b) => 1 + depth_of(tree, a).max(depth_of(tree, b)),
            }
        }
        self.root.map_or(0, |root| depth_of(self, root))
    }
}

impl SpatialIndex for BBTree {
    fn insert(&mut self, id: ShapeId, bb: BB) {
        assert!(!self.leaves.contains_key(&id), "Shape {id:?} is already in the tree");
        let leaf = self.alloc(Node {
            bb,
            parent: None,
            kind: NodeKind::Leaf(id),
        });
        self.leaves.insert(id, leaf);
        self.insert_leaf(leaf);
    }

    fn remove(&mut self, id: ShapeId) -> bool {
        let Some(leaf) = self.leaves.remove(&id) else {
            return false;
        };
        self.detach_leaf(leaf);
        self.free.push(leaf);
        true
    }

    fn update(&mut self, id: ShapeId, bb: BB) {
        let Some(&leaf) = self.leaves.get(&id) else {
            self.insert(id, bb);
            return;
        };
        if self.nodes[leaf].bb.contains(&bb) {
            return;
        }
        self.detach_leaf(leaf);
        self.nodes[leaf].bb = bb;
        self.insert_leaf(leaf);
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.leaves.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.leaves.len()
    }

    fn ids(&self) -> Vec<ShapeId> {
        self.leaves.keys().copied().collect()
    }

    fn query(&self, bb: BB) -> Vec<ShapeId> {
        let mut hits = Vec::new();
        self.visit(|node| node.intersects(&bb), |id, _| hits.push(id));
        hits.sort_unstable();
        hits
    }

    fn segment_query(&self, a: Vect, b: Vect) -> Vec<ShapeId> {
        let mut hits = Vec::new();
        self.visit(
            |node| node.intersects_segment(a, b),
            |id, leaf_bb| hits.push((leaf_bb.segment_query(a, b), id)),
        );
        hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    fn pairs(&self) -> Vec<(ShapeId, ShapeId)> {
        let mut pairs = Vec::new();
        for (&id, &leaf) in &self.leaves {
            let bb = self.nodes[leaf].bb;
            self.visit(
                |node| node.intersects(&bb),
                |other, _| {
                    if id < other {
                        pairs.push((id, other));
                    }
                },
            );
        }
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_of_boxes_has_no_pairs() {
        let mut tree = BBTree::new();
        for i in 0..64 {
            let x = i as f64 * 2.0;
            tree.insert(ShapeId::new(i, 0), BB::new(x, 0.0, x + 1.0, 1.0));
        }
        assert_eq!(tree.len(), 64);
        assert!(tree.pairs().is_empty());
        assert!(tree.depth() > 1);
        assert_eq!(
            tree.query(BB::new(20.5, 0.5, 22.5, 0.5)),
            vec![ShapeId::new(10, 0), ShapeId::new(11, 0)]
        );
    }

    #[test]
    fn contained_update_keeps_the_old_box() {
        let mut tree = BBTree::new();
        let id = ShapeId::new(0, 0);
        tree.insert(id, BB::new(0.0, 0.0, 4.0, 4.0));
        tree.update(id, BB::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(tree.query(BB::new(3.5, 3.5, 5.0, 5.0)), vec![id]);

        tree.update(id, BB::new(10.0, 10.0, 11.0, 11.0));
        assert!(tree.query(BB::new(3.5, 3.5, 5.0, 5.0)).is_empty());
    }

    #[test]
    fn nodes_are_recycled_after_removal() {
        let mut tree = BBTree::new();
        for i in 0..8 {
            tree.insert(ShapeId::new(i, 0), BB::new(0.0, 0.0, 1.0, 1.0));
        }
        let allocated = tree.nodes.len();
        for i in 0..8 {
            assert!(tree.remove(ShapeId::new(i, 0)));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);

        for i in 0..8 {
            tree.insert(ShapeId::new(i, 1), BB::new(0.0, 0.0, 1.0, 1.0));
        }
        assert_eq!(tree.nodes.len(), allocated);
        assert_eq!(tree.pairs().len(), 28);
    }
}
