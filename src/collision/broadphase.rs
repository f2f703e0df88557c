//! Broad-phase spatial indexes.
//!
//! A space keeps two indexes: one for shapes whose bodies move and one for static
//! (and sleeping) shapes. Both answer the same queries; the dynamic one also
//! enumerates its own overlapping pairs every step.

use crate::{
    collision::{bbtree::BBTree, spatial_hash::SpaceHash},
    config::IndexStrategy,
    core::bb::BB,
    utils::{allocator::ShapeId, math::Vect},
};

/// Operations every broad-phase structure supports.
///
/// Results are returned in a deterministic order that depends only on the
/// sequence of inserts, removes and updates.
pub trait SpatialIndex {
    fn insert(&mut self, id: ShapeId, bb: BB);

    /// Removes `id`, returning `false` if it was not indexed.
    fn remove(&mut self, id: ShapeId) -> bool;

    /// Moves `id` to its new bounding box.
    fn update(&mut self, id: ShapeId, bb: BB);

    fn contains(&self, id: ShapeId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ids(&self) -> Vec<ShapeId>;

    /// Shapes whose stored bounding box overlaps `bb`.
    fn query(&self, bb: BB) -> Vec<ShapeId>;

    /// Shapes whose stored bounding box is crossed by the segment `a -> b`,
    /// roughly sorted by distance from `a`.
    fn segment_query(&self, a: Vect, b: Vect) -> Vec<ShapeId>;

    /// All overlapping pairs of indexed shapes, each reported once.
    fn pairs(&self) -> Vec<(ShapeId, ShapeId)>;
}

/// Spatial index selected by [`IndexStrategy`].
#[derive(Debug, Clone)]
pub enum BroadPhase {
    Tree(BBTree),
    Hash(SpaceHash),
}

impl BroadPhase {
    pub fn new(strategy: IndexStrategy) -> Self {
        match strategy {
            IndexStrategy::BBTree => BroadPhase::Tree(BBTree::new()),
            IndexStrategy::SpatialHash { dim, count } => BroadPhase::Hash(SpaceHash::new(dim, count)),
        }
    }

    /// Rebuilds the index with another strategy, keeping its contents.
    pub fn rebuild(&mut self, strategy: IndexStrategy, bb_for: impl Fn(ShapeId) -> BB) {
        let mut next = BroadPhase::new(strategy);
        for id in self.ids() {
            next.insert(id, bb_for(id));
        }
        *self = next;
    }

    fn inner(&self) -> &dyn SpatialIndex {
        match self {
            BroadPhase::Tree(tree) => tree,
            BroadPhase::Hash(hash) => hash,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SpatialIndex {
        match self {
            BroadPhase::Tree(tree) => tree,
            BroadPhase::Hash(hash) => hash,
        }
    }
}

impl SpatialIndex for BroadPhase {
    fn insert(&mut self, id: ShapeId, bb: BB) {
        self.inner_mut().insert(id, bb);
    }

    fn remove(&mut self, id: ShapeId) -> bool {
        self.inner_mut().remove(id)
    }

    fn update(&mut self, id: ShapeId, bb: BB) {
        self.inner_mut().update(id, bb);
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.inner().contains(id)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn ids(&self) -> Vec<ShapeId> {
        self.inner().ids()
    }

    fn query(&self, bb: BB) -> Vec<ShapeId> {
        self.inner().query(bb)
    }

    fn segment_query(&self, a: Vect, b: Vect) -> Vec<ShapeId> {
        self.inner().segment_query(a, b)
    }

    fn pairs(&self) -> Vec<(ShapeId, ShapeId)> {
        self.inner().pairs()
    }
}
