//! Uniform grid broad phase.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    collision::broadphase::SpatialIndex,
    core::bb::BB,
    utils::{allocator::ShapeId, math::Vect},
};

type Cell = (i64, i64);

/// Uniform grid spatial partitioning.
///
/// Each shape is registered in every cell its bounding box touches. Works best
/// when `cell_dim` is close to the size of a typical shape.
#[derive(Debug, Clone)]
pub struct SpaceHash {
    cell_dim: f64,
    grid: HashMap<Cell, Vec<ShapeId>>,
    bbs: BTreeMap<ShapeId, BB>,
}

impl SpaceHash {
    /// `count` is a hint for the number of occupied cells.
    pub fn new(cell_dim: f64, count: usize) -> Self {
        assert!(cell_dim > 0.0, "Spatial hash cell size must be positive, got {cell_dim}");
        Self {
            cell_dim,
            grid: HashMap::with_capacity(count),
            bbs: BTreeMap::new(),
        }
    }

    pub fn cell_dim(&self) -> f64 {
        self.cell_dim
    }

    fn world_to_grid(&self, x: f64, y: f64) -> Cell {
        (
            (x / self.cell_dim).floor() as i64,
            (y / self.cell_dim).floor() as i64,
        )
    }

    /// Number of cells covered by `bb`, as a float so huge or infinite boxes don't overflow.
    fn cell_span(&self, bb: &BB) -> f64 {
        let w = (bb.r / self.cell_dim).floor() - (bb.l / self.cell_dim).floor() + 1.0;
        let h = (bb.t / self.cell_dim).floor() - (bb.b / self.cell_dim).floor() + 1.0;
        w * h
    }

    fn cell_range(&self, bb: &BB) -> (Cell, Cell) {
        (self.world_to_grid(bb.l, bb.b), self.world_to_grid(bb.r, bb.t))
    }

    fn for_each_cell(&self, bb: &BB, mut visit: impl FnMut(Cell)) {
        let (min, max) = self.cell_range(bb);
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                visit((x, y));
            }
        }
    }

    fn link(&mut self, id: ShapeId, bb: &BB) {
        let mut cells = Vec::new();
        self.for_each_cell(bb, |cell| cells.push(cell));
        for cell in cells {
            self.grid.entry(cell).or_default().push(id);
        }
    }

    fn unlink(&mut self, id: ShapeId, bb: &BB) {
        let mut cells = Vec::new();
        self.for_each_cell(bb, |cell| cells.push(cell));
        for cell in cells {
            if let Some(ids) = self.grid.get_mut(&cell) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.grid.remove(&cell);
                }
            }
        }
    }
}

impl SpatialIndex for SpaceHash {
    fn insert(&mut self, id: ShapeId, bb: BB) {
        assert!(!self.bbs.contains_key(&id), "Shape {id:?} is already in the hash");
        self.link(id, &bb);
        self.bbs.insert(id, bb);
    }

    fn remove(&mut self, id: ShapeId) -> bool {
        match self.bbs.remove(&id) {
            Some(bb) => {
                self.unlink(id, &bb);
                true
            }
            None => false,
        }
    }

    fn update(&mut self, id: ShapeId, bb: BB) {
        let Some(old) = self.bbs.insert(id, bb) else {
            self.link(id, &bb);
            return;
        };
        if self.cell_range(&old) != self.cell_range(&bb) {
            self.unlink(id, &old);
            self.link(id, &bb);
        }
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.bbs.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.bbs.len()
    }

    fn ids(&self) -> Vec<ShapeId> {
        self.bbs.keys().copied().collect()
    }

    fn query(&self, bb: BB) -> Vec<ShapeId> {
        // Walking more cells than are occupied is slower than checking every entry.
        // The negated test also catches NaN spans from infinite boxes.
        if !(self.cell_span(&bb) <= self.grid.len() as f64) {
            return self
                .bbs
                .iter()
                .filter(|(_, other)| other.intersects(&bb))
                .map(|(&id, _)| id)
                .collect();
        }

        let mut results = Vec::new();
        self.for_each_cell(&bb, |cell| {
            if let Some(ids) = self.grid.get(&cell) {
                results.extend(ids.iter().copied().filter(|id| self.bbs[id].intersects(&bb)));
            }
        });

        results.sort_unstable();
        results.dedup();
        results
    }

    /// Walks the cells crossed by the segment in order.
    fn segment_query(&self, a: Vect, b: Vect) -> Vec<ShapeId> {
        let a_cell = a / self.cell_dim;
        let b_cell = b / self.cell_dim;

        let mut cell_x = a_cell.x.floor() as i64;
        let mut cell_y = a_cell.y.floor() as i64;

        let (x_inc, temp_h) = if b_cell.x > a_cell.x {
            (1, a_cell.x.floor() + 1.0 - a_cell.x)
        } else {
            (-1, a_cell.x - a_cell.x.floor())
        };
        let (y_inc, temp_v) = if b_cell.y > a_cell.y {
            (1, a_cell.y.floor() + 1.0 - a_cell.y)
        } else {
            (-1, a_cell.y - a_cell.y.floor())
        };

        let dx = (b_cell.x - a_cell.x).abs();
        let dy = (b_cell.y - a_cell.y).abs();
        if !(dx + dy <= self.grid.len() as f64) {
            let mut hits: Vec<(f64, ShapeId)> = self
                .bbs
                .iter()
                .map(|(&id, bb)| (bb.segment_query(a, b), id))
                .filter(|(entry, _)| entry.is_finite())
                .collect();
            hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
            return hits.into_iter().map(|(_, id)| id).collect();
        }
        let dt_dx = if dx != 0.0 { 1.0 / dx } else { f64::INFINITY };
        let dt_dy = if dy != 0.0 { 1.0 / dy } else { f64::INFINITY };

        let mut next_h = if temp_h != 0.0 { temp_h * dt_dx } else { dt_dx };
        let mut next_v = if temp_v != 0.0 { temp_v * dt_dy } else { dt_dy };

        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        let mut t = 0.0;
        while t <= 1.0 {
            if let Some(ids) = self.grid.get(&(cell_x, cell_y)) {
                for &id in ids {
                    if seen.insert(id) {
                        let entry = self.bbs[&id].segment_query(a, b);
                        if entry.is_finite() {
                            hits.push((entry, id));
                        }
                    }
                }
            }

            if next_v < next_h {
                cell_y += y_inc;
                t = next_v;
                next_v += dt_dy;
            } else {
                cell_x += x_inc;
                t = next_h;
                next_h += dt_dx;
            }
        }

        hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }

    fn pairs(&self) -> Vec<(ShapeId, ShapeId)> {
        let mut checked = HashSet::new();
        let mut pairs = Vec::new();

        for ids in self.grid.values() {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    let pair_key = if a < b { (a, b) } else { (b, a) };
                    if checked.insert(pair_key) && self.bbs[&a].intersects(&self.bbs[&b]) {
                        pairs.push(pair_key);
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }
}
