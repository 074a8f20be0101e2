//! Search primitives shared by the priority-queue planners
//!
//! `NodePool` is an arena of `SearchNode`s with predecessor links stored as
//! indices, and `OpenSet` is a min-priority queue over pool indices with
//! lazy decrease-key: an improved node is pushed again and stale entries
//! are skipped on pop.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::common::{Cell, Path};

/// One grid cell discovered during search
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub cell: Cell,
    /// Cost from start
    pub g: f64,
    /// Heuristic estimate to goal
    pub h: f64,
    pub parent: Option<usize>,
    pub closed: bool,
}

impl SearchNode {
    pub fn f(&self) -> f64 {
        self.g + self.h
    }
}

/// Arena of search nodes, at most one per grid cell
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<SearchNode>,
    /// Grid index -> pool index
    by_cell: Vec<Option<usize>>,
}

impl NodePool {
    pub fn new(cell_count: usize) -> Self {
        NodePool {
            nodes: Vec::new(),
            by_cell: vec![None; cell_count],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pool index of the node at grid index `grid_index`, if discovered
    pub fn lookup(&self, grid_index: usize) -> Option<usize> {
        self.by_cell[grid_index]
    }

    pub fn insert(&mut self, grid_index: usize, node: SearchNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.by_cell[grid_index] = Some(index);
        index
    }

    pub fn get(&self, index: usize) -> &SearchNode {
        &self.nodes[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut SearchNode {
        &mut self.nodes[index]
    }

    /// Walk predecessor links from `goal_index` back to the root
    pub fn reconstruct_path(&self, goal_index: usize) -> Path {
        let mut cells = Vec::new();
        let mut current = Some(goal_index);

        while let Some(index) = current {
            let node = &self.nodes[index];
            cells.push(node.cell);
            current = node.parent;
        }

        cells.reverse();
        Path::from_cells(cells)
    }
}

/// Open set entry. Ordered by f, then h, then insertion sequence, all
/// ascending; `Ord` is reversed so `BinaryHeap` pops the minimum.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: OrderedFloat<f64>,
    h: OrderedFloat<f64>,
    sequence: u64,
    index: usize,
    /// g at push time, used to detect stale entries
    g: f64,
}

impl OpenEntry {
    fn key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>, u64) {
        (self.f, self.h, self.sequence)
    }
}

impl Eq for OpenEntry {}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-priority open set over `NodePool` indices
#[derive(Debug, Default)]
pub struct OpenSet {
    heap: BinaryHeap<OpenEntry>,
    sequence: u64,
    peak: usize,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, node: &SearchNode) {
        self.heap.push(OpenEntry {
            f: OrderedFloat(node.f()),
            h: OrderedFloat(node.h),
            sequence: self.sequence,
            index,
            g: node.g,
        });
        self.sequence += 1;
        self.peak = self.peak.max(self.heap.len());
    }

    /// Pop the best open node, skipping closed nodes and entries
    /// superseded by a cheaper push
    pub fn pop(&mut self, pool: &NodePool) -> Option<usize> {
        while let Some(entry) = self.heap.pop() {
            let node = pool.get(entry.index);
            if node.closed || entry.g > node.g {
                continue;
            }
            return Some(entry.index);
        }
        None
    }

    /// Number of heap entries, stale ones included
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest heap size seen so far
    pub fn peak_len(&self) -> usize {
        self.peak
    }
}
