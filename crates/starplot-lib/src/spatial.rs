//! KD-tree spatial index for nearest-neighbour queries over the catalog.
//!
//! The index is built once per loaded [`Starmap`] and answers the two
//! questions the plotter's cache layer needs: "which systems lie within
//! `r` light-years of a point" and "what are the `k` closest systems".
//! Results are `(SystemId, distance)` pairs sorted by ascending distance.
//!
//! Only systems with a usable position are indexed.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::info;

use crate::db::{Starmap, SystemId};
use crate::geometry::Point3D;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Index node stored per system.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub system_id: SystemId,
    pub coords: [f64; 3],
}

/// Static spatial index over catalog positions.
pub struct SpatialIndex {
    /// Item type is an index into `nodes`.
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    nodes: Vec<IndexNode>,
}

impl SpatialIndex {
    /// Build a spatial index from a starmap.
    pub fn build(starmap: &Starmap) -> Self {
        let mut nodes: Vec<IndexNode> = starmap
            .systems
            .iter()
            .filter_map(|(id, system)| {
                system.position.map(|position| IndexNode {
                    system_id: *id,
                    coords: position.to_array(),
                })
            })
            .collect();
        // HashMap iteration order is random; keep tie ordering reproducible.
        nodes.sort_by_key(|node| node.system_id);

        let index = Self::from_nodes(nodes);
        info!(node_count = index.len(), "built spatial index");
        index
    }

    fn from_nodes(nodes: Vec<IndexNode>) -> Self {
        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, node) in nodes.iter().enumerate() {
            tree.add(&node.coords, index);
        }
        Self { tree, nodes }
    }

    /// Number of indexed systems.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the `k` nearest systems to a point.
    pub fn nearest(&self, point: Point3D, k: usize) -> Vec<(SystemId, f64)> {
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }

        self.tree
            .nearest_n::<SquaredEuclidean>(&point.to_array(), k)
            .into_iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.system_id, neighbour.distance.sqrt())
            })
            .collect()
    }

    /// Find all systems within `radius` of a point.
    pub fn within_radius(&self, point: Point3D, radius: f64) -> Vec<(SystemId, f64)> {
        if radius <= 0.0 || self.nodes.is_empty() {
            return Vec::new();
        }

        let mut neighbours: Vec<(SystemId, f64)> = self
            .tree
            .within::<SquaredEuclidean>(&point.to_array(), radius * radius)
            .into_iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.system_id, neighbour.distance.sqrt())
            })
            .collect();

        neighbours.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbours
    }

    /// Up to `cap` systems within `radius` of a point, nearest first.
    pub fn nearest_within(&self, point: Point3D, radius: f64, cap: usize) -> Vec<(SystemId, f64)> {
        if radius <= 0.0 {
            return Vec::new();
        }
        let mut candidates = self.nearest(point, cap);
        candidates.retain(|(_, distance)| *distance <= radius);
        candidates
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}
