//! Nearest neighbor search implementations

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use viscrate_core::{Error, NearestNeighborSearch, Point3f, Result};

/// Leaf capacity of `kiddo::ImmutableKdTree<f32, 3>`
const BUCKET_SIZE: usize = 32;

enum Index {
    Tree(ImmutableKdTree<f32, 3>),
    /// Used when the points cannot be split into buckets, e.g. many exact duplicates
    Linear(BruteForceSearch),
}

/// KD-Tree implementation for nearest neighbor search
///
/// Built in one pass with `ImmutableKdTree`, which accepts any number of
/// points sharing a value on one axis (flat scans, regular grids).
pub struct KdTree {
    index: Index,
    len: usize,
}

impl KdTree {
    /// Build a tree over `points`; item ids are the slice indices
    pub fn new(points: &[Point3f]) -> Result<Self> {
        if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData("point cloud contains non-finite coordinates".into()));
        }

        if points.is_empty() || max_duplicates(points) > BUCKET_SIZE {
            log::debug!("no tree for {} points, using linear search", points.len());
            return Ok(Self {
                index: Index::Linear(BruteForceSearch::new(points)),
                len: points.len(),
            });
        }

        let entries: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        let index = match catch_unwind(AssertUnwindSafe(|| ImmutableKdTree::<f32, 3>::new_from_slice(&entries))) {
            Ok(tree) => Index::Tree(tree),
            Err(_) => {
                log::warn!("kd-tree construction failed for {} points, using linear search", points.len());
                Index::Linear(BruteForceSearch::new(points))
            }
        };

        Ok(Self {
            index,
            len: points.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether queries go through the tree rather than a linear scan
    pub fn is_tree(&self) -> bool {
        matches!(self.index, Index::Tree(_))
    }
}

/// Largest number of points at exactly the same position
///
/// A leaf can only be split along an axis where its points differ.
fn max_duplicates(points: &[Point3f]) -> usize {
    let mut counts: HashMap<[u32; 3], usize> = HashMap::new();
    // +0.0 folds -0.0 into 0.0
    let key = |c: f32| (c + 0.0).to_bits();
    points
        .iter()
        .map(|p| {
            let count = counts.entry([key(p.x), key(p.y), key(p.z)]).or_insert(0);
            *count += 1;
            *count
        })
        .max()
        .unwrap_or(0)
}

impl NearestNeighborSearch for KdTree {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        match &self.index {
            Index::Tree(tree) => tree
                .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k.min(self.len))
                .into_iter()
                .map(|nn| (nn.item as usize, nn.distance.sqrt()))
                .collect(),
            Index::Linear(brute) => brute.find_k_nearest(query, k),
        }
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if self.is_empty() || radius < 0.0 {
            return Vec::new();
        }

        match &self.index {
            Index::Tree(tree) => tree
                .within::<SquaredEuclidean>(&[query.x, query.y, query.z], radius * radius)
                .into_iter()
                .map(|nn| (nn.item as usize, nn.distance.sqrt()))
                .collect(),
            Index::Linear(brute) => brute.find_radius_neighbors(query, radius),
        }
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch {
    points: Vec<Point3f>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3f]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<(usize, f32)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx, (point - query).norm()))
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance = (point - query).norm();
                (distance <= radius).then_some((idx, distance))
            })
            .collect()
    }
}
