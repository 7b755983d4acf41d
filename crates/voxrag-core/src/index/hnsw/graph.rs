//! Hierarchical navigable small world graph.
//!
//! Keyed by vector-store id rather than an internally assigned index: the
//! graph stores only ids and per-layer adjacency lists (an arena-of-ids, not
//! a pointer graph — ids keep the structure movable, compact, and free of
//! ownership cycles), and fetches vectors from the vector store on every
//! distance computation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::config::HnswConfig;
use crate::distance::euclidean;
use crate::error::{Error, Result};
use crate::storage::MmapStorage;

use super::layer::{Layer, NodeId};
use super::ordered_float::OrderedFloat;

/// HNSW graph over ids resolved against an external [`MmapStorage`].
pub struct HnswGraph {
    config: HnswConfig,
    layers: RwLock<Vec<Layer>>,
    entry_point: RwLock<Option<NodeId>>,
    max_layer: AtomicUsize,
    count: AtomicUsize,
    rng_state: AtomicU64,
    /// `-1 / ln(retention_probability)`, the geometric-distribution level multiplier.
    level_mult: f64,
}

impl HnswGraph {
    /// Creates an empty graph with the given parameters.
    #[must_use]
    pub fn new(config: HnswConfig) -> Self {
        let level_mult = -1.0 / config.level_retention_probability.ln();
        Self {
            config,
            layers: RwLock::new(vec![Layer::new(0)]),
            entry_point: RwLock::new(None),
            max_layer: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            rng_state: AtomicU64::new(0x5DEE_CE66_D1A4_B5B5),
            level_mult,
        }
    }

    /// Number of nodes currently in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `id` (whose vector is `vector.len() == dim` and already
    /// durably persisted at the same id in `store`) into the graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Index`] if an existing node's vector can no longer
    /// be read from `store` (the graph and store have diverged).
    pub fn add(&self, id: NodeId, vector: &[f32], store: &MmapStorage) -> Result<()> {
        let node_layer = self.random_layer();

        {
            let mut layers = self.layers.write();
            while layers.len() <= node_layer {
                layers.push(Layer::new(id + 1));
            }
            for layer in layers.iter_mut() {
                layer.ensure_capacity(id);
            }
        }

        let entry_point = *self.entry_point.read();

        let Some(ep) = entry_point else {
            *self.entry_point.write() = Some(id);
            self.max_layer.store(node_layer, Ordering::Relaxed);
            self.count.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };

        let max_layer = self.max_layer.load(Ordering::Relaxed);
        let mut current_ep = ep;

        for layer_idx in (node_layer + 1..=max_layer).rev() {
            current_ep = self.search_layer_single(vector, current_ep, layer_idx, store)?;
        }

        for layer_idx in (0..=node_layer.min(max_layer)).rev() {
            let neighbors =
                self.search_layer(vector, vec![current_ep], self.config.ef_construction, layer_idx, store)?;

            let max_conn = if layer_idx == 0 {
                self.config.m0
            } else {
                self.config.m
            };
            let selected: Vec<NodeId> = neighbors
                .iter()
                .take(max_conn)
                .map(|(node, _)| *node)
                .collect();

            self.layers.read()[layer_idx].set_neighbors(id, selected.clone());
            for &neighbor in &selected {
                self.add_bidirectional_connection(id, neighbor, layer_idx, max_conn, store)?;
            }

            if let Some((best, _)) = neighbors.first() {
                current_ep = *best;
            }
        }

        if node_layer > max_layer {
            self.max_layer.store(node_layer, Ordering::Relaxed);
            *self.entry_point.write() = Some(id);
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns up to `k` nearest neighbors of `query`, ascending by distance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Index`] if a node reachable from the entry point no
    /// longer has a vector in `store`.
    pub fn search(&self, query: &[f32], k: usize, store: &MmapStorage) -> Result<Vec<(NodeId, f32)>> {
        let Some(ep) = *self.entry_point.read() else {
            return Ok(Vec::new());
        };

        let max_layer = self.max_layer.load(Ordering::Relaxed);
        let mut current_ep = ep;
        for layer_idx in (1..=max_layer).rev() {
            current_ep = self.search_layer_single(query, current_ep, layer_idx, store)?;
        }

        let mut candidates =
            self.search_layer(query, vec![current_ep], self.config.ef_search, 0, store)?;
        candidates.truncate(k);
        Ok(candidates)
    }

    /// Drops all nodes, the entry point, and the max layer. Leaves the
    /// external vector store untouched.
    pub fn reset(&self) {
        *self.layers.write() = vec![Layer::new(0)];
        *self.entry_point.write() = None;
        self.max_layer.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }

    fn vector_of(&self, id: NodeId, store: &MmapStorage) -> Result<Vec<f32>> {
        store.get(id as u64).map_err(|_| {
            Error::Index(format!(
                "node {id} is present in the graph but missing from the vector store"
            ))
        })
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn random_layer(&self) -> usize {
        let mut state = self.rng_state.load(Ordering::Relaxed);
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state.store(state, Ordering::Relaxed);

        let uniform = ((state >> 11) as f64) / ((1u64 << 53) as f64);
        let uniform = uniform.max(f64::MIN_POSITIVE);
        let level = (-uniform.ln() * self.level_mult).floor() as usize;
        level.min(self.config.max_level)
    }

    fn search_layer_single(
        &self,
        query: &[f32],
        entry: NodeId,
        layer: usize,
        store: &MmapStorage,
    ) -> Result<NodeId> {
        let mut best = entry;
        let mut best_dist = euclidean(query, &self.vector_of(entry, store)?);

        loop {
            let neighbors = self.layers.read()[layer].get_neighbors(best);
            let mut improved = false;

            for neighbor in neighbors {
                let dist = euclidean(query, &self.vector_of(neighbor, store)?);
                if dist < best_dist {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        Ok(best)
    }

    fn search_layer(
        &self,
        query: &[f32],
        entry_points: Vec<NodeId>,
        ef: usize,
        layer: usize,
        store: &MmapStorage,
    ) -> Result<Vec<(NodeId, f32)>> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();

        for ep in entry_points {
            let dist = euclidean(query, &self.vector_of(ep, store)?);
            candidates.push(Reverse((OrderedFloat(dist), ep)));
            results.push((OrderedFloat(dist), ep));
            visited.insert(ep);
        }

        while let Some(Reverse((OrderedFloat(c_dist), c_node))) = candidates.pop() {
            let furthest_dist = results.peek().map_or(f32::MAX, |r| r.0 .0);
            if c_dist > furthest_dist && results.len() >= ef {
                break;
            }

            let neighbors = self.layers.read()[layer].get_neighbors(c_node);
            for neighbor in neighbors {
                if visited.insert(neighbor) {
                    let dist = euclidean(query, &self.vector_of(neighbor, store)?);
                    let furthest = results.peek().map_or(f32::MAX, |r| r.0 .0);

                    if dist < furthest || results.len() < ef {
                        candidates.push(Reverse((OrderedFloat(dist), neighbor)));
                        results.push((OrderedFloat(dist), neighbor));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        let mut result_vec: Vec<(NodeId, f32)> =
            results.into_iter().map(|(d, n)| (n, d.0)).collect();
        result_vec.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(result_vec)
    }

    fn add_bidirectional_connection(
        &self,
        new_node: NodeId,
        neighbor: NodeId,
        layer: usize,
        max_conn: usize,
        store: &MmapStorage,
    ) -> Result<()> {
        let current_neighbors = self.layers.read()[layer].get_neighbors(neighbor);

        if current_neighbors.len() < max_conn {
            let layers = self.layers.read();
            let mut neighbors = layers[layer].get_neighbors(neighbor);
            neighbors.push(new_node);
            layers[layer].set_neighbors(neighbor, neighbors);
            return Ok(());
        }

        let neighbor_vec = self.vector_of(neighbor, store)?;
        let mut all_neighbors = current_neighbors;
        all_neighbors.push(new_node);

        let mut with_dist = Vec::with_capacity(all_neighbors.len());
        for n in all_neighbors {
            let n_vec = self.vector_of(n, store)?;
            with_dist.push((n, euclidean(&neighbor_vec, &n_vec)));
        }
        with_dist.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let pruned: Vec<NodeId> = with_dist.into_iter().take(max_conn).map(|(n, _)| n).collect();

        self.layers.read()[layer].set_neighbors(neighbor, pruned);
        Ok(())
    }
}
