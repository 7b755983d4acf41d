//! Hierarchical navigable small world index.

mod graph;
mod layer;
mod ordered_float;

pub use graph::HnswGraph;
