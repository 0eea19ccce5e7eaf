//! Core graph storage trait
//!
//! Stages hand each other an ordered store of nodes and edges. Insertion
//! order is significant: it is the order layout places elements in.

use anyhow::Result;

/// Core trait for ordered graph stores
///
/// Implementations must iterate nodes and edges in insertion order so that
/// every downstream stage is deterministic.
pub trait Database: Send + Sync {
    /// The node data type for this database
    type Node: Clone + Send + Sync;

    /// The edge data type for this database
    type Edge: Clone + Send + Sync;

    /// Add a node to the database
    fn add_node(&mut self, node: Self::Node) -> Result<()>;

    /// Add an edge to the database
    fn add_edge(&mut self, edge: Self::Edge) -> Result<()>;

    /// Get a node by ID
    fn get_node(&self, id: &str) -> Option<&Self::Node>;

    /// Iterate over all nodes in insertion order
    fn nodes(&self) -> impl Iterator<Item = &Self::Node>;

    /// Iterate over all edges in insertion order
    fn edges(&self) -> impl Iterator<Item = &Self::Edge>;

    /// Clear all data from the database
    fn clear(&mut self);

    /// Get the number of nodes
    fn node_count(&self) -> usize;

    /// Get the number of edges
    fn edge_count(&self) -> usize;
}
