//! Core normalizer trait
//!
//! A normalizer resolves a (possibly nested) input description into a flat,
//! identifier-resolved graph store.

use anyhow::Result;

use super::Database;

/// Core trait for normalizers
///
/// # Example
/// ```
/// use bpmn_synth::core::{Database, Normalizer};
/// use bpmn_synth::plugins::bpmn::{CanonicalGraph, ProcessNormalizer, RawNode, RawProcess};
///
/// let raw = RawProcess::new(vec![RawNode::task("A"), RawNode::task("B")]);
/// let graph: CanonicalGraph = ProcessNormalizer::new().normalize(&raw).unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
pub trait Normalizer<D: Database>: Send + Sync {
    /// The raw input this normalizer accepts
    type Input;

    /// Flatten `input` into a fresh database
    fn normalize(&self, input: &Self::Input) -> Result<D>;

    /// Get the name of this normalizer
    fn name(&self) -> &'static str;

    /// Get the version of this normalizer
    fn version(&self) -> &'static str;
}
