//! Core layout trait for diagram positioning
//!
//! This trait defines the interface for arranging graph elements
//! in a coordinate system.

use anyhow::Result;

use super::Database;

/// Core trait for layout algorithms
///
/// # Example
/// ```
/// use bpmn_synth::core::LayoutAlgorithm;
/// use bpmn_synth::plugins::bpmn::{CanonicalGraph, ProcessLayoutAlgorithm};
///
/// let graph = CanonicalGraph::new();
/// let document = ProcessLayoutAlgorithm::new().layout(&graph).unwrap();
/// assert!(document.shapes.is_empty());
/// ```
pub trait LayoutAlgorithm<D: Database>: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Arrange elements in the database using this layout algorithm
    fn layout(&self, database: &D) -> Result<Self::Output>;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the layout direction (LR, TB, etc.)
    fn direction(&self) -> &'static str;
}
