//! bpmn-synth - Turn process descriptions into BPMN diagram documents
//!
//! A raw process (a nested tree of tasks, events, gateways and loops) is
//! flattened into a canonical graph, laid out left to right, and written as
//! the XML the diagram front end reads.
//!
//! # Quick Start
//!
//! ```rust
//! use bpmn_synth::synthesize;
//!
//! let input = r#"{
//!     "nodes": [{ "node": "task", "id": "A" }, { "node": "task", "id": "B" }],
//!     "flows": [{ "source": "A", "target": "B" }]
//! }"#;
//! let xml = synthesize(input).unwrap();
//! assert!(xml.contains("A-B_connector0"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual stages:
//!
//! ```rust
//! use bpmn_synth::prelude::*;
//!
//! let raw = RawProcess::new(vec![
//!     RawNode::event("start", "startEvent"),
//!     RawNode::labeled_task("review", "Review order"),
//!     RawNode::event("end", "endEvent"),
//! ]);
//!
//! // Flatten into a canonical graph
//! let graph: CanonicalGraph = ProcessNormalizer::new().normalize(&raw).unwrap();
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 2);
//!
//! // Position shapes and connectors
//! let document = ProcessLayoutAlgorithm::new().layout(&graph).unwrap();
//! assert_eq!(document.shapes[1].bounds.x, 300.0);
//!
//! // Serialize
//! let xml = XmlRenderer::new().render(&document).unwrap();
//! assert!(xml.starts_with("<root>"));
//! ```

pub mod core;
pub mod plugins;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        AnchorSide, Bounds, BranchMembership, Database, Element, ElementKind, Flow, FlowKind,
        LayoutAlgorithm, Normalizer, Point, ProcessError, Renderer,
    };
    pub use crate::plugins::bpmn::{
        read_document, CanonicalGraph, DiagramDocument, LayoutConfig, LayoutDiagnostic,
        PositionedConnector, PositionedShape, ProcessLayoutAlgorithm, ProcessNormalizer,
        RawBranch, RawFlow, RawGateway, RawLoop, RawNode, RawProcess, XmlRenderer,
    };
    pub use crate::plugins::orchestrator::{Orchestrator, Synthesis};
    pub use crate::plugins::security::{
        OntologyCatalog, SecuritySuggestion, SuggestionIssue, SuggestionSet,
    };
}

/// Turn a raw process in JSON form into diagram XML
///
/// Uses the default layout configuration.
///
/// # Example
/// ```rust
/// use bpmn_synth::synthesize;
///
/// let xml = synthesize(r#"{ "nodes": [{ "node": "task", "label": "Pack" }] }"#).unwrap();
/// assert!(xml.contains("text=\"Pack\""));
/// ```
pub fn synthesize(input: &str) -> anyhow::Result<String> {
    use crate::plugins::orchestrator::Orchestrator;

    Ok(Orchestrator::new().process_json(input)?.xml)
}

/// Flatten a raw process into a canonical graph
///
/// # Example
/// ```rust
/// use bpmn_synth::normalize;
/// use bpmn_synth::prelude::*;
///
/// let raw = RawProcess::new(vec![RawNode::task("A"), RawNode::task("B")]);
/// let graph = normalize(&raw).unwrap();
/// assert_eq!(graph.successors("A"), vec!["B"]);
/// ```
pub fn normalize(raw: &plugins::bpmn::RawProcess) -> anyhow::Result<plugins::bpmn::CanonicalGraph> {
    use crate::core::Normalizer as _;
    use crate::plugins::bpmn::ProcessNormalizer;

    ProcessNormalizer::new().normalize(raw)
}

/// Lay out a canonical graph with the given configuration
///
/// Never fails: flows whose endpoints have no shape are reported in the
/// document's diagnostics.
///
/// # Example
/// ```rust
/// use bpmn_synth::layout;
/// use bpmn_synth::prelude::*;
///
/// let graph = CanonicalGraph::from_parts(vec![Element::task("A", "")], vec![]);
/// let document = layout(&graph, &LayoutConfig::default());
/// assert_eq!(document.shapes[0].bounds.x, 100.0);
/// ```
pub fn layout(
    graph: &plugins::bpmn::CanonicalGraph,
    config: &plugins::bpmn::LayoutConfig,
) -> plugins::bpmn::DiagramDocument {
    use crate::plugins::bpmn::ProcessLayoutAlgorithm;

    ProcessLayoutAlgorithm::with_config(config.clone()).layout_graph(graph)
}
