//! Pipeline orchestrator
//!
//! Runs the process stages in order:
//! Normalizer → CanonicalGraph → LayoutAlgorithm → Renderer

use anyhow::Result;
use tracing::{debug, info, span, warn, Level};

use crate::core::{LayoutAlgorithm, Normalizer, Renderer};
use crate::plugins::bpmn::{
    CanonicalGraph, DiagramDocument, LayoutConfig, LayoutDiagnostic, ProcessLayoutAlgorithm,
    ProcessNormalizer, RawProcess, XmlRenderer,
};

/// Everything one synthesis call produced
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub graph: CanonicalGraph,
    pub document: DiagramDocument,
    pub xml: String,
}

impl Synthesis {
    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.document.diagnostics
    }
}

/// Coordinates the pipeline stages
///
/// Holds no state between calls; one orchestrator can serve any number of
/// independent requests.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    normalizer: ProcessNormalizer,
    layout: ProcessLayoutAlgorithm,
    renderer: XmlRenderer,
}

impl Orchestrator {
    /// Create an orchestrator with default layout and compact XML
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            layout: ProcessLayoutAlgorithm::with_config(config),
            ..Self::default()
        }
    }

    pub fn with_renderer(mut self, renderer: XmlRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        self.layout.config()
    }

    /// Run only the normalizer
    pub fn normalize(&self, raw: &RawProcess) -> Result<CanonicalGraph> {
        self.normalizer.normalize(raw)
    }

    /// Run the whole pipeline on a raw process
    pub fn process(&self, raw: &RawProcess) -> Result<Synthesis> {
        let process_span = span!(
            Level::INFO,
            "process_pipeline",
            normalizer = self.normalizer.name(),
            layout = self.layout.name(),
            renderer = self.renderer.name()
        );
        let _enter = process_span.enter();

        info!("Starting synthesis pipeline");
        let graph = self.normalize(raw)?;
        self.finish(graph)
    }

    /// Parse a raw process from JSON and run the whole pipeline
    pub fn process_json(&self, input: &str) -> Result<Synthesis> {
        let raw = RawProcess::from_json(input)?;
        debug!(nodes = raw.nodes.len(), "Raw process parsed");
        self.process(&raw)
    }

    /// Lay out and render a graph produced elsewhere, after validating it
    pub fn process_graph(&self, graph: CanonicalGraph) -> Result<Synthesis> {
        let graph_span = span!(Level::INFO, "process_graph");
        let _enter = graph_span.enter();

        graph.validate()?;
        self.finish(graph)
    }

    /// Lay out and render a graph without validating it
    ///
    /// Dangling flow endpoints show up as diagnostics instead of errors.
    pub fn process_graph_lenient(&self, graph: CanonicalGraph) -> Result<Synthesis> {
        let graph_span = span!(Level::INFO, "process_graph", lenient = true);
        let _enter = graph_span.enter();

        self.finish(graph)
    }

    fn finish(&self, graph: CanonicalGraph) -> Result<Synthesis> {
        let layout_span = span!(Level::DEBUG, "pipeline_layout");
        let layout_enter = layout_span.enter();
        let document = self.layout.layout(&graph)?;
        drop(layout_enter);

        for diagnostic in &document.diagnostics {
            warn!(%diagnostic, "Layout degraded");
        }

        let render_span = span!(Level::DEBUG, "pipeline_render");
        let render_enter = render_span.enter();
        let xml = self.renderer.render(&document)?;
        debug!(output_len = xml.len(), "Rendering completed");
        drop(render_enter);

        info!("Pipeline completed successfully");
        Ok(Synthesis {
            graph,
            document,
            xml,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Element, Flow, ProcessError};
    use crate::plugins::bpmn::{RawFlow, RawNode};

    #[test]
    fn test_process_json() {
        let input = r#"{
            "nodes": [{ "node": "task", "id": "A" }, { "node": "task", "id": "B" }],
            "flows": [{ "source": "A", "target": "B" }]
        }"#;
        let synthesis = Orchestrator::new().process_json(input).unwrap();
        assert_eq!(synthesis.document.shapes.len(), 2);
        assert!(synthesis.diagnostics().is_empty());
        assert!(synthesis.xml.contains("A-B_connector0"));
    }

    #[test]
    fn test_process_error_keeps_type() {
        let raw = RawProcess::with_flows(vec![RawNode::task("A")], vec![RawFlow::new("A", "C")]);
        let err = Orchestrator::new().process(&raw).unwrap_err();
        let typed = err.downcast_ref::<ProcessError>().unwrap();
        assert_eq!(typed.reference(), Some("C"));
    }

    #[test]
    fn test_invalid_json() {
        let err = Orchestrator::new().process_json("{ nodes: ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProcessError>(),
            Some(ProcessError::Json { .. })
        ));
    }

    #[test]
    fn test_process_graph_validates() {
        let graph =
            CanonicalGraph::from_parts(vec![Element::task("A", "")], vec![Flow::new("A", "C")]);
        assert!(Orchestrator::new().process_graph(graph.clone()).is_err());

        let lenient = Orchestrator::new().process_graph_lenient(graph).unwrap();
        assert_eq!(lenient.diagnostics().len(), 1);
        assert!(lenient.xml.contains("id=\"A-C_connector0\""));
    }

    #[test]
    fn test_custom_config_and_renderer() {
        let config = LayoutConfig {
            start_x: 0.0,
            ..LayoutConfig::default()
        };
        let orchestrator =
            Orchestrator::with_config(config).with_renderer(XmlRenderer::pretty());
        assert_eq!(orchestrator.config().start_x, 0.0);

        let synthesis = orchestrator
            .process(&RawProcess::new(vec![RawNode::task("A")]))
            .unwrap();
        assert!(synthesis.xml.contains("<Bounds x=\"0\""));
        assert!(synthesis.xml.contains('\n'));
    }

    #[test]
    fn test_empty_process() {
        let synthesis = Orchestrator::new().process(&RawProcess::default()).unwrap();
        assert_eq!(synthesis.xml, "<root />");
    }
}
