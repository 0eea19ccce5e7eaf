//! Process layout implementation
//!
//! Places every element in its own horizontal slot, in canonical order, and
//! draws each flow as a straight line between shape centers. There is no
//! graph-aware placement: branch fan-out is not spread vertically and
//! shapes are not kept apart. Cost is linear in elements plus flows.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, span, trace, warn, Level};

use super::{
    connector_id, CanonicalGraph, DiagramDocument, LayoutDiagnostic, PositionedConnector,
    PositionedShape,
};
use crate::core::{AnchorSide, Bounds, Flow, LayoutAlgorithm, Point, ProcessError};

/// Layout configuration
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// X of the first slot
    pub start_x: f64,
    /// Y of every shape's top edge
    pub baseline_y: f64,
    /// Distance between consecutive slot origins
    pub horizontal_spacing: f64,
    pub shape_width: f64,
    pub shape_height: f64,
    /// Gap below the shapes used by loop-back routes
    pub loop_clearance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 100.0,
            baseline_y: -100.0,
            horizontal_spacing: 200.0,
            shape_width: 966.2021,
            shape_height: 506.1058,
            loop_clearance: 50.0,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) config from JSON
    pub fn from_json(input: &str) -> Result<Self, ProcessError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Origin of the shape in `slot`
    pub fn slot_bounds(&self, slot: usize) -> Bounds {
        Bounds::new(
            self.start_x + slot as f64 * self.horizontal_spacing,
            self.baseline_y,
            self.shape_width,
            self.shape_height,
        )
    }

    /// Y of the horizontal leg of loop-back routes
    pub fn loop_lane_y(&self) -> f64 {
        self.baseline_y + self.shape_height + self.loop_clearance
    }
}

/// Linear left-to-right layout for canonical graphs
#[derive(Debug, Clone, Default)]
pub struct ProcessLayoutAlgorithm {
    config: LayoutConfig,
}

impl ProcessLayoutAlgorithm {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `graph`; never fails
    pub fn layout_graph(&self, graph: &CanonicalGraph) -> DiagramDocument {
        let layout_span = span!(
            Level::INFO,
            "layout_process",
            element_count = graph.elements().len(),
            flow_count = graph.flows().len()
        );
        let _enter = layout_span.enter();

        let mut anchors: HashMap<&str, (usize, Point)> =
            HashMap::with_capacity(graph.elements().len());
        let shapes: Vec<PositionedShape> = graph
            .elements()
            .iter()
            .enumerate()
            .map(|(slot, element)| {
                let bounds = self.config.slot_bounds(slot);
                anchors
                    .entry(element.id.as_str())
                    .or_insert((slot, bounds.center()));
                PositionedShape {
                    id: element.id.clone(),
                    label: element.label.clone(),
                    kind: element.kind.clone(),
                    bounds,
                }
            })
            .collect();
        debug!(shape_count = shapes.len(), "Placed shapes");

        let mut diagnostics = Vec::new();
        let connectors: Vec<PositionedConnector> = graph
            .flows()
            .iter()
            .enumerate()
            .map(|(index, flow)| {
                let id = connector_id(&flow.source, &flow.target, index);
                let source = anchors.get(flow.source.as_str());
                let target = anchors.get(flow.target.as_str());

                let waypoints = match (source, target) {
                    (Some(&source), Some(&target)) => self.route(flow, source, target),
                    _ => {
                        let missing: Vec<String> = [(&flow.source, source), (&flow.target, target)]
                            .into_iter()
                            .filter(|(_, anchor)| anchor.is_none())
                            .map(|(endpoint, _)| endpoint.clone())
                            .collect();
                        warn!(connector = %id, ?missing, "Connector endpoint has no shape");
                        diagnostics.push(LayoutDiagnostic::MissingAnchor {
                            connector: id.clone(),
                            missing,
                        });
                        Vec::new()
                    }
                };
                trace!(connector = %id, points = waypoints.len(), "Routed connector");

                PositionedConnector {
                    id,
                    source: flow.source.clone(),
                    source_side: AnchorSide::Right,
                    target: flow.target.clone(),
                    target_side: AnchorSide::Left,
                    waypoints,
                }
            })
            .collect();

        info!(
            shapes = shapes.len(),
            connectors = connectors.len(),
            diagnostics = diagnostics.len(),
            "Layout completed"
        );
        DiagramDocument {
            shapes,
            connectors,
            diagnostics,
        }
    }

    /// Straight center-to-center line; loop-backs between distinct slots
    /// detour through the lane below the shapes
    fn route(
        &self,
        flow: &Flow,
        (source_slot, from): (usize, Point),
        (target_slot, to): (usize, Point),
    ) -> Vec<Point> {
        if flow.is_loop_back() && source_slot != target_slot {
            let lane = self.config.loop_lane_y();
            return vec![from, Point::new(from.x, lane), Point::new(to.x, lane), to];
        }
        vec![from, to]
    }
}

impl LayoutAlgorithm<CanonicalGraph> for ProcessLayoutAlgorithm {
    type Output = DiagramDocument;

    fn layout(&self, database: &CanonicalGraph) -> Result<Self::Output> {
        Ok(self.layout_graph(database))
    }

    fn name(&self) -> &'static str {
        "linear"
    }

    fn direction(&self) -> &'static str {
        "LR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Database, Element, ElementKind};

    fn chain(ids: &[&str]) -> CanonicalGraph {
        let mut graph = CanonicalGraph::new();
        for id in ids {
            graph.add_node(Element::task(*id, "")).unwrap();
        }
        for pair in ids.windows(2) {
            graph.add_edge(Flow::new(pair[0], pair[1])).unwrap();
        }
        graph
    }

    #[test]
    fn test_default_config_values() {
        let config = LayoutConfig::default();
        assert_eq!(config.start_x, 100.0);
        assert_eq!(config.baseline_y, -100.0);
        assert_eq!(config.horizontal_spacing, 200.0);
        assert_eq!(config.shape_width, 966.2021);
        assert_eq!(config.shape_height, 506.1058);
    }

    #[test]
    fn test_partial_config_json() {
        let config = LayoutConfig::from_json(r#"{ "horizontalSpacing": 50, "shapeWidth": 20 }"#)
            .unwrap();
        assert_eq!(config.horizontal_spacing, 50.0);
        assert_eq!(config.shape_width, 20.0);
        assert_eq!(config.start_x, 100.0);
    }

    #[test]
    fn test_two_task_scenario() {
        let document = ProcessLayoutAlgorithm::new().layout_graph(&chain(&["A", "B"]));
        let config = LayoutConfig::default();
        let (w, h) = (config.shape_width, config.shape_height);

        assert_eq!(document.shapes.len(), 2);
        assert_eq!(document.shapes[0].bounds, Bounds::new(100.0, -100.0, w, h));
        assert_eq!(document.shapes[1].bounds, Bounds::new(300.0, -100.0, w, h));

        let connector = &document.connectors[0];
        assert_eq!(connector.id, "A-B_connector0");
        assert_eq!(connector.source_side, AnchorSide::Right);
        assert_eq!(connector.target_side, AnchorSide::Left);
        assert_eq!(
            connector.waypoints,
            vec![
                Point::new(100.0 + w / 2.0, -100.0 + h / 2.0),
                Point::new(300.0 + w / 2.0, -100.0 + h / 2.0),
            ]
        );
        assert!(document.is_complete());
    }

    #[test]
    fn test_parallel_flows_get_distinct_ids() {
        let mut graph = chain(&["A", "B"]);
        graph.add_edge(Flow::new("A", "B")).unwrap();
        let document = ProcessLayoutAlgorithm::new().layout_graph(&graph);
        let ids: Vec<_> = document.connectors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["A-B_connector0", "A-B_connector1"]);
        assert_eq!(document.connectors[0].waypoints, document.connectors[1].waypoints);
    }

    #[test]
    fn test_missing_anchor_is_a_diagnostic() {
        let graph = CanonicalGraph::from_parts(
            vec![Element::task("A", "")],
            vec![Flow::new("A", "C"), Flow::new("X", "Y")],
        );
        let document = ProcessLayoutAlgorithm::new().layout_graph(&graph);

        assert_eq!(document.connectors.len(), 2);
        assert!(!document.connectors[0].is_routed());
        assert_eq!(document.connectors[0].id, "A-C_connector0");
        assert_eq!(
            document.diagnostics,
            vec![
                LayoutDiagnostic::MissingAnchor {
                    connector: "A-C_connector0".to_string(),
                    missing: vec!["C".to_string()],
                },
                LayoutDiagnostic::MissingAnchor {
                    connector: "X-Y_connector1".to_string(),
                    missing: vec!["X".to_string(), "Y".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_self_flow_is_degenerate() {
        let graph =
            CanonicalGraph::from_parts(vec![Element::task("A", "")], vec![Flow::loop_back("A", "A")]);
        let document = ProcessLayoutAlgorithm::new().layout_graph(&graph);
        let points = &document.connectors[0].waypoints;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], points[1]);
    }

    #[test]
    fn test_loop_back_detours_below() {
        let mut graph = chain(&["A", "B"]);
        graph.add_edge(Flow::loop_back("B", "A")).unwrap();
        let algorithm = ProcessLayoutAlgorithm::new();
        let document = algorithm.layout_graph(&graph);

        let route = &document.connectors[1].waypoints;
        let lane = algorithm.config().loop_lane_y();
        assert_eq!(route.len(), 4);
        assert_eq!(route[1].y, lane);
        assert_eq!(route[2].y, lane);
        assert_eq!(route[0], document.shapes[1].bounds.center());
        assert_eq!(route[3], document.shapes[0].bounds.center());
    }

    #[test]
    fn test_label_and_kind_carry_through() {
        let mut graph = CanonicalGraph::new();
        graph
            .add_node(Element::new("x", ElementKind::parse("dataStore"), ""))
            .unwrap();
        let document = ProcessLayoutAlgorithm::new().layout_graph(&graph);
        assert_eq!(document.shapes[0].label, "");
        assert_eq!(document.shapes[0].kind.prefab(), "task");
    }

    #[test]
    fn test_custom_config() {
        let config = LayoutConfig {
            start_x: 0.0,
            baseline_y: 0.0,
            horizontal_spacing: 10.0,
            shape_width: 4.0,
            shape_height: 2.0,
            loop_clearance: 1.0,
        };
        let document =
            ProcessLayoutAlgorithm::with_config(config).layout_graph(&chain(&["A", "B", "C"]));
        let xs: Vec<f64> = document.shapes.iter().map(|s| s.bounds.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);
        assert_eq!(document.connectors[1].waypoints[0], Point::new(12.0, 1.0));
    }

    #[test]
    fn test_trait_metadata() {
        let algorithm = ProcessLayoutAlgorithm::new();
        assert_eq!(algorithm.name(), "linear");
        assert_eq!(algorithm.direction(), "LR");
        assert!(algorithm.layout(&CanonicalGraph::new()).unwrap().shapes.is_empty());
    }
}
