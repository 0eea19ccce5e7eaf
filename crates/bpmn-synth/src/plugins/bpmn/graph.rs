//! Canonical process graph
//!
//! The flat, identifier-resolved element and flow lists handed from the
//! normalizer to layout. Element order is the left-to-right layout order.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::core::{Database, Element, Flow, ProcessError};

#[derive(Deserialize)]
struct GraphRecord {
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    flows: Vec<Flow>,
}

/// Ordered elements plus ordered flows
///
/// Built incrementally through [`CanonicalGraph::insert_element`] and
/// [`CanonicalGraph::insert_flow`], which enforce uniqueness and reference
/// integrity, or wholesale through [`CanonicalGraph::from_parts`] for graphs
/// produced elsewhere (call [`CanonicalGraph::validate`] on those).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphRecord")]
pub struct CanonicalGraph {
    elements: Vec<Element>,
    flows: Vec<Flow>,
    /// Element position by ID (first occurrence wins)
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl From<GraphRecord> for CanonicalGraph {
    fn from(record: GraphRecord) -> Self {
        CanonicalGraph::from_parts(record.elements, record.flows)
    }
}

impl CanonicalGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph without checking it
    pub fn from_parts(elements: Vec<Element>, flows: Vec<Flow>) -> Self {
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            index.entry(element.id.clone()).or_insert(position);
        }
        Self {
            elements,
            flows,
            index,
        }
    }

    /// Parse a graph from its JSON form (unvalidated)
    pub fn from_json(input: &str) -> Result<Self, ProcessError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Serialize the graph as pretty JSON
    pub fn to_json(&self) -> Result<String, ProcessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append an element, rejecting duplicate identifiers
    pub fn insert_element(&mut self, element: Element) -> Result<(), ProcessError> {
        if self.index.contains_key(&element.id) {
            return Err(ProcessError::duplicate(element.id));
        }
        trace!(id = %element.id, kind = %element.kind, "Inserting element");
        self.index.insert(element.id.clone(), self.elements.len());
        self.elements.push(element);
        Ok(())
    }

    /// Append a flow, rejecting references to unknown elements
    pub fn insert_flow(&mut self, flow: Flow) -> Result<(), ProcessError> {
        for endpoint in [&flow.source, &flow.target] {
            if !self.contains(endpoint) {
                return Err(ProcessError::malformed(
                    endpoint.as_str(),
                    "flow references an element that does not exist",
                ));
            }
        }
        trace!(source = %flow.source, target = %flow.target, "Inserting flow");
        self.flows.push(flow);
        Ok(())
    }

    /// Check uniqueness, reference integrity and the self-loop rule
    pub fn validate(&self) -> Result<(), ProcessError> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if element.id.trim().is_empty() {
                return Err(ProcessError::malformed(
                    element.label.as_str(),
                    "element has a blank identifier",
                ));
            }
            if !seen.insert(element.id.as_str()) {
                return Err(ProcessError::duplicate(element.id.as_str()));
            }
        }

        for flow in &self.flows {
            for endpoint in [&flow.source, &flow.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(ProcessError::malformed(
                        endpoint.as_str(),
                        "flow references an element that does not exist",
                    ));
                }
            }
            if flow.source == flow.target && !flow.is_loop_back() {
                return Err(ProcessError::malformed(
                    flow.source.as_str(),
                    "flow connects an element to itself",
                ));
            }
        }

        debug!(
            element_count = self.elements.len(),
            flow_count = self.flows.len(),
            "Graph validated"
        );
        Ok(())
    }

    /// Elements in layout order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Flows in connector order
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Check if an element exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Layout slot of an element
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// IDs of elements this element flows into, in flow order
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.flows
            .iter()
            .filter(|f| f.source == id)
            .map(|f| f.target.as_str())
            .collect()
    }

    /// IDs of elements flowing into this element, in flow order
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.flows
            .iter()
            .filter(|f| f.target == id)
            .map(|f| f.source.as_str())
            .collect()
    }
}

impl Database for CanonicalGraph {
    type Node = Element;
    type Edge = Flow;

    fn add_node(&mut self, node: Element) -> Result<()> {
        Ok(self.insert_element(node)?)
    }

    fn add_edge(&mut self, edge: Flow) -> Result<()> {
        Ok(self.insert_flow(edge)?)
    }

    fn get_node(&self, id: &str) -> Option<&Element> {
        self.position(id).map(|position| &self.elements[position])
    }

    fn nodes(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.flows.clear();
        self.index.clear();
    }

    fn node_count(&self) -> usize {
        self.elements.len()
    }

    fn edge_count(&self) -> usize {
        self.flows.len()
    }
}
