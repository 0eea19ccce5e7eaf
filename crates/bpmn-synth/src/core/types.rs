//! Core type definitions for process synthesis
//!
//! This module contains the fundamental types used throughout the pipeline:
//! element kinds, flow kinds, anchor sides, geometry, and the element and
//! flow records of the canonical graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BPMN element kinds
///
/// The set is open: kinds the renderer has no prefab for are kept verbatim
/// in [`ElementKind::Other`] and rendered with the task prefab.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    #[default]
    Task,
    UserTask,
    ServiceTask,
    ScriptTask,
    ManualTask,
    SendTask,
    ReceiveTask,
    BusinessRuleTask,
    SubProcess,
    StartEvent,
    EndEvent,
    IntermediateThrowEvent,
    IntermediateCatchEvent,
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
    EventBasedGateway,
    /// Any kind without a dedicated prefab
    Other(String),
}

impl ElementKind {
    /// Parse a kind name; unknown names become [`ElementKind::Other`]
    pub fn parse(name: &str) -> Self {
        match name {
            "task" => ElementKind::Task,
            "userTask" => ElementKind::UserTask,
            "serviceTask" => ElementKind::ServiceTask,
            "scriptTask" => ElementKind::ScriptTask,
            "manualTask" => ElementKind::ManualTask,
            "sendTask" => ElementKind::SendTask,
            "receiveTask" => ElementKind::ReceiveTask,
            "businessRuleTask" => ElementKind::BusinessRuleTask,
            "subProcess" => ElementKind::SubProcess,
            "startEvent" => ElementKind::StartEvent,
            "endEvent" => ElementKind::EndEvent,
            "intermediateThrowEvent" => ElementKind::IntermediateThrowEvent,
            "intermediateCatchEvent" => ElementKind::IntermediateCatchEvent,
            "exclusiveGateway" => ElementKind::ExclusiveGateway,
            "parallelGateway" => ElementKind::ParallelGateway,
            "inclusiveGateway" => ElementKind::InclusiveGateway,
            "eventBasedGateway" => ElementKind::EventBasedGateway,
            other => ElementKind::Other(other.to_string()),
        }
    }

    /// The kind name as it appeared in the input
    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Task => "task",
            ElementKind::UserTask => "userTask",
            ElementKind::ServiceTask => "serviceTask",
            ElementKind::ScriptTask => "scriptTask",
            ElementKind::ManualTask => "manualTask",
            ElementKind::SendTask => "sendTask",
            ElementKind::ReceiveTask => "receiveTask",
            ElementKind::BusinessRuleTask => "businessRuleTask",
            ElementKind::SubProcess => "subProcess",
            ElementKind::StartEvent => "startEvent",
            ElementKind::EndEvent => "endEvent",
            ElementKind::IntermediateThrowEvent => "intermediateThrowEvent",
            ElementKind::IntermediateCatchEvent => "intermediateCatchEvent",
            ElementKind::ExclusiveGateway => "exclusiveGateway",
            ElementKind::ParallelGateway => "parallelGateway",
            ElementKind::InclusiveGateway => "inclusiveGateway",
            ElementKind::EventBasedGateway => "eventBasedGateway",
            ElementKind::Other(name) => name,
        }
    }

    /// Name of the rendering prefab for this kind
    ///
    /// Kinds without a prefab fall back to `task`.
    pub fn prefab(&self) -> &str {
        match self {
            ElementKind::Other(_) => ElementKind::Task.as_str(),
            known => known.as_str(),
        }
    }

    /// Returns true for gateway kinds
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            ElementKind::ExclusiveGateway
                | ElementKind::ParallelGateway
                | ElementKind::InclusiveGateway
                | ElementKind::EventBasedGateway
        )
    }

    /// Returns true for event kinds
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            ElementKind::StartEvent
                | ElementKind::EndEvent
                | ElementKind::IntermediateThrowEvent
                | ElementKind::IntermediateCatchEvent
        )
    }
}

impl From<String> for ElementKind {
    fn from(value: String) -> Self {
        ElementKind::parse(&value)
    }
}

impl From<ElementKind> for String {
    fn from(value: ElementKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a flow participates in the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    /// Ordinary forward sequencing
    #[default]
    Sequence,
    /// Edge closing a loop back to its body
    LoopBack,
}

/// Side of a shape a connector attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorSide {
    Left,
    Right,
}

impl AnchorSide {
    /// Attribute value understood by the renderer
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorSide::Left => "locationLeft",
            AnchorSide::Right => "locationRight",
        }
    }

    /// Parse a renderer attribute value
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "locationLeft" => Some(AnchorSide::Left),
            "locationRight" => Some(AnchorSide::Right),
            _ => None,
        }
    }
}

impl fmt::Display for AnchorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 2-D point in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometric center of the box
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Which gateway branch an element was flattened out of
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchMembership {
    /// Identifier of the splitting gateway
    pub gateway: String,
    /// Zero-based branch position within that gateway
    pub branch: usize,
}

/// A node of the canonical graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier within the process
    pub id: String,
    /// BPMN kind
    #[serde(default)]
    pub kind: ElementKind,
    /// Display label, empty when absent
    #[serde(default)]
    pub label: String,
    /// Innermost gateway branch this element belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<BranchMembership>,
}

impl Element {
    /// Create a new element with no branch membership
    pub fn new(id: impl Into<String>, kind: ElementKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            membership: None,
        }
    }

    /// Create a plain task element
    pub fn task(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, ElementKind::Task, label)
    }

    pub fn with_membership(mut self, membership: BranchMembership) -> Self {
        self.membership = Some(membership);
        self
    }
}

/// A directed edge of the canonical graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// Source element identifier
    pub source: String,
    /// Target element identifier
    pub target: String,
    /// Optional condition or label text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FlowKind,
}

impl Flow {
    /// Create a new unlabeled sequence flow
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            kind: FlowKind::Sequence,
        }
    }

    /// Create a new labeled sequence flow
    pub fn with_label(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(source, target)
        }
    }

    /// Create a loop-back flow
    pub fn loop_back(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: FlowKind::LoopBack,
            ..Self::new(source, target)
        }
    }

    /// Returns true if this flow closes a loop
    pub fn is_loop_back(&self) -> bool {
        self.kind == FlowKind::LoopBack
    }
}
