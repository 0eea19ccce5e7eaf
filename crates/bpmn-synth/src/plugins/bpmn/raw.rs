//! Raw process grammar
//!
//! The nested description accepted by the normalizer. In JSON each node is
//! tagged by its `"node"` field:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "node": "event", "kind": "startEvent", "id": "start" },
//!     { "node": "gateway", "id": "ok", "label": "Approved?", "branches": [
//!         { "condition": "yes", "nodes": [{ "node": "task", "label": "Ship" }] },
//!         { "condition": "no", "nodes": [] }
//!     ]},
//!     { "node": "loop", "condition": "retry", "body": [{ "node": "task", "label": "Ping" }] }
//!   ]
//! }
//! ```
//!
//! When `flows` is present the process is in explicit mode: nodes are only
//! flattened, and the supplied flows are the complete edge list.

use serde::{Deserialize, Serialize};

use crate::core::ProcessError;

/// A raw process description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProcess {
    /// Top-level sequence, in emission order
    pub nodes: Vec<RawNode>,
    /// Explicit edge list; `None` means sequencing is implied by nesting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<Vec<RawFlow>>,
}

impl RawProcess {
    /// Create a process whose flows are implied by node order
    pub fn new(nodes: Vec<RawNode>) -> Self {
        Self { nodes, flows: None }
    }

    /// Create a process with an explicit flow list
    pub fn with_flows(nodes: Vec<RawNode>, flows: Vec<RawFlow>) -> Self {
        Self {
            nodes,
            flows: Some(flows),
        }
    }

    /// Parse a process from its JSON form
    pub fn from_json(input: &str) -> Result<Self, ProcessError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Returns true when the edge list is supplied rather than implied
    pub fn is_explicit(&self) -> bool {
        self.flows.is_some()
    }
}

/// One node of the raw tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum RawNode {
    /// Activity; `kind` defaults to `task`
    Task {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Event; `kind` defaults to `startEvent`
    Event {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Gateway(RawGateway),
    Loop(RawLoop),
}

impl RawNode {
    /// A plain task with an identifier and no label
    pub fn task(id: impl Into<String>) -> Self {
        RawNode::Task {
            id: Some(id.into()),
            kind: None,
            label: None,
        }
    }

    /// A plain task with an identifier and a label
    pub fn labeled_task(id: impl Into<String>, label: impl Into<String>) -> Self {
        RawNode::Task {
            id: Some(id.into()),
            kind: None,
            label: Some(label.into()),
        }
    }

    /// A task whose identifier is synthesized during normalization
    pub fn anonymous_task(label: impl Into<String>) -> Self {
        RawNode::Task {
            id: None,
            kind: None,
            label: Some(label.into()),
        }
    }

    /// An activity of a specific kind (`userTask`, `subProcess`, ...)
    pub fn activity(id: impl Into<String>, kind: impl Into<String>) -> Self {
        RawNode::Task {
            id: Some(id.into()),
            kind: Some(kind.into()),
            label: None,
        }
    }

    /// An event of a specific kind (`startEvent`, `endEvent`, ...)
    pub fn event(id: impl Into<String>, kind: impl Into<String>) -> Self {
        RawNode::Event {
            id: Some(id.into()),
            kind: Some(kind.into()),
            label: None,
        }
    }

    /// The supplied identifier, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            RawNode::Task { id, .. } | RawNode::Event { id, .. } => id.as_deref(),
            RawNode::Gateway(gateway) => gateway.id.as_deref(),
            RawNode::Loop(body) => body.id.as_deref(),
        }
    }
}

impl From<RawGateway> for RawNode {
    fn from(value: RawGateway) -> Self {
        RawNode::Gateway(value)
    }
}

impl From<RawLoop> for RawNode {
    fn from(value: RawLoop) -> Self {
        RawNode::Loop(value)
    }
}

/// An n-ary split with one sub-sequence per branch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGateway {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Gateway kind; defaults to `exclusiveGateway`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub branches: Vec<RawBranch>,
    /// Whether open branch tails meet in a synthesized join; defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<bool>,
}

impl RawGateway {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn branch(mut self, branch: RawBranch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Let branch tails flow straight into whatever follows the gateway
    pub fn without_join(mut self) -> Self {
        self.join = Some(false);
        self
    }

    pub fn joins(&self) -> bool {
        self.join.unwrap_or(true)
    }
}

/// One outgoing path of a gateway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBranch {
    /// Condition text placed on the flow leaving the gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    /// Identifier this branch jumps to instead of joining
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl RawBranch {
    pub fn new(nodes: Vec<RawNode>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn jump_to(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// A body repeated while `condition` holds
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoop {
    /// Identifier of the loop's deciding gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub body: Vec<RawNode>,
}

impl RawLoop {
    pub fn new(body: Vec<RawNode>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn repeat_while(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// An explicit edge between two node identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlow {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Marks the edge as closing a loop
    #[serde(default)]
    pub loop_back: bool,
}

impl RawFlow {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            loop_back: false,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn as_loop_back(mut self) -> Self {
        self.loop_back = true;
        self
    }
}
