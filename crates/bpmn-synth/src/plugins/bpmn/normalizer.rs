//! Process normalizer
//!
//! Folds the nested raw tree into a [`CanonicalGraph`]. The fold runs in two
//! passes: the first claims every supplied identifier (so duplicates are
//! caught and synthesized IDs never shadow a later supplied one), the second
//! emits elements in traversal order and wires their open ends together.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, span, trace, Level};

use super::raw::{RawBranch, RawFlow, RawGateway, RawLoop, RawNode, RawProcess};
use super::CanonicalGraph;
use crate::core::{
    BranchMembership, Element, ElementKind, Flow, FlowKind, Normalizer, ProcessError,
};

/// Flattens raw processes into canonical graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessNormalizer;

impl ProcessNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize with a typed error
    pub fn normalize_process(&self, raw: &RawProcess) -> Result<CanonicalGraph, ProcessError> {
        let normalize_span = span!(
            Level::INFO,
            "normalize_process",
            top_level_nodes = raw.nodes.len(),
            explicit = raw.is_explicit()
        );
        let _enter = normalize_span.enter();

        let mut claimed = HashSet::new();
        claim_supplied(&raw.nodes, "nodes", &mut claimed)?;
        debug!(supplied = claimed.len(), "Claimed supplied identifiers");

        let mut fold = Fold {
            graph: CanonicalGraph::new(),
            claimed,
            implicit: !raw.is_explicit(),
            jumps: Vec::new(),
        };
        fold.sequence(&raw.nodes, None, Vec::new())?;
        fold.resolve_jumps()?;

        if let Some(flows) = &raw.flows {
            fold.explicit_flows(flows)?;
        }

        let graph = fold.graph;
        info!(
            element_count = graph.elements().len(),
            flow_count = graph.flows().len(),
            "Normalization completed"
        );
        Ok(graph)
    }
}

impl Normalizer<CanonicalGraph> for ProcessNormalizer {
    type Input = RawProcess;

    fn normalize(&self, input: &RawProcess) -> Result<CanonicalGraph> {
        Ok(self.normalize_process(input)?)
    }

    fn name(&self) -> &'static str {
        "bpmn"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

/// First pass: record supplied identifiers, rejecting blanks and repeats
fn claim_supplied(
    nodes: &[RawNode],
    path: &str,
    claimed: &mut HashSet<String>,
) -> Result<(), ProcessError> {
    for (position, node) in nodes.iter().enumerate() {
        let here = format!("{}[{}]", path, position);
        if let Some(id) = node.id() {
            if id.trim().is_empty() {
                return Err(ProcessError::malformed(here, "node has a blank identifier"));
            }
            if !claimed.insert(id.to_string()) {
                return Err(ProcessError::duplicate(id));
            }
        }
        match node {
            RawNode::Gateway(gateway) => {
                for (branch, RawBranch { nodes, .. }) in gateway.branches.iter().enumerate() {
                    claim_supplied(nodes, &format!("{}.branches[{}].nodes", here, branch), claimed)?;
                }
            }
            RawNode::Loop(body) => claim_supplied(&body.body, &format!("{}.body", here), claimed)?,
            RawNode::Task { .. } | RawNode::Event { .. } => {}
        }
    }
    Ok(())
}

/// An open end waiting for whatever comes next
#[derive(Debug, Clone)]
struct Exit {
    from: String,
    label: Option<String>,
}

impl Exit {
    fn plain(from: &str) -> Self {
        Self {
            from: from.to_string(),
            label: None,
        }
    }
}

/// Result of folding one node
#[derive(Debug)]
struct Fragment {
    entry: String,
    exits: Vec<Exit>,
}

/// A branch ending in a `next` reference, resolved once all IDs exist
#[derive(Debug)]
struct Jump {
    exit: Exit,
    target: String,
}

struct Fold {
    graph: CanonicalGraph,
    claimed: HashSet<String>,
    implicit: bool,
    jumps: Vec<Jump>,
}

impl Fold {
    /// Fold a sequence fed by `incoming`
    ///
    /// Returns the first element of the sequence (if any) and its open ends.
    /// An empty sequence passes `incoming` straight through.
    fn sequence(
        &mut self,
        nodes: &[RawNode],
        membership: Option<&BranchMembership>,
        incoming: Vec<Exit>,
    ) -> Result<(Option<String>, Vec<Exit>), ProcessError> {
        let mut entry = None;
        let mut open = incoming;

        for node in nodes {
            let fragment = self.node(node, membership, std::mem::take(&mut open))?;
            entry.get_or_insert(fragment.entry);
            open = fragment.exits;
        }

        Ok((entry, open))
    }

    fn node(
        &mut self,
        node: &RawNode,
        membership: Option<&BranchMembership>,
        incoming: Vec<Exit>,
    ) -> Result<Fragment, ProcessError> {
        match node {
            RawNode::Task { id, kind, label } => {
                let kind = ElementKind::parse(kind.as_deref().unwrap_or("task"));
                let id = self.emit(id.as_deref(), kind, label.as_deref(), membership)?;
                self.link(incoming, &id, FlowKind::Sequence)?;
                Ok(Fragment {
                    exits: vec![Exit::plain(&id)],
                    entry: id,
                })
            }
            RawNode::Event { id, kind, label } => {
                let kind = ElementKind::parse(kind.as_deref().unwrap_or("startEvent"));
                let id = self.emit(id.as_deref(), kind, label.as_deref(), membership)?;
                self.link(incoming, &id, FlowKind::Sequence)?;
                Ok(Fragment {
                    exits: vec![Exit::plain(&id)],
                    entry: id,
                })
            }
            RawNode::Gateway(gateway) => self.gateway(gateway, membership, incoming),
            RawNode::Loop(body) => self.repeat(body, membership, incoming),
        }
    }

    fn gateway(
        &mut self,
        gateway: &RawGateway,
        membership: Option<&BranchMembership>,
        incoming: Vec<Exit>,
    ) -> Result<Fragment, ProcessError> {
        if gateway.branches.is_empty() {
            let reference = gateway.id.as_deref().or(gateway.label.as_deref()).unwrap_or("gateway");
            return Err(ProcessError::malformed(reference, "gateway has no branches"));
        }

        let kind = ElementKind::parse(gateway.kind.as_deref().unwrap_or("exclusiveGateway"));
        let split = self.emit(
            gateway.id.as_deref(),
            kind.clone(),
            gateway.label.as_deref(),
            membership,
        )?;
        self.link(incoming, &split, FlowKind::Sequence)?;

        let mut open: Vec<Exit> = Vec::new();
        for (position, branch) in gateway.branches.iter().enumerate() {
            let inner = BranchMembership {
                gateway: split.clone(),
                branch: position,
            };
            let leaving = Exit {
                from: split.clone(),
                label: branch.condition.clone(),
            };
            let (_, exits) = self.sequence(&branch.nodes, Some(&inner), vec![leaving])?;

            match &branch.next {
                Some(target) => self.jumps.extend(exits.into_iter().map(|exit| Jump {
                    exit,
                    target: target.clone(),
                })),
                None => open.extend(exits),
            }
        }
        trace!(gateway = %split, branches = gateway.branches.len(), open = open.len(), "Folded gateway");

        if !gateway.joins() || open.is_empty() {
            return Ok(Fragment {
                entry: split,
                exits: open,
            });
        }

        let join_id = self.derive_id(&format!("{}_join", split));
        self.push(Element {
            id: join_id.clone(),
            kind,
            label: String::new(),
            membership: membership.cloned(),
        })?;
        self.link(open, &join_id, FlowKind::Sequence)?;
        Ok(Fragment {
            entry: split,
            exits: vec![Exit::plain(&join_id)],
        })
    }

    fn repeat(
        &mut self,
        body: &RawLoop,
        membership: Option<&BranchMembership>,
        incoming: Vec<Exit>,
    ) -> Result<Fragment, ProcessError> {
        let (Some(entry), exits) = self.sequence(&body.body, membership, incoming)? else {
            let reference = body.id.as_deref().or(body.label.as_deref()).unwrap_or("loop");
            return Err(ProcessError::malformed(
                reference,
                "loop has an empty body and cannot terminate",
            ));
        };

        if self.implicit && exits.is_empty() {
            let reference = body.id.as_deref().or(body.label.as_deref()).unwrap_or("loop");
            return Err(ProcessError::malformed(
                reference,
                "loop body never reaches its condition",
            ));
        }

        let label = body.label.as_deref().or(body.condition.as_deref());
        let decision = self.emit(body.id.as_deref(), ElementKind::ExclusiveGateway, label, membership)?;
        self.link(exits, &decision, FlowKind::Sequence)?;
        self.link(
            vec![Exit {
                from: decision.clone(),
                label: body.condition.clone(),
            }],
            &entry,
            FlowKind::LoopBack,
        )?;

        Ok(Fragment {
            entry,
            exits: vec![Exit::plain(&decision)],
        })
    }

    /// Emit an element, synthesizing its identifier when none was supplied
    fn emit(
        &mut self,
        id: Option<&str>,
        kind: ElementKind,
        label: Option<&str>,
        membership: Option<&BranchMembership>,
    ) -> Result<String, ProcessError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.synthesize_id(&kind),
        };
        self.push(Element {
            id: id.clone(),
            kind,
            label: label.unwrap_or_default().to_string(),
            membership: membership.cloned(),
        })?;
        Ok(id)
    }

    fn push(&mut self, element: Element) -> Result<(), ProcessError> {
        self.graph.insert_element(element)
    }

    /// `<kind>_<ordinal>`, where ordinal is the element's traversal position
    fn synthesize_id(&mut self, kind: &ElementKind) -> String {
        let mut ordinal = self.graph.elements().len();
        loop {
            let candidate = format!("{}_{}", kind.as_str(), ordinal);
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            ordinal += 1;
        }
    }

    /// `base`, or `base_2`, `base_3`, ... when taken
    fn derive_id(&mut self, base: &str) -> String {
        if self.claimed.insert(base.to_string()) {
            return base.to_string();
        }
        (2..)
            .map(|suffix| format!("{}_{}", base, suffix))
            .find(|candidate| self.claimed.insert(candidate.clone()))
            .unwrap_or_else(|| base.to_string())
    }

    /// Connect open ends to `target`; a no-op in explicit mode
    fn link(
        &mut self,
        exits: Vec<Exit>,
        target: &str,
        kind: FlowKind,
    ) -> Result<(), ProcessError> {
        if !self.implicit {
            return Ok(());
        }
        for exit in exits {
            self.graph.insert_flow(Flow {
                source: exit.from,
                target: target.to_string(),
                label: exit.label,
                kind,
            })?;
        }
        Ok(())
    }

    fn resolve_jumps(&mut self) -> Result<(), ProcessError> {
        for Jump { exit, target } in std::mem::take(&mut self.jumps) {
            let Some(to) = self.graph.position(&target) else {
                return Err(ProcessError::malformed(
                    target,
                    "branch jumps to an element that does not exist",
                ));
            };
            let from = self.graph.position(&exit.from).unwrap_or(usize::MAX);
            let kind = if to <= from {
                FlowKind::LoopBack
            } else {
                FlowKind::Sequence
            };
            self.link(vec![exit], &target, kind)?;
        }
        Ok(())
    }

    fn explicit_flows(&mut self, flows: &[RawFlow]) -> Result<(), ProcessError> {
        for flow in flows {
            if flow.source == flow.target && !flow.loop_back {
                return Err(ProcessError::malformed(
                    flow.source.as_str(),
                    "flow connects an element to itself",
                ));
            }
            self.graph.insert_flow(Flow {
                source: flow.source.clone(),
                target: flow.target.clone(),
                label: flow.label.clone(),
                kind: if flow.loop_back {
                    FlowKind::LoopBack
                } else {
                    FlowKind::Sequence
                },
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;

    fn normalize(raw: &RawProcess) -> Result<CanonicalGraph, ProcessError> {
        ProcessNormalizer::new().normalize_process(raw)
    }

    fn edges(graph: &CanonicalGraph) -> Vec<(&str, &str)> {
        graph
            .edges()
            .map(|f| (f.source.as_str(), f.target.as_str()))
            .collect()
    }

    fn ids(graph: &CanonicalGraph) -> Vec<&str> {
        graph.nodes().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_linear_sequence() {
        let raw = RawProcess::new(vec![
            RawNode::event("start", "startEvent"),
            RawNode::task("A"),
            RawNode::event("end", "endEvent"),
        ]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(ids(&graph), vec!["start", "A", "end"]);
        assert_eq!(edges(&graph), vec![("start", "A"), ("A", "end")]);
        assert_eq!(graph.get_node("end").unwrap().kind, ElementKind::EndEvent);
    }

    #[test]
    fn test_gateway_with_join() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("B")]).when("yes"))
                .branch(RawBranch::new(vec![RawNode::task("C")]).when("no"))
                .into(),
            RawNode::task("D"),
        ]);
        let graph = normalize(&raw).unwrap();

        assert_eq!(ids(&graph), vec!["A", "G", "B", "C", "G_join", "D"]);
        assert_eq!(
            edges(&graph),
            vec![
                ("A", "G"),
                ("G", "B"),
                ("G", "C"),
                ("B", "G_join"),
                ("C", "G_join"),
                ("G_join", "D"),
            ]
        );
        assert_eq!(graph.flows()[1].label.as_deref(), Some("yes"));
        assert_eq!(graph.flows()[2].label.as_deref(), Some("no"));

        let join = graph.get_node("G_join").unwrap();
        assert_eq!(join.kind, ElementKind::ExclusiveGateway);
        assert_eq!(join.label, "");
        assert!(join.membership.is_none());

        let c = graph.get_node("C").unwrap();
        assert_eq!(
            c.membership,
            Some(BranchMembership {
                gateway: "G".to_string(),
                branch: 1
            })
        );
    }

    #[test]
    fn test_gateway_without_join_merges_into_successor() {
        let raw = RawProcess::new(vec![
            RawGateway::new("G")
                .kind("parallelGateway")
                .branch(RawBranch::new(vec![RawNode::task("B")]))
                .branch(RawBranch::new(vec![RawNode::task("C")]))
                .without_join()
                .into(),
            RawNode::task("D"),
        ]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(ids(&graph), vec!["G", "B", "C", "D"]);
        assert_eq!(
            edges(&graph),
            vec![("G", "B"), ("G", "C"), ("B", "D"), ("C", "D")]
        );
        assert_eq!(graph.get_node("G").unwrap().kind, ElementKind::ParallelGateway);
    }

    #[test]
    fn test_empty_branch_carries_condition_to_join() {
        let raw = RawProcess::new(vec![RawGateway::new("G")
            .branch(RawBranch::new(vec![RawNode::task("B")]).when("yes"))
            .branch(RawBranch::new(vec![]).when("skip"))
            .into()]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(
            edges(&graph),
            vec![("G", "B"), ("B", "G_join"), ("G", "G_join")]
        );
        assert_eq!(graph.flows()[2].label.as_deref(), Some("skip"));
    }

    #[test]
    fn test_nested_membership_is_innermost() {
        let inner = RawGateway::new("inner")
            .branch(RawBranch::new(vec![RawNode::task("deep")]))
            .branch(RawBranch::new(vec![]));
        let raw = RawProcess::new(vec![RawGateway::new("outer")
            .branch(RawBranch::new(vec![inner.into()]))
            .branch(RawBranch::new(vec![RawNode::task("side")]))
            .into()]);
        let graph = normalize(&raw).unwrap();

        let deep = graph.get_node("deep").unwrap().membership.clone().unwrap();
        assert_eq!(deep.gateway, "inner");
        let inner_gateway = graph.get_node("inner").unwrap().membership.clone().unwrap();
        assert_eq!(inner_gateway.gateway, "outer");
        assert_eq!(inner_gateway.branch, 0);
        let inner_join = graph.get_node("inner_join").unwrap().membership.clone().unwrap();
        assert_eq!(inner_join.gateway, "outer");
    }

    #[test]
    fn test_branch_jump() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("B")]))
                .branch(RawBranch::new(vec![RawNode::task("fix")]).jump_to("A"))
                .into(),
            RawNode::task("D"),
        ]);
        let graph = normalize(&raw).unwrap();
        let jump = graph.flows().last().unwrap();
        assert_eq!((jump.source.as_str(), jump.target.as_str()), ("fix", "A"));
        assert!(jump.is_loop_back());
        assert!(!graph.successors("fix").contains(&"G_join"));
    }

    #[test]
    fn test_branch_jump_to_unknown_is_malformed() {
        let raw = RawProcess::new(vec![RawGateway::new("G")
            .branch(RawBranch::new(vec![]).jump_to("nowhere"))
            .into()]);
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.reference(), Some("nowhere"));
    }

    #[test]
    fn test_loop_flattening() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawLoop::new(vec![RawNode::task("B"), RawNode::task("C")])
                .id("L")
                .repeat_while("not done")
                .into(),
            RawNode::task("D"),
        ]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(ids(&graph), vec!["A", "B", "C", "L", "D"]);
        assert_eq!(
            edges(&graph),
            vec![("A", "B"), ("B", "C"), ("C", "L"), ("L", "B"), ("L", "D")]
        );
        let back = &graph.flows()[3];
        assert!(back.is_loop_back());
        assert_eq!(back.label.as_deref(), Some("not done"));
        assert_eq!(graph.get_node("L").unwrap().label, "not done");
    }

    #[test]
    fn test_empty_loop_is_malformed() {
        let raw = RawProcess::new(vec![RawLoop::new(vec![]).id("L").into()]);
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, ProcessError::MalformedProcess { .. }));
        assert_eq!(err.reference(), Some("L"));
    }

    #[test]
    fn test_loop_body_that_always_jumps_is_malformed() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawLoop::new(vec![RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("X")]).jump_to("A"))
                .into()])
            .id("L")
            .into(),
            RawNode::task("D"),
        ]);
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, ProcessError::MalformedProcess { .. }));
        assert_eq!(err.reference(), Some("L"));
    }

    #[test]
    fn test_loop_body_with_one_open_branch_is_accepted() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawLoop::new(vec![RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("X")]).jump_to("A"))
                .branch(RawBranch::new(vec![RawNode::task("Y")]))
                .into()])
            .id("L")
            .into(),
            RawNode::task("D"),
        ]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(graph.predecessors("L"), vec!["G_join"]);
        assert_eq!(graph.predecessors("D"), vec!["L"]);
    }

    #[test]
    fn test_link_to_unemitted_element_fails() {
        let mut fold = Fold {
            graph: CanonicalGraph::new(),
            claimed: HashSet::new(),
            implicit: true,
            jumps: Vec::new(),
        };
        fold.emit(Some("A"), ElementKind::Task, None, None).unwrap();

        let err = fold
            .link(vec![Exit::plain("A")], "ghost", FlowKind::Sequence)
            .unwrap_err();
        assert_eq!(err.reference(), Some("ghost"));
        assert!(fold.graph.flows().is_empty());
    }

    #[test]
    fn test_gateway_without_branches_is_malformed() {
        let raw = RawProcess::new(vec![RawGateway::new("G").into()]);
        assert_eq!(normalize(&raw).unwrap_err().reference(), Some("G"));
    }

    #[test]
    fn test_synthesized_ids_are_positional_and_stable() {
        let raw = RawProcess::new(vec![
            RawNode::anonymous_task("first"),
            RawGateway {
                branches: vec![RawBranch::new(vec![RawNode::anonymous_task("inside")])],
                ..RawGateway::default()
            }
            .into(),
        ]);
        let first = normalize(&raw).unwrap();
        assert_eq!(
            ids(&first),
            vec!["task_0", "exclusiveGateway_1", "task_2", "exclusiveGateway_1_join"]
        );
        let second = normalize(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_synthesized_id_skips_supplied_one() {
        let raw = RawProcess::new(vec![RawNode::anonymous_task("x"), RawNode::task("task_0")]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(ids(&graph), vec!["task_1", "task_0"]);
    }

    #[test]
    fn test_join_id_collision_gets_suffix() {
        let raw = RawProcess::new(vec![
            RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("B")]))
                .into(),
            RawNode::task("G_join"),
        ]);
        let graph = normalize(&raw).unwrap();
        assert_eq!(ids(&graph), vec!["G", "B", "G_join_2", "G_join"]);
    }

    #[test]
    fn test_duplicate_supplied_id() {
        let raw = RawProcess::new(vec![
            RawNode::task("A"),
            RawGateway::new("G")
                .branch(RawBranch::new(vec![RawNode::task("A")]))
                .into(),
        ]);
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, ProcessError::DuplicateIdentifier { ref id } if id == "A"));
    }

    #[test]
    fn test_blank_id_is_malformed() {
        let raw = RawProcess::new(vec![RawNode::task("A"), RawNode::task("  ")]);
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.reference(), Some("nodes[1]"));
    }

    #[test]
    fn test_explicit_flows_replace_implicit_sequencing() {
        let raw = RawProcess::with_flows(
            vec![RawNode::task("A"), RawNode::task("B"), RawNode::task("C")],
            vec![RawFlow::new("A", "C"), RawFlow::new("C", "B").labeled("back")],
        );
        let graph = normalize(&raw).unwrap();
        assert_eq!(edges(&graph), vec![("A", "C"), ("C", "B")]);
    }

    #[test]
    fn test_explicit_flow_to_unknown_is_malformed() {
        let raw = RawProcess::with_flows(
            vec![RawNode::task("A"), RawNode::task("B")],
            vec![RawFlow::new("A", "C")],
        );
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, ProcessError::MalformedProcess { .. }));
        assert_eq!(err.reference(), Some("C"));
    }

    #[test]
    fn test_explicit_self_loop_needs_loop_back_flag() {
        let nodes = vec![RawNode::task("A")];
        let plain = RawProcess::with_flows(nodes.clone(), vec![RawFlow::new("A", "A")]);
        assert!(normalize(&plain).is_err());

        let flagged = RawProcess::with_flows(nodes, vec![RawFlow::new("A", "A").as_loop_back()]);
        let graph = normalize(&flagged).unwrap();
        assert!(graph.flows()[0].is_loop_back());
    }

    #[test]
    fn test_trait_entry_point() {
        let raw = RawProcess::new(vec![RawNode::task("A")]);
        let normalizer = ProcessNormalizer::new();
        let graph = normalizer.normalize(&raw).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(normalizer.name(), "bpmn");
    }
}
