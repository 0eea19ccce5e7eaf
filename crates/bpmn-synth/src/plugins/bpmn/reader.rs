//! XML deserialization for diagram documents
//!
//! Reads back exactly what [`super::XmlRenderer`] writes. Shape kinds come
//! back as their rendered prefab, so an unrecognized kind reads back as
//! `task`. Diagnostics are not part of the markup and are always empty.

use roxmltree::{Document, Node};
use tracing::{debug, span, Level};

use super::{DiagramDocument, PositionedConnector, PositionedShape};
use crate::core::{AnchorSide, Bounds, ElementKind, Point, ProcessError};

/// Parse a serialized diagram document
pub fn read_document(xml: &str) -> Result<DiagramDocument, ProcessError> {
    let read_span = span!(Level::DEBUG, "read_document", bytes = xml.len());
    let _enter = read_span.enter();

    let parsed = Document::parse(xml).map_err(|e| ProcessError::document(e.to_string()))?;
    let root = parsed.root_element();
    if root.tag_name().name() != "root" {
        return Err(ProcessError::document(format!(
            "expected <root>, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut document = DiagramDocument::default();
    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "BPMNShape" => document.shapes.push(read_shape(child)?),
            "BPMNEdge" => document.connectors.push(read_connector(child)?),
            other => {
                return Err(ProcessError::document(format!(
                    "unexpected <{}> inside <root>",
                    other
                )))
            }
        }
    }

    debug!(
        shapes = document.shapes.len(),
        connectors = document.connectors.len(),
        "Document read"
    );
    Ok(document)
}

fn read_shape(node: Node<'_, '_>) -> Result<PositionedShape, ProcessError> {
    let id = attribute(node, "bpmnElement")?;
    let bounds_node = node
        .children()
        .find(|c| c.has_tag_name("Bounds"))
        .ok_or_else(|| ProcessError::document(format!("shape '{}' has no <Bounds>", id)))?;

    Ok(PositionedShape {
        id: id.to_string(),
        label: attribute(node, "text")?.to_string(),
        kind: ElementKind::parse(attribute(node, "type")?),
        bounds: Bounds::new(
            number(bounds_node, "x")?,
            number(bounds_node, "y")?,
            number(bounds_node, "width")?,
            number(bounds_node, "height")?,
        ),
    })
}

fn read_connector(node: Node<'_, '_>) -> Result<PositionedConnector, ProcessError> {
    let waypoints = node
        .children()
        .filter(|c| c.has_tag_name("waypoint"))
        .map(|c| Ok(Point::new(number(c, "x")?, number(c, "y")?)))
        .collect::<Result<Vec<_>, ProcessError>>()?;

    Ok(PositionedConnector {
        id: attribute(node, "id")?.to_string(),
        source: attribute(node, "startElement")?.to_string(),
        source_side: side(node, "startPosition")?,
        target: attribute(node, "targetElement")?.to_string(),
        target_side: side(node, "targetPosition")?,
        waypoints,
    })
}

fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ProcessError> {
    node.attribute(name).ok_or_else(|| {
        ProcessError::document(format!(
            "<{}> is missing attribute '{}'",
            node.tag_name().name(),
            name
        ))
    })
}

fn number(node: Node<'_, '_>, name: &str) -> Result<f64, ProcessError> {
    let raw = attribute(node, name)?;
    raw.parse::<f64>().map_err(|_| {
        ProcessError::document(format!(
            "attribute '{}' of <{}> is not a number: '{}'",
            name,
            node.tag_name().name(),
            raw
        ))
    })
}

fn side(node: Node<'_, '_>, name: &str) -> Result<AnchorSide, ProcessError> {
    let raw = attribute(node, name)?;
    AnchorSide::from_attr(raw)
        .ok_or_else(|| ProcessError::document(format!("unknown anchor side '{}'", raw)))
}
