//! Positioned diagram document
//!
//! The output of layout: one shape per element and one connector per flow,
//! plus diagnostics for anything layout had to degrade.

use std::fmt;

use crate::core::{AnchorSide, Bounds, ElementKind, Point};

/// A laid-out element
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedShape {
    /// Element identifier (also used as the rendering identifier)
    pub id: String,
    pub label: String,
    pub kind: ElementKind,
    pub bounds: Bounds,
}

impl PositionedShape {
    /// Identifier the renderer binds its prefab to
    pub fn rendering_id(&self) -> &str {
        &self.id
    }
}

/// A laid-out flow
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedConnector {
    /// Derived identifier, see [`connector_id`]
    pub id: String,
    pub source: String,
    pub source_side: AnchorSide,
    pub target: String,
    pub target_side: AnchorSide,
    /// Route from source to target; empty when an endpoint could not be anchored
    pub waypoints: Vec<Point>,
}

impl PositionedConnector {
    /// Returns true if the connector carries a route
    pub fn is_routed(&self) -> bool {
        !self.waypoints.is_empty()
    }
}

/// Identifier of the connector for the `index`-th flow
///
/// The index suffix keeps parallel flows between the same pair distinct.
pub fn connector_id(source: &str, target: &str, index: usize) -> String {
    format!("{}-{}_connector{}", source, target, index)
}

/// Something layout could not do, reported instead of failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutDiagnostic {
    /// A flow endpoint has no shape to anchor to
    MissingAnchor {
        connector: String,
        missing: Vec<String>,
    },
}

impl fmt::Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDiagnostic::MissingAnchor { connector, missing } => write!(
                f,
                "connector '{}' has no anchor for {}",
                connector,
                missing.join(", ")
            ),
        }
    }
}

/// Shapes and connectors ready for serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramDocument {
    pub shapes: Vec<PositionedShape>,
    pub connectors: Vec<PositionedConnector>,
    /// Not serialized; for the caller to report
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl DiagramDocument {
    /// Look up a shape by element identifier
    pub fn shape(&self, id: &str) -> Option<&PositionedShape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Look up a connector by its derived identifier
    pub fn connector(&self, id: &str) -> Option<&PositionedConnector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Returns true if layout reported no degradation
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Overall extent of all shapes, `None` for an empty document
    pub fn extent(&self) -> Option<Bounds> {
        let first = self.shapes.first()?.bounds;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);
        for shape in &self.shapes[1..] {
            let b = shape.bounds;
            min_x = min_x.min(b.x);
            min_y = min_y.min(b.y);
            max_x = max_x.max(b.x + b.width);
            max_y = max_y.max(b.y + b.height);
        }
        Some(Bounds::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(id: &str, x: f64) -> PositionedShape {
        PositionedShape {
            id: id.to_string(),
            label: String::new(),
            kind: ElementKind::Task,
            bounds: Bounds::new(x, 0.0, 10.0, 5.0),
        }
    }

    #[test]
    fn test_connector_id_format() {
        assert_eq!(connector_id("A", "B", 0), "A-B_connector0");
        assert_eq!(connector_id("A", "B", 12), "A-B_connector12");
    }

    #[test]
    fn test_lookup_and_extent() {
        let document = DiagramDocument {
            shapes: vec![shape("A", 0.0), shape("B", 30.0)],
            ..DiagramDocument::default()
        };
        assert_eq!(document.shape("B").unwrap().bounds.x, 30.0);
        assert!(document.shape("C").is_none());
        assert_eq!(document.extent(), Some(Bounds::new(0.0, 0.0, 40.0, 5.0)));
        assert!(DiagramDocument::default().extent().is_none());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = LayoutDiagnostic::MissingAnchor {
            connector: "A-C_connector0".to_string(),
            missing: vec!["C".to_string()],
        };
        assert_eq!(
            diagnostic.to_string(),
            "connector 'A-C_connector0' has no anchor for C"
        );
    }
}
