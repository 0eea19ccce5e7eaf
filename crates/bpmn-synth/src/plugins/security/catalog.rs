//! Security ontology catalog
//!
//! The catalog is the set of leaf paths of an ontology template. A path
//! joins tag names from the template root down to a leaf with `/`, root
//! included, e.g. `root/bpmnElement/accesscontrol/authentication`.

use roxmltree::{Document, Node};
use std::collections::HashSet;
use tracing::{debug, span, trace, warn, Level};

use super::{SecuritySuggestion, SuggestionIssue};
use crate::core::ProcessError;
use crate::plugins::bpmn::DiagramDocument;

/// Leaf paths of an ontology template, in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OntologyCatalog {
    paths: Vec<String>,
    known: HashSet<String>,
}

impl OntologyCatalog {
    /// Collect the leaf paths of `template`
    ///
    /// Repeated leaf paths are kept once, at their first position.
    pub fn from_xml(template: &str) -> Result<Self, ProcessError> {
        let catalog_span = span!(Level::DEBUG, "ontology_catalog", bytes = template.len());
        let _enter = catalog_span.enter();

        let parsed = Document::parse(template).map_err(|e| ProcessError::ontology(e.to_string()))?;
        let mut catalog = Self::default();
        catalog.collect(parsed.root_element(), "");
        debug!(paths = catalog.paths.len(), "Ontology catalog built");
        Ok(catalog)
    }

    /// Build a catalog from already known paths
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for path in paths {
            catalog.insert(path.into());
        }
        catalog
    }

    fn collect(&mut self, node: Node<'_, '_>, parent: &str) {
        let tag = node.tag_name().name();
        let path = if parent.is_empty() {
            tag.to_string()
        } else {
            format!("{}/{}", parent, tag)
        };

        let mut children = node.children().filter(Node::is_element).peekable();
        if children.peek().is_none() {
            self.insert(path);
            return;
        }
        for child in children {
            self.collect(child, &path);
        }
    }

    fn insert(&mut self, path: String) {
        if self.known.insert(path.clone()) {
            trace!(path = %path, "Ontology leaf");
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.known.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Check suggestions against a diagram and this catalog
    ///
    /// Issues come out in suggestion order, then path order within a
    /// suggestion. An empty result means every suggestion is usable.
    pub fn review(
        &self,
        document: &DiagramDocument,
        suggestions: &[SecuritySuggestion],
    ) -> Vec<SuggestionIssue> {
        let elements: HashSet<&str> = document.shapes.iter().map(|s| s.id.as_str()).collect();
        let mut issues = Vec::new();

        for suggestion in suggestions {
            if !elements.contains(suggestion.element_id.as_str()) {
                issues.push(SuggestionIssue::UnknownElement {
                    element_id: suggestion.element_id.clone(),
                });
            }
            for path in &suggestion.ontology_path {
                if !self.contains(path) {
                    issues.push(SuggestionIssue::UnknownOntologyPath {
                        element_id: suggestion.element_id.clone(),
                        path: path.clone(),
                    });
                }
            }
        }

        if !issues.is_empty() {
            warn!(
                suggestions = suggestions.len(),
                issues = issues.len(),
                "Security suggestions need attention"
            );
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bounds, ElementKind};
    use crate::plugins::bpmn::PositionedShape;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <bpmnElement>
    <accesscontrol>
      <authentication enabled="false" />
      <authorization enabled="false" />
    </accesscontrol>
    <privacy>
      <anonymity />
    </privacy>
  </bpmnElement>
  <audit />
</root>"#;

    fn document_with(ids: &[&str]) -> DiagramDocument {
        DiagramDocument {
            shapes: ids
                .iter()
                .map(|id| PositionedShape {
                    id: id.to_string(),
                    label: String::new(),
                    kind: ElementKind::Task,
                    bounds: Bounds::default(),
                })
                .collect(),
            ..DiagramDocument::default()
        }
    }

    fn suggestion(id: &str, paths: &[&str]) -> SecuritySuggestion {
        SecuritySuggestion {
            element_id: id.to_string(),
            element_text: String::new(),
            ontology_path: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_leaf_paths_in_document_order() {
        let catalog = OntologyCatalog::from_xml(TEMPLATE).unwrap();
        assert_eq!(
            catalog.paths(),
            &[
                "root/bpmnElement/accesscontrol/authentication",
                "root/bpmnElement/accesscontrol/authorization",
                "root/bpmnElement/privacy/anonymity",
                "root/audit",
            ]
        );
        assert!(!catalog.contains("root/bpmnElement"));
    }

    #[test]
    fn test_repeated_leaves_kept_once() {
        let catalog = OntologyCatalog::from_xml("<root><a /><a /><b><c /></b></root>").unwrap();
        assert_eq!(catalog.paths(), &["root/a", "root/b/c"]);
    }

    #[test]
    fn test_bare_root_is_its_own_leaf() {
        let catalog = OntologyCatalog::from_xml("<root />").unwrap();
        assert_eq!(catalog.paths(), &["root"]);
    }

    #[test]
    fn test_invalid_template() {
        let err = OntologyCatalog::from_xml("<root>").unwrap_err();
        assert!(matches!(err, ProcessError::Ontology { .. }));
    }

    #[test]
    fn test_review() {
        let catalog = OntologyCatalog::from_xml(TEMPLATE).unwrap();
        let document = document_with(&["task1", "task2"]);

        let valid = [suggestion("task1", &["root/audit"])];
        assert!(catalog.review(&document, &valid).is_empty());

        let invalid = [
            suggestion("ghost", &["root/audit"]),
            suggestion("task2", &["root/bpmnElement", "root/audit"]),
        ];
        assert_eq!(
            catalog.review(&document, &invalid),
            vec![
                SuggestionIssue::UnknownElement {
                    element_id: "ghost".to_string()
                },
                SuggestionIssue::UnknownOntologyPath {
                    element_id: "task2".to_string(),
                    path: "root/bpmnElement".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_from_paths() {
        let catalog = OntologyCatalog::from_paths(["a/b", "a/c", "a/b"]);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("a/c"));
    }
}
