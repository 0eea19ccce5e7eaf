//! Security suggestion records
//!
//! Field names follow the wire format the assistant front end exchanges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::ProcessError;

/// Ontology paths proposed for one diagram element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySuggestion {
    #[serde(rename = "elementID")]
    pub element_id: String,
    /// Label of the element as the suggester saw it
    #[serde(rename = "elementText", default)]
    pub element_text: String,
    #[serde(default)]
    pub ontology_path: Vec<String>,
}

/// A batch of suggestions with the reasoning behind them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet {
    #[serde(default)]
    pub explanation: String,
    pub security_ontologies: Vec<SecuritySuggestion>,
}

impl SuggestionSet {
    /// Parse a suggestion set; malformed input is an error, never guessed at
    pub fn from_json(input: &str) -> Result<Self, ProcessError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String, ProcessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Why a suggestion cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum SuggestionIssue {
    /// The suggestion targets an element the diagram does not have
    UnknownElement {
        #[serde(rename = "elementID")]
        element_id: String,
    },
    /// The suggested path is not a leaf of the ontology template
    UnknownOntologyPath {
        #[serde(rename = "elementID")]
        element_id: String,
        path: String,
    },
}

impl fmt::Display for SuggestionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionIssue::UnknownElement { element_id } => {
                write!(f, "element '{}' is not in the diagram", element_id)
            }
            SuggestionIssue::UnknownOntologyPath { element_id, path } => write!(
                f,
                "ontology path '{}' suggested for '{}' is not in the catalog",
                path, element_id
            ),
        }
    }
}
