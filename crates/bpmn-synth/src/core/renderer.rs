//! Core renderer trait for diagram output
//!
//! Renderers turn a positioned document into an external format.

use anyhow::Result;

/// Core trait for document renderers
///
/// # Example
/// ```
/// use bpmn_synth::core::Renderer;
/// use bpmn_synth::plugins::bpmn::{DiagramDocument, XmlRenderer};
///
/// let xml = XmlRenderer::new().render(&DiagramDocument::default()).unwrap();
/// assert_eq!(xml, "<root />");
/// ```
pub trait Renderer<T>: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render `document` into the output format
    fn render(&self, document: &T) -> Result<Self::Output>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
