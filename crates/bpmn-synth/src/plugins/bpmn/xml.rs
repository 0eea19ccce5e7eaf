//! XML serialization for diagram documents
//!
//! Emits the markup consumed by the diagram front end: a `root` container
//! with `BPMNShape` and `BPMNEdge` siblings. All attribute values are
//! strings; numbers use the shortest decimal that reads back to the same
//! `f64`.

use anyhow::Result;
use tracing::{debug, span, Level};

use super::{DiagramDocument, PositionedConnector, PositionedShape};
use crate::core::Renderer;

/// Writes diagram documents as XML
#[derive(Debug, Clone, Default)]
pub struct XmlRenderer {
    /// Spaces per nesting level; `None` writes everything on one line
    indent: Option<usize>,
}

impl XmlRenderer {
    /// Compact renderer (no whitespace between elements)
    pub fn new() -> Self {
        Self { indent: None }
    }

    /// Renderer that puts each element on its own line, indented by two spaces
    pub fn pretty() -> Self {
        Self { indent: Some(2) }
    }

    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    pub fn render_document(&self, document: &DiagramDocument) -> String {
        let render_span = span!(
            Level::INFO,
            "render_xml",
            shape_count = document.shapes.len(),
            connector_count = document.connectors.len()
        );
        let _enter = render_span.enter();

        let mut writer = XmlWriter::new(self.indent);
        if document.shapes.is_empty() && document.connectors.is_empty() {
            writer.empty("root", &[]);
            return writer.finish();
        }

        writer.open("root", &[]);
        for shape in &document.shapes {
            write_shape(&mut writer, shape);
        }
        for connector in &document.connectors {
            write_connector(&mut writer, connector);
        }
        writer.close("root");

        let output = writer.finish();
        debug!(bytes = output.len(), "XML rendered");
        output
    }
}

impl Renderer<DiagramDocument> for XmlRenderer {
    type Output = String;

    fn render(&self, document: &DiagramDocument) -> Result<Self::Output> {
        Ok(self.render_document(document))
    }

    fn name(&self) -> &'static str {
        "xml"
    }

    fn format(&self) -> &'static str {
        "xml"
    }
}

fn write_shape(writer: &mut XmlWriter, shape: &PositionedShape) {
    writer.open(
        "BPMNShape",
        &[
            ("bpmnElement", shape.id.clone()),
            ("id", shape.rendering_id().to_string()),
            ("text", shape.label.clone()),
            ("type", shape.kind.prefab().to_string()),
        ],
    );
    let b = shape.bounds;
    writer.empty(
        "Bounds",
        &[
            ("x", format_number(b.x)),
            ("y", format_number(b.y)),
            ("width", format_number(b.width)),
            ("height", format_number(b.height)),
        ],
    );
    writer.close("BPMNShape");
}

fn write_connector(writer: &mut XmlWriter, connector: &PositionedConnector) {
    let attrs = [
        ("id", connector.id.clone()),
        ("startElement", connector.source.clone()),
        ("startPosition", connector.source_side.as_str().to_string()),
        ("targetElement", connector.target.clone()),
        ("targetPosition", connector.target_side.as_str().to_string()),
    ];
    if !connector.is_routed() {
        writer.empty("BPMNEdge", &attrs);
        return;
    }

    writer.open("BPMNEdge", &attrs);
    for point in &connector.waypoints {
        writer.empty(
            "waypoint",
            &[("x", format_number(point.x)), ("y", format_number(point.y))],
        );
    }
    writer.close("BPMNEdge");
}

/// Shortest round-trip decimal; negative zero prints as `0`
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Escape text for use inside a double-quoted attribute value
///
/// Characters XML 1.0 cannot carry (C0 controls other than tab, newline and
/// carriage return, plus U+FFFE and U+FFFF) are replaced with U+FFFD.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_attribute_into(&mut out, text);
    out
}

fn escape_attribute_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, ch) in text.char_indices() {
        let esc = match ch {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&apos;",
            // Literal whitespace would be normalized to spaces by readers
            '\t' => "&#9;",
            '\n' => "&#10;",
            '\r' => "&#13;",
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => "\u{fffd}",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + ch.len_utf8();
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}

struct XmlWriter {
    out: String,
    indent: Option<usize>,
    depth: usize,
}

impl XmlWriter {
    fn new(indent: Option<usize>) -> Self {
        Self {
            out: String::new(),
            indent,
            depth: 0,
        }
    }

    fn line_start(&mut self) {
        if let Some(width) = self.indent {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            self.out.extend(std::iter::repeat(' ').take(width * self.depth));
        }
    }

    fn tag(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.line_start();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            escape_attribute_into(&mut self.out, value);
            self.out.push('"');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.tag(name, attrs);
        self.out.push('>');
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) {
        self.tag(name, attrs);
        self.out.push_str(" />");
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line_start();
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn finish(self) -> String {
        self.out
    }
}
