//! BPMN process plugin
//!
//! Raw process → canonical graph → positioned document → XML.

mod document;
mod graph;
mod layout;
mod normalizer;
mod raw;
mod reader;
mod xml;

pub use document::*;
pub use graph::*;
pub use layout::*;
pub use normalizer::*;
pub use raw::*;
pub use reader::*;
pub use xml::*;
