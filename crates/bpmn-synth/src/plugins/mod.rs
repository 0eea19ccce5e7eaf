//! Plugin implementations
//!
//! `bpmn` holds the process pipeline itself, `security` checks ontology
//! suggestions against its output, and the orchestrator wires the pipeline
//! stages together.

pub mod bpmn;
pub mod orchestrator;
pub mod security;

pub use bpmn::*;
pub use orchestrator::*;
pub use security::*;
