//! Security ontology plugin
//!
//! Checks suggested security annotations against the diagram they target
//! and the ontology template they draw from.

mod catalog;
mod suggestion;

pub use catalog::*;
pub use suggestion::*;
