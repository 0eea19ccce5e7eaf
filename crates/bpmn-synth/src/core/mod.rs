//! Core abstractions for process synthesis
//!
//! The pipeline is split into stages behind small traits:
//! Normalizer → Database → LayoutAlgorithm → Renderer.

mod database;
mod error;
mod layout;
pub mod logging;
mod normalizer;
mod renderer;
mod types;

pub use database::*;
pub use error::*;
pub use layout::*;
pub use logging::*;
pub use normalizer::*;
pub use renderer::*;
pub use types::*;
