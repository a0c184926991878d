//! Check templates: typed definitions, list state transitions, and storage.

pub mod model;
pub mod service;
pub mod state;

pub use model::{CheckDefinition, Template};
pub use service::TemplateService;
