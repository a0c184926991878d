//! Check attribute services.
//!
//! Read-side aggregation of every attribute index into one grouped view,
//! and single-field updates of an existing attribute.

pub mod aggregator;
pub mod updater;

pub use aggregator::aggregate;
pub use updater::update_attribute;
