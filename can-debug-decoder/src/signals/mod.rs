//! Message descriptors, the descriptor catalog, and the layout file parser
//!
//! Descriptors are pure data. The catalog owns them and hands out shared,
//! read-only references; the layout parser builds them from TOML.

pub mod catalog;
pub mod descriptor;
pub mod layout;

// Re-export key types for convenience
pub use catalog::{CatalogStats, DescriptorCatalog, FramePair};
pub use descriptor::{MessageDescriptor, SendType, SignalLayout, ValueDescription};
