//! Content store backends
//!
//! - `memory`: In-memory storage for tests and transient deployments
//! - `test`: Memory storage with load counting and failure injection
//! - `file`: One file per message, grouped by batch directory

pub mod file;
pub mod memory;

pub use file::{FileContentStore, FileContentStoreBuilder};
pub use memory::MemoryContentStore;
pub use test::TestContentStore;
