//! Content store for raw outgoing messages
//!
//! Messages are written once, at original send time, keyed by
//! (batch id, message id), and only ever read back when a message is resent.

pub mod backends;
pub mod config;
pub mod error;
pub mod store;

pub use backends::{FileContentStore, FileContentStoreBuilder, MemoryContentStore, TestContentStore};
pub use config::{ContentStoreConfig, MemoryConfig};
pub use error::{Result, SpoolError, ValidationError};
pub use store::ContentStore;
