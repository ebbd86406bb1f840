//! Delivery status store
//!
//! Every delivery transition is appended as a new [`MailStatus`] row; rows
//! are never rewritten. Stores answer exact-match, AND-combined filter queries
//! with paging and optional sorting.
//!
//! [`MailStatus`]: redeliver_common::MailStatus

pub mod backends;
pub mod config;
pub mod error;
pub mod filter;
pub mod store;

pub use backends::{FileStatusStore, MemoryStatusStore};
pub use config::StatusStoreConfig;
pub use error::{Result, StatusStoreError};
pub use filter::{SortField, StatusFilter};
pub use store::StatusStore;
