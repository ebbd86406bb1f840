//! Status store backends
//!
//! - `memory`: Records kept in process memory
//! - `file`: Append-only, length-prefixed bincode log

pub mod file;
pub mod memory;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;
