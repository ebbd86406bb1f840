//! Shared building blocks for the redeliver workspace
//!
//! Identifiers, the per-call [`Session`], raw [`MailContent`], the
//! append-only [`MailStatus`] record, plus the logging and audit helpers
//! used by every other crate.

pub mod audit;
pub mod content;
pub mod ids;
pub mod logging;
pub mod session;
pub mod status;

pub use content::MailContent;
pub use ids::{BatchId, MessageId};
pub use session::Session;
pub use status::{MailState, MailStatus};
pub use tracing;
