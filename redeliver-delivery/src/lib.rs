//! Asynchronous dispatch and resend of stored outgoing mail
//!
//! This crate provides functionality to:
//! - Build per-call sessions, pinning the batch id of a resend
//! - Dispatch messages to a [`Transport`] in the background, bounded in
//!   concurrency and time
//! - Observe a dispatch through a [`MailListener`] and its [`StatusResult`]
//! - Resend stored messages one at a time or in bulk from the status history

mod config;
mod error;
mod listener;
mod resender;
mod result;
mod sender;
mod session;
mod transport;

pub use config::ResenderConfig;
pub use error::{ConfigError, ResendError, StoreError, TransportError};
pub use listener::{MailListener, MemoryMailListener, PersistentMailListener};
pub use resender::{ResendOutcome, Resender};
pub use result::StatusResult;
pub use sender::{MailSender, SenderConfig};
pub use session::{BATCH_ID_KEY, SessionConfig, SessionFactory};
pub use transport::{MockTransport, Transport};
