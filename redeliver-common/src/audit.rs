//! Audit logging for resend lifecycle events
//!
//! Every event is emitted as a structured `tracing` event so that it can be
//! routed to a dedicated sink by the subscriber.
//!
//! ## Audit Events
//!
//! - `ResendDispatched`: A stored message was reloaded and handed to the sender
//! - `ResendSkipped`: A bulk resend candidate could not be reloaded
//! - `DeliverySuccess`: The transport accepted a message
//! - `DeliveryFailure`: The transport rejected a message
//!
//! ## PII Redaction
//!
//! Recipient addresses can be redacted based on [`AuditConfig`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Audit logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging for resend lifecycle events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Redact recipient email addresses from audit logs (PII protection)
    #[serde(default)]
    pub redact_recipients: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_recipients: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

static AUDIT_CONFIG: std::sync::OnceLock<Arc<AuditConfig>> = std::sync::OnceLock::new();

/// Initialize audit logging with configuration
///
/// Only the first call takes effect. A later call asking for a different
/// configuration is logged at `WARN` and ignored. Returns whether `config`
/// is the configuration in use.
pub fn init(config: AuditConfig) -> bool {
    let active = AUDIT_CONFIG.get_or_init(|| Arc::new(config.clone()));
    if **active == config {
        return true;
    }

    tracing::event!(
        tracing::Level::WARN,
        active.enabled = active.enabled,
        active.redact_recipients = active.redact_recipients,
        ignored.enabled = config.enabled,
        ignored.redact_recipients = config.redact_recipients,
        "Audit configuration already initialised, ignoring new configuration"
    );
    false
}

/// Get the current audit configuration
#[must_use]
pub fn config() -> Arc<AuditConfig> {
    AUDIT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(AuditConfig::default()))
}

/// Redact email address if redaction is enabled
#[must_use]
pub fn redact_email(email: &str, redact: bool) -> String {
    if redact {
        // Keep domain but redact local part
        if let Some((_, domain)) = email.split_once('@') {
            format!("[REDACTED]@{domain}")
        } else {
            "[REDACTED]".to_string()
        }
    } else {
        email.to_string()
    }
}

/// Redact multiple email addresses
#[must_use]
pub fn redact_emails(emails: &[String], redact: bool) -> Vec<String> {
    emails.iter().map(|e| redact_email(e, redact)).collect()
}

/// Log that a stored message has been handed to the sender again
///
/// # Fields
/// - `batch_id`: Batch the message was originally sent in
/// - `message_id`: Message identifier within the batch
/// - `recipients`: Recipients (redacted if configured)
/// - `size`: Message size in bytes
pub fn log_resend_dispatched(batch_id: &str, message_id: &str, recipients: &[String], size: usize) {
    let config = config();
    if !config.enabled {
        return;
    }

    let redacted_recipients = redact_emails(recipients, config.redact_recipients);

    tracing::event!(
        tracing::Level::INFO,
        event = "ResendDispatched",
        batch_id = %batch_id,
        message_id = %message_id,
        recipients = ?redacted_recipients,
        recipient_count = recipients.len(),
        size = size,
        "Audit: Resend dispatched"
    );
}

/// Log that a bulk resend candidate was skipped before dispatch
pub fn log_resend_skipped(batch_id: &str, message_id: &str, reason: &str) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "ResendSkipped",
        batch_id = %batch_id,
        message_id = %message_id,
        reason = %reason,
        "Audit: Resend skipped"
    );
}

/// Log delivery success event
///
/// # Fields
/// - `batch_id`: Batch the message belongs to
/// - `message_id`: Message identifier within the batch
/// - `duration_ms`: Time spent in the transport, in milliseconds
pub fn log_delivery_success(batch_id: &str, message_id: &str, duration_ms: u128) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "DeliverySuccess",
        batch_id = %batch_id,
        message_id = %message_id,
        duration_ms = duration_ms,
        "Audit: Delivery successful"
    );
}

/// Log delivery failure event
pub fn log_delivery_failure(batch_id: &str, message_id: &str, error: &str) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "DeliveryFailure",
        batch_id = %batch_id,
        message_id = %message_id,
        error = %error,
        "Audit: Delivery failed"
    );
}
