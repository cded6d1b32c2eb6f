//! Error types for alert triage.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using `TriageError`.
pub type Result<T> = std::result::Result<T, TriageError>;

/// Placeholder used when the alert identifier itself is missing.
pub const UNKNOWN_ALERT: &str = "<unknown>";

/// Errors raised by the triage core.
///
/// Data quarantine is deliberately absent: dropped transaction records are
/// counted on the dossier and processing continues.
#[derive(Debug, Error)]
pub enum TriageError {
    /// A required input field is missing or invalid. The alert is not
    /// classified.
    #[error("Malformed alert {alert_id}: {field} {reason}")]
    MalformedAlert {
        /// Alert identifier, or `<unknown>` when absent.
        alert_id: String,
        /// Offending input field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Fewer than one calendar month of pre-window history. Reported; the
    /// pipeline continues on a degraded baseline.
    #[error("Insufficient history for customer {customer_id}: {observed_days} day(s) before the alert window")]
    InsufficientHistory {
        /// Customer whose baseline could not be built.
        customer_id: String,
        /// Days of pre-window history actually observed.
        observed_days: i64,
    },

    /// The judgment oracle did not answer within the caller's timeout.
    #[error("Judgment oracle timed out after {0:?}")]
    OracleTimeout(Duration),

    /// The judgment oracle is not configured or failed.
    #[error("Judgment oracle unavailable: {0}")]
    OracleUnavailable(String),
}

impl TriageError {
    pub(crate) fn malformed(
        alert_id: Option<&str>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedAlert {
            alert_id: alert_id.unwrap_or(UNKNOWN_ALERT).to_string(),
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used for rejection messages and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAlert { .. } => "malformed_alert",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::OracleTimeout(_) => "oracle_timeout",
            Self::OracleUnavailable(_) => "oracle_unavailable",
        }
    }

    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Self::OracleTimeout(_) | Self::OracleUnavailable(_))
    }
}
