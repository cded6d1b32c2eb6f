//! Alert and case input data structures

use crate::error::{Result, TriageError};
use crate::types::customer::{CustomerProfile, ProfileRecord};
use crate::types::signals::RiskSignals;
use crate::types::transaction::RawTransaction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range of the transactions that triggered the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AlertWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window length in days, both ends counted. Zero or negative for an
    /// inverted window.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether `date` falls inside the window, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Alert header as emitted by the transaction-monitoring system.
///
/// Fields are optional on the wire so that a missing field surfaces as
/// `MalformedAlert` naming the field, not as a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertHeader {
    pub alert_id: Option<String>,
    pub customer_id: Option<String>,
    /// Monitoring scenario that fired (structuring, funnel_account, ...)
    #[serde(alias = "type")]
    pub alert_type: Option<String>,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    /// Base risk score from the monitoring system (0 - 100)
    #[serde(alias = "risk_score")]
    pub base_risk_score: Option<f64>,
    pub flagged_transaction_ids: Option<Vec<String>>,
}

/// Complete case input: alert plus everything the collaborators supply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseInput {
    pub alert: AlertHeader,

    #[serde(default)]
    pub customer_profile: Option<ProfileRecord>,

    #[serde(default)]
    pub transaction_history: Vec<RawTransaction>,

    #[serde(default, alias = "risk_intelligence")]
    pub risk_signals: RiskSignals,
}

/// Validated alert header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub customer_id: String,
    pub alert_type: Option<String>,
    pub window: AlertWindow,
    pub base_risk_score: f64,
    pub flagged_transaction_ids: Vec<String>,
}

impl Alert {
    /// Case-insensitive check against the monitoring scenario name
    pub fn type_contains(&self, needle: &str) -> bool {
        self.alert_type
            .as_deref()
            .map(|t| t.to_lowercase().contains(needle))
            .unwrap_or(false)
    }
}

/// Case input after required-field validation
#[derive(Debug, Clone)]
pub struct ValidatedCase {
    pub alert: Alert,
    pub profile: CustomerProfile,
    pub transaction_history: Vec<RawTransaction>,
    pub risk_signals: RiskSignals,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CaseInput {
    pub fn new(alert: AlertHeader, profile: CustomerProfile) -> Self {
        Self {
            alert,
            customer_profile: Some(profile.into()),
            transaction_history: Vec::new(),
            risk_signals: RiskSignals::default(),
        }
    }

    pub fn with_transactions<I, T>(mut self, transactions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RawTransaction>,
    {
        self.transaction_history
            .extend(transactions.into_iter().map(Into::into));
        self
    }

    pub fn with_signals(mut self, signals: RiskSignals) -> Self {
        self.risk_signals = signals;
        self
    }

    /// Best-effort alert id for logging before validation
    pub fn alert_id(&self) -> Option<&str> {
        self.alert.alert_id.as_deref()
    }

    /// Check every required field. Nothing is defaulted: a missing field
    /// fails with `MalformedAlert`.
    pub fn validate(self) -> Result<ValidatedCase> {
        let header = self.alert;
        let alert_id = non_empty(header.alert_id)
            .ok_or_else(|| TriageError::malformed(None, "alert_id", "is missing"))?;
        let id = Some(alert_id.as_str());

        let customer_id = non_empty(header.customer_id)
            .ok_or_else(|| TriageError::malformed(id, "customer_id", "is missing"))?;

        let start = header
            .window_start
            .ok_or_else(|| TriageError::malformed(id, "window_start", "is missing"))?;
        let end = header
            .window_end
            .ok_or_else(|| TriageError::malformed(id, "window_end", "is missing"))?;
        let window = AlertWindow::new(start, end);
        if window.days() <= 0 {
            return Err(TriageError::malformed(
                id,
                "window_end",
                format!("precedes window_start ({} < {})", end, start),
            ));
        }

        let base_risk_score = header
            .base_risk_score
            .ok_or_else(|| TriageError::malformed(id, "base_risk_score", "is missing"))?;
        if !base_risk_score.is_finite() || !(0.0..=100.0).contains(&base_risk_score) {
            return Err(TriageError::malformed(
                id,
                "base_risk_score",
                format!("must be within 0-100, got {}", base_risk_score),
            ));
        }

        let flagged_transaction_ids = header
            .flagged_transaction_ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| TriageError::malformed(id, "flagged_transaction_ids", "is empty"))?;

        let profile = self
            .customer_profile
            .ok_or_else(|| TriageError::malformed(id, "customer_profile", "is missing"))?
            .validate(&alert_id)?;
        if profile.customer_id != customer_id {
            return Err(TriageError::malformed(
                id,
                "customer_profile",
                format!(
                    "belongs to {} but the alert names {}",
                    profile.customer_id, customer_id
                ),
            ));
        }

        Ok(ValidatedCase {
            alert: Alert {
                alert_id,
                customer_id,
                alert_type: non_empty(header.alert_type),
                window,
                base_risk_score,
                flagged_transaction_ids,
            },
            profile,
            transaction_history: self.transaction_history,
            risk_signals: self.risk_signals,
        })
    }
}
