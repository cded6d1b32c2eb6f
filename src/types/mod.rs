//! Type definitions for alert triage

pub mod alert;
pub mod customer;
pub mod decision;
pub mod signals;
pub mod transaction;

pub use alert::{Alert, AlertHeader, AlertWindow, CaseInput, ValidatedCase};
pub use customer::{CustomerProfile, KycRiskRating, ProfileRecord};
pub use decision::{
    Classification, DecisionBasis, DecisionFactor, OracleStatus, RoutePath, RoutingOutcome,
    RuleId, TriageDecision, TypologyAssessment, TypologyCategory,
};
pub use signals::{RiskFactor, RiskSignals, SignalSource};
pub use transaction::{Direction, RawTransaction, Transaction};

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;

/// Deserialize an optional wire field, reading an unparsable value as absent
/// so that validation or ingest reports it by field name instead of the
/// whole case failing to decode.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
