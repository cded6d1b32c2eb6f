//! Triage decision, typology and routing outputs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Triage classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    FalsePositive,
    NeedsReview,
    TruePositive,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::FalsePositive => "FALSE_POSITIVE",
            Classification::NeedsReview => "NEEDS_REVIEW",
            Classification::TruePositive => "TRUE_POSITIVE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a layer-1 triage rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "SANC-001")]
    SanctionsHit,
    #[serde(rename = "HIST-001")]
    PriorSarVolume,
    #[serde(rename = "SAL-001")]
    PayrollDeposit,
    #[serde(rename = "SEAS-001")]
    SeasonalSpike,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::SanctionsHit => "SANC-001",
            RuleId::PriorSarVolume => "HIST-001",
            RuleId::PayrollDeposit => "SAL-001",
            RuleId::SeasonalSpike => "SEAS-001",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layer of the cascade produced the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    Rule,
    CompositeScore,
    Oracle,
    OracleFallback,
}

impl DecisionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionBasis::Rule => "rule",
            DecisionBasis::CompositeScore => "composite_score",
            DecisionBasis::Oracle => "oracle",
            DecisionBasis::OracleFallback => "oracle_fallback",
        }
    }
}

/// One entry of the ordered decision rationale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFactor {
    pub factor: String,
    pub evidence: String,
}

impl DecisionFactor {
    pub fn new(factor: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            factor: factor.into(),
            evidence: evidence.into(),
        }
    }
}

/// What happened with the layer-3 judgment oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OracleStatus {
    NotInvoked,
    Judged {
        classification: Classification,
        rationale: String,
        /// Whether the judgment overrode the score-only result
        applied: bool,
    },
    TimedOut {
        timeout_ms: u64,
    },
    Unavailable {
        reason: String,
    },
}

impl OracleStatus {
    pub fn was_invoked(&self) -> bool {
        !matches!(self, OracleStatus::NotInvoked)
    }

    pub fn failed(&self) -> bool {
        matches!(
            self,
            OracleStatus::TimedOut { .. } | OracleStatus::Unavailable { .. }
        )
    }
}

/// Triage decision. Produced once per alert and never modified afterwards.
///
/// Contains no timestamps or generated ids, so identical input yields an
/// identical decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageDecision {
    pub alert_id: String,
    pub classification: Classification,
    pub basis: DecisionBasis,
    pub matched_rule: Option<RuleId>,
    /// Layer-2 behavioral anomaly score (0 - 100)
    pub behavioral_score: f64,
    /// Cross-source risk score (0 - 100)
    pub risk_score: f64,
    /// Weighted blend of behavioral, risk and alert base scores
    pub composite_score: f64,
    pub confidence: f64,
    pub oracle: OracleStatus,
    pub rationale: Vec<DecisionFactor>,
}

/// Suspicious-activity pattern category, in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypologyCategory {
    StructuringLayering,
    FunnelAccount,
    ContinuingActivity,
    GeneralSuspiciousActivity,
}

impl TypologyCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TypologyCategory::StructuringLayering => "Structuring with Layering",
            TypologyCategory::FunnelAccount => "Funnel Account (Money Mule)",
            TypologyCategory::ContinuingActivity => "Continuing Activity",
            TypologyCategory::GeneralSuspiciousActivity => "General Suspicious Activity",
        }
    }
}

impl fmt::Display for TypologyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typology assigned to a true-positive alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypologyAssessment {
    pub category: TypologyCategory,
    pub indicator_count: usize,
    pub matched_indicators: Vec<String>,
    /// Other categories that also met their threshold
    pub secondary_categories: Vec<TypologyCategory>,
}

/// Terminal pipeline path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePath {
    AutoClose,
    ReviewQueue,
    NarrativePipeline,
}

impl RoutePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePath::AutoClose => "auto_close",
            RoutePath::ReviewQueue => "review_queue",
            RoutePath::NarrativePipeline => "narrative_pipeline",
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected path plus everything it carries downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingOutcome {
    pub alert_id: String,
    pub path: RoutePath,
    pub decision: TriageDecision,
    pub typology: Option<TypologyAssessment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_wire_format() {
        let json = serde_json::to_string(&Classification::TruePositive).unwrap();
        assert_eq!(json, "\"TRUE_POSITIVE\"");

        let parsed: Classification = serde_json::from_str("\"NEEDS_REVIEW\"").unwrap();
        assert_eq!(parsed, Classification::NeedsReview);
    }

    #[test]
    fn test_rule_id_wire_format_matches_display() {
        for rule in [
            RuleId::SanctionsHit,
            RuleId::PriorSarVolume,
            RuleId::PayrollDeposit,
            RuleId::SeasonalSpike,
        ] {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{}\"", rule));
        }
    }

    #[test]
    fn test_oracle_status_tagging() {
        let status = OracleStatus::TimedOut { timeout_ms: 250 };
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["status"], "timed_out");
        assert!(status.was_invoked());
        assert!(status.failed());
        assert!(!OracleStatus::NotInvoked.was_invoked());
    }
}
