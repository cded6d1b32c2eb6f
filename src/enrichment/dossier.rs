//! Enriched dossier handed to the triage cascade and the judgment oracle

use crate::enrichment::baseline::BehavioralBaseline;
use crate::enrichment::deviation::DeviationAnalysis;
use crate::enrichment::ingest::QuarantinedRecord;
use crate::enrichment::risk::RiskAssessment;
use crate::types::alert::Alert;
use crate::types::customer::CustomerProfile;
use crate::types::decision::DecisionFactor;
use crate::types::signals::RiskSignals;
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Rationale factors that mark a decision made on degraded input
pub const DATA_QUALITY_FACTORS: [&str; 3] = [
    "data_quarantine",
    "degraded_baseline",
    "unresolved_flagged_transactions",
];

/// Everything known about one alert after enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDossier {
    pub alert: Alert,
    pub profile: CustomerProfile,
    /// Signals with the KYC rating fallback applied
    pub signals: RiskSignals,

    /// Validated, deduplicated history
    pub transactions: Vec<Transaction>,
    /// Validated transactions dated inside the alert window
    pub window_transactions: Vec<Transaction>,
    /// Flagged references that resolved, in alert order
    pub flagged: Vec<Transaction>,
    /// Flagged references with no validated transaction behind them
    pub unresolved_flagged: Vec<String>,

    pub quarantined: Vec<QuarantinedRecord>,
    pub duplicates_removed: usize,
    pub data_quality_score: f64,

    pub baseline: BehavioralBaseline,
    /// Set when the baseline had to be degraded
    pub baseline_notice: Option<String>,
    pub deviation: DeviationAnalysis,
    pub risk: RiskAssessment,
}

impl EnrichedDossier {
    pub fn alert_id(&self) -> &str {
        &self.alert.alert_id
    }

    /// True when any input had to be dropped, defaulted or left unresolved
    pub fn is_degraded(&self) -> bool {
        self.baseline.degraded
            || !self.quarantined.is_empty()
            || !self.unresolved_flagged.is_empty()
    }

    /// Rationale entries describing degraded inputs, in a fixed order
    pub fn data_quality_notes(&self) -> Vec<DecisionFactor> {
        let mut notes = Vec::new();

        if !self.quarantined.is_empty() {
            notes.push(DecisionFactor::new(
                DATA_QUALITY_FACTORS[0],
                format!(
                    "{} record(s) quarantined, {} duplicate(s) removed, data quality {:.1}%",
                    self.quarantined.len(),
                    self.duplicates_removed,
                    self.data_quality_score
                ),
            ));
        }
        if let Some(notice) = &self.baseline_notice {
            notes.push(DecisionFactor::new(
                DATA_QUALITY_FACTORS[1],
                format!("{}; baseline seeded from the customer profile", notice),
            ));
        }
        if !self.unresolved_flagged.is_empty() {
            notes.push(DecisionFactor::new(
                DATA_QUALITY_FACTORS[2],
                self.unresolved_flagged.join(", "),
            ));
        }

        notes
    }
}
