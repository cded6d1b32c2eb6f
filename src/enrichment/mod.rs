//! Alert enrichment: ingest, baseline, deviation and risk aggregation
//!
//! Turns a validated case into an [`EnrichedDossier`]. Enrichment never
//! fails: bad records are quarantined and a short history degrades the
//! baseline, both of which are recorded on the dossier.

pub mod baseline;
pub mod deviation;
pub mod dossier;
pub mod ingest;
pub mod risk;

pub use baseline::{BaselineBuilder, BehavioralBaseline};
pub use deviation::{DeviationAnalysis, DeviationAnalyzer};
pub use dossier::EnrichedDossier;
pub use ingest::{ingest, IngestedLedger, QuarantineReason, QuarantinedRecord};
pub use risk::{RiskAggregator, RiskAssessment};

use crate::config::TriageConfig;
use crate::types::alert::ValidatedCase;
use tracing::warn;

/// Runs the enrichment stages in order for one alert
pub struct Enricher {
    baseline: BaselineBuilder,
    deviation: DeviationAnalyzer,
    risk: RiskAggregator,
}

impl Enricher {
    /// Create an enricher from the baseline, deviation and risk sections of the config
    pub fn new(config: &TriageConfig) -> Self {
        Self {
            baseline: BaselineBuilder::new(config.baseline.clone()),
            deviation: DeviationAnalyzer::new(config.deviation.clone()),
            risk: RiskAggregator::new(config.risk.clone()),
        }
    }

    /// Enrich a validated case into a dossier
    pub fn enrich(&self, case: ValidatedCase) -> EnrichedDossier {
        let ValidatedCase {
            alert,
            profile,
            transaction_history,
            risk_signals,
        } = case;

        let ledger = ingest(transaction_history);
        if !ledger.quarantined.is_empty() || ledger.duplicates_removed > 0 {
            warn!(
                alert_id = %alert.alert_id,
                quarantined = ledger.quarantined.len(),
                duplicates = ledger.duplicates_removed,
                "Transaction records dropped during ingest"
            );
        }

        let mut flagged = Vec::with_capacity(alert.flagged_transaction_ids.len());
        let mut unresolved_flagged = Vec::new();
        for id in &alert.flagged_transaction_ids {
            match ledger.find(id) {
                Some(tx) => flagged.push(tx.clone()),
                None => unresolved_flagged.push(id.clone()),
            }
        }
        if !unresolved_flagged.is_empty() {
            warn!(
                alert_id = %alert.alert_id,
                unresolved = ?unresolved_flagged,
                "Flagged transactions not found in history"
            );
        }

        let window_transactions: Vec<_> = ledger
            .transactions
            .iter()
            .filter(|t| alert.window.contains(t.date))
            .cloned()
            .collect();

        let (baseline, baseline_notice) =
            match self
                .baseline
                .build(&alert.customer_id, &ledger.transactions, &alert.window)
            {
                Ok(baseline) => (baseline, None),
                Err(e) => {
                    warn!(
                        alert_id = %alert.alert_id,
                        error = %e,
                        "Using degraded baseline"
                    );
                    (BehavioralBaseline::degraded(&profile), Some(e.to_string()))
                }
            };

        let deviation =
            self.deviation
                .analyze(&baseline, &window_transactions, &alert.window, &profile);

        let signals = risk_signals.with_kyc_fallback(profile.kyc_risk_rating);
        let risk = self.risk.assess(&signals, alert.base_risk_score);

        let data_quality_score = ledger.data_quality_score();
        EnrichedDossier {
            alert,
            profile,
            signals,
            transactions: ledger.transactions,
            window_transactions,
            flagged,
            unresolved_flagged,
            quarantined: ledger.quarantined,
            duplicates_removed: ledger.duplicates_removed,
            data_quality_score,
            baseline,
            baseline_notice,
            deviation,
            risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::alert::{AlertHeader, CaseInput};
    use crate::types::customer::{CustomerProfile, KycRiskRating};
    use crate::types::transaction::{Direction, RawTransaction, Transaction};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header(flagged: &[&str]) -> AlertHeader {
        AlertHeader {
            alert_id: Some("ALT-9".into()),
            customer_id: Some("CUST-9".into()),
            alert_type: Some("velocity".into()),
            window_start: Some(date(2026, 3, 1)),
            window_end: Some(date(2026, 3, 10)),
            base_risk_score: Some(40.0),
            flagged_transaction_ids: Some(flagged.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_short_history_degrades_but_continues() {
        let profile = CustomerProfile::new("CUST-9", KycRiskRating::High, date(2026, 2, 20))
            .with_historical_counterparty("Payroll Co");
        let case = CaseInput::new(header(&["W1", "MISSING"]), profile).with_transactions(vec![
            Transaction::new("H1", date(2026, 2, 25), 500.0, Direction::Inbound),
            Transaction::new("W1", date(2026, 3, 2), 700.0, Direction::Inbound)
                .with_counterparty("Stranger"),
        ]);

        let dossier = Enricher::new(&TriageConfig::default()).enrich(case.validate().unwrap());

        assert!(dossier.baseline.degraded);
        assert!(dossier.baseline_notice.is_some());
        assert_eq!(dossier.unresolved_flagged, vec!["MISSING".to_string()]);
        assert_eq!(dossier.flagged.len(), 1);
        assert_eq!(dossier.window_transactions.len(), 1);
        assert!(dossier.deviation.new_counterparties.contains("Stranger"));
        assert!(dossier.risk.factor("high_risk_kyc").is_some());

        let notes: Vec<String> = dossier
            .data_quality_notes()
            .into_iter()
            .map(|n| n.factor)
            .collect();
        assert_eq!(notes, vec!["degraded_baseline", "unresolved_flagged_transactions"]);
    }

    #[test]
    fn test_quarantine_is_visible_on_dossier() {
        let profile = CustomerProfile::new("CUST-9", KycRiskRating::Low, date(2020, 1, 1));
        let mut bad: RawTransaction =
            Transaction::new("BAD", date(2026, 3, 2), 1.0, Direction::Inbound).into();
        bad.amount = None;
        let case = CaseInput::new(header(&["W1"]), profile).with_transactions(vec![
            bad,
            Transaction::new("W1", date(2026, 3, 2), 700.0, Direction::Inbound).into(),
        ]);

        let dossier = Enricher::new(&TriageConfig::default()).enrich(case.validate().unwrap());

        assert_eq!(dossier.quarantined.len(), 1);
        assert_eq!(dossier.data_quality_score, 50.0);
        assert!(dossier.is_degraded());
        assert_eq!(dossier.data_quality_notes()[0].factor, "data_quarantine");
    }
}
