//! Risk aggregation across external signal sources

use crate::config::RiskPointTable;
use crate::types::customer::KycRiskRating;
use crate::types::signals::{RiskFactor, RiskSignals, SignalSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Aggregated cross-source risk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Capped sum of factor points (0 - 100)
    pub score: f64,
    /// Awarded factors in table order
    pub factors: Vec<RiskFactor>,
    /// Sum before the cap was applied
    pub uncapped_total: f64,
}

impl RiskAssessment {
    /// Factor contributed under `name`, if any
    pub fn factor(&self, name: &str) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.name == name)
    }

    pub fn was_capped(&self) -> bool {
        self.uncapped_total > self.score
    }
}

/// Combines risk signals into a single score under a fixed point table.
pub struct RiskAggregator {
    table: RiskPointTable,
}

impl RiskAggregator {
    /// Create an aggregator with the given point table
    pub fn new(table: RiskPointTable) -> Self {
        Self { table }
    }

    /// Score the signals. Absent signals contribute nothing; this never fails.
    ///
    /// `signals.kyc_rating` is expected to already carry the profile fallback.
    pub fn assess(&self, signals: &RiskSignals, alert_base_risk: f64) -> RiskAssessment {
        let table = &self.table;
        let mut factors = Vec::new();

        let mut award = |name: &str, source: SignalSource, points: f64, max: f64, raw: String| {
            factors.push(RiskFactor {
                name: name.to_string(),
                source,
                points: points.clamp(0.0, max),
                max_points: max,
                raw_value: raw,
            });
        };

        if signals.has_watchlist_hit() {
            award(
                "sanctions_hit",
                SignalSource::Watchlist,
                table.sanctions,
                table.sanctions,
                "true".into(),
            );
        }
        let prior_sars = signals.prior_sars();
        if prior_sars > 0 {
            award(
                "prior_sars",
                SignalSource::CaseHistory,
                table.prior_sars,
                table.prior_sars,
                prior_sars.to_string(),
            );
        }
        if signals.pep.unwrap_or(false) {
            award("pep", SignalSource::Kyc, table.pep, table.pep, "true".into());
        }
        if signals.law_enforcement_flag.unwrap_or(false) {
            award(
                "law_enforcement",
                SignalSource::LawEnforcement,
                table.law_enforcement,
                table.law_enforcement,
                "true".into(),
            );
        }
        if signals.adverse_media.unwrap_or(false) {
            award(
                "adverse_media",
                SignalSource::RiskIntel,
                table.adverse_media,
                table.adverse_media,
                "true".into(),
            );
        }
        match signals.internal_referral_count {
            Some(count) if count > 0 => award(
                "internal_referrals",
                SignalSource::Internal,
                table.internal_referrals,
                table.internal_referrals,
                count.to_string(),
            ),
            _ => {}
        }
        if signals.kyc_rating == Some(KycRiskRating::High) {
            award(
                "high_risk_kyc",
                SignalSource::Kyc,
                table.high_risk_kyc,
                table.high_risk_kyc,
                "High".into(),
            );
        }
        if let Some(notes) = signals.notes() {
            award(
                "investigator_notes",
                SignalSource::Investigator,
                table.investigator_notes,
                table.investigator_notes,
                notes.to_string(),
            );
        }
        if signals.credit_deterioration.unwrap_or(false) {
            award(
                "credit_deterioration",
                SignalSource::CreditBureau,
                table.credit_deterioration,
                table.credit_deterioration,
                "true".into(),
            );
        }
        match signals.credit_utilization {
            Some(util) if util.is_finite() && util > table.utilization_threshold => award(
                "high_utilization",
                SignalSource::CreditBureau,
                table.high_utilization,
                table.high_utilization,
                format!("{:.2}", util),
            ),
            _ => {}
        }
        if alert_base_risk.is_finite() && alert_base_risk > 0.0 {
            let max = 100.0 * table.alert_base_share;
            award(
                "alert_base_risk",
                SignalSource::Monitoring,
                alert_base_risk * table.alert_base_share,
                max,
                format!("{:.1}", alert_base_risk),
            );
        }

        let uncapped_total: f64 = factors.iter().map(|f| f.points).sum();
        let score = uncapped_total.clamp(0.0, table.cap);

        debug!(
            risk_score = score,
            factors = factors.len(),
            capped = uncapped_total > score,
            "Risk signals aggregated"
        );

        RiskAssessment {
            score,
            factors,
            uncapped_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> RiskAggregator {
        RiskAggregator::new(RiskPointTable::default())
    }

    #[test]
    fn test_no_signals_scores_base_share_only() {
        let assessment = aggregator().assess(&RiskSignals::default(), 82.5);

        assert!((assessment.score - 12.375).abs() < 1e-9);
        assert_eq!(assessment.factors.len(), 1);
        assert_eq!(assessment.factors[0].source, SignalSource::Monitoring);
    }

    #[test]
    fn test_every_signal_is_capped_at_100() {
        let signals = RiskSignals {
            watchlist_hit: Some(true),
            prior_sar_count: Some(3),
            prior_sar_activity: vec!["structuring".into()],
            pep: Some(true),
            law_enforcement_flag: Some(true),
            adverse_media: Some(true),
            internal_referral_count: Some(2),
            kyc_rating: Some(KycRiskRating::High),
            investigator_notes: Some("Customer evasive on source of funds".into()),
            credit_deterioration: Some(true),
            credit_utilization: Some(0.95),
        };

        let assessment = aggregator().assess(&signals, 100.0);

        assert_eq!(assessment.score, 100.0);
        assert!((assessment.uncapped_total - 146.0).abs() < 1e-9);
        assert!(assessment.was_capped());
        assert_eq!(assessment.factor("prior_sars").unwrap().raw_value, "3");
    }

    #[test]
    fn test_utilization_threshold_is_strict() {
        let at_threshold = RiskSignals {
            credit_utilization: Some(0.80),
            ..Default::default()
        };
        assert!(aggregator().assess(&at_threshold, 0.0).factors.is_empty());

        let above = RiskSignals {
            credit_utilization: Some(0.81),
            ..Default::default()
        };
        assert_eq!(aggregator().assess(&above, 0.0).score, 3.0);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        let cases = [
            (RiskSignals::default(), 0.0),
            (RiskSignals::default().with_watchlist_hit(), 100.0),
            (RiskSignals::default().with_pep().with_adverse_media(), 50.0),
            (
                RiskSignals {
                    credit_utilization: Some(f64::NAN),
                    ..Default::default()
                },
                f64::NAN,
            ),
        ];

        for (signals, base) in cases {
            let score = aggregator().assess(&signals, base).score;
            assert!((0.0..=100.0).contains(&score), "score {} out of bounds", score);
        }
    }
}
