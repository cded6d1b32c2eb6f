//! Layer 1: ordered deterministic triage rules

use crate::config::CascadeConfig;
use crate::enrichment::EnrichedDossier;
use crate::types::decision::{Classification, RuleId};
use chrono::Datelike;
use std::collections::BTreeSet;

/// Evidence string when the rule matches, `None` otherwise
type RuleCheck = fn(&EnrichedDossier, &CascadeConfig) -> Option<String>;

/// One rule of the book
pub struct TriageRule {
    pub id: RuleId,
    pub classification: Classification,
    pub description: &'static str,
    check: RuleCheck,
}

impl TriageRule {
    pub fn evaluate(&self, dossier: &EnrichedDossier, config: &CascadeConfig) -> Option<RuleMatch> {
        (self.check)(dossier, config).map(|evidence| RuleMatch {
            rule: self.id,
            classification: self.classification,
            evidence,
        })
    }
}

/// A rule that fired
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule: RuleId,
    pub classification: Classification,
    pub evidence: String,
}

/// Rules evaluated top-down; the first match wins
pub struct RuleBook {
    rules: Vec<TriageRule>,
}

impl RuleBook {
    /// Standard book in priority order: sanctions, prior SAR with volume,
    /// payroll deposit, seasonal spike
    pub fn standard() -> Self {
        Self {
            rules: vec![
                TriageRule {
                    id: RuleId::SanctionsHit,
                    classification: Classification::TruePositive,
                    description: "Sanctions / watchlist hit",
                    check: sanctions_hit,
                },
                TriageRule {
                    id: RuleId::PriorSarVolume,
                    classification: Classification::TruePositive,
                    description: "Prior SAR on file with elevated volume",
                    check: prior_sar_volume,
                },
                TriageRule {
                    id: RuleId::PayrollDeposit,
                    classification: Classification::FalsePositive,
                    description: "Single flagged deposit matches the known employer payroll",
                    check: payroll_deposit,
                },
                TriageRule {
                    id: RuleId::SeasonalSpike,
                    classification: Classification::FalsePositive,
                    description: "Volume spike matches prior-year seasonal volume",
                    check: seasonal_spike,
                },
            ],
        }
    }

    pub fn rules(&self) -> &[TriageRule] {
        &self.rules
    }

    pub fn evaluate(&self, dossier: &EnrichedDossier, config: &CascadeConfig) -> Option<RuleMatch> {
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(dossier, config))
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

fn sanctions_hit(dossier: &EnrichedDossier, _config: &CascadeConfig) -> Option<String> {
    dossier
        .signals
        .has_watchlist_hit()
        .then(|| "watchlist screening returned a hit".to_string())
}

fn prior_sar_volume(dossier: &EnrichedDossier, config: &CascadeConfig) -> Option<String> {
    let prior = dossier.signals.prior_sars();
    let factor = dossier.deviation.volume_deviation_factor;
    (prior > 0 && factor > config.prior_sar_deviation_threshold).then(|| {
        format!(
            "{} prior SAR(s) on file and volume deviation {:.2}x exceeds {:.1}x",
            prior, factor, config.prior_sar_deviation_threshold
        )
    })
}

fn payroll_deposit(dossier: &EnrichedDossier, config: &CascadeConfig) -> Option<String> {
    if dossier.alert.flagged_transaction_ids.len() != 1 {
        return None;
    }
    let [tx] = dossier.flagged.as_slice() else {
        return None;
    };
    if !tx.is_inbound() {
        return None;
    }

    let employer = dossier
        .profile
        .employer
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())?;
    let counterparty = tx.counterparty_id.as_deref()?;
    if !counterparty.to_lowercase().contains(&employer) {
        return None;
    }

    let memo = tx.memo.as_deref()?.to_lowercase();
    let keyword = config
        .payroll_keywords
        .iter()
        .find(|k| memo.contains(&k.to_lowercase()))?;

    let history = dossier
        .transactions
        .iter()
        .filter(|t| t.transaction_id != tx.transaction_id)
        .filter(|t| t.counterparty_id.as_deref() == Some(counterparty))
        .count();
    if history == 0 {
        return None;
    }

    Some(format!(
        "deposit {} from employer {} with '{}' memo; {} earlier payment(s) from the same payer",
        tx.transaction_id, counterparty, keyword, history
    ))
}

fn seasonal_spike(dossier: &EnrichedDossier, config: &CascadeConfig) -> Option<String> {
    let factor = dossier.deviation.volume_deviation_factor;
    if factor <= config.seasonal_deviation_threshold {
        return None;
    }

    let flagged_year = dossier.flagged.iter().map(|t| t.date.year()).max()?;
    let prior_year = flagged_year - 1;
    let months: BTreeSet<u32> = dossier.flagged.iter().map(|t| t.date.month()).collect();

    let (prior_count, prior_volume) = dossier
        .transactions
        .iter()
        .filter(|t| t.is_inbound())
        .filter(|t| t.date.year() == prior_year && months.contains(&t.date.month()))
        .fold((0usize, 0.0), |(n, sum), t| (n + 1, sum + t.amount));
    if prior_count <= config.seasonal_min_prior_count || prior_volume <= 0.0 {
        return None;
    }

    let current_volume: f64 = dossier
        .flagged
        .iter()
        .filter(|t| t.is_inbound())
        .map(|t| t.amount)
        .sum();
    let ratio = current_volume / prior_volume;

    (ratio <= config.seasonal_ratio).then(|| {
        format!(
            "flagged inflow {:.2} is {:.2}x the {} same-month inflow of {:.2} ({} transactions)",
            current_volume, ratio, prior_year, prior_volume, prior_count
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{BehavioralBaseline, DeviationAnalysis, RiskAssessment};
    use crate::types::alert::{Alert, AlertWindow};
    use crate::types::customer::{CustomerProfile, KycRiskRating};
    use crate::types::signals::RiskSignals;
    use crate::types::transaction::{Direction, Transaction};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dossier(
        flagged: Vec<Transaction>,
        history: Vec<Transaction>,
        factor: f64,
    ) -> EnrichedDossier {
        let window = AlertWindow::new(date(2025, 12, 1), date(2025, 12, 31));
        EnrichedDossier {
            alert: Alert {
                alert_id: "ALT-1".into(),
                customer_id: "CUST-1".into(),
                alert_type: None,
                window,
                base_risk_score: 50.0,
                flagged_transaction_ids: flagged.iter().map(|t| t.transaction_id.clone()).collect(),
            },
            profile: CustomerProfile::new("CUST-1", KycRiskRating::Low, date(2015, 1, 1))
                .with_employer("Acme Corp"),
            signals: RiskSignals::default(),
            transactions: history.into_iter().chain(flagged.iter().cloned()).collect(),
            window_transactions: flagged.clone(),
            flagged,
            unresolved_flagged: Vec::new(),
            quarantined: Vec::new(),
            duplicates_removed: 0,
            data_quality_score: 100.0,
            baseline: BehavioralBaseline::default(),
            baseline_notice: None,
            deviation: DeviationAnalysis {
                volume_deviation_factor: factor,
                ..Default::default()
            },
            risk: RiskAssessment::default(),
        }
    }

    fn salary(id: &str, d: NaiveDate) -> Transaction {
        Transaction::new(id, d, 6_500.0, Direction::Inbound)
            .with_counterparty("ACME CORP PAYROLL")
            .with_memo("ACME CORP SALARY DEC")
    }

    #[test]
    fn test_book_order_is_fixed() {
        let ids: Vec<RuleId> = RuleBook::standard().rules().iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::SanctionsHit,
                RuleId::PriorSarVolume,
                RuleId::PayrollDeposit,
                RuleId::SeasonalSpike
            ]
        );
    }

    #[test]
    fn test_payroll_deposit_matches() {
        let d = dossier(
            vec![salary("S3", date(2025, 12, 15))],
            vec![salary("S1", date(2025, 10, 15)), salary("S2", date(2025, 11, 15))],
            3.0,
        );
        let matched = RuleBook::standard().evaluate(&d, &CascadeConfig::default()).unwrap();

        assert_eq!(matched.rule, RuleId::PayrollDeposit);
        assert_eq!(matched.classification, Classification::FalsePositive);
    }

    #[test]
    fn test_payroll_requires_payment_history() {
        let d = dossier(vec![salary("S3", date(2025, 12, 15))], Vec::new(), 3.0);
        assert!(payroll_deposit(&d, &CascadeConfig::default()).is_none());
    }

    #[test]
    fn test_payroll_requires_keyword() {
        let gift = salary("S3", date(2025, 12, 15)).with_memo("holiday gift");
        let d = dossier(vec![gift], vec![salary("S1", date(2025, 10, 15))], 3.0);
        assert!(payroll_deposit(&d, &CascadeConfig::default()).is_none());
    }

    #[test]
    fn test_sanctions_outranks_payroll() {
        let mut d = dossier(
            vec![salary("S3", date(2025, 12, 15))],
            vec![salary("S1", date(2025, 10, 15))],
            0.5,
        );
        d.signals = RiskSignals::default().with_watchlist_hit();

        let matched = RuleBook::standard().evaluate(&d, &CascadeConfig::default()).unwrap();
        assert_eq!(matched.rule, RuleId::SanctionsHit);
        assert_eq!(matched.classification, Classification::TruePositive);
    }

    #[test]
    fn test_prior_sar_needs_deviation_above_threshold() {
        let mut d = dossier(vec![salary("S3", date(2025, 12, 15))], Vec::new(), 2.0);
        d.signals = RiskSignals::default().with_prior_sars(1, &["structuring"]);
        assert!(prior_sar_volume(&d, &CascadeConfig::default()).is_none());

        d.deviation.volume_deviation_factor = 2.01;
        assert!(prior_sar_volume(&d, &CascadeConfig::default()).is_some());
    }

    #[test]
    fn test_seasonal_spike_against_prior_year() {
        let deposit = |i: u32, y: i32, amount: f64| {
            Transaction::new(format!("{}-{}", y, i), date(y, 12, 1 + i), amount, Direction::Inbound)
        };
        let flagged: Vec<Transaction> = (0..25).map(|i| deposit(i, 2025, 4_400.0)).collect();
        let prior: Vec<Transaction> = (0..25).map(|i| deposit(i, 2024, 4_000.0)).collect();

        let d = dossier(flagged.clone(), prior, 6.0);
        let matched = RuleBook::standard().evaluate(&d, &CascadeConfig::default()).unwrap();
        assert_eq!(matched.rule, RuleId::SeasonalSpike);

        // prior year too thin: 20 transactions is not more than 20
        let thin: Vec<Transaction> = (0..20).map(|i| deposit(i, 2024, 5_000.0)).collect();
        let d = dossier(flagged, thin, 6.0);
        assert!(seasonal_spike(&d, &CascadeConfig::default()).is_none());
    }
}
