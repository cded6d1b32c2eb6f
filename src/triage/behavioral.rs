//! Layer 2: behavioral anomaly score

use crate::enrichment::EnrichedDossier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const MAX_SCORE: f64 = 100.0;

/// Sub-scores of the behavioral anomaly score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralScore {
    /// 0 - 30
    pub volume: f64,
    /// 0 - 20
    pub new_counterparties: f64,
    /// 0 - 15
    pub velocity: f64,
    /// 0 - 15
    pub income: f64,
    /// 0 - 10
    pub geography: f64,
    /// 0 - 10
    pub account_age: f64,
    pub total: f64,
}

impl BehavioralScore {
    /// One-line breakdown for the decision rationale
    pub fn describe(&self) -> String {
        format!(
            "{:.0} (volume {:.0}, counterparties {:.0}, velocity {:.0}, income {:.0}, \
             geography {:.0}, account age {:.0})",
            self.total,
            self.volume,
            self.new_counterparties,
            self.velocity,
            self.income,
            self.geography,
            self.account_age
        )
    }
}

/// Scores the dossier's deviation metrics on fixed tiers
pub struct BehavioralScorer {
    /// Upper-cased country codes
    high_risk_geographies: BTreeSet<String>,
}

impl BehavioralScorer {
    /// Create a scorer; country codes are matched case-insensitively
    pub fn new(high_risk_geographies: BTreeSet<String>) -> Self {
        Self {
            high_risk_geographies: high_risk_geographies
                .iter()
                .map(|g| g.trim().to_uppercase())
                .collect(),
        }
    }

    /// Score the dossier, capped at 100
    pub fn score(&self, dossier: &EnrichedDossier) -> BehavioralScore {
        let deviation = &dossier.deviation;

        let volume = volume_points(deviation.volume_deviation_factor);
        let new_counterparties = if deviation.has_new_counterparties() {
            counterparty_points(deviation.new_counterparties.len())
        } else {
            0.0
        };
        let velocity = if deviation.velocity_spike { 15.0 } else { 0.0 };
        let income = if deviation.income_mismatch {
            income_points(deviation.income_ratio)
        } else {
            0.0
        };
        let geography = if deviation.has_new_geographies() {
            self.geography_points(&deviation.new_geographies)
        } else {
            0.0
        };
        let account_age =
            account_age_points(dossier.profile.account_age_days(dossier.alert.window.end));

        let total = (volume + new_counterparties + velocity + income + geography + account_age)
            .min(MAX_SCORE);

        BehavioralScore {
            volume,
            new_counterparties,
            velocity,
            income,
            geography,
            account_age,
            total,
        }
    }

    fn geography_points<'a, I>(&self, new_geographies: I) -> f64
    where
        I: IntoIterator<Item = &'a String>,
    {
        let high_risk = new_geographies
            .into_iter()
            .any(|g| self.high_risk_geographies.contains(&g.trim().to_uppercase()));
        if high_risk {
            10.0
        } else {
            5.0
        }
    }
}

fn volume_points(factor: f64) -> f64 {
    match factor {
        f if f > 8.0 => 30.0,
        f if f > 5.0 => 25.0,
        f if f > 3.0 => 20.0,
        f if f > 2.0 => 15.0,
        f if f > 1.5 => 8.0,
        _ => 0.0,
    }
}

fn counterparty_points(new_counterparties: usize) -> f64 {
    match new_counterparties {
        n if n > 20 => 20.0,
        n if n > 10 => 15.0,
        n if n > 5 => 10.0,
        n if n > 2 => 5.0,
        _ => 2.0,
    }
}

/// Points for a flagged income mismatch. No ratio means no usable declared
/// income, which scores the maximum.
fn income_points(income_ratio: Option<f64>) -> f64 {
    match income_ratio {
        Some(ratio) if ratio > 5.0 => 15.0,
        Some(ratio) if ratio > 2.0 => 10.0,
        Some(_) => 5.0,
        None => 15.0,
    }
}

fn account_age_points(age_days: i64) -> f64 {
    match age_days {
        d if d < 90 => 10.0,
        d if d < 180 => 7.0,
        d if d < 365 => 3.0,
        _ => 0.0,
    }
}
