//! Typology classification for true-positive alerts

use crate::config::TypologyConfig;
use crate::enrichment::EnrichedDossier;
use crate::types::decision::{TypologyAssessment, TypologyCategory};
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Indicators observed for one category
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTally {
    pub category: TypologyCategory,
    pub indicators: Vec<String>,
    /// Indicators needed before the category qualifies
    pub threshold: usize,
}

impl IndicatorTally {
    pub fn qualifies(&self) -> bool {
        !self.indicators.is_empty() && self.indicators.len() >= self.threshold
    }
}

/// Pick the category from the tallies.
///
/// The qualifying category with the most indicators wins; ties go to the
/// earlier category in `TypologyCategory` order. With nothing qualifying the
/// result is general suspicious activity carrying every observed indicator.
pub fn select_category(tallies: &[IndicatorTally]) -> TypologyAssessment {
    let mut qualifying: Vec<&IndicatorTally> = tallies.iter().filter(|t| t.qualifies()).collect();
    qualifying.sort_by_key(|t| (Reverse(t.indicators.len()), t.category));

    match qualifying.split_first() {
        Some((winner, rest)) => {
            let mut secondary: Vec<TypologyCategory> = rest.iter().map(|t| t.category).collect();
            secondary.sort();
            TypologyAssessment {
                category: winner.category,
                indicator_count: winner.indicators.len(),
                matched_indicators: winner.indicators.clone(),
                secondary_categories: secondary,
            }
        }
        None => {
            let observed: Vec<String> = tallies
                .iter()
                .flat_map(|t| t.indicators.iter().cloned())
                .collect();
            TypologyAssessment {
                category: TypologyCategory::GeneralSuspiciousActivity,
                indicator_count: observed.len(),
                matched_indicators: observed,
                secondary_categories: Vec::new(),
            }
        }
    }
}

/// Counts pattern indicators on a dossier
pub struct TypologyClassifier {
    config: TypologyConfig,
}

impl TypologyClassifier {
    /// Create a classifier with the given category thresholds
    pub fn new(config: TypologyConfig) -> Self {
        Self { config }
    }

    /// Assign a primary typology and any secondary categories.
    ///
    /// Categories whose indicator count reaches their threshold qualify;
    /// the one with the most indicators becomes primary. With none
    /// qualifying the case is general suspicious activity.
    pub fn classify(&self, dossier: &EnrichedDossier) -> TypologyAssessment {
        let structuring = IndicatorTally {
            category: TypologyCategory::StructuringLayering,
            indicators: self.structuring_indicators(dossier),
            threshold: self.config.structuring_threshold,
        };
        let funnel = IndicatorTally {
            category: TypologyCategory::FunnelAccount,
            indicators: self.funnel_indicators(dossier),
            threshold: self.config.funnel_threshold,
        };

        let qualifying: Vec<TypologyCategory> = [&structuring, &funnel]
            .iter()
            .filter(|t| t.qualifies())
            .map(|t| t.category)
            .collect();
        let continuing = IndicatorTally {
            category: TypologyCategory::ContinuingActivity,
            indicators: continuing_indicators(dossier, &qualifying),
            threshold: self.config.continuing_threshold,
        };

        let assessment = select_category(&[structuring, funnel, continuing]);
        debug!(
            alert_id = %dossier.alert_id(),
            category = %assessment.category,
            indicators = assessment.indicator_count,
            "Typology assigned"
        );
        assessment
    }

    fn structuring_indicators(&self, dossier: &EnrichedDossier) -> Vec<String> {
        let cfg = &self.config;
        let mut found = Vec::new();

        if dossier.alert.type_contains("structuring") {
            found.push("alert type indicates structuring".to_string());
        }

        let floor = cfg.reporting_threshold * cfg.sub_threshold_floor;
        let sub_threshold = dossier
            .window_transactions
            .iter()
            .filter(|t| t.amount >= floor && t.amount < cfg.reporting_threshold)
            .count();
        if sub_threshold >= cfg.min_sub_threshold_count {
            found.push(format!(
                "{} transactions between {:.0} and {:.0}",
                sub_threshold, floor, cfg.reporting_threshold
            ));
        }

        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for tx in &dossier.window_transactions {
            *per_day.entry(tx.date).or_insert(0) += 1;
        }
        let busiest = per_day
            .iter()
            .max_by_key(|(date, count)| (**count, Reverse(**date)));
        if let Some((date, count)) = busiest {
            if *count >= cfg.rapid_daily_count {
                found.push(format!("{} transactions on {}", count, date));
            }
        }

        let new_counterparties = dossier.deviation.new_counterparties.len();
        if new_counterparties > 10 {
            found.push(format!("{} new counterparties", new_counterparties));
        }

        let factor = dossier.deviation.volume_deviation_factor;
        if factor > 3.0 {
            found.push(format!("volume {:.1}x baseline", factor));
        }

        let international_wires = dossier
            .flagged
            .iter()
            .filter(|t| t.type_contains("wire"))
            .filter(|t| {
                t.geography
                    .as_deref()
                    .map(|g| !g.eq_ignore_ascii_case(&cfg.home_country))
                    .unwrap_or(false)
            })
            .count();
        if international_wires > 0 {
            found.push(format!("{} international wire(s) flagged", international_wires));
        }

        found
    }

    fn funnel_indicators(&self, dossier: &EnrichedDossier) -> Vec<String> {
        let cfg = &self.config;
        let deviation = &dossier.deviation;
        let profile = &dossier.profile;
        let mut found = Vec::new();

        if dossier.alert.type_contains("funnel") {
            found.push("alert type indicates funnel account".to_string());
        }

        let age = profile.account_age_days(dossier.alert.window.end);
        if age < 180 {
            found.push(format!("account open {} days", age));
        }

        let student = profile
            .occupation
            .as_deref()
            .map(|o| o.to_lowercase().contains("student"))
            .unwrap_or(false);
        if student {
            found.push("student occupation".to_string());
        } else if profile.usable_income().is_none() {
            found.push("no declared income".to_string());
        }

        let cash_out = dossier
            .flagged
            .iter()
            .filter(|t| t.type_contains("cash") && t.type_contains("withdraw"))
            .count();
        if cash_out > 0 {
            found.push(format!("{} cash withdrawal(s) flagged", cash_out));
        }

        let new_counterparties = deviation.new_counterparties.len();
        if new_counterparties > 5 {
            found.push(format!("{} new counterparties", new_counterparties));
        }

        let inflow = deviation.window_inflow;
        let outflow = deviation.window_outflow;
        if inflow > 0.0 {
            let pass_through = outflow / inflow;
            if pass_through >= cfg.pass_through_ratio {
                found.push(format!("{:.0}% of inflow passed through", pass_through * 100.0));
            }
        }

        let depositors: BTreeSet<&str> = dossier
            .window_transactions
            .iter()
            .filter(|t| t.is_inbound())
            .filter_map(|t| t.counterparty_id.as_deref())
            .collect();
        if depositors.len() >= cfg.unique_depositor_count {
            found.push(format!("{} distinct depositors", depositors.len()));
        }

        if inflow > 0.0 {
            let retained = (inflow - outflow) / inflow;
            if retained <= cfg.retained_balance_ratio {
                found.push(format!("{:.0}% of inflow retained", retained.max(0.0) * 100.0));
            }
        }

        found
    }
}

fn continuing_indicators(
    dossier: &EnrichedDossier,
    qualifying: &[TypologyCategory],
) -> Vec<String> {
    let prior = dossier.signals.prior_sars();
    if prior == 0 {
        return Vec::new();
    }

    // Prior SARs alone are history, not continuing activity
    let recurring = dossier
        .signals
        .prior_sar_activity
        .iter()
        .find(|activity| {
            activity_category(activity)
                .map(|c| qualifying.contains(&c))
                .unwrap_or(false)
        });
    let Some(activity) = recurring else {
        return Vec::new();
    };

    let mut found = vec![
        format!("{} prior SAR(s) on file", prior),
        format!("prior {} activity recurs", activity),
    ];

    if prior >= 2 {
        found.push("multiple prior SARs".to_string());
    }

    found
}

fn activity_category(activity: &str) -> Option<TypologyCategory> {
    let activity = activity.to_lowercase();
    if activity.contains("structur") || activity.contains("layer") {
        Some(TypologyCategory::StructuringLayering)
    } else if activity.contains("funnel") || activity.contains("mule") {
        Some(TypologyCategory::FunnelAccount)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(category: TypologyCategory, count: usize, threshold: usize) -> IndicatorTally {
        IndicatorTally {
            category,
            indicators: (0..count).map(|i| format!("indicator {}", i)).collect(),
            threshold,
        }
    }

    #[test]
    fn test_highest_count_wins() {
        let assessment = select_category(&[
            tally(TypologyCategory::StructuringLayering, 2, 2),
            tally(TypologyCategory::FunnelAccount, 6, 3),
            tally(TypologyCategory::ContinuingActivity, 0, 2),
        ]);

        assert_eq!(assessment.category, TypologyCategory::FunnelAccount);
        assert_eq!(assessment.indicator_count, 6);
        assert_eq!(
            assessment.secondary_categories,
            vec![TypologyCategory::StructuringLayering]
        );
    }

    #[test]
    fn test_tie_goes_to_structuring() {
        let assessment = select_category(&[
            tally(TypologyCategory::StructuringLayering, 3, 2),
            tally(TypologyCategory::FunnelAccount, 3, 3),
            tally(TypologyCategory::ContinuingActivity, 3, 2),
        ]);

        assert_eq!(assessment.category, TypologyCategory::StructuringLayering);
        assert_eq!(assessment.secondary_categories.len(), 2);
    }

    #[test]
    fn test_below_threshold_is_general() {
        let assessment = select_category(&[
            tally(TypologyCategory::StructuringLayering, 1, 2),
            tally(TypologyCategory::FunnelAccount, 2, 3),
            tally(TypologyCategory::ContinuingActivity, 0, 2),
        ]);

        assert_eq!(assessment.category, TypologyCategory::GeneralSuspiciousActivity);
        assert_eq!(assessment.indicator_count, 3);
        assert!(assessment.secondary_categories.is_empty());
    }

    #[test]
    fn test_empty_tallies_still_yield_a_category() {
        let assessment = select_category(&[]);
        assert_eq!(assessment.category, TypologyCategory::GeneralSuspiciousActivity);
        assert_eq!(assessment.indicator_count, 0);
    }

    #[test]
    fn test_activity_mapping() {
        assert_eq!(
            activity_category("Structuring"),
            Some(TypologyCategory::StructuringLayering)
        );
        assert_eq!(activity_category("money mule"), Some(TypologyCategory::FunnelAccount));
        assert_eq!(activity_category("elder abuse"), None);
    }
}
