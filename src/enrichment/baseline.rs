//! Behavioral baseline from pre-window transaction history

use crate::config::BaselineConfig;
use crate::error::{Result, TriageError};
use crate::types::alert::AlertWindow;
use crate::types::customer::CustomerProfile;
use crate::types::transaction::{Direction, Transaction};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Day count used to convert monthly figures into daily / window figures
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Date range the baseline was computed from; always before the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselinePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A customer's normal behavior ahead of the alert window.
/// Derived once per alert, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralBaseline {
    pub avg_monthly_inflow: f64,
    pub avg_monthly_outflow: f64,
    pub avg_monthly_txn_count: f64,
    pub usual_counterparties: BTreeSet<String>,
    pub usual_geographies: BTreeSet<String>,
    pub usual_channels: BTreeSet<String>,
    pub period: Option<BaselinePeriod>,
    pub months_observed: usize,
    pub max_single_transaction: f64,
    /// Built from defaults because the history was insufficient
    pub degraded: bool,
}

impl BehavioralBaseline {
    /// Fallback used when there is not enough pre-window history: zero
    /// volumes, usual sets seeded from the KYC profile.
    pub fn degraded(profile: &CustomerProfile) -> Self {
        Self {
            usual_counterparties: profile.historical_counterparties.clone(),
            usual_geographies: profile.historical_geographies.clone(),
            degraded: true,
            ..Default::default()
        }
    }

    pub fn avg_monthly_volume(&self) -> f64 {
        self.avg_monthly_inflow + self.avg_monthly_outflow
    }

    pub fn daily_txn_rate(&self) -> f64 {
        self.avg_monthly_txn_count / DAYS_PER_MONTH
    }
}

#[derive(Default)]
struct MonthTotals {
    inflow: f64,
    outflow: f64,
    count: usize,
}

/// Builds the behavioral baseline
pub struct BaselineBuilder {
    config: BaselineConfig,
}

impl BaselineBuilder {
    /// Create a builder with the given usual-fraction and history floor
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    /// Compute the baseline from transactions strictly before the window.
    ///
    /// Fails with `InsufficientHistory` when the pre-window history covers
    /// less than the configured number of calendar months. The caller is
    /// expected to continue with [`BehavioralBaseline::degraded`].
    pub fn build(
        &self,
        customer_id: &str,
        transactions: &[Transaction],
        window: &AlertWindow,
    ) -> Result<BehavioralBaseline> {
        let pre_window: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.date < window.start)
            .collect();

        let (Some(earliest), Some(latest)) = (
            pre_window.iter().map(|t| t.date).min(),
            pre_window.iter().map(|t| t.date).max(),
        ) else {
            return Err(TriageError::InsufficientHistory {
                customer_id: customer_id.to_string(),
                observed_days: 0,
            });
        };

        let covered = earliest
            .checked_add_months(Months::new(self.config.min_history_months))
            .map(|required| required <= window.start)
            .unwrap_or(false);
        if !covered {
            return Err(TriageError::InsufficientHistory {
                customer_id: customer_id.to_string(),
                observed_days: (window.start - earliest).num_days(),
            });
        }

        let mut months: BTreeMap<(i32, u32), MonthTotals> = BTreeMap::new();
        let mut counterparties: HashMap<&str, usize> = HashMap::new();
        let mut geographies: HashMap<&str, usize> = HashMap::new();
        let mut channels: HashMap<&str, usize> = HashMap::new();
        let mut max_single_transaction: f64 = 0.0;

        for tx in &pre_window {
            let month = months.entry((tx.date.year(), tx.date.month())).or_default();
            match tx.direction {
                Direction::Inbound => month.inflow += tx.amount,
                Direction::Outbound => month.outflow += tx.amount,
            }
            month.count += 1;
            max_single_transaction = max_single_transaction.max(tx.amount);

            if let Some(cp) = tx.counterparty_id.as_deref() {
                *counterparties.entry(cp).or_insert(0) += 1;
            }
            if let Some(geo) = tx.geography.as_deref() {
                *geographies.entry(geo).or_insert(0) += 1;
            }
            if let Some(channel) = tx.channel.as_deref() {
                *channels.entry(channel).or_insert(0) += 1;
            }
        }

        let month_count = months.len() as f64;
        let total = pre_window.len() as f64;
        let usual = |counts: HashMap<&str, usize>| -> BTreeSet<String> {
            counts
                .into_iter()
                .filter(|(_, n)| *n as f64 / total > self.config.min_usual_fraction)
                .map(|(key, _)| key.to_string())
                .collect()
        };

        let baseline = BehavioralBaseline {
            avg_monthly_inflow: months.values().map(|m| m.inflow).sum::<f64>() / month_count,
            avg_monthly_outflow: months.values().map(|m| m.outflow).sum::<f64>() / month_count,
            avg_monthly_txn_count: months.values().map(|m| m.count).sum::<usize>() as f64
                / month_count,
            usual_counterparties: usual(counterparties),
            usual_geographies: usual(geographies),
            usual_channels: usual(channels),
            period: Some(BaselinePeriod {
                start: earliest,
                end: latest,
            }),
            months_observed: months.len(),
            max_single_transaction,
            degraded: false,
        };

        debug!(
            customer_id = %customer_id,
            months = baseline.months_observed,
            avg_inflow = baseline.avg_monthly_inflow,
            avg_outflow = baseline.avg_monthly_outflow,
            "Behavioral baseline computed"
        );

        Ok(baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::customer::KycRiskRating;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn inbound(id: &str, d: NaiveDate, amount: f64, cp: &str) -> Transaction {
        Transaction::new(id, d, amount, Direction::Inbound)
            .with_counterparty(cp)
            .with_geography("US")
            .with_channel("online")
    }

    fn builder() -> BaselineBuilder {
        BaselineBuilder::new(BaselineConfig::default())
    }

    #[test]
    fn test_monthly_averages_and_window_exclusion() {
        let window = AlertWindow::new(date(2026, 1, 3), date(2026, 1, 9));
        let txns = vec![
            inbound("a", date(2025, 11, 5), 1_000.0, "Acme"),
            inbound("b", date(2025, 11, 20), 3_000.0, "Acme"),
            Transaction::new("c", date(2025, 12, 10), 500.0, Direction::Outbound)
                .with_counterparty("Landlord"),
            inbound("d", date(2025, 12, 15), 2_000.0, "Acme"),
            // inside and after the window: ignored
            inbound("e", date(2026, 1, 4), 90_000.0, "Stranger"),
            inbound("f", date(2026, 2, 1), 90_000.0, "Stranger"),
        ];

        let baseline = builder().build("CUST-1", &txns, &window).unwrap();

        assert_eq!(baseline.months_observed, 2);
        assert_eq!(baseline.avg_monthly_inflow, 3_000.0);
        assert_eq!(baseline.avg_monthly_outflow, 250.0);
        assert_eq!(baseline.avg_monthly_txn_count, 2.0);
        assert_eq!(baseline.max_single_transaction, 3_000.0);
        assert!(baseline.usual_counterparties.contains("Acme"));
        assert!(!baseline.usual_counterparties.contains("Stranger"));
        assert_eq!(
            baseline.period,
            Some(BaselinePeriod {
                start: date(2025, 11, 5),
                end: date(2025, 12, 15)
            })
        );
        assert!(!baseline.degraded);
    }

    #[test]
    fn test_rare_counterparty_is_not_usual() {
        let window = AlertWindow::new(date(2026, 1, 1), date(2026, 1, 31));
        let mut txns: Vec<Transaction> = (0..19)
            .map(|i| inbound(&format!("t{}", i), date(2025, 10, 1 + i), 100.0, "Regular"))
            .collect();
        // 1 of 20 = 5%, below the 10% cut
        txns.push(inbound("rare", date(2025, 11, 2), 100.0, "Once"));

        let baseline = builder().build("CUST-1", &txns, &window).unwrap();

        assert!(baseline.usual_counterparties.contains("Regular"));
        assert!(!baseline.usual_counterparties.contains("Once"));
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let window = AlertWindow::new(date(2026, 1, 10), date(2026, 1, 20));
        let txns = vec![inbound("a", date(2025, 12, 20), 100.0, "Acme")];

        match builder().build("CUST-1", &txns, &window) {
            Err(TriageError::InsufficientHistory { observed_days, .. }) => {
                assert_eq!(observed_days, 21)
            }
            other => panic!("expected InsufficientHistory, got {:?}", other),
        }
    }

    #[test]
    fn test_no_pre_window_history_is_insufficient() {
        let window = AlertWindow::new(date(2026, 1, 10), date(2026, 1, 20));
        let txns = vec![inbound("a", date(2026, 1, 12), 100.0, "Acme")];

        assert!(matches!(
            builder().build("CUST-1", &txns, &window),
            Err(TriageError::InsufficientHistory { observed_days: 0, .. })
        ));
    }

    #[test]
    fn test_degraded_baseline_uses_profile_history() {
        let profile = CustomerProfile::new("CUST-1", KycRiskRating::Low, date(2025, 12, 1))
            .with_historical_counterparty("Acme")
            .with_historical_geography("US");

        let baseline = BehavioralBaseline::degraded(&profile);

        assert!(baseline.degraded);
        assert_eq!(baseline.avg_monthly_volume(), 0.0);
        assert!(baseline.usual_counterparties.contains("Acme"));
        assert!(baseline.usual_geographies.contains("US"));
        assert!(baseline.period.is_none());
    }
}
