//! Deviation of the alert window from the behavioral baseline

use crate::config::DeviationConfig;
use crate::enrichment::baseline::{BehavioralBaseline, DAYS_PER_MONTH};
use crate::types::alert::AlertWindow;
use crate::types::customer::CustomerProfile;
use crate::types::transaction::{Direction, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Window metrics compared against the baseline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviationAnalysis {
    pub window_days: i64,
    pub window_txn_count: usize,
    pub window_inflow: f64,
    pub window_outflow: f64,
    /// Baseline volume scaled to the window length
    pub expected_volume: f64,
    /// Window volume / expected volume, or the sentinel for a zero baseline
    pub volume_deviation_factor: f64,
    pub window_daily_rate: f64,
    pub baseline_daily_rate: f64,
    pub velocity_spike: bool,
    pub new_counterparties: BTreeSet<String>,
    pub new_geographies: BTreeSet<String>,
    pub new_channels: BTreeSet<String>,
    /// Window inflow / declared annual income
    pub income_ratio: Option<f64>,
    pub income_mismatch: bool,
    pub summary: String,
}

impl DeviationAnalysis {
    pub fn window_volume(&self) -> f64 {
        self.window_inflow + self.window_outflow
    }

    pub fn has_new_counterparties(&self) -> bool {
        !self.new_counterparties.is_empty()
    }

    pub fn has_new_geographies(&self) -> bool {
        !self.new_geographies.is_empty()
    }
}

/// Compares alert-window transactions with the baseline
pub struct DeviationAnalyzer {
    config: DeviationConfig,
}

impl DeviationAnalyzer {
    /// Create an analyzer with the given velocity and income thresholds
    pub fn new(config: DeviationConfig) -> Self {
        Self { config }
    }

    /// Analyze the window transactions. Callers pass only transactions
    /// dated inside `window`.
    pub fn analyze(
        &self,
        baseline: &BehavioralBaseline,
        window_transactions: &[Transaction],
        window: &AlertWindow,
        profile: &CustomerProfile,
    ) -> DeviationAnalysis {
        let window_days = window.days().max(1);
        let days = window_days as f64;

        let (window_inflow, window_outflow) =
            window_transactions
                .iter()
                .fold((0.0, 0.0), |(inflow, outflow), tx| match tx.direction {
                    Direction::Inbound => (inflow + tx.amount, outflow),
                    Direction::Outbound => (inflow, outflow + tx.amount),
                });
        let window_total = window_inflow + window_outflow;

        let expected_volume = baseline.avg_monthly_volume() * days / DAYS_PER_MONTH;
        let volume_deviation_factor = if expected_volume > 0.0 {
            window_total / expected_volume
        } else if window_total > 0.0 {
            self.config.zero_baseline_sentinel
        } else {
            0.0
        };

        let window_txn_count = window_transactions.len();
        let window_daily_rate = window_txn_count as f64 / days;
        let baseline_daily_rate = baseline.daily_txn_rate();
        let velocity_spike = window_daily_rate
            > baseline_daily_rate * self.config.velocity_multiplier
            && window_txn_count > self.config.velocity_min_count;

        let unseen = |usual: &BTreeSet<String>, field: fn(&Transaction) -> Option<&str>| {
            window_transactions
                .iter()
                .filter_map(field)
                .filter(|value| !usual.contains(*value))
                .map(str::to_string)
                .collect::<BTreeSet<String>>()
        };
        let new_counterparties = unseen(&baseline.usual_counterparties, |t| {
            t.counterparty_id.as_deref()
        });
        let new_geographies = unseen(&baseline.usual_geographies, |t| t.geography.as_deref());
        let new_channels = unseen(&baseline.usual_channels, |t| t.channel.as_deref());

        let income_ratio = profile.usable_income().map(|income| window_inflow / income);
        let income_mismatch = match income_ratio {
            Some(ratio) => ratio > self.config.income_mismatch_ratio,
            None => window_inflow > self.config.undeclared_income_inflow_limit,
        };

        let mut analysis = DeviationAnalysis {
            window_days,
            window_txn_count,
            window_inflow,
            window_outflow,
            expected_volume,
            volume_deviation_factor,
            window_daily_rate,
            baseline_daily_rate,
            velocity_spike,
            new_counterparties,
            new_geographies,
            new_channels,
            income_ratio,
            income_mismatch,
            summary: String::new(),
        };
        analysis.summary = summarize(&analysis);

        debug!(
            deviation_factor = analysis.volume_deviation_factor,
            velocity_spike = analysis.velocity_spike,
            new_counterparties = analysis.new_counterparties.len(),
            income_mismatch = analysis.income_mismatch,
            "Deviation analysis complete"
        );

        analysis
    }
}

fn summarize(analysis: &DeviationAnalysis) -> String {
    let mut parts = vec![format!(
        "window volume {:.2} over {} day(s) is {:.2}x the baseline expectation of {:.2}",
        analysis.window_volume(),
        analysis.window_days,
        analysis.volume_deviation_factor,
        analysis.expected_volume
    )];
    parts.push(format!(
        "{} transaction(s), {:.2}/day against a baseline of {:.2}/day{}",
        analysis.window_txn_count,
        analysis.window_daily_rate,
        analysis.baseline_daily_rate,
        if analysis.velocity_spike {
            " (velocity spike)"
        } else {
            ""
        }
    ));
    if analysis.has_new_counterparties() {
        parts.push(format!(
            "{} new counterparties",
            analysis.new_counterparties.len()
        ));
    }
    if analysis.has_new_geographies() {
        let geos: Vec<&str> = analysis.new_geographies.iter().map(String::as_str).collect();
        parts.push(format!("new geographies {}", geos.join(", ")));
    }
    match (analysis.income_ratio, analysis.income_mismatch) {
        (Some(ratio), true) => parts.push(format!("inflow is {:.2}x declared income", ratio)),
        (None, true) => parts.push("inflow exceeds the limit for undeclared income".to_string()),
        _ => {}
    }
    parts.join("; ")
}
