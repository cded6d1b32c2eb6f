//! Configuration management for the triage service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// What the cascade does when the judgment oracle was needed but failed
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OracleFallback {
    /// Classify as NEEDS_REVIEW and record the failure
    #[default]
    NeedsReview,
    /// Keep the composite-score result and record the failure
    ScoreOnly,
    /// Return the oracle error to the caller, leaving the alert unclassified
    Propagate,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub triage: TriageConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming case inputs
    pub case_subject: String,
    /// Subject for alerts routed to auto-close
    pub auto_close_subject: String,
    /// Subject for alerts routed to the human review queue
    pub review_subject: String,
    /// Subject for alerts routed to narrative generation
    pub narrative_subject: String,
    /// Subject for cases that could not be classified
    pub rejected_subject: String,
}

/// Remote judgment oracle (request/reply over NATS)
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    pub enabled: bool,
    pub subject: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            subject: "triage.oracle.borderline".to_string(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of cases processed concurrently
    pub workers: usize,
    /// Per-case processing timeout in milliseconds
    pub timeout_ms: u64,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Immutable tuning for the triage core. Passed into the engine once and
/// shared read-only across alerts.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    pub baseline: BaselineConfig,
    pub deviation: DeviationConfig,
    pub risk: RiskPointTable,
    pub cascade: CascadeConfig,
    pub typology: TypologyConfig,
}

/// Baseline builder settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BaselineConfig {
    /// A counterparty / geography / channel is "usual" when it appears in
    /// more than this fraction of pre-window transactions
    pub min_usual_fraction: f64,
    /// Calendar months of pre-window history required
    pub min_history_months: u32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            min_usual_fraction: 0.10,
            min_history_months: 1,
        }
    }
}

/// Deviation analyzer settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviationConfig {
    /// Window daily rate must exceed baseline daily rate by this multiple
    pub velocity_multiplier: f64,
    /// Window transaction count must also exceed this
    pub velocity_min_count: usize,
    /// Deviation factor reported when the baseline volume is zero
    pub zero_baseline_sentinel: f64,
    /// Window inflow / declared annual income above this is a mismatch
    pub income_mismatch_ratio: f64,
    /// Window inflow above this is a mismatch when no income is declared
    pub undeclared_income_inflow_limit: f64,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            velocity_multiplier: 3.0,
            velocity_min_count: 5,
            zero_baseline_sentinel: 999.0,
            income_mismatch_ratio: 1.0,
            undeclared_income_inflow_limit: 100_000.0,
        }
    }
}

/// Per-factor maxima for the risk aggregator
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskPointTable {
    pub sanctions: f64,
    pub prior_sars: f64,
    pub pep: f64,
    pub law_enforcement: f64,
    pub adverse_media: f64,
    pub internal_referrals: f64,
    pub high_risk_kyc: f64,
    pub investigator_notes: f64,
    pub credit_deterioration: f64,
    pub high_utilization: f64,
    /// Utilization above this ratio counts as high
    pub utilization_threshold: f64,
    /// Share of the 0-100 alert base risk added to the score
    pub alert_base_share: f64,
    /// Upper bound of the aggregated score
    pub cap: f64,
}

impl Default for RiskPointTable {
    fn default() -> Self {
        Self {
            sanctions: 40.0,
            prior_sars: 20.0,
            pep: 15.0,
            law_enforcement: 15.0,
            adverse_media: 10.0,
            internal_referrals: 10.0,
            high_risk_kyc: 8.0,
            investigator_notes: 5.0,
            credit_deterioration: 5.0,
            high_utilization: 3.0,
            utilization_threshold: 0.80,
            alert_base_share: 0.15,
            cap: 100.0,
        }
    }
}

/// Composite score weights
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompositeWeights {
    pub behavioral: f64,
    pub risk: f64,
    pub alert_base: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            behavioral: 0.4,
            risk: 0.2,
            alert_base: 0.4,
        }
    }
}

/// Triage cascade settings: rule parameters, score thresholds, oracle
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CascadeConfig {
    pub weights: CompositeWeights,
    /// Composite at or below this is FALSE_POSITIVE
    pub false_positive_ceiling: f64,
    /// Composite at or above this is TRUE_POSITIVE
    pub true_positive_floor: f64,
    /// Behavioral score band (inclusive) that invokes the oracle
    pub borderline_low: f64,
    pub borderline_high: f64,
    /// HIST-001: deviation factor above this with a prior SAR
    pub prior_sar_deviation_threshold: f64,
    /// SEAS-001: deviation factor above this counts as a spike
    pub seasonal_deviation_threshold: f64,
    /// SEAS-001: current / prior-year volume at or below this is seasonal
    pub seasonal_ratio: f64,
    /// SEAS-001: prior-year same-month inbound count must exceed this
    pub seasonal_min_prior_count: usize,
    /// SAL-001: memo keywords marking payroll
    pub payroll_keywords: Vec<String>,
    /// New geographies in this set score the full geography weight
    pub high_risk_geographies: BTreeSet<String>,
    /// Timeout applied to the judgment oracle call
    pub oracle_timeout_ms: u64,
    pub oracle_fallback: OracleFallback,
}

impl CascadeConfig {
    /// Oracle deadline as a `Duration`
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            weights: CompositeWeights::default(),
            false_positive_ceiling: 30.0,
            true_positive_floor: 60.0,
            borderline_low: 30.0,
            borderline_high: 60.0,
            prior_sar_deviation_threshold: 2.0,
            seasonal_deviation_threshold: 2.0,
            seasonal_ratio: 1.5,
            seasonal_min_prior_count: 20,
            payroll_keywords: ["salary", "bonus", "payroll", "compensation"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            high_risk_geographies: ["AE", "KY", "PA", "BZ", "VG", "BS", "LR"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
            oracle_timeout_ms: 5_000,
            oracle_fallback: OracleFallback::NeedsReview,
        }
    }
}

/// Typology indicator settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypologyConfig {
    /// Currency transaction reporting threshold
    pub reporting_threshold: f64,
    /// Amounts in [floor * threshold, threshold) are sub-threshold
    pub sub_threshold_floor: f64,
    pub min_sub_threshold_count: usize,
    /// Transactions on a single day that count as rapid sequential activity
    pub rapid_daily_count: usize,
    /// Wires to any other country are international
    pub home_country: String,
    /// Outflow / inflow at or above this is pass-through
    pub pass_through_ratio: f64,
    /// Distinct inbound counterparties that count as many depositors
    pub unique_depositor_count: usize,
    /// Retained share of inflow at or below this is minimal
    pub retained_balance_ratio: f64,
    pub structuring_threshold: usize,
    pub funnel_threshold: usize,
    pub continuing_threshold: usize,
}

impl Default for TypologyConfig {
    fn default() -> Self {
        Self {
            reporting_threshold: 10_000.0,
            sub_threshold_floor: 0.8,
            min_sub_threshold_count: 3,
            rapid_daily_count: 5,
            home_country: "US".to_string(),
            pass_through_ratio: 0.8,
            unique_depositor_count: 10,
            retained_balance_ratio: 0.1,
            structuring_threshold: 2,
            funnel_threshold: 3,
            continuing_threshold: 2,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, overlaid by `TRIAGE__*`
    /// environment variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("TRIAGE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                case_subject: "triage.cases".to_string(),
                auto_close_subject: "triage.route.auto_close".to_string(),
                review_subject: "triage.route.review".to_string(),
                narrative_subject: "triage.route.narrative".to_string(),
                rejected_subject: "triage.rejected".to_string(),
            },
            oracle: OracleConfig::default(),
            triage: TriageConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                timeout_ms: 10_000,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
