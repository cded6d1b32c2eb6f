//! Alert Triage Engine
//!
//! Deterministic enrichment and classification of transaction-monitoring
//! alerts: behavioral baselines, deviation analysis, cross-source risk,
//! a three-layer triage cascade, typology and routing.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod judgment_client;
pub mod metrics;
pub mod producer;
pub mod scenarios;
pub mod triage;
pub mod types;

pub use config::{AppConfig, TriageConfig};
pub use consumer::CaseConsumer;
pub use engine::TriageEngine;
pub use enrichment::{EnrichedDossier, Enricher};
pub use error::{Result, TriageError};
pub use judgment_client::NatsJudgmentOracle;
pub use producer::OutcomeProducer;
pub use triage::{JudgmentOracle, OracleJudgment, StaticOracle};
pub use types::alert::CaseInput;
pub use types::decision::{Classification, RoutingOutcome, TriageDecision};
