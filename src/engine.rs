//! Per-alert triage pipeline

use crate::config::TriageConfig;
use crate::enrichment::Enricher;
use crate::error::Result;
use crate::triage::{route, JudgmentOracle, TriageCascade, TypologyClassifier};
use crate::types::alert::CaseInput;
use crate::types::decision::{Classification, RoutingOutcome};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs validation, enrichment, cascade, typology and routing for one alert.
///
/// Holds only immutable configuration and the shared oracle handle, so one
/// engine can serve any number of alerts concurrently.
pub struct TriageEngine {
    enricher: Enricher,
    cascade: TriageCascade,
    typology: TypologyClassifier,
}

impl TriageEngine {
    /// Build the engine from the config.
    ///
    /// Without an oracle, borderline cases fall back to the configured
    /// oracle fallback policy.
    pub fn new(config: &TriageConfig, oracle: Option<Arc<dyn JudgmentOracle>>) -> Self {
        let cascade = TriageCascade::new(config.cascade.clone(), oracle);

        info!(
            oracle = cascade.oracle_name().unwrap_or("none"),
            oracle_timeout_ms = config.cascade.oracle_timeout_ms,
            fallback = ?config.cascade.oracle_fallback,
            "Triage engine initialized"
        );

        Self {
            enricher: Enricher::new(config),
            cascade,
            typology: TypologyClassifier::new(config.typology.clone()),
        }
    }

    /// Triage one alert end to end
    pub async fn process(&self, case: CaseInput) -> Result<RoutingOutcome> {
        let validated = case.validate()?;
        let dossier = self.enricher.enrich(validated);
        debug!(
            alert_id = %dossier.alert_id(),
            summary = %dossier.deviation.summary,
            "Alert enriched"
        );

        let decision = self.cascade.decide(&dossier).await?;
        let typology = match decision.classification {
            Classification::TruePositive => Some(self.typology.classify(&dossier)),
            Classification::FalsePositive | Classification::NeedsReview => None,
        };
        let outcome = route(decision, typology);

        if dossier.is_degraded() {
            warn!(
                alert_id = %outcome.alert_id,
                "Decision made on degraded input"
            );
        }
        info!(
            alert_id = %outcome.alert_id,
            classification = %outcome.decision.classification,
            rule = ?outcome.decision.matched_rule,
            composite = outcome.decision.composite_score,
            route = %outcome.path,
            "Alert triaged"
        );

        Ok(outcome)
    }

    /// Triage independent alerts with at most `concurrency` in flight.
    /// Results keep the input order.
    pub async fn process_batch(
        &self,
        cases: Vec<CaseInput>,
        concurrency: usize,
    ) -> Vec<Result<RoutingOutcome>> {
        stream::iter(cases)
            .map(|case| self.process(case))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use crate::scenarios;
    use crate::types::decision::RoutePath;

    #[tokio::test]
    async fn test_malformed_alert_is_not_classified() {
        let engine = TriageEngine::new(&TriageConfig::default(), None);
        let mut case = scenarios::payroll_deposit();
        case.alert.customer_id = None;

        let result = engine.process(case).await;
        assert!(matches!(
            result,
            Err(TriageError::MalformedAlert { field: "customer_id", .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let engine = TriageEngine::new(&TriageConfig::default(), None);
        let cases = vec![
            scenarios::payroll_deposit(),
            scenarios::structuring_layering(),
            scenarios::seasonal_spike(),
        ];

        let results = engine.process_batch(cases, 2).await;
        let paths: Vec<RoutePath> = results.into_iter().map(|r| r.unwrap().path).collect();

        assert_eq!(
            paths,
            vec![
                RoutePath::AutoClose,
                RoutePath::NarrativePipeline,
                RoutePath::AutoClose
            ]
        );
    }
}
