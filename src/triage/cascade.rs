//! Triage cascade: rules, behavioral score, borderline judgment
//!
//! Layer 1 rules short-circuit everything else. Without a rule match the
//! composite score decides, and the judgment oracle is consulted when the
//! behavioral score lands in the borderline band. Its verdict only replaces
//! the score result while the composite is strictly inside that band.

use crate::config::{CascadeConfig, CompositeWeights, OracleFallback};
use crate::enrichment::{EnrichedDossier, RiskAssessment};
use crate::error::{Result, TriageError};
use crate::triage::behavioral::{BehavioralScore, BehavioralScorer};
use crate::triage::oracle::{JudgmentOracle, OracleJudgment};
use crate::triage::rules::{RuleBook, RuleMatch};
use crate::types::decision::{
    Classification, DecisionBasis, DecisionFactor, OracleStatus, TriageDecision,
};
use std::sync::Arc;
use tracing::{debug, warn};

const RULE_TRUE_POSITIVE_CONFIDENCE: f64 = 0.95;
const RULE_FALSE_POSITIVE_CONFIDENCE: f64 = 0.90;
const REVIEW_CONFIDENCE: f64 = 0.4;
const ORACLE_DEFAULT_CONFIDENCE: f64 = 0.5;

/// Weighted blend of the three scores
pub fn composite_score(
    weights: &CompositeWeights,
    behavioral: f64,
    risk: f64,
    alert_base: f64,
) -> f64 {
    weights.behavioral * behavioral + weights.risk * risk + weights.alert_base * alert_base
}

/// Score-only classification of a composite value
pub fn classify_composite(composite: f64, config: &CascadeConfig) -> Classification {
    if composite <= config.false_positive_ceiling {
        Classification::FalsePositive
    } else if composite >= config.true_positive_floor {
        Classification::TruePositive
    } else {
        Classification::NeedsReview
    }
}

/// Confidence of a score-only classification
pub fn composite_confidence(
    classification: Classification,
    composite: f64,
    config: &CascadeConfig,
) -> f64 {
    match classification {
        Classification::TruePositive => {
            (0.5 + (composite - config.true_positive_floor) * 0.01).min(0.95)
        }
        Classification::FalsePositive => {
            (0.5 + (config.false_positive_ceiling - composite) * 0.015).min(0.90)
        }
        Classification::NeedsReview => REVIEW_CONFIDENCE,
    }
}

fn rule_confidence(classification: Classification) -> f64 {
    match classification {
        Classification::TruePositive => RULE_TRUE_POSITIVE_CONFIDENCE,
        Classification::FalsePositive => RULE_FALSE_POSITIVE_CONFIDENCE,
        Classification::NeedsReview => REVIEW_CONFIDENCE,
    }
}

/// Scores shared by every path through the cascade
struct Scores {
    behavioral: BehavioralScore,
    risk: f64,
    composite: f64,
}

/// Outcome of the score / oracle layers
struct Verdict {
    classification: Classification,
    basis: DecisionBasis,
    confidence: f64,
    oracle: OracleStatus,
}

/// Three-layer classification of an enriched dossier
pub struct TriageCascade {
    config: CascadeConfig,
    rules: RuleBook,
    scorer: BehavioralScorer,
    oracle: Option<Arc<dyn JudgmentOracle>>,
}

impl TriageCascade {
    /// Create a cascade with the standard rule book
    pub fn new(config: CascadeConfig, oracle: Option<Arc<dyn JudgmentOracle>>) -> Self {
        Self {
            scorer: BehavioralScorer::new(config.high_risk_geographies.clone()),
            rules: RuleBook::standard(),
            config,
            oracle,
        }
    }

    /// Name of the configured oracle, if one is set
    pub fn oracle_name(&self) -> Option<&str> {
        self.oracle.as_deref().map(|o| o.name())
    }

    /// Classify the dossier.
    ///
    /// Fails only when the oracle was needed, failed, and the fallback
    /// policy is `propagate`.
    pub async fn decide(&self, dossier: &EnrichedDossier) -> Result<TriageDecision> {
        let behavioral = self.scorer.score(dossier);
        let risk = dossier.risk.score;
        let composite = composite_score(
            &self.config.weights,
            behavioral.total,
            risk,
            dossier.alert.base_risk_score,
        );
        let scores = Scores {
            behavioral,
            risk,
            composite,
        };

        debug!(
            alert_id = %dossier.alert_id(),
            behavioral = behavioral.total,
            risk = risk,
            composite = composite,
            "Cascade scores computed"
        );

        let mut rationale = dossier.data_quality_notes();

        if let Some(matched) = self.rules.evaluate(dossier, &self.config) {
            debug!(alert_id = %dossier.alert_id(), rule = %matched.rule, "Triage rule matched");
            rationale.push(rule_factor(&matched));
            self.push_score_factors(&mut rationale, &scores, &dossier.risk);

            let verdict = Verdict {
                classification: matched.classification,
                basis: DecisionBasis::Rule,
                confidence: rule_confidence(matched.classification),
                oracle: OracleStatus::NotInvoked,
            };
            return Ok(self.finish(dossier, &scores, Some(matched), verdict, rationale));
        }

        self.push_score_factors(&mut rationale, &scores, &dossier.risk);

        let score_only = classify_composite(composite, &self.config);
        let verdict = if self.is_borderline(behavioral.total) {
            self.consult_oracle(dossier, composite, score_only, &mut rationale)
                .await?
        } else {
            Verdict {
                classification: score_only,
                basis: DecisionBasis::CompositeScore,
                confidence: composite_confidence(score_only, composite, &self.config),
                oracle: OracleStatus::NotInvoked,
            }
        };

        Ok(self.finish(dossier, &scores, None, verdict, rationale))
    }

    fn is_borderline(&self, behavioral: f64) -> bool {
        behavioral >= self.config.borderline_low && behavioral <= self.config.borderline_high
    }

    fn inside_band(&self, composite: f64) -> bool {
        composite > self.config.borderline_low && composite < self.config.borderline_high
    }

    async fn consult_oracle(
        &self,
        dossier: &EnrichedDossier,
        composite: f64,
        score_only: Classification,
        rationale: &mut Vec<DecisionFactor>,
    ) -> Result<Verdict> {
        let applies = self.inside_band(composite);
        let score_verdict = |oracle: OracleStatus| Verdict {
            classification: score_only,
            basis: DecisionBasis::CompositeScore,
            confidence: composite_confidence(score_only, composite, &self.config),
            oracle,
        };

        match self.call_oracle(dossier).await {
            Ok(judgment) => {
                rationale.push(DecisionFactor::new(
                    "oracle_judgment",
                    format!(
                        "{}: {}{}",
                        judgment.classification,
                        judgment.rationale,
                        if applies {
                            ""
                        } else {
                            " (not applied, composite outside the borderline band)"
                        }
                    ),
                ));
                let status = OracleStatus::Judged {
                    classification: judgment.classification,
                    rationale: judgment.rationale.clone(),
                    applied: applies,
                };
                if !applies {
                    return Ok(score_verdict(status));
                }
                Ok(Verdict {
                    classification: judgment.classification,
                    basis: DecisionBasis::Oracle,
                    confidence: judgment
                        .confidence
                        .filter(|c| c.is_finite())
                        .map(|c| c.clamp(0.0, 1.0))
                        .unwrap_or(ORACLE_DEFAULT_CONFIDENCE),
                    oracle: status,
                })
            }
            Err(err) => {
                warn!(
                    alert_id = %dossier.alert_id(),
                    error = %err,
                    fallback = ?self.config.oracle_fallback,
                    "Judgment oracle failed"
                );
                rationale.push(DecisionFactor::new("oracle_failure", err.to_string()));
                let status = match &err {
                    TriageError::OracleTimeout(timeout) => OracleStatus::TimedOut {
                        timeout_ms: timeout.as_millis() as u64,
                    },
                    other => OracleStatus::Unavailable {
                        reason: match other {
                            TriageError::OracleUnavailable(reason) => reason.clone(),
                            _ => other.to_string(),
                        },
                    },
                };
                if !applies {
                    return Ok(score_verdict(status));
                }
                match self.config.oracle_fallback {
                    OracleFallback::Propagate => Err(err),
                    OracleFallback::ScoreOnly => Ok(score_verdict(status)),
                    OracleFallback::NeedsReview => Ok(Verdict {
                        classification: Classification::NeedsReview,
                        basis: DecisionBasis::OracleFallback,
                        confidence: REVIEW_CONFIDENCE,
                        oracle: status,
                    }),
                }
            }
        }
    }

    async fn call_oracle(&self, dossier: &EnrichedDossier) -> Result<OracleJudgment> {
        let Some(oracle) = self.oracle.as_ref() else {
            return Err(TriageError::OracleUnavailable(
                "no judgment oracle configured".to_string(),
            ));
        };

        let timeout = self.config.oracle_timeout();
        match tokio::time::timeout(timeout, oracle.classify_borderline(dossier)).await {
            Ok(Ok(judgment)) => Ok(judgment),
            Ok(Err(e)) => Err(TriageError::OracleUnavailable(format!(
                "{}: {:#}",
                oracle.name(),
                e
            ))),
            Err(_) => Err(TriageError::OracleTimeout(timeout)),
        }
    }

    fn push_score_factors(
        &self,
        rationale: &mut Vec<DecisionFactor>,
        scores: &Scores,
        risk: &RiskAssessment,
    ) {
        let weights = &self.config.weights;
        rationale.push(DecisionFactor::new(
            "behavioral_score",
            scores.behavioral.describe(),
        ));
        let factors: Vec<String> = risk
            .factors
            .iter()
            .map(|f| format!("{} {:.1}", f.name, f.points))
            .collect();
        rationale.push(DecisionFactor::new(
            "risk_score",
            if factors.is_empty() {
                format!("{:.1} (no signals)", scores.risk)
            } else {
                format!("{:.1} ({})", scores.risk, factors.join(", "))
            },
        ));
        rationale.push(DecisionFactor::new(
            "composite_score",
            format!(
                "{:.2} = {:.1} x behavioral + {:.1} x risk + {:.1} x alert base",
                scores.composite, weights.behavioral, weights.risk, weights.alert_base
            ),
        ));
    }

    fn finish(
        &self,
        dossier: &EnrichedDossier,
        scores: &Scores,
        matched: Option<RuleMatch>,
        verdict: Verdict,
        mut rationale: Vec<DecisionFactor>,
    ) -> TriageDecision {
        rationale.push(DecisionFactor::new(
            "classification",
            format!(
                "{} via {}",
                verdict.classification,
                verdict.basis.as_str()
            ),
        ));

        TriageDecision {
            alert_id: dossier.alert.alert_id.clone(),
            classification: verdict.classification,
            basis: verdict.basis,
            matched_rule: matched.map(|m| m.rule),
            behavioral_score: scores.behavioral.total,
            risk_score: scores.risk,
            composite_score: scores.composite,
            confidence: verdict.confidence,
            oracle: verdict.oracle,
            rationale,
        }
    }
}

fn rule_factor(matched: &RuleMatch) -> DecisionFactor {
    DecisionFactor::new(format!("rule {}", matched.rule), matched.evidence.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use crate::enrichment::Enricher;
    use crate::scenarios;
    use crate::triage::oracle::StaticOracle;
    use async_trait::async_trait;
    use std::time::Duration;

    struct SlowOracle;

    #[async_trait]
    impl JudgmentOracle for SlowOracle {
        fn name(&self) -> &str {
            "slow"
        }

        async fn classify_borderline(
            &self,
            _dossier: &EnrichedDossier,
        ) -> anyhow::Result<OracleJudgment> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(OracleJudgment::new(Classification::FalsePositive, "too late"))
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl JudgmentOracle for FailingOracle {
        fn name(&self) -> &str {
            "failing"
        }

        async fn classify_borderline(
            &self,
            _dossier: &EnrichedDossier,
        ) -> anyhow::Result<OracleJudgment> {
            anyhow::bail!("connection refused")
        }
    }

    fn borderline_dossier() -> EnrichedDossier {
        let case = scenarios::borderline_review().validate().unwrap();
        Enricher::new(&TriageConfig::default()).enrich(case)
    }

    fn cascade(fallback: OracleFallback, oracle: Option<Arc<dyn JudgmentOracle>>) -> TriageCascade {
        let config = CascadeConfig {
            oracle_timeout_ms: 20,
            oracle_fallback: fallback,
            ..Default::default()
        };
        TriageCascade::new(config, oracle)
    }

    #[test]
    fn test_composite_of_45_needs_review() {
        let config = CascadeConfig::default();
        let composite = composite_score(&config.weights, 0.0, 25.0, 100.0);

        assert!((composite - 45.0).abs() < 1e-9);
        assert_eq!(classify_composite(composite, &config), Classification::NeedsReview);
    }

    #[test]
    fn test_threshold_boundaries() {
        let config = CascadeConfig::default();
        assert_eq!(classify_composite(30.0, &config), Classification::FalsePositive);
        assert_eq!(classify_composite(30.01, &config), Classification::NeedsReview);
        assert_eq!(classify_composite(59.99, &config), Classification::NeedsReview);
        assert_eq!(classify_composite(60.0, &config), Classification::TruePositive);
    }

    #[test]
    fn test_composite_confidence_is_bounded() {
        let config = CascadeConfig::default();
        let tp = |c: f64| composite_confidence(Classification::TruePositive, c, &config);
        assert!((tp(60.0) - 0.5).abs() < 1e-9);
        assert!((tp(100.0) - 0.9).abs() < 1e-9);
        assert_eq!(composite_confidence(Classification::TruePositive, 200.0, &config), 0.95);
        assert_eq!(composite_confidence(Classification::FalsePositive, 0.0, &config), 0.90);
        assert_eq!(composite_confidence(Classification::NeedsReview, 45.0, &config), 0.4);
    }

    #[tokio::test]
    async fn test_oracle_verdict_applies_inside_band() {
        let oracle: Arc<dyn JudgmentOracle> = Arc::new(StaticOracle::new(
            OracleJudgment::new(Classification::TruePositive, "layering through new payees")
                .with_confidence(0.8),
        ));
        let decision = cascade(OracleFallback::NeedsReview, Some(oracle))
            .decide(&borderline_dossier())
            .await
            .unwrap();

        assert_eq!(decision.classification, Classification::TruePositive);
        assert_eq!(decision.basis, DecisionBasis::Oracle);
        assert_eq!(decision.confidence, 0.8);
        assert!(matches!(decision.oracle, OracleStatus::Judged { applied: true, .. }));
    }

    #[tokio::test]
    async fn test_oracle_timeout_falls_back_to_review() {
        let oracle: Arc<dyn JudgmentOracle> = Arc::new(SlowOracle);
        let decision = cascade(OracleFallback::NeedsReview, Some(oracle))
            .decide(&borderline_dossier())
            .await
            .unwrap();

        assert_eq!(decision.classification, Classification::NeedsReview);
        assert_eq!(decision.basis, DecisionBasis::OracleFallback);
        assert_eq!(decision.oracle, OracleStatus::TimedOut { timeout_ms: 20 });
        assert!(decision.rationale.iter().any(|f| f.factor == "oracle_failure"));
    }

    #[tokio::test]
    async fn test_oracle_timeout_propagates_when_configured() {
        let oracle: Arc<dyn JudgmentOracle> = Arc::new(SlowOracle);
        let result = cascade(OracleFallback::Propagate, Some(oracle))
            .decide(&borderline_dossier())
            .await;

        assert!(matches!(result, Err(TriageError::OracleTimeout(_))));
    }

    #[tokio::test]
    async fn test_oracle_error_is_unavailable() {
        let oracle: Arc<dyn JudgmentOracle> = Arc::new(FailingOracle);
        let decision = cascade(OracleFallback::ScoreOnly, Some(oracle))
            .decide(&borderline_dossier())
            .await
            .unwrap();

        assert_eq!(decision.classification, Classification::NeedsReview);
        assert_eq!(decision.basis, DecisionBasis::CompositeScore);
        match decision.oracle {
            OracleStatus::Unavailable { reason } => assert!(reason.contains("connection refused")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_oracle_is_never_a_false_positive() {
        let decision = cascade(OracleFallback::NeedsReview, None)
            .decide(&borderline_dossier())
            .await
            .unwrap();

        assert_eq!(decision.classification, Classification::NeedsReview);
        assert!(decision.oracle.failed());
    }
}
