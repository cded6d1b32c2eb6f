//! Terminal routing of a triage decision

use crate::types::decision::{
    Classification, RoutePath, RoutingOutcome, TriageDecision, TypologyAssessment,
};

/// Path for a classification
pub fn path_for(classification: Classification) -> RoutePath {
    match classification {
        Classification::FalsePositive => RoutePath::AutoClose,
        Classification::NeedsReview => RoutePath::ReviewQueue,
        Classification::TruePositive => RoutePath::NarrativePipeline,
    }
}

/// Select the path and package the decision for it. A typology is only
/// carried to the narrative pipeline.
pub fn route(decision: TriageDecision, typology: Option<TypologyAssessment>) -> RoutingOutcome {
    let path = path_for(decision.classification);
    let typology = match path {
        RoutePath::NarrativePipeline => typology,
        RoutePath::AutoClose | RoutePath::ReviewQueue => None,
    };

    RoutingOutcome {
        alert_id: decision.alert_id.clone(),
        path,
        decision,
        typology,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::decision::{DecisionBasis, OracleStatus, TypologyCategory};

    fn decision(classification: Classification) -> TriageDecision {
        TriageDecision {
            alert_id: "ALT-1".into(),
            classification,
            basis: DecisionBasis::CompositeScore,
            matched_rule: None,
            behavioral_score: 0.0,
            risk_score: 0.0,
            composite_score: 0.0,
            confidence: 0.5,
            oracle: OracleStatus::NotInvoked,
            rationale: Vec::new(),
        }
    }

    fn typology() -> TypologyAssessment {
        TypologyAssessment {
            category: TypologyCategory::StructuringLayering,
            indicator_count: 3,
            matched_indicators: Vec::new(),
            secondary_categories: Vec::new(),
        }
    }

    #[test]
    fn test_each_classification_has_one_path() {
        assert_eq!(path_for(Classification::FalsePositive), RoutePath::AutoClose);
        assert_eq!(path_for(Classification::NeedsReview), RoutePath::ReviewQueue);
        assert_eq!(path_for(Classification::TruePositive), RoutePath::NarrativePipeline);
    }

    #[test]
    fn test_typology_only_reaches_narrative_pipeline() {
        let outcome = route(decision(Classification::TruePositive), Some(typology()));
        assert_eq!(outcome.path, RoutePath::NarrativePipeline);
        assert!(outcome.typology.is_some());

        let outcome = route(decision(Classification::NeedsReview), Some(typology()));
        assert_eq!(outcome.path, RoutePath::ReviewQueue);
        assert!(outcome.typology.is_none());
    }
}
