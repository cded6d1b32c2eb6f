//! Layer 3: judgment oracle capability for borderline alerts

use crate::enrichment::EnrichedDossier;
use crate::types::decision::Classification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Verdict returned by a judgment oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleJudgment {
    pub classification: Classification,
    pub rationale: String,
    /// Oracle's own confidence (0.0 - 1.0), if it reports one
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl OracleJudgment {
    pub fn new(classification: Classification, rationale: impl Into<String>) -> Self {
        Self {
            classification,
            rationale: rationale.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// External judgment for borderline alerts.
///
/// The cascade applies its own timeout around `classify_borderline`;
/// implementations do not need one.
#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    fn name(&self) -> &str;

    async fn classify_borderline(
        &self,
        dossier: &EnrichedDossier,
    ) -> anyhow::Result<OracleJudgment>;
}

/// Oracle that returns the same judgment for every dossier
pub struct StaticOracle {
    judgment: OracleJudgment,
}

impl StaticOracle {
    /// Oracle that returns `judgment` for every request
    pub fn new(judgment: OracleJudgment) -> Self {
        Self { judgment }
    }

    pub fn always(classification: Classification) -> Self {
        Self::new(OracleJudgment::new(
            classification,
            format!("static judgment: {}", classification),
        ))
    }
}

#[async_trait]
impl JudgmentOracle for StaticOracle {
    fn name(&self) -> &str {
        "static"
    }

    async fn classify_borderline(
        &self,
        _dossier: &EnrichedDossier,
    ) -> anyhow::Result<OracleJudgment> {
        Ok(self.judgment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgment_wire_format() {
        let json = r#"{"classification": "TRUE_POSITIVE", "rationale": "layered wires"}"#;
        let judgment: OracleJudgment = serde_json::from_str(json).unwrap();

        assert_eq!(judgment.classification, Classification::TruePositive);
        assert_eq!(judgment.confidence, None);
    }
}
