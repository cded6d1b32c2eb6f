//! Judgment oracle reached over NATS request/reply

use crate::enrichment::EnrichedDossier;
use crate::triage::{JudgmentOracle, OracleJudgment};
use anyhow::{Context, Result};
use async_nats::Client;
use async_trait::async_trait;
use tracing::debug;

/// Sends the borderline dossier as a request and parses the reply as an
/// `OracleJudgment`. The cascade bounds the wait.
pub struct NatsJudgmentOracle {
    client: Client,
    subject: String,
}

impl NatsJudgmentOracle {
    /// Create an oracle that sends requests on `subject`
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }
}

#[async_trait]
impl JudgmentOracle for NatsJudgmentOracle {
    fn name(&self) -> &str {
        &self.subject
    }

    async fn classify_borderline(&self, dossier: &EnrichedDossier) -> Result<OracleJudgment> {
        let payload = serde_json::to_vec(dossier).context("Failed to serialize dossier")?;

        let reply = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .with_context(|| format!("Request to {} failed", self.subject))?;

        let judgment = parse_judgment(&reply.payload)?;
        debug!(
            alert_id = %dossier.alert_id(),
            classification = %judgment.classification,
            "Oracle judgment received"
        );

        Ok(judgment)
    }
}

fn parse_judgment(payload: &[u8]) -> Result<OracleJudgment> {
    serde_json::from_slice(payload).context("Failed to deserialize oracle judgment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::decision::Classification;

    #[test]
    fn test_parse_reply_with_confidence() {
        let judgment = parse_judgment(
            br#"{"classification": "FALSE_POSITIVE", "rationale": "known supplier", "confidence": 0.7}"#,
        )
        .unwrap();

        assert_eq!(judgment.classification, Classification::FalsePositive);
        assert_eq!(judgment.confidence, Some(0.7));
    }

    #[test]
    fn test_parse_reply_rejects_unknown_classification() {
        let err = parse_judgment(br#"{"classification": "MAYBE", "rationale": ""}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("oracle judgment"));
    }
}
