//! NATS consumer for incoming triage cases

use crate::types::alert::CaseInput;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Subscribes to the case intake subject
pub struct CaseConsumer {
    client: Client,
    subject: String,
}

impl CaseConsumer {
    /// Create a consumer for the case subject
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the case subject. Fails when the server rejects the subscription.
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", self.subject))?;
        info!(subject = %self.subject, "Subscribed to case subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a case payload
pub fn decode_case(payload: &[u8]) -> Result<CaseInput> {
    serde_json::from_slice(payload).context("Failed to deserialize case input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use crate::enrichment::{Enricher, QuarantineReason};
    use crate::error::TriageError;
    use crate::scenarios;

    #[test]
    fn test_decode_published_scenario() {
        let payload = serde_json::to_vec(&scenarios::borderline_review()).unwrap();
        let case = decode_case(&payload).unwrap();

        assert_eq!(case.alert_id(), Some("ALT-BORD-0001"));
        assert_eq!(case.transaction_history.len(), 26);
    }

    #[test]
    fn test_decode_partial_alert_keeps_missing_fields() {
        let case = decode_case(br#"{"alert": {"alert_id": "ALT-7"}}"#).unwrap();

        assert!(case.customer_profile.is_none());
        assert!(case.alert.window_start.is_none());
    }

    fn payroll_json() -> serde_json::Value {
        serde_json::to_value(scenarios::payroll_deposit()).unwrap()
    }

    fn decode_value(value: &serde_json::Value) -> CaseInput {
        decode_case(&serde_json::to_vec(value).unwrap()).unwrap()
    }

    #[test]
    fn test_profile_without_account_opened_is_malformed_not_undecodable() {
        let mut json = payroll_json();
        json["customer_profile"]
            .as_object_mut()
            .unwrap()
            .remove("account_opened");

        let err = decode_value(&json).validate().unwrap_err();
        assert!(matches!(
            err,
            TriageError::MalformedAlert { field: "customer_profile.account_opened", .. }
        ));
    }

    #[test]
    fn test_bad_history_records_are_quarantined_not_undecodable() {
        let mut json = payroll_json();
        json["transaction_history"][0]["date"] = "2025-13-40".into();
        json["transaction_history"][1]
            .as_object_mut()
            .unwrap()
            .remove("direction");

        let dossier = Enricher::new(&TriageConfig::default())
            .enrich(decode_value(&json).validate().unwrap());
        let reasons: Vec<QuarantineReason> =
            dossier.quarantined.iter().map(|q| q.reason).collect();

        assert_eq!(
            reasons,
            vec![QuarantineReason::MissingDate, QuarantineReason::MissingDirection]
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_case(b"not json").is_err());
    }
}
