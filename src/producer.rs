//! NATS producer for routing outcomes and rejections

use crate::config::NatsConfig;
use crate::error::TriageError;
use crate::types::decision::{RoutePath, RoutingOutcome};
use anyhow::{Context, Result};
use async_nats::Client;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Outcome as published: the deterministic outcome plus delivery metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEnvelope {
    pub message_id: String,
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: RoutingOutcome,
}

impl OutcomeEnvelope {
    /// Wrap an outcome with a fresh message id and publish time
    pub fn new(outcome: RoutingOutcome) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            published_at: Utc::now(),
            outcome,
        }
    }
}

/// Case that failed before classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub message_id: String,
    pub published_at: DateTime<Utc>,
    pub alert_id: Option<String>,
    pub kind: String,
    pub error: String,
}

impl Rejection {
    /// Build a rejection stamped with a fresh message id
    pub fn new(alert_id: Option<String>, kind: &str, error: impl ToString) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            published_at: Utc::now(),
            alert_id,
            kind: kind.to_string(),
            error: error.to_string(),
        }
    }

    /// Build a rejection whose kind is taken from the triage error
    pub fn from_error(alert_id: Option<String>, err: &TriageError) -> Self {
        Self::new(alert_id, err.kind(), err)
    }
}

/// Publishes each outcome on the subject of its route
#[derive(Clone)]
pub struct OutcomeProducer {
    client: Client,
    auto_close_subject: String,
    review_subject: String,
    narrative_subject: String,
    rejected_subject: String,
}

impl OutcomeProducer {
    /// Create a producer with the route subjects from the NATS config
    pub fn new(client: Client, config: &NatsConfig) -> Self {
        Self {
            client,
            auto_close_subject: config.auto_close_subject.clone(),
            review_subject: config.review_subject.clone(),
            narrative_subject: config.narrative_subject.clone(),
            rejected_subject: config.rejected_subject.clone(),
        }
    }

    /// Subject an outcome on `path` is published to
    pub fn subject_for(&self, path: RoutePath) -> &str {
        match path {
            RoutePath::AutoClose => &self.auto_close_subject,
            RoutePath::ReviewQueue => &self.review_subject,
            RoutePath::NarrativePipeline => &self.narrative_subject,
        }
    }

    /// Publish the outcome on the subject of its route.
    ///
    /// The outcome is wrapped in an [`OutcomeEnvelope`] before serialization.
    pub async fn publish(&self, outcome: RoutingOutcome) -> Result<()> {
        let subject = self.subject_for(outcome.path).to_string();
        let envelope = OutcomeEnvelope::new(outcome);
        let payload = serde_json::to_vec(&envelope).context("Failed to serialize outcome")?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!(
            message_id = %envelope.message_id,
            alert_id = %envelope.outcome.alert_id,
            subject = %subject,
            "Published routing outcome"
        );

        Ok(())
    }

    /// Publish a rejection on the rejected subject
    pub async fn publish_rejection(&self, rejection: &Rejection) -> Result<()> {
        let payload = serde_json::to_vec(rejection).context("Failed to serialize rejection")?;

        self.client
            .publish(self.rejected_subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", self.rejected_subject))?;

        debug!(
            alert_id = ?rejection.alert_id,
            kind = %rejection.kind,
            "Published rejection"
        );

        Ok(())
    }
}
