//! Synthetic Case Producer
//!
//! Publishes the built-in triage scenarios to NATS for pipeline testing,
//! each under a fresh alert id and optionally with jittered amounts.

use alert_triage::scenarios;
use alert_triage::CaseInput;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Produces scenario cases under unique alert ids
struct CaseGenerator {
    rng: rand::rngs::ThreadRng,
    templates: Vec<CaseInput>,
    /// Relative amount jitter (0.05 = up to 5% either way)
    jitter: f64,
}

impl CaseGenerator {
    fn new(jitter: f64) -> Self {
        Self {
            rng: rand::thread_rng(),
            templates: scenarios::all(),
            jitter: jitter.clamp(0.0, 0.5),
        }
    }

    fn generate(&mut self) -> CaseInput {
        let index = self.rng.gen_range(0..self.templates.len());
        let mut case = self.templates[index].clone();

        let prefix = case.alert.alert_id.clone().unwrap_or_else(|| "ALT".to_string());
        case.alert.alert_id = Some(format!("{}-{}", prefix, Uuid::new_v4().simple()));

        if self.jitter > 0.0 {
            for tx in &mut case.transaction_history {
                if let Some(amount) = tx.amount.as_mut() {
                    let factor = 1.0 + self.rng.gen_range(-self.jitter..=self.jitter);
                    *amount = (*amount * factor * 100.0).round() / 100.0;
                }
            }
        }

        case
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("case_producer=info".parse()?),
        )
        .init();

    info!("Starting Synthetic Case Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("triage.cases");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(50);
    let jitter: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        jitter = jitter,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, jitter, delay_ms).await;
        }
    };

    let mut generator = CaseGenerator::new(jitter);
    info!("Starting to publish {} cases...", count);

    for i in 0..count {
        let case = generator.generate();
        let payload = serde_json::to_vec(&case)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!("Published {}/{} cases", i + 1, count);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    client.flush().await?;

    info!("Completed! Published {} cases", count);

    Ok(())
}

async fn run_dry_mode(count: u64, jitter: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = CaseGenerator::new(jitter);

    for i in 0..count {
        let case = generator.generate();

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&case.alert)?;
            info!(
                "Sample case {} ({} transactions):\n{}",
                i + 1,
                case.transaction_history.len(),
                json
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
