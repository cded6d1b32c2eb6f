//! Alert Triage Service - Main Entry Point
//!
//! Consumes triage cases from NATS, runs enrichment and the triage cascade,
//! and publishes each routing outcome on the subject of its route.

use alert_triage::{
    config::{AppConfig, LoggingConfig},
    consumer::{decode_case, CaseConsumer},
    engine::TriageEngine,
    judgment_client::NatsJudgmentOracle,
    metrics::{MetricsReporter, TriageMetrics},
    producer::{OutcomeProducer, Rejection},
    triage::JudgmentOracle,
};
use anyhow::Result;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("alert_triage={}", logging.level).parse()?);

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        "pretty" => tracing_subscriber::fmt().pretty().with_env_filter(filter).init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Alert Triage Service");
    info!(
        "Composite thresholds: false_positive<={:.0}, true_positive>={:.0}, oracle band [{:.0}, {:.0}]",
        config.triage.cascade.false_positive_ceiling,
        config.triage.cascade.true_positive_floor,
        config.triage.cascade.borderline_low,
        config.triage.cascade.borderline_high
    );

    let metrics = Arc::new(TriageMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let oracle: Option<Arc<dyn JudgmentOracle>> = if config.oracle.enabled {
        info!("Judgment oracle at subject {}", config.oracle.subject);
        Some(Arc::new(NatsJudgmentOracle::new(
            client.clone(),
            &config.oracle.subject,
        )))
    } else {
        warn!("Judgment oracle disabled; borderline alerts use the fallback policy");
        None
    };

    let engine = Arc::new(TriageEngine::new(&config.triage, oracle));

    // Initialize consumer and producer
    let consumer = CaseConsumer::new(client.clone(), &config.nats.case_subject);
    let producer = Arc::new(OutcomeProducer::new(client.clone(), &config.nats));

    let num_workers = config.pipeline.workers.max(1);
    let case_timeout = Duration::from_millis(config.pipeline.timeout_ms);
    info!(
        "Starting case processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", consumer.subject());

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Worker semaphore closed");
                break;
            }
        };

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let case = match decode_case(&message.payload) {
                Ok(case) => case,
                Err(e) => {
                    warn!(error = %format!("{:#}", e), "Failed to deserialize case");
                    metrics.record_rejection("undecodable");
                    let rejection = Rejection::new(None, "undecodable", format!("{:#}", e));
                    if let Err(e) = producer.publish_rejection(&rejection).await {
                        error!(error = %e, "Failed to publish rejection");
                    }
                    drop(permit);
                    return;
                }
            };

            let alert_id = case.alert_id().map(str::to_string);
            let records = case.transaction_history.len();

            match tokio::time::timeout(case_timeout, engine.process(case)).await {
                Ok(Ok(outcome)) => {
                    let processing_time = start_time.elapsed();
                    metrics.record_outcome(&outcome, processing_time);

                    let alert_id = outcome.alert_id.clone();
                    let path = outcome.path;
                    if let Err(e) = producer.publish(outcome).await {
                        error!(
                            alert_id = %alert_id,
                            error = %e,
                            "Failed to publish routing outcome"
                        );
                    } else {
                        info!(
                            alert_id = %alert_id,
                            route = %path,
                            processing_time_us = processing_time.as_micros(),
                            "Routing outcome published"
                        );
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 100 == 0 {
                        let processing_stats = metrics.get_processing_stats();
                        info!(
                            processed = count,
                            throughput = format!("{:.1} alerts/s", metrics.get_throughput()),
                            avg_latency_us = processing_stats.mean_us,
                            "Processing milestone"
                        );
                    }
                }
                Ok(Err(e)) => {
                    warn!(alert_id = ?alert_id, error = %e, "Alert not classified");
                    metrics.record_rejection(e.kind());
                    let rejection = Rejection::from_error(alert_id, &e);
                    if let Err(e) = producer.publish_rejection(&rejection).await {
                        error!(error = %e, "Failed to publish rejection");
                    }
                }
                Err(_) => {
                    error!(
                        alert_id = ?alert_id,
                        timeout_ms = case_timeout.as_millis() as u64,
                        records,
                        "Case processing timed out"
                    );
                    metrics.record_rejection("processing_timeout");
                    let rejection = Rejection::new(
                        alert_id,
                        "processing_timeout",
                        format!("no outcome within {:?}", case_timeout),
                    );
                    if let Err(e) = producer.publish_rejection(&rejection).await {
                        error!(error = %e, "Failed to publish rejection");
                    }
                }
            }

            drop(permit);
        });
    }

    info!("Triage service shutting down...");
    metrics.print_summary();

    Ok(())
}
