//! Readmission Inference Service - Main Entry Point
//!
//! Answers patient assessment requests from NATS: rebuilds the model's feature
//! vector, runs the requested model and replies with the risk assessment.

use anyhow::Result;
use futures::StreamExt;
use readmission_inference::{
    config::{AppConfig, LoggingConfig},
    consumer::{decode_request, request_id_hint, RequestConsumer},
    metrics::{MetricsReporter, ServiceMetrics},
    models::load_artifacts,
    predictor::ReadmissionPredictor,
    producer::ResponsePublisher,
    types::AssessmentResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("readmission_inference={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so it can pick the log format
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Readmission Inference Service");
    info!(
        models_dir = %config.models.models_dir,
        default_model = %config.models.default_model,
        "Configuration loaded successfully"
    );

    // Load artifacts; any missing file aborts startup
    let artifacts = load_artifacts(&config.models)?;
    let predictor = Arc::new(ReadmissionPredictor::from_artifacts(
        artifacts,
        &config.models.default_model,
    )?);
    info!(
        "Predictor initialized with {} models: {:?} ({} features)",
        predictor.engine().model_count(),
        predictor.engine().model_names(),
        predictor.schema().len()
    );
    info!(
        best_model = %predictor.comparison().best_model.name,
        roc_auc = predictor.comparison().best_model.roc_auc,
        "Training run summary"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.requests_subject)
        .with_queue_group(config.nats.queue_group.clone());
    let publisher = Arc::new(ResponsePublisher::new(
        client.clone(),
        &config.nats.results_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting request loop with {} parallel workers on subject {}",
        num_workers,
        consumer.subject()
    );

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));

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

        let predictor = predictor.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let request = match decode_request(&message) {
                Ok(request) => request,
                Err(e) => {
                    metrics.record_rejected();
                    warn!(error = %e, "Rejecting assessment request");
                    // requesters waiting on a reply get an error instead of a timeout
                    if let Some(reply) = message.reply.clone() {
                        let hint = request_id_hint(&message);
                        let response = AssessmentResponse::rejected(hint.as_deref(), format!("{:#}", e));
                        if let Err(e) = publisher.publish(&response, Some(reply)).await {
                            error!(error = %e, "Failed to publish rejection");
                        }
                    }
                    return;
                }
            };

            let model = request
                .model
                .clone()
                .unwrap_or_else(|| predictor.engine().default_model().to_string());

            let response = match predictor.assess(&request.patient, Some(model.as_str())) {
                Ok(result) => {
                    let processing_time = start_time.elapsed();
                    metrics.record_success(
                        &model,
                        processing_time,
                        result.probability,
                        result.risk_level,
                    );
                    debug!(
                        request_id = %request.request_id,
                        model = %model,
                        probability = result.probability,
                        risk_level = %result.risk_level,
                        processing_time_us = processing_time.as_micros(),
                        "Assessment completed"
                    );
                    AssessmentResponse::success(&request.request_id, &model, result)
                }
                Err(e) => {
                    metrics.record_failure(start_time.elapsed());
                    error!(
                        request_id = %request.request_id,
                        model = %model,
                        error = %e,
                        "Assessment failed"
                    );
                    AssessmentResponse::failure(&request.request_id, &model, &e)
                }
            };

            if let Err(e) = publisher.publish(&response, message.reply.clone()).await {
                error!(
                    request_id = %request.request_id,
                    error = %e,
                    "Failed to publish assessment response"
                );
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
