//! Test Request Producer
//!
//! Generates synthetic patient records, sends them as assessment requests and
//! logs the replies.

use rand::Rng;
use readmission_inference::types::{AssessmentRequest, AssessmentResponse, PatientRecord};
use std::time::Duration;
use tracing::{info, warn};

const MODELS: [&str; 3] = ["logistic_regression", "xgboost", "neural_network"];

/// Patient generator for testing
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// A routine short stay with few prior visits
    fn generate_routine(&mut self) -> PatientRecord {
        PatientRecord {
            gender: Some(self.random_choice(&["Male", "Female"]).to_string()),
            race: Some(
                self.random_choice(&["Caucasian", "AfricanAmerican", "Hispanic", "Asian", "Other"])
                    .to_string(),
            ),
            age_group: Some(self.random_choice(&["Age_0_30", "Age_30_60", "Age_60_plus"]).to_string()),
            time_in_hospital: Some(self.rng.gen_range(1..6) as f64),
            num_lab_procedures: Some(self.rng.gen_range(10..60) as f64),
            num_procedures: Some(self.rng.gen_range(0..3) as f64),
            num_medications_prescribed: Some(self.rng.gen_range(3..20) as f64),
            number_emergency: Some(0.0),
            number_inpatient: Some(self.rng.gen_range(0..2) as f64),
            number_outpatient: Some(self.rng.gen_range(0..3) as f64),
            number_diagnoses: Some(self.rng.gen_range(3..9) as f64),
            primary_diagnosis: Some(
                self.random_choice(&["Diabetes", "Respiratory", "Digestive", "Musculoskeletal"])
                    .to_string(),
            ),
            hba1c_category: Some(self.random_choice(&["No_HbA1c_Test", "Normal_HbA1c"]).to_string()),
            diabetes_med: Some(self.random_choice(&["Yes", "No"]).to_string()),
            payer_code: Some(self.random_choice(&["MC", "HM", "SP", "BC"]).to_string()),
            ..Default::default()
        }
    }

    /// A long, procedure-heavy elderly stay with frequent prior admissions
    fn generate_complex(&mut self) -> PatientRecord {
        PatientRecord {
            gender: Some(self.random_choice(&["Male", "Female"]).to_string()),
            race: Some(self.random_choice(&["Caucasian", "AfricanAmerican"]).to_string()),
            age_group: Some("Age_60_plus".to_string()),
            time_in_hospital: Some(self.rng.gen_range(8..15) as f64),
            num_lab_procedures: Some(self.rng.gen_range(50..100) as f64),
            num_procedures: Some(self.rng.gen_range(4..7) as f64),
            num_medications_prescribed: Some(self.rng.gen_range(15..40) as f64),
            number_emergency: Some(self.rng.gen_range(1..5) as f64),
            number_inpatient: Some(self.rng.gen_range(2..8) as f64),
            number_outpatient: Some(self.rng.gen_range(0..5) as f64),
            number_diagnoses: Some(self.rng.gen_range(8..16) as f64),
            num_medications_changed: Some(self.rng.gen_range(1..4) as f64),
            primary_diagnosis: Some(self.random_choice(&["Circulatory", "Diabetes"]).to_string()),
            secondary_diagnosis: Some("Circulatory".to_string()),
            hba1c_category: Some(
                self.random_choice(&["High_HbA1c_MedChanged", "High_HbA1c_NoMedChange"])
                    .to_string(),
            ),
            diabetes_med: Some("Yes".to_string()),
            payer_code: Some("MC".to_string()),
            ..Default::default()
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("readmission.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let complex_rate = complex_rate_arg(args.get(4).map(|s| s.as_str()));
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        complex_rate = complex_rate,
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
            return run_dry_mode(count, complex_rate).await;
        }
    };

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();
    let mut answered = 0u64;

    for i in 0..count {
        let request = next_request(&mut generator, &mut rng, complex_rate);
        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => match serde_json::from_slice::<AssessmentResponse>(&reply.payload) {
                Ok(response) => {
                    answered += 1;
                    info!(
                        request_id = %response.request_id,
                        model = %response.model,
                        status = ?response.status,
                        "{}",
                        response.message
                    );
                }
                Err(e) => warn!(error = %e, "Undecodable response"),
            },
            Err(e) => warn!(request = i + 1, error = %e, "Request failed"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! {}/{} requests answered", answered, count);

    Ok(())
}

/// Share of complex patients; anything unusable falls back to 0.3
fn complex_rate_arg(arg: Option<&str>) -> f64 {
    match arg.and_then(|s| s.parse::<f64>().ok()) {
        Some(rate) if rate.is_finite() => rate.clamp(0.0, 1.0),
        _ => 0.3,
    }
}

fn next_request(
    generator: &mut PatientGenerator,
    rng: &mut rand::rngs::ThreadRng,
    complex_rate: f64,
) -> AssessmentRequest {
    let patient = if rng.gen_bool(complex_rate) {
        generator.generate_complex()
    } else {
        generator.generate_routine()
    };
    AssessmentRequest::new(patient).with_model(MODELS[rng.gen_range(0..MODELS.len())])
}

async fn run_dry_mode(count: u64, complex_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count.min(3) {
        let request = next_request(&mut generator, &mut rng, complex_rate);
        info!("Sample request {}:\n{}", i + 1, serde_json::to_string_pretty(&request)?);
    }

    Ok(())
}
