//! Test Prediction Client
//!
//! Generates random student records for the served schema and posts them to
//! the predictor's JSON API.

use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use student_status_predictor::form::{FormField, WidgetSelector};
use student_status_predictor::server::PredictRequest;
use student_status_predictor::{PredictionResult, WidgetKind};
use tracing::{info, warn};

/// Feature list used when the server cannot be reached
const SAMPLE_FEATURES: &[&str] = &[
    "Marital_status",
    "Application_mode",
    "Course",
    "Previous_qualification_grade",
    "Admission_grade",
    "Displaced",
    "Debtor",
    "Tuition_fees_up_to_date",
    "Gender",
    "Scholarship_holder",
    "Age_at_enrollment",
    "Curricular_units_1st_sem_approved",
    "Curricular_units_1st_sem_grade",
    "Curricular_units_2nd_sem_approved",
    "Curricular_units_2nd_sem_grade",
    "Unemployment_rate",
    "Inflation_rate",
    "GDP",
];

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    features: Vec<FormField>,
}

/// Random record generator honoring each widget's domain
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
    fields: Vec<FormField>,
}

impl RecordGenerator {
    /// Rejects widgets with an empty range before any sampling happens
    fn new(fields: Vec<FormField>) -> anyhow::Result<Self> {
        for field in &fields {
            field
                .widget
                .validate()
                .map_err(|reason| anyhow::anyhow!("widget for {}: {}", field.name, reason))?;
        }
        Ok(Self {
            rng: rand::thread_rng(),
            fields,
        })
    }

    fn generate(&mut self) -> HashMap<String, f64> {
        let mut record = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match &field.widget {
                WidgetKind::Continuous { step, .. } => {
                    let raw: f64 = self.rng.gen_range(0.0..200.0);
                    if *step > 0.0 {
                        (raw / step).round() * step
                    } else {
                        raw
                    }
                }
                WidgetKind::BoundedInteger { min, max, .. } => self.rng.gen_range(*min..=*max) as f64,
                WidgetKind::Binary { .. } => self.rng.gen_range(0..=1) as f64,
                WidgetKind::Integer { .. } => self.rng.gen_range(0..=20) as f64,
            };
            record.insert(field.name.clone(), value);
        }
        record
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Prediction Client");

    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(200);

    info!(base_url = %base_url, count = count, delay_ms = delay_ms, "Configuration loaded");

    let client = reqwest::Client::new();
    let schema = match fetch_schema(&client, &base_url).await {
        Ok(schema) => {
            info!(features = schema.features.len(), "Fetched feature schema");
            schema
        }
        Err(e) => {
            warn!(error = %e, "Failed to reach predictor. Running in dry-run mode.");
            return run_dry_mode(count, delay_ms).await;
        }
    };

    let mut generator = RecordGenerator::new(schema.features)?;
    let mut labels: HashMap<String, u64> = HashMap::new();
    let mut failures = 0u64;

    for i in 0..count {
        let request = PredictRequest {
            features: generator.generate(),
        };

        let response = client
            .post(format!("{}/api/predict", base_url))
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let result: PredictionResult = response.json().await?;
            info!(
                prediction_id = %result.prediction_id,
                label = %result.label,
                confidence = ?result.confidence_percent(),
                "Prediction received"
            );
            *labels.entry(result.label).or_default() += 1;
        } else {
            failures += 1;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Prediction rejected");
        }

        if (i + 1) % 10 == 0 {
            info!("Sent {}/{} records ({} failed)", i + 1, count, failures);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(labels = ?labels, failures = failures, "Completed! Sent {} records", count);

    Ok(())
}

async fn fetch_schema(client: &reqwest::Client, base_url: &str) -> anyhow::Result<SchemaResponse> {
    let schema = client
        .get(format!("{}/api/schema", base_url))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(schema)
}

async fn run_dry_mode(count: u64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no predictor connection)");

    let selector = WidgetSelector::default();
    let fields = SAMPLE_FEATURES
        .iter()
        .map(|name| FormField {
            name: name.to_string(),
            widget: selector.select(name),
        })
        .collect();
    let mut generator = RecordGenerator::new(fields)?;

    for i in 0..count {
        let request = PredictRequest {
            features: generator.generate(),
        };

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&request.features)?;
            info!("Sample record {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
