use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ReviewError, Result};

/// Client for the external extraction/automation pipeline. The trigger is
/// fire-and-forget: a success response only acknowledges that processing
/// was queued.
pub struct PipelineClient {
    base_url: String,
    http: reqwest::Client,
}

/// Acknowledgement returned to the uploader after a trigger.
#[derive(Debug, Serialize)]
pub struct StartAck {
    pub ok: bool,
    pub ingestion_id: i64,
    pub state: &'static str,
}

impl PipelineClient {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Ask the pipeline to start processing an uploaded ingestion.
    pub async fn start_ingestion(&self, ingestion_id: i64) -> Result<StartAck> {
        let url = format!("{}/ingestions/{}/start", self.base_url, ingestion_id);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(ReviewError::upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::Upstream(format!(
                "pipeline start for ingestion {} returned {}",
                ingestion_id, status
            )));
        }
        info!("pipeline start acknowledged for ingestion {}", ingestion_id);
        Ok(StartAck {
            ok: true,
            ingestion_id,
            state: "Extracting",
        })
    }
}
