//! Emotion classifier gateway.
//!
//! The classifier is an external service: nine features in, four class
//! scores out, label order `[boredom, confusion, fatigue, focus]`. A failed
//! round trip only costs the current window; the pipeline never retries.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::engine::types::{FeatureVector, ProbabilityVector};

pub trait EmotionClassifier {
    fn classify(
        &self,
        features: FeatureVector,
    ) -> impl Future<Output = Result<ProbabilityVector, ClassifierError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct ClassifyRequest {
    features: [f64; 9],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResponse {
    emotion_probs: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HttpEmotionClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl HttpEmotionClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    async fn classify_http(
        &self,
        features: FeatureVector,
    ) -> Result<ProbabilityVector, ClassifierError> {
        let mut request = self.client.post(&self.config.api_url).json(&ClassifyRequest {
            features: features.to_array(),
        });
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Unavailable(format!("status {status}")));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        let probs: [f64; 4] = body.emotion_probs.as_slice().try_into().map_err(|_| {
            ClassifierError::MalformedResponse(format!(
                "expected 4 probabilities, got {}",
                body.emotion_probs.len()
            ))
        })?;

        Ok(ProbabilityVector(probs))
    }
}

impl EmotionClassifier for HttpEmotionClassifier {
    fn classify(
        &self,
        features: FeatureVector,
    ) -> impl Future<Output = Result<ProbabilityVector, ClassifierError>> + Send {
        async move {
            if self.config.mock {
                // Focus-heavy canned output for local runs without the model.
                return Ok(ProbabilityVector([0.1, 0.1, 0.1, 0.7]));
            }
            self.classify_http(features).await
        }
    }
}
