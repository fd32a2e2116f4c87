//! HTTP adapters for the classifier and persistence endpoints
//!
//! Both endpoints take JSON. The classifier receives `{"image": <data uri>}`
//! and answers `{"age": <number>}`; the persistence endpoint receives
//! `{"image": <data uri>, "age": <integer>}`.

use super::{Classifier, Persistence};
use crate::config::ServicesConfig;
use crate::types::{CapturedImage, PersistRequest};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ClassifyRequest {
    image: String,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    age: f64,
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Parse a classifier response body into a whole age.
pub fn parse_age(body: &str) -> Result<u32> {
    let response: ClassifyResponse =
        serde_json::from_str(body).context("Classifier response is not valid JSON")?;
    if !response.age.is_finite() || response.age < 0.0 || response.age > u32::MAX as f64 {
        bail!("Classifier returned an invalid age: {}", response.age);
    }
    Ok(response.age.round() as u32)
}

/// Classifier reached over HTTP
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(
            config.classifier_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &CapturedImage) -> Result<u32> {
        log::debug!("Sending image {} to classifier at {}", image.id, self.url);

        let body = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest {
                image: image.to_data_uri(),
            })
            .send()
            .await
            .context("Failed to reach classifier")?
            .error_for_status()
            .context("Classifier returned error status")?
            .text()
            .await
            .context("Failed to read classifier response")?;

        parse_age(&body)
    }
}

/// Persistence endpoint reached over HTTP
pub struct HttpPersistence {
    client: reqwest::Client,
    url: String,
}

impl HttpPersistence {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(
            config.persistence_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }
}

#[async_trait::async_trait]
impl Persistence for HttpPersistence {
    async fn persist(&self, request: PersistRequest) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to reach persistence endpoint")?;

        let status = response.status();
        log::info!("Persistence endpoint answered {}", status);
        if !status.is_success() {
            bail!("Persistence endpoint returned {}", status);
        }
        Ok(())
    }
}
