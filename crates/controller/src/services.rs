//! Generation backend client
//!
//! Thin HTTP wrapper over the test-case, code-generation and evaluation
//! endpoints. All three are GET routes taking the prompt as a query
//! parameter and answering `{ "response": <text> }`.

use livecoder_common::{Error, Result, ServiceKind};
use serde::Deserialize;
use tracing::debug;

use crate::health::Probe;

#[derive(Debug, Deserialize)]
struct BackendResponse {
    response: String,
}

/// Client for the generation / scoring backend
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
}

impl GenerationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Expand a requirement into a delimiter-joined checklist
    pub async fn test_cases(&self, prompt: &str) -> Result<String> {
        self.get("get_screen_test_cases", &[("prompt", prompt)]).await
    }

    /// Generate component source for the concatenated checklist
    pub async fn react_code(&self, prompt: &str) -> Result<String> {
        self.get("get_react_code", &[("prompt", prompt)]).await
    }

    /// Score a stored screenshot against the checklist it was generated from
    pub async fn evaluate(&self, prompt: &str, image_path: &str) -> Result<String> {
        self.get(
            "evaluate_image_with_prompt",
            &[("prompt", prompt), ("image_path", image_path)],
        )
        .await
    }

    async fn get(&self, route: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, route);
        debug!(%url, "calling generation backend");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| net_error(ServiceKind::Generation, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Backend {
                service: ServiceKind::Generation,
                message: format!("{} returned {}", route, status),
            });
        }

        let body: BackendResponse = resp
            .json()
            .await
            .map_err(|e| net_error(ServiceKind::Generation, &e))?;
        Ok(body.response)
    }
}

#[async_trait::async_trait]
impl Probe for GenerationClient {
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| net_error(ServiceKind::Generation, &e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Connectivity {
                service: ServiceKind::Generation,
                reason: format!("health probe returned {}", resp.status()),
            })
        }
    }
}

/// Map a transport error onto the pipeline taxonomy. Connection-class
/// failures become `Connectivity` so the caller can flip the reachability
/// flag; everything else is internal.
pub(crate) fn net_error(service: ServiceKind, err: &reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        Error::Connectivity {
            service,
            reason: err.to_string(),
        }
    } else {
        Error::Internal(err.to_string())
    }
}
