//! Artifact store client
//!
//! HTTP facade over the file-write and screenshot-persistence backend. The
//! store owns path validation: anything resolving outside the project root
//! is rejected on its side, not here.

use livecoder_common::{Error, Result, SavedScreenshot, ServiceKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::health::Probe;
use crate::services::net_error;

/// Placeholder component written on startup so the preview renders a known
/// state before the first generation run.
pub const INITIAL_COMPONENT: &str = r#"import React from 'react';

function CodeToggle() {
  return (
    <div>
      Initial Component
    </div>
  );
}

export default CodeToggle;"#;

#[derive(Debug, Serialize)]
struct WriteFileRequest<'a> {
    path: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WriteFileResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct SaveScreenshotRequest<'a> {
    #[serde(rename = "imageData")]
    image_data: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveScreenshotResponse {
    success: bool,
    #[serde(default)]
    message: String,
    filename: Option<String>,
    path: Option<String>,
}

/// Client for the artifact store backend
#[derive(Clone)]
pub struct ArtifactStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl ArtifactStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Write generated source to a project-relative path
    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let url = format!("{}/api/write-file", self.base_url);
        debug!(%path, bytes = content.len(), "writing artifact");

        let resp = self
            .http
            .post(&url)
            .json(&WriteFileRequest { path, content })
            .send()
            .await
            .map_err(|e| net_error(ServiceKind::ArtifactStore, &e))?;

        let status = resp.status();
        let body: WriteFileResponse = resp
            .json()
            .await
            .map_err(|e| net_error(ServiceKind::ArtifactStore, &e))?;

        if !status.is_success() || !body.success {
            return Err(Error::Persistence(if body.message.is_empty() {
                format!("write-file returned {}", status)
            } else {
                body.message
            }));
        }

        Ok(())
    }

    /// Persist a captured image (base64 PNG data URL); returns the stored
    /// filename and path
    pub async fn save_screenshot(&self, data_url: &str) -> Result<SavedScreenshot> {
        let url = format!("{}/api/save-screenshot", self.base_url);

        let resp = self
            .http
            .post(&url)
            .json(&SaveScreenshotRequest { image_data: data_url })
            .send()
            .await
            .map_err(|e| net_error(ServiceKind::ArtifactStore, &e))?;

        let status = resp.status();
        let body: SaveScreenshotResponse = resp
            .json()
            .await
            .map_err(|e| net_error(ServiceKind::ArtifactStore, &e))?;

        if !status.is_success() || !body.success {
            return Err(Error::Persistence(if body.message.is_empty() {
                format!("save-screenshot returned {}", status)
            } else {
                body.message
            }));
        }

        match (body.filename, body.path) {
            (Some(filename), Some(path)) => Ok(SavedScreenshot { filename, path }),
            _ => Err(Error::Persistence(
                "save-screenshot response missing filename or path".to_string(),
            )),
        }
    }

    /// Reset the artifact to the placeholder component
    pub async fn reset_component(&self, path: &str) -> Result<()> {
        self.write_file(path, INITIAL_COMPONENT).await
    }
}

#[async_trait::async_trait]
impl Probe for ArtifactStoreClient {
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/api/test", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| net_error(ServiceKind::ArtifactStore, &e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Connectivity {
                service: ServiceKind::ArtifactStore,
                reason: format!("liveness probe returned {}", resp.status()),
            })
        }
    }
}
