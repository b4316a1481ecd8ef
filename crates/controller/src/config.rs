//! Controller configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Artifact store (file-write and screenshot persistence) backend
    pub artifact_store: ArtifactStoreConfig,

    /// Generation / scoring backend
    pub generation: GenerationConfig,

    /// Live preview surface
    pub preview: PreviewConfig,

    /// Timing constants
    pub timing: TimingConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            artifact_store: ArtifactStoreConfig::default(),
            generation: GenerationConfig::default(),
            preview: PreviewConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

/// Artifact store backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactStoreConfig {
    /// Base URL of the write-file / save-screenshot backend
    pub base_url: String,

    /// Project-relative path the generated component is written to. The
    /// store rejects paths resolving outside the project root.
    pub component_path: String,
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            component_path: "webApp/src/components/CodeToggle.jsx".to_string(),
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the test-case / code / evaluation backend
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Live preview configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// URL the web app serving the artifact is reachable at
    pub base_url: String,

    /// Selector of the rendered-artifact container
    pub preview_selector: String,

    /// Selector of the syntax-highlighted code container
    pub code_selector: String,

    /// Selector of the view-mode toggle button
    pub toggle_selector: String,

    /// Directory captured screenshots are staged in before upload
    pub screenshot_dir: PathBuf,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            preview_selector: "[data-preview-root]".to_string(),
            code_selector: ".react-code-blocks-container".to_string(),
            toggle_selector: "[data-code-toggle]".to_string(),
            screenshot_dir: PathBuf::from("screenshots"),
        }
    }
}

/// Timing constants
///
/// The remount and settle delays are fixed values, not derived from
/// measurement; they are the fallback when the preview gives no mount
/// signal, and the principal source of flakiness in the capture stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between periodic health polls
    pub health_poll_ms: u64,

    /// Backoff before a failed health check is retried
    pub retry_backoff_ms: u64,

    /// Delay between the off and on flips of the view mode during remount
    pub remount_flip_ms: u64,

    /// Upper bound waited for the mount signal before capturing anyway
    pub capture_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            health_poll_ms: 30_000,
            retry_backoff_ms: 5_000,
            remount_flip_ms: 100,
            capture_settle_ms: 2_000,
        }
    }
}

impl TimingConfig {
    pub fn health_poll(&self) -> Duration {
        Duration::from_millis(self.health_poll_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn remount_flip(&self) -> Duration {
        Duration::from_millis(self.remount_flip_ms)
    }

    pub fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }
}

impl ControllerConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = ControllerConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ControllerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.artifact_store.base_url, config.artifact_store.base_url);
        assert_eq!(parsed.timing.capture_settle_ms, 2_000);
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config =
            ControllerConfig::load(std::path::Path::new("/nonexistent/livecoder.toml")).unwrap();
        assert_eq!(config.generation.base_url, "http://127.0.0.1:8000");
    }
}
