//! Core types for the LiveCoder pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delimiter joining test-case sentences in generation responses and prompts.
///
/// A literal two-character marker (not a line break) requested from the
/// generation backend so it cannot collide with newlines inside generated
/// text. Splitting and rejoining must round-trip on this exact sequence.
pub const TEST_CASE_DELIMITER: &str = "/n";

/// One checklist entry for the screen under construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

/// The two backend services the pipeline depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// File-write and screenshot-persistence backend
    ArtifactStore,
    /// Test-case / code / evaluation backend
    Generation,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 2] = [ServiceKind::ArtifactStore, ServiceKind::Generation];
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::ArtifactStore => write!(f, "artifact store"),
            ServiceKind::Generation => write!(f, "generation backend"),
        }
    }
}

/// Reachability of one monitored service
///
/// Created at monitor start and mutated only by the monitor's own poll
/// cycle; pipeline code reads it as a precondition gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub reachable: bool,
    pub last_error: Option<String>,
}

/// Which root the live view currently displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// The rendered artifact
    Preview,
    /// The syntax-highlighted source of the artifact
    Code,
}

impl ViewMode {
    /// The other mode; remounting flips to this and back.
    pub fn flipped(self) -> ViewMode {
        match self {
            ViewMode::Preview => ViewMode::Code,
            ViewMode::Code => ViewMode::Preview,
        }
    }
}

/// Outcome of waiting for the preview to report the new artifact mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// The view signalled that the artifact rendered.
    Mounted,
    /// No signal arrived; the fixed settle delay elapsed instead.
    FallbackElapsed,
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    AwaitingTestCases,
    AwaitingArtifact,
    Persisting,
    Remounting,
    Capturing,
    Evaluating,
    Failed,
}

impl Default for PipelineStage {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Idle => write!(f, "idle"),
            PipelineStage::AwaitingTestCases => write!(f, "awaiting_test_cases"),
            PipelineStage::AwaitingArtifact => write!(f, "awaiting_artifact"),
            PipelineStage::Persisting => write!(f, "persisting"),
            PipelineStage::Remounting => write!(f, "remounting"),
            PipelineStage::Capturing => write!(f, "capturing"),
            PipelineStage::Evaluating => write!(f, "evaluating"),
            PipelineStage::Failed => write!(f, "failed"),
        }
    }
}

/// A screenshot persisted by the artifact store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedScreenshot {
    pub filename: String,
    /// Path under which the store saved the image; handed verbatim to the
    /// evaluation endpoint.
    pub path: String,
}

/// Report for one completed pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub requirement: String,
    /// Ids of the test cases this run appended to the store
    pub test_case_ids: Vec<u64>,
    /// The concatenated checklist snapshot the artifact was generated from
    /// and evaluated against
    pub checklist: String,
    pub artifact_path: String,
    pub screenshot: SavedScreenshot,
    pub verdict: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_mode_flips_both_ways() {
        assert_eq!(ViewMode::Preview.flipped(), ViewMode::Code);
        assert_eq!(ViewMode::Code.flipped(), ViewMode::Preview);
    }

    #[test]
    fn service_status_starts_unreachable() {
        let status = ServiceStatus::default();
        assert!(!status.reachable);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn stage_display_is_snake_case() {
        assert_eq!(PipelineStage::AwaitingTestCases.to_string(), "awaiting_test_cases");
        assert_eq!(PipelineStage::Idle.to_string(), "idle");
    }
}
