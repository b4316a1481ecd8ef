//! Pipeline controller
//!
//! Sequences one requirement submission through its stages: expand into
//! test cases, generate the component, persist it, force the preview to
//! remount, capture, evaluate. Every stage failure is caught here and
//! reported; nothing escapes the controller uncaught.

use livecoder_common::{Error, MountOutcome, PipelineStage, Result, RunReport, ServiceKind};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::artifact::ArtifactStoreClient;
use crate::config::ControllerConfig;
use crate::extract;
use crate::health::HealthMonitor;
use crate::services::GenerationClient;
use crate::store::TestCaseStore;
use crate::view::PreviewSurface;

/// Per-run snapshot threaded from code generation through evaluation.
///
/// The checklist captured here is what the artifact was generated from;
/// evaluation must use it verbatim, shielding the verdict from any store
/// edits made while the run was in flight.
struct RunContext {
    run_id: String,
    requirement: String,
    checklist: String,
}

/// Drives the generation-render-capture-evaluate pipeline
pub struct PipelineController {
    config: ControllerConfig,
    health: HealthMonitor,
    store: Arc<RwLock<TestCaseStore>>,
    generation: GenerationClient,
    artifacts: ArtifactStoreClient,
    surface: Arc<dyn PreviewSurface>,
    stage_tx: watch::Sender<PipelineStage>,
    /// One run at a time; a submission while a run is in flight is rejected
    run_guard: tokio::sync::Mutex<()>,
}

impl PipelineController {
    pub fn new(
        config: ControllerConfig,
        health: HealthMonitor,
        store: Arc<RwLock<TestCaseStore>>,
        surface: Arc<dyn PreviewSurface>,
    ) -> Self {
        let generation = GenerationClient::new(config.generation.base_url.clone());
        let artifacts = ArtifactStoreClient::new(config.artifact_store.base_url.clone());
        let (stage_tx, _) = watch::channel(PipelineStage::Idle);

        Self {
            config,
            health,
            store,
            generation,
            artifacts,
            surface,
            stage_tx,
            run_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Observe stage transitions
    pub fn stage(&self) -> watch::Receiver<PipelineStage> {
        self.stage_tx.subscribe()
    }

    pub fn store(&self) -> &Arc<RwLock<TestCaseStore>> {
        &self.store
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Reset the artifact to the placeholder component so the preview
    /// starts from a known state
    pub async fn reset_artifact(&self) -> Result<()> {
        self.artifacts
            .reset_component(&self.config.artifact_store.component_path)
            .await
    }

    /// Run one requirement through the whole pipeline.
    ///
    /// Rejected with `Error::Busy` while another run is in flight; a stage
    /// always runs to completion before the controller returns to idle.
    pub async fn submit(&self, requirement: &str) -> Result<RunReport> {
        let _guard = self.run_guard.try_lock().map_err(|_| Error::Busy)?;

        let result = self.run(requirement).await;
        match &result {
            Ok(report) => {
                info!(
                    run_id = %report.run_id,
                    duration_ms = report.duration_ms,
                    "pipeline run complete"
                );
                self.transition(PipelineStage::Idle);
            }
            Err(e) => {
                error!(error = %e, "pipeline run failed");
                self.transition(PipelineStage::Failed);
                self.transition(PipelineStage::Idle);
            }
        }
        result
    }

    async fn run(&self, requirement: &str) -> Result<RunReport> {
        let started_at = chrono::Utc::now();
        let started = Instant::now();

        // Submission gate: no network call unless both preconditions hold.
        let requirement = requirement.trim();
        if requirement.is_empty() {
            return Err(Error::Validation("requirement must not be empty".into()));
        }
        if !self.health.is_reachable(ServiceKind::Generation) {
            self.health.spawn_check(ServiceKind::Generation);
            return Err(Error::Connectivity {
                service: ServiceKind::Generation,
                reason: "not reachable; submission blocked".into(),
            });
        }

        self.transition(PipelineStage::AwaitingTestCases);
        let body = self
            .guarded(ServiceKind::Generation, self.generation.test_cases(requirement))
            .await?;

        // Append, then snapshot the post-append concatenation: generated
        // code must satisfy the full accumulated checklist, not only the
        // newest batch.
        let (test_case_ids, checklist) = {
            let mut store = self.store.write();
            let ids = store.add_many(&body);
            (ids, store.concatenate())
        };
        info!(appended = test_case_ids.len(), "test cases added");

        let ctx = RunContext {
            run_id: Uuid::new_v4().to_string(),
            requirement: requirement.to_string(),
            checklist,
        };

        self.transition(PipelineStage::AwaitingArtifact);
        let response = self
            .guarded(ServiceKind::Generation, self.generation.react_code(&ctx.checklist))
            .await?;
        let source = extract::first_code_block(&response)?;

        self.transition(PipelineStage::Persisting);
        let artifact_path = self.config.artifact_store.component_path.clone();
        self.guarded(
            ServiceKind::ArtifactStore,
            self.artifacts.write_file(&artifact_path, &source),
        )
        .await?;

        self.transition(PipelineStage::Remounting);
        self.remount().await?;

        self.transition(PipelineStage::Capturing);
        let image = self.surface.capture().await?;
        let screenshot = self
            .guarded(
                ServiceKind::ArtifactStore,
                self.artifacts.save_screenshot(&image),
            )
            .await?;

        self.transition(PipelineStage::Evaluating);
        // The snapshot from code generation, never a fresh store read.
        let verdict = match self
            .guarded(
                ServiceKind::Generation,
                self.generation.evaluate(&ctx.checklist, &screenshot.path),
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => return Err(Error::Evaluation(e.to_string())),
        };

        Ok(RunReport {
            run_id: ctx.run_id,
            started_at,
            requirement: ctx.requirement,
            test_case_ids,
            checklist: ctx.checklist,
            artifact_path,
            screenshot,
            verdict,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Force the preview to reload the artifact: flip the view mode off and
    /// back on with a short delay between, then wait for the mount signal
    /// with the settle delay as the fallback upper bound.
    async fn remount(&self) -> Result<()> {
        let original = self.surface.mode();
        let flipped = original.flipped();

        self.surface.set_mode(flipped).await?;
        tokio::time::sleep(self.config.timing.remount_flip()).await;
        self.surface.set_mode(original).await?;

        match self
            .surface
            .wait_mounted(self.config.timing.capture_settle())
            .await
        {
            MountOutcome::Mounted => {
                debug!("artifact mount signal received");
            }
            MountOutcome::FallbackElapsed => {
                warn!("no mount signal; capturing after settle delay");
            }
        }

        Ok(())
    }

    /// Run a service call; connectivity failures flip the reachability flag
    /// and trigger an out-of-band re-check before propagating.
    async fn guarded<T>(
        &self,
        service: ServiceKind,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match call.await {
            Err(e) if e.is_connectivity() => {
                if let Error::Connectivity { reason, .. } = &e {
                    self.health.mark_unreachable(service, reason);
                }
                self.health.spawn_check(service);
                Err(e)
            }
            other => other,
        }
    }

    fn transition(&self, stage: PipelineStage) {
        debug!(%stage, "pipeline stage");
        let _ = self.stage_tx.send(stage);
    }
}

impl std::fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("stage", &*self.stage_tx.borrow())
            .finish_non_exhaustive()
    }
}
