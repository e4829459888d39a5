//! Application state.

use std::sync::Arc;

use frameqa_inference::{InferenceError, InferenceService, OllamaClient};
use frameqa_media::{FfmpegFrameSource, FrameSource};
use frameqa_pipeline::{AnalysisOrchestrator, PipelineConfig, SessionTracker};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub tracker: Arc<SessionTracker>,
    pub orchestrator: AnalysisOrchestrator,
    pub inference: Arc<dyn InferenceService>,
}

impl AppState {
    /// Create application state wired to ffmpeg and the configured inference service.
    pub fn new(config: ApiConfig) -> Result<Self, InferenceError> {
        let inference: Arc<dyn InferenceService> = Arc::new(OllamaClient::from_env()?);
        let frames: Arc<dyn FrameSource> = Arc::new(FfmpegFrameSource::from_env());

        Ok(Self::with_backends(
            config,
            PipelineConfig::from_env(),
            frames,
            inference,
        ))
    }

    /// Create application state over explicit backends.
    pub fn with_backends(
        config: ApiConfig,
        pipeline: PipelineConfig,
        frames: Arc<dyn FrameSource>,
        inference: Arc<dyn InferenceService>,
    ) -> Self {
        let tracker = Arc::new(SessionTracker::new());
        let orchestrator = AnalysisOrchestrator::new(
            Arc::clone(&tracker),
            frames,
            Arc::clone(&inference),
            pipeline,
        );

        Self {
            config,
            tracker,
            orchestrator,
            inference,
        }
    }

    /// Storage locations used by the pipeline.
    pub fn pipeline(&self) -> &PipelineConfig {
        self.orchestrator.config()
    }
}
