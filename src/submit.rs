use crate::builder::{self, PanelState, SeedSource, ValidationError};
use crate::jobs::JobRegistry;
use crate::modes;
use crate::types::{GenerationRequest, ModelInfo, SubmitAck};
use std::future::Future;
use thiserror::Error;
use tracing::info;

/// The submission path's view of the worker. `api::Client` is the production
/// implementation; tests substitute an in-memory fake.
pub trait GenerationBackend: Send + Sync {
    fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = anyhow::Result<SubmitAck>> + Send;

    fn installed_models(&self) -> impl Future<Output = anyhow::Result<Vec<ModelInfo>>> + Send;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The selected mode runs on a model family that is not installed; the
    /// remediation is the model manager, not a retry.
    #[error("the {family} model family is not installed")]
    MissingModel { family: String },
    #[error("failed to reach the generation worker")]
    Transport(#[source] anyhow::Error),
}

/// Validates the panel, checks mode preconditions, builds the request set
/// and dispatches it in index order. The bulk counter is one-shot: it resets
/// as soon as the set is built, so a dispatch failure halfway through never
/// leaves a stale multiplier armed for the next submission.
pub async fn submit_batch<B: GenerationBackend>(
    backend: &B,
    state: &mut PanelState,
    seeds: &mut dyn SeedSource,
    registry: &mut JobRegistry,
) -> Result<Vec<SubmitAck>, SubmitError> {
    builder::validate(state)?;

    if modes::requires_base_model(state.mode) {
        ensure_base_model(backend).await?;
    }

    let requests = builder::build_batch(state, seeds)?;
    state.reset_bulk();

    let mut acks = Vec::with_capacity(requests.len());
    for request in requests {
        let ack = backend
            .submit_generation(&request)
            .await
            .map_err(SubmitError::Transport)?;
        info!(job_id = %ack.job_id, mode = request.mode.label(), "generation request accepted");
        registry.record(ack.clone(), request);
        acks.push(ack);
    }
    Ok(acks)
}

async fn ensure_base_model<B: GenerationBackend>(backend: &B) -> Result<(), SubmitError> {
    let models = backend.installed_models().await.map_err(SubmitError::Transport)?;
    let installed = models
        .iter()
        .any(|model| model.family == modes::BASE_MODEL_FAMILY && model.installed);
    if installed {
        Ok(())
    } else {
        Err(SubmitError::MissingModel { family: modes::BASE_MODEL_FAMILY.to_string() })
    }
}
