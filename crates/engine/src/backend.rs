//! Generation backend seam.
//!
//! The engine chooses a code path by capability (text completion, vision
//! with an asset, audio transcription) and otherwise treats the backend
//! as opaque. [`GatewayBackend`] posts to an internal model gateway over
//! JSON; [`ScriptedBackend`] is the deterministic double used by tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quill_core::action::CapabilityType;
use quill_core::target::AssetInfo;

use crate::render::RenderedPrompt;

/// Failure from the generation backend. Captured by the worker into the
/// job's terminal `Failed` state; never retried by the engine.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Backend returned an unusable response: {0}")]
    BadResponse(String),
}

/// One generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub capability: CapabilityType,
    pub model: String,
    pub system: String,
    pub user: String,
    /// Input asset for vision and audio capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetInfo>,
    /// Requested output shape; `None` means free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(capability: CapabilityType, model: impl Into<String>, prompt: RenderedPrompt) -> Self {
        Self {
            capability,
            model: model.into(),
            system: prompt.system,
            user: prompt.user,
            asset: None,
            schema: prompt.schema,
        }
    }

    pub fn with_asset(mut self, asset: Option<AssetInfo>) -> Self {
        self.asset = asset;
        self
    }
}

/// Calls the external generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Produce free text or a structured object matching the requested
    /// schema. Errors are terminal for the calling job.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<serde_json::Value, BackendError>;
}

// ---------------------------------------------------------------------------
// HTTP gateway client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    output: serde_json::Value,
}

/// JSON client for the model gateway's `POST {base}/generate` endpoint.
///
/// The gateway owns provider selection and wire protocols; this client
/// only ships the request shape above and expects `{ "output": ... }`.
pub struct GatewayBackend {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerationBackend for GatewayBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/generate", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Request(format!(
                "gateway returned {status}: {body}"
            )));
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|e| BackendError::BadResponse(e.to_string()))?;

        if parsed.output.is_null() {
            return Err(BackendError::BadResponse("output was null".to_string()));
        }
        Ok(parsed.output)
    }
}

// ---------------------------------------------------------------------------
// Scripted test double
// ---------------------------------------------------------------------------

/// Deterministic backend for tests: pops pre-scripted outcomes in FIFO
/// order, failing with `BadResponse` when the script runs dry.
#[derive(Default)]
pub struct ScriptedBackend {
    script: std::sync::Mutex<std::collections::VecDeque<Result<serde_json::Value, String>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful generation result.
    pub fn push_ok(&self, value: serde_json::Value) {
        self.script.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a backend failure with the given message.
    pub fn push_err(&self, message: impl Into<String>) {
        self.script.lock().unwrap().push_back(Err(message.into()));
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<serde_json::Value, BackendError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(BackendError::Request(message)),
            None => Err(BackendError::BadResponse(
                "scripted backend exhausted".to_string(),
            )),
        }
    }
}
