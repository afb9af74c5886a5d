use crate::jobs::ToolBackend;
use crate::submit::GenerationBackend;
use crate::types::{
    GenerationRequest, ModelInfo, StemSplitSettings, SubmitAck, ToolJobKind, ToolJobStatus,
    TrainingSettings,
};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::future::Future;
use std::path::Path;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7865";

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let url = base_url
            .map(Url::parse)
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL))
            .context("invalid worker base URL")?;
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url: url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build URL for {path}"))
    }

    pub async fn submit(&self, request: &GenerationRequest) -> Result<SubmitAck> {
        let url = self.endpoint("generate")?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .context("generation submission failed")?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        response.json().await.context("failed to decode submission acknowledgement")
    }

    pub async fn models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("models")?;
        let response =
            self.http.get(url).send().await.context("model registry request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        response.json().await.context("failed to decode model registry")
    }

    pub async fn status(&self, kind: ToolJobKind) -> Result<ToolJobStatus> {
        let url = self.endpoint(&format!("{}/status", tool_path(kind)))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("{} status request failed", kind.label()))?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        response
            .json()
            .await
            .with_context(|| format!("failed to decode {} status", kind.label()))
    }

    pub async fn start_training(&self, settings: &TrainingSettings) -> Result<()> {
        let form = Form::new()
            .text("dataset_path", settings.dataset_path.clone())
            .text("experiment_name", settings.experiment_name.clone())
            .text("max_steps", settings.max_steps.to_string())
            .text("max_epochs", settings.max_epochs.to_string())
            .text("learning_rate", settings.learning_rate.to_string())
            .text("precision", precision_field(settings))
            .text("batch_size", settings.batch_size.to_string())
            .text("save_every_steps", settings.save_every_steps.to_string());
        self.post_form("training/start", form, "training start").await
    }

    pub async fn start_stem_split(&self, settings: &StemSplitSettings) -> Result<()> {
        let mut form = Form::new()
            .text("model_id", settings.model_id.clone())
            .text("format", format_field(settings));
        if let Some(dir) = &settings.output_dir {
            form = form.text("output_dir", dir.clone());
        }

        // Attach the audio when it is a readable local file; otherwise the
        // worker resolves the path on its side.
        let input = Path::new(&settings.input_path);
        if input.is_file() {
            let bytes = tokio::fs::read(input)
                .await
                .with_context(|| format!("failed to read {}", input.display()))?;
            let file_name = input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            form = form.part("file", Part::bytes(bytes).file_name(file_name));
        } else {
            form = form.text("input_path", settings.input_path.clone());
        }

        self.post_form("stem_split/start", form, "stem split start").await
    }

    pub async fn start_model_download(&self, model_id: &str) -> Result<()> {
        let url = self.endpoint("models/download")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "model_id": model_id }))
            .send()
            .await
            .context("model download request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        Ok(())
    }

    pub async fn cancel(&self, kind: ToolJobKind) -> Result<()> {
        self.post_empty(&format!("{}/cancel", tool_path(kind)), kind.label()).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.post_empty("training/pause", "training pause").await
    }

    pub async fn resume(&self) -> Result<()> {
        self.post_empty("training/resume", "training resume").await
    }

    async fn post_form(&self, path: &str, form: Form, what: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        Ok(())
    }

    async fn post_empty(&self, path: &str, what: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        if !response.status().is_success() {
            anyhow::bail!("worker responded with status {}", response.status());
        }
        Ok(())
    }
}

fn tool_path(kind: ToolJobKind) -> &'static str {
    match kind {
        ToolJobKind::Training => "training",
        ToolJobKind::StemSplit => "stem_split",
        ToolJobKind::ModelDownload => "models/download",
    }
}

fn precision_field(settings: &TrainingSettings) -> String {
    enum_text(&settings.precision)
}

fn format_field(settings: &StemSplitSettings) -> String {
    enum_text(&settings.format)
}

/// Multipart text fields reuse the serde names of the enums so the form and
/// the JSON payloads agree on spelling.
fn enum_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl GenerationBackend for Client {
    fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<SubmitAck>> + Send {
        let request = request.clone();
        async move { self.submit(&request).await }
    }

    fn installed_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>>> + Send {
        self.models()
    }
}

impl ToolBackend for Client {
    fn tool_status(
        &self,
        kind: ToolJobKind,
    ) -> impl Future<Output = Result<ToolJobStatus>> + Send {
        self.status(kind)
    }

    fn cancel_tool(&self, kind: ToolJobKind) -> impl Future<Output = Result<()>> + Send {
        self.cancel(kind)
    }

    fn pause_training(&self) -> impl Future<Output = Result<()>> + Send {
        self.pause()
    }

    fn resume_training(&self) -> impl Future<Output = Result<()>> + Send {
        self.resume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_paths_are_stable() {
        assert_eq!(tool_path(ToolJobKind::Training), "training");
        assert_eq!(tool_path(ToolJobKind::StemSplit), "stem_split");
        assert_eq!(tool_path(ToolJobKind::ModelDownload), "models/download");
    }

    #[test]
    fn enum_form_fields_use_serde_names() {
        let training = TrainingSettings::default();
        assert_eq!(precision_field(&training), "bf16");

        let split = StemSplitSettings::default();
        assert_eq!(format_field(&split), "flac");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(Client::new(Some("not a url")).is_err());
        assert!(Client::new(None).is_ok());
    }
}
