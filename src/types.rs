use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Text2Music,
    Audio2Audio,
    Cover,
    Repaint,
    Extend,
    Lego,
    Extract,
    Complete,
}

impl GenerationMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text2Music => "text2music",
            Self::Audio2Audio => "audio2audio",
            Self::Cover => "cover",
            Self::Repaint => "repaint",
            Self::Extend => "extend",
            Self::Lego => "lego",
            Self::Extract => "extract",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMethod {
    /// Deterministic ODE solver.
    Ode,
    /// Stochastic SDE solver.
    Sde,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Flac,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeSignature {
    #[serde(rename = "2/4")]
    TwoFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "5/4")]
    FiveFour,
    #[serde(rename = "6/8")]
    SixEight,
    #[serde(rename = "12/8")]
    TwelveEight,
}

/// Inference step bounds differ between the full and the distilled model
/// deployments, so the step control is clamped per profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProfile {
    Standard,
    Turbo,
}

impl ModelProfile {
    pub fn step_range(&self) -> (u16, u16) {
        match self {
            Self::Standard => (10, 200),
            Self::Turbo => (1, 20),
        }
    }

    pub fn default_steps(&self) -> u16 {
        match self {
            Self::Standard => 60,
            Self::Turbo => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Vocals,
    Guitar,
    Bass,
    Drums,
    Piano,
    Synth,
    Strings,
}

impl TrackType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vocals => "vocals",
            Self::Guitar => "guitar",
            Self::Bass => "bass",
            Self::Drums => "drums",
            Self::Piano => "piano",
            Self::Synth => "synth",
            Self::Strings => "strings",
        }
    }
}

/// Language-model refinement controls, present in the payload only when the
/// thinking feature is enabled for the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LmControls {
    pub temperature: f32,
    pub cfg_scale: f32,
    pub top_k: u16,
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub use_metadata_cot: bool,
    pub use_caption_cot: bool,
    pub use_language_cot: bool,
    pub allow_batched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterConfig {
    pub name: String,
    pub strength: f32,
}

/// Canonical generation payload. Fields that do not apply to the request's
/// mode are `None` and absent from the serialized object, so the worker never
/// sees stale values from a previously selected mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    pub instrumental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    pub duration_seconds: f32,
    pub inference_steps: u16,
    pub guidance_scale: f32,
    pub inference_method: InferenceMethod,
    pub shift: f32,
    pub seed: i64,
    pub random_seed: bool,
    pub batch_size: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_influence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaint_start: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repaint_end: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm: Option<LmControls>,
    pub audio_format: AudioFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<AdapterConfig>,
}

/// Worker acknowledgement for a submitted generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub family: String,
    #[serde(default)]
    pub installed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolJobKind {
    Training,
    StemSplit,
    ModelDownload,
}

impl ToolJobKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::StemSplit => "stem split",
            Self::ModelDownload => "model download",
        }
    }
}

/// Polled status payload for a long-running tool job. The worker reports
/// progress in one of three shapes depending on the tool; callers go through
/// [`ToolJobStatus::progress_fraction`] rather than reading fields directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolJobStatus {
    pub running: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_epoch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_epochs: Option<u32>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ToolJobStatus {
    /// Progress as a 0.0–1.0 fraction, preferring the most specific
    /// representation the worker supplied: an explicit fraction, then step
    /// counts, then epoch counts. `None` means indeterminate.
    pub fn progress_fraction(&self) -> Option<f32> {
        if let Some(progress) = self.progress {
            return Some(progress.clamp(0.0, 1.0));
        }
        if let (Some(step), Some(max)) = (self.current_step, self.max_steps) {
            if max > 0 {
                return Some((step as f32 / max as f32).clamp(0.0, 1.0));
            }
        }
        if let (Some(epoch), Some(max)) = (self.current_epoch, self.max_epochs) {
            if max > 0 {
                return Some((epoch as f32 / max as f32).clamp(0.0, 1.0));
            }
        }
        None
    }

    pub fn failure(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref() {
            return Some(error.to_string());
        }
        match self.returncode {
            Some(code) if code != 0 => Some(format!("exited with code {code}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Fp16,
    Bf16,
    Fp32,
}

/// Settings mirrored into the multipart training submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSettings {
    pub dataset_path: String,
    pub experiment_name: String,
    pub max_steps: u32,
    pub max_epochs: u32,
    pub learning_rate: f64,
    pub precision: Precision,
    pub batch_size: u8,
    pub save_every_steps: u32,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            dataset_path: String::new(),
            experiment_name: String::new(),
            max_steps: 2000,
            max_epochs: 10,
            learning_rate: 1e-4,
            precision: Precision::Bf16,
            batch_size: 1,
            save_every_steps: 500,
        }
    }
}

/// Settings mirrored into the multipart stem-split submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StemSplitSettings {
    pub input_path: String,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    pub format: AudioFormat,
}

impl Default for StemSplitSettings {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            model_id: "htdemucs".into(),
            output_dir: None,
            format: AudioFormat::Flac,
        }
    }
}
