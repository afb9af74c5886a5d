use crate::types::{AudioFormat, StemSplitSettings, TrainingSettings};
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const PREFS_FILE: &str = "prefs.json";

const MIN_ZOOM_PERCENT: u16 = 50;
const MAX_ZOOM_PERCENT: u16 = 200;
const DEFAULT_ZOOM_PERCENT: u16 = 100;

/// Remembered UI preferences, mirrored to disk between sessions. Restore is
/// lenient: unknown keys are ignored and out-of-range values are clamped, so
/// an old or hand-edited file never blocks startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    pub zoom_percent: u16,
    pub dit_model_id: Option<String>,
    pub lm_model_id: Option<String>,
    pub audio_format: AudioFormat,
    pub training: TrainingSettings,
    pub stem_split: StemSplitSettings,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            dit_model_id: None,
            lm_model_id: None,
            audio_format: AudioFormat::Flac,
            training: TrainingSettings::default(),
            stem_split: StemSplitSettings::default(),
        }
    }
}

impl UiPrefs {
    pub fn sanitize(&mut self) {
        self.zoom_percent = self.zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
    }
}

fn prefs_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "Cadenza", "Cadenza")
        .ok_or_else(|| anyhow!("unable to determine config directory"))?;
    let path = dirs.config_dir().join(PREFS_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    Ok(path)
}

pub fn load_prefs() -> Result<UiPrefs> {
    let path = prefs_path()?;
    if !path.exists() {
        return Ok(UiPrefs::default());
    }
    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read preferences at {}", path.display()))?;
    let mut prefs: UiPrefs = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse preferences {}", path.display()))?;
    prefs.sanitize();
    Ok(prefs)
}

pub fn save_prefs(prefs: &UiPrefs) -> Result<()> {
    let path = prefs_path()?;
    let data = serde_json::to_string_pretty(prefs).context("failed to encode preferences")?;
    fs::write(&path, data)
        .with_context(|| format!("failed to write preferences to {}", path.display()))
}
