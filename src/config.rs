use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "CADENZA_CONFIG_PATH";
const ENV_WORKER_URL: &str = "CADENZA_WORKER_URL";
const ENV_OUTPUT_DIR: &str = "CADENZA_OUTPUT_DIR";
const ENV_MODEL_DIR: &str = "CADENZA_MODEL_DIR";

/// Application configuration, layered defaults → config file → environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    worker_url: Option<String>,
    output_dir: PathBuf,
    model_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = Self::default_config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create config directory {}", parent.display())
                })?;
            }
        }

        if let Some(path) = config_file_override()? {
            if path.exists() {
                let partial = read_partial(&path)?;
                config.apply_partial(partial);
            }
        } else {
            let path = Self::default_config_path()?;
            if path.exists() {
                let partial = read_partial(&path)?;
                config.apply_partial(partial);
            }
        }

        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn worker_url(&self) -> Option<&str> {
        self.worker_url.as_deref()
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "Cadenza", "Cadenza")
            .ok_or_else(|| anyhow!("unable to determine config directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(url) = partial.worker_url {
            self.worker_url = Some(url);
        }
        if let Some(dir) = partial.output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = partial.model_dir {
            self.model_dir = Some(dir);
        }
    }

    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(value) = get(ENV_WORKER_URL) {
            if value.trim().is_empty() {
                self.worker_url = None;
            } else {
                self.worker_url = Some(value);
            }
        }
        if let Some(value) = get(ENV_OUTPUT_DIR) {
            if !value.trim().is_empty() {
                self.output_dir = PathBuf::from(value);
            }
        }
        if let Some(value) = get(ENV_MODEL_DIR) {
            if !value.trim().is_empty() {
                self.model_dir = Some(PathBuf::from(value));
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_url: None,
            output_dir: default_output_dir(),
            model_dir: None,
        }
    }
}

fn config_file_override() -> Result<Option<PathBuf>> {
    if let Some(value) = env::var_os(ENV_CONFIG_PATH) {
        if value.is_empty() {
            return Ok(None);
        }
        let path = PathBuf::from(value);
        if path.is_file() {
            return Ok(Some(path));
        }
        if path.is_dir() {
            return Ok(Some(path.join(CONFIG_FILE_NAME)));
        }
        return Ok(Some(path));
    }
    Ok(None)
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let partial: PartialConfig =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(partial)
}

fn default_output_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join("Music").join("Cadenza"))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PartialConfig {
    worker_url: Option<String>,
    output_dir: Option<PathBuf>,
    model_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_values_override_defaults() {
        let mut config = AppConfig::default();
        let partial: PartialConfig = toml::from_str(
            r#"
            worker_url = "http://10.0.0.5:7865"
            model_dir = "/srv/models"
            "#,
        )
        .unwrap();
        config.apply_partial(partial);

        assert_eq!(config.worker_url(), Some("http://10.0.0.5:7865"));
        assert_eq!(config.model_dir(), Some(Path::new("/srv/models")));
    }

    #[test]
    fn env_overrides_file_and_blank_url_clears_it() {
        let mut config = AppConfig::default();
        config.apply_partial(PartialConfig {
            worker_url: Some("http://from-file:7865".into()),
            output_dir: None,
            model_dir: None,
        });

        let env: HashMap<&str, &str> =
            [(ENV_WORKER_URL, ""), (ENV_OUTPUT_DIR, "/tmp/renders")].into();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.worker_url(), None);
        assert_eq!(config.output_dir(), &PathBuf::from("/tmp/renders"));
    }
}
