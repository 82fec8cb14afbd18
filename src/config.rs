use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no cameras configured")]
    NoCameras,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub id: String,
    /// Device index ("0") or stream URL / file path.
    pub source: String,
}

fn default_http_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

fn default_top_k() -> usize {
    2
}

fn default_input_size() -> u32 {
    224
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub model_path: String,
    pub labels_path: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The live daemon needs at least one camera; one-shot
    /// classification does not.
    pub fn require_cameras(&self) -> Result<(), ConfigError> {
        if self.cameras.is_empty() {
            return Err(ConfigError::NoCameras);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str(
            r#"
            [classifier]
            model_path = "model.onnx"
            labels_path = "labels.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.classifier.top_k, 2);
        assert_eq!(config.classifier.input_size, 224);
        assert!(config.cameras.is_empty());
        assert!(matches!(
            config.require_cameras(),
            Err(ConfigError::NoCameras)
        ));
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [http]
            port = 9000

            [classifier]
            model_path = "model.onnx"
            labels_path = "labels.txt"
            top_k = 5

            [[cameras]]
            id = "front"
            source = "0"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.classifier.top_k, 5);
        assert_eq!(config.cameras.len(), 1);
        assert_eq!(config.cameras[0].source, "0");
        assert!(config.require_cameras().is_ok());
    }
}
