use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub renderer: RendererConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Canonical decode rate; every chunk is normalized to it.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_feed_chunk_secs")]
    pub feed_chunk_secs: f32,

    #[serde(default = "default_tail_padding_secs")]
    pub tail_padding_secs: f32,

    #[serde(default = "default_true")]
    pub endpoint_reset: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            feed_chunk_secs: default_feed_chunk_secs(),
            tail_padding_secs: default_tail_padding_secs(),
            endpoint_reset: default_true(),
        }
    }
}

/// Model selection. Keys other than `engine` and `num_threads` are passed to
/// the engine loader untouched.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_num_threads")]
    pub num_threads: u32,

    #[serde(flatten)]
    pub extra: toml::Value,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            num_threads: default_num_threads(),
            extra: toml::Value::Table(Default::default()),
        }
    }
}

impl ModelConfig {
    pub fn named(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style helper for engine-specific keys.
    pub fn with_extra(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        if let Some(table) = self.extra.as_table_mut() {
            table.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn extra_integer(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(|v| v.as_integer())
    }

    pub fn extra_float(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(|v| {
            v.as_float()
                .or_else(|| v.as_integer().map(|i| i as f64))
        })
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    #[serde(default = "default_true")]
    pub enable: bool,

    #[serde(default = "default_rule1_silence")]
    pub rule1_min_trailing_silence: f32,

    #[serde(default = "default_rule2_silence")]
    pub rule2_min_trailing_silence: f32,

    #[serde(default = "default_rule3_utterance")]
    pub rule3_min_utterance_length: f32,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            enable: default_true(),
            rule1_min_trailing_silence: default_rule1_silence(),
            rule2_min_trailing_silence: default_rule2_silence(),
            rule3_min_utterance_length: default_rule3_utterance(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RendererConfig {
    #[serde(default)]
    pub normalize_digits: bool,

    #[serde(default)]
    pub lowercase: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_feed_chunk_secs() -> f32 {
    0.1
}

fn default_tail_padding_secs() -> f32 {
    0.5
}

fn default_engine() -> String {
    "null".to_string()
}

fn default_num_threads() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_rule1_silence() -> f32 {
    2.4
}

fn default_rule2_silence() -> f32 {
    1.2
}

fn default_rule3_utterance() -> f32 {
    20.0
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");
    let mut result = input.to_string();
    let mut errors = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                errors.push(var_name.to_string());
            }
        }
    }

    if let Some(first_missing) = errors.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound(first_missing));
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), engine = %config.model.engine, "config loaded");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.sample_rate == 0 {
            return Err(ConfigError::Invalid(
                "session.sample_rate must be positive".to_string(),
            ));
        }
        if self.session.feed_chunk_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "session.feed_chunk_secs must be positive".to_string(),
            ));
        }
        if self.session.tail_padding_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "session.tail_padding_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
