use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to build stream: {0}")]
    StreamBuild(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum RecognitionError {
    #[error("invalid audio: {0}")]
    InvalidAudio(String),

    #[error("decode window mismatch: expected {expected} samples, got {actual}")]
    ChunkSize { expected: usize, actual: usize },

    #[error("session already finished")]
    SessionFinished,

    #[error("session aborted after a failed decode step")]
    SessionAborted,

    #[error("requested {requested} samples but only {available} buffered")]
    InsufficientData { requested: usize, available: usize },

    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("decode step failed: {0}")]
    DecodeFailed(String),
}
