pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, EndpointConfig, GeneralConfig, ModelConfig, RendererConfig, SessionConfig,
};
pub use error::{AudioError, ConfigError, RecognitionError};
pub use types::{AudioChunk, Hypothesis, RecognitionResult, SessionState, Token};

pub type Result<T> = std::result::Result<T, RecognitionError>;
