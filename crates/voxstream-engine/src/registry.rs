use crate::model::StreamingModel;
use crate::null_model::NullModel;
use std::collections::HashMap;
use voxstream_core::{ModelConfig, RecognitionError};

/// Builds a model for `sample_rate` from its configuration.
pub type ModelLoader = fn(&ModelConfig, u32) -> Result<Box<dyn StreamingModel>, RecognitionError>;

pub struct ModelRegistry {
    loaders: HashMap<String, ModelLoader>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            loaders: HashMap::new(),
        };
        registry.register("null", |config, sample_rate| {
            Ok(Box::new(NullModel::from_config(config, sample_rate)?))
        });
        registry
    }

    pub fn register(&mut self, name: &str, loader: ModelLoader) {
        self.loaders.insert(name.to_string(), loader);
    }

    /// Load the engine named by `config.engine`. Any failure is a
    /// [`RecognitionError::ModelLoad`].
    pub fn load(
        &self,
        config: &ModelConfig,
        sample_rate: u32,
    ) -> Result<Box<dyn StreamingModel>, RecognitionError> {
        let loader = self.loaders.get(&config.engine).ok_or_else(|| {
            RecognitionError::ModelLoad(format!("unknown engine: {}", config.engine))
        })?;
        let model = loader(config, sample_rate).map_err(|e| match e {
            RecognitionError::ModelLoad(_) => e,
            other => RecognitionError::ModelLoad(other.to_string()),
        })?;
        if model.sample_rate() == 0 {
            return Err(RecognitionError::ModelLoad(format!(
                "engine '{}' reports a zero sample rate",
                config.engine
            )));
        }
        if model.chunk_size() == 0 {
            return Err(RecognitionError::ModelLoad(format!(
                "engine '{}' reports an empty decode window",
                config.engine
            )));
        }
        tracing::info!(
            engine = %config.engine,
            sample_rate = model.sample_rate(),
            chunk_size = model.chunk_size(),
            num_threads = config.num_threads,
            "model loaded"
        );
        Ok(model)
    }

    pub fn list_engines(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.loaders.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
