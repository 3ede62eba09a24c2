pub mod decoder;
pub mod endpoint;
pub mod model;
pub mod null_model;
pub mod registry;

pub use decoder::{DecodeStateMachine, DecoderState};
pub use endpoint::{EndpointRule, Endpointer};
pub use model::StreamingModel;
pub use null_model::NullModel;
pub use registry::{ModelLoader, ModelRegistry};
