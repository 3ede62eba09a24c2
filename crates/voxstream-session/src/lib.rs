pub mod host;
pub mod render;
pub mod session;
pub mod transcript;

pub use host::{SessionHost, StreamInput};
pub use render::{SymbolRenderer, TextRenderer};
pub use session::RecognitionSession;
pub use transcript::TranscriptAccumulator;
