/// Interleaved audio as delivered by a caller, before channel selection and
/// resampling.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Number of whole frames in the chunk.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: u32,
    pub symbol: String,
}

impl Token {
    pub fn new(id: u32, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
        }
    }
}

/// Current best decoding. Each decode step hands back a full replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hypothesis {
    pub tokens: Vec<Token>,
    pub score: f32,
    /// Trailing decode steps that produced no token.
    pub num_trailing_blanks: usize,
}

impl Hypothesis {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Finished,
    /// A decode step failed; model state can no longer be trusted.
    Aborted,
}

#[derive(Debug, Clone)]
pub struct RecognitionResult {
    pub stream_id: String,
    pub text: String,
    pub is_final: bool,
    pub utterance: u32,
}
