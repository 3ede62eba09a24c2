use crate::model::StreamingModel;
use voxstream_core::{Hypothesis, ModelConfig, RecognitionError, Token};

pub const DEFAULT_CHUNK_SAMPLES: usize = 1600;
pub const DEFAULT_THRESHOLD: f32 = 0.01;

const VOCAB: [&str; 10] = [
    "<blk>", "▁ONE", "▁TWO", "▁THREE", "▁FOUR", "▁FIVE", "▁SIX", "▁SEVEN", "▁EIGHT",
    "▁NINE",
];

/// Deterministic stand-in recognizer.
///
/// Every window below `threshold` RMS decodes to blank. A louder window emits
/// the token for its loudness level (1..=9); a level repeated without a blank
/// in between is collapsed.
pub struct NullModel {
    sample_rate: u32,
    chunk_size: usize,
    threshold: f32,
    tokens: Vec<Token>,
    score: f32,
    trailing_blanks: usize,
    last_level: Option<u32>,
    steps: u64,
}

impl NullModel {
    pub fn new(sample_rate: u32, chunk_size: usize, threshold: f32) -> Self {
        Self {
            sample_rate,
            chunk_size,
            threshold,
            tokens: Vec::new(),
            score: 0.0,
            trailing_blanks: 0,
            last_level: None,
            steps: 0,
        }
    }

    pub fn from_config(config: &ModelConfig, sample_rate: u32) -> Result<Self, RecognitionError> {
        let chunk_size = match config.extra_integer("chunk_samples") {
            Some(n) if n > 0 => n as usize,
            Some(n) => {
                return Err(RecognitionError::ModelLoad(format!(
                    "chunk_samples must be positive, got {n}"
                )))
            }
            None => DEFAULT_CHUNK_SAMPLES,
        };
        let threshold = match config.extra_float("threshold") {
            Some(t) if t >= 0.0 => t as f32,
            Some(t) => {
                return Err(RecognitionError::ModelLoad(format!(
                    "threshold must not be negative, got {t}"
                )))
            }
            None => DEFAULT_THRESHOLD,
        };
        Ok(Self::new(sample_rate, chunk_size, threshold))
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Loudness level a window decodes to, or `None` for blank.
    pub fn level_for(samples: &[f32], threshold: f32) -> Option<u32> {
        let rms = rms(samples);
        if rms < threshold {
            return None;
        }
        Some(((rms * 9.0).ceil() as u32).clamp(1, 9))
    }

    pub fn symbol(level: u32) -> &'static str {
        VOCAB.get(level as usize).copied().unwrap_or(VOCAB[0])
    }
}

impl StreamingModel for NullModel {
    fn name(&self) -> &str {
        "null"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn decode_step(&mut self, samples: &[f32]) -> Result<Hypothesis, RecognitionError> {
        if samples.len() != self.chunk_size {
            return Err(RecognitionError::ChunkSize {
                expected: self.chunk_size,
                actual: samples.len(),
            });
        }
        self.steps += 1;

        match Self::level_for(samples, self.threshold) {
            None => {
                self.trailing_blanks += 1;
                self.last_level = None;
            }
            Some(level) => {
                if self.last_level != Some(level) {
                    self.tokens.push(Token::new(level, Self::symbol(level)));
                }
                self.last_level = Some(level);
                self.trailing_blanks = 0;
                self.score += rms(samples);
            }
        }

        tracing::trace!(
            step = self.steps,
            tokens = self.tokens.len(),
            trailing_blanks = self.trailing_blanks,
            "null model step"
        );

        Ok(Hypothesis {
            tokens: self.tokens.clone(),
            score: self.score,
            num_trailing_blanks: self.trailing_blanks,
        })
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.score = 0.0;
        self.trailing_blanks = 0;
        self.last_level = None;
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
