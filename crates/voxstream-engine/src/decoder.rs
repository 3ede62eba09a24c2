use crate::model::StreamingModel;
use voxstream_core::{Hypothesis, RecognitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Idle,
    Stepping,
    Flushed,
}

/// Pull-based wrapper around a [`StreamingModel`].
///
/// Callers feed exactly [`required_chunk_size`](Self::required_chunk_size)
/// samples per [`step`](Self::step); the last, possibly short, window goes
/// through [`flush`](Self::flush), after which the machine is read-only.
pub struct DecodeStateMachine {
    model: Box<dyn StreamingModel>,
    state: DecoderState,
    window: usize,
    scratch: Vec<f32>,
    steps_since_reset: u64,
    total_steps: u64,
}

impl DecodeStateMachine {
    pub fn new(model: Box<dyn StreamingModel>) -> Self {
        let window = model.chunk_size();
        debug_assert!(window > 0, "model '{}' has an empty decode window", model.name());
        Self {
            model,
            state: DecoderState::Idle,
            window,
            scratch: Vec::with_capacity(window),
            steps_since_reset: 0,
            total_steps: 0,
        }
    }

    pub fn required_chunk_size(&self) -> usize {
        self.window
    }

    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn steps_since_reset(&self) -> u64 {
        self.steps_since_reset
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn step(&mut self, samples: &[f32]) -> Result<Hypothesis, RecognitionError> {
        if self.state == DecoderState::Flushed {
            return Err(RecognitionError::SessionFinished);
        }
        if samples.len() != self.window {
            return Err(RecognitionError::ChunkSize {
                expected: self.window,
                actual: samples.len(),
            });
        }
        self.advance(samples)
    }

    /// Decode the tail of the stream, zero-padded to one window.
    pub fn flush(&mut self, remaining: &[f32]) -> Result<Hypothesis, RecognitionError> {
        if self.state == DecoderState::Flushed {
            return Err(RecognitionError::SessionFinished);
        }
        if remaining.len() > self.window {
            return Err(RecognitionError::ChunkSize {
                expected: self.window,
                actual: remaining.len(),
            });
        }

        let mut padded = std::mem::take(&mut self.scratch);
        padded.clear();
        padded.extend_from_slice(remaining);
        padded.resize(self.window, 0.0);
        tracing::debug!(
            tail = remaining.len(),
            padding = self.window - remaining.len(),
            "flushing decoder"
        );

        let result = self.advance(&padded);
        self.scratch = padded;
        self.state = DecoderState::Flushed;
        result
    }

    pub fn reset(&mut self) -> Result<(), RecognitionError> {
        if self.state == DecoderState::Flushed {
            return Err(RecognitionError::SessionFinished);
        }
        self.model.reset();
        self.state = DecoderState::Idle;
        self.steps_since_reset = 0;
        Ok(())
    }

    fn advance(&mut self, window: &[f32]) -> Result<Hypothesis, RecognitionError> {
        let hypothesis = self.model.decode_step(window)?;
        self.state = DecoderState::Stepping;
        self.steps_since_reset += 1;
        self.total_steps += 1;
        Ok(hypothesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_model::NullModel;

    fn machine(window: usize) -> DecodeStateMachine {
        DecodeStateMachine::new(Box::new(NullModel::new(16000, window, 0.01)))
    }

    #[test]
    fn test_starts_idle_with_model_window() {
        let m = machine(1600);
        assert_eq!(m.state(), DecoderState::Idle);
        assert_eq!(m.required_chunk_size(), 1600);
        assert_eq!(m.sample_rate(), 16000);
        assert_eq!(m.model_name(), "null");
    }

    #[test]
    fn test_step_moves_to_stepping() {
        let mut m = machine(4);
        m.step(&[0.5; 4]).unwrap();
        assert_eq!(m.state(), DecoderState::Stepping);
        assert_eq!(m.total_steps(), 1);
    }

    #[test]
    fn test_step_rejects_wrong_length() {
        let mut m = machine(4);
        assert_eq!(
            m.step(&[0.0; 5]),
            Err(RecognitionError::ChunkSize {
                expected: 4,
                actual: 5
            })
        );
        assert_eq!(m.state(), DecoderState::Idle);
        assert_eq!(m.total_steps(), 0);
    }

    #[test]
    fn test_flush_pads_short_tail() {
        let mut m = machine(4);
        // 0.9 over a single sample, padded with three zeros: rms 0.45 -> level 5
        let hyp = m.flush(&[0.9]).unwrap();
        assert_eq!(hyp.tokens.len(), 1);
        assert_eq!(hyp.tokens[0].id, 5);
        assert_eq!(m.state(), DecoderState::Flushed);
        assert_eq!(m.total_steps(), 1);
    }

    #[test]
    fn test_flush_with_no_samples_still_steps() {
        let mut m = machine(4);
        let hyp = m.flush(&[]).unwrap();
        assert!(hyp.tokens.is_empty());
        assert_eq!(m.total_steps(), 1);
    }

    #[test]
    fn test_flush_rejects_more_than_one_window() {
        let mut m = machine(4);
        assert!(matches!(
            m.flush(&[0.0; 5]),
            Err(RecognitionError::ChunkSize { .. })
        ));
        assert_eq!(m.state(), DecoderState::Idle);
    }

    #[test]
    fn test_after_flush_everything_is_finished() {
        let mut m = machine(4);
        m.flush(&[]).unwrap();
        assert_eq!(m.step(&[0.0; 4]), Err(RecognitionError::SessionFinished));
        assert_eq!(m.flush(&[]), Err(RecognitionError::SessionFinished));
        assert_eq!(m.reset(), Err(RecognitionError::SessionFinished));
        assert_eq!(m.total_steps(), 1);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut m = machine(4);
        m.step(&[0.9; 4]).unwrap();
        m.step(&[0.9; 4]).unwrap();
        assert_eq!(m.steps_since_reset(), 2);
        m.reset().unwrap();
        assert_eq!(m.state(), DecoderState::Idle);
        assert_eq!(m.steps_since_reset(), 0);
        assert_eq!(m.total_steps(), 2);
        let hyp = m.step(&[0.0; 4]).unwrap();
        assert!(hyp.tokens.is_empty());
    }
}
