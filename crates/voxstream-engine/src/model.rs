use voxstream_core::{Hypothesis, RecognitionError};

/// A loaded streaming recognizer together with its recurrent decode state.
///
/// The state is owned by the implementation and never exposed; callers only
/// push fixed-size windows through [`decode_step`](Self::decode_step).
/// Dropping the model releases it.
pub trait StreamingModel: Send {
    fn name(&self) -> &str;

    /// Rate the model decodes at.
    fn sample_rate(&self) -> u32;

    /// Exact number of samples one decode step consumes.
    fn chunk_size(&self) -> usize;

    /// Advance the decode state by one window and return the current best
    /// hypothesis for the whole utterance so far.
    fn decode_step(&mut self, samples: &[f32]) -> Result<Hypothesis, RecognitionError>;

    /// Start a new utterance.
    fn reset(&mut self);
}
