use crate::resample::LinearResampler;
use std::borrow::Cow;
use voxstream_core::RecognitionError;

// Consumed prefix is dropped once it grows past this many samples.
const COMPACT_THRESHOLD: usize = 16_384;

/// Mono samples at the canonical decode rate plus a read cursor.
///
/// Samples behind the cursor have been handed to the decoder and are never
/// returned again.
#[derive(Debug)]
pub struct SampleBuffer {
    canonical_rate: u32,
    samples: Vec<f32>,
    cursor: usize,
    resampler: Option<LinearResampler>,
}

impl SampleBuffer {
    pub fn new(canonical_rate: u32) -> Self {
        Self {
            canonical_rate,
            samples: Vec::new(),
            cursor: 0,
            resampler: None,
        }
    }

    pub fn canonical_rate(&self) -> u32 {
        self.canonical_rate
    }

    /// Admit an interleaved chunk. Only the first channel of each frame is
    /// kept; other channels are discarded, not mixed in. Returns the number of
    /// samples that became available.
    ///
    /// The buffer is left untouched when the chunk is rejected.
    pub fn append(
        &mut self,
        samples: &[f32],
        rate: u32,
        channels: u16,
    ) -> Result<usize, RecognitionError> {
        if samples.is_empty() {
            return Err(RecognitionError::InvalidAudio("empty chunk".to_string()));
        }
        if rate == 0 {
            return Err(RecognitionError::InvalidAudio(
                "sample rate must be positive".to_string(),
            ));
        }
        if channels == 0 {
            return Err(RecognitionError::InvalidAudio(
                "channel count must be positive".to_string(),
            ));
        }
        if samples.len() < channels as usize {
            return Err(RecognitionError::InvalidAudio(format!(
                "{} samples do not fill one {}-channel frame",
                samples.len(),
                channels
            )));
        }

        self.compact();
        let mono = first_channel(samples, channels);
        let before = self.samples.len();

        if rate == self.canonical_rate {
            self.close_resampler();
            self.samples.extend_from_slice(&mono);
        } else {
            if self.resampler.as_ref().map(|r| r.source_rate()) != Some(rate) {
                self.close_resampler();
                tracing::debug!(
                    from = rate,
                    to = self.canonical_rate,
                    "resampling input to canonical rate"
                );
                self.resampler = Some(LinearResampler::new(rate, self.canonical_rate));
            }
            if let Some(resampler) = self.resampler.as_mut() {
                let converted = resampler.process(&mono);
                self.samples.extend(converted);
            }
        }

        Ok(self.samples.len() - before)
    }

    pub fn available(&self) -> usize {
        self.samples.len() - self.cursor
    }

    /// Hand out the next `n` unconsumed samples and advance the cursor.
    pub fn consume(&mut self, n: usize) -> Result<&[f32], RecognitionError> {
        let available = self.available();
        if n > available {
            return Err(RecognitionError::InsufficientData {
                requested: n,
                available,
            });
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.samples[start..self.cursor])
    }

    /// Take everything that is left, including samples still held by the
    /// resampler.
    pub fn drain(&mut self) -> Vec<f32> {
        self.close_resampler();
        let rest = self.samples.split_off(self.cursor);
        self.samples.clear();
        self.cursor = 0;
        rest
    }

    fn close_resampler(&mut self) {
        if let Some(mut resampler) = self.resampler.take() {
            self.samples.extend(resampler.finish());
        }
    }

    fn compact(&mut self) {
        if self.cursor >= COMPACT_THRESHOLD {
            self.samples.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

fn first_channel(samples: &[f32], channels: u16) -> Cow<'_, [f32]> {
    if channels == 1 {
        return Cow::Borrowed(samples);
    }
    Cow::Owned(
        samples
            .chunks_exact(channels as usize)
            .map(|frame| frame[0])
            .collect(),
    )
}
