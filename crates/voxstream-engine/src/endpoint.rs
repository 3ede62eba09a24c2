//! Utterance endpoint detection from decoder progress.

use voxstream_core::EndpointConfig;

// Step counts convert to seconds in f32; absorb the rounding.
const TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointRule {
    /// Only fire once the utterance has produced at least one token.
    pub must_contain_nonsilence: bool,
    /// Seconds of trailing blank decoding required.
    pub min_trailing_silence: f32,
    /// Seconds of decoded audio required.
    pub min_utterance_length: f32,
}

impl EndpointRule {
    pub fn is_active(
        &self,
        contains_nonsilence: bool,
        trailing_silence: f32,
        utterance_length: f32,
    ) -> bool {
        (contains_nonsilence || !self.must_contain_nonsilence)
            && trailing_silence + TOLERANCE >= self.min_trailing_silence
            && utterance_length + TOLERANCE >= self.min_utterance_length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpointer {
    enabled: bool,
    rules: [EndpointRule; 3],
}

impl Endpointer {
    pub fn new(config: &EndpointConfig) -> Self {
        Self {
            enabled: config.enable,
            rules: [
                // long silence, even if nothing was said
                EndpointRule {
                    must_contain_nonsilence: false,
                    min_trailing_silence: config.rule1_min_trailing_silence,
                    min_utterance_length: 0.0,
                },
                // shorter silence after speech
                EndpointRule {
                    must_contain_nonsilence: true,
                    min_trailing_silence: config.rule2_min_trailing_silence,
                    min_utterance_length: 0.0,
                },
                // utterance too long
                EndpointRule {
                    must_contain_nonsilence: false,
                    min_trailing_silence: 0.0,
                    min_utterance_length: config.rule3_min_utterance_length,
                },
            ],
        }
    }

    pub fn disabled() -> Self {
        Self::new(&EndpointConfig {
            enable: false,
            ..Default::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Seconds are derived from decode steps: `steps * window / rate`.
    pub fn is_endpoint(
        &self,
        contains_nonsilence: bool,
        trailing_blank_steps: usize,
        utterance_steps: u64,
        window: usize,
        sample_rate: u32,
    ) -> bool {
        if !self.enabled || sample_rate == 0 {
            return false;
        }
        let step_secs = window as f32 / sample_rate as f32;
        let trailing_silence = trailing_blank_steps as f32 * step_secs;
        let utterance_length = utterance_steps as f32 * step_secs;
        self.rules
            .iter()
            .any(|rule| rule.is_active(contains_nonsilence, trailing_silence, utterance_length))
    }
}

impl Default for Endpointer {
    fn default() -> Self {
        Self::new(&EndpointConfig::default())
    }
}
