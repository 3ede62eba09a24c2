use crate::render::{SymbolRenderer, TextRenderer};
use crate::transcript::TranscriptAccumulator;
use std::sync::Arc;
use voxstream_audio::SampleBuffer;
use voxstream_core::{AppConfig, AudioChunk, RecognitionError, Result, SessionState};
use voxstream_engine::{DecodeStateMachine, Endpointer, ModelRegistry, StreamingModel};

/// One recognition stream: audio in, transcript out.
///
/// Decode steps run only when the buffer holds a full model window, so the
/// final transcript does not depend on how the input was chunked. After
/// [`finish`](Self::finish) the session is read-only.
pub struct RecognitionSession {
    buffer: SampleBuffer,
    decoder: DecodeStateMachine,
    transcript: TranscriptAccumulator,
    endpointer: Endpointer,
    state: SessionState,
    utterance: u32,
}

impl RecognitionSession {
    pub fn new(
        model: Box<dyn StreamingModel>,
        renderer: Arc<dyn TextRenderer>,
        endpointer: Endpointer,
    ) -> Self {
        let decoder = DecodeStateMachine::new(model);
        tracing::info!(
            model = decoder.model_name(),
            sample_rate = decoder.sample_rate(),
            window = decoder.required_chunk_size(),
            "recognition session opened"
        );
        Self {
            buffer: SampleBuffer::new(decoder.sample_rate()),
            decoder,
            transcript: TranscriptAccumulator::new(renderer),
            endpointer,
            state: SessionState::Open,
            utterance: 0,
        }
    }

    pub fn from_config(config: &AppConfig, registry: &ModelRegistry) -> Result<Self> {
        let model = registry.load(&config.model, config.session.sample_rate)?;
        Ok(Self::new(
            model,
            Arc::new(SymbolRenderer::new(&config.renderer)),
            Endpointer::new(&config.endpoint),
        ))
    }

    /// Mono convenience over [`accept_chunk`](Self::accept_chunk).
    pub fn accept_waveform(&mut self, sample_rate: u32, samples: &[f32]) -> Result<usize> {
        self.accept(samples, sample_rate, 1)
    }

    /// Buffer a chunk and run every decode step it completes. Returns the
    /// number of steps performed.
    pub fn accept_chunk(&mut self, chunk: &AudioChunk) -> Result<usize> {
        self.accept(&chunk.samples, chunk.sample_rate, chunk.channels)
    }

    fn accept(&mut self, samples: &[f32], rate: u32, channels: u16) -> Result<usize> {
        self.ensure_open()?;
        self.buffer.append(samples, rate, channels)?;

        let window = self.decoder.required_chunk_size();
        let mut steps = 0;
        while self.buffer.available() >= window {
            let stepped = match self.buffer.consume(window) {
                Ok(samples) => self.decoder.step(samples),
                Err(e) => Err(e),
            };
            match stepped {
                Ok(hypothesis) => self.transcript.update(hypothesis),
                Err(e) => return Err(self.abort(e)),
            }
            steps += 1;
        }
        Ok(steps)
    }

    /// Decode whatever is buffered, padded with silence, and freeze the
    /// transcript. Calling it again does nothing.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            SessionState::Finished => return Ok(()),
            SessionState::Aborted => return Err(RecognitionError::SessionAborted),
            SessionState::Open => {}
        }

        let rest = self.buffer.drain();
        let window = self.decoder.required_chunk_size();

        // The resampler tail can push the remainder past one window.
        let mut offset = 0;
        while rest.len() - offset > window {
            match self.decoder.step(&rest[offset..offset + window]) {
                Ok(hypothesis) => self.transcript.update(hypothesis),
                Err(e) => return Err(self.abort(e)),
            }
            offset += window;
        }

        self.transcript.mark_flushed();
        match self.decoder.flush(&rest[offset..]) {
            Ok(hypothesis) => self.transcript.update(hypothesis),
            Err(e) => return Err(self.abort(e)),
        }

        self.state = SessionState::Finished;
        tracing::info!(
            steps = self.decoder.total_steps(),
            utterances = self.utterance + 1,
            "recognition session finished"
        );
        Ok(())
    }

    /// Partial text while open, the final transcript once finished.
    pub fn text(&self) -> String {
        self.transcript.current_text()
    }

    pub fn is_final(&self) -> bool {
        self.transcript.is_final()
    }

    pub fn is_endpoint(&self) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        let hypothesis = self.transcript.hypothesis();
        self.endpointer.is_endpoint(
            !hypothesis.is_empty(),
            hypothesis.num_trailing_blanks,
            self.decoder.steps_since_reset(),
            self.decoder.required_chunk_size(),
            self.decoder.sample_rate(),
        )
    }

    /// Start a new utterance. Audio already buffered but not yet decoded is
    /// kept.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.decoder.reset()?;
        self.transcript.clear();
        self.utterance += 1;
        tracing::debug!(utterance = self.utterance, "session reset");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn decode_steps(&self) -> u64 {
        self.decoder.total_steps()
    }

    pub fn available(&self) -> usize {
        self.buffer.available()
    }

    /// Index of the current utterance, counting resets.
    pub fn utterance(&self) -> u32 {
        self.utterance
    }

    pub fn sample_rate(&self) -> u32 {
        self.decoder.sample_rate()
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Finished => Err(RecognitionError::SessionFinished),
            SessionState::Aborted => Err(RecognitionError::SessionAborted),
        }
    }

    fn abort(&mut self, error: RecognitionError) -> RecognitionError {
        debug_assert!(
            !matches!(
                error,
                RecognitionError::InsufficientData { .. } | RecognitionError::ChunkSize { .. }
            ),
            "decode loop broke its window contract: {error}"
        );
        tracing::warn!(
            steps = self.decoder.total_steps(),
            "decode failed, aborting session: {error}"
        );
        self.state = SessionState::Aborted;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxstream_core::{Hypothesis, ModelConfig};
    use voxstream_engine::NullModel;

    fn session_with(window: usize) -> RecognitionSession {
        RecognitionSession::new(
            Box::new(NullModel::new(16000, window, 0.01)),
            Arc::new(SymbolRenderer::default()),
            Endpointer::default(),
        )
    }

    /// 0.3 s at level 5, 0.2 s silence, 0.3 s at level 9.
    fn speech() -> Vec<f32> {
        let mut samples = vec![0.5; 4800];
        samples.extend(vec![0.0; 3200]);
        samples.extend(vec![0.9; 4800]);
        samples
    }

    struct FailingModel {
        steps_left: usize,
    }

    impl StreamingModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }
        fn sample_rate(&self) -> u32 {
            16000
        }
        fn chunk_size(&self) -> usize {
            4
        }
        fn decode_step(&mut self, _samples: &[f32]) -> Result<Hypothesis> {
            if self.steps_left == 0 {
                return Err(RecognitionError::DecodeFailed("model crashed".to_string()));
            }
            self.steps_left -= 1;
            Ok(Hypothesis::default())
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn test_partial_window_stays_buffered() {
        let mut session = session_with(1600);
        assert_eq!(session.accept_waveform(16000, &[0.0; 3500]).unwrap(), 2);
        assert_eq!(session.decode_steps(), 2);
        assert_eq!(session.available(), 300);

        session.finish().unwrap();
        assert_eq!(session.decode_steps(), 3);
        assert_eq!(session.available(), 0);
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn test_available_grows_by_admitted_samples() {
        let mut session = session_with(16000);
        session.accept_waveform(16000, &[0.1; 1000]).unwrap();
        assert_eq!(session.available(), 1000);
        session.accept_waveform(16000, &[0.1; 234]).unwrap();
        assert_eq!(session.available(), 1234);
    }

    #[test]
    fn test_stereo_48k_is_reduced_to_one_channel_at_16k() {
        let mut session = session_with(16000);
        let samples = vec![0.25f32; 9600];
        let chunk = AudioChunk {
            samples,
            sample_rate: 48000,
            channels: 2,
        };
        assert_eq!(session.accept_chunk(&chunk).unwrap(), 0);
        assert_eq!(session.available(), 9600 / 2 / 3);
    }

    #[test]
    fn test_empty_chunk_is_invalid_and_buffer_untouched() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &[0.0; 100]).unwrap();
        assert!(matches!(
            session.accept_waveform(16000, &[]),
            Err(RecognitionError::InvalidAudio(_))
        ));
        assert_eq!(session.available(), 100);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        let mut session = session_with(1600);
        assert!(matches!(
            session.accept_waveform(0, &[0.0; 10]),
            Err(RecognitionError::InvalidAudio(_))
        ));
    }

    #[test]
    fn test_speech_renders_level_words() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &speech()).unwrap();
        assert_eq!(session.text(), "FIVE NINE");
        assert!(!session.is_final());
        session.finish().unwrap();
        assert_eq!(session.text(), "FIVE NINE");
        assert!(session.is_final());
    }

    #[test]
    fn test_chunking_does_not_change_transcript() {
        let audio = speech();

        let mut whole = session_with(1600);
        whole.accept_waveform(16000, &audio).unwrap();
        whole.finish().unwrap();

        for size in [1, 7, 160, 1599, 1601, 5000] {
            let mut pieces = session_with(1600);
            for chunk in audio.chunks(size) {
                pieces.accept_waveform(16000, chunk).unwrap();
            }
            pieces.finish().unwrap();
            assert_eq!(pieces.text(), whole.text(), "chunk size {size}");
            assert_eq!(pieces.decode_steps(), whole.decode_steps());
        }
    }

    #[test]
    fn test_chunking_does_not_change_resampled_transcript() {
        // 48 kHz stereo version of speech(), right channel silent
        let mut interleaved = Vec::new();
        for &s in &speech() {
            for _ in 0..3 {
                interleaved.push(s);
                interleaved.push(0.0);
            }
        }

        let mut whole = session_with(1600);
        whole
            .accept_chunk(&AudioChunk {
                samples: interleaved.clone(),
                sample_rate: 48000,
                channels: 2,
            })
            .unwrap();
        whole.finish().unwrap();

        let mut pieces = session_with(1600);
        // chunk sizes stay a multiple of the channel count
        for chunk in interleaved.chunks(882) {
            pieces
                .accept_chunk(&AudioChunk {
                    samples: chunk.to_vec(),
                    sample_rate: 48000,
                    channels: 2,
                })
                .unwrap();
        }
        pieces.finish().unwrap();

        assert_eq!(pieces.text(), whole.text());
        assert_eq!(whole.text(), "FIVE NINE");
    }

    #[test]
    fn test_text_is_idempotent_after_finish() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &speech()).unwrap();
        session.finish().unwrap();
        let first = session.text();
        assert_eq!(session.text(), first);
        assert_eq!(session.text(), first);
    }

    #[test]
    fn test_accept_after_finish_fails() {
        let mut session = session_with(1600);
        session.finish().unwrap();
        assert_eq!(
            session.accept_waveform(16000, &[0.0; 10]),
            Err(RecognitionError::SessionFinished)
        );
        assert_eq!(session.reset(), Err(RecognitionError::SessionFinished));
    }

    #[test]
    fn test_second_finish_is_noop() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &[0.5; 2000]).unwrap();
        session.finish().unwrap();
        let steps = session.decode_steps();
        let text = session.text();
        session.finish().unwrap();
        assert_eq!(session.decode_steps(), steps);
        assert_eq!(session.text(), text);
    }

    #[test]
    fn test_finish_with_nothing_buffered_still_flushes() {
        let mut session = session_with(1600);
        session.finish().unwrap();
        assert_eq!(session.decode_steps(), 1);
        assert_eq!(session.text(), "");
        assert!(session.is_final());
    }

    #[test]
    fn test_reset_clears_text_and_keeps_buffer() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &[0.5; 1700]).unwrap();
        assert_eq!(session.text(), "FIVE");
        session.reset().unwrap();
        assert_eq!(session.text(), "");
        assert_eq!(session.available(), 100);
        assert_eq!(session.utterance(), 1);
    }

    #[test]
    fn test_endpoint_after_speech_and_silence() {
        let mut session = session_with(1600);
        session.accept_waveform(16000, &[0.5; 1600]).unwrap();
        assert!(!session.is_endpoint());
        // 1.1 s of silence is not enough, 1.2 s is
        session.accept_waveform(16000, &[0.0; 17600]).unwrap();
        assert!(!session.is_endpoint());
        session.accept_waveform(16000, &[0.0; 1600]).unwrap();
        assert!(session.is_endpoint());

        session.reset().unwrap();
        assert!(!session.is_endpoint());
    }

    #[test]
    fn test_endpoint_disabled() {
        let mut session = RecognitionSession::new(
            Box::new(NullModel::new(16000, 1600, 0.01)),
            Arc::new(SymbolRenderer::default()),
            Endpointer::disabled(),
        );
        session.accept_waveform(16000, &[0.0; 64000]).unwrap();
        assert!(!session.is_endpoint());
    }

    #[test]
    fn test_decode_failure_aborts_session() {
        let mut session = RecognitionSession::new(
            Box::new(FailingModel { steps_left: 1 }),
            Arc::new(SymbolRenderer::default()),
            Endpointer::default(),
        );
        assert!(matches!(
            session.accept_waveform(16000, &[0.0; 8]),
            Err(RecognitionError::DecodeFailed(_))
        ));
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(
            session.accept_waveform(16000, &[0.0; 4]),
            Err(RecognitionError::SessionAborted)
        );
        assert_eq!(session.finish(), Err(RecognitionError::SessionAborted));
    }

    #[test]
    fn test_from_config_uses_registry() {
        let mut config = AppConfig::default();
        config.model = ModelConfig::named("null").with_extra("chunk_samples", 400i64);
        let registry = ModelRegistry::new();
        let mut session = RecognitionSession::from_config(&config, &registry).unwrap();
        assert_eq!(session.sample_rate(), 16000);
        assert_eq!(session.accept_waveform(16000, &[0.0; 1000]).unwrap(), 2);
    }

    #[test]
    fn test_from_config_rejects_empty_window_engine() {
        let mut config = AppConfig::default();
        config.model.engine = "zero".to_string();
        let mut registry = ModelRegistry::new();
        registry.register("zero", |_, sample_rate| {
            Ok(Box::new(NullModel::new(sample_rate, 0, 0.01)))
        });
        assert!(matches!(
            RecognitionSession::from_config(&config, &registry),
            Err(RecognitionError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_from_config_unknown_engine() {
        let mut config = AppConfig::default();
        config.model.engine = "missing".to_string();
        let registry = ModelRegistry::new();
        assert!(matches!(
            RecognitionSession::from_config(&config, &registry),
            Err(RecognitionError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RecognitionSession>();
    }
}
