use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use voxstream_core::AudioError;

/// Live input stream writing f32 frames into a ring buffer producer.
///
/// The stream stops when the node is dropped.
pub struct CaptureNode {
    stream: Stream,
    dropped: Arc<AtomicUsize>,
}

impl CaptureNode {
    pub fn new(
        device: &Device,
        producer: HeapProd<f32>,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let producer = Arc::new(Mutex::new(producer));
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_count = Arc::clone(&dropped);

        let err_callback = |err: cpal::StreamError| {
            tracing::error!("capture stream error: {}", err);
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut prod) = producer.lock() {
                        // Overflow is dropped; the reader is behind
                        let pushed = prod.push_slice(data);
                        if pushed < data.len() {
                            dropped_count.fetch_add(data.len() - pushed, Ordering::Relaxed);
                        }
                    }
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        tracing::info!(sample_rate, channels, "capture started");
        Ok(Self { stream, dropped })
    }

    /// Samples lost to ring buffer overflow so far.
    pub fn dropped_samples(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamBuild(e.to_string()))
    }
}
