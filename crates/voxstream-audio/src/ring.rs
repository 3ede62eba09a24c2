use ringbuf::traits::{Consumer, Observer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use voxstream_core::AudioChunk;

/// Create a ring buffer split into producer and consumer halves.
pub fn create_ring_buffer(capacity: usize) -> (HeapProd<f32>, HeapCons<f32>) {
    HeapRb::<f32>::new(capacity).split()
}

/// Reading side of a capture ring buffer. Hands out whole frames only, so a
/// frame split across two producer writes is never torn.
pub struct RingSource {
    consumer: HeapCons<f32>,
    scratch: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl RingSource {
    pub fn new(consumer: HeapCons<f32>, sample_rate: u32, channels: u16, max_chunk: usize) -> Self {
        let channels = channels.max(1);
        let frame = channels as usize;
        let max_chunk = (max_chunk.max(frame) / frame) * frame;
        Self {
            consumer,
            scratch: vec![0.0; max_chunk],
            sample_rate,
            channels,
        }
    }

    /// Pop whatever complete frames are buffered, up to `max_chunk` samples.
    pub fn pull(&mut self) -> Option<AudioChunk> {
        let frame = self.channels as usize;
        let ready = (self.consumer.occupied_len().min(self.scratch.len()) / frame) * frame;
        if ready == 0 {
            return None;
        }
        let n = self.consumer.pop_slice(&mut self.scratch[..ready]);
        Some(AudioChunk {
            samples: self.scratch[..n].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}
