//! WAV decoding into normalized interleaved PCM.

use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;
use voxstream_core::{AudioChunk, AudioError};

/// Read a WAV file into an [`AudioChunk`] at its native rate and channel
/// layout. Integer PCM is scaled to [-1.0, 1.0).
pub fn read_wav(path: &Path) -> Result<AudioChunk, AudioError> {
    let reader = WavReader::open(path)
        .map_err(|e| AudioError::Decode(format!("{}: {e}", path.display())))?;
    decode(reader)
}

pub fn read_wav_from<R: Read>(source: R) -> Result<AudioChunk, AudioError> {
    let reader = WavReader::new(source).map_err(|e| AudioError::Decode(e.to_string()))?;
    decode(reader)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<AudioChunk, AudioError> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::Decode("WAV header has zero channels".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Decode(format!(
                    "unsupported bit depth: {}",
                    spec.bits_per_sample
                )));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    tracing::debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        samples = samples.len(),
        "decoded WAV"
    );

    Ok(AudioChunk {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
