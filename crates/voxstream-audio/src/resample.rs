//! Linear-interpolation resampling.
//!
//! For `N` source samples the output holds `floor(N * target / source)`
//! samples. Output `k` sits at source position `k * source / target` and is
//! interpolated between its two neighbours; when the right neighbour does not
//! exist the left sample is used as is.

use std::borrow::Cow;

/// Resample a complete mono signal.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Cow<'_, [f32]> {
    if from_rate == to_rate {
        return Cow::Borrowed(samples);
    }
    let mut resampler = LinearResampler::new(from_rate, to_rate);
    let mut output = resampler.process(samples);
    output.extend(resampler.finish());
    Cow::Owned(output)
}

/// Incremental form of [`resample_linear`].
///
/// Feeding a signal through [`process`](Self::process) in any number of
/// pieces followed by [`finish`](Self::finish) yields exactly the samples
/// `resample_linear` produces for the whole signal. An output whose right
/// neighbour has not arrived yet is held back until the next call.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    source_rate: u32,
    from: u64,
    to: u64,
    frames_in: u64,
    frames_out: u64,
    carry: Option<f32>,
}

impl LinearResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        let g = gcd(from_rate.max(1) as u64, to_rate.max(1) as u64);
        Self {
            source_rate: from_rate,
            from: from_rate.max(1) as u64 / g,
            to: to_rate.max(1) as u64 / g,
            frames_in: 0,
            frames_out: 0,
            carry: None,
        }
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let base = self.frames_in;
        let total = base + input.len() as u64;
        let limit = total * self.to / self.from;
        let mut output = Vec::with_capacity(limit.saturating_sub(self.frames_out) as usize);

        while self.frames_out < limit {
            let position = self.frames_out * self.from;
            let idx = position / self.to;
            let rem = position % self.to;
            if rem != 0 && idx + 1 >= total {
                break;
            }
            let left = self.sample_at(idx, base, input);
            let sample = if rem == 0 {
                left
            } else {
                let right = self.sample_at(idx + 1, base, input);
                let frac = rem as f32 / self.to as f32;
                left * (1.0 - frac) + right * frac
            };
            output.push(sample);
            self.frames_out += 1;
        }

        self.frames_in = total;
        if let Some(&last) = input.last() {
            self.carry = Some(last);
        }
        output
    }

    /// Emit the outputs that were waiting for a right neighbour.
    pub fn finish(&mut self) -> Vec<f32> {
        let limit = self.frames_in * self.to / self.from;
        let tail = self.carry.unwrap_or(0.0);
        let pending = limit.saturating_sub(self.frames_out) as usize;
        self.frames_out = limit;
        vec![tail; pending]
    }

    // Held-back outputs only ever reach one sample into the previous input.
    fn sample_at(&self, index: u64, base: u64, input: &[f32]) -> f32 {
        if index >= base {
            input[(index - base) as usize]
        } else {
            self.carry.unwrap_or(0.0)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 * 0.001).collect()
    }

    #[test]
    fn test_same_rate_is_borrowed() {
        let input = ramp(10);
        let out = resample_linear(&input, 16000, 16000);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, &input[..]);
    }

    #[test]
    fn test_downsample_by_three_picks_every_third() {
        let input = ramp(10);
        let out = resample_linear(&input, 48000, 16000);
        assert_eq!(out.len(), 3);
        assert_eq!(&*out, &[input[0], input[3], input[6]]);
    }

    #[test]
    fn test_output_length_is_floor() {
        for n in 0..20 {
            let input = ramp(n);
            let out = resample_linear(&input, 44100, 16000);
            assert_eq!(out.len(), n * 16000 / 44100, "n = {n}");
        }
    }

    #[test]
    fn test_upsample_interpolates_midpoints() {
        let out = resample_linear(&[0.0, 1.0, 0.0], 8000, 16000);
        assert_eq!(out.len(), 6);
        assert_eq!(&*out, &[0.0, 0.5, 1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_streaming_matches_batch_for_any_split() {
        let input: Vec<f32> = (0..997).map(|i| (i as f32 * 0.05).sin()).collect();
        for (from, to) in [(48000, 16000), (44100, 16000), (8000, 16000), (22050, 16000)] {
            let batch = resample_linear(&input, from, to).into_owned();
            for piece in [1usize, 7, 160, 333, 997] {
                let mut resampler = LinearResampler::new(from, to);
                let mut streamed = Vec::new();
                for chunk in input.chunks(piece) {
                    streamed.extend(resampler.process(chunk));
                }
                streamed.extend(resampler.finish());
                assert_eq!(streamed, batch, "{from}->{to} in pieces of {piece}");
            }
        }
    }

    #[test]
    fn test_upsampling_holds_back_until_neighbour_arrives() {
        let mut resampler = LinearResampler::new(8000, 16000);
        let first = resampler.process(&[0.0, 1.0]);
        // position 1.5 needs sample 2
        assert_eq!(first, vec![0.0, 0.5, 1.0]);
        let second = resampler.process(&[0.0]);
        assert_eq!(second, vec![0.5, 0.0]);
        assert_eq!(resampler.finish(), vec![0.0]);
    }

    #[test]
    fn test_finish_on_empty_resampler() {
        let mut resampler = LinearResampler::new(48000, 16000);
        assert!(resampler.finish().is_empty());
        assert_eq!(resampler.source_rate(), 48000);
    }
}
