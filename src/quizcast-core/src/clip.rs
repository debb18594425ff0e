//! In-memory audio clips and the segment arithmetic the mixer needs.
//!
//! Clips are mono f32 sample buffers. Multi-channel WAV input is mixed down
//! on decode, and clips with mismatched sample rates are resampled by linear
//! interpolation before they are combined.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// A decoded mono audio clip with a known sample rate.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Create a clip of silence with the given duration.
    pub fn silent(duration_ms: u64, sample_rate: u32) -> Self {
        let len = ms_to_samples(duration_ms, sample_rate);
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV byte stream into a mono clip.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, hound::Error> {
        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples = if spec.channels > 1 {
            interleaved
                .chunks(spec.channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        } else {
            interleaved
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Decode a WAV file from disk.
    pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Self, hound::Error> {
        let bytes = std::fs::read(path)?;
        Self::from_wav_bytes(&bytes)
    }

    /// Encode the clip as 16-bit PCM mono WAV bytes.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, self.wav_spec())?;
            for &sample in &self.samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the clip to disk as 16-bit PCM mono WAV.
    pub fn save_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), hound::Error> {
        let mut writer = WavWriter::create(path, self.wav_spec())?;
        for &sample in &self.samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()
    }

    fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Clip duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Append another clip, resampling it first if the rates differ.
    pub fn append(&mut self, other: &AudioClip) {
        if other.sample_rate == self.sample_rate {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let resampled = other.resampled(self.sample_rate);
            self.samples.extend_from_slice(&resampled.samples);
        }
    }

    /// Adjust gain by a number of decibels (negative attenuates).
    pub fn apply_gain_db(&mut self, db: f32) {
        let factor = 10f32.powf(db / 20.0);
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Mix another clip additively on top of this one, starting at time zero.
    ///
    /// The result keeps this clip's duration: anything in `other` past the
    /// end of this clip is discarded.
    pub fn overlay(&mut self, other: &AudioClip) {
        if other.sample_rate != self.sample_rate {
            let resampled = other.resampled(self.sample_rate);
            return self.overlay(&resampled);
        }
        let n = self.samples.len().min(other.samples.len());
        for i in 0..n {
            self.samples[i] += other.samples[i];
        }
    }

    /// The clip repeated back to back `count` times.
    pub fn repeated(&self, count: u32) -> AudioClip {
        let mut samples = Vec::with_capacity(self.samples.len() * count as usize);
        for _ in 0..count {
            samples.extend_from_slice(&self.samples);
        }
        AudioClip {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Shorten the clip to at most the given duration.
    pub fn truncate_to_ms(&mut self, duration_ms: u64) {
        let len = ms_to_samples(duration_ms, self.sample_rate);
        self.samples.truncate(len);
    }

    /// Resample to a new rate by linear interpolation between adjacent samples.
    pub fn resampled(&self, target_rate: u32) -> AudioClip {
        if target_rate == self.sample_rate || self.samples.is_empty() {
            return AudioClip {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            };
        }

        let step = self.sample_rate as f64 / target_rate as f64;
        let new_len = (self.samples.len() as f64 / step) as usize;
        let mut samples = Vec::with_capacity(new_len);

        for i in 0..new_len {
            let src_pos = i as f64 * step;
            let src_idx = src_pos as usize;
            let frac = (src_pos - src_idx as f64) as f32;

            if src_idx + 1 < self.samples.len() {
                samples.push(self.samples[src_idx] * (1.0 - frac) + self.samples[src_idx + 1] * frac);
            } else if src_idx < self.samples.len() {
                samples.push(self.samples[src_idx]);
            }
        }

        AudioClip {
            samples,
            sample_rate: target_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}
