//! Stitched audio buffer (component I): a monotonically growing sequence
//! of PCM samples tagged with an absolute start time, tolerant of small
//! gaps and overlaps between successively appended chunks.

use crate::error::DecodeError;

const SYNC_TOLERANCE_SECONDS: f64 = 0.001;

#[derive(Debug, Default)]
pub struct StitchedAudioBuffer {
    samples: Vec<f32>,
    base_start_abs: f64,
    sample_rate: u32,
}

impl StitchedAudioBuffer {
    pub fn new() -> Self {
        Self { samples: Vec::new(), base_start_abs: 0.0, sample_rate: 0 }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / self.sample_rate as f64
        }
    }

    pub fn stream_end_abs(&self) -> f64 {
        self.base_start_abs + self.duration()
    }

    /// Appends `audio`, tagged `[start_abs, end_abs)`. Exact continuations
    /// are appended directly; gaps are appended as-is (left for the
    /// controller to pad if it cares); overlaps drop the already-seen
    /// leading frames before appending the remainder.
    pub fn append(
        &mut self,
        audio: &[f32],
        start_abs: f64,
        sample_rate: u32,
    ) -> Result<(), DecodeError> {
        if self.samples.is_empty() {
            self.sample_rate = sample_rate;
            self.base_start_abs = start_abs;
            self.samples.extend_from_slice(audio);
            return Ok(());
        }
        if sample_rate != self.sample_rate {
            return Err(DecodeError::SampleRateMismatch { expected: self.sample_rate, actual: sample_rate });
        }

        let expected = self.base_start_abs + self.samples.len() as f64 / self.sample_rate as f64;
        let delta = start_abs - expected;

        if delta.abs() < SYNC_TOLERANCE_SECONDS || delta > 0.0 {
            self.samples.extend_from_slice(audio);
        } else {
            let overlap_seconds = -delta;
            let drop = (overlap_seconds * self.sample_rate as f64).floor() as usize;
            if drop < audio.len() {
                self.samples.extend_from_slice(&audio[drop..]);
            }
        }
        Ok(())
    }

    /// Returns the samples covering `[start_abs, end_abs)`, clamped to what
    /// is actually buffered.
    pub fn read(&self, start_abs: f64, end_abs: f64) -> &[f32] {
        if self.sample_rate == 0 || end_abs <= start_abs {
            return &[];
        }
        let rel_start =
            (((start_abs - self.base_start_abs) * self.sample_rate as f64).max(0.0)) as usize;
        let rel_end =
            (((end_abs - self.base_start_abs) * self.sample_rate as f64).max(0.0)) as usize;
        let rel_start = rel_start.min(self.samples.len());
        let rel_end = rel_end.min(self.samples.len());
        if rel_start >= rel_end {
            return &[];
        }
        &self.samples[rel_start..rel_end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_appends_grow_duration() {
        let mut buf = StitchedAudioBuffer::new();
        buf.append(&[0.0; 1600], 0.0, 16_000).unwrap();
        buf.append(&[0.0; 1600], 0.1, 16_000).unwrap();
        assert!((buf.duration() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn overlap_drops_seen_frames() {
        let mut buf = StitchedAudioBuffer::new();
        buf.append(&[1.0; 1600], 0.0, 16_000).unwrap(); // covers [0, 0.1)
        // second chunk starts 0.05s into the first chunk: 800 frames overlap.
        buf.append(&[2.0; 1600], 0.05, 16_000).unwrap();
        assert!((buf.duration() - 0.15).abs() < 1e-9);
    }

    #[test]
    fn gap_is_appended_as_is() {
        let mut buf = StitchedAudioBuffer::new();
        buf.append(&[1.0; 1600], 0.0, 16_000).unwrap();
        buf.append(&[2.0; 1600], 5.0, 16_000).unwrap();
        assert!((buf.duration() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn sample_rate_mismatch_errors() {
        let mut buf = StitchedAudioBuffer::new();
        buf.append(&[0.0; 16], 0.0, 16_000).unwrap();
        assert!(matches!(
            buf.append(&[0.0; 16], 0.001, 8_000),
            Err(DecodeError::SampleRateMismatch { .. })
        ));
    }
}
