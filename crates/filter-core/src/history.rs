//! Bounded time-window store of recent raw samples.
//!
//! Every raw sample is recorded here regardless of what the motion filter
//! decides, so the click gate sees true physical motion rather than the
//! filtered trajectory.

use std::collections::VecDeque;

use crate::event::TimedSample;

/// Chronological buffer of raw samples, pruned from the head by age.
#[derive(Debug, Clone, Default)]
pub struct SampleHistory {
    samples: VecDeque<TimedSample>,
    /// Set when a sample arrived with a timestamp earlier than the tail.
    disordered: bool,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample at the tail.
    pub fn append(&mut self, sample: TimedSample) {
        if let Some(tail) = self.samples.back() {
            if sample.time < tail.time {
                self.disordered = true;
            }
        }
        self.samples.push_back(sample);
    }

    /// Drop every sample whose age relative to `now` exceeds `horizon`.
    ///
    /// Samples with a non-finite age are dropped too. A non-finite `now`
    /// leaves the buffer untouched.
    pub fn prune(&mut self, now: f64, horizon: f64) {
        if !now.is_finite() {
            return;
        }
        let keep = |s: &TimedSample| now - s.time <= horizon;

        while let Some(head) = self.samples.front() {
            if keep(head) {
                break;
            }
            self.samples.pop_front();
        }

        if self.disordered {
            self.samples.retain(keep);
            self.disordered = self
                .samples
                .iter()
                .zip(self.samples.iter().skip(1))
                .any(|(a, b)| b.time < a.time);
        }
    }

    /// Ordered copy of the samples whose age relative to `now` is at most `window`.
    pub fn snapshot_within(&self, now: f64, window: f64) -> Vec<TimedSample> {
        self.samples
            .iter()
            .filter(|s| now - s.time <= window)
            .copied()
            .collect()
    }

    /// Release all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.samples.shrink_to_fit();
        self.disordered = false;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedSample> {
        self.samples.iter()
    }
}
