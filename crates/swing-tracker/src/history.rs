use glam::Vec3;
use std::collections::VecDeque;

/// Hard cap on stored samples, independent of the time window.
pub const HISTORY_CAPACITY: usize = 512;

/// A tip position stamped with the sensor sample time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipSample {
    /// Course-frame position relative to the ball (m).
    pub position: Vec3,
    pub timestamp_ms: f64,
}

/// Bounded FIFO of recent tip samples, oldest first.
#[derive(Debug, Clone)]
pub struct TipHistory {
    samples: VecDeque<TipSample>,
    capacity: usize,
}

impl TipHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: TipSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop every sample stamped before `cutoff_ms`.
    pub fn evict_older_than(&mut self, cutoff_ms: f64) {
        while self
            .samples
            .front()
            .is_some_and(|s| s.timestamp_ms < cutoff_ms)
        {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TipSample> {
        self.samples.back()
    }

    /// The `n`-th newest sample; `0` is the newest.
    pub fn nth_latest(&self, n: usize) -> Option<&TipSample> {
        self.samples.len().checked_sub(n + 1).and_then(|i| self.samples.get(i))
    }

    /// Up to `n` newest samples, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TipSample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TipSample> {
        self.samples.iter()
    }

    /// Largest distance from the ball among the `n` newest samples.
    pub fn max_distance_recent(&self, n: usize) -> f32 {
        self.recent(n)
            .map(|s| s.position.length())
            .fold(0.0, f32::max)
    }

    /// Velocity between the two newest samples (m/s). Zero if unavailable.
    pub fn latest_velocity(&self) -> Vec3 {
        match (self.nth_latest(1), self.nth_latest(0)) {
            (Some(prev), Some(now)) => {
                let dt = (now.timestamp_ms - prev.timestamp_ms) / 1000.0;
                if dt > 0.0 {
                    (now.position - prev.position) / dt as f32
                } else {
                    Vec3::ZERO
                }
            }
            _ => Vec3::ZERO,
        }
    }
}

impl Default for TipHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
