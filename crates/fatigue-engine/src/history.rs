use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const BLINK_HISTORY_LEN: usize = 100;
pub const METRIC_HISTORY_LEN: usize = 30;

/// Fixed-capacity FIFO. Pushing into a full buffer evicts the oldest item.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the evicted item, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub ear: f64,
    pub mar: f64,
    pub timestamp: f64,
}

/// Blink timestamps and recent EAR/MAR samples.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    blinks: RingBuffer<f64>,
    samples: RingBuffer<MetricSample>,
}

impl RollingHistory {
    pub fn new(blink_capacity: usize, sample_capacity: usize) -> Self {
        Self {
            blinks: RingBuffer::new(blink_capacity),
            samples: RingBuffer::new(sample_capacity),
        }
    }

    pub fn record_blink(&mut self, timestamp: f64) {
        self.blinks.push(timestamp);
    }

    pub fn record_sample(&mut self, sample: MetricSample) {
        self.samples.push(sample);
    }

    /// Blinks per minute over the span covered by the buffered timestamps.
    ///
    /// Once the buffer saturates the span only covers the last
    /// `blink_capacity` blinks, so long sessions report a recent rate rather
    /// than a session average.
    pub fn blink_rate(&self) -> f64 {
        if self.blinks.len() < 2 {
            return 0.0;
        }
        let (Some(&oldest), Some(&newest)) = (self.blinks.oldest(), self.blinks.newest()) else {
            return 0.0;
        };
        let span = newest - oldest;
        if span > 0.0 {
            self.blinks.len() as f64 / span * 60.0
        } else {
            0.0
        }
    }

    pub fn blink_timestamps(&self) -> &RingBuffer<f64> {
        &self.blinks
    }

    pub fn samples(&self) -> &RingBuffer<MetricSample> {
        &self.samples
    }

    pub fn ear_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.ear)
    }

    pub fn mar_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.mar)
    }

    pub fn smoothed_ear(&self) -> f64 {
        mean(self.ear_values(), self.samples.len())
    }

    pub fn smoothed_mar(&self) -> f64 {
        mean(self.mar_values(), self.samples.len())
    }

    pub fn clear(&mut self) {
        self.blinks.clear();
        self.samples.clear();
    }
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(BLINK_HISTORY_LEN, METRIC_HISTORY_LEN)
    }
}

fn mean(values: impl Iterator<Item = f64>, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut buffer = RingBuffer::new(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.push(4), Some(1));
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(buffer.oldest(), Some(&2));
        assert_eq!(buffer.newest(), Some(&4));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        buffer.push(1.0);
        buffer.push(2.0);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.newest(), Some(&2.0));
    }

    #[test]
    fn test_blink_rate_cold_start() {
        let mut history = RollingHistory::default();
        assert_eq!(history.blink_rate(), 0.0);
        history.record_blink(10.0);
        assert_eq!(history.blink_rate(), 0.0);
    }

    #[test]
    fn test_blink_rate_zero_span() {
        let mut history = RollingHistory::default();
        history.record_blink(10.0);
        history.record_blink(10.0);
        assert_eq!(history.blink_rate(), 0.0);
    }

    #[test]
    fn test_blink_rate() {
        let mut history = RollingHistory::default();
        for i in 0..5 {
            history.record_blink(i as f64 * 3.0);
        }
        // 5 timestamps over 12s
        assert!((history.blink_rate() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_blink_history_saturates() {
        let mut history = RollingHistory::new(BLINK_HISTORY_LEN, METRIC_HISTORY_LEN);
        for i in 0..150 {
            history.record_blink(i as f64);
        }
        assert_eq!(history.blink_timestamps().len(), BLINK_HISTORY_LEN);
        assert_eq!(history.blink_timestamps().oldest(), Some(&50.0));
        // 100 timestamps over 99s
        assert!((history.blink_rate() - 100.0 / 99.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothed_metrics() {
        let mut history = RollingHistory::default();
        assert_eq!(history.smoothed_ear(), 0.0);
        for i in 0..40 {
            history.record_sample(MetricSample {
                ear: if i < 10 { 1.0 } else { 0.2 },
                mar: 0.5,
                timestamp: i as f64,
            });
        }
        assert_eq!(history.samples().len(), METRIC_HISTORY_LEN);
        assert!((history.smoothed_ear() - 0.2).abs() < 1e-9);
        assert!((history.smoothed_mar() - 0.5).abs() < 1e-9);
    }
}
