//! Rolling price window
//!
//! Time-bounded buffer of price samples, trimmed from the front on every append

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{vec_deque, VecDeque};

/// A single timestamped price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Trailing window of price samples covering a fixed horizon
#[derive(Debug, Clone)]
pub struct PriceWindow {
    /// Retention horizon
    horizon: Duration,
    /// Samples, oldest first
    samples: VecDeque<PriceSample>,
}

impl PriceWindow {
    /// Create an empty window retaining samples for `horizon`
    pub fn new(horizon: Duration) -> Self {
        Self {
            horizon,
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, then evict everything older than `timestamp - horizon`
    pub fn append(&mut self, price: f64, timestamp: DateTime<Utc>) {
        self.samples.push_back(PriceSample { price, timestamp });
        self.evict(timestamp);
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.horizon;
        while let Some(sample) = self.samples.front() {
            if sample.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Samples in time order, oldest first
    pub fn samples(&self) -> vec_deque::Iter<'_, PriceSample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200 + secs, 0).unwrap()
    }

    #[test]
    fn test_empty_window() {
        let window = PriceWindow::new(Duration::minutes(5));
        assert!(window.is_empty());
        assert!(window.first().is_none());
        assert!(window.last().is_none());
        assert_eq!(window.horizon(), Duration::seconds(300));
    }

    #[test]
    fn test_append_keeps_time_order() {
        let mut window = PriceWindow::new(Duration::minutes(5));
        window.append(100.0, at(0));
        window.append(101.0, at(1));
        window.append(102.0, at(2));

        let prices: Vec<f64> = window.samples().map(|s| s.price).collect();
        assert_eq!(prices, vec![100.0, 101.0, 102.0]);
        assert_eq!(window.first().unwrap().timestamp, at(0));
        assert_eq!(window.last().unwrap().timestamp, at(2));
    }

    #[test]
    fn test_evicts_samples_beyond_horizon() {
        let mut window = PriceWindow::new(Duration::seconds(300));
        window.append(100.0, at(0));
        window.append(110.0, at(310));

        assert_eq!(window.len(), 1);
        assert_eq!(window.first().unwrap().price, 110.0);
        assert_eq!(window.first().unwrap().timestamp, at(310));
    }

    #[test]
    fn test_sample_exactly_at_horizon_is_retained() {
        let mut window = PriceWindow::new(Duration::seconds(300));
        window.append(100.0, at(0));
        window.append(101.0, at(300));

        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_partial_eviction() {
        let mut window = PriceWindow::new(Duration::seconds(10));
        for i in 0..5 {
            window.append(100.0 + i as f64, at(i * 4));
        }
        // cutoff is 16 - 10 = 6: samples at 0 and 4 are gone
        let times: Vec<_> = window.samples().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![at(8), at(12), at(16)]);
    }
}
