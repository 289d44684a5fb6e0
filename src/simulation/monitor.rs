//! Time-indexed observation sink
//!
//! A monitor records `(time, value)` pairs in the order they are observed and
//! answers summary queries once the run is over.

use super::types::SimTime;

/// Append-only series of observations paired with the simulated time at
/// which each was made
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    name: String,
    times: Vec<SimTime>,
    values: Vec<f64>,
}

impl Monitor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record `value` as observed at `time`
    ///
    /// # Panics
    ///
    /// Panics if `time` is earlier than the previous observation.
    pub fn observe(&mut self, time: SimTime, value: f64) {
        if let Some(&last) = self.times.last() {
            assert!(
                time >= last,
                "monitor '{}' observed time {} after {}",
                self.name,
                time,
                last
            );
        }
        self.times.push(time);
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation times in recording order
    pub fn tseries(&self) -> &[SimTime] {
        &self.times
    }

    /// Observed values in recording order
    pub fn yseries(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<(SimTime, f64)> {
        self.times.last().copied().zip(self.values.last().copied())
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.total() / self.count() as f64)
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Value in effect at `time`: the latest observation made at or before
    /// it. Several observations at the same time resolve to the last one.
    pub fn value_at(&self, time: SimTime) -> Option<f64> {
        let idx = self.times.partition_point(|&t| t <= time);
        idx.checked_sub(1).map(|i| self.values[i])
    }

    /// Mean of the observed value weighted by how long each value was held,
    /// from the first observation up to `until`
    pub fn time_average(&self, until: SimTime) -> Option<f64> {
        let start = *self.times.first()?;
        let span = until - start;
        if span <= 0.0 {
            return self.last().map(|(_, v)| v);
        }
        let mut area = 0.0;
        for (i, (&t, &v)) in self.times.iter().zip(&self.values).enumerate() {
            if t >= until {
                break;
            }
            let end = self.times.get(i + 1).copied().unwrap_or(until).min(until);
            area += v * (end - t);
        }
        Some(area / span)
    }
}
