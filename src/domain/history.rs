// Rolling history of accepted samples
use super::telemetry::Sample;
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 200;

/// Fixed-capacity FIFO window of samples, oldest first.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

/// Parallel columns of the buffer contents, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySeries {
    pub timestamps: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub currents: Vec<f64>,
}

impl RollingBuffer {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Append a sample, evicting at most one from the front.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> HistorySeries {
        let len = self.samples.len();
        let mut series = HistorySeries {
            timestamps: Vec::with_capacity(len),
            temperatures: Vec::with_capacity(len),
            currents: Vec::with_capacity(len),
        };

        for sample in &self.samples {
            series.timestamps.push(sample.timestamp);
            series.temperatures.push(sample.temperature);
            series.currents.push(sample.current);
        }

        series
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
