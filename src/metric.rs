//! Point-in-time reads of live instruments.
//!
//! The instruments themselves live with the application; the exporter only
//! ever sees the immutable [`Snapshot`] an [`Instrument`] hands out.

/// A live metric held by a registry.
pub trait Instrument: Send + Sync {
    /// `None` for kinds the exporter does not understand; those are skipped.
    fn snapshot(&self) -> Option<Snapshot>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Counter(i64),
    Gauge(i64),
    GaugeFloat64(f64),
    Meter(MeterSnapshot),
    Histogram(HistogramSnapshot),
    Timer(TimerSnapshot),
}

/// Event count plus exponentially-weighted rates in events per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    pub count: i64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramSnapshot {
    count: i64,
    values: Vec<i64>,
}
impl HistogramSnapshot {
    /// `count` is the number of observations ever recorded; `values` is the
    /// retained sample the statistics are computed over.
    pub fn new(count: i64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { count, values }
    }
    pub fn from_values(values: Vec<i64>) -> Self {
        let count = i64::try_from(values.len()).unwrap_or(i64::MAX);
        Self::new(count, values)
    }

    pub fn count(&self) -> i64 {
        self.count
    }
    /// Saturates at the `i64` bounds.
    pub fn sum(&self) -> i64 {
        let total = self.total();
        i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
    }
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.values.len() as f64
    }
    /// Population variance of the sample.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum = self
            .values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>();
        sum / self.values.len() as f64
    }
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Values at each percentage in `percentiles` (0 to 100), linearly
    /// interpolated between neighbouring sorted values.
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<f64> {
        let size = self.values.len();
        if size == 0 {
            return vec![0.0; percentiles.len()];
        }
        percentiles
            .iter()
            .map(|p| {
                let pos = p / 100.0 * (size + 1) as f64;
                if pos < 1.0 {
                    self.values[0] as f64
                } else if pos >= size as f64 {
                    self.values[size - 1] as f64
                } else {
                    let rank = pos as usize;
                    let lower = self.values[rank - 1] as f64;
                    let upper = self.values[rank] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }

    fn total(&self) -> i128 {
        self.values.iter().map(|&v| i128::from(v)).sum()
    }
}

/// Rates plus the sample of recorded durations in nanoseconds.
///
/// The duration histogram takes its count from `rates`, so the timer has a
/// single count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimerSnapshot {
    rates: MeterSnapshot,
    durations: HistogramSnapshot,
}
impl TimerSnapshot {
    pub fn new(rates: MeterSnapshot, durations: Vec<i64>) -> Self {
        let durations = HistogramSnapshot::new(rates.count, durations);
        Self { rates, durations }
    }

    pub fn rates(&self) -> &MeterSnapshot {
        &self.rates
    }
    pub fn durations(&self) -> &HistogramSnapshot {
        &self.durations
    }
}
