use std::time::Duration;

/// Granularity that duration-flavored values are rescaled to before export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationUnit {
    Seconds,
    #[default]
    Milliseconds,
    Microseconds,
    Nanoseconds,
}
impl DurationUnit {
    /// Unrecognized durations, zero included, fall back to milliseconds.
    pub fn resolve(unit: Duration) -> Self {
        if unit == Duration::from_secs(1) {
            Self::Seconds
        } else if unit == Duration::from_millis(1) {
            Self::Milliseconds
        } else if unit == Duration::from_micros(1) {
            Self::Microseconds
        } else if unit == Duration::from_nanos(1) {
            Self::Nanoseconds
        } else {
            Self::Milliseconds
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Microseconds => "microseconds",
            Self::Nanoseconds => "nanoseconds",
        }
    }

    pub fn nanos(&self) -> f64 {
        match self {
            Self::Seconds => 1e9,
            Self::Milliseconds => 1e6,
            Self::Microseconds => 1e3,
            Self::Nanoseconds => 1.0,
        }
    }

    /// Rescale a value measured in nanoseconds.
    pub fn scale(&self, nanos: f64) -> f64 {
        nanos / self.nanos()
    }
}
