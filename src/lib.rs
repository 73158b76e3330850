pub mod config;
pub mod convert;
pub mod env;
pub mod exporter;
pub mod metric;
pub mod payload;
pub mod registry;
pub mod transport;
pub mod unit;

use serde::{Deserialize, Serialize};

type MetricKey = String;

/// Milliseconds since the Unix epoch.
pub type Time = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Counter,
    Gauge,
}

/// One exported scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub value: f64,
    pub timestamp: Time,
    /// Empty unless `value` is a duration.
    #[serde(default)]
    pub unit: String,
}
impl DataPoint {
    pub fn new(name: impl Into<String>, kind: Kind, value: f64, timestamp: Time) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            timestamp,
            unit: String::new(),
        }
    }
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}
