use crate::{
    metric::{HistogramSnapshot, MeterSnapshot, Snapshot, TimerSnapshot},
    unit::DurationUnit,
    DataPoint, Kind, Time,
};

pub const PERCENTILES: [f64; 5] = [75.0, 95.0, 98.0, 99.0, 99.9];

/// Flatten one snapshot into data points. `unit` only affects timers.
pub fn convert(name: &str, snapshot: &Snapshot, time: Time, unit: DurationUnit) -> Vec<DataPoint> {
    match snapshot {
        Snapshot::Counter(count) => vec![convert_counter(*count, name, time)],
        Snapshot::Gauge(value) => vec![convert_gauge(*value, name, time)],
        Snapshot::GaugeFloat64(value) => vec![convert_gauge_f64(*value, name, time)],
        Snapshot::Meter(meter) => convert_meter(meter, name, time),
        Snapshot::Histogram(histogram) => convert_histogram(histogram, name, time, None),
        Snapshot::Timer(timer) => convert_timer(timer, name, time, unit),
    }
}

pub fn convert_counter(count: i64, name: &str, time: Time) -> DataPoint {
    DataPoint::new(name, Kind::Counter, count as f64, time)
}

pub fn convert_gauge(value: i64, name: &str, time: Time) -> DataPoint {
    DataPoint::new(name, Kind::Gauge, value as f64, time)
}

pub fn convert_gauge_f64(value: f64, name: &str, time: Time) -> DataPoint {
    DataPoint::new(name, Kind::Gauge, value, time)
}

/// Rates are events per second and never rescaled.
pub fn convert_meter(meter: &MeterSnapshot, name: &str, time: Time) -> Vec<DataPoint> {
    vec![
        DataPoint::new(namer(name, "count"), Kind::Counter, meter.count as f64, time),
        DataPoint::new(namer(name, "rate.1-minute"), Kind::Gauge, meter.rate1, time),
        DataPoint::new(namer(name, "rate.5-minute"), Kind::Gauge, meter.rate5, time),
        DataPoint::new(namer(name, "rate.15-minute"), Kind::Gauge, meter.rate15, time),
        DataPoint::new(namer(name, "rate.mean"), Kind::Gauge, meter.rate_mean, time),
    ]
}

/// With `unit` set, every statistic is treated as a duration in nanoseconds.
pub fn convert_histogram(
    histogram: &HistogramSnapshot,
    name: &str,
    time: Time,
    unit: Option<DurationUnit>,
) -> Vec<DataPoint> {
    let mut points = vec![DataPoint::new(
        namer(name, "count"),
        Kind::Counter,
        histogram.count() as f64,
        time,
    )];
    points.extend(histogram_statistics(histogram, name, time, unit));
    points
}

/// Meter part under `name`, duration statistics under `name.duration`.
pub fn convert_timer(
    timer: &TimerSnapshot,
    name: &str,
    time: Time,
    unit: DurationUnit,
) -> Vec<DataPoint> {
    let mut points = convert_meter(timer.rates(), name, time);
    let duration = namer(name, "duration");
    points.extend(histogram_statistics(
        timer.durations(),
        &duration,
        time,
        Some(unit),
    ));
    points
}

fn histogram_statistics(
    histogram: &HistogramSnapshot,
    name: &str,
    time: Time,
    unit: Option<DurationUnit>,
) -> Vec<DataPoint> {
    let stats = [
        ("mean", histogram.mean()),
        ("stddev", histogram.std_dev()),
        ("sum", histogram.sum() as f64),
        ("variance", histogram.variance()),
        ("max", histogram.max() as f64),
        ("min", histogram.min() as f64),
    ]
    .into_iter()
    .map(|(suffix, value)| (namer(name, suffix), value));
    let percentiles = PERCENTILES
        .iter()
        .zip(histogram.percentiles(&PERCENTILES))
        .map(|(p, value)| (namer(name, &percentile_name(*p)), value));
    stats
        .chain(percentiles)
        .map(move |(name, value)| match unit {
            Some(unit) => {
                DataPoint::new(name, Kind::Gauge, unit.scale(value), time).with_unit(unit.name())
            }
            None => DataPoint::new(name, Kind::Gauge, value, time),
        })
        .collect()
}

/// `99.9` -> `999thPercentile`
pub fn percentile_name(percentile: f64) -> String {
    let digits = percentile.to_string().replace('.', "");
    format!("{digits}thPercentile")
}

fn namer(name: &str, suffix: &str) -> String {
    format!("{name}.{suffix}")
}
