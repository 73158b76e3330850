use std::{
    thread::JoinHandle,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Options,
    convert::convert,
    env::Environment,
    registry::Registry,
    transport::{HttpTransport, Transport, TransportError},
    unit::DurationUnit,
    DataPoint, Time,
};

pub trait Clock: Send {
    fn now_millis(&self) -> Time;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now_millis(&self) -> Time {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Time::try_from(since_epoch.as_millis()).unwrap_or(Time::MAX)
    }
}

#[derive(Debug)]
pub struct Exporter<T, C = SystemClock> {
    transport: T,
    clock: C,
    unit: DurationUnit,
}
impl<T: Transport> Exporter<T> {
    pub fn new(transport: T, unit: DurationUnit) -> Self {
        Self::with_clock(transport, SystemClock, unit)
    }
}
impl<T: Transport, C: Clock> Exporter<T, C> {
    pub fn with_clock(transport: T, clock: C, unit: DurationUnit) -> Self {
        Self {
            transport,
            clock,
            unit,
        }
    }

    /// Snapshot every instrument once; all points share one timestamp.
    ///
    /// NaN and infinite values have no JSON number form and are dropped.
    pub fn assemble(&self, registry: &impl Registry) -> Vec<DataPoint> {
        let time = self.clock.now_millis();
        let mut points = vec![];
        registry.each(&mut |name, instrument| {
            let Some(snapshot) = instrument.snapshot() else {
                return;
            };
            for point in convert(name, &snapshot, time, self.unit) {
                if !point.value.is_finite() {
                    warn!(name = %point.name, value = point.value, "dropping non-finite data point");
                    continue;
                }
                points.push(point);
            }
        });
        points
    }

    /// One export cycle. An empty registry still sends an empty batch.
    pub fn export(&self, registry: &impl Registry) -> Result<(), TransportError> {
        let points = self.assemble(registry);
        self.transport.send(&points)
    }

    /// Export every `frequency` until `cancel` fires. The first export
    /// happens one interval after the call.
    ///
    /// The timer is rearmed before each export, so a slow export delays the
    /// schedule by at most its own duration.
    pub async fn run(
        &self,
        registry: &impl Registry,
        frequency: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + frequency, frequency);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.export(registry) {
                Ok(()) => debug!("metrics exported"),
                Err(e) => warn!(error = %e, "could not export metrics"),
            }
        }
        debug!("metrics exporter stopped");
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("build TLS config; err={0}")]
    Tls(#[from] rustls::Error),
    #[error("spawn exporter thread; err={0}")]
    Spawn(#[from] std::io::Error),
}

/// Resolve `options` and run the exporter on a dedicated thread until
/// `cancel` fires.
///
/// Returns `Ok(None)` without starting anything when no endpoint URL could be
/// resolved.
pub fn start<R>(
    registry: R,
    options: Options,
    env: &impl Environment,
    cancel: CancellationToken,
) -> Result<Option<JoinHandle<()>>, StartError>
where
    R: Registry + 'static,
{
    let config = options.resolve(env);
    if config.url.is_empty() {
        warn!("could not export metrics: no URL provided");
        return Ok(None);
    }

    let transport = HttpTransport::from_config(&config)?;
    let exporter = Exporter::new(transport, config.time_unit);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let frequency = config.frequency;
    info!(
        url = %config.url,
        frequency_sec = frequency.as_secs_f32(),
        unit = config.time_unit.name(),
        "starting metrics exporter"
    );
    let handle = std::thread::Builder::new()
        .name("metrics-exporter".into())
        .spawn(move || runtime.block_on(exporter.run(&registry, frequency, cancel)))?;
    Ok(Some(handle))
}
