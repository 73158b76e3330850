//! Exporter configuration.
//!
//! [`Options`] holds whatever the caller set explicitly; [`Options::resolve`]
//! fills the gaps from the platform environment once, before the export loop
//! starts, and yields the read-only [`Config`].

use std::time::Duration;

use tracing::warn;

use crate::{
    env::{self, Environment},
    payload::Identity,
    unit::DurationUnit,
};

pub const DEFAULT_FREQUENCY: Duration = Duration::from_secs(60);
pub const DEFAULT_SERVICE_NAME: &str = "metrics-forwarder";

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Export interval. Defaults to one minute; zero counts as unset.
    pub frequency: Option<Duration>,
    /// Defaults to `INSTANCE_GUID`.
    pub instance_id: Option<String>,
    /// Defaults to `INSTANCE_INDEX`.
    pub instance_index: Option<String>,
    pub token: Option<String>,
    pub url: Option<String>,
    /// Defaults to `application_id` of `VCAP_APPLICATION`.
    pub app_id: Option<String>,
    /// Granularity timer durations are reported in. Defaults to milliseconds.
    pub time_unit: Option<Duration>,
    /// Service binding the token and URL are looked up under.
    pub service_name: Option<String>,
    pub skip_tls_verification: Option<bool>,
}
impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = Some(frequency);
        self
    }
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }
    pub fn with_instance_index(mut self, index: impl Into<String>) -> Self {
        self.instance_index = Some(index.into());
        self
    }
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
    pub fn with_app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = Some(id.into());
        self
    }
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = Some(unit);
        self
    }
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
    pub fn with_skip_tls_verification(mut self, skip: bool) -> Self {
        self.skip_tls_verification = Some(skip);
        self
    }

    /// Lookup failures are logged and leave the affected fields empty.
    pub fn resolve(self, env: &impl Environment) -> Config {
        let service_name = non_empty(self.service_name)
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned());

        let mut token = non_empty(self.token);
        let mut url = non_empty(self.url);
        if token.is_none() || url.is_none() {
            match env::credentials(env, &service_name) {
                Ok(creds) => {
                    token.get_or_insert(creds.access_token);
                    url.get_or_insert(creds.url);
                }
                Err(e) => {
                    warn!(service = %service_name, error = %format!("{e:#}"), "could not get metrics forwarder credentials");
                }
            }
        }

        let app_id = non_empty(self.app_id).unwrap_or_else(|| match env::app_id(env) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "could not get app id");
                String::new()
            }
        });

        let frequency = self
            .frequency
            .filter(|f| !f.is_zero())
            .unwrap_or(DEFAULT_FREQUENCY);
        let time_unit = self
            .time_unit
            .map(DurationUnit::resolve)
            .unwrap_or_default();

        Config {
            frequency,
            url: url.unwrap_or_default(),
            token: token.unwrap_or_default(),
            identity: Identity {
                app_id,
                instance_id: self.instance_id.unwrap_or_else(|| env::instance_id(env)),
                instance_index: self
                    .instance_index
                    .unwrap_or_else(|| env::instance_index(env)),
            },
            time_unit,
            skip_tls_verification: self.skip_tls_verification.unwrap_or(false),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Resolved, read-only for the lifetime of the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub frequency: Duration,
    pub url: String,
    pub token: String,
    pub identity: Identity,
    pub time_unit: DurationUnit,
    pub skip_tls_verification: bool,
}
