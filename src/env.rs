//! Platform-provided identity and credentials.
//!
//! Cloud Foundry style: service bindings in `VCAP_SERVICES`, the application
//! descriptor in `VCAP_APPLICATION`, and the instance in `INSTANCE_GUID` /
//! `INSTANCE_INDEX`.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use serde::Deserialize;

pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
pub const VCAP_APPLICATION: &str = "VCAP_APPLICATION";
pub const INSTANCE_GUID: &str = "INSTANCE_GUID";
pub const INSTANCE_INDEX: &str = "INSTANCE_INDEX";

pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;
impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ServiceBinding {
    credentials: BindingCredentials,
}

#[derive(Debug, Deserialize)]
struct BindingCredentials {
    #[serde(default)]
    access_key: String,
    #[serde(default)]
    hostname: String,
}

#[derive(Debug, Deserialize)]
struct Application {
    application_id: String,
}

pub fn instance_index(env: &impl Environment) -> String {
    env.var(INSTANCE_INDEX).unwrap_or_default()
}

pub fn instance_id(env: &impl Environment) -> String {
    env.var(INSTANCE_GUID).unwrap_or_default()
}

pub fn app_id(env: &impl Environment) -> anyhow::Result<String> {
    let raw = env.var(VCAP_APPLICATION).unwrap_or_default();
    let application: Application =
        serde_json::from_str(&raw).with_context(|| format!("parse {VCAP_APPLICATION}"))?;
    Ok(application.application_id)
}

/// Token and URL of the first binding of `service_name`.
pub fn credentials(env: &impl Environment, service_name: &str) -> anyhow::Result<Credentials> {
    let raw = env.var(VCAP_SERVICES).unwrap_or_default();
    let mut services: HashMap<String, Vec<ServiceBinding>> =
        serde_json::from_str(&raw).with_context(|| format!("parse {VCAP_SERVICES}"))?;
    let binding = services
        .remove(service_name)
        .and_then(|bindings| bindings.into_iter().next())
        .ok_or_else(|| anyhow!("custom metrics service not found; name={service_name}"))?;
    Ok(Credentials {
        access_token: binding.credentials.access_key,
        url: binding.credentials.hostname,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const SERVICES: &str = r#"{
        "metrics-forwarder": [{
            "name": "forwarder",
            "credentials": {
                "access_key": "secret-token",
                "hostname": "https://metrics.example.com/v1/metrics"
            }
        }]
    }"#;

    #[test]
    fn reads_credentials_of_named_service() {
        let env = env(&[(VCAP_SERVICES, SERVICES)]);
        let creds = credentials(&env, "metrics-forwarder").unwrap();
        assert_eq!(
            creds,
            Credentials {
                access_token: "secret-token".into(),
                url: "https://metrics.example.com/v1/metrics".into(),
            }
        );
    }

    #[test]
    fn missing_service_is_an_error() {
        let env = env(&[(VCAP_SERVICES, SERVICES)]);
        let err = credentials(&env, "other-service").unwrap_err();
        assert!(err.to_string().contains("custom metrics service not found"));
    }

    #[test]
    fn unset_services_is_an_error() {
        let env = env(&[]);
        assert!(credentials(&env, "metrics-forwarder").is_err());
    }

    #[test]
    fn reads_application_and_instance() {
        let env = env(&[
            (VCAP_APPLICATION, r#"{"application_id":"app-guid","name":"web"}"#),
            (INSTANCE_GUID, "instance-guid"),
            (INSTANCE_INDEX, "3"),
        ]);
        assert_eq!(app_id(&env).unwrap(), "app-guid");
        assert_eq!(instance_id(&env), "instance-guid");
        assert_eq!(instance_index(&env), "3");
    }

    #[test]
    fn unset_instance_is_empty() {
        let env = env(&[]);
        assert_eq!(instance_id(&env), "");
        assert_eq!(instance_index(&env), "");
        assert!(app_id(&env).is_err());
    }
}
