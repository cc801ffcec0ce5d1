//! HTTP service registry client.
//!
//! # Responsibilities
//! - Query the registry for the instances of one service in a namespace
//! - Pick the first instance and read its host/port attributes
//!
//! # Wire Format
//! This is a plain-HTTP registry facade, not the AWS Cloud Map API (which is a
//! SigV4-signed `DiscoverInstances` POST). Only the response body borrows Cloud
//! Map's shape, so a thin sidecar or gateway in front of Cloud Map, Consul or
//! similar can serve it.
//!
//! ```text
//! GET {url}/namespaces/{namespace}/services/{service}/instances
//!
//! {"Instances": [{"InstanceId": "...", "Attributes": {"AWS_INSTANCE_IPV4": "10.0.0.5",
//!                                                     "AWS_INSTANCE_PORT": "9000"}}]}
//! ```
//!
//! # Design Decisions
//! - No caching: every call is a fresh lookup
//! - Attribute values may be strings or numbers
//! - A 404 from the registry means "no such service", not a failure

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::config::RegistryConfig;
use crate::discovery::{Discovery, DiscoveryError, Instance};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiscoverInstancesResponse {
    #[serde(default)]
    instances: Vec<InstanceSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceSummary {
    #[serde(default)]
    instance_id: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, serde_json::Value>,
}

/// Discovery against a remote HTTP registry.
#[derive(Debug, Clone)]
pub struct RegistryDiscovery {
    client: reqwest::Client,
    base_url: Url,
    namespace: String,
    host_attribute: String,
    port_attribute: String,
}

impl RegistryDiscovery {
    /// Create a registry client. `timeout` bounds each lookup at the transport level.
    pub fn new(config: &RegistryConfig, timeout: Duration) -> Result<Self, DiscoveryError> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(DiscoveryError::CannotBeABase(config.url.clone()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            namespace: config.namespace.clone(),
            host_attribute: config.host_attribute.clone(),
            port_attribute: config.port_attribute.clone(),
        })
    }

    /// URL listing the instances of `service`.
    pub fn instances_url(&self, service: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "namespaces",
                self.namespace.as_str(),
                "services",
                service,
                "instances",
            ]);
        }
        url
    }

    fn first_instance(&self, response: DiscoverInstancesResponse) -> Option<Instance> {
        let summary = response.instances.into_iter().next()?;
        tracing::trace!(instance_id = ?summary.instance_id, "Registry returned instance");

        Some(Instance {
            host: attribute_text(&summary.attributes, &self.host_attribute),
            port: attribute_text(&summary.attributes, &self.port_attribute),
        })
    }
}

fn attribute_text(attributes: &HashMap<String, serde_json::Value>, key: &str) -> Option<String> {
    match attributes.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Discovery for RegistryDiscovery {
    async fn discover(&self, service: &str) -> Result<Option<Instance>, DiscoveryError> {
        let url = self.instances_url(service);
        tracing::debug!(url = %url, "Querying service registry");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: DiscoverInstancesResponse = serde_json::from_slice(&body)?;
        Ok(self.first_instance(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RegistryDiscovery {
        let config = RegistryConfig {
            url: "http://registry.internal:8500/v1/".into(),
            namespace: "pre-prod".into(),
            host_attribute: "AWS_INSTANCE_IPV4".into(),
            port_attribute: "AWS_INSTANCE_PORT".into(),
        };
        RegistryDiscovery::new(&config, Duration::from_secs(1)).unwrap()
    }

    fn parse(raw: &str) -> Option<Instance> {
        registry().first_instance(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn test_instances_url() {
        assert_eq!(
            registry().instances_url("auth-preprod").as_str(),
            "http://registry.internal:8500/v1/namespaces/pre-prod/services/auth-preprod/instances"
        );
    }

    #[test]
    fn test_instances_url_escapes_segments() {
        let url = registry().instances_url("a/b");
        assert!(url.as_str().ends_with("/services/a%2Fb/instances"));
    }

    #[test]
    fn test_first_instance_wins() {
        let instance = parse(
            r#"{"Instances": [
                {"InstanceId": "i-1", "Attributes": {"AWS_INSTANCE_IPV4": "10.0.0.5", "AWS_INSTANCE_PORT": "9000"}},
                {"InstanceId": "i-2", "Attributes": {"AWS_INSTANCE_IPV4": "10.0.0.6", "AWS_INSTANCE_PORT": "9001"}}
            ]}"#,
        );
        assert_eq!(instance, Some(Instance::new("10.0.0.5", "9000")));
    }

    #[test]
    fn test_numeric_port_attribute() {
        let instance = parse(
            r#"{"Instances": [{"Attributes": {"AWS_INSTANCE_IPV4": "10.0.0.5", "AWS_INSTANCE_PORT": 9000}}]}"#,
        );
        assert_eq!(instance, Some(Instance::new("10.0.0.5", "9000")));
    }

    #[test]
    fn test_missing_attributes_are_partial() {
        let instance = parse(r#"{"Instances": [{"Attributes": {"AWS_INSTANCE_IPV4": "10.0.0.5"}}]}"#);
        assert_eq!(
            instance,
            Some(Instance {
                host: Some("10.0.0.5".into()),
                port: None
            })
        );
    }

    #[test]
    fn test_no_instances() {
        assert_eq!(parse(r#"{"Instances": []}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = RegistryConfig {
            url: "mailto:ops@example.com".into(),
            namespace: "ns".into(),
            host_attribute: "h".into(),
            port_attribute: "p".into(),
        };
        let err = RegistryDiscovery::new(&config, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DiscoveryError::CannotBeABase(_)));
    }
}
