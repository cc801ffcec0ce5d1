//! Fixed service table from configuration.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::config::schema::StaticInstanceConfig;
use crate::discovery::{Discovery, DiscoveryError, Instance};

/// Discovery backed by a table loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    instances: HashMap<String, Instance>,
}

impl StaticDiscovery {
    pub fn new(instances: HashMap<String, Instance>) -> Self {
        Self { instances }
    }

    pub fn from_config(instances: &BTreeMap<String, StaticInstanceConfig>) -> Self {
        let instances = instances
            .iter()
            .map(|(name, instance)| {
                (
                    name.clone(),
                    Instance::new(instance.host.clone(), instance.port.to_string()),
                )
            })
            .collect();
        Self { instances }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn discover(&self, service: &str) -> Result<Option<Instance>, DiscoveryError> {
        Ok(self.instances.get(service).cloned())
    }
}
