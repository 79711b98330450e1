use std::collections::HashMap;

use tokio::sync::RwLock;

use super::types::Service;

/// In-process view of the services this node can tear down, keyed by uuid.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Service>>,
}

impl ServiceRegistry {
    pub fn new(services: Vec<Service>) -> Self {
        ServiceRegistry {
            services: RwLock::new(
                services
                    .into_iter()
                    .map(|service| (service.uuid.clone(), service))
                    .collect(),
            ),
        }
    }

    pub async fn get(&self, uuid: &str) -> Option<Service> {
        self.services.read().await.get(uuid).cloned()
    }

    pub async fn remove(&self, uuid: &str) -> Option<Service> {
        self.services.write().await.remove(uuid)
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }
}
