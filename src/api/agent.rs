//! Agent endpoints

use super::error::RegistryError;
use super::ConsulClient;

impl ConsulClient {
    /// Remove a service registration from the agent this client is bound to.
    /// This mutates remote registry state and cannot be undone.
    pub async fn deregister_service(&self, service_id: &str) -> Result<(), RegistryError> {
        let path = format!(
            "v1/agent/service/deregister/{}",
            urlencoding::encode(service_id)
        );
        self.put(&path).await
    }
}
