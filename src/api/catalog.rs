//! Catalog and health endpoints

use super::error::RegistryError;
use super::ConsulClient;
use crate::models::ServiceInstance;
use std::collections::HashMap;

impl ConsulClient {
    /// Get the names of all services known to the catalog
    pub async fn list_services(&self) -> Result<Vec<String>, RegistryError> {
        // The catalog endpoint returns a map of service name -> tags; only
        // the names matter here.
        let services: HashMap<String, Vec<String>> =
            self.get_json("v1/catalog/services", &[]).await?;
        Ok(services.into_keys().collect())
    }

    /// Get all instances of a service with their check results, healthy or
    /// not, optionally restricted server-side to a tag
    pub async fn service_health(
        &self,
        service_name: &str,
        tag: Option<&str>,
    ) -> Result<Vec<ServiceInstance>, RegistryError> {
        let path = format!("v1/health/service/{}", urlencoding::encode(service_name));
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(tag) = tag {
            query.push(("tag", tag));
        }
        self.get_json(&path, &query).await
    }
}
