//! Process-wide client cache

use super::error::RegistryError;
use super::ConsulClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lookup-or-create cache of [`ConsulClient`] handles, keyed by
/// (address, token).
///
/// At most one client exists per distinct endpoint for the duration of a run;
/// both discovery and deregistration share the same cache. Clients are never
/// torn down explicitly, they live until the process exits.
#[derive(Default)]
pub struct ClientCache {
    clients: Mutex<HashMap<(String, String), Arc<ConsulClient>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the client for an agent address, creating it on first use
    pub fn get(&self, address: &str, token: &str) -> Result<Arc<ConsulClient>, RegistryError> {
        let key = (address.to_string(), token.to_string());
        // Cached clients stay valid even if a holder panicked mid-lookup, so
        // a poisoned lock is recoverable.
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(ConsulClient::new(address, token)?);
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }
}
