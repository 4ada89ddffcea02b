//! Service discovery: catalog walk, dedup merge, and name filtering

use crate::api::ClientCache;
use crate::models::ServiceInstance;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;

/// Get every instance known to the registry, limited to those matching the
/// search criteria.
///
/// Walks the full catalog and fetches health entries per service name,
/// merging per (node, service id) so an instance reachable through several
/// name queries appears exactly once. `tag` restricts the instance set
/// server-side; `name_pattern` is a regex matched against service IDs and
/// names (a substring hit anywhere qualifies). Result order is unspecified.
///
/// Any catalog or health lookup error is fatal to the whole run; there is no
/// partial result.
pub async fn discover(
    cache: &ClientCache,
    local_addr: &str,
    token: &str,
    name_pattern: &str,
    tag: &str,
) -> Result<Vec<ServiceInstance>> {
    // Reject a bad pattern before touching the network.
    let pattern = compile_pattern(name_pattern)?;

    let client = cache
        .get(local_addr, token)
        .context("Unable to get a consul client connection")?;

    let service_names = client
        .list_services()
        .await
        .context("Unable to get list of services from catalog")?;

    let tag = (!tag.is_empty()).then_some(tag);
    let mut merged: HashMap<(String, String), ServiceInstance> = HashMap::new();
    for name in service_names {
        let entries = client
            .service_health(&name, tag)
            .await
            .with_context(|| format!("Unable to query health of service \"{}\"", name))?;
        for entry in entries {
            let key = (entry.node.name.clone(), entry.service.id.clone());
            merged.insert(key, entry);
        }
    }

    let mut instances: Vec<ServiceInstance> = merged.into_values().collect();
    if let Some(re) = pattern {
        instances.retain(|se| re.is_match(&se.service.id) || re.is_match(&se.service.service));
    }

    Ok(instances)
}

/// Compile the name pattern, treating "" as no filter
fn compile_pattern(name_pattern: &str) -> Result<Option<Regex>> {
    if name_pattern.is_empty() {
        return Ok(None);
    }
    let re = Regex::new(name_pattern)
        .with_context(|| format!("Invalid service pattern \"{}\"", name_pattern))?;
    Ok(Some(re))
}
