//! Deregistration controller: targeting, rate limiting, best-effort calls

use crate::api::{ClientCache, RegistryError};
use crate::models::ServiceInstance;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

/// Options for a deregistration run
pub struct DeregisterOptions {
    /// Port on which each instance's node exposes its local agent (not the
    /// instance's own service port).
    pub remote_port: u16,
    /// ACL token used for every agent connection.
    pub token: String,
    /// Target every instance regardless of health.
    pub force: bool,
    /// Upper bound on deregistration calls per minute; 0 means unthrottled.
    pub rate_per_minute: u32,
}

/// What a deregistration run did
#[derive(Debug, Default)]
pub struct DeregisterOutcome {
    /// Service IDs whose deregister call succeeded.
    pub deregistered: Vec<String>,
    /// Service IDs whose deregister call failed; the run continued past them.
    pub failed: Vec<(String, RegistryError)>,
}

/// Fixed-interval gate between successive deregistration calls.
///
/// The interval is measured from completion of the previous call, not from a
/// rolling schedule, so a slow call does not earn a shorter wait afterwards
/// and early completions never allow bursts.
struct RateGate {
    delay: Option<Duration>,
    next_allowed: Option<Instant>,
}

impl RateGate {
    fn per_minute(rate: u32) -> Self {
        Self {
            delay: (rate > 0).then(|| Duration::from_secs_f64(60.0 / f64::from(rate))),
            next_allowed: None,
        }
    }

    /// Block until the interval since the previous call has elapsed
    async fn wait(&mut self) {
        if let Some(at) = self.next_allowed {
            sleep_until(at).await;
        }
    }

    /// Record that a call just completed, arming the next wait
    fn arm(&mut self) {
        if let Some(delay) = self.delay {
            self.next_allowed = Some(Instant::now() + delay);
        }
    }
}

/// Which instances a run will deregister: the unhealthy ones, or all of them
/// when `force` is set
fn targets(instances: &[ServiceInstance], force: bool) -> Vec<&ServiceInstance> {
    instances
        .iter()
        .filter(|se| force || !se.is_healthy())
        .collect()
}

/// Deregister the failing instances in the list, or all of them if `force`
/// is set.
///
/// Calls go to each instance's own node agent at `remote_port`, one at a
/// time, spaced by the rate gate. A failed client acquisition aborts the
/// whole run; a failed deregister call is logged and the run continues with
/// the remaining instances.
pub async fn deregister(
    cache: &ClientCache,
    instances: &[ServiceInstance],
    opts: &DeregisterOptions,
) -> Result<DeregisterOutcome> {
    let mut gate = RateGate::per_minute(opts.rate_per_minute);
    let mut outcome = DeregisterOutcome::default();

    for se in targets(instances, opts.force) {
        gate.wait().await;

        let agent_addr = format!("{}:{}", se.node.address, opts.remote_port);
        let client = cache
            .get(&agent_addr, &opts.token)
            .with_context(|| format!("Unable to get consul client for {}", agent_addr))?;

        info!(
            service = %se.service.service,
            id = %se.service.id,
            agent = %agent_addr,
            "deregistering"
        );
        match client.deregister_service(&se.service.id).await {
            Ok(()) => outcome.deregistered.push(se.service.id.clone()),
            Err(err) => {
                warn!(id = %se.service.id, error = %err, "unable to deregister");
                outcome.failed.push((se.service.id.clone(), err));
            }
        }

        gate.arm();
    }

    Ok(outcome)
}
