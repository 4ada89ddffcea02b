//! Service instance and health check models

use serde::Deserialize;

/// Name of the cluster-membership check maintained by the serf layer.
/// It reflects gossip state, not service liveness, so it never counts
/// toward health eligibility.
pub const SERF_HEALTH_CHECK: &str = "serfHealth";

/// Node hosting a registered service instance
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    #[serde(rename = "Node")]
    pub name: String,

    #[serde(rename = "Address")]
    pub address: String,
}

/// Service registration as recorded by the agent
#[derive(Debug, Clone, Deserialize)]
pub struct AgentService {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Service")]
    pub service: String,

    #[serde(rename = "Address", default)]
    pub address: String,

    #[serde(rename = "Port", default)]
    pub port: u16,

    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
}

/// Status of a single health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CheckStatus {
    Passing,
    Warning,
    Critical,
    Unknown,
}

impl From<String> for CheckStatus {
    fn from(status: String) -> Self {
        // Anything unrecognized (maintenance mode, future statuses) is
        // Unknown, which the classifier treats as not passing.
        match status.as_str() {
            "passing" => CheckStatus::Passing,
            "warning" => CheckStatus::Warning,
            "critical" => CheckStatus::Critical,
            _ => CheckStatus::Unknown,
        }
    }
}

/// One health probe result attached to an instance
#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Status")]
    pub status: CheckStatus,
}

/// One registered, running instance of a named service, with the health
/// checks currently known for it. Built fresh on every discovery query;
/// registry state may change between invocations, so instances are never
/// cached across queries.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInstance {
    #[serde(rename = "Node")]
    pub node: Node,

    #[serde(rename = "Service")]
    pub service: AgentService,

    #[serde(rename = "Checks", default)]
    pub checks: Vec<HealthCheck>,
}

impl ServiceInstance {
    /// An instance is healthy if all its eligible checks are passing.
    /// serfHealth is not eligible; no checks (or no eligible checks) means
    /// failing, not unknown.
    pub fn is_healthy(&self) -> bool {
        if self.checks.is_empty() {
            // No checks = failing
            return false;
        }

        let mut healthy = true;
        let mut eligible = 0;
        for check in &self.checks {
            if check.name == SERF_HEALTH_CHECK {
                continue;
            }
            // All found checks have to be passing
            healthy = healthy && check.status == CheckStatus::Passing;
            eligible += 1;
        }

        // No eligible checks were found
        if eligible == 0 {
            return false;
        }

        healthy
    }

    /// Endpoint the instance serves on, for display
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.service.address, self.service.port)
    }
}
