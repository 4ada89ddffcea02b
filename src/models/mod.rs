//! Data models for registry state

mod service;

pub use service::{AgentService, CheckStatus, HealthCheck, Node, ServiceInstance, SERF_HEALTH_CHECK};
