//! Zombie - hunt and deregister dead Consul services
//!
//! Walks the registry catalog, classifies every instance by its health
//! checks, and either lists the matches or deregisters the failing ones at a
//! controlled rate.

pub mod api;
pub mod config;
pub mod deregister;
pub mod discover;
pub mod models;
pub mod output;
