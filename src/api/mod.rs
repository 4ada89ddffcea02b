//! API module for Consul agent interactions

pub mod agent;
mod cache;
pub mod catalog;
mod client;
mod error;

pub use cache::ClientCache;
pub use client::ConsulClient;
pub use error::RegistryError;
