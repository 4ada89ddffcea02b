//! HTTP client for the Consul agent API

use super::error::RegistryError;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// Address of the local agent when none is configured.
const DEFAULT_AGENT_ADDR: &str = "127.0.0.1:8500";

/// Header carrying the ACL token on every API call.
const TOKEN_HEADER: &str = "X-Consul-Token";

/// HTTP client bound to one agent endpoint.
///
/// Clients are parameterized by (address, token); an empty address means the
/// local/default agent. Obtain instances through [`super::ClientCache`] so at
/// most one exists per endpoint for the life of the process.
pub struct ConsulClient {
    base_url: Url,
    token: Option<String>,
    http_client: Client,
}

impl ConsulClient {
    /// Create a client for the given agent address (or the local agent if "")
    pub fn new(address: &str, token: &str) -> Result<Self, RegistryError> {
        let address = if address.is_empty() {
            DEFAULT_AGENT_ADDR
        } else {
            address
        };
        let with_scheme = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let base_url = Url::parse(&with_scheme)
            .map_err(|_| RegistryError::InvalidAddress(address.to_string()))?;
        if base_url.host_str().is_none() {
            return Err(RegistryError::InvalidAddress(address.to_string()));
        }

        let http_client = Client::builder()
            .user_agent(concat!("consul-zombie/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        Ok(Self {
            base_url,
            token: (!token.is_empty()).then(|| token.to_string()),
            http_client,
        })
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, RegistryError> {
        self.base_url
            .join(path)
            .map_err(|_| RegistryError::InvalidAddress(format!("{}{}", self.base_url, path)))
    }

    /// Make a GET request and deserialize the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RegistryError> {
        let mut request = self.http_client.get(self.endpoint_url(path)?).query(query);
        if let Some(ref token) = self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::Parse(e.to_string()))?;
        Ok(data)
    }

    /// Make a PUT request with an empty body, discarding the response body
    pub async fn put(&self, path: &str) -> Result<(), RegistryError> {
        let mut request = self.http_client.put(self.endpoint_url(path)?);
        if let Some(ref token) = self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
