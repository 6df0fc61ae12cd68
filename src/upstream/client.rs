//! reqwest-backed upstream dispatcher.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, RelayResult};
use crate::net::tls::build_client;
use crate::upstream::{Upstream, UpstreamRequest, UpstreamResponse};

/// Headers the HTTP client derives from the target URL and payload.
const TRANSPORT_HEADERS: [&str; 3] = ["host", "content-length", "transfer-encoding"];

/// Errors raised while constructing an [`UpstreamClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid upstream endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Sends `POST` requests to one fixed remote JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl UpstreamClient {
    /// Build the client and endpoint from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ClientBuildError> {
        let endpoint_str = config.endpoint();
        let endpoint = endpoint_str
            .parse()
            .map_err(|source| ClientBuildError::InvalidEndpoint {
                endpoint: endpoint_str,
                source,
            })?;
        let client = build_client(config)?;

        tracing::info!(
            endpoint = %endpoint,
            trust = ?config.trust,
            "Upstream client initialized"
        );

        Ok(Self::new(client, endpoint))
    }

    /// Wrap an already configured client.
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Upstream for UpstreamClient {
    async fn dispatch(&self, request: UpstreamRequest) -> RelayResult<UpstreamResponse> {
        let headers = outbound_headers(&request)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| RelayError::Dispatch(describe(&e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::Dispatch(describe(&e)))?
            .to_vec();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn outbound_headers(request: &UpstreamRequest) -> RelayResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        if TRANSPORT_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RelayError::Dispatch(format!("header name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| RelayError::Dispatch(format!("header {:?} value: {}", name, e)))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Error message including its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::HeaderFields;

    #[test]
    fn transport_headers_are_not_copied() {
        let mut headers = HeaderFields::new();
        headers.insert("host".into(), "relay:8080".into());
        headers.insert("content-length".into(), "52".into());
        headers.insert("content-type".into(), "application/json".into());
        headers.insert("authorization".into(), "Basic dXNlcjpwYXNz".into());

        let out = outbound_headers(&UpstreamRequest {
            headers,
            body: Vec::new(),
        })
        .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out["content-type"], "application/json");
        assert_eq!(out["authorization"], "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn invalid_header_name_fails_dispatch() {
        let mut headers = HeaderFields::new();
        headers.insert("bad header".into(), "x".into());
        let err = outbound_headers(&UpstreamRequest {
            headers,
            body: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, RelayError::Dispatch(_)));
    }

    #[test]
    fn endpoint_from_config() {
        let config = UpstreamConfig {
            address: "10.1.2.3".into(),
            port: 8443,
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint().as_str(), "https://10.1.2.3:8443/");
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let config = UpstreamConfig {
            address: "bad host".into(),
            ..UpstreamConfig::default()
        };
        let err = UpstreamClient::from_config(&config).unwrap_err();
        assert!(matches!(err, ClientBuildError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_dispatch_error() {
        let config = UpstreamConfig {
            address: "127.0.0.1".into(),
            port: 1,
            scheme: "http".into(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::from_config(&config).unwrap();
        let err = client
            .dispatch(UpstreamRequest {
                headers: HeaderFields::new(),
                body: b"{}".to_vec(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Dispatch(_)));
    }
}
