//! HTTP client for the executor relay network's quote API.

use std::collections::HashMap;

use alloy_primitives::Bytes;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::chain::addresses::{EXECUTOR_API_MAINNET, EXECUTOR_API_TESTNET};
use crate::error::{Result, RouteError};
use crate::executor::{ExecutorCapabilities, QuoteRequest, SignedQuoteResponse};
use crate::spans;
use crate::traits::ExecutorApi;

/// Production [`ExecutorApi`] over HTTP.
///
/// # Examples
///
/// ```rust
/// use m0_route::providers::ExecutorHttpClient;
///
/// let client = ExecutorHttpClient::mainnet();
/// ```
#[derive(Debug, Clone)]
pub struct ExecutorHttpClient {
    base_url: Url,
    client: Client,
}

impl ExecutorHttpClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Url::parse(EXECUTOR_API_MAINNET).expect("static executor url is valid"))
    }

    pub fn testnet() -> Self {
        Self::new(Url::parse(EXECUTOR_API_TESTNET).expect("static executor url is valid"))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RouteError::InvalidConfig(format!("executor url: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&QuoteRequest>,
    ) -> Result<reqwest::Response> {
        let span = spans::http_request(method.as_str(), &url);
        async {
            let mut request = self.client.request(method, url);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(RouteError::RateLimitExceeded {
                    retry_after_seconds: response
                        .headers()
                        .get("retry-after")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(1),
                });
            }
            if status.is_client_error() {
                let text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %text, event = "executor_request_rejected");
                return Err(RouteError::ExecutorRejected(format!("{status}: {text}")));
            }
            if status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %text, event = "executor_unavailable");
                return Err(RouteError::Executor(format!("{status}: {text}")));
            }
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl ExecutorApi for ExecutorHttpClient {
    async fn capabilities(&self) -> Result<HashMap<u16, ExecutorCapabilities>> {
        let url = self.endpoint("v0/capabilities")?;
        let raw: HashMap<String, ExecutorCapabilities> =
            self.send(Method::GET, url, None).await?.json().await?;

        let capabilities = raw
            .into_iter()
            .filter_map(|(chain, caps)| match chain.parse::<u16>() {
                Ok(id) => Some((id, caps)),
                Err(_) => {
                    warn!(chain = %chain, event = "executor_capability_key_invalid");
                    None
                }
            })
            .collect::<HashMap<_, _>>();
        debug!(chains = capabilities.len(), event = "executor_capabilities_retrieved");
        Ok(capabilities)
    }

    async fn quote(
        &self,
        source: u16,
        destination: u16,
        relay_instructions: Bytes,
    ) -> Result<SignedQuoteResponse> {
        let url = self.endpoint("v0/quote")?;
        let body = QuoteRequest {
            src_chain: source,
            dst_chain: destination,
            relay_instructions,
        };
        let response: SignedQuoteResponse =
            self.send(Method::POST, url, Some(&body)).await?.json().await?;
        debug!(
            source = source,
            destination = destination,
            estimated_cost = ?response.estimated_cost,
            event = "executor_quote_retrieved"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ExecutorHttpClient {
        ExecutorHttpClient::new(server.base_url().parse().unwrap())
    }

    #[tokio::test]
    async fn test_capabilities_keyed_by_wormhole_chain_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v0/capabilities");
            then.status(200).json_body(json!({
                "1": { "requestPrefixes": ["ERV1"], "gasDropOffLimit": "1000" },
                "30": { "requestPrefixes": [] },
                "bogus": {}
            }));
        });

        let capabilities = client(&server).capabilities().await.unwrap();

        assert_eq!(capabilities.len(), 2);
        assert!(capabilities[&1].supports_vaa_requests());
        assert!(!capabilities[&30].supports_vaa_requests());
    }

    #[tokio::test]
    async fn test_quote_posts_camel_case_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v0/quote").json_body(json!({
                "srcChain": 30,
                "dstChain": 1,
                "relayInstructions": "0x01",
            }));
            then.status(200).json_body(json!({
                "signedQuote": "0x4551",
                "estimatedCost": "12345"
            }));
        });

        let response = client(&server)
            .quote(30, 1, Bytes::from(vec![1]))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.signed_quote, Bytes::from(vec![0x45, 0x51]));
        assert_eq!(response.estimated_cost().unwrap().to::<u64>(), 12345);
    }

    #[tokio::test]
    async fn test_rejected_request_is_permanent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v0/quote");
            then.status(400).body("unsupported chain");
        });

        let err = client(&server)
            .quote(30, 999, Bytes::new())
            .await
            .unwrap_err();
        assert!(
            matches!(err, RouteError::ExecutorRejected(ref m) if m.contains("unsupported chain"))
        );
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v0/capabilities");
            then.status(503).body("maintenance");
        });

        let err = client(&server).capabilities().await.unwrap_err();
        assert!(matches!(err, RouteError::Executor(ref m) if m.contains("maintenance")));
        assert!(err.is_retryable());
    }
}
