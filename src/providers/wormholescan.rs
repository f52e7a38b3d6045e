//! Wormholescan attestation provider implementation.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, trace, Instrument};
use url::Url;

use crate::chain::addresses::{WORMHOLESCAN_API_MAINNET, WORMHOLESCAN_API_TESTNET};
use crate::error::{Result, RouteError};
use crate::protocol::Chain;
use crate::spans;
use crate::traits::AttestationProvider;

/// Wait applied when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
struct OperationsResponse {
    #[serde(default)]
    operations: Vec<Operation>,
}

#[derive(Debug, Deserialize)]
struct Operation {
    vaa: Option<SignedVaa>,
}

#[derive(Debug, Deserialize)]
struct SignedVaa {
    /// Base64 of the serialized VAA
    raw: String,
}

/// Production attestation provider using the Wormholescan API.
///
/// Looks up every operation of a source transaction and returns the raw VAAs
/// the guardians have signed so far.
///
/// # Examples
///
/// ```rust,no_run
/// use m0_route::providers::WormholescanClient;
/// use m0_route::traits::AttestationProvider;
/// use m0_route::Chain;
///
/// # async fn example() -> Result<(), m0_route::RouteError> {
/// let provider = WormholescanClient::mainnet();
/// let vaas = provider.get_signed_messages(Chain::Base, "0xabc").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WormholescanClient {
    base_url: Url,
    client: Client,
}

impl WormholescanClient {
    /// Creates a provider against `base_url`, e.g. <https://api.wormholescan.io>
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn mainnet() -> Self {
        Self::from_static(WORMHOLESCAN_API_MAINNET)
    }

    pub fn testnet() -> Self {
        Self::from_static(WORMHOLESCAN_API_TESTNET)
    }

    fn from_static(url: &'static str) -> Self {
        Self::new(Url::parse(url).expect("static wormholescan url is valid"))
    }

    fn operations_url(&self, txid: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("api/v1/operations")
            .map_err(|e| RouteError::InvalidConfig(format!("wormholescan url: {e}")))?;
        url.query_pairs_mut().append_pair("txHash", txid);
        Ok(url)
    }
}

#[async_trait]
impl AttestationProvider for WormholescanClient {
    async fn get_signed_messages(&self, chain: Chain, txid: &str) -> Result<Vec<Bytes>> {
        let url = self.operations_url(txid)?;
        let span = spans::http_request("GET", &url);
        async {
            trace!(source_chain = %chain, txid = txid, event = "operations_requested");
            let response = self.client.get(url.clone()).send().await?;

            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                debug!(retry_after_seconds = retry_after, event = "rate_limit_exceeded");
                return Err(RouteError::RateLimitExceeded {
                    retry_after_seconds: retry_after,
                });
            }

            if status == StatusCode::NOT_FOUND {
                debug!(txid = txid, event = "operations_not_found");
                return Err(RouteError::AttestationNotFound {
                    txid: txid.to_string(),
                });
            }

            response.error_for_status_ref()?;
            let body: OperationsResponse = response.json().await?;

            let vaas = body
                .operations
                .into_iter()
                .filter_map(|operation| operation.vaa)
                .map(|vaa| BASE64.decode(vaa.raw).map(Bytes::from))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            if vaas.is_empty() {
                debug!(txid = txid, event = "vaa_not_signed");
                return Err(RouteError::AttestationNotFound {
                    txid: txid.to_string(),
                });
            }

            debug!(txid = txid, vaas = vaas.len(), event = "vaas_retrieved");
            Ok(vaas)
        }
        .instrument(span)
        .await
    }
}
