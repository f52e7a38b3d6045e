//! JSON-RPC account reader for SVM chains.

use std::str::FromStr;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_program::pubkey::Pubkey;
use tracing::{debug, trace, Instrument};
use url::Url;

use crate::error::{Result, RouteError};
use crate::protocol::Chain;
use crate::spans;
use crate::traits::SvmAccountReader;

/// Default `Retry-After` when a throttled RPC node does not send one.
const DEFAULT_RETRY_AFTER_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    /// `[payload, encoding]`
    data: (String, String),
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountInfo,
}

impl AccountInfo {
    fn decode(&self) -> Result<Vec<u8>> {
        if self.data.1 != "base64" {
            return Err(RouteError::Provider(format!(
                "unexpected account encoding '{}'",
                self.data.1
            )));
        }
        Ok(BASE64.decode(&self.data.0)?)
    }
}

/// Production [`SvmAccountReader`] speaking Solana JSON-RPC over HTTP.
///
/// # Examples
///
/// ```rust
/// use m0_route::providers::SvmRpcClient;
/// use m0_route::Chain;
///
/// let url = "https://api.mainnet-beta.solana.com".parse().unwrap();
/// let client = SvmRpcClient::new(Chain::Solana, url);
/// ```
#[derive(Debug, Clone)]
pub struct SvmRpcClient {
    chain: Chain,
    url: Url,
    client: Client,
}

impl SvmRpcClient {
    pub fn new(chain: Chain, url: Url) -> Self {
        Self {
            chain,
            url,
            client: Client::new(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let span = spans::rpc_call(method, self.chain);
        async {
            let body = json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            });
            trace!(method = method, event = "svm_rpc_request");

            let response = self.client.post(self.url.clone()).json(&body).send().await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(RouteError::RateLimitExceeded {
                    retry_after_seconds: retry_after,
                });
            }
            response.error_for_status_ref()?;

            let parsed: RpcResponse<T> = response.json().await?;
            match (parsed.result, parsed.error) {
                (_, Some(error)) => Err(RouteError::Provider(format!(
                    "{method} failed with code {}: {}",
                    error.code, error.message
                ))),
                (Some(result), None) => Ok(result),
                (None, None) => Err(RouteError::Provider(format!(
                    "{method} returned neither result nor error"
                ))),
            }
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl SvmAccountReader for SvmRpcClient {
    async fn get_account_data(&self, address: Pubkey) -> Result<Option<Vec<u8>>> {
        let response: ContextValue<Option<AccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), { "encoding": "base64" }]),
            )
            .await?;

        let data = response.value.map(|account| account.decode()).transpose()?;
        debug!(
            address = %address,
            exists = data.is_some(),
            event = "svm_account_read"
        );
        Ok(data)
    }

    async fn get_program_accounts(
        &self,
        program: Pubkey,
        discriminator: [u8; 8],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let filter = json!({
            "memcmp": {
                "offset": 0,
                "bytes": BASE64.encode(discriminator),
                "encoding": "base64",
            }
        });
        let accounts: Vec<KeyedAccount> = self
            .call(
                "getProgramAccounts",
                json!([program.to_string(), { "encoding": "base64", "filters": [filter] }]),
            )
            .await?;

        let accounts = accounts
            .into_iter()
            .map(|keyed| {
                let pubkey = Pubkey::from_str(&keyed.pubkey)
                    .map_err(|e| RouteError::Provider(format!("invalid pubkey: {e}")))?;
                Ok((pubkey, keyed.account.decode()?))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            program = %program,
            accounts = accounts.len(),
            event = "svm_program_accounts_read"
        );
        Ok(accounts)
    }
}
