//! Runtime configuration.
//!
//! [`PollingConfig`] controls how long the tracker waits for attestations;
//! [`RouteConfig`] collects endpoints and per-deployment overrides and can be
//! loaded from the environment (and a `.env` file) at startup.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::chain::addresses::{
    EXECUTOR_API_MAINNET, EXECUTOR_API_TESTNET, WORMHOLESCAN_API_MAINNET,
    WORMHOLESCAN_API_TESTNET,
};
use crate::error::{Result, RouteError};
use crate::protocol::{Chain, Network, UniversalAddress};

/// Configuration for attestation polling behavior.
///
/// # Examples
///
/// ```rust
/// use m0_route::PollingConfig;
///
/// // Use defaults (30 attempts, 30 second intervals)
/// let config = PollingConfig::default();
///
/// // Derive the attempts from a caller timeout
/// let config = PollingConfig::default()
///     .with_poll_interval_secs(10)
///     .with_timeout(std::time::Duration::from_secs(120));
/// assert_eq!(config.max_attempts, 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of polling attempts before giving up.
    pub max_attempts: u32,
    /// Seconds to wait between polling attempts.
    pub poll_interval_secs: u64,
}

impl Default for PollingConfig {
    /// 30 attempts at 30 second intervals.
    ///
    /// Wormhole guardians sign EVM messages once the source block is
    /// finalized, which takes around 15-20 minutes on Ethereum and its rollups.
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_secs: 30,
        }
    }
}

impl PollingConfig {
    /// Polling tuned for fast-finality source chains.
    pub fn fast() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_secs: 2,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Default interval, with attempts derived from `timeout`.
    pub fn from_timeout(timeout: Duration) -> Self {
        Self::default().with_timeout(timeout)
    }

    /// Sets the attempt count so that polling stops after roughly `timeout`.
    ///
    /// Always allows at least one attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let interval = self.poll_interval_secs.max(1);
        let attempts = timeout.as_secs().div_ceil(interval).max(1);
        self.max_attempts = u32::try_from(attempts).unwrap_or(u32::MAX);
        self
    }

    /// Returns the total maximum wait time in seconds.
    pub fn total_timeout_secs(&self) -> u64 {
        self.max_attempts as u64 * self.poll_interval_secs
    }
}

/// Endpoints and overrides for one deployment of the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub network: Network,
    pub executor_api_url: Url,
    pub wormholescan_api_url: Url,
    /// JSON-RPC endpoints keyed by chain
    pub rpc_urls: BTreeMap<Chain, Url>,
    /// Executor entrypoint deployed on EVM chains
    pub evm_executor_entrypoint: Option<UniversalAddress>,
    pub capacity_warning_bps: Option<u16>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}

impl RouteConfig {
    /// Public endpoints for `network` with no RPC URLs and no overrides.
    pub fn for_network(network: Network) -> Self {
        let (executor, wormholescan) = match network {
            Network::Mainnet => (EXECUTOR_API_MAINNET, WORMHOLESCAN_API_MAINNET),
            Network::Testnet => (EXECUTOR_API_TESTNET, WORMHOLESCAN_API_TESTNET),
        };
        Self {
            network,
            executor_api_url: Url::parse(executor).expect("static executor url is valid"),
            wormholescan_api_url: Url::parse(wormholescan)
                .expect("static wormholescan url is valid"),
            rpc_urls: BTreeMap::new(),
            evm_executor_entrypoint: None,
            capacity_warning_bps: None,
        }
    }

    /// Loads configuration from the process environment, reading `.env` first
    /// when present.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `M0_NETWORK` | `mainnet` (default) or `testnet` |
    /// | `EXECUTOR_API_URL` | executor quote API base |
    /// | `WORMHOLESCAN_API_URL` | attestation API base |
    /// | `<CHAIN>_RPC_URL` | e.g. `BASE_RPC_URL`, `SOLANA_RPC_URL` |
    /// | `M0_EVM_EXECUTOR_ENTRYPOINT` | executor entrypoint on EVM chains |
    /// | `M0_CAPACITY_WARNING_BPS` | capacity warning threshold |
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), event = "dotenv_loaded");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = match lookup("M0_NETWORK") {
            Some(value) => value.parse()?,
            None => Network::Mainnet,
        };
        let mut config = Self::for_network(network);

        if let Some(url) = lookup("EXECUTOR_API_URL") {
            config.executor_api_url = parse_url("EXECUTOR_API_URL", &url)?;
        }
        if let Some(url) = lookup("WORMHOLESCAN_API_URL") {
            config.wormholescan_api_url = parse_url("WORMHOLESCAN_API_URL", &url)?;
        }

        for chain in Chain::ALL.into_iter().filter(|c| c.exists_on(network)) {
            let key = format!("{}_RPC_URL", env_name(chain));
            if let Some(url) = lookup(&key) {
                config.rpc_urls.insert(chain, parse_url(&key, &url)?);
            }
        }

        if let Some(value) = lookup("M0_EVM_EXECUTOR_ENTRYPOINT") {
            let address = value.parse::<alloy_primitives::Address>().map_err(|e| {
                RouteError::InvalidConfig(format!("M0_EVM_EXECUTOR_ENTRYPOINT: {e}"))
            })?;
            config.evm_executor_entrypoint = Some(address.into());
        }

        if let Some(value) = lookup("M0_CAPACITY_WARNING_BPS") {
            let bps = value
                .parse::<u16>()
                .ok()
                .filter(|bps| *bps <= 10_000)
                .ok_or_else(|| {
                    RouteError::InvalidConfig(format!(
                        "M0_CAPACITY_WARNING_BPS must be 0..=10000, got '{value}'"
                    ))
                })?;
            config.capacity_warning_bps = Some(bps);
        }

        Ok(config)
    }

    pub fn rpc_url(&self, chain: Chain) -> Result<&Url> {
        self.rpc_urls.get(&chain).ok_or_else(|| {
            RouteError::InvalidConfig(format!("no RPC URL configured for {chain}"))
        })
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| RouteError::InvalidConfig(format!("{key}: {e}")))
}

/// `ArbitrumSepolia` -> `ARBITRUM_SEPOLIA`
fn env_name(chain: Chain) -> String {
    let mut name = String::new();
    for (i, c) in chain.to_string().chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            name.push('_');
        }
        name.push(c.to_ascii_uppercase());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_polling_config() {
        let config = PollingConfig::default();
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.total_timeout_secs(), 900);
    }

    #[test]
    fn test_with_timeout() {
        let config = PollingConfig::default()
            .with_poll_interval_secs(60)
            .with_timeout(Duration::from_secs(90));
        assert_eq!(config.max_attempts, 2);

        let config = PollingConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.max_attempts, 1);

        let config = PollingConfig::from_timeout(Duration::from_secs(600));
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn test_config_is_copy() {
        let config = PollingConfig::fast();
        let copied = config;
        assert_eq!(config, copied);
    }

    #[test]
    fn test_env_names() {
        assert_eq!(env_name(Chain::ArbitrumSepolia), "ARBITRUM_SEPOLIA");
        assert_eq!(env_name(Chain::Solana), "SOLANA");
        assert_eq!(env_name(Chain::HyperEvm), "HYPER_EVM");
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = RouteConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RouteConfig::default());
        assert_eq!(config.executor_api_url.as_str(), "https://executor.labsapis.com/");
    }

    #[test]
    fn test_from_lookup_testnet() {
        let config = RouteConfig::from_lookup(lookup(&[
            ("M0_NETWORK", "testnet"),
            ("SOLANA_RPC_URL", "https://api.devnet.solana.com"),
            ("BASE_SEPOLIA_RPC_URL", "https://sepolia.base.org"),
            ("BASE_RPC_URL", "https://mainnet.base.org"),
            (
                "M0_EVM_EXECUTOR_ENTRYPOINT",
                "0x1111111111111111111111111111111111111111",
            ),
            ("M0_CAPACITY_WARNING_BPS", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.network, Network::Testnet);
        assert_eq!(
            config.wormholescan_api_url.as_str(),
            "https://api.testnet.wormholescan.io/"
        );
        assert!(config.rpc_url(Chain::Solana).is_ok());
        assert!(config.rpc_url(Chain::BaseSepolia).is_ok());
        // mainnet chains are ignored on testnet
        assert!(config.rpc_url(Chain::Base).is_err());
        assert!(config.evm_executor_entrypoint.is_some());
        assert_eq!(config.capacity_warning_bps, Some(9000));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(RouteConfig::from_lookup(lookup(&[("M0_NETWORK", "moonnet")])).is_err());
        assert!(RouteConfig::from_lookup(lookup(&[("M0_CAPACITY_WARNING_BPS", "20000")])).is_err());
        assert!(RouteConfig::from_lookup(lookup(&[("EXECUTOR_API_URL", "not a url")])).is_err());
    }
}
