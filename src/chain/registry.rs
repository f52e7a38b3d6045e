//! Contract registry
//!
//! A pure lookup from (network, chain) to the addresses and per-chain flags
//! the router needs. The registry is built once at startup with
//! [`ContractRegistry::initialize`] and shared read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::addresses::{
    EVM_M_TOKEN, EVM_PORTAL, EVM_WORMHOLE_TRANSCEIVER, EVM_WRAPPED_M_TOKEN, SVM_M_MINT_DEVNET,
    SVM_M_MINT_MAINNET, SVM_PORTAL_PROGRAM, SVM_WORMHOLE_ADAPTER_PROGRAM, SVM_WRAPPED_M_MINT,
};
use crate::config::RouteConfig;
use crate::error::{Result, RouteError};
use crate::protocol::{Chain, Network, Platform, UniversalAddress};

/// Default fraction of remaining inbound capacity, in basis points, above
/// which a quote carries a capacity warning.
pub const DEFAULT_CAPACITY_WARNING_BPS: u16 = 9_500;

/// Default executor gas limit for EVM destinations.
pub const EVM_EXECUTOR_GAS_LIMIT: u128 = 500_000;

/// Default executor compute budget for SVM destinations.
pub const SVM_EXECUTOR_GAS_LIMIT: u128 = 250_000;

/// Lamports the executor forwards to SVM destinations to fund account rent.
pub const SVM_EXECUTOR_MSG_VALUE: u128 = 20_000_000;

/// Addresses of the portal stack on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSet {
    /// The base (unwrapped) token
    pub token: UniversalAddress,
    /// Portal: the NTT manager on EVM, the portal program on SVM
    pub manager: UniversalAddress,
    /// Message transceivers (Wormhole transceiver on EVM, adapter program on SVM)
    pub transceivers: Vec<UniversalAddress>,
    /// Executor quoter whose signed quotes are accepted; any quoter when unset
    pub quoter: Option<UniversalAddress>,
    /// Statically known extension tokens; SVM chains extend this from chain state
    pub extensions: Vec<UniversalAddress>,
}

impl ContractSet {
    /// The primary (Wormhole) transceiver.
    pub fn transceiver(&self) -> Result<UniversalAddress> {
        self.transceivers.first().copied().ok_or_else(|| {
            RouteError::InvalidConfig("contract set has no transceiver".to_string())
        })
    }

    pub fn is_base_token(&self, token: &UniversalAddress) -> bool {
        self.token == *token
    }
}

/// Contract set plus the behavioural flags of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain: Chain,
    pub network: Network,
    pub contracts: ContractSet,
    /// Whether the base token may be delivered to this chain directly.
    pub can_receive_base_token: bool,
    /// Whether the base token may be sent from this chain directly.
    pub can_send_base_token: bool,
    /// Whether transfers *to* this chain are relayed through an executor
    /// entrypoint, which then becomes the approval spender on the source.
    pub requires_relay_entrypoint: bool,
    /// EVM relay entrypoint contract, when one is deployed.
    pub relay_entrypoint: Option<UniversalAddress>,
    /// Gas (EVM) or compute units (SVM) the executor spends on delivery.
    pub executor_gas_limit: u128,
    /// Native value the executor forwards with the delivery.
    pub executor_msg_value: u128,
    pub capacity_warning_bps: u16,
}

impl ChainConfig {
    /// The single global EVM deployment.
    pub fn evm_default(chain: Chain, network: Network) -> Self {
        Self {
            chain,
            network,
            contracts: ContractSet {
                token: EVM_M_TOKEN.into(),
                manager: EVM_PORTAL.into(),
                transceivers: vec![EVM_WORMHOLE_TRANSCEIVER.into()],
                quoter: None,
                extensions: vec![EVM_WRAPPED_M_TOKEN.into()],
            },
            can_receive_base_token: true,
            can_send_base_token: true,
            requires_relay_entrypoint: false,
            relay_entrypoint: None,
            executor_gas_limit: EVM_EXECUTOR_GAS_LIMIT,
            executor_msg_value: 0,
            capacity_warning_bps: DEFAULT_CAPACITY_WARNING_BPS,
        }
    }

    /// The SVM deployment; only extension forms of M are held by users.
    pub fn svm_default(chain: Chain, network: Network) -> Self {
        let m_mint = match network {
            Network::Mainnet => SVM_M_MINT_MAINNET,
            Network::Testnet => SVM_M_MINT_DEVNET,
        };
        Self {
            chain,
            network,
            contracts: ContractSet {
                token: m_mint.into(),
                manager: SVM_PORTAL_PROGRAM.into(),
                transceivers: vec![SVM_WORMHOLE_ADAPTER_PROGRAM.into()],
                quoter: None,
                extensions: vec![SVM_WRAPPED_M_MINT.into()],
            },
            can_receive_base_token: false,
            can_send_base_token: false,
            requires_relay_entrypoint: true,
            relay_entrypoint: None,
            executor_gas_limit: SVM_EXECUTOR_GAS_LIMIT,
            executor_msg_value: SVM_EXECUTOR_MSG_VALUE,
            capacity_warning_bps: DEFAULT_CAPACITY_WARNING_BPS,
        }
    }

    pub fn default_for(chain: Chain, network: Network) -> Self {
        match chain.platform() {
            Platform::Evm => Self::evm_default(chain, network),
            Platform::Svm => Self::svm_default(chain, network),
        }
    }

    pub fn platform(&self) -> Platform {
        self.chain.platform()
    }
}

/// Support matrix of (network, chain) pairs and their configuration.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    chains: BTreeMap<(Network, Chain), ChainConfig>,
}

impl ContractRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the registry with every known deployment, then applies the
    /// overrides from `config`. Call once at startup.
    pub fn initialize(config: &RouteConfig) -> Self {
        let mut registry = Self::empty();
        for network in [Network::Mainnet, Network::Testnet] {
            for chain in Chain::ALL.into_iter().filter(|c| c.exists_on(network)) {
                let mut chain_config = ChainConfig::default_for(chain, network);
                if chain.is_evm() {
                    chain_config.relay_entrypoint = config.evm_executor_entrypoint;
                }
                if let Some(bps) = config.capacity_warning_bps {
                    chain_config.capacity_warning_bps = bps;
                }
                registry.register(chain_config);
            }
        }

        debug!(
            chains = registry.chains.len(),
            entrypoint_configured = config.evm_executor_entrypoint.is_some(),
            event = "contract_registry_initialized"
        );
        registry
    }

    /// Adds or replaces the configuration of one chain.
    pub fn register(&mut self, config: ChainConfig) -> &mut Self {
        self.chains.insert((config.network, config.chain), config);
        self
    }

    pub fn chain_config(&self, network: Network, chain: Chain) -> Result<&ChainConfig> {
        self.chains
            .get(&(network, chain))
            .ok_or_else(|| RouteError::unsupported_chain(network, chain))
    }

    pub fn get_contracts(&self, network: Network, chain: Chain) -> Result<&ContractSet> {
        self.chain_config(network, chain).map(|config| &config.contracts)
    }

    pub fn supported_chains(&self, network: Network) -> Vec<Chain> {
        self.chains
            .keys()
            .filter(|(n, _)| *n == network)
            .map(|(_, chain)| *chain)
            .collect()
    }

    pub fn supported_networks(&self) -> Vec<Network> {
        let mut networks: Vec<Network> = self.chains.keys().map(|(n, _)| *n).collect();
        networks.dedup();
        networks
    }
}
