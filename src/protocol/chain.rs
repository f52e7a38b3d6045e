//! Chain identities known to the router.
//!
//! Every chain carries three numeric identities that show up on the wire:
//! the Wormhole chain id (u16, used in VAAs and EVM portal calls), the M0
//! chain id (u32, used by the SVM portal and its bridge-path accounts) and,
//! for EVM chains, the EIP-155 chain id from which the M0 id is derived.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// M0 chain id of Solana mainnet-beta.
pub const SOLANA_MAINNET_M0_CHAIN_ID: u32 = 1_399_811_149;

/// M0 chain id of Solana devnet.
pub const SOLANA_DEVNET_M0_CHAIN_ID: u32 = 1_399_811_150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "Mainnet"),
            Network::Testnet => write!(f, "Testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" | "devnet" => Ok(Network::Testnet),
            other => Err(RouteError::InvalidConfig(format!("unknown network '{other}'"))),
        }
    }
}

/// Execution-model family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Contract-call chains with EVM semantics.
    Evm,
    /// Account chains with explicit account lists and program-derived addresses.
    Svm,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Evm => write!(f, "Evm"),
            Platform::Svm => write!(f, "Svm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
    Avalanche,
    Berachain,
    HyperEvm,
    Ink,
    Linea,
    Mantle,
    MegaEth,
    Monad,
    Plasma,
    Plume,
    Polygon,
    Sei,
    Solana,
    Fogo,
    Sepolia,
    ArbitrumSepolia,
    BaseSepolia,
    OptimismSepolia,
}

impl Chain {
    pub const ALL: [Chain; 22] = [
        Chain::Ethereum,
        Chain::Arbitrum,
        Chain::Optimism,
        Chain::Base,
        Chain::Avalanche,
        Chain::Berachain,
        Chain::HyperEvm,
        Chain::Ink,
        Chain::Linea,
        Chain::Mantle,
        Chain::MegaEth,
        Chain::Monad,
        Chain::Plasma,
        Chain::Plume,
        Chain::Polygon,
        Chain::Sei,
        Chain::Solana,
        Chain::Fogo,
        Chain::Sepolia,
        Chain::ArbitrumSepolia,
        Chain::BaseSepolia,
        Chain::OptimismSepolia,
    ];

    pub fn platform(&self) -> Platform {
        match self {
            Chain::Solana | Chain::Fogo => Platform::Svm,
            _ => Platform::Evm,
        }
    }

    pub fn is_evm(&self) -> bool {
        self.platform() == Platform::Evm
    }

    /// EIP-155 chain id of EVM chains, `None` for SVM chains.
    pub fn evm_chain_id(&self) -> Option<u64> {
        let id = match self {
            Chain::Ethereum => 1,
            Chain::Arbitrum => 42161,
            Chain::Optimism => 10,
            Chain::Base => 8453,
            Chain::Avalanche => 43114,
            Chain::Berachain => 80094,
            Chain::HyperEvm => 999,
            Chain::Ink => 57073,
            Chain::Linea => 59144,
            Chain::Mantle => 5000,
            Chain::MegaEth => 4326,
            Chain::Monad => 143,
            Chain::Plasma => 9745,
            Chain::Plume => 98866,
            Chain::Polygon => 137,
            Chain::Sei => 1329,
            Chain::Sepolia => 11155111,
            Chain::ArbitrumSepolia => 421614,
            Chain::BaseSepolia => 84532,
            Chain::OptimismSepolia => 11155420,
            Chain::Solana | Chain::Fogo => return None,
        };
        Some(id)
    }

    /// Alloy's name for the chain, when alloy knows it.
    pub fn named(&self) -> Option<NamedChain> {
        self.evm_chain_id().and_then(|id| NamedChain::try_from(id).ok())
    }

    /// Wormhole chain id
    ///
    /// See <https://wormhole.com/docs/products/reference/chain-ids/>
    pub fn wormhole_chain_id(&self) -> u16 {
        match self {
            Chain::Solana => 1,
            Chain::Ethereum => 2,
            Chain::Polygon => 5,
            Chain::Avalanche => 6,
            Chain::Arbitrum => 23,
            Chain::Optimism => 24,
            Chain::Base => 30,
            Chain::Mantle => 35,
            Chain::Linea => 38,
            Chain::Berachain => 39,
            // SeiEVM; 32 is the Cosmos chain
            Chain::Sei => 40,
            Chain::Ink => 46,
            Chain::HyperEvm => 47,
            Chain::Monad => 48,
            Chain::Fogo => 51,
            Chain::Plume => 55,
            Chain::Plasma => 58,
            Chain::MegaEth => 64,
            Chain::Sepolia => 10002,
            Chain::ArbitrumSepolia => 10003,
            Chain::BaseSepolia => 10004,
            Chain::OptimismSepolia => 10005,
        }
    }

    /// Resolves a Wormhole chain id seen in a VAA back to a chain.
    ///
    /// SVM chains keep their id on both networks, so the network disambiguates
    /// nothing here; it is only used to reject ids from the other network.
    pub fn from_wormhole_chain_id(id: u16, network: Network) -> Result<Chain> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.wormhole_chain_id() == id && chain.exists_on(network))
            .ok_or_else(|| {
                RouteError::MalformedMessage(format!(
                    "unknown wormhole chain id {id} on {network}"
                ))
            })
    }

    /// Whether the chain has a deployment on the given network.
    pub fn exists_on(&self, network: Network) -> bool {
        match self {
            Chain::Solana | Chain::Fogo => true,
            Chain::Sepolia
            | Chain::ArbitrumSepolia
            | Chain::BaseSepolia
            | Chain::OptimismSepolia => network == Network::Testnet,
            _ => network == Network::Mainnet,
        }
    }

    /// M0 chain id used by the SVM portal and its bridge-path accounts.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnsupportedChain`] for Fogo, which the portal has
    /// no id for.
    pub fn m0_chain_id(&self, network: Network) -> Result<u32> {
        match (self, network) {
            (Chain::Solana, Network::Mainnet) => Ok(SOLANA_MAINNET_M0_CHAIN_ID),
            (Chain::Solana, Network::Testnet) => Ok(SOLANA_DEVNET_M0_CHAIN_ID),
            (chain, _) => chain
                .evm_chain_id()
                .map(|id| id as u32)
                .ok_or_else(|| RouteError::unsupported_chain(network, *chain)),
        }
    }

    /// Reverse of [`Chain::m0_chain_id`], used when reading bridge paths.
    pub fn from_m0_chain_id(id: u32, network: Network) -> Option<Chain> {
        Chain::ALL.into_iter().find(|chain| {
            chain.exists_on(network) && chain.m0_chain_id(network).is_ok_and(|m0| m0 == id)
        })
    }

    /// Decimals of the chain's native gas asset.
    pub fn native_decimals(&self) -> u8 {
        match self.platform() {
            Platform::Evm => 18,
            Platform::Svm => 9,
        }
    }

    /// Rough time until the source transaction is final enough to be attested.
    pub fn finality_estimate(&self) -> Duration {
        match self.platform() {
            // Finalized L1 checkpoint, rollups inherit it
            Platform::Evm => Duration::from_secs(19 * 60),
            // 32 confirmed slots
            Platform::Svm => Duration::from_secs(15),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Chain {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouteError::InvalidConfig(format!("unknown chain '{s}'")))
    }
}
