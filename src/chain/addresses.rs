// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Deployment addresses of the M0 portal stack
//!
//! EVM contracts share one deployment address on every EVM chain and network.
//! SVM programs share their program ids across networks while the Wormhole
//! core accounts and the M mint differ per network.

use alloy_primitives::{address, Address};
use solana_program::{pubkey, pubkey::Pubkey};

use crate::protocol::{Chain, Network};

// EVM

/// <https://etherscan.io/address/0x866A2BF4E572CbcF37D5071A7a58503Bfb36be1b>
pub const EVM_M_TOKEN: Address = address!("866A2BF4E572CbcF37D5071A7a58503Bfb36be1b");

/// <https://etherscan.io/address/0x437cc33344a0B27A429f795ff6B469C72698B291>
pub const EVM_WRAPPED_M_TOKEN: Address = address!("437cc33344a0B27A429f795ff6B469C72698B291");

/// M portal (NTT manager)
///
/// <https://etherscan.io/address/0xD925C84b55E4e44a53749fF5F2a5A13F63D128fd>
pub const EVM_PORTAL: Address = address!("D925C84b55E4e44a53749fF5F2a5A13F63D128fd");

/// <https://etherscan.io/address/0x0763196A091575adF99e2306E5e90E0Be5154841>
pub const EVM_WORMHOLE_TRANSCEIVER: Address =
    address!("0763196A091575adF99e2306E5e90E0Be5154841");

/// EVM contract the executor delivers SVM-originated messages to
pub const EVM_EXECUTOR_PEER: Address = address!("eAae496BcDa93cCCd3fD6ff6096347979e87B153");

// SVM programs

pub const SVM_PORTAL_PROGRAM: Pubkey = pubkey!("MzBrgc8yXBj4P16GTkcSyDZkEQZB9qDqf3fh9bByJce");

pub const SVM_WORMHOLE_ADAPTER_PROGRAM: Pubkey =
    pubkey!("mzp1q2j5Hr1QuLC3KFBCAUz5aUckT6qyuZKZ3WJnMmY");

/// Extension swap facility holding the extension whitelist
pub const SVM_SWAP_PROGRAM: Pubkey = pubkey!("MSwapi3WhNKMUGm9YrxGhypgUEt7wYQH3ZgG32XoWzH");

pub const SVM_EARN_PROGRAM: Pubkey = pubkey!("mz2vDzjbQDUDXBH6FPF5s4odCJ4y8YLE5QWaZ8XdZ9Z");

pub const SVM_EXECUTOR_PROGRAM: Pubkey = pubkey!("execXUrAsMnqMmTHj5m7N1YQgsDz3cwGLYCYyuDRciV");

pub const SVM_TOKEN_2022_PROGRAM: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

pub const SVM_ASSOCIATED_TOKEN_PROGRAM: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Wormhole post-message shim
pub const SVM_WORMHOLE_POST_MESSAGE_SHIM: Pubkey =
    pubkey!("EtZMZM22ViKMo4r5y4Anovs3wKQ2owUmDpjygnMMcdEX");

// SVM mints

/// wM on Solana
pub const SVM_WRAPPED_M_MINT: Pubkey = pubkey!("mzeroXDoBpRVhnEXBra27qzAMdxgpWVY3DzQW7xMVJp");

/// M on Solana mainnet, used until the portal global account is read
pub const SVM_M_MINT_MAINNET: Pubkey = pubkey!("mzerokyEX9TNDoK4o2YZQBDmMzjokAeN6M2g2S3pLJo");

/// M on Solana devnet, used until the portal global account is read
pub const SVM_M_MINT_DEVNET: Pubkey = pubkey!("mzeroZRGCah3j5xEWp2Nih3GDejSBbH1rbHoxDg8By6");

// Wormhole core accounts

/// Per-network Wormhole core bridge accounts used when posting messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WormholeCoreAccounts {
    pub config: Pubkey,
    pub core: Pubkey,
    pub fee_collector: Pubkey,
    pub shim: Pubkey,
}

pub const WORMHOLE_CORE_MAINNET: WormholeCoreAccounts = WormholeCoreAccounts {
    config: pubkey!("2yVjuQwpsvdsrywzsJJVs9Ueh4zayyo5DYJbBNc3DDpn"),
    core: pubkey!("worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth"),
    fee_collector: pubkey!("9bFNrXNb2WTx8fMHXCheaZqkLZ3YCCaiqTftHxeintHy"),
    shim: SVM_WORMHOLE_POST_MESSAGE_SHIM,
};

pub const WORMHOLE_CORE_DEVNET: WormholeCoreAccounts = WormholeCoreAccounts {
    config: pubkey!("6bi4JGDoRwUs9TYBuvoA7dUVyikTJDrJsJU1ew6KVLiu"),
    core: pubkey!("3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5"),
    fee_collector: pubkey!("7s3a1ycs16d6SNDumaRtjcoyMaTDZPavzgsmS3uUZYWX"),
    shim: SVM_WORMHOLE_POST_MESSAGE_SHIM,
};

/// Core bridge program on Fogo mainnet
pub const FOGO_WORMHOLE_CORE_MAINNET: Pubkey =
    pubkey!("worm2mrQkG1B1KTz37erMfWN8anHkSK24nzca7UD8BB");

/// Core bridge program on Fogo testnet
pub const FOGO_WORMHOLE_CORE_TESTNET: Pubkey =
    pubkey!("BhnQyKoQQgpuRTRo6D8Emz93PvXCYfVgHhnrR4T3qhw4");

impl WormholeCoreAccounts {
    /// Solana's core accounts.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => WORMHOLE_CORE_MAINNET,
            Network::Testnet => WORMHOLE_CORE_DEVNET,
        }
    }

    /// Core accounts of the SVM chain `chain`.
    pub fn for_chain(chain: Chain, network: Network) -> Self {
        match (chain, network) {
            (Chain::Fogo, Network::Mainnet) => Self::derive(FOGO_WORMHOLE_CORE_MAINNET),
            (Chain::Fogo, Network::Testnet) => Self::derive(FOGO_WORMHOLE_CORE_TESTNET),
            _ => Self::for_network(network),
        }
    }

    /// Derives the config and fee collector PDAs of a core bridge deployment.
    pub fn derive(core: Pubkey) -> Self {
        Self {
            config: Pubkey::find_program_address(&[b"Bridge"], &core).0,
            core,
            fee_collector: Pubkey::find_program_address(&[b"fee_collector"], &core).0,
            shim: SVM_WORMHOLE_POST_MESSAGE_SHIM,
        }
    }
}

// Off-chain services

/// <https://executor.labsapis.com>
pub const EXECUTOR_API_MAINNET: &str = "https://executor.labsapis.com";
pub const EXECUTOR_API_TESTNET: &str = "https://executor-testnet.labsapis.com";

/// <https://api.wormholescan.io>
pub const WORMHOLESCAN_API_MAINNET: &str = "https://api.wormholescan.io";
pub const WORMHOLESCAN_API_TESTNET: &str = "https://api.testnet.wormholescan.io";
