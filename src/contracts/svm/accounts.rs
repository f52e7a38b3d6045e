//! Account layouts read from the SVM portal stack
//!
//! Anchor accounts start with an 8-byte discriminator followed by the
//! borsh-encoded struct. Only the leading fields the router needs are
//! declared; trailing fields are left unread.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::{Result, RouteError};

/// `sha256("account:SwapGlobal")[..8]`
pub const SWAP_GLOBAL_DISCRIMINATOR: [u8; 8] = [15, 184, 147, 129, 183, 219, 223, 163];
/// `sha256("account:ChainBridgePaths")[..8]`
pub const CHAIN_BRIDGE_PATHS_DISCRIMINATOR: [u8; 8] = [89, 30, 178, 53, 154, 232, 75, 140];
/// `sha256("account:BridgeMessage")[..8]`
pub const BRIDGE_MESSAGE_DISCRIMINATOR: [u8; 8] = [246, 111, 156, 126, 81, 14, 238, 152];
/// `sha256("account:PortalGlobal")[..8]`
pub const PORTAL_GLOBAL_DISCRIMINATOR: [u8; 8] = [83, 250, 129, 21, 172, 135, 20, 236];
/// `sha256("account:WormholeGlobal")[..8]`
pub const WORMHOLE_GLOBAL_DISCRIMINATOR: [u8; 8] = [116, 100, 187, 174, 88, 1, 91, 250];

/// An Anchor account with a known discriminator.
pub trait AnchorAccount: BorshDeserialize + BorshSerialize + Sized {
    const NAME: &'static str;
    const DISCRIMINATOR: [u8; 8];

    /// Decodes account data, ignoring any bytes past the declared fields.
    fn decode(data: &[u8]) -> Result<Self> {
        let (discriminator, mut body) = data.split_at_checked(8).ok_or_else(|| {
            RouteError::AccountDecode(format!("{} account shorter than 8 bytes", Self::NAME))
        })?;
        if discriminator != Self::DISCRIMINATOR {
            return Err(RouteError::AccountDecode(format!(
                "{} discriminator mismatch",
                Self::NAME
            )));
        }
        Self::deserialize(&mut body)
            .map_err(|e| RouteError::AccountDecode(format!("{}: {e}", Self::NAME)))
    }

    /// Discriminator followed by the borsh encoding.
    fn encode(&self) -> Vec<u8> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        // writing into a Vec cannot fail
        let _ = self.serialize(&mut data);
        data
    }
}

/// Global state of the portal program (leading fields)
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PortalGlobal {
    pub bump: u8,
    pub chain_id: u32,
    pub m_mint: [u8; 32],
    pub admin: [u8; 32],
    pub outgoing_paused: bool,
    pub incoming_paused: bool,
    pub m_index: u128,
    pub message_nonce: u64,
}

impl PortalGlobal {
    pub fn m_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.m_mint)
    }
}

impl AnchorAccount for PortalGlobal {
    const NAME: &'static str = "PortalGlobal";
    const DISCRIMINATOR: [u8; 8] = PORTAL_GLOBAL_DISCRIMINATOR;
}

/// One extension registered with the swap program
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct WhitelistedExtension {
    pub program_id: [u8; 32],
    pub mint: [u8; 32],
    pub token_program: [u8; 32],
}

impl WhitelistedExtension {
    pub fn program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.program_id)
    }

    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    pub fn token_program(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_program)
    }
}

/// Global state of the swap program
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SwapGlobal {
    pub bump: u8,
    pub admin: [u8; 32],
    pub whitelisted_unwrappers: Vec<[u8; 32]>,
    pub whitelisted_extensions: Vec<WhitelistedExtension>,
}

impl AnchorAccount for SwapGlobal {
    const NAME: &'static str = "SwapGlobal";
    const DISCRIMINATOR: [u8; 8] = SWAP_GLOBAL_DISCRIMINATOR;
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BridgePath {
    pub source_mint: [u8; 32],
    pub destination_token: [u8; 32],
}

/// Paths from local mints toward one destination chain
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChainBridgePaths {
    pub bump: u8,
    /// M0 chain id of the destination
    pub destination_chain_id: u32,
    pub paths: Vec<BridgePath>,
}

impl AnchorAccount for ChainBridgePaths {
    const NAME: &'static str = "ChainBridgePaths";
    const DISCRIMINATOR: [u8; 8] = CHAIN_BRIDGE_PATHS_DISCRIMINATOR;
}

/// Receipt of an inbound message on the portal
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BridgeMessage {
    pub consumed: bool,
}

impl AnchorAccount for BridgeMessage {
    const NAME: &'static str = "BridgeMessage";
    const DISCRIMINATOR: [u8; 8] = BRIDGE_MESSAGE_DISCRIMINATOR;
}

/// Global state of the Wormhole adapter (leading fields)
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct WormholeGlobal {
    pub bump: u8,
    pub admin: [u8; 32],
    pub outgoing_paused: bool,
    pub incoming_paused: bool,
    pub chain_id: u32,
    pub receive_lut: Option<[u8; 32]>,
}

impl WormholeGlobal {
    pub fn receive_lut(&self) -> Option<Pubkey> {
        self.receive_lut.map(Pubkey::new_from_array)
    }
}

impl AnchorAccount for WormholeGlobal {
    const NAME: &'static str = "WormholeGlobal";
    const DISCRIMINATOR: [u8; 8] = WORMHOLE_GLOBAL_DISCRIMINATOR;
}

/// Size of the address lookup table header preceding the address list.
pub const LOOKUP_TABLE_META_SIZE: usize = 56;

/// Addresses stored in an address lookup table account.
pub fn decode_lookup_table_addresses(data: &[u8]) -> Result<Vec<Pubkey>> {
    let body = data.get(LOOKUP_TABLE_META_SIZE..).ok_or_else(|| {
        RouteError::AccountDecode("lookup table shorter than its header".to_string())
    })?;
    if body.len() % 32 != 0 {
        return Err(RouteError::AccountDecode(format!(
            "lookup table address list of {} bytes is not a multiple of 32",
            body.len()
        )));
    }
    Ok(body
        .chunks_exact(32)
        .map(|chunk| {
            let mut key = [0u8; 32];
            key.copy_from_slice(chunk);
            Pubkey::new_from_array(key)
        })
        .collect())
}

/// Next sequence of a core bridge emitter (u64 little endian at offset 0).
pub fn decode_emitter_sequence(data: &[u8]) -> Result<u64> {
    let bytes = data
        .first_chunk::<8>()
        .ok_or_else(|| RouteError::AccountDecode("sequence account too short".to_string()))?;
    Ok(u64::from_le_bytes(*bytes))
}

/// Offset of `decimals` in an SPL (and Token-2022) mint account.
const MINT_DECIMALS_OFFSET: usize = 44;

pub fn decode_mint_decimals(data: &[u8]) -> Result<u8> {
    data.get(MINT_DECIMALS_OFFSET)
        .copied()
        .ok_or_else(|| RouteError::AccountDecode("mint account too short".to_string()))
}
