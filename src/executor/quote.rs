//! Executor wire formats: relay instructions and signed quotes.

use std::collections::BTreeSet;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};
use crate::protocol::{ByteReader, UniversalAddress};

/// Prefix of a signed executor quote
pub const SIGNED_QUOTE_PREFIX: &[u8; 4] = b"EQ01";

/// Request prefix the executor uses for VAA-based deliveries
pub const VAA_REQUEST_TYPE: &str = "ERV1";

const GAS_INSTRUCTION_TYPE: u8 = 1;
const GAS_DROP_OFF_INSTRUCTION_TYPE: u8 = 2;

/// One instruction telling the executor how to deliver a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayInstruction {
    /// Gas (EVM) or compute units (SVM) to spend and native value to forward.
    Gas { gas_limit: u128, msg_value: u128 },
    /// Native tokens the executor drops off to `recipient` on delivery.
    GasDropOff {
        amount: u128,
        recipient: UniversalAddress,
    },
}

impl RelayInstruction {
    /// # Format
    ///
    /// Gas:
    /// - type: uint8 (0x01)
    /// - gasLimit: uint128 (16 bytes)
    /// - msgValue: uint128 (16 bytes)
    ///
    /// Drop-off:
    /// - type: uint8 (0x02)
    /// - dropOff: uint128 (16 bytes)
    /// - recipient: bytes32
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RelayInstruction::Gas {
                gas_limit,
                msg_value,
            } => {
                out.push(GAS_INSTRUCTION_TYPE);
                out.extend_from_slice(&gas_limit.to_be_bytes());
                out.extend_from_slice(&msg_value.to_be_bytes());
            }
            RelayInstruction::GasDropOff { amount, recipient } => {
                out.push(GAS_DROP_OFF_INSTRUCTION_TYPE);
                out.extend_from_slice(&amount.to_be_bytes());
                out.extend_from_slice(recipient.as_bytes());
            }
        }
    }
}

pub fn encode_relay_instructions(instructions: &[RelayInstruction]) -> Bytes {
    let mut out = Vec::with_capacity(instructions.len() * 49);
    for instruction in instructions {
        instruction.encode_into(&mut out);
    }
    Bytes::from(out)
}

/// A signed executor quote
///
/// # Format
///
/// - prefix: bytes4 ("EQ01")
/// - quoterAddress: address (20 bytes)
/// - payeeAddress: bytes32
/// - srcChain: uint16
/// - dstChain: uint16
/// - expiryTime: uint64 (unix seconds)
/// - baseFee: uint64
/// - dstGasPrice: uint64
/// - srcPrice: uint64
/// - dstPrice: uint64
/// - signature: 65 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuote {
    pub quoter: Address,
    pub payee: UniversalAddress,
    pub source_chain: u16,
    pub destination_chain: u16,
    pub expiry: u64,
    pub base_fee: u64,
    pub destination_gas_price: u64,
    pub source_price: u64,
    pub destination_price: u64,
    pub signature: [u8; 65],
}

impl SignedQuote {
    /// Bytes before the signature
    pub const HEADER_SIZE: usize = 100;

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("signed quote", bytes);
        if reader.read_array::<4>()? != *SIGNED_QUOTE_PREFIX {
            return Err(RouteError::MalformedMessage(
                "signed quote prefix mismatch".to_string(),
            ));
        }
        Ok(Self {
            quoter: Address::from(reader.read_array::<20>()?),
            payee: UniversalAddress::new(reader.read_array::<32>()?),
            source_chain: reader.read_u16_be()?,
            destination_chain: reader.read_u16_be()?,
            expiry: reader.read_u64_be()?,
            base_fee: reader.read_u64_be()?,
            destination_gas_price: reader.read_u64_be()?,
            source_price: reader.read_u64_be()?,
            destination_price: reader.read_u64_be()?,
            signature: reader.read_array::<65>()?,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(Self::HEADER_SIZE + 65);
        bytes.extend_from_slice(SIGNED_QUOTE_PREFIX);
        bytes.extend_from_slice(self.quoter.as_slice());
        bytes.extend_from_slice(self.payee.as_bytes());
        bytes.extend_from_slice(&self.source_chain.to_be_bytes());
        bytes.extend_from_slice(&self.destination_chain.to_be_bytes());
        bytes.extend_from_slice(&self.expiry.to_be_bytes());
        bytes.extend_from_slice(&self.base_fee.to_be_bytes());
        bytes.extend_from_slice(&self.destination_gas_price.to_be_bytes());
        bytes.extend_from_slice(&self.source_price.to_be_bytes());
        bytes.extend_from_slice(&self.destination_price.to_be_bytes());
        bytes.extend_from_slice(&self.signature);
        Bytes::from(bytes)
    }
}

/// Body of `POST /v0/quote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub src_chain: u16,
    pub dst_chain: u16,
    pub relay_instructions: Bytes,
}

/// Response of `POST /v0/quote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedQuoteResponse {
    pub signed_quote: Bytes,
    /// Decimal string of the cost in source-chain native base units
    #[serde(default)]
    pub estimated_cost: Option<String>,
}

impl SignedQuoteResponse {
    pub fn estimated_cost(&self) -> Result<U256> {
        let cost = self.estimated_cost.as_deref().ok_or_else(|| {
            RouteError::ExecutorRejected("quote response carries no estimated cost".to_string())
        })?;
        cost.parse::<U256>().map_err(|e| {
            RouteError::ExecutorRejected(format!("invalid estimated cost '{cost}': {e}"))
        })
    }
}

/// Per-chain entry of `GET /v0/capabilities`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorCapabilities {
    #[serde(default)]
    pub request_prefixes: BTreeSet<String>,
    #[serde(default)]
    pub gas_drop_off_limit: Option<String>,
    #[serde(default)]
    pub max_gas_limit: Option<String>,
    #[serde(default)]
    pub max_msg_value: Option<String>,
}

impl ExecutorCapabilities {
    /// Whether the executor accepts VAA delivery requests on this chain.
    pub fn supports_vaa_requests(&self) -> bool {
        self.request_prefixes.contains(VAA_REQUEST_TYPE)
    }

    pub fn max_gas_limit(&self) -> Option<u128> {
        self.max_gas_limit.as_deref().and_then(|v| v.parse().ok())
    }

    pub fn gas_drop_off_limit(&self) -> Option<u128> {
        self.gas_drop_off_limit.as_deref().and_then(|v| v.parse().ok())
    }
}
