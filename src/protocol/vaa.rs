//! Wormhole Verified Action Approval (VAA) format
//!
//! A VAA is the attestation the router waits for: the guardian-signed
//! observation of a message emitted on the source chain. Signatures are
//! carried but never verified here; the destination contracts do that.
//!
//! Reference: <https://wormhole.com/docs/protocol/infrastructure/vaas/>

use std::fmt;

use alloy_primitives::{hex, Bytes};
use serde::{Deserialize, Serialize};

use super::{ByteReader, UniversalAddress};
use crate::error::{Result, RouteError};

/// Identity of one cross-chain message: who emitted it, where, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.emitter_chain,
            hex::encode(self.emitter_address.as_bytes()),
            self.sequence
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardianSignature {
    pub index: u8,
    pub signature: [u8; 65],
}

/// A parsed VAA
///
/// # Format
///
/// Header:
/// - version: uint8 (1 byte)
/// - guardianSetIndex: uint32 (4 bytes)
/// - signatureCount: uint8 (1 byte)
/// - signatures: signatureCount * (index uint8 + 65-byte signature)
///
/// Body:
/// - timestamp: uint32 (4 bytes)
/// - nonce: uint32 (4 bytes)
/// - emitterChain: uint16 (2 bytes)
/// - emitterAddress: bytes32 (32 bytes)
/// - sequence: uint64 (8 bytes)
/// - consistencyLevel: uint8 (1 byte)
/// - payload: remaining bytes
///
/// Serializes as the hex of its wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Bytes", into = "Bytes")]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Bytes,
}

impl Vaa {
    /// Size of the fixed part of the body in bytes
    pub const BODY_HEADER_SIZE: usize = 51;

    /// Size of one guardian signature entry in bytes
    pub const SIGNATURE_SIZE: usize = 66;

    pub fn message_id(&self) -> MessageId {
        MessageId {
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("vaa", bytes);

        let version = reader.read_u8()?;
        if version != 1 {
            return Err(RouteError::MalformedMessage(format!(
                "unsupported vaa version {version}"
            )));
        }
        let guardian_set_index = reader.read_u32_be()?;
        let signature_count = reader.read_u8()?;

        let mut signatures = Vec::with_capacity(signature_count as usize);
        for _ in 0..signature_count {
            let index = reader.read_u8()?;
            let signature = reader.read_array::<65>()?;
            signatures.push(GuardianSignature { index, signature });
        }

        let timestamp = reader.read_u32_be()?;
        let nonce = reader.read_u32_be()?;
        let emitter_chain = reader.read_u16_be()?;
        let emitter_address = UniversalAddress::new(reader.read_array::<32>()?);
        let sequence = reader.read_u64_be()?;
        let consistency_level = reader.read_u8()?;
        let payload = Bytes::copy_from_slice(reader.rest());

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(
            6 + self.signatures.len() * Self::SIGNATURE_SIZE
                + Self::BODY_HEADER_SIZE
                + self.payload.len(),
        );

        // version (1 byte)
        bytes.push(self.version);
        // guardianSetIndex (4 bytes)
        bytes.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        // signatures (1 + 66 * n bytes)
        bytes.push(self.signatures.len() as u8);
        for signature in &self.signatures {
            bytes.push(signature.index);
            bytes.extend_from_slice(&signature.signature);
        }
        // timestamp (4 bytes)
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        // nonce (4 bytes)
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        // emitterChain (2 bytes)
        bytes.extend_from_slice(&self.emitter_chain.to_be_bytes());
        // emitterAddress (32 bytes)
        bytes.extend_from_slice(self.emitter_address.as_bytes());
        // sequence (8 bytes)
        bytes.extend_from_slice(&self.sequence.to_be_bytes());
        // consistencyLevel (1 byte)
        bytes.push(self.consistency_level);
        // payload
        bytes.extend_from_slice(&self.payload);

        Bytes::from(bytes)
    }
}

impl TryFrom<Bytes> for Vaa {
    type Error = RouteError;

    fn try_from(bytes: Bytes) -> Result<Self> {
        Self::decode(&bytes)
    }
}

impl From<Vaa> for Bytes {
    fn from(vaa: Vaa) -> Self {
        vaa.encode()
    }
}
