//! Native Token Transfer (NTT) message formats carried inside VAAs.
//!
//! The M0 portals speak the NTT wire format: a transceiver message wraps a
//! manager message, whose payload is a native token transfer. When a transfer
//! is delivered by the Wormhole standard relayer the transceiver message is in
//! turn wrapped in a delivery instruction.
//!
//! Reference: <https://github.com/wormhole-foundation/native-token-transfers>

use alloy_primitives::{keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use super::{ByteReader, UniversalAddress, Vaa};
use crate::error::{Result, RouteError};

/// Prefix of a Wormhole transceiver message
pub const TRANSCEIVER_MESSAGE_PREFIX: [u8; 4] = [0x99, 0x45, 0xFF, 0x10];

/// Prefix of a native token transfer payload
pub const NATIVE_TOKEN_TRANSFER_PREFIX: [u8; 4] = [0x99, 0x4E, 0x54, 0x54];

/// Payload id of a standard relayer delivery instruction
pub const DELIVERY_INSTRUCTION_PAYLOAD_ID: u8 = 1;

/// Which VAA of a source transaction carries the transfer.
///
/// EVM-to-EVM transfers relayed by the Wormhole standard relayer produce a
/// delivery VAA wrapping the transceiver message; everything else produces the
/// transceiver VAA directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationChannel {
    WormholeTransfer,
    WormholeTransferStandardRelayer,
}

impl AttestationChannel {
    pub fn for_route(source_is_evm: bool, destination_is_evm: bool) -> Self {
        if source_is_evm && destination_is_evm {
            AttestationChannel::WormholeTransferStandardRelayer
        } else {
            AttestationChannel::WormholeTransfer
        }
    }

    /// Finds the transceiver message inside `vaa` for this channel.
    ///
    /// Returns `None` when the VAA belongs to a different channel.
    pub fn extract(&self, vaa: &Vaa) -> Result<Option<TransceiverMessage>> {
        match self {
            AttestationChannel::WormholeTransfer => {
                if !vaa.payload.starts_with(&TRANSCEIVER_MESSAGE_PREFIX) {
                    return Ok(None);
                }
                TransceiverMessage::decode(&vaa.payload).map(Some)
            }
            AttestationChannel::WormholeTransferStandardRelayer => {
                if vaa.payload.first() != Some(&DELIVERY_INSTRUCTION_PAYLOAD_ID) {
                    return Ok(None);
                }
                let delivery = DeliveryInstruction::decode(&vaa.payload)?;
                if !delivery.payload.starts_with(&TRANSCEIVER_MESSAGE_PREFIX) {
                    return Ok(None);
                }
                TransceiverMessage::decode(&delivery.payload).map(Some)
            }
        }
    }
}

/// Message exchanged between transceivers
///
/// # Format
///
/// - prefix: bytes4 (0x9945FF10)
/// - sourceNttManager: bytes32
/// - recipientNttManager: bytes32
/// - nttManagerPayload: uint16 length + bytes
/// - transceiverPayload: uint16 length + bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransceiverMessage {
    pub source_manager: UniversalAddress,
    pub recipient_manager: UniversalAddress,
    pub manager_payload: ManagerMessage,
    pub transceiver_payload: Bytes,
}

impl TransceiverMessage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("transceiver message", bytes);
        let prefix = reader.read_array::<4>()?;
        if prefix != TRANSCEIVER_MESSAGE_PREFIX {
            return Err(RouteError::MalformedMessage(
                "transceiver message prefix mismatch".to_string(),
            ));
        }
        let source_manager = UniversalAddress::new(reader.read_array::<32>()?);
        let recipient_manager = UniversalAddress::new(reader.read_array::<32>()?);
        let manager_len = reader.read_u16_be()? as usize;
        let manager_payload = ManagerMessage::decode(reader.read_bytes(manager_len)?)?;
        let transceiver_len = reader.read_u16_be()? as usize;
        let transceiver_payload = Bytes::copy_from_slice(reader.read_bytes(transceiver_len)?);

        Ok(Self {
            source_manager,
            recipient_manager,
            manager_payload,
            transceiver_payload,
        })
    }

    pub fn encode(&self) -> Bytes {
        let manager = self.manager_payload.encode();
        let mut bytes = Vec::with_capacity(72 + manager.len() + self.transceiver_payload.len());

        // prefix (4 bytes)
        bytes.extend_from_slice(&TRANSCEIVER_MESSAGE_PREFIX);
        // sourceNttManager (32 bytes)
        bytes.extend_from_slice(self.source_manager.as_bytes());
        // recipientNttManager (32 bytes)
        bytes.extend_from_slice(self.recipient_manager.as_bytes());
        // nttManagerPayload (2 + n bytes)
        bytes.extend_from_slice(&(manager.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&manager);
        // transceiverPayload (2 + n bytes)
        bytes.extend_from_slice(&(self.transceiver_payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&self.transceiver_payload);

        Bytes::from(bytes)
    }
}

/// Message produced by the source NTT manager
///
/// # Format
///
/// - id: bytes32 (per-manager sequence, left-padded)
/// - sender: bytes32
/// - payload: uint16 length + bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerMessage {
    pub id: B256,
    pub sender: UniversalAddress,
    pub payload: Bytes,
}

impl ManagerMessage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("manager message", bytes);
        let id = B256::from(reader.read_array::<32>()?);
        let sender = UniversalAddress::new(reader.read_array::<32>()?);
        let len = reader.read_u16_be()? as usize;
        let payload = Bytes::copy_from_slice(reader.read_bytes(len)?);
        Ok(Self {
            id,
            sender,
            payload,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(66 + self.payload.len());
        bytes.extend_from_slice(self.id.as_slice());
        bytes.extend_from_slice(self.sender.as_bytes());
        bytes.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        Bytes::from(bytes)
    }

    /// Digest the destination EVM manager keys approvals and executions by.
    pub fn digest(&self, source_chain: u16) -> B256 {
        let encoded = self.encode();
        let mut preimage = Vec::with_capacity(2 + encoded.len());
        preimage.extend_from_slice(&source_chain.to_be_bytes());
        preimage.extend_from_slice(&encoded);
        keccak256(preimage)
    }

    pub fn token_transfer(&self) -> Result<NativeTokenTransfer> {
        NativeTokenTransfer::decode(&self.payload)
    }
}

/// Native token transfer payload
///
/// # Format
///
/// - prefix: bytes4 (0x994E5454)
/// - decimals: uint8
/// - amount: uint64 (trimmed)
/// - sourceToken: bytes32
/// - to: bytes32
/// - toChain: uint16
/// - additionalPayload: optional uint16 length + bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTokenTransfer {
    pub decimals: u8,
    pub amount: u64,
    pub source_token: UniversalAddress,
    pub to: UniversalAddress,
    pub to_chain: u16,
    pub additional_payload: Bytes,
}

impl NativeTokenTransfer {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("native token transfer", bytes);
        let prefix = reader.read_array::<4>()?;
        if prefix != NATIVE_TOKEN_TRANSFER_PREFIX {
            return Err(RouteError::MalformedMessage(
                "native token transfer prefix mismatch".to_string(),
            ));
        }
        let decimals = reader.read_u8()?;
        let amount = reader.read_u64_be()?;
        let source_token = UniversalAddress::new(reader.read_array::<32>()?);
        let to = UniversalAddress::new(reader.read_array::<32>()?);
        let to_chain = reader.read_u16_be()?;
        let additional_payload = if reader.is_empty() {
            Bytes::new()
        } else {
            let len = reader.read_u16_be()? as usize;
            Bytes::copy_from_slice(reader.read_bytes(len)?)
        };

        Ok(Self {
            decimals,
            amount,
            source_token,
            to,
            to_chain,
            additional_payload,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(79 + self.additional_payload.len());
        bytes.extend_from_slice(&NATIVE_TOKEN_TRANSFER_PREFIX);
        bytes.push(self.decimals);
        bytes.extend_from_slice(&self.amount.to_be_bytes());
        bytes.extend_from_slice(self.source_token.as_bytes());
        bytes.extend_from_slice(self.to.as_bytes());
        bytes.extend_from_slice(&self.to_chain.to_be_bytes());
        if !self.additional_payload.is_empty() {
            bytes.extend_from_slice(&(self.additional_payload.len() as u16).to_be_bytes());
            bytes.extend_from_slice(&self.additional_payload);
        }
        Bytes::from(bytes)
    }
}

/// The part of a standard relayer delivery instruction the router needs.
///
/// # Format
///
/// - payloadId: uint8 (1)
/// - targetChain: uint16
/// - targetAddress: bytes32
/// - payload: uint32 length + bytes
/// - remaining relay fields are ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryInstruction {
    pub target_chain: u16,
    pub target_address: UniversalAddress,
    pub payload: Bytes,
}

impl DeliveryInstruction {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new("delivery instruction", bytes);
        let payload_id = reader.read_u8()?;
        if payload_id != DELIVERY_INSTRUCTION_PAYLOAD_ID {
            return Err(RouteError::MalformedMessage(format!(
                "unexpected delivery payload id {payload_id}"
            )));
        }
        let target_chain = reader.read_u16_be()?;
        let target_address = UniversalAddress::new(reader.read_array::<32>()?);
        let len = reader.read_u32_be()? as usize;
        let payload = Bytes::copy_from_slice(reader.read_bytes(len)?);
        Ok(Self {
            target_chain,
            target_address,
            payload,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(39 + self.payload.len());
        bytes.push(DELIVERY_INSTRUCTION_PAYLOAD_ID);
        bytes.extend_from_slice(&self.target_chain.to_be_bytes());
        bytes.extend_from_slice(self.target_address.as_bytes());
        bytes.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        Bytes::from(bytes)
    }
}

/// Encodes the per-transceiver instructions passed to an EVM portal transfer.
///
/// The portal has a single Wormhole transceiver at index 0 whose only
/// instruction is whether to skip the standard relayer.
pub fn encode_transceiver_instructions(skip_relay: bool) -> Bytes {
    // count, index, payload length, shouldSkipRelayerSend
    Bytes::from(vec![1, 0, 1, skip_relay as u8])
}
