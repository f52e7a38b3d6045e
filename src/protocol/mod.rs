//! Wire-level types: chain identities, addresses, amounts and the Wormhole /
//! NTT message formats.

mod address;
mod amount;
mod chain;
mod message;
mod vaa;

pub use address::{TokenId, UniversalAddress, UNIVERSAL_ADDRESS_LEN};
pub use amount::{Amount, MAX_DECIMALS};
pub use chain::{Chain, Network, Platform, SOLANA_DEVNET_M0_CHAIN_ID, SOLANA_MAINNET_M0_CHAIN_ID};
pub use message::{
    encode_transceiver_instructions, AttestationChannel, DeliveryInstruction, ManagerMessage,
    NativeTokenTransfer, TransceiverMessage, NATIVE_TOKEN_TRANSFER_PREFIX,
    TRANSCEIVER_MESSAGE_PREFIX,
};
pub use vaa::{GuardianSignature, MessageId, Vaa};

use crate::error::{Result, RouteError};

/// Big-endian cursor over a wire message.
pub(crate) struct ByteReader<'a> {
    what: &'static str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(what: &'static str, data: &'a [u8]) -> Self {
        Self { what, data, pos: 0 }
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                RouteError::MalformedMessage(format!(
                    "{} truncated: need {} bytes at offset {}, have {}",
                    self.what,
                    len,
                    self.pos,
                    self.data.len()
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}
