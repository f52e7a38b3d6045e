use std::fmt;

use alloy_primitives::{hex, Address, FixedBytes};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use super::Chain;
use crate::error::{Result, RouteError};

/// Width of every address and token identifier on the wire.
pub const UNIVERSAL_ADDRESS_LEN: usize = 32;

/// A chain-agnostic 32-byte address.
///
/// EVM addresses are left-padded with 12 zero bytes; SVM public keys fill
/// all 32 bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniversalAddress(FixedBytes<32>);

impl UniversalAddress {
    pub const ZERO: Self = Self(FixedBytes::ZERO);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(FixedBytes(bytes))
    }

    /// Builds an address from a wire field, rejecting anything that is not
    /// exactly 32 bytes.
    pub fn from_slice(field: &'static str, bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] =
            bytes
                .try_into()
                .map_err(|_| RouteError::InvalidAddressLength {
                    field,
                    expected: UNIVERSAL_ADDRESS_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self::new(array))
    }

    /// Narrows to a 20-byte EVM address.
    pub fn to_evm(&self) -> Result<Address> {
        if self.0[..12].iter().any(|b| *b != 0) {
            return Err(RouteError::InvalidAddressLength {
                field: "evm address",
                expected: 20,
                actual: UNIVERSAL_ADDRESS_LEN,
            });
        }
        Ok(Address::from_slice(&self.0[12..]))
    }

    pub fn to_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.0 .0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    pub fn to_fixed_bytes(&self) -> FixedBytes<32> {
        self.0
    }

    /// Renders the address the way the chain's users expect.
    pub fn to_native_string(&self, chain: Chain) -> String {
        if chain.is_evm() {
            match self.to_evm() {
                Ok(address) => address.to_checksum(None),
                Err(_) => self.to_string(),
            }
        } else {
            self.to_pubkey().to_string()
        }
    }
}

impl From<Address> for UniversalAddress {
    fn from(address: Address) -> Self {
        Self(address.into_word())
    }
}

impl From<Pubkey> for UniversalAddress {
    fn from(pubkey: Pubkey) -> Self {
        Self::new(pubkey.to_bytes())
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl From<FixedBytes<32>> for UniversalAddress {
    fn from(bytes: FixedBytes<32>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniversalAddress({self})")
    }
}

/// A token on a specific chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId {
    pub chain: Chain,
    pub address: UniversalAddress,
}

impl TokenId {
    pub fn new(chain: Chain, address: impl Into<UniversalAddress>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address.to_native_string(self.chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rstest::rstest;

    #[test]
    fn test_evm_round_trip() {
        let evm = address!("866A2BF4E572CbcF37D5071A7a58503Bfb36be1b");
        let universal = UniversalAddress::from(evm);
        assert_eq!(&universal.as_bytes()[..12], &[0u8; 12]);
        assert_eq!(universal.to_evm().unwrap(), evm);
    }

    #[test]
    fn test_wide_address_is_not_evm() {
        let universal = UniversalAddress::new([7u8; 32]);
        assert!(matches!(
            universal.to_evm(),
            Err(RouteError::InvalidAddressLength { expected: 20, .. })
        ));
    }

    #[rstest]
    #[case(20)]
    #[case(31)]
    #[case(33)]
    #[case(0)]
    fn test_from_slice_rejects_wrong_width(#[case] len: usize) {
        let bytes = vec![1u8; len];
        let err = UniversalAddress::from_slice("recipient", &bytes).unwrap_err();
        assert!(matches!(
            err,
            RouteError::InvalidAddressLength {
                field: "recipient",
                expected: 32,
                actual
            } if actual == len
        ));
    }

    #[test]
    fn test_native_string() {
        let evm = address!("437cc33344a0B27A429f795ff6B469C72698B291");
        let token = TokenId::new(Chain::Base, evm);
        insta::assert_snapshot!(token.to_string(), @"Base:0x437cc33344a0B27A429f795ff6B469C72698B291");
    }
}
