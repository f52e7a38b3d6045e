//! Bindings for the SVM portal stack: account layouts, PDAs and instructions.

pub mod accounts;
pub mod instructions;
pub mod pda;

use sha2::{Digest, Sha256};

/// Anchor discriminator: the first 8 bytes of `sha256("{namespace}:{name}")`.
///
/// Instructions use the `global` namespace, accounts the `account` namespace.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}
