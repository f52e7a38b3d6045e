//! Core trait abstractions for routing operations.
//!
//! Every network-facing dependency of the router sits behind one of these
//! traits: contract reads on EVM chains, account reads on SVM chains, the
//! attestation API, the executor quote API, the caller's signer, and time.
//! Production implementations live in [`crate::providers`]; fakes for tests
//! live in [`crate::testing`].
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use m0_route::{Clock, Result};
//!
//! struct FrozenClock(std::time::Instant);
//!
//! #[async_trait::async_trait]
//! impl Clock for FrozenClock {
//!     async fn sleep(&self, _duration: std::time::Duration) {}
//!     fn now(&self) -> std::time::Instant { self.0 }
//!     fn unix_timestamp(&self) -> u64 { 1_700_000_000 }
//! }
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use solana_program::pubkey::Pubkey;

use crate::error::Result;
use crate::executor::{ExecutorCapabilities, SignedQuoteResponse};
use crate::platform::BuildStep;
use crate::protocol::{Chain, UniversalAddress};
use crate::route::TransactionId;

/// Read-only contract calls against one EVM chain.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Redundant approvals being skipped
/// - Relaying switched off for a destination
/// - Inbound capacity close to the rate limit
/// - Destination approval and execution progress
#[async_trait]
pub trait EvmChainReader: Send + Sync {
    /// ERC-20 `decimals()`.
    async fn decimals(&self, token: Address) -> Result<u8>;

    /// ERC-20 `allowance(owner, spender)`.
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Portal `quoteDeliveryPrice`, the native fee of sending one message.
    async fn quote_delivery_price(
        &self,
        manager: Address,
        destination: u16,
        transceiver_instructions: Bytes,
    ) -> Result<U256>;

    /// Wormhole transceiver `isWormholeRelayingEnabled(chain)`.
    async fn is_relaying_enabled(&self, transceiver: Address, destination: u16) -> Result<bool>;

    /// Portal `rateLimitDuration()`; zero when rate limiting is off.
    async fn rate_limit_duration(&self, manager: Address) -> Result<u64>;

    /// Portal `getCurrentInboundCapacity(chain)`.
    async fn current_inbound_capacity(&self, manager: Address, source: u16) -> Result<U256>;

    /// Portal `isMessageApproved(digest)`.
    async fn is_message_approved(&self, manager: Address, digest: B256) -> Result<bool>;

    /// Portal `isMessageExecuted(digest)`.
    async fn is_message_executed(&self, manager: Address, digest: B256) -> Result<bool>;
}

/// Read-only account access against one SVM chain.
#[async_trait]
pub trait SvmAccountReader: Send + Sync {
    /// Raw account data, `None` when the account does not exist.
    async fn get_account_data(&self, address: Pubkey) -> Result<Option<Vec<u8>>>;

    /// All accounts owned by `program` whose data starts with `discriminator`.
    async fn get_program_accounts(
        &self,
        program: Pubkey,
        discriminator: [u8; 8],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;
}

/// Lookup of guardian-signed messages emitted by a source transaction.
///
/// # Test Scenarios
///
/// - Rate limiting (429 responses)
/// - VAA not yet signed (404 or empty operation list)
/// - Several VAAs in one transaction
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    /// Returns the raw VAAs emitted by `txid` on `chain`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::AttestationNotFound`](crate::RouteError::AttestationNotFound)
    ///   while the guardians have not signed yet
    /// - [`RouteError::RateLimitExceeded`](crate::RouteError::RateLimitExceeded)
    ///   when the API throttles
    async fn get_signed_messages(&self, chain: Chain, txid: &str) -> Result<Vec<Bytes>>;
}

/// The executor relay network's quoting API.
#[async_trait]
pub trait ExecutorApi: Send + Sync {
    /// Per-chain capabilities keyed by Wormhole chain id.
    async fn capabilities(&self) -> Result<HashMap<u16, ExecutorCapabilities>>;

    /// Requests a signed quote for delivering one message.
    async fn quote(
        &self,
        source: u16,
        destination: u16,
        relay_instructions: Bytes,
    ) -> Result<SignedQuoteResponse>;
}

/// The caller's key on the source chain.
///
/// The router never holds key material; it hands each [`BuildStep`] to the
/// signer in order and records the returned transaction ids.
#[async_trait]
pub trait TransferSigner: Send + Sync {
    fn chain(&self) -> Chain;

    fn address(&self) -> UniversalAddress;

    /// Signs, submits and waits for inclusion of one step.
    async fn sign_and_send(&self, step: &BuildStep) -> Result<TransactionId>;
}

/// Trait for time-based operations.
///
/// Lets tests fast-forward through polling loops and quote expiry.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;

    /// Seconds since the Unix epoch, compared against quote expiries.
    fn unix_timestamp(&self) -> u64;
}
