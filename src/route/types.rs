//! Requests, quotes and receipts exchanged with the route controller.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chain::ContractSet;
use crate::protocol::{
    Amount, AttestationChannel, Chain, MessageId, TokenId, TransceiverMessage, Vaa,
};

/// A submitted transaction on some chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub chain: Chain,
    pub txid: String,
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.txid)
    }
}

/// A token together with its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDetails {
    pub id: TokenId,
    pub decimals: u8,
}

/// Intent to move value from one token to another across chains.
///
/// Build one with [`RouteController::create_request`](super::RouteController::create_request)
/// to have the decimals read from chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source: TokenDetails,
    pub destination: TokenDetails,
}

impl TransferRequest {
    pub fn new(source: TokenDetails, destination: TokenDetails) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn from_chain(&self) -> Chain {
        self.source.id.chain
    }

    pub fn to_chain(&self) -> Chain {
        self.destination.id.chain
    }
}

/// Caller-facing transfer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Queue the transfer on the source when outbound capacity is exhausted.
    pub queue: bool,
    /// Deliver through the relay network. Manual delivery is not offered.
    pub automatic: bool,
    /// Native gas to hand the recipient on the destination, as a display amount.
    pub gas_dropoff: Option<String>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            queue: false,
            automatic: true,
            gas_dropoff: None,
        }
    }
}

/// Unvalidated transfer parameters as entered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    /// Display amount in source token units, e.g. `"1.25"`
    pub amount: String,
    pub options: Option<TransferOptions>,
}

impl TransferInput {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Options after defaults are folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOptions {
    pub queue: bool,
    pub automatic: bool,
    /// Destination native gas, in destination native decimals
    pub gas_dropoff: Amount,
}

/// Transfer parameters after parsing and trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedParams {
    /// The amount as the caller wrote it
    pub amount: String,
    /// Amount in source units, floored to the destination precision
    pub normalized_amount: Amount,
    pub source_contracts: ContractSet,
    pub destination_contracts: ContractSet,
    pub options: NormalizedOptions,
}

/// Non-blocking advisories attached to a successful quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteWarning {
    /// The transfer exceeds the destination's inbound capacity and will be
    /// queued there for up to `delay_duration_secs`.
    DestinationCapacity { delay_duration_secs: u64 },
}

/// Priced outcome of a transfer.
///
/// Quotes go stale; re-quote if much time passes before initiating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub params: ValidatedParams,
    pub source_token: TokenId,
    pub source_amount: Amount,
    pub destination_token: TokenId,
    /// Source amount scaled to destination decimals
    pub destination_amount: Amount,
    /// Paid in the source chain's native asset
    pub relay_fee: Amount,
    /// Received in the destination chain's native asset
    pub destination_native_gas: Amount,
    pub eta: Duration,
    pub warnings: Vec<QuoteWarning>,
}

/// Why a quote could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteFailure {
    pub reason: String,
}

impl fmt::Display for QuoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Result of [`RouteController::quote`](super::RouteController::quote).
///
/// Relay unavailability is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteResult {
    Success(Box<Quote>),
    Failure(QuoteFailure),
}

impl QuoteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QuoteResult::Success(_))
    }

    pub fn into_result(self) -> std::result::Result<Quote, QuoteFailure> {
        match self {
            QuoteResult::Success(quote) => Ok(*quote),
            QuoteResult::Failure(failure) => Err(failure),
        }
    }
}

/// Progress of a transfer. Variants are ordered; a receipt never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransferState {
    SourceInitiated,
    SourceFinalized,
    Attested,
    DestinationInitiated,
    DestinationFinalized,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        *self == TransferState::DestinationFinalized
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::SourceInitiated => "SourceInitiated",
            TransferState::SourceFinalized => "SourceFinalized",
            TransferState::Attested => "Attested",
            TransferState::DestinationInitiated => "DestinationInitiated",
            TransferState::DestinationFinalized => "DestinationFinalized",
        };
        f.write_str(name)
    }
}

/// The signed VAA of a transfer and the message it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationReceipt {
    pub id: MessageId,
    pub channel: AttestationChannel,
    pub vaa: Vaa,
    pub message: TransceiverMessage,
}

/// One in-flight transfer. Callers keep it, persisting it across restarts if
/// needed, and hand it back to `track`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: Chain,
    pub to: Chain,
    pub state: TransferState,
    pub origin_txs: Vec<TransactionId>,
    pub attestation: Option<AttestationReceipt>,
    pub params: ValidatedParams,
}

impl TransferReceipt {
    /// Moves to `state` if it lies ahead; returns whether anything changed.
    pub fn advance(&mut self, state: TransferState) -> bool {
        if state <= self.state {
            return false;
        }
        self.state = state;
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The transaction that emitted the cross-chain message.
    pub fn last_origin_tx(&self) -> Option<&TransactionId> {
        self.origin_txs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainConfig;
    use crate::protocol::Network;
    use rstest::rstest;

    fn receipt(state: TransferState) -> TransferReceipt {
        let contracts = ChainConfig::default_for(Chain::Base, Network::Mainnet).contracts;
        TransferReceipt {
            from: Chain::Base,
            to: Chain::Arbitrum,
            state,
            origin_txs: Vec::new(),
            attestation: None,
            params: ValidatedParams {
                amount: "1".to_string(),
                normalized_amount: Amount::parse("1", 6).unwrap(),
                source_contracts: contracts.clone(),
                destination_contracts: contracts,
                options: NormalizedOptions {
                    queue: false,
                    automatic: true,
                    gas_dropoff: Amount::zero(18),
                },
            },
        }
    }

    #[rstest]
    #[case(TransferState::SourceInitiated, TransferState::SourceFinalized, true)]
    #[case(TransferState::SourceInitiated, TransferState::Attested, true)]
    #[case(TransferState::Attested, TransferState::Attested, false)]
    #[case(TransferState::Attested, TransferState::SourceFinalized, false)]
    #[case(TransferState::DestinationFinalized, TransferState::Attested, false)]
    fn test_advance_only_moves_forward(
        #[case] from: TransferState,
        #[case] to: TransferState,
        #[case] moved: bool,
    ) {
        let mut receipt = receipt(from);
        assert_eq!(receipt.advance(to), moved);
        assert_eq!(receipt.state, if moved { to } else { from });
    }

    #[test]
    fn test_quote_result_branches() {
        let failure = QuoteResult::Failure(QuoteFailure {
            reason: "Relaying to Solana is not available".to_string(),
        });
        assert!(!failure.is_success());
        assert_eq!(
            failure.into_result().unwrap_err().to_string(),
            "Relaying to Solana is not available"
        );
    }

    #[test]
    fn test_default_options_are_automatic_and_unqueued() {
        let options = TransferOptions::default();
        assert!(options.automatic);
        assert!(!options.queue);
        assert_eq!(options.gas_dropoff, None);
    }
}
