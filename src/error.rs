use thiserror::Error;

use crate::protocol::{Chain, Network};

/// Whether an error is worth retrying.
///
/// Callers branch on this to decide between "fix the input or configuration"
/// and "try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misconfiguration or bad input; retrying with the same arguments fails again.
    Permanent,
    /// Network or timing condition; the same call may succeed later.
    Transient,
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Chain {chain} is not supported on {network}")]
    UnsupportedChain { network: Network, chain: Chain },

    #[error("No platform client configured for {chain}")]
    UnsupportedPlatform { chain: Chain },

    #[error("Token {token} is not bridgeable from {chain}")]
    UnsupportedToken { chain: Chain, token: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidAddressLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Signer is on {actual}, transfer starts on {expected}")]
    SignerMismatch { expected: Chain, actual: Chain },

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Account decode failed: {0}")]
    AccountDecode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Attestation for {txid} not found (will retry)")]
    AttestationNotFound { txid: String },

    #[error("Timeout waiting for attestation of {txid}")]
    AttestationTimeout { txid: String },

    #[error("Attestation failed: {reason}")]
    AttestationFailed { reason: String },

    #[error("Executor quote expired at {expired_at}")]
    ExecutorQuoteExpired { expired_at: u64 },

    #[error("Executor error: {0}")]
    Executor(String),

    #[error("Executor rejected request: {0}")]
    ExecutorRejected(String),

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<alloy_contract::Error> for RouteError {
    fn from(err: alloy_contract::Error) -> Self {
        RouteError::ContractCall(err.to_string())
    }
}

impl RouteError {
    /// Classifies the error as permanent or transient.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::UnsupportedChain { .. }
            | RouteError::UnsupportedPlatform { .. }
            | RouteError::UnsupportedToken { .. }
            | RouteError::InvalidAmount(_)
            | RouteError::InvalidAddressLength { .. }
            | RouteError::InvalidConfig(_)
            | RouteError::SignerMismatch { .. }
            | RouteError::MalformedMessage(_)
            | RouteError::AccountDecode(_)
            | RouteError::AttestationFailed { .. }
            | RouteError::ExecutorRejected(_)
            | RouteError::Abi(_)
            | RouteError::Json(_)
            | RouteError::Hex(_)
            | RouteError::Base64(_) => ErrorKind::Permanent,
            RouteError::Network(_)
            | RouteError::Provider(_)
            | RouteError::ContractCall(_)
            | RouteError::RateLimitExceeded { .. }
            | RouteError::AttestationNotFound { .. }
            | RouteError::AttestationTimeout { .. }
            | RouteError::ExecutorQuoteExpired { .. }
            | RouteError::Executor(_)
            | RouteError::TransactionFailed { .. }
            | RouteError::Rpc(_) => ErrorKind::Transient,
        }
    }

    /// Returns `true` when the failed call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub(crate) fn unsupported_chain(network: Network, chain: Chain) -> Self {
        RouteError::UnsupportedChain { network, chain }
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RouteError::unsupported_chain(Network::Mainnet, Chain::Sepolia), ErrorKind::Permanent)]
    #[case(RouteError::UnsupportedPlatform { chain: Chain::Solana }, ErrorKind::Permanent)]
    #[case(RouteError::InvalidAmount("abc".into()), ErrorKind::Permanent)]
    #[case(
        RouteError::InvalidAddressLength { field: "recipient", expected: 32, actual: 20 },
        ErrorKind::Permanent
    )]
    #[case(RouteError::AttestationNotFound { txid: "0x01".into() }, ErrorKind::Transient)]
    #[case(RouteError::ExecutorQuoteExpired { expired_at: 1 }, ErrorKind::Transient)]
    #[case(RouteError::RateLimitExceeded { retry_after_seconds: 5 }, ErrorKind::Transient)]
    #[case(RouteError::ExecutorRejected("400 Bad Request".into()), ErrorKind::Permanent)]
    #[case(RouteError::Executor("503 Service Unavailable".into()), ErrorKind::Transient)]
    fn test_error_classification(#[case] err: RouteError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
        assert_eq!(err.is_retryable(), expected == ErrorKind::Transient);
    }

    #[test]
    fn test_error_display() {
        let err = RouteError::unsupported_chain(Network::Testnet, Chain::Ethereum);
        insta::assert_snapshot!(err.to_string(), @"Chain Ethereum is not supported on Testnet");
    }
}
