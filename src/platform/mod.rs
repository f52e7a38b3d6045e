//! Platform transaction builders
//!
//! Each chain family implements [`TransactionBuilder`]. The route controller
//! picks the implementation by matching on [`PlatformBuilder`], never by
//! downcasting, and receives an ordered list of [`BuildStep`]s that the
//! caller's signer submits one after the other.

mod evm;
mod svm;

pub use evm::EvmTransactionBuilder;
pub use svm::SvmTransactionBuilder;

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Bytes;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use bon::Builder;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::chain::{ChainConfig, ChainContext, ExtensionTable};
use crate::error::{Result, RouteError};
use crate::executor::ExecutorQuote;
use crate::protocol::{Amount, Chain, Platform, UniversalAddress};

/// An address lookup table referenced by a versioned SVM transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLookupTable {
    pub key: Pubkey,
    pub addresses: Vec<Pubkey>,
}

/// Unsigned SVM transaction: instructions in execution order plus the lookup
/// tables needed to fit them in one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvmTransaction {
    pub payer: Pubkey,
    pub instructions: Vec<Instruction>,
    pub lookup_tables: Vec<AddressLookupTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnsignedTransaction {
    Evm(TransactionRequest),
    Svm(SvmTransaction),
}

impl UnsignedTransaction {
    pub fn platform(&self) -> Platform {
        match self {
            UnsignedTransaction::Evm(_) => Platform::Evm,
            UnsignedTransaction::Svm(_) => Platform::Svm,
        }
    }
}

/// One transaction the caller must sign and submit.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStep {
    /// Human-readable label, e.g. `"M0.Approve"`
    pub description: String,
    /// Whether the step may be submitted together with the next one.
    pub parallelizable: bool,
    pub transaction: UnsignedTransaction,
}

impl BuildStep {
    pub fn new(description: impl Into<String>, transaction: UnsignedTransaction) -> Self {
        Self {
            description: description.into(),
            parallelizable: false,
            transaction,
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.transaction.platform())
    }
}

/// Parameters of one transfer as seen by a builder.
///
/// The destination token and recipient are taken as raw bytes and checked
/// against the 32-byte wire width by [`validate`](Self::validate) before any
/// transaction is built.
#[derive(Builder, Debug, Clone)]
pub struct TransferParams {
    sender: UniversalAddress,
    amount: Amount,
    source_token: UniversalAddress,
    destination_chain: Chain,
    #[builder(into)]
    destination_token: Bytes,
    #[builder(into)]
    recipient: Bytes,
    /// Defaults to the recipient.
    refund: Option<UniversalAddress>,
    #[builder(default)]
    queue: bool,
    executor_quote: Option<ExecutorQuote>,
}

impl TransferParams {
    pub fn sender(&self) -> UniversalAddress {
        self.sender
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn source_token(&self) -> UniversalAddress {
        self.source_token
    }

    pub fn destination_chain(&self) -> Chain {
        self.destination_chain
    }

    pub fn destination_token(&self) -> Result<UniversalAddress> {
        UniversalAddress::from_slice("destination token", &self.destination_token)
    }

    pub fn recipient(&self) -> Result<UniversalAddress> {
        UniversalAddress::from_slice("recipient", &self.recipient)
    }

    pub fn refund(&self) -> Result<UniversalAddress> {
        match self.refund {
            Some(refund) => Ok(refund),
            None => self.recipient(),
        }
    }

    pub fn queue(&self) -> bool {
        self.queue
    }

    pub fn executor_quote(&self) -> Result<&ExecutorQuote> {
        self.executor_quote.as_ref().ok_or_else(|| {
            RouteError::InvalidConfig(format!(
                "transfer to {} needs an executor quote",
                self.destination_chain
            ))
        })
    }

    /// Rejects identifiers that are not exactly 32 bytes.
    pub fn validate(&self) -> Result<()> {
        self.destination_token()?;
        self.recipient()?;
        Ok(())
    }
}

/// Capabilities every chain family provides.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    /// Approval of `spender` for the transfer amount, or `None` when the
    /// current allowance already covers it or the family needs none.
    async fn build_approval(
        &self,
        params: &TransferParams,
        spender: UniversalAddress,
    ) -> Result<Option<BuildStep>>;

    /// Transfer of the base token itself.
    async fn build_base_transfer(&self, params: &TransferParams) -> Result<BuildStep>;

    /// Unwraps an extension token to the base token and bridges it in one
    /// transaction.
    async fn build_extension_transfer(&self, params: &TransferParams) -> Result<BuildStep>;

    /// Embeds `quote` so the executor delivers the message on the
    /// destination chain.
    async fn build_relay_request(
        &self,
        params: &TransferParams,
        quote: &ExecutorQuote,
    ) -> Result<BuildStep>;

    /// Every step of the transfer in submission order.
    async fn build_transfer(&self, params: &TransferParams) -> Result<Vec<BuildStep>>;
}

/// Builder of one source chain, tagged by family.
pub enum PlatformBuilder<'a> {
    Evm(EvmTransactionBuilder<'a>),
    Svm(SvmTransactionBuilder<'a>),
}

impl<'a> PlatformBuilder<'a> {
    /// Selects the builder for `source`'s family. `extensions` is the
    /// source chain's path table; SVM builders take extension accounts from it.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnsupportedPlatform`] when `source` has no
    /// client, before anything is read from the network.
    pub fn for_route(
        source: &'a ChainContext,
        destination: &'a ChainConfig,
        extensions: Arc<ExtensionTable>,
    ) -> Result<Self> {
        match source.client()?.platform() {
            Platform::Evm => Ok(PlatformBuilder::Evm(EvmTransactionBuilder::new(
                source,
                destination,
            ))),
            Platform::Svm => Ok(PlatformBuilder::Svm(SvmTransactionBuilder::new(
                source,
                destination,
                extensions,
            ))),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformBuilder::Evm(_) => Platform::Evm,
            PlatformBuilder::Svm(_) => Platform::Svm,
        }
    }

    pub fn builder(&self) -> &dyn TransactionBuilder {
        match self {
            PlatformBuilder::Evm(builder) => builder,
            PlatformBuilder::Svm(builder) => builder,
        }
    }
}
