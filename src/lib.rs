//! # m0-route
//!
//! A Rust SDK for moving M0 tokens (M, wrapped M and their extensions) between
//! EVM chains and Solana over the M portal and Wormhole.
//!
//! The [`RouteController`] takes a transfer through three steps, then hands
//! the resulting receipt to the tracker:
//!
//! 1. [`validate`](RouteController::validate) parses the amount and options
//! 2. [`quote`](RouteController::quote) prices the relay and checks capacity
//! 3. [`initiate`](RouteController::initiate) builds the source transactions
//!    and submits them through the caller's [`TransferSigner`]
//! 4. [`track`](RouteController::track) follows the VAA and destination state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use alloy_provider::ProviderBuilder;
//! use m0_route::providers::{
//!     AlloyEvmReader, ExecutorHttpClient, SvmRpcClient, TokioClock, WormholescanClient,
//! };
//! use m0_route::*;
//!
//! # async fn example(signer: &dyn TransferSigner) -> Result<()> {
//! let config = RouteConfig::from_env()?;
//! let registry = Arc::new(ContractRegistry::initialize(&config));
//!
//! let base_rpc = ProviderBuilder::new()
//!     .connect(config.rpc_url(Chain::Base)?.as_str())
//!     .await?;
//! let base = ChainContext::new(
//!     registry.chain_config(config.network, Chain::Base)?.clone(),
//!     Some(PlatformClient::Evm(Arc::new(AlloyEvmReader::new(Chain::Base, base_rpc)))),
//! )?;
//! let solana = ChainContext::new(
//!     registry.chain_config(config.network, Chain::Solana)?.clone(),
//!     Some(PlatformClient::Svm(Arc::new(SvmRpcClient::new(
//!         Chain::Solana,
//!         config.rpc_url(Chain::Solana)?.clone(),
//!     )))),
//! )?;
//!
//! let controller = RouteController::builder()
//!     .network(config.network)
//!     .registry(registry.clone())
//!     .contexts(vec![base, solana])
//!     .executor_api(Arc::new(ExecutorHttpClient::new(config.executor_api_url.clone())))
//!     .attestations(Arc::new(WormholescanClient::new(config.wormholescan_api_url.clone())))
//!     .clock(Arc::new(TokioClock::new()))
//!     .build()?;
//!
//! let source = registry.get_contracts(config.network, Chain::Base)?.token;
//! let destination = controller.context(Chain::Solana)?.contracts().await?.token;
//! let request = controller
//!     .create_request(
//!         TokenId::new(Chain::Base, source),
//!         TokenId::new(Chain::Solana, destination),
//!     )
//!     .await?;
//!
//! let params = controller.validate(&request, &TransferInput::new("25.5")).await?;
//! let quote = match controller.quote(&request, &params).await?.into_result() {
//!     Ok(quote) => quote,
//!     Err(failure) => return Err(RouteError::ExecutorRejected(failure.reason)),
//! };
//!
//! let recipient = [7u8; 32];
//! let receipt = controller.initiate(&request, signer, &quote, recipient.to_vec()).await?;
//! let updates = controller.track(&receipt, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **EVM and SVM builders** behind one [`TransactionBuilder`](platform::TransactionBuilder)
//!   interface, selected by matching on the chain family
//! - **Executor relaying** with signed quotes and optional gas drop-off
//! - **Resumable tracking** from a bare source transaction id
//! - **Trait-based IO** so every network call can be faked in tests
//!
//! ## Public API
//!
//! - [`RouteController`] and [`AttestationTracker`] - transfer orchestration
//! - [`ContractRegistry`], [`ChainContext`], [`BridgePathResolver`] - chain model
//! - [`ExecutorQuoteService`] - executor quotes and capabilities
//! - [`RouteError`], [`ErrorKind`] and [`Result`] - error handling
//! - [`providers`] - production IO, [`testing`] - fakes

mod chain;
mod config;
mod error;
mod executor;
mod route;

pub mod contracts;
pub mod platform;
pub mod protocol;
pub mod providers;
pub mod spans;
pub mod testing;
pub mod traits;

pub use chain::addresses;
pub use chain::{
    BridgePathResolver, ChainConfig, ChainContext, ContractRegistry, ContractSet,
    ExtensionEntry, ExtensionTable, PlatformClient,
};
pub use config::{PollingConfig, RouteConfig};
pub use contracts::erc20::Erc20Contract;
pub use error::{ErrorKind, Result, RouteError};
pub use executor::{
    ExecutorCapabilities, ExecutorQuote, ExecutorQuoteService, GasDropOff, RelayInstruction,
    SignedQuote,
};
pub use protocol::{
    Amount, AttestationChannel, Chain, MessageId, Network, Platform, TokenId, UniversalAddress,
    Vaa,
};
pub use route::{
    AttestationReceipt, AttestationTracker, NormalizedOptions, Quote, QuoteFailure, QuoteResult,
    QuoteWarning, RouteController, TokenDetails, TransactionId, TransferInput, TransferOptions,
    TransferReceipt, TransferRequest, TransferState, ValidatedParams,
};
pub use traits::{
    AttestationProvider, Clock, EvmChainReader, ExecutorApi, SvmAccountReader, TransferSigner,
};
