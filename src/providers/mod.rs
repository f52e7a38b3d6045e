//! Production implementations of the IO traits.
//!
//! This module provides the "real" implementations of the traits defined in
//! [`crate::traits`]: contract reads through Alloy, account reads over
//! Solana JSON-RPC, the Wormholescan and executor HTTP APIs, and the system
//! clock.
//!
//! Applications typically wire these into a
//! [`RouteController`](crate::RouteController); tests use the fakes in
//! [`crate::testing`].

mod alloy;
mod executor_api;
mod svm_rpc;
mod tokio_clock;
mod wormholescan;

pub use self::alloy::AlloyEvmReader;
pub use self::executor_api::ExecutorHttpClient;
pub use self::svm_rpc::SvmRpcClient;
pub use self::tokio_clock::TokioClock;
pub use self::wormholescan::WormholescanClient;
