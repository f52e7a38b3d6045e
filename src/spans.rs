//! OpenTelemetry span helpers for routing operations
//!
//! Span names are static (`m0_route.*`) and carry structured attributes, so
//! exporters can group them. Operation spans declare empty `error.*` fields
//! that [`record_error`] fills in when the operation fails.
//!
//! # Usage
//!
//! The [`RouteController`](crate::RouteController) and the tracker attach
//! these spans internally. They are public for callers that drive the
//! building blocks themselves and want the same instrumentation.
//!
//! # Example
//!
//! ```rust,no_run
//! use m0_route::{spans, Chain};
//! use tracing::Instrument;
//!
//! # async fn example() {
//! let span = spans::fetch_attestation_with_retry(Chain::Base, "0xabc", 30, 30);
//! async {
//!     // custom attestation polling
//! }
//! .instrument(span)
//! .await;
//! # }
//! ```

use tracing::Span;
use url::Url;

use crate::protocol::{Amount, Chain, Network, Platform};
use crate::route::TransferState;

/// Span for parsing and normalising a transfer request.
///
/// Parent: caller
/// Children: SVM contract resolution reads
#[inline]
pub fn validate(source_chain: Chain, destination_chain: Chain, amount: &str) -> Span {
    tracing::info_span!(
        "m0_route.validate",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for pricing a validated transfer.
///
/// Parent: caller
/// Children: m0_route.executor_quote, contract reads
#[inline]
pub fn quote(source_chain: Chain, destination_chain: Chain, amount: &Amount) -> Span {
    tracing::info_span!(
        "m0_route.quote",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = %amount,
        relay_available = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for building and submitting a transfer.
///
/// Parent: caller
/// Children: m0_route.executor_quote, m0_route.build_transfer
#[inline]
pub fn initiate(source_chain: Chain, destination_chain: Chain, amount: &Amount) -> Span {
    tracing::info_span!(
        "m0_route.initiate",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for producing the unsigned transactions of one transfer.
///
/// Parent: m0_route.initiate
/// Children: allowance, delivery price and account reads
#[inline]
pub fn build_transfer(source_chain: Chain, destination_chain: Chain, platform: Platform) -> Span {
    tracing::debug_span!(
        "m0_route.build_transfer",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        platform = %platform,
        steps = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
    )
}

/// Span for fetching a signed executor quote.
///
/// Parent: m0_route.quote or m0_route.initiate
/// Children: m0_route.http_request
#[inline]
pub fn executor_quote(source_chain: Chain, destination_chain: Chain, amount: &Amount) -> Span {
    tracing::info_span!(
        "m0_route.executor_quote",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for polling the attestation API until the VAA is signed.
///
/// Parent: m0_route.track or m0_route.resume
/// Children: m0_route.http_request (one per attempt)
#[inline]
pub fn fetch_attestation_with_retry(
    source_chain: Chain,
    txid: &str,
    max_attempts: u32,
    poll_interval_secs: u64,
) -> Span {
    tracing::info_span!(
        "m0_route.fetch_attestation_with_retry",
        source_chain = %source_chain,
        txid = txid,
        max_attempts = max_attempts,
        poll_interval_secs = poll_interval_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for advancing one receipt.
///
/// Parent: caller
/// Children: m0_route.fetch_attestation_with_retry, destination status reads
#[inline]
pub fn track(source_chain: Chain, destination_chain: Chain, state: TransferState) -> Span {
    tracing::info_span!(
        "m0_route.track",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        state = %state,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for rebuilding a receipt from an existing source transaction.
#[inline]
pub fn resume(source_chain: Chain, txid: &str) -> Span {
    tracing::info_span!(
        "m0_route.resume",
        source_chain = %source_chain,
        txid = txid,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for loading the bridge paths of one chain.
///
/// Parent: any operation that needs the path table
/// Children: SVM account reads
#[inline]
pub fn resolve_bridge_paths(chain: Chain, network: Network) -> Span {
    tracing::debug_span!(
        "m0_route.resolve_bridge_paths",
        chain = %chain,
        network = %network,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
    )
}

/// Span for one HTTP request to the attestation or executor API.
///
/// Parent: m0_route.fetch_attestation_with_retry or m0_route.executor_quote
/// Children: None (HTTP client handles internal spans)
#[inline]
pub fn http_request(method: &str, url: &Url) -> Span {
    tracing::trace_span!(
        "m0_route.http_request",
        http.method = method,
        http.url = %url,
        http.status_code = tracing::field::Empty,
    )
}

/// Span for one JSON-RPC call to a chain.
///
/// Parent: operation span
/// Children: None (provider handles internal spans)
#[inline]
pub fn rpc_call(method: &str, chain: Chain) -> Span {
    tracing::trace_span!(
        "m0_route.rpc_call",
        rpc.method = method,
        rpc.chain = %chain,
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// - error.type: The error type/variant
/// - error.message: Human-readable error message
/// - error.source: The underlying cause, when there is one
///
/// # Example
///
/// ```rust,no_run
/// use m0_route::{spans, RouteError};
///
/// # fn example() -> Result<(), RouteError> {
/// let span = tracing::info_span!("m0_route.operation");
/// let _guard = span.enter();
///
/// let result = some_operation();
/// if let Err(ref e) = result {
///     spans::record_error(e);
/// }
/// result
/// # }
/// # fn some_operation() -> Result<(), RouteError> { Ok(()) }
/// ```
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    let message = error.to_string();
    current_span.record("error.type", message.split(':').next().unwrap_or("Unknown"));
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}
