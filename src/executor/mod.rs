//! Executor relay network integration
//!
//! The executor is an off-chain service that, for a fee paid on the source
//! chain, submits the destination-chain completion on the user's behalf. A
//! signed quote from it is embedded into the source transaction. Quotes are
//! time-limited and single-use: fetch one right before building the
//! transaction that consumes it.

mod quote;

pub use quote::{
    encode_relay_instructions, ExecutorCapabilities, QuoteRequest, RelayInstruction, SignedQuote,
    SignedQuoteResponse, SIGNED_QUOTE_PREFIX, VAA_REQUEST_TYPE,
};

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Bytes, U256};
use tracing::{debug, info, Instrument};

use crate::chain::ContractRegistry;
use crate::error::{Result, RouteError};
use crate::protocol::{Amount, Chain, Network, UniversalAddress};
use crate::spans;
use crate::traits::{Clock, ExecutorApi};

/// Native gas the executor hands to the recipient on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasDropOff {
    pub amount: u128,
    pub recipient: UniversalAddress,
}

/// A priced, signed relay request ready to embed in a source transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorQuote {
    /// Cost in source-chain native base units
    pub estimated_cost: U256,
    pub signed_quote: Bytes,
    pub relay_instructions: Bytes,
    /// Account on the source chain that receives the payment
    pub payee: UniversalAddress,
    /// Unix seconds after which the executor rejects the quote
    pub expiry: u64,
}

impl ExecutorQuote {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiry
    }
}

/// Obtains executor quotes and capabilities.
#[derive(Clone)]
pub struct ExecutorQuoteService {
    api: Arc<dyn ExecutorApi>,
    registry: Arc<ContractRegistry>,
    clock: Arc<dyn Clock>,
}

impl ExecutorQuoteService {
    pub fn new(
        api: Arc<dyn ExecutorApi>,
        registry: Arc<ContractRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            registry,
            clock,
        }
    }

    pub async fn capabilities(&self) -> Result<HashMap<u16, ExecutorCapabilities>> {
        self.api.capabilities().await
    }

    /// Whether the executor delivers VAAs to `destination`.
    pub async fn supports_destination(&self, destination: Chain) -> Result<bool> {
        let capabilities = self.api.capabilities().await?;
        let supported = capabilities
            .get(&destination.wormhole_chain_id())
            .is_some_and(ExecutorCapabilities::supports_vaa_requests);
        debug!(
            destination = %destination,
            supported = supported,
            event = "executor_capabilities_checked"
        );
        Ok(supported)
    }

    /// Fetches a signed quote for delivering one transfer message from
    /// `source` to `destination`.
    ///
    /// Pricing depends only on the delivery cost of the message, so the
    /// request carries the relay instructions and never the token being moved.
    /// `amount` is recorded on the span.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnsupportedChain`] if either chain is not registered
    /// - [`RouteError::ExecutorQuoteExpired`] if the returned quote is already expired
    /// - [`RouteError::ExecutorRejected`] if the quote is for the wrong route, from an
    ///   unexpected quoter or lacks a cost
    pub async fn get_executor_quote(
        &self,
        network: Network,
        source: Chain,
        destination: Chain,
        amount: &Amount,
        drop_off: Option<GasDropOff>,
    ) -> Result<ExecutorQuote> {
        let span = spans::executor_quote(source, destination, amount);
        async {
            self.fetch_quote(network, source, destination, drop_off)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn fetch_quote(
        &self,
        network: Network,
        source: Chain,
        destination: Chain,
        drop_off: Option<GasDropOff>,
    ) -> Result<ExecutorQuote> {
        let expected_quoter = self.registry.get_contracts(network, source)?.quoter;
        let destination_config = self.registry.chain_config(network, destination)?;

        let mut instructions = vec![RelayInstruction::Gas {
            gas_limit: destination_config.executor_gas_limit,
            msg_value: destination_config.executor_msg_value,
        }];
        if let Some(drop_off) = drop_off.filter(|d| d.amount > 0) {
            instructions.push(RelayInstruction::GasDropOff {
                amount: drop_off.amount,
                recipient: drop_off.recipient,
            });
        }
        let relay_instructions = encode_relay_instructions(&instructions);

        let source_id = source.wormhole_chain_id();
        let destination_id = destination.wormhole_chain_id();
        let response = self
            .api
            .quote(source_id, destination_id, relay_instructions.clone())
            .await?;

        let signed = SignedQuote::decode(&response.signed_quote)?;
        if signed.source_chain != source_id || signed.destination_chain != destination_id {
            return Err(RouteError::ExecutorRejected(format!(
                "quote is for route {} -> {}, requested {} -> {}",
                signed.source_chain, signed.destination_chain, source_id, destination_id
            )));
        }
        if let Some(expected) = expected_quoter {
            if UniversalAddress::from(signed.quoter) != expected {
                return Err(RouteError::ExecutorRejected(format!(
                    "quote signed by {}, expected {expected}",
                    signed.quoter
                )));
            }
        }
        let now = self.clock.unix_timestamp();
        if now >= signed.expiry {
            return Err(RouteError::ExecutorQuoteExpired {
                expired_at: signed.expiry,
            });
        }
        let estimated_cost = response.estimated_cost()?;

        info!(
            source_chain = %source,
            destination_chain = %destination,
            estimated_cost = %estimated_cost,
            expires_in_secs = signed.expiry - now,
            event = "executor_quote_received"
        );

        Ok(ExecutorQuote {
            estimated_cost,
            signed_quote: response.signed_quote,
            relay_instructions,
            payee: signed.payee,
            expiry: signed.expiry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::testing::{FakeClock, FakeExecutorApi};
    use alloy_primitives::Address;

    fn service(api: Arc<FakeExecutorApi>, clock: Arc<FakeClock>) -> ExecutorQuoteService {
        let registry = Arc::new(ContractRegistry::initialize(&RouteConfig::default()));
        ExecutorQuoteService::new(api, registry, clock)
    }

    fn amount() -> Amount {
        Amount::parse("1.5", 6).unwrap()
    }

    #[tokio::test]
    async fn test_quote_for_svm_destination_uses_svm_gas() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Base, Chain::Solana, 1_234, clock.unix_timestamp() + 300);

        let quote = service(api.clone(), clock)
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap();

        assert_eq!(quote.estimated_cost, U256::from(1_234u64));
        assert_eq!(quote.payee, FakeExecutorApi::PAYEE);
        let expected = encode_relay_instructions(&[RelayInstruction::Gas {
            gas_limit: 250_000,
            msg_value: 20_000_000,
        }]);
        assert_eq!(quote.relay_instructions, expected);
        assert_eq!(api.requested_instructions(), vec![expected]);
    }

    #[tokio::test]
    async fn test_quote_includes_drop_off() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Solana, Chain::Base, 1, clock.unix_timestamp() + 300);

        let drop_off = GasDropOff {
            amount: 1_000,
            recipient: UniversalAddress::new([9; 32]),
        };
        let quote = service(api, clock)
            .get_executor_quote(
                Network::Mainnet,
                Chain::Solana,
                Chain::Base,
                &amount(),
                Some(drop_off),
            )
            .await
            .unwrap();
        assert_eq!(quote.relay_instructions.len(), 33 + 49);
    }

    #[tokio::test]
    async fn test_expired_quote_is_transient() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Base, Chain::Solana, 1, clock.unix_timestamp());

        let err = service(api, clock)
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::ExecutorQuoteExpired { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_misrouted_quote_is_rejected() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Base, Chain::Arbitrum, 1, clock.unix_timestamp() + 300);
        let misrouted = api.response(Chain::Base, Chain::Arbitrum).unwrap();
        api.add_response(Chain::Base, Chain::Solana, misrouted);

        let err = service(api, clock)
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::ExecutorRejected(ref m) if m.contains("30 -> 23")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_quote_from_unexpected_quoter_is_rejected() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Base, Chain::Solana, 1, clock.unix_timestamp() + 300);

        let mut registry = ContractRegistry::initialize(&RouteConfig::default());
        let mut base = registry.chain_config(Network::Mainnet, Chain::Base).unwrap().clone();
        base.contracts.quoter = Some(Address::repeat_byte(0x77).into());
        registry.register(base.clone());
        let service =
            ExecutorQuoteService::new(api.clone(), Arc::new(registry.clone()), clock.clone());

        let err = service
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::ExecutorRejected(ref m) if m.contains("signed by")));

        base.contracts.quoter = Some(Address::repeat_byte(0x51).into());
        registry.register(base);
        let quote = ExecutorQuoteService::new(api, Arc::new(registry), clock)
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap();
        assert_eq!(quote.estimated_cost, U256::from(1u64));
    }

    #[tokio::test]
    async fn test_quote_without_cost_is_rejected() {
        let api = Arc::new(FakeExecutorApi::new());
        let clock = Arc::new(FakeClock::new());
        api.add_quote(Chain::Base, Chain::Solana, 1, clock.unix_timestamp() + 300);
        let mut response = api.response(Chain::Base, Chain::Solana).unwrap();
        response.estimated_cost = None;
        api.add_response(Chain::Base, Chain::Solana, response);

        let err = service(api, clock)
            .get_executor_quote(Network::Mainnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::ExecutorRejected(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unsupported_chain_fails_before_request() {
        let api = Arc::new(FakeExecutorApi::new());
        let err = service(api.clone(), Arc::new(FakeClock::new()))
            .get_executor_quote(Network::Testnet, Chain::Base, Chain::Solana, &amount(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedChain { .. }));
        assert_eq!(api.quote_call_count(), 0);
    }

    #[tokio::test]
    async fn test_supports_destination() {
        let api = Arc::new(FakeExecutorApi::new());
        api.set_supported(&[Chain::Solana]);
        let service = service(api, Arc::new(FakeClock::new()));
        assert!(service.supports_destination(Chain::Solana).await.unwrap());
        assert!(!service.supports_destination(Chain::Base).await.unwrap());
    }
}
