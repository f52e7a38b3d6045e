//! The route controller: validate, quote and initiate M0 transfers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Bytes, U256};
use bon::bon;
use tracing::{debug, info, warn, Instrument};

use super::tracker::AttestationTracker;
use super::types::{
    NormalizedOptions, Quote, QuoteFailure, QuoteResult, QuoteWarning, TokenDetails,
    TransferInput, TransferReceipt, TransferRequest, TransferState, ValidatedParams,
};
use crate::chain::{
    BridgePathResolver, ChainConfig, ChainContext, ContractRegistry, PlatformClient,
};
use crate::config::PollingConfig;
use crate::contracts::svm::accounts::decode_mint_decimals;
use crate::error::{Result, RouteError};
use crate::executor::{ExecutorQuoteService, GasDropOff};
use crate::platform::{EvmTransactionBuilder, PlatformBuilder, TransferParams};
use crate::protocol::{Amount, Chain, Network, Platform, TokenId, UniversalAddress};
use crate::spans;
use crate::traits::{AttestationProvider, Clock, ExecutorApi, TransferSigner};

/// Orchestrates M0 transfers between the chains of one network.
///
/// A controller owns one [`ChainContext`] per configured chain and shares the
/// contract registry and bridge path cache with its collaborators. Chains
/// registered for the network but given no context are rejected as
/// unsupported.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use m0_route::*;
/// # use m0_route::testing::*;
/// # async fn example() -> Result<()> {
/// let config = RouteConfig::default();
/// let registry = Arc::new(ContractRegistry::initialize(&config));
/// let base = ChainContext::new(
///     registry.chain_config(Network::Mainnet, Chain::Base)?.clone(),
///     Some(PlatformClient::Evm(Arc::new(FakeEvmChain::new()))),
/// )?;
///
/// let controller = RouteController::builder()
///     .network(Network::Mainnet)
///     .registry(registry)
///     .contexts(vec![base])
///     .executor_api(Arc::new(FakeExecutorApi::new()))
///     .attestations(Arc::new(FakeAttestationProvider::new()))
///     .clock(Arc::new(FakeClock::new()))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RouteController {
    network: Network,
    registry: Arc<ContractRegistry>,
    resolver: Arc<BridgePathResolver>,
    executor: ExecutorQuoteService,
    contexts: BTreeMap<Chain, Arc<ChainContext>>,
    tracker: AttestationTracker,
}

#[bon]
impl RouteController {
    /// # Errors
    ///
    /// - [`RouteError::InvalidConfig`] if a context belongs to another network
    ///   or two contexts share a chain
    /// - [`RouteError::UnsupportedChain`] if a context's chain is not
    ///   registered for `network`
    #[builder]
    pub fn new(
        network: Network,
        registry: Arc<ContractRegistry>,
        #[builder(default)] contexts: Vec<ChainContext>,
        executor_api: Arc<dyn ExecutorApi>,
        attestations: Arc<dyn AttestationProvider>,
        clock: Arc<dyn Clock>,
        #[builder(default)] polling: PollingConfig,
    ) -> Result<Self> {
        let mut by_chain = BTreeMap::new();
        for context in contexts {
            if context.network() != network {
                return Err(RouteError::InvalidConfig(format!(
                    "{} context belongs to {}, controller runs on {network}",
                    context.chain(),
                    context.network()
                )));
            }
            registry.chain_config(network, context.chain())?;
            let chain = context.chain();
            if by_chain.insert(chain, Arc::new(context)).is_some() {
                return Err(RouteError::InvalidConfig(format!(
                    "{chain} configured more than once"
                )));
            }
        }

        info!(
            network = %network,
            chains = ?by_chain.keys().collect::<Vec<_>>(),
            event = "route_controller_created"
        );

        let tracker = AttestationTracker::new(
            network,
            registry.clone(),
            by_chain.clone(),
            attestations,
            clock.clone(),
            polling,
        );
        Ok(Self {
            network,
            resolver: Arc::new(BridgePathResolver::new(registry.clone())),
            executor: ExecutorQuoteService::new(executor_api, registry.clone(), clock),
            registry,
            contexts: by_chain,
            tracker,
        })
    }
}

impl RouteController {
    pub fn network(&self) -> Network {
        self.network
    }

    pub fn registry(&self) -> &Arc<ContractRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<BridgePathResolver> {
        &self.resolver
    }

    pub fn tracker(&self) -> &AttestationTracker {
        &self.tracker
    }

    /// Chains this controller has a context for.
    pub fn supported_chains(&self) -> Vec<Chain> {
        self.contexts.keys().copied().collect()
    }

    /// The context of `chain`; fails without IO when none is configured.
    pub fn context(&self, chain: Chain) -> Result<&ChainContext> {
        self.contexts
            .get(&chain)
            .map(Arc::as_ref)
            .ok_or_else(|| RouteError::unsupported_chain(self.network, chain))
    }

    pub async fn supported_source_tokens(&self, chain: Chain) -> Result<Vec<TokenId>> {
        self.resolver
            .supported_source_tokens(self.context(chain)?)
            .await
    }

    pub async fn supported_destination_tokens(
        &self,
        source: &TokenId,
        from: Chain,
        to: Chain,
    ) -> Result<Vec<TokenId>> {
        let from = self.context(from)?;
        let to = self.context(to)?;
        self.resolver
            .supported_destination_tokens(source, from, to)
            .await
    }

    /// Forgets the cached bridge paths of `chain`.
    pub fn refresh(&self, chain: Chain) {
        self.resolver.refresh(chain);
    }

    pub fn refresh_all(&self) {
        self.resolver.refresh_all();
    }

    /// Builds a request, reading each token's decimals from its chain.
    ///
    /// # Errors
    ///
    /// [`RouteError::UnsupportedToken`] if an SVM mint account does not exist.
    pub async fn create_request(
        &self,
        source: TokenId,
        destination: TokenId,
    ) -> Result<TransferRequest> {
        let source = TokenDetails {
            decimals: self.token_decimals(&source).await?,
            id: source,
        };
        let destination = TokenDetails {
            decimals: self.token_decimals(&destination).await?,
            id: destination,
        };
        Ok(TransferRequest::new(source, destination))
    }

    async fn token_decimals(&self, token: &TokenId) -> Result<u8> {
        let context = self.context(token.chain)?;
        match context.client()? {
            PlatformClient::Evm(reader) => reader.decimals(token.address.to_evm()?).await,
            PlatformClient::Svm(reader) => {
                let data = reader
                    .get_account_data(token.address.to_pubkey())
                    .await?
                    .ok_or_else(|| RouteError::UnsupportedToken {
                        chain: token.chain,
                        token: token.address.to_native_string(token.chain),
                    })?;
                decode_mint_decimals(&data)
            }
        }
    }

    /// Whether an automatic relay exists for the request's route.
    pub async fn is_available(&self, request: &TransferRequest) -> Result<bool> {
        let source = self.context(request.from_chain())?;
        let destination = self.context(request.to_chain())?;
        self.relay_available(source, destination.config()).await
    }

    async fn relay_available(
        &self,
        source: &ChainContext,
        destination: &ChainConfig,
    ) -> Result<bool> {
        let available = match source.platform() {
            Platform::Evm if !destination.requires_relay_entrypoint => {
                let reader = source.evm()?;
                let transceiver = source.config().contracts.transceiver()?.to_evm()?;
                reader
                    .is_relaying_enabled(transceiver, destination.chain.wormhole_chain_id())
                    .await?
            }
            Platform::Evm => {
                source.config().relay_entrypoint.is_some()
                    && self.executor.supports_destination(destination.chain).await?
            }
            Platform::Svm => {
                destination.chain.is_evm()
                    && self.executor.supports_destination(destination.chain).await?
            }
        };
        debug!(
            source_chain = %source.chain(),
            destination_chain = %destination.chain,
            available = available,
            event = "relay_availability_checked"
        );
        Ok(available)
    }

    /// Whether delivery goes through the executor rather than the standard
    /// relayer.
    fn uses_executor(source: &ChainContext, destination: &ChainConfig) -> bool {
        source.platform() == Platform::Svm || destination.requires_relay_entrypoint
    }

    /// Parses and normalises user input.
    ///
    /// The amount is parsed with the source token's decimals and floored to
    /// the destination's precision; the gas drop-off is parsed with the
    /// destination chain's native decimals.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnsupportedChain`] for chains without a context, before any IO
    /// - [`RouteError::InvalidAmount`] for malformed amounts
    /// - [`RouteError::InvalidConfig`] when manual delivery is requested
    pub async fn validate(
        &self,
        request: &TransferRequest,
        input: &TransferInput,
    ) -> Result<ValidatedParams> {
        let span = spans::validate(request.from_chain(), request.to_chain(), &input.amount);
        async {
            self.normalize(request, input)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn normalize(
        &self,
        request: &TransferRequest,
        input: &TransferInput,
    ) -> Result<ValidatedParams> {
        let (from, to) = (request.from_chain(), request.to_chain());
        let source = self.context(from)?;
        let destination = self.context(to)?;
        if from == to {
            return Err(RouteError::InvalidConfig(format!(
                "source and destination are both {from}"
            )));
        }

        let options = input.options.clone().unwrap_or_default();
        if !options.automatic {
            return Err(RouteError::InvalidConfig(
                "manual delivery is not supported".to_string(),
            ));
        }

        let gas_dropoff = Amount::parse(
            options.gas_dropoff.as_deref().unwrap_or("0"),
            to.native_decimals(),
        )?;
        let parsed = Amount::parse(&input.amount, request.source.decimals)?;
        let normalized_amount = parsed.trim(request.destination.decimals);
        if normalized_amount != parsed {
            debug!(
                amount = %parsed,
                dust = %parsed.dust(request.destination.decimals),
                event = "amount_trimmed"
            );
        }

        Ok(ValidatedParams {
            amount: input.amount.clone(),
            normalized_amount,
            source_contracts: source.contracts().await?,
            destination_contracts: destination.contracts().await?,
            options: NormalizedOptions {
                queue: options.queue,
                automatic: true,
                gas_dropoff,
            },
        })
    }

    /// Prices a validated transfer.
    ///
    /// Returns [`QuoteResult::Failure`] when no relay serves the route; IO
    /// failures are errors.
    pub async fn quote(
        &self,
        request: &TransferRequest,
        params: &ValidatedParams,
    ) -> Result<QuoteResult> {
        let span = spans::quote(
            request.from_chain(),
            request.to_chain(),
            &params.normalized_amount,
        );
        async {
            self.price(request, params)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn price(
        &self,
        request: &TransferRequest,
        params: &ValidatedParams,
    ) -> Result<QuoteResult> {
        let (from, to) = (request.from_chain(), request.to_chain());
        let source = self.context(from)?;
        let destination = self.context(to)?;

        let available = self.relay_available(source, destination.config()).await?;
        tracing::Span::current().record("relay_available", available);
        if !available {
            info!(
                source_chain = %from,
                destination_chain = %to,
                event = "relay_unavailable"
            );
            return Ok(QuoteResult::Failure(QuoteFailure {
                reason: format!("Relaying to {to} is not available"),
            }));
        }

        let uses_executor = Self::uses_executor(source, destination.config());
        let mut fee = U256::ZERO;
        if source.platform() == Platform::Evm {
            fee += EvmTransactionBuilder::new(source, destination.config())
                .delivery_price()
                .await?;
        }
        if uses_executor {
            let drop_off = gas_drop_off(&params.options, UniversalAddress::ZERO)?;
            let quote = self
                .executor
                .get_executor_quote(self.network, from, to, &params.normalized_amount, drop_off)
                .await?;
            fee += quote.estimated_cost;
        }

        let destination_amount = params.normalized_amount.scale(request.destination.decimals)?;
        let quote = Quote {
            params: params.clone(),
            source_token: request.source.id,
            source_amount: params.normalized_amount,
            destination_token: request.destination.id,
            destination_amount,
            relay_fee: Amount::from_units(fee, from.native_decimals()),
            destination_native_gas: if uses_executor {
                params.options.gas_dropoff
            } else {
                Amount::zero(to.native_decimals())
            },
            eta: from.finality_estimate(),
            warnings: self.capacity_warnings(source, destination, &destination_amount).await?,
        };

        info!(
            source_chain = %from,
            destination_chain = %to,
            amount = %quote.source_amount,
            relay_fee = %quote.relay_fee,
            warnings = quote.warnings.len(),
            event = "quote_computed"
        );
        Ok(QuoteResult::Success(Box::new(quote)))
    }

    /// Warns when `amount` would exceed the destination's inbound rate limit.
    async fn capacity_warnings(
        &self,
        source: &ChainContext,
        destination: &ChainContext,
        amount: &Amount,
    ) -> Result<Vec<QuoteWarning>> {
        let Ok(PlatformClient::Evm(reader)) = destination.client() else {
            return Ok(Vec::new());
        };
        let manager = destination.config().contracts.manager.to_evm()?;
        let duration = reader.rate_limit_duration(manager).await?;
        if duration == 0 {
            return Ok(Vec::new());
        }

        let capacity = reader
            .current_inbound_capacity(manager, source.chain().wormhole_chain_id())
            .await?;
        let bps = U256::from(destination.config().capacity_warning_bps);
        let threshold = capacity.saturating_mul(bps) / U256::from(10_000u64);
        if amount.units() <= threshold {
            return Ok(Vec::new());
        }

        warn!(
            destination_chain = %destination.chain(),
            amount = %amount,
            capacity = %capacity,
            delay_duration_secs = duration,
            event = "destination_capacity_warning"
        );
        Ok(vec![QuoteWarning::DestinationCapacity {
            delay_duration_secs: duration,
        }])
    }

    /// Builds the transfer and submits every step through `signer`.
    ///
    /// `recipient` is the 32-byte destination address. An executor quote is
    /// fetched again so the one embedded in the transaction is fresh.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnsupportedChain`] or [`RouteError::UnsupportedPlatform`]
    ///   when the source has no context or client, before any IO
    /// - [`RouteError::SignerMismatch`] when `signer` is on another chain
    /// - [`RouteError::InvalidAddressLength`] for a malformed recipient
    /// - the signer's error if a submission fails; earlier steps stay submitted
    pub async fn initiate(
        &self,
        request: &TransferRequest,
        signer: &dyn TransferSigner,
        quote: &Quote,
        recipient: impl Into<Bytes>,
    ) -> Result<TransferReceipt> {
        let recipient = recipient.into();
        let span = spans::initiate(
            request.from_chain(),
            request.to_chain(),
            &quote.params.normalized_amount,
        );
        async {
            self.submit(request, signer, quote, recipient)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn submit(
        &self,
        request: &TransferRequest,
        signer: &dyn TransferSigner,
        quote: &Quote,
        recipient: Bytes,
    ) -> Result<TransferReceipt> {
        let (from, to) = (request.from_chain(), request.to_chain());
        let source = self.context(from)?;
        if !source.has_client() {
            return Err(RouteError::UnsupportedPlatform { chain: from });
        }
        if signer.chain() != from {
            return Err(RouteError::SignerMismatch {
                expected: from,
                actual: signer.chain(),
            });
        }
        let destination = self.context(to)?.config();
        let params = &quote.params;
        let recipient_address = UniversalAddress::from_slice("recipient", &recipient)?;

        let executor_quote = if Self::uses_executor(source, destination) {
            let drop_off = gas_drop_off(&params.options, recipient_address)?;
            let quote = self
                .executor
                .get_executor_quote(self.network, from, to, &params.normalized_amount, drop_off)
                .await?;
            Some(quote)
        } else {
            None
        };

        let transfer = TransferParams::builder()
            .sender(signer.address())
            .amount(params.normalized_amount)
            .source_token(request.source.id.address)
            .destination_chain(to)
            .destination_token(request.destination.id.address.as_bytes().to_vec())
            .recipient(recipient)
            .queue(params.options.queue)
            .maybe_executor_quote(executor_quote)
            .build();
        transfer.validate()?;

        let extensions = self.resolver.extensions(source).await?;
        let platform = PlatformBuilder::for_route(source, destination, extensions)?;
        let span = spans::build_transfer(from, to, platform.platform());
        let steps = async {
            let steps = platform
                .builder()
                .build_transfer(&transfer)
                .await
                .inspect_err(spans::record_error)?;
            tracing::Span::current().record("steps", steps.len());
            Ok::<_, RouteError>(steps)
        }
        .instrument(span)
        .await?;

        let mut origin_txs = Vec::with_capacity(steps.len());
        for step in &steps {
            debug!(step = %step, event = "submitting_step");
            let txid = signer.sign_and_send(step).await?;
            info!(
                step = %step.description,
                txid = %txid,
                event = "step_submitted"
            );
            origin_txs.push(txid);
        }

        info!(
            source_chain = %from,
            destination_chain = %to,
            amount = %params.normalized_amount,
            transactions = origin_txs.len(),
            event = "transfer_initiated"
        );
        Ok(TransferReceipt {
            from,
            to,
            state: TransferState::SourceInitiated,
            origin_txs,
            attestation: None,
            params: params.clone(),
        })
    }

    /// Advances `receipt`; see [`AttestationTracker::track`].
    pub async fn track(
        &self,
        receipt: &TransferReceipt,
        timeout: Option<Duration>,
    ) -> Result<Vec<TransferReceipt>> {
        self.tracker.track(receipt, timeout).await
    }

    /// Rebuilds a receipt from a source transaction; see
    /// [`AttestationTracker::resume`].
    pub async fn resume(&self, chain: Chain, txid: &str) -> Result<TransferReceipt> {
        self.tracker.resume(chain, txid).await
    }
}

/// The executor drop-off for `options`, if any gas was requested.
fn gas_drop_off(
    options: &NormalizedOptions,
    recipient: UniversalAddress,
) -> Result<Option<GasDropOff>> {
    if options.gas_dropoff.is_zero() {
        return Ok(None);
    }
    let amount = u128::try_from(options.gas_dropoff.units()).map_err(|_| {
        RouteError::InvalidAmount(format!("gas drop-off {} is too large", options.gas_dropoff))
    })?;
    Ok(Some(GasDropOff { amount, recipient }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(gas_dropoff: &str) -> NormalizedOptions {
        NormalizedOptions {
            queue: false,
            automatic: true,
            gas_dropoff: Amount::parse(gas_dropoff, 18).unwrap(),
        }
    }

    #[test]
    fn test_zero_gas_drop_off_is_omitted() {
        assert_eq!(gas_drop_off(&options("0"), UniversalAddress::ZERO).unwrap(), None);
    }

    #[test]
    fn test_gas_drop_off_in_native_units() {
        let recipient = UniversalAddress::new([4; 32]);
        let drop_off = gas_drop_off(&options("0.002"), recipient).unwrap().unwrap();
        assert_eq!(drop_off.amount, 2_000_000_000_000_000);
        assert_eq!(drop_off.recipient, recipient);
    }
}
