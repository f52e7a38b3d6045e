//! Attestation tracking for in-flight transfers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Bytes, U256};
use tracing::{debug, error, info, trace, warn, Instrument};

use super::types::{
    AttestationReceipt, NormalizedOptions, TransactionId, TransferReceipt, TransferState,
    ValidatedParams,
};
use crate::chain::{ChainContext, ContractRegistry, ContractSet, PlatformClient};
use crate::config::PollingConfig;
use crate::contracts::svm::accounts::{AnchorAccount, BridgeMessage};
use crate::contracts::svm::pda;
use crate::error::{Result, RouteError};
use crate::protocol::{Amount, AttestationChannel, Chain, Network, Vaa};
use crate::spans;
use crate::traits::{AttestationProvider, Clock};

/// Consecutive provider failures after which polling gives up early.
const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Channels tried, in order, when the route of a transaction is unknown.
const RESUME_CHANNELS: [AttestationChannel; 2] = [
    AttestationChannel::WormholeTransferStandardRelayer,
    AttestationChannel::WormholeTransfer,
];

/// Destination-side progress of one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DestinationStatus {
    approved: bool,
    executed: bool,
}

/// Advances [`TransferReceipt`]s by polling the attestation API and reading
/// destination state.
pub struct AttestationTracker {
    network: Network,
    registry: Arc<ContractRegistry>,
    contexts: BTreeMap<Chain, Arc<ChainContext>>,
    attestations: Arc<dyn AttestationProvider>,
    clock: Arc<dyn Clock>,
    polling: PollingConfig,
}

impl AttestationTracker {
    pub fn new(
        network: Network,
        registry: Arc<ContractRegistry>,
        contexts: BTreeMap<Chain, Arc<ChainContext>>,
        attestations: Arc<dyn AttestationProvider>,
        clock: Arc<dyn Clock>,
        polling: PollingConfig,
    ) -> Self {
        Self {
            network,
            registry,
            contexts,
            attestations,
            clock,
            polling,
        }
    }

    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    /// Moves `receipt` forward as far as currently observable.
    ///
    /// Returns every intermediate receipt in order, or the unchanged receipt
    /// when nothing has progressed. A terminal receipt is returned as-is
    /// without touching the network. `timeout` bounds attestation polling;
    /// without it the configured [`PollingConfig`] applies.
    ///
    /// # Errors
    ///
    /// - [`RouteError::AttestationTimeout`] when the VAA is not signed in time
    /// - the provider's error when it fails repeatedly
    /// - destination read errors, unless some progress was already made
    pub async fn track(
        &self,
        receipt: &TransferReceipt,
        timeout: Option<Duration>,
    ) -> Result<Vec<TransferReceipt>> {
        if receipt.is_terminal() {
            debug!(
                source_chain = %receipt.from,
                destination_chain = %receipt.to,
                event = "track_terminal_receipt"
            );
            return Ok(vec![receipt.clone()]);
        }

        let span = spans::track(receipt.from, receipt.to, receipt.state);
        async {
            self.advance(receipt, timeout)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn advance(
        &self,
        receipt: &TransferReceipt,
        timeout: Option<Duration>,
    ) -> Result<Vec<TransferReceipt>> {
        let polling = match timeout {
            Some(timeout) => self.polling.with_timeout(timeout),
            None => self.polling,
        };
        let mut current = receipt.clone();
        let mut updates = Vec::new();

        if current.state < TransferState::Attested {
            let origin = current.last_origin_tx().cloned().ok_or_else(|| {
                RouteError::AttestationFailed {
                    reason: "receipt has no origin transaction".to_string(),
                }
            })?;
            let channel = AttestationChannel::for_route(current.from.is_evm(), current.to.is_evm());
            let attestation = self
                .fetch_attestation_with_retry(origin.chain, &origin.txid, &[channel], polling)
                .await?;
            info!(
                source_chain = %current.from,
                destination_chain = %current.to,
                message_id = %attestation.id,
                event = "transfer_attested"
            );
            current.attestation = Some(attestation);
            current.advance(TransferState::Attested);
            updates.push(current.clone());
        }

        match self.destination_status(&current).await {
            Ok(status) => {
                if status.approved && current.advance(TransferState::DestinationInitiated) {
                    updates.push(current.clone());
                }
                if status.executed && current.advance(TransferState::DestinationFinalized) {
                    info!(
                        source_chain = %current.from,
                        destination_chain = %current.to,
                        event = "transfer_completed"
                    );
                    updates.push(current.clone());
                }
            }
            Err(e) if !updates.is_empty() => {
                warn!(
                    destination_chain = %current.to,
                    error = %e,
                    event = "destination_status_unavailable"
                );
            }
            Err(e) => return Err(e),
        }

        if updates.is_empty() {
            debug!(
                source_chain = %current.from,
                destination_chain = %current.to,
                state = %current.state,
                event = "transfer_unchanged"
            );
            updates.push(current);
        }
        Ok(updates)
    }

    /// Reads whether the destination has approved and executed the message.
    async fn destination_status(&self, receipt: &TransferReceipt) -> Result<DestinationStatus> {
        let attestation = receipt.attestation.as_ref().ok_or_else(|| {
            RouteError::AttestationFailed {
                reason: format!("{} receipt carries no attestation", receipt.state),
            }
        })?;
        let destination = self.context(receipt.to)?;
        let payload = &attestation.message.manager_payload;

        let status = match destination.client()? {
            PlatformClient::Evm(reader) => {
                let manager = destination.config().contracts.manager.to_evm()?;
                let digest = payload.digest(receipt.from.wormhole_chain_id());
                let approved = reader.is_message_approved(manager, digest).await?;
                let executed = approved && reader.is_message_executed(manager, digest).await?;
                DestinationStatus { approved, executed }
            }
            PlatformClient::Svm(reader) => {
                match reader.get_account_data(pda::bridge_message(&payload.id.0)).await? {
                    Some(data) => DestinationStatus {
                        approved: true,
                        executed: BridgeMessage::decode(&data)?.consumed,
                    },
                    None => DestinationStatus::default(),
                }
            }
        };

        trace!(
            destination_chain = %receipt.to,
            approved = status.approved,
            executed = status.executed,
            event = "destination_status_read"
        );
        Ok(status)
    }

    /// Rebuilds an attested receipt from a source transaction alone.
    ///
    /// The route and amount are read from the signed message; contracts come
    /// from the configured contexts, or the registry for chains without one.
    pub async fn resume(&self, chain: Chain, txid: &str) -> Result<TransferReceipt> {
        let span = spans::resume(chain, txid);
        async {
            self.rebuild(chain, txid)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn rebuild(&self, chain: Chain, txid: &str) -> Result<TransferReceipt> {
        let attestation = self
            .fetch_attestation_with_retry(chain, txid, &RESUME_CHANNELS, self.polling)
            .await?;

        let from = Chain::from_wormhole_chain_id(attestation.id.emitter_chain, self.network)?;
        if from != chain {
            warn!(
                requested_chain = %chain,
                emitter_chain = %from,
                event = "resume_emitter_mismatch"
            );
        }
        let transfer = attestation.message.manager_payload.token_transfer()?;
        let to = Chain::from_wormhole_chain_id(transfer.to_chain, self.network)?;
        let amount = Amount::from_units(U256::from(transfer.amount), transfer.decimals);

        let params = ValidatedParams {
            amount: amount.to_string(),
            normalized_amount: amount,
            source_contracts: self.contracts(from).await?,
            destination_contracts: self.contracts(to).await?,
            options: NormalizedOptions {
                queue: false,
                automatic: true,
                gas_dropoff: Amount::zero(to.native_decimals()),
            },
        };

        info!(
            source_chain = %from,
            destination_chain = %to,
            amount = %amount,
            message_id = %attestation.id,
            event = "transfer_resumed"
        );

        Ok(TransferReceipt {
            from,
            to,
            state: TransferState::Attested,
            origin_txs: vec![TransactionId {
                chain,
                txid: txid.to_string(),
            }],
            attestation: Some(attestation),
            params,
        })
    }

    /// Polls the attestation API until a VAA of one of `channels` appears.
    ///
    /// Earlier channels win when a transaction emitted several matching VAAs.
    pub async fn fetch_attestation_with_retry(
        &self,
        chain: Chain,
        txid: &str,
        channels: &[AttestationChannel],
        polling: PollingConfig,
    ) -> Result<AttestationReceipt> {
        let span = spans::fetch_attestation_with_retry(
            chain,
            txid,
            polling.max_attempts,
            polling.poll_interval_secs,
        );
        async {
            self.poll_attestation(chain, txid, channels, polling)
                .await
                .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await
    }

    async fn poll_attestation(
        &self,
        chain: Chain,
        txid: &str,
        channels: &[AttestationChannel],
        polling: PollingConfig,
    ) -> Result<AttestationReceipt> {
        let max_attempts = polling.max_attempts;
        let poll_interval = Duration::from_secs(polling.poll_interval_secs);
        let mut consecutive_errors = 0;

        info!(
            source_chain = %chain,
            txid = txid,
            max_attempts = max_attempts,
            poll_interval_secs = polling.poll_interval_secs,
            event = "attestation_polling_started"
        );

        for attempt in 1..=max_attempts {
            trace!(
                attempt = attempt,
                max_attempts = max_attempts,
                event = "attestation_attempt"
            );

            match self.attestations.get_signed_messages(chain, txid).await {
                Ok(vaas) => {
                    consecutive_errors = 0;
                    if let Some(attestation) = find_attestation(&vaas, channels) {
                        info!(
                            source_chain = %chain,
                            txid = txid,
                            attempt = attempt,
                            channel = ?attestation.channel,
                            event = "attestation_complete"
                        );
                        return Ok(attestation);
                    }
                    debug!(
                        source_chain = %chain,
                        vaas = vaas.len(),
                        attempt = attempt,
                        event = "attestation_channel_pending"
                    );
                }
                Err(RouteError::RateLimitExceeded {
                    retry_after_seconds,
                }) => {
                    consecutive_errors = 0;
                    debug!(
                        source_chain = %chain,
                        retry_after_seconds = retry_after_seconds,
                        event = "rate_limit_exceeded"
                    );
                    self.clock
                        .sleep(Duration::from_secs(retry_after_seconds))
                        .await;
                    continue;
                }
                Err(RouteError::AttestationNotFound { .. }) => {
                    consecutive_errors = 0;
                    debug!(
                        source_chain = %chain,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        event = "attestation_not_found"
                    );
                }
                Err(e) => {
                    consecutive_errors += 1;
                    error!(
                        source_chain = %chain,
                        error = %e,
                        attempt = attempt,
                        consecutive_errors = consecutive_errors,
                        event = "attestation_request_failed"
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!(
                            source_chain = %chain,
                            consecutive_errors = consecutive_errors,
                            event = "circuit_breaker_triggered"
                        );
                        return Err(e);
                    }
                }
            }

            self.clock.sleep(poll_interval).await;
        }

        error!(
            source_chain = %chain,
            txid = txid,
            max_attempts = max_attempts,
            total_wait_secs = polling.total_timeout_secs(),
            event = "attestation_timeout"
        );
        Err(RouteError::AttestationTimeout {
            txid: txid.to_string(),
        })
    }

    fn context(&self, chain: Chain) -> Result<&ChainContext> {
        self.contexts
            .get(&chain)
            .map(Arc::as_ref)
            .ok_or_else(|| RouteError::unsupported_chain(self.network, chain))
    }

    async fn contracts(&self, chain: Chain) -> Result<ContractSet> {
        match self.contexts.get(&chain) {
            Some(context) => context.contracts().await,
            None => self.registry.get_contracts(self.network, chain).cloned(),
        }
    }
}

/// First VAA carrying a transfer on the earliest matching channel.
fn find_attestation(vaas: &[Bytes], channels: &[AttestationChannel]) -> Option<AttestationReceipt> {
    let decoded: Vec<Vaa> = vaas
        .iter()
        .filter_map(|raw| {
            Vaa::decode(raw)
                .inspect_err(|e| warn!(error = %e, event = "vaa_decode_failed"))
                .ok()
        })
        .collect();

    channels.iter().find_map(|channel| {
        decoded.iter().find_map(|vaa| match channel.extract(vaa) {
            Ok(Some(message)) => Some(AttestationReceipt {
                id: vaa.message_id(),
                channel: *channel,
                vaa: vaa.clone(),
                message,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(channel = ?channel, error = %e, event = "vaa_payload_malformed");
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::addresses::{EVM_M_TOKEN, EVM_PORTAL};
    use crate::chain::ChainConfig;
    use crate::config::RouteConfig;
    use crate::protocol::UniversalAddress;
    use crate::testing::{
        FakeAttestationProvider, FakeAttestationResponse, FakeClock, FakeEvmChain, FakeSvmChain,
        TransferFixture,
    };
    use alloy_primitives::B256;
    use rstest::rstest;

    const TXID: &str = "0xaa";

    struct Harness {
        tracker: AttestationTracker,
        attestations: FakeAttestationProvider,
        clock: FakeClock,
        arbitrum: FakeEvmChain,
        solana: FakeSvmChain,
    }

    fn harness(polling: PollingConfig) -> Harness {
        let registry = Arc::new(ContractRegistry::initialize(&RouteConfig::default()));
        let attestations = FakeAttestationProvider::new();
        let clock = FakeClock::new();
        let arbitrum = FakeEvmChain::new();
        let solana = FakeSvmChain::new();

        let mut contexts = BTreeMap::new();
        for (chain, client) in [
            (Chain::Base, PlatformClient::Evm(Arc::new(FakeEvmChain::new()))),
            (Chain::Arbitrum, PlatformClient::Evm(Arc::new(arbitrum.clone()))),
            (Chain::Solana, PlatformClient::Svm(Arc::new(solana.clone()))),
        ] {
            let config = ChainConfig::default_for(chain, Network::Mainnet);
            let context = ChainContext::new(config, Some(client)).unwrap();
            contexts.insert(chain, Arc::new(context));
        }

        let tracker = AttestationTracker::new(
            Network::Mainnet,
            registry,
            contexts,
            Arc::new(attestations.clone()),
            Arc::new(clock.clone()),
            polling,
        );
        Harness {
            tracker,
            attestations,
            clock,
            arbitrum,
            solana,
        }
    }

    fn fixture(destination: Chain) -> TransferFixture {
        TransferFixture {
            source_chain: Chain::Base,
            destination_chain: destination,
            source_manager: EVM_PORTAL.into(),
            recipient_manager: EVM_PORTAL.into(),
            message_id: B256::with_last_byte(7),
            amount: 1_500_000,
            decimals: 6,
            source_token: EVM_M_TOKEN.into(),
            recipient: UniversalAddress::new([9; 32]),
        }
    }

    fn initiated(destination: Chain) -> TransferReceipt {
        let contracts = ChainConfig::default_for(Chain::Base, Network::Mainnet).contracts;
        TransferReceipt {
            from: Chain::Base,
            to: destination,
            state: TransferState::SourceInitiated,
            origin_txs: vec![TransactionId {
                chain: Chain::Base,
                txid: TXID.to_string(),
            }],
            attestation: None,
            params: ValidatedParams {
                amount: "1.5".to_string(),
                normalized_amount: Amount::parse("1.5", 6).unwrap(),
                source_contracts: contracts.clone(),
                destination_contracts: ChainConfig::default_for(destination, Network::Mainnet)
                    .contracts,
                options: NormalizedOptions {
                    queue: false,
                    automatic: true,
                    gas_dropoff: Amount::zero(destination.native_decimals()),
                },
            },
        }
    }

    fn fast() -> PollingConfig {
        PollingConfig::default()
            .with_max_attempts(4)
            .with_poll_interval_secs(10)
    }

    #[tokio::test]
    async fn test_track_attests_evm_transfer_via_delivery_vaa() {
        let h = harness(fast());
        let fixture = fixture(Chain::Arbitrum);
        h.attestations.add_not_found_then_vaa(TXID, 2, fixture.delivery_vaa(42));

        let updates = h.tracker.track(&initiated(Chain::Arbitrum), None).await.unwrap();

        assert_eq!(updates.len(), 1);
        let attested = &updates[0];
        assert_eq!(attested.state, TransferState::Attested);
        let attestation = attested.attestation.as_ref().unwrap();
        assert_eq!(
            attestation.channel,
            AttestationChannel::WormholeTransferStandardRelayer
        );
        assert_eq!(attestation.id.sequence, 42);
        assert_eq!(attestation.message, fixture.message());
        assert_eq!(h.attestations.call_count(TXID), 3);
        assert_eq!(h.clock.sleep_count(), 2);
    }

    #[tokio::test]
    async fn test_track_reports_every_intermediate_state() {
        let h = harness(fast());
        let fixture = fixture(Chain::Arbitrum);
        h.attestations.add_vaa(TXID, fixture.delivery_vaa(1));
        h.arbitrum.set_message_status(fixture.digest(), true, true);

        let updates = h.tracker.track(&initiated(Chain::Arbitrum), None).await.unwrap();
        let states: Vec<_> = updates.iter().map(|r| r.state).collect();

        assert_eq!(
            states,
            vec![
                TransferState::Attested,
                TransferState::DestinationInitiated,
                TransferState::DestinationFinalized,
            ]
        );
    }

    #[tokio::test]
    async fn test_track_ignores_vaas_of_other_channels() {
        let h = harness(fast());
        let fixture = fixture(Chain::Arbitrum);
        // EVM to EVM transfers are attested through the relayer channel.
        h.attestations.add_vaa(TXID, fixture.transceiver_vaa(1));

        let err = h
            .tracker
            .track(&initiated(Chain::Arbitrum), None)
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::AttestationTimeout { .. }));
        assert_eq!(h.attestations.call_count(TXID), 4);
    }

    #[tokio::test]
    async fn test_track_svm_destination_reads_bridge_message() {
        let h = harness(fast());
        let fixture = fixture(Chain::Solana);
        h.attestations.add_vaa(TXID, fixture.transceiver_vaa(3));

        let attested = h.tracker.track(&initiated(Chain::Solana), None).await.unwrap();
        assert_eq!(attested.len(), 1);
        assert_eq!(
            attested[0].attestation.as_ref().unwrap().channel,
            AttestationChannel::WormholeTransfer
        );

        h.solana.set_bridge_message(&fixture.message_id.0, false);
        let updates = h.tracker.track(&attested[0], None).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].state, TransferState::DestinationInitiated);

        h.solana.set_bridge_message(&fixture.message_id.0, true);
        let updates = h.tracker.track(&updates[0], None).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].state, TransferState::DestinationFinalized);
    }

    #[tokio::test]
    async fn test_track_terminal_receipt_does_no_io() {
        let h = harness(fast());
        let mut receipt = initiated(Chain::Arbitrum);
        receipt.state = TransferState::DestinationFinalized;

        let updates = h.tracker.track(&receipt, None).await.unwrap();

        assert_eq!(updates, vec![receipt]);
        assert_eq!(h.attestations.call_count(TXID), 0);
        assert_eq!(h.arbitrum.call_count(), 0);
    }

    #[tokio::test]
    async fn test_track_without_progress_returns_receipt_unchanged() {
        let h = harness(fast());
        let fixture = fixture(Chain::Arbitrum);
        h.attestations.add_vaa(TXID, fixture.delivery_vaa(1));
        let attested = h.tracker.track(&initiated(Chain::Arbitrum), None).await.unwrap();

        let updates = h.tracker.track(&attested[0], None).await.unwrap();

        assert_eq!(updates, attested);
    }

    #[tokio::test]
    async fn test_track_timeout_bounds_attempts() {
        let h = harness(fast());

        let err = h
            .tracker
            .track(&initiated(Chain::Arbitrum), Some(Duration::from_secs(30)))
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::AttestationTimeout { ref txid } if txid == TXID));
        assert!(err.is_retryable());
        assert_eq!(h.attestations.call_count(TXID), 3);
        assert_eq!(h.clock.total_sleep_time(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_rate_limit_waits_retry_after() {
        let h = harness(fast());
        let fixture = fixture(Chain::Arbitrum);
        h.attestations
            .add_rate_limit_then_vaa(TXID, 1, 300, fixture.delivery_vaa(1));

        let updates = h.tracker.track(&initiated(Chain::Arbitrum), None).await.unwrap();

        assert_eq!(updates[0].state, TransferState::Attested);
        assert_eq!(h.clock.sleep_log(), vec![Duration::from_secs(300)]);
    }

    #[tokio::test]
    async fn test_circuit_breaker_returns_provider_error() {
        let h = harness(PollingConfig::default().with_max_attempts(20));
        h.attestations.add_always_failing(TXID);

        let err = h
            .tracker
            .track(&initiated(Chain::Arbitrum), None)
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::Provider(_)));
        assert!(err.is_retryable());
        assert_eq!(h.attestations.call_count(TXID), 5);
    }

    #[tokio::test]
    async fn test_errors_interleaved_with_not_found_do_not_trip_breaker() {
        let h = harness(PollingConfig::default().with_max_attempts(20));
        let fixture = fixture(Chain::Arbitrum);
        let mut responses = Vec::new();
        for _ in 0..3 {
            responses.extend(vec![FakeAttestationResponse::ServerError; 4]);
            responses.push(FakeAttestationResponse::NotFound);
        }
        responses.push(FakeAttestationResponse::Vaas(vec![fixture.delivery_vaa(5)]));
        h.attestations.add_response_sequence(TXID, responses);

        let updates = h.tracker.track(&initiated(Chain::Arbitrum), None).await.unwrap();

        assert_eq!(updates[0].state, TransferState::Attested);
        assert_eq!(h.attestations.call_count(TXID), 16);
    }

    #[rstest]
    #[case(Chain::Arbitrum)]
    #[case(Chain::Solana)]
    #[tokio::test]
    async fn test_resume_rebuilds_attested_receipt(#[case] destination: Chain) {
        let h = harness(fast());
        let fixture = fixture(destination);
        let vaa = if destination.is_evm() {
            fixture.delivery_vaa(9)
        } else {
            fixture.transceiver_vaa(9)
        };
        h.attestations.add_vaa(TXID, vaa);

        let receipt = h.tracker.resume(Chain::Base, TXID).await.unwrap();

        assert_eq!(receipt.from, Chain::Base);
        assert_eq!(receipt.to, destination);
        assert_eq!(receipt.state, TransferState::Attested);
        assert_eq!(receipt.params.normalized_amount.to_string(), "1.5");
        assert_eq!(receipt.params.amount, "1.5");
        assert_eq!(
            receipt.params.options.gas_dropoff,
            Amount::zero(destination.native_decimals())
        );
        assert_eq!(receipt.origin_txs[0].txid, TXID);
        assert_eq!(receipt.attestation.unwrap().id.sequence, 9);
    }

    #[tokio::test]
    async fn test_resume_unknown_transaction_times_out() {
        let h = harness(fast());
        let err = h.tracker.resume(Chain::Base, "0xdead").await.unwrap_err();
        assert!(matches!(err, RouteError::AttestationTimeout { .. }));
    }
}
