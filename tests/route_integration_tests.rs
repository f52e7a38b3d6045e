//! Integration tests for the route controller using fake implementations
//!
//! Every test drives the public API end to end: a controller wired over fake
//! chains, a fake executor and a fake attestation API, with a fake clock so
//! polling never waits.

use std::sync::Arc;

use alloy_primitives::{address, Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use m0_route::addresses::{EVM_M_TOKEN, EVM_PORTAL, EVM_WRAPPED_M_TOKEN, SVM_WRAPPED_M_MINT};
use m0_route::platform::{BuildStep, UnsignedTransaction};
use m0_route::testing::{
    FakeAttestationProvider, FakeClock, FakeEvmChain, FakeExecutorApi, FakeSigner, FakeSvmChain,
    TransferFixture, FAKE_CLOCK_START_UNIX,
};
use m0_route::{
    Amount, AttestationChannel, Chain, ChainContext, ContractRegistry, Network, PlatformClient,
    PollingConfig, Quote, QuoteResult, QuoteWarning, RouteConfig, RouteController, RouteError,
    TokenDetails, TokenId, TransferInput, TransferOptions, TransferReceipt, TransferRequest,
    TransferState, UniversalAddress,
};
use tracing_subscriber::EnvFilter;

const ENTRYPOINT: Address = address!("2222222222222222222222222222222222222222");
const RECIPIENT: [u8; 32] = [9; 32];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    controller: RouteController,
    base: FakeEvmChain,
    arbitrum: FakeEvmChain,
    solana: FakeSvmChain,
    executor: FakeExecutorApi,
    attestations: FakeAttestationProvider,
    clock: FakeClock,
}

/// A mainnet controller over Base, Arbitrum and Solana. Base has the executor
/// entrypoint deployed so it can reach Solana.
fn harness() -> Harness {
    init_tracing();
    let config = RouteConfig {
        evm_executor_entrypoint: Some(ENTRYPOINT.into()),
        ..RouteConfig::default()
    };
    let registry = Arc::new(ContractRegistry::initialize(&config));

    let base = FakeEvmChain::new();
    let arbitrum = FakeEvmChain::new();
    let solana = FakeSvmChain::new();
    let executor = FakeExecutorApi::new();
    let attestations = FakeAttestationProvider::new();
    let clock = FakeClock::new();

    let contexts = [
        (Chain::Base, PlatformClient::Evm(Arc::new(base.clone()))),
        (Chain::Arbitrum, PlatformClient::Evm(Arc::new(arbitrum.clone()))),
        (Chain::Solana, PlatformClient::Svm(Arc::new(solana.clone()))),
    ]
    .into_iter()
    .map(|(chain, client)| {
        let config = registry.chain_config(Network::Mainnet, chain).unwrap().clone();
        ChainContext::new(config, Some(client)).unwrap()
    })
    .collect();

    let controller = RouteController::builder()
        .network(Network::Mainnet)
        .registry(registry)
        .contexts(contexts)
        .executor_api(Arc::new(executor.clone()))
        .attestations(Arc::new(attestations.clone()))
        .clock(Arc::new(clock.clone()))
        .polling(PollingConfig::default().with_max_attempts(3).with_poll_interval_secs(5))
        .build()
        .unwrap();

    Harness {
        controller,
        base,
        arbitrum,
        solana,
        executor,
        attestations,
        clock,
    }
}

fn token(chain: Chain, address: impl Into<UniversalAddress>, decimals: u8) -> TokenDetails {
    TokenDetails {
        id: TokenId::new(chain, address),
        decimals,
    }
}

fn base_to_arbitrum() -> TransferRequest {
    TransferRequest::new(
        token(Chain::Base, EVM_M_TOKEN, 6),
        token(Chain::Arbitrum, EVM_M_TOKEN, 6),
    )
}

fn base_to_solana() -> TransferRequest {
    TransferRequest::new(
        token(Chain::Base, EVM_M_TOKEN, 6),
        token(Chain::Solana, SVM_WRAPPED_M_MINT, 6),
    )
}

fn sender() -> Address {
    PrivateKeySigner::random().address()
}

fn evm_value(step: &BuildStep) -> Option<U256> {
    match &step.transaction {
        UnsignedTransaction::Evm(tx) => tx.value,
        other => panic!("expected EVM transaction, got {other:?}"),
    }
}

async fn quote_for(h: &Harness, request: &TransferRequest, input: TransferInput) -> Quote {
    let params = h.controller.validate(request, &input).await.unwrap();
    match h.controller.quote(request, &params).await.unwrap() {
        QuoteResult::Success(quote) => *quote,
        QuoteResult::Failure(failure) => panic!("quote failed: {}", failure.reason),
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_validate_floors_amount_to_destination_precision() {
    let h = harness();
    let request = TransferRequest::new(
        token(Chain::Base, EVM_WRAPPED_M_TOKEN, 18),
        token(Chain::Arbitrum, EVM_M_TOKEN, 6),
    );

    let params = h
        .controller
        .validate(&request, &TransferInput::new("0.010000000000000123"))
        .await
        .unwrap();

    assert_eq!(params.amount, "0.010000000000000123");
    assert_eq!(params.normalized_amount, Amount::parse("0.01", 18).unwrap());
    assert!(params.options.automatic);
    assert!(params.options.gas_dropoff.is_zero());
    assert_eq!(params.source_contracts.manager, UniversalAddress::from(EVM_PORTAL));
}

#[tokio::test]
async fn test_validate_parses_gas_dropoff_in_destination_native_decimals() {
    let h = harness();
    let input = TransferInput::new("1").with_options(TransferOptions {
        gas_dropoff: Some("0.01".to_string()),
        ..Default::default()
    });

    let params = h.controller.validate(&base_to_solana(), &input).await.unwrap();

    assert_eq!(params.options.gas_dropoff, Amount::parse("0.01", 9).unwrap());
    assert_eq!(params.options.gas_dropoff.units(), U256::from(10_000_000u64));
}

#[tokio::test]
async fn test_validate_rejects_manual_delivery_and_bad_amounts() {
    let h = harness();
    let manual = TransferInput::new("1").with_options(TransferOptions {
        automatic: false,
        ..Default::default()
    });

    let err = h.controller.validate(&base_to_arbitrum(), &manual).await.unwrap_err();
    assert!(matches!(err, RouteError::InvalidConfig(_)));
    assert!(!err.is_retryable());

    let err = h
        .controller
        .validate(&base_to_arbitrum(), &TransferInput::new("-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidAmount(_)));
}

#[tokio::test]
async fn test_validate_unconfigured_chain_fails_before_io() {
    let h = harness();
    let request = TransferRequest::new(
        token(Chain::Optimism, EVM_M_TOKEN, 6),
        token(Chain::Arbitrum, EVM_M_TOKEN, 6),
    );

    let err = h
        .controller
        .validate(&request, &TransferInput::new("1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::UnsupportedChain {
            chain: Chain::Optimism,
            ..
        }
    ));
    assert_eq!(h.base.call_count(), 0);
    assert_eq!(h.arbitrum.call_count(), 0);
}

// ============================================================================
// Quotes
// ============================================================================

#[tokio::test]
async fn test_quote_evm_to_evm_charges_delivery_price_only() {
    let h = harness();
    h.base.set_delivery_price(U256::from(1_000u64));

    let quote = quote_for(&h, &base_to_arbitrum(), TransferInput::new("2.5")).await;

    assert_eq!(quote.relay_fee, Amount::from_units(U256::from(1_000u64), 18));
    assert_eq!(quote.source_amount, Amount::parse("2.5", 6).unwrap());
    assert_eq!(quote.destination_amount, Amount::parse("2.5", 6).unwrap());
    assert!(quote.destination_native_gas.is_zero());
    assert!(quote.warnings.is_empty());
    assert_eq!(h.executor.quote_call_count(), 0);
}

#[tokio::test]
async fn test_quote_evm_to_svm_adds_executor_cost() {
    let h = harness();
    h.base.set_delivery_price(U256::from(50u64));
    h.executor.set_supported(&[Chain::Solana]);
    h.executor
        .add_quote(Chain::Base, Chain::Solana, 700, FAKE_CLOCK_START_UNIX + 600);
    let input = TransferInput::new("1").with_options(TransferOptions {
        gas_dropoff: Some("0.01".to_string()),
        ..Default::default()
    });

    let quote = quote_for(&h, &base_to_solana(), input).await;

    assert_eq!(quote.relay_fee, Amount::from_units(U256::from(750u64), 18));
    assert_eq!(quote.destination_native_gas, Amount::parse("0.01", 9).unwrap());
    assert_eq!(quote.eta, Chain::Base.finality_estimate());
    assert_eq!(h.executor.quote_call_count(), 1);
}

#[tokio::test]
async fn test_quote_svm_source_is_priced_in_sol() {
    let h = harness();
    h.executor.set_supported(&[Chain::Base]);
    h.executor
        .add_quote(Chain::Solana, Chain::Base, 5_000, FAKE_CLOCK_START_UNIX + 600);
    let request = TransferRequest::new(
        token(Chain::Solana, SVM_WRAPPED_M_MINT, 6),
        token(Chain::Base, EVM_WRAPPED_M_TOKEN, 6),
    );

    let quote = quote_for(&h, &request, TransferInput::new("3")).await;

    assert_eq!(quote.relay_fee, Amount::from_units(U256::from(5_000u64), 9));
    assert_eq!(quote.eta, Chain::Solana.finality_estimate());
}

#[tokio::test]
async fn test_quote_fails_softly_when_relaying_is_off() {
    let h = harness();
    h.base.set_relaying_enabled(Chain::Arbitrum, false);
    let request = base_to_arbitrum();
    let params = h
        .controller
        .validate(&request, &TransferInput::new("1"))
        .await
        .unwrap();

    assert!(!h.controller.is_available(&request).await.unwrap());
    let result = h.controller.quote(&request, &params).await.unwrap();

    match result {
        QuoteResult::Failure(failure) => {
            assert_eq!(failure.reason, "Relaying to Arbitrum is not available");
        }
        QuoteResult::Success(_) => panic!("expected a failure"),
    }
}

#[tokio::test]
async fn test_quote_without_executor_support_for_svm_is_unavailable() {
    let h = harness();
    let request = base_to_solana();
    let params = h
        .controller
        .validate(&request, &TransferInput::new("1"))
        .await
        .unwrap();

    let result = h.controller.quote(&request, &params).await.unwrap();

    assert!(!result.is_success());
    assert_eq!(h.executor.capabilities_call_count(), 1);
}

#[tokio::test]
async fn test_quote_warns_near_destination_capacity() {
    let h = harness();
    h.arbitrum.set_rate_limit(3_600, U256::from(5_000_000u64));

    let within = quote_for(&h, &base_to_arbitrum(), TransferInput::new("4.75")).await;
    assert!(within.warnings.is_empty());

    let over = quote_for(&h, &base_to_arbitrum(), TransferInput::new("4.76")).await;
    assert_eq!(
        over.warnings,
        vec![QuoteWarning::DestinationCapacity {
            delay_duration_secs: 3_600
        }]
    );
}

#[tokio::test]
async fn test_quote_rejects_amount_that_overflows_destination_precision() {
    let h = harness();
    let request = TransferRequest::new(
        token(Chain::Base, EVM_M_TOKEN, 0),
        token(Chain::Arbitrum, EVM_M_TOKEN, 18),
    );
    let huge = format!("1{}", "0".repeat(70));
    let params = h
        .controller
        .validate(&request, &TransferInput::new(huge))
        .await
        .unwrap();

    let err = h.controller.quote(&request, &params).await.unwrap_err();

    assert!(matches!(err, RouteError::InvalidAmount(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_expired_executor_quote_is_rejected() {
    let h = harness();
    h.executor.set_supported(&[Chain::Solana]);
    h.executor
        .add_quote(Chain::Base, Chain::Solana, 700, FAKE_CLOCK_START_UNIX);
    let request = base_to_solana();
    let params = h
        .controller
        .validate(&request, &TransferInput::new("1"))
        .await
        .unwrap();

    let err = h.controller.quote(&request, &params).await.unwrap_err();

    assert!(matches!(
        err,
        RouteError::ExecutorQuoteExpired {
            expired_at: FAKE_CLOCK_START_UNIX
        }
    ));
}

// ============================================================================
// Initiation
// ============================================================================

#[tokio::test]
async fn test_initiate_submits_approval_then_transfer() {
    let h = harness();
    h.base.set_delivery_price(U256::from(1_000u64));
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("2.5")).await;
    let signer = FakeSigner::new(Chain::Base, sender());

    let receipt = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap();

    let submitted = signer.submitted();
    let descriptions: Vec<_> = submitted.iter().map(|s| s.description.as_str()).collect();
    assert_eq!(descriptions, vec!["M0.Approve", "M0.Transfer"]);
    assert_eq!(evm_value(&submitted[1]), Some(U256::from(1_000u64)));

    assert_eq!(receipt.state, TransferState::SourceInitiated);
    assert_eq!((receipt.from, receipt.to), (Chain::Base, Chain::Arbitrum));
    let txids: Vec<_> = receipt.origin_txs.iter().map(|tx| tx.txid.clone()).collect();
    assert_eq!(txids, vec![FakeSigner::txid(0), FakeSigner::txid(1)]);
    assert!(receipt.attestation.is_none());
}

#[tokio::test]
async fn test_initiate_to_svm_refreshes_executor_quote() {
    let h = harness();
    h.base.set_delivery_price(U256::from(50u64));
    h.executor.set_supported(&[Chain::Solana]);
    h.executor
        .add_quote(Chain::Base, Chain::Solana, 700, FAKE_CLOCK_START_UNIX + 600);
    let request = base_to_solana();
    let input = TransferInput::new("1").with_options(TransferOptions {
        gas_dropoff: Some("0.01".to_string()),
        ..Default::default()
    });
    let quote = quote_for(&h, &request, input).await;
    let signer = FakeSigner::new(Chain::Base, sender());

    h.controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap();

    let descriptions: Vec<_> = signer
        .submitted()
        .iter()
        .map(|s| s.description.clone())
        .collect();
    assert_eq!(descriptions, vec!["M0.Approve", "M0.ExecutorTransfer"]);
    assert_eq!(evm_value(&signer.submitted()[1]), Some(U256::from(750u64)));

    // priced once for the quote, then again naming the real drop-off recipient
    let instructions = h.executor.requested_instructions();
    assert_eq!(h.executor.quote_call_count(), 2);
    assert_ne!(instructions[0], instructions[1]);
    assert!(instructions[1]
        .windows(RECIPIENT.len())
        .any(|window| window == RECIPIENT));
}

#[tokio::test]
async fn test_initiate_rejects_signer_on_wrong_chain() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("1")).await;
    let signer = FakeSigner::new(Chain::Arbitrum, sender());

    let err = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::SignerMismatch {
            expected: Chain::Base,
            actual: Chain::Arbitrum
        }
    ));
    assert!(signer.submitted().is_empty());
}

#[tokio::test]
async fn test_initiate_rejects_malformed_recipient() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("1")).await;
    let signer = FakeSigner::new(Chain::Base, sender());

    let err = h
        .controller
        .initiate(&request, &signer, &quote, vec![1u8; 20])
        .await
        .unwrap_err();

    assert!(matches!(err, RouteError::InvalidAddressLength { .. }));
    assert!(signer.submitted().is_empty());
}

#[tokio::test]
async fn test_initiate_surfaces_submission_failure() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("1")).await;
    let signer = FakeSigner::new(Chain::Base, sender());
    signer.fail_submissions();

    let err = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, RouteError::TransactionFailed { .. }));
}

#[tokio::test]
async fn test_initiate_from_chain_without_client_fails() {
    init_tracing();
    let registry = Arc::new(ContractRegistry::initialize(&RouteConfig::default()));
    let arbitrum = ChainContext::new(
        registry
            .chain_config(Network::Mainnet, Chain::Arbitrum)
            .unwrap()
            .clone(),
        None,
    )
    .unwrap();
    let base_chain = FakeEvmChain::new();
    let base = ChainContext::new(
        registry
            .chain_config(Network::Mainnet, Chain::Base)
            .unwrap()
            .clone(),
        Some(PlatformClient::Evm(Arc::new(base_chain.clone()))),
    )
    .unwrap();
    let executor = FakeExecutorApi::new();
    let attestations = FakeAttestationProvider::new();
    let controller = RouteController::builder()
        .network(Network::Mainnet)
        .registry(registry)
        .contexts(vec![arbitrum, base])
        .executor_api(Arc::new(executor.clone()))
        .attestations(Arc::new(attestations.clone()))
        .clock(Arc::new(FakeClock::new()))
        .build()
        .unwrap();

    let request = TransferRequest::new(
        token(Chain::Arbitrum, EVM_M_TOKEN, 6),
        token(Chain::Base, EVM_M_TOKEN, 6),
    );
    let params = controller
        .validate(&request, &TransferInput::new("1"))
        .await
        .unwrap();
    let quote = Quote {
        params,
        source_token: request.source.id,
        source_amount: Amount::parse("1", 6).unwrap(),
        destination_token: request.destination.id,
        destination_amount: Amount::parse("1", 6).unwrap(),
        relay_fee: Amount::zero(18),
        destination_native_gas: Amount::zero(18),
        eta: Chain::Arbitrum.finality_estimate(),
        warnings: Vec::new(),
    };
    let signer = FakeSigner::new(Chain::Arbitrum, sender());

    let err = controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::UnsupportedPlatform {
            chain: Chain::Arbitrum
        }
    ));
    assert!(signer.submitted().is_empty());
    assert_eq!(base_chain.call_count(), 0);
    assert_eq!(executor.quote_call_count(), 0);
    assert_eq!(executor.capabilities_call_count(), 0);
    assert_eq!(attestations.total_call_count(), 0);
}

// ============================================================================
// Requests and discovery
// ============================================================================

#[tokio::test]
async fn test_create_request_reads_decimals_on_both_platforms() {
    let h = harness();
    h.base.set_decimals(EVM_WRAPPED_M_TOKEN, 6);
    h.solana.set_mint_decimals(SVM_WRAPPED_M_MINT, 9);

    let request = h
        .controller
        .create_request(
            TokenId::new(Chain::Base, EVM_WRAPPED_M_TOKEN),
            TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT),
        )
        .await
        .unwrap();

    assert_eq!(request.source.decimals, 6);
    assert_eq!(request.destination.decimals, 9);
    assert_eq!(request.from_chain(), Chain::Base);
    assert_eq!(request.to_chain(), Chain::Solana);
}

#[tokio::test]
async fn test_create_request_unknown_mint_is_unsupported() {
    let h = harness();

    let err = h
        .controller
        .create_request(
            TokenId::new(Chain::Base, EVM_M_TOKEN),
            TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::UnsupportedToken {
            chain: Chain::Solana,
            ..
        }
    ));
}

#[test]
fn test_builder_rejects_duplicate_chains() {
    let registry = Arc::new(ContractRegistry::initialize(&RouteConfig::default()));
    let context = || {
        ChainContext::new(
            registry
                .chain_config(Network::Mainnet, Chain::Base)
                .unwrap()
                .clone(),
            None,
        )
        .unwrap()
    };

    let result = RouteController::builder()
        .network(Network::Mainnet)
        .registry(registry.clone())
        .contexts(vec![context(), context()])
        .executor_api(Arc::new(FakeExecutorApi::new()))
        .attestations(Arc::new(FakeAttestationProvider::new()))
        .clock(Arc::new(FakeClock::new()))
        .build();

    assert!(matches!(result, Err(RouteError::InvalidConfig(_))));
}

// ============================================================================
// Tracking
// ============================================================================

fn fixture(destination: Chain) -> TransferFixture {
    TransferFixture {
        source_chain: Chain::Base,
        destination_chain: destination,
        source_manager: EVM_PORTAL.into(),
        recipient_manager: EVM_PORTAL.into(),
        message_id: B256::with_last_byte(1),
        amount: 2_500_000,
        decimals: 6,
        source_token: EVM_M_TOKEN.into(),
        recipient: UniversalAddress::new(RECIPIENT),
    }
}

#[tokio::test]
async fn test_transfer_lifecycle_from_initiation_to_redemption() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("2.5")).await;
    let signer = FakeSigner::new(Chain::Base, sender());
    let receipt = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap();

    // the VAA is keyed by the last source transaction
    let fixture = fixture(Chain::Arbitrum);
    h.attestations
        .add_not_found_then_vaa(&FakeSigner::txid(1), 1, fixture.delivery_vaa(11));

    let updates = h.controller.track(&receipt, None).await.unwrap();
    assert_eq!(updates.len(), 1);
    let attested = &updates[0];
    assert_eq!(attested.state, TransferState::Attested);
    assert_eq!(attested.attestation.as_ref().unwrap().id.sequence, 11);
    assert_eq!(h.clock.sleep_count(), 1);

    // nothing new on the destination yet
    let unchanged = h.controller.track(attested, None).await.unwrap();
    assert_eq!(unchanged, vec![attested.clone()]);

    h.arbitrum.set_message_status(fixture.digest(), true, true);
    let updates = h.controller.track(attested, None).await.unwrap();
    let states: Vec<_> = updates.iter().map(|r| r.state).collect();
    assert_eq!(
        states,
        vec![
            TransferState::DestinationInitiated,
            TransferState::DestinationFinalized
        ]
    );
    assert!(updates[1].is_terminal());
}

#[tokio::test]
async fn test_persisted_receipt_resumes_tracking() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("2.5")).await;
    let signer = FakeSigner::new(Chain::Base, sender());
    let receipt = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap();

    let stored = serde_json::to_string(&receipt).unwrap();
    let restored: TransferReceipt = serde_json::from_str(&stored).unwrap();
    assert_eq!(restored, receipt);

    let fixture = fixture(Chain::Arbitrum);
    h.attestations.add_vaa(&FakeSigner::txid(1), fixture.delivery_vaa(7));
    let updates = h.controller.track(&restored, None).await.unwrap();
    let attested = updates.last().unwrap();
    assert_eq!(attested.state, TransferState::Attested);

    // an attested receipt carries its VAA through storage
    let stored = serde_json::to_string(attested).unwrap();
    let restored: TransferReceipt = serde_json::from_str(&stored).unwrap();
    assert_eq!(&restored, attested);

    h.arbitrum.set_message_status(fixture.digest(), true, true);
    let updates = h.controller.track(&restored, None).await.unwrap();
    assert!(updates.last().unwrap().is_terminal());
    assert_eq!(h.attestations.call_count(&FakeSigner::txid(1)), 1);
}

#[tokio::test]
async fn test_track_times_out_with_configured_polling() {
    let h = harness();
    let request = base_to_arbitrum();
    let quote = quote_for(&h, &request, TransferInput::new("1")).await;
    let signer = FakeSigner::new(Chain::Base, sender());
    let receipt = h
        .controller
        .initiate(&request, &signer, &quote, RECIPIENT.to_vec())
        .await
        .unwrap();

    let err = h.controller.track(&receipt, None).await.unwrap_err();

    assert!(matches!(
        err,
        RouteError::AttestationTimeout { ref txid } if *txid == FakeSigner::txid(1)
    ));
    assert_eq!(h.attestations.call_count(&FakeSigner::txid(1)), 3);
}

#[tokio::test]
async fn test_resume_rebuilds_receipt_from_source_transaction() {
    let h = harness();
    let fixture = fixture(Chain::Arbitrum);
    h.attestations.add_vaa("0xfeed", fixture.delivery_vaa(5));

    let receipt = h.controller.resume(Chain::Base, "0xfeed").await.unwrap();

    assert_eq!((receipt.from, receipt.to), (Chain::Base, Chain::Arbitrum));
    assert_eq!(receipt.state, TransferState::Attested);
    assert_eq!(receipt.origin_txs[0].txid, "0xfeed");
    assert_eq!(
        receipt.params.normalized_amount.units(),
        U256::from(2_500_000u64)
    );
    assert_eq!(
        receipt.attestation.as_ref().unwrap().channel,
        AttestationChannel::WormholeTransferStandardRelayer
    );
}
