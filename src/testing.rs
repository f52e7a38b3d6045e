//! Test utilities and fake implementations of the router's IO traits
//!
//! These fakes let the whole validate → quote → initiate → track flow run
//! without a chain, an attestation API or an executor. Each fake keeps its
//! state behind `Arc<Mutex<..>>`, so a clone handed to the router and the
//! copy kept by the test observe the same calls.
//!
//! They cover adversarial scenarios too: throttled attestation APIs, VAAs
//! that never get signed, relaying switched off for a destination, inbound
//! capacity close to the rate limit and failing transaction submission.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use solana_program::pubkey::Pubkey;

use crate::chain::addresses::{
    WormholeCoreAccounts, SVM_PORTAL_PROGRAM, SVM_TOKEN_2022_PROGRAM,
};
use crate::contracts::svm::accounts::{
    AnchorAccount, BridgeMessage, BridgePath, ChainBridgePaths, PortalGlobal, SwapGlobal,
    WhitelistedExtension, WormholeGlobal, LOOKUP_TABLE_META_SIZE,
};
use crate::contracts::svm::pda;
use crate::error::{Result, RouteError};
use crate::executor::{ExecutorCapabilities, SignedQuote, SignedQuoteResponse, VAA_REQUEST_TYPE};
use crate::platform::BuildStep;
use crate::protocol::{
    Chain, DeliveryInstruction, ManagerMessage, NativeTokenTransfer, TransceiverMessage,
    UniversalAddress, Vaa,
};
use crate::route::TransactionId;
use crate::traits::{
    AttestationProvider, Clock, EvmChainReader, ExecutorApi, SvmAccountReader, TransferSigner,
};

// ============================================================================
// Fake EVM Chain
// ============================================================================

#[derive(Debug)]
struct EvmState {
    decimals: HashMap<Address, u8>,
    allowances: HashMap<Address, U256>,
    delivery_price: U256,
    delivery_price_requests: Vec<Bytes>,
    relaying_disabled: HashSet<u16>,
    rate_limit_duration: u64,
    inbound_capacity: U256,
    messages: HashMap<B256, (bool, bool)>,
    calls: usize,
}

impl Default for EvmState {
    fn default() -> Self {
        Self {
            decimals: HashMap::new(),
            allowances: HashMap::new(),
            delivery_price: U256::ZERO,
            delivery_price_requests: Vec::new(),
            relaying_disabled: HashSet::new(),
            rate_limit_duration: 0,
            inbound_capacity: U256::MAX,
            messages: HashMap::new(),
            calls: 0,
        }
    }
}

/// A fake EVM chain answering portal, transceiver and ERC-20 reads.
///
/// Unknown tokens report 6 decimals, allowances default to zero, relaying is
/// enabled toward every chain and rate limiting is off.
#[derive(Clone, Debug, Default)]
pub struct FakeEvmChain {
    state: Arc<Mutex<EvmState>>,
}

impl FakeEvmChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.state.lock().unwrap().decimals.insert(token, decimals);
    }

    /// Allowance granted to `spender`, whatever the owner.
    pub fn set_allowance(&self, spender: Address, amount: U256) {
        self.state.lock().unwrap().allowances.insert(spender, amount);
    }

    pub fn set_delivery_price(&self, price: U256) {
        self.state.lock().unwrap().delivery_price = price;
    }

    pub fn set_relaying_enabled(&self, destination: Chain, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        let id = destination.wormhole_chain_id();
        if enabled {
            state.relaying_disabled.remove(&id);
        } else {
            state.relaying_disabled.insert(id);
        }
    }

    /// Turns on inbound rate limiting with the given window and capacity.
    pub fn set_rate_limit(&self, duration_secs: u64, capacity: U256) {
        let mut state = self.state.lock().unwrap();
        state.rate_limit_duration = duration_secs;
        state.inbound_capacity = capacity;
    }

    pub fn set_message_status(&self, digest: B256, approved: bool, executed: bool) {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(digest, (approved, executed));
    }

    /// Transceiver instructions of every delivery price request, in order.
    pub fn delivery_price_requests(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().delivery_price_requests.clone()
    }

    /// Total number of reads issued against this chain.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn record_call(&self) -> std::sync::MutexGuard<'_, EvmState> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state
    }
}

#[async_trait]
impl EvmChainReader for FakeEvmChain {
    async fn decimals(&self, token: Address) -> Result<u8> {
        Ok(self.record_call().decimals.get(&token).copied().unwrap_or(6))
    }

    async fn allowance(&self, _token: Address, _owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .record_call()
            .allowances
            .get(&spender)
            .copied()
            .unwrap_or_default())
    }

    async fn quote_delivery_price(
        &self,
        _manager: Address,
        _destination: u16,
        transceiver_instructions: Bytes,
    ) -> Result<U256> {
        let mut state = self.record_call();
        state.delivery_price_requests.push(transceiver_instructions);
        Ok(state.delivery_price)
    }

    async fn is_relaying_enabled(&self, _transceiver: Address, destination: u16) -> Result<bool> {
        Ok(!self.record_call().relaying_disabled.contains(&destination))
    }

    async fn rate_limit_duration(&self, _manager: Address) -> Result<u64> {
        Ok(self.record_call().rate_limit_duration)
    }

    async fn current_inbound_capacity(&self, _manager: Address, _source: u16) -> Result<U256> {
        Ok(self.record_call().inbound_capacity)
    }

    async fn is_message_approved(&self, _manager: Address, digest: B256) -> Result<bool> {
        Ok(self
            .record_call()
            .messages
            .get(&digest)
            .is_some_and(|(approved, _)| *approved))
    }

    async fn is_message_executed(&self, _manager: Address, digest: B256) -> Result<bool> {
        Ok(self
            .record_call()
            .messages
            .get(&digest)
            .is_some_and(|(_, executed)| *executed))
    }
}

// ============================================================================
// Fake SVM Chain
// ============================================================================

#[derive(Debug, Default)]
struct SvmState {
    accounts: HashMap<Pubkey, Vec<u8>>,
    extensions: Vec<WhitelistedExtension>,
    bridge_paths: BTreeMap<u32, Vec<BridgePath>>,
    reads: HashMap<Pubkey, usize>,
    program_account_queries: usize,
}

/// A fake SVM chain holding raw account data.
///
/// Helpers write the portal, swap program and Wormhole accounts in their
/// on-chain layouts, so the code under test decodes exactly what it would
/// read from a validator.
#[derive(Clone, Debug, Default)]
pub struct FakeSvmChain {
    state: Arc<Mutex<SvmState>>,
}

impl FakeSvmChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program id the fake assigns to the extension of `mint`.
    pub fn extension_program(mint: Pubkey) -> Pubkey {
        let mut id = mint.to_bytes();
        id[0] ^= 0xff;
        Pubkey::new_from_array(id)
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.insert(address, data);
    }

    pub fn set_portal_global(&self, m_mint: Pubkey) {
        let global = PortalGlobal {
            bump: 255,
            chain_id: 1,
            m_mint: m_mint.to_bytes(),
            admin: [0; 32],
            outgoing_paused: false,
            incoming_paused: false,
            m_index: 1_000_000_000_000,
            message_nonce: 0,
        };
        self.set_account(pda::portal_global(), global.encode());
    }

    /// Registers `mint` with the swap program.
    pub fn whitelist_extension(&self, mint: Pubkey) {
        let mut state = self.state.lock().unwrap();
        state.extensions.push(WhitelistedExtension {
            program_id: Self::extension_program(mint).to_bytes(),
            mint: mint.to_bytes(),
            token_program: SVM_TOKEN_2022_PROGRAM.to_bytes(),
        });
        let global = SwapGlobal {
            bump: 255,
            admin: [0; 32],
            whitelisted_unwrappers: Vec::new(),
            whitelisted_extensions: state.extensions.clone(),
        };
        state.accounts.insert(pda::swap_global(), global.encode());
    }

    /// Adds portal paths toward the chain with M0 id `destination_chain_id`.
    pub fn add_bridge_paths(
        &self,
        destination_chain_id: u32,
        paths: &[(Pubkey, UniversalAddress)],
    ) {
        let mut state = self.state.lock().unwrap();
        state
            .bridge_paths
            .entry(destination_chain_id)
            .or_default()
            .extend(paths.iter().map(|(mint, token)| BridgePath {
                source_mint: mint.to_bytes(),
                destination_token: *token.as_bytes(),
            }));
    }

    /// Writes the portal's receipt of an inbound message.
    pub fn set_bridge_message(&self, message_id: &[u8; 32], consumed: bool) {
        self.set_account(
            pda::bridge_message(message_id),
            BridgeMessage { consumed }.encode(),
        );
    }

    pub fn set_sequence(&self, core: &WormholeCoreAccounts, sequence: u64) {
        let mut data = sequence.to_le_bytes().to_vec();
        data.push(255);
        self.set_account(pda::wormhole_sequence(core), data);
    }

    /// Registers `key` as the adapter's lookup table holding `addresses`.
    pub fn set_lookup_table(&self, key: Pubkey, addresses: &[Pubkey]) {
        let global = WormholeGlobal {
            bump: 255,
            admin: [0; 32],
            outgoing_paused: false,
            incoming_paused: false,
            chain_id: 1,
            receive_lut: Some(key.to_bytes()),
        };
        self.set_account(pda::wormhole_adapter_global(), global.encode());

        let mut data = vec![0u8; LOOKUP_TABLE_META_SIZE];
        for address in addresses {
            data.extend_from_slice(address.as_ref());
        }
        self.set_account(key, data);
    }

    pub fn set_mint_decimals(&self, mint: Pubkey, decimals: u8) {
        let mut data = vec![0u8; 82];
        data[44] = decimals;
        data[45] = 1;
        self.set_account(mint, data);
    }

    /// Number of reads of one account.
    pub fn account_reads(&self, address: &Pubkey) -> usize {
        self.state
            .lock()
            .unwrap()
            .reads
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of account reads.
    pub fn total_reads(&self) -> usize {
        self.state.lock().unwrap().reads.values().sum()
    }

    pub fn program_account_queries(&self) -> usize {
        self.state.lock().unwrap().program_account_queries
    }
}

#[async_trait]
impl SvmAccountReader for FakeSvmChain {
    async fn get_account_data(&self, address: Pubkey) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock().unwrap();
        *state.reads.entry(address).or_default() += 1;
        Ok(state.accounts.get(&address).cloned())
    }

    async fn get_program_accounts(
        &self,
        program: Pubkey,
        discriminator: [u8; 8],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let mut state = self.state.lock().unwrap();
        state.program_account_queries += 1;
        if program != SVM_PORTAL_PROGRAM || discriminator != ChainBridgePaths::DISCRIMINATOR {
            return Ok(Vec::new());
        }
        Ok(state
            .bridge_paths
            .iter()
            .map(|(chain_id, paths)| {
                let account = ChainBridgePaths {
                    bump: 255,
                    destination_chain_id: *chain_id,
                    paths: paths.clone(),
                };
                (pda::chain_paths(*chain_id), account.encode())
            })
            .collect())
    }
}

// ============================================================================
// Fake Attestation Provider
// ============================================================================

/// One scripted answer of [`FakeAttestationProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeAttestationResponse {
    Vaas(Vec<Bytes>),
    NotFound,
    RateLimited { retry_after_seconds: u64 },
    ServerError,
}

/// A fake attestation API that replays scripted responses per transaction.
///
/// This allows testing scenarios like:
/// - Immediate success
/// - Not yet signed, then signed
/// - Rate limiting (429)
/// - Repeated server errors tripping the circuit breaker
/// - Timeout scenarios
///
/// The last response of a sequence repeats; unknown transactions are not
/// found.
#[derive(Clone, Debug, Default)]
pub struct FakeAttestationProvider {
    responses: Arc<Mutex<HashMap<String, VecDeque<FakeAttestationResponse>>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl FakeAttestationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response_sequence(&self, txid: &str, responses: Vec<FakeAttestationResponse>) {
        self.responses
            .lock()
            .unwrap()
            .insert(txid.to_string(), responses.into());
    }

    pub fn add_vaa(&self, txid: &str, vaa: Bytes) {
        self.add_response_sequence(txid, vec![FakeAttestationResponse::Vaas(vec![vaa])]);
    }

    pub fn add_not_found_then_vaa(&self, txid: &str, not_found_count: usize, vaa: Bytes) {
        let mut responses = vec![FakeAttestationResponse::NotFound; not_found_count];
        responses.push(FakeAttestationResponse::Vaas(vec![vaa]));
        self.add_response_sequence(txid, responses);
    }

    pub fn add_rate_limit_then_vaa(
        &self,
        txid: &str,
        rate_limit_count: usize,
        retry_after_seconds: u64,
        vaa: Bytes,
    ) {
        let mut responses = vec![
            FakeAttestationResponse::RateLimited {
                retry_after_seconds
            };
            rate_limit_count
        ];
        responses.push(FakeAttestationResponse::Vaas(vec![vaa]));
        self.add_response_sequence(txid, responses);
    }

    pub fn add_always_failing(&self, txid: &str) {
        self.add_response_sequence(txid, vec![FakeAttestationResponse::ServerError]);
    }

    pub fn call_count(&self, txid: &str) -> usize {
        self.calls.lock().unwrap().get(txid).copied().unwrap_or(0)
    }

    /// Lookups across every transaction.
    pub fn total_call_count(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl AttestationProvider for FakeAttestationProvider {
    async fn get_signed_messages(&self, _chain: Chain, txid: &str) -> Result<Vec<Bytes>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(txid.to_string())
            .or_default() += 1;

        let response = {
            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(txid) {
                Some(sequence) if sequence.len() > 1 => sequence.pop_front(),
                Some(sequence) => sequence.front().cloned(),
                None => None,
            }
        };

        match response.unwrap_or(FakeAttestationResponse::NotFound) {
            FakeAttestationResponse::Vaas(vaas) => Ok(vaas),
            FakeAttestationResponse::NotFound => Err(RouteError::AttestationNotFound {
                txid: txid.to_string(),
            }),
            FakeAttestationResponse::RateLimited {
                retry_after_seconds,
            } => Err(RouteError::RateLimitExceeded {
                retry_after_seconds,
            }),
            FakeAttestationResponse::ServerError => {
                Err(RouteError::Provider("Simulated API error".to_string()))
            }
        }
    }
}

// ============================================================================
// Fake Executor API
// ============================================================================

#[derive(Debug, Default)]
struct ExecutorState {
    quotes: HashMap<(u16, u16), SignedQuoteResponse>,
    capabilities: HashMap<u16, ExecutorCapabilities>,
    requested_instructions: Vec<Bytes>,
    quote_calls: usize,
    capabilities_calls: usize,
}

/// A fake executor that signs nothing and prices what it is told to.
#[derive(Clone, Debug, Default)]
pub struct FakeExecutorApi {
    state: Arc<Mutex<ExecutorState>>,
}

impl FakeExecutorApi {
    /// Payee named in every fake quote.
    pub const PAYEE: UniversalAddress = UniversalAddress::new([0xee; 32]);

    pub fn new() -> Self {
        Self::default()
    }

    /// Prices delivery from `source` to `destination` at `cost` native base
    /// units until `expiry` (unix seconds).
    pub fn add_quote(&self, source: Chain, destination: Chain, cost: u64, expiry: u64) {
        let signed = SignedQuote {
            quoter: Address::repeat_byte(0x51),
            payee: Self::PAYEE,
            source_chain: source.wormhole_chain_id(),
            destination_chain: destination.wormhole_chain_id(),
            expiry,
            base_fee: cost,
            destination_gas_price: 1,
            source_price: 1,
            destination_price: 1,
            signature: [0x5a; 65],
        };
        let response = SignedQuoteResponse {
            signed_quote: signed.encode(),
            estimated_cost: Some(cost.to_string()),
        };
        self.add_response(source, destination, response);
    }

    /// Answers quote requests for `source -> destination` with `response` as is.
    pub fn add_response(&self, source: Chain, destination: Chain, response: SignedQuoteResponse) {
        self.state.lock().unwrap().quotes.insert(
            (source.wormhole_chain_id(), destination.wormhole_chain_id()),
            response,
        );
    }

    /// Returns the response registered for `source -> destination`, if any.
    pub fn response(&self, source: Chain, destination: Chain) -> Option<SignedQuoteResponse> {
        self.state
            .lock()
            .unwrap()
            .quotes
            .get(&(source.wormhole_chain_id(), destination.wormhole_chain_id()))
            .cloned()
    }

    /// Advertises VAA delivery on exactly `chains`.
    pub fn set_supported(&self, chains: &[Chain]) {
        let capabilities = ExecutorCapabilities {
            request_prefixes: [VAA_REQUEST_TYPE.to_string()].into(),
            ..Default::default()
        };
        self.state.lock().unwrap().capabilities = chains
            .iter()
            .map(|chain| (chain.wormhole_chain_id(), capabilities.clone()))
            .collect();
    }

    /// Relay instructions of every quote request, in order.
    pub fn requested_instructions(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().requested_instructions.clone()
    }

    pub fn quote_call_count(&self) -> usize {
        self.state.lock().unwrap().quote_calls
    }

    pub fn capabilities_call_count(&self) -> usize {
        self.state.lock().unwrap().capabilities_calls
    }
}

#[async_trait]
impl ExecutorApi for FakeExecutorApi {
    async fn capabilities(&self) -> Result<HashMap<u16, ExecutorCapabilities>> {
        let mut state = self.state.lock().unwrap();
        state.capabilities_calls += 1;
        Ok(state.capabilities.clone())
    }

    async fn quote(
        &self,
        source: u16,
        destination: u16,
        relay_instructions: Bytes,
    ) -> Result<SignedQuoteResponse> {
        let mut state = self.state.lock().unwrap();
        state.quote_calls += 1;
        state.requested_instructions.push(relay_instructions);
        state
            .quotes
            .get(&(source, destination))
            .cloned()
            .ok_or_else(|| {
                RouteError::ExecutorRejected(format!(
                    "no quote for route {source} -> {destination}"
                ))
            })
    }
}

// ============================================================================
// Fake Signer
// ============================================================================

/// A fake signer that records every step it is handed.
#[derive(Clone, Debug)]
pub struct FakeSigner {
    chain: Chain,
    address: UniversalAddress,
    submitted: Arc<Mutex<Vec<BuildStep>>>,
    failing: Arc<Mutex<bool>>,
}

impl FakeSigner {
    pub fn new(chain: Chain, address: impl Into<UniversalAddress>) -> Self {
        Self {
            chain,
            address: address.into(),
            submitted: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(false)),
        }
    }

    /// Makes every following submission fail.
    pub fn fail_submissions(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn submitted(&self) -> Vec<BuildStep> {
        self.submitted.lock().unwrap().clone()
    }

    /// Transaction id the fake returns for the `index`-th submission.
    pub fn txid(index: usize) -> String {
        format!("0x{:064x}", index + 1)
    }
}

#[async_trait]
impl TransferSigner for FakeSigner {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> UniversalAddress {
        self.address
    }

    async fn sign_and_send(&self, step: &BuildStep) -> Result<TransactionId> {
        if *self.failing.lock().unwrap() {
            return Err(RouteError::TransactionFailed {
                reason: format!("simulated rejection of {}", step.description),
            });
        }
        let mut submitted = self.submitted.lock().unwrap();
        let txid = Self::txid(submitted.len());
        submitted.push(step.clone());
        Ok(TransactionId {
            chain: self.chain,
            txid,
        })
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// Unix time at which every [`FakeClock`] starts.
pub const FAKE_CLOCK_START_UNIX: u64 = 1_700_000_000;

/// A fake clock that allows fast-forwarding time in tests.
///
/// This enables testing timeout behavior and quote expiry without actually
/// waiting.
#[derive(Clone, Debug)]
pub struct FakeClock {
    started: Instant,
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        let started = Instant::now();
        Self {
            started,
            current_time: Arc::new(Mutex::new(started)),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }

    pub fn sleep_log(&self) -> Vec<Duration> {
        self.sleep_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }

    fn unix_timestamp(&self) -> u64 {
        FAKE_CLOCK_START_UNIX + (self.now() - self.started).as_secs()
    }
}

// ============================================================================
// Message fixtures
// ============================================================================

/// Transfer payload as the source portal would emit it.
#[derive(Debug, Clone)]
pub struct TransferFixture {
    pub source_chain: Chain,
    pub destination_chain: Chain,
    pub source_manager: UniversalAddress,
    pub recipient_manager: UniversalAddress,
    pub message_id: B256,
    pub amount: u64,
    pub decimals: u8,
    pub source_token: UniversalAddress,
    pub recipient: UniversalAddress,
}

impl TransferFixture {
    pub fn message(&self) -> TransceiverMessage {
        TransceiverMessage {
            source_manager: self.source_manager,
            recipient_manager: self.recipient_manager,
            manager_payload: ManagerMessage {
                id: self.message_id,
                sender: self.recipient,
                payload: NativeTokenTransfer {
                    decimals: self.decimals,
                    amount: self.amount,
                    source_token: self.source_token,
                    to: self.recipient,
                    to_chain: self.destination_chain.wormhole_chain_id(),
                    additional_payload: Bytes::new(),
                }
                .encode(),
            },
            transceiver_payload: Bytes::new(),
        }
    }

    /// Digest a destination EVM portal keys this message by.
    pub fn digest(&self) -> B256 {
        self.message()
            .manager_payload
            .digest(self.source_chain.wormhole_chain_id())
    }

    /// The transceiver VAA carrying the message directly.
    pub fn transceiver_vaa(&self, sequence: u64) -> Bytes {
        signed_vaa(
            self.source_chain,
            UniversalAddress::new([0x77; 32]),
            sequence,
            self.message().encode(),
        )
    }

    /// The standard relayer delivery VAA wrapping the message.
    pub fn delivery_vaa(&self, sequence: u64) -> Bytes {
        let delivery = DeliveryInstruction {
            target_chain: self.destination_chain.wormhole_chain_id(),
            target_address: self.recipient_manager,
            payload: self.message().encode(),
        };
        signed_vaa(
            self.source_chain,
            UniversalAddress::new([0x27; 32]),
            sequence,
            delivery.encode(),
        )
    }
}

/// A version 1 VAA with no signatures.
pub fn signed_vaa(
    emitter_chain: Chain,
    emitter_address: UniversalAddress,
    sequence: u64,
    payload: Bytes,
) -> Bytes {
    Vaa {
        version: 1,
        guardian_set_index: 4,
        signatures: Vec::new(),
        timestamp: 1_700_000_000,
        nonce: 0,
        emitter_chain: emitter_chain.wormhole_chain_id(),
        emitter_address,
        sequence,
        consistency_level: 1,
        payload,
    }
    .encode()
}
