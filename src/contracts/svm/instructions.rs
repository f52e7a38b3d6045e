//! Instruction builders for the SVM portal and executor programs

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::{system_program, sysvar};

use super::{anchor_discriminator, pda};
use crate::chain::addresses::{
    WormholeCoreAccounts, EVM_EXECUTOR_PEER, SVM_EXECUTOR_PROGRAM, SVM_PORTAL_PROGRAM,
    SVM_SWAP_PROGRAM, SVM_TOKEN_2022_PROGRAM, SVM_WORMHOLE_ADAPTER_PROGRAM,
};
use crate::protocol::UniversalAddress;

/// Magic prefix of an executor VAA request
pub const VAA_REQUEST_PREFIX: &[u8; 4] = b"ERV1";

/// The accounts of one extension as registered with the swap program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionAccounts {
    pub program_id: Pubkey,
    pub mint: Pubkey,
    pub token_program: Pubkey,
}

/// Arguments of the portal `send_token` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTokenArgs {
    pub amount: u64,
    pub destination_token: [u8; 32],
    /// M0 chain id of the destination
    pub destination_chain_id: u32,
    pub recipient: [u8; 32],
}

impl SendTokenArgs {
    /// # Format
    ///
    /// - discriminator: 8 bytes
    /// - amount: u64 LE (8 bytes)
    /// - destinationToken: 32 bytes
    /// - destinationChainId: u32 LE (4 bytes)
    /// - recipient: 32 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(84);
        data.extend_from_slice(&anchor_discriminator("global", "send_token"));
        data.extend_from_slice(&self.amount.to_le_bytes());
        data.extend_from_slice(&self.destination_token);
        data.extend_from_slice(&self.destination_chain_id.to_le_bytes());
        data.extend_from_slice(&self.recipient);
        data
    }
}

/// Portal `send_token`: burns the extension down to M and emits the bridge
/// message through the Wormhole adapter in one instruction.
pub fn send_token(
    sender: Pubkey,
    m_mint: Pubkey,
    extension: &ExtensionAccounts,
    core: &WormholeCoreAccounts,
    args: &SendTokenArgs,
) -> Instruction {
    let portal_authority = pda::portal_authority();
    let m_vault_authority = pda::extension_m_vault_authority(&extension.program_id);

    let mut accounts = vec![
        AccountMeta::new(sender, true),
        AccountMeta::new(pda::portal_global(), false),
        AccountMeta::new_readonly(pda::swap_global(), false),
        AccountMeta::new_readonly(pda::chain_paths(args.destination_chain_id), false),
        AccountMeta::new(pda::extension_global(&extension.program_id), false),
        AccountMeta::new(m_mint, false),
        AccountMeta::new(extension.mint, false),
        AccountMeta::new(
            pda::associated_token_address(&portal_authority, &m_mint, &SVM_TOKEN_2022_PROGRAM),
            false,
        ),
        AccountMeta::new(
            pda::associated_token_address(&sender, &extension.mint, &extension.token_program),
            false,
        ),
        AccountMeta::new_readonly(portal_authority, false),
        AccountMeta::new(
            pda::associated_token_address(&m_vault_authority, &m_mint, &SVM_TOKEN_2022_PROGRAM),
            false,
        ),
        AccountMeta::new_readonly(m_vault_authority, false),
        AccountMeta::new_readonly(pda::extension_mint_authority(&extension.program_id), false),
        AccountMeta::new_readonly(SVM_SWAP_PROGRAM, false),
        AccountMeta::new_readonly(extension.program_id, false),
        AccountMeta::new_readonly(SVM_TOKEN_2022_PROGRAM, false),
        AccountMeta::new_readonly(extension.token_program, false),
        AccountMeta::new_readonly(SVM_WORMHOLE_ADAPTER_PROGRAM, false),
        AccountMeta::new_readonly(system_program::ID, false),
    ];
    accounts.extend(wormhole_adapter_accounts(core));

    Instruction {
        program_id: SVM_PORTAL_PROGRAM,
        accounts,
        data: args.encode(),
    }
}

/// Accounts the Wormhole adapter needs to post a message, passed to the
/// portal as remaining accounts.
pub fn wormhole_adapter_accounts(core: &WormholeCoreAccounts) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(pda::wormhole_adapter_global(), false),
        AccountMeta::new(core.config, false),
        AccountMeta::new(pda::shim_message(core), false),
        AccountMeta::new_readonly(pda::wormhole_emitter(), false),
        AccountMeta::new(pda::wormhole_sequence(core), false),
        AccountMeta::new(core.fee_collector, false),
        AccountMeta::new_readonly(sysvar::clock::ID, false),
        AccountMeta::new_readonly(core.core, false),
        AccountMeta::new_readonly(pda::shim_event_authority(core), false),
        AccountMeta::new_readonly(core.shim, false),
    ]
}

/// Executor VAA request identifying the message to deliver.
///
/// # Format
///
/// - prefix: "ERV1" (4 bytes)
/// - emitterChain: u16 BE (2 bytes)
/// - emitterAddress: 32 bytes
/// - sequence: u64 BE (8 bytes)
pub fn encode_vaa_request(emitter_chain: u16, emitter: &Pubkey, sequence: u64) -> Vec<u8> {
    let mut request = Vec::with_capacity(46);
    request.extend_from_slice(VAA_REQUEST_PREFIX);
    request.extend_from_slice(&emitter_chain.to_be_bytes());
    request.extend_from_slice(emitter.as_ref());
    request.extend_from_slice(&sequence.to_be_bytes());
    request
}

/// Arguments of the executor `request_for_execution` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestForExecutionArgs {
    pub estimated_cost: u64,
    /// Wormhole chain id of the destination
    pub destination_chain: u16,
    pub signed_quote: Vec<u8>,
    pub vaa_request: Vec<u8>,
    pub relay_instructions: Vec<u8>,
}

impl RequestForExecutionArgs {
    /// # Format
    ///
    /// - discriminator: 8 bytes
    /// - amount: u64 LE (8 bytes)
    /// - dstChain: u16 LE (2 bytes)
    /// - dstAddr: 32 bytes (EVM executor peer, left-padded)
    /// - refundAddr: 32 bytes
    /// - signedQuoteBytes, requestBytes, relayInstructions: u32 LE length + bytes each
    pub fn encode(&self, refund: &Pubkey) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            94 + self.signed_quote.len() + self.vaa_request.len() + self.relay_instructions.len(),
        );
        data.extend_from_slice(&anchor_discriminator("global", "request_for_execution"));
        data.extend_from_slice(&self.estimated_cost.to_le_bytes());
        data.extend_from_slice(&self.destination_chain.to_le_bytes());
        data.extend_from_slice(UniversalAddress::from(EVM_EXECUTOR_PEER).as_bytes());
        data.extend_from_slice(refund.as_ref());
        for field in [&self.signed_quote, &self.vaa_request, &self.relay_instructions] {
            data.extend_from_slice(&(field.len() as u32).to_le_bytes());
            data.extend_from_slice(field);
        }
        data
    }
}

/// Executor `request_for_execution`: pays the quoted cost to `payee` and
/// asks the relay network to deliver the referenced message.
pub fn request_for_execution(
    sender: Pubkey,
    payee: Pubkey,
    args: &RequestForExecutionArgs,
) -> Instruction {
    Instruction {
        program_id: SVM_EXECUTOR_PROGRAM,
        accounts: vec![
            AccountMeta::new(sender, true),
            AccountMeta::new(payee, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: args.encode(&sender),
    }
}
