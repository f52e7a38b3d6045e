//! SVM transaction builder
//!
//! An SVM transfer is a single transaction: the portal's `send_token`
//! unwraps the extension and posts the Wormhole message, and the executor's
//! `request_for_execution` pays for delivery of that message. The message
//! sequence is read from the core bridge before building, since the request
//! must name the message the same transaction is about to emit.

use std::sync::Arc;

use async_trait::async_trait;
use solana_program::instruction::Instruction;
use tracing::{debug, info, warn};

use super::{
    AddressLookupTable, BuildStep, SvmTransaction, TransactionBuilder, TransferParams,
    UnsignedTransaction,
};
use crate::chain::addresses::WormholeCoreAccounts;
use crate::chain::{ChainConfig, ChainContext, ExtensionTable};
use crate::contracts::svm::accounts::{
    decode_emitter_sequence, decode_lookup_table_addresses, AnchorAccount, WormholeGlobal,
};
use crate::contracts::svm::instructions::{
    encode_vaa_request, request_for_execution, send_token, RequestForExecutionArgs, SendTokenArgs,
};
use crate::contracts::svm::pda;
use crate::error::{Result, RouteError};
use crate::executor::ExecutorQuote;
use crate::protocol::UniversalAddress;

/// Builds portal and executor instructions on one SVM source chain.
pub struct SvmTransactionBuilder<'a> {
    source: &'a ChainContext,
    destination: &'a ChainConfig,
    extensions: Arc<ExtensionTable>,
}

impl<'a> SvmTransactionBuilder<'a> {
    pub fn new(
        source: &'a ChainContext,
        destination: &'a ChainConfig,
        extensions: Arc<ExtensionTable>,
    ) -> Self {
        Self {
            source,
            destination,
            extensions,
        }
    }

    fn core_accounts(&self) -> WormholeCoreAccounts {
        WormholeCoreAccounts::for_chain(self.source.chain(), self.source.network())
    }

    fn unsupported_source(&self, params: &TransferParams) -> RouteError {
        RouteError::UnsupportedToken {
            chain: self.source.chain(),
            token: params.source_token().to_native_string(self.source.chain()),
        }
    }

    fn step(
        &self,
        params: &TransferParams,
        description: &str,
        instructions: Vec<Instruction>,
    ) -> BuildStep {
        BuildStep::new(
            description,
            UnsignedTransaction::Svm(SvmTransaction {
                payer: params.sender().to_pubkey(),
                instructions,
                lookup_tables: Vec::new(),
            }),
        )
    }

    async fn send_token_instruction(&self, params: &TransferParams) -> Result<Instruction> {
        let source_token = params.source_token();
        let extension = self
            .extensions
            .get(&source_token)
            .and_then(|entry| entry.accounts.map(|accounts| (entry, accounts)));
        let Some((entry, accounts)) = extension else {
            return Err(self.unsupported_source(params));
        };

        let destination_token = params.destination_token()?;
        if !entry
            .destinations_on(self.destination.chain)
            .any(|token| *token == destination_token)
        {
            return Err(RouteError::UnsupportedToken {
                chain: self.destination.chain,
                token: destination_token.to_native_string(self.destination.chain),
            });
        }

        let m_mint = self.source.contracts().await?.token.to_pubkey();
        let args = SendTokenArgs {
            amount: params.amount().to_u64()?,
            destination_token: *destination_token.as_bytes(),
            destination_chain_id: self.destination.chain.m0_chain_id(self.source.network())?,
            recipient: *params.recipient()?.as_bytes(),
        };
        Ok(send_token(
            params.sender().to_pubkey(),
            m_mint,
            &accounts,
            &self.core_accounts(),
            &args,
        ))
    }

    /// Sequence the adapter's next message will carry.
    async fn next_sequence(&self) -> Result<u64> {
        let reader = self.source.svm()?;
        let account = pda::wormhole_sequence(&self.core_accounts());
        match reader.get_account_data(account).await? {
            Some(data) => decode_emitter_sequence(&data),
            None => {
                debug!(account = %account, event = "emitter_sequence_missing");
                Ok(0)
            }
        }
    }

    async fn relay_instruction(
        &self,
        params: &TransferParams,
        quote: &ExecutorQuote,
    ) -> Result<Instruction> {
        let sequence = self.next_sequence().await?;
        let vaa_request = encode_vaa_request(
            self.source.chain().wormhole_chain_id(),
            &pda::wormhole_emitter(),
            sequence,
        );
        let estimated_cost = u64::try_from(quote.estimated_cost).map_err(|_| {
            RouteError::ExecutorRejected(format!(
                "estimated cost {} does not fit in 64 bits",
                quote.estimated_cost
            ))
        })?;
        let args = RequestForExecutionArgs {
            estimated_cost,
            destination_chain: self.destination.chain.wormhole_chain_id(),
            signed_quote: quote.signed_quote.to_vec(),
            vaa_request,
            relay_instructions: quote.relay_instructions.to_vec(),
        };
        debug!(
            sequence = sequence,
            estimated_cost = estimated_cost,
            event = "svm_relay_request_built"
        );
        Ok(request_for_execution(
            params.sender().to_pubkey(),
            quote.payee.to_pubkey(),
            &args,
        ))
    }

    /// The adapter's receive lookup table, when it has one.
    pub async fn lookup_table(&self) -> Result<Option<AddressLookupTable>> {
        let reader = self.source.svm()?;
        let Some(data) = reader.get_account_data(pda::wormhole_adapter_global()).await? else {
            warn!(chain = %self.source.chain(), event = "wormhole_global_missing");
            return Ok(None);
        };
        let Some(key) = WormholeGlobal::decode(&data)?.receive_lut() else {
            return Ok(None);
        };
        let Some(table) = reader.get_account_data(key).await? else {
            warn!(lookup_table = %key, event = "lookup_table_missing");
            return Ok(None);
        };
        Ok(Some(AddressLookupTable {
            key,
            addresses: decode_lookup_table_addresses(&table)?,
        }))
    }
}

#[async_trait]
impl TransactionBuilder for SvmTransactionBuilder<'_> {
    /// Token accounts are debited by the signer directly; nothing to approve.
    async fn build_approval(
        &self,
        _params: &TransferParams,
        _spender: UniversalAddress,
    ) -> Result<Option<BuildStep>> {
        Ok(None)
    }

    /// The SVM portal only accepts extension tokens from users.
    async fn build_base_transfer(&self, params: &TransferParams) -> Result<BuildStep> {
        Err(self.unsupported_source(params))
    }

    async fn build_extension_transfer(&self, params: &TransferParams) -> Result<BuildStep> {
        let instruction = self.send_token_instruction(params).await?;
        Ok(self.step(params, "M0.SendToken", vec![instruction]))
    }

    async fn build_relay_request(
        &self,
        params: &TransferParams,
        quote: &ExecutorQuote,
    ) -> Result<BuildStep> {
        let instruction = self.relay_instruction(params, quote).await?;
        Ok(self.step(params, "M0.RequestForExecution", vec![instruction]))
    }

    async fn build_transfer(&self, params: &TransferParams) -> Result<Vec<BuildStep>> {
        params.validate()?;
        if self
            .source
            .config()
            .contracts
            .is_base_token(&params.source_token())
        {
            return Err(self.unsupported_source(params));
        }
        let quote = params.executor_quote()?;

        let send = self.send_token_instruction(params).await?;
        let relay = self.relay_instruction(params, quote).await?;
        let lookup_tables = self.lookup_table().await?.into_iter().collect();

        info!(
            source_chain = %self.source.chain(),
            destination_chain = %self.destination.chain,
            event = "svm_transfer_built"
        );
        Ok(vec![BuildStep::new(
            "M0.SendToken",
            UnsignedTransaction::Svm(SvmTransaction {
                payer: params.sender().to_pubkey(),
                instructions: vec![send, relay],
                lookup_tables,
            }),
        )])
    }
}
