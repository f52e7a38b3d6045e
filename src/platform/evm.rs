//! EVM transaction builder
//!
//! Transfers to EVM destinations call the portal directly and are relayed by
//! the Wormhole standard relayer. Transfers to destinations that need the
//! executor go through the entrypoint contract, which becomes the approval
//! spender and receives the executor fee on top of the delivery price.

use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{BuildStep, TransactionBuilder, TransferParams, UnsignedTransaction};
use crate::chain::{ChainConfig, ChainContext};
use crate::contracts::erc20::approve_transaction;
use crate::contracts::portal::{ExecutorArgs, ExecutorEntrypoint, Portal};
use crate::error::{Result, RouteError};
use crate::executor::ExecutorQuote;
use crate::protocol::{encode_transceiver_instructions, UniversalAddress};

/// Builds portal transactions on one EVM source chain for one destination.
pub struct EvmTransactionBuilder<'a> {
    source: &'a ChainContext,
    destination: &'a ChainConfig,
}

impl<'a> EvmTransactionBuilder<'a> {
    pub fn new(source: &'a ChainContext, destination: &'a ChainConfig) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Whether the transfer is relayed through the executor entrypoint.
    pub fn uses_entrypoint(&self) -> bool {
        self.destination.requires_relay_entrypoint
    }

    /// Transceiver instructions: the standard relayer is skipped when the
    /// executor delivers instead.
    pub fn transceiver_instructions(&self) -> Bytes {
        encode_transceiver_instructions(self.uses_entrypoint())
    }

    /// The contract that pulls the tokens: the portal, or the entrypoint when
    /// the destination requires one.
    pub fn spender(&self) -> Result<UniversalAddress> {
        if !self.uses_entrypoint() {
            return Ok(self.source.config().contracts.manager);
        }
        self.source.config().relay_entrypoint.ok_or_else(|| {
            RouteError::InvalidConfig(format!(
                "no executor entrypoint configured on {} for transfers to {}",
                self.source.chain(),
                self.destination.chain
            ))
        })
    }

    /// Native fee the portal charges for sending the message.
    pub async fn delivery_price(&self) -> Result<U256> {
        let reader = self.source.evm()?;
        let manager = self.source.config().contracts.manager.to_evm()?;
        reader
            .quote_delivery_price(
                manager,
                self.destination.chain.wormhole_chain_id(),
                self.transceiver_instructions(),
            )
            .await
    }

    fn is_base_to_base(&self, params: &TransferParams) -> Result<bool> {
        Ok(self
            .source
            .config()
            .contracts
            .is_base_token(&params.source_token())
            && self
                .destination
                .contracts
                .is_base_token(&params.destination_token()?))
    }

    fn transaction(
        &self,
        params: &TransferParams,
        to: Address,
        input: Vec<u8>,
        value: U256,
    ) -> Result<TransactionRequest> {
        let mut tx = TransactionRequest::default()
            .from(params.sender().to_evm()?)
            .to(to)
            .input(input.into())
            .value(value);
        tx.chain_id = self.source.chain().evm_chain_id();
        Ok(tx)
    }
}

#[async_trait]
impl TransactionBuilder for EvmTransactionBuilder<'_> {
    async fn build_approval(
        &self,
        params: &TransferParams,
        spender: UniversalAddress,
    ) -> Result<Option<BuildStep>> {
        let reader = self.source.evm()?;
        let token = params.source_token().to_evm()?;
        let owner = params.sender().to_evm()?;
        let spender = spender.to_evm()?;
        let amount = params.amount().units();

        let allowance = reader.allowance(token, owner, spender).await?;
        if allowance >= amount {
            debug!(
                token = %token,
                spender = %spender,
                allowance = %allowance,
                event = "approval_not_needed"
            );
            return Ok(None);
        }

        let mut tx = approve_transaction(token, owner, spender, amount);
        tx.chain_id = self.source.chain().evm_chain_id();
        Ok(Some(BuildStep::new("M0.Approve", UnsignedTransaction::Evm(tx))))
    }

    async fn build_base_transfer(&self, params: &TransferParams) -> Result<BuildStep> {
        let contracts = &self.source.config().contracts;
        if !contracts.is_base_token(&params.source_token()) {
            return Err(RouteError::UnsupportedToken {
                chain: self.source.chain(),
                token: params.source_token().to_native_string(self.source.chain()),
            });
        }

        let call = Portal::transferCall {
            amount: params.amount().units(),
            recipientChain: self.destination.chain.wormhole_chain_id(),
            recipient: params.recipient()?.to_fixed_bytes(),
            refundAddress: params.refund()?.to_fixed_bytes(),
            shouldQueue: params.queue(),
            transceiverInstructions: self.transceiver_instructions(),
        };
        let price = self.delivery_price().await?;
        let tx = self.transaction(params, contracts.manager.to_evm()?, call.abi_encode(), price)?;
        Ok(BuildStep::new("M0.Transfer", UnsignedTransaction::Evm(tx)))
    }

    async fn build_extension_transfer(&self, params: &TransferParams) -> Result<BuildStep> {
        let call = Portal::transferMLikeTokenCall {
            amount: params.amount().units(),
            sourceToken: params.source_token().to_evm()?,
            destinationChainId: self.destination.chain.wormhole_chain_id(),
            destinationToken: params.destination_token()?.to_fixed_bytes(),
            recipient: params.recipient()?.to_fixed_bytes(),
            refundAddress: params.refund()?.to_fixed_bytes(),
        };
        let price = self.delivery_price().await?;
        let manager = self.source.config().contracts.manager.to_evm()?;
        let tx = self.transaction(params, manager, call.abi_encode(), price)?;
        Ok(BuildStep::new(
            "M0.TransferMLikeToken",
            UnsignedTransaction::Evm(tx),
        ))
    }

    async fn build_relay_request(
        &self,
        params: &TransferParams,
        quote: &ExecutorQuote,
    ) -> Result<BuildStep> {
        let entrypoint = self.spender()?.to_evm()?;
        let executor_args = ExecutorArgs {
            value: quote.estimated_cost,
            refundAddress: params.sender().to_evm()?,
            signedQuote: quote.signed_quote.clone(),
            instructions: quote.relay_instructions.clone(),
        };
        let recipient_chain = self.destination.chain.wormhole_chain_id();

        let input = if self.is_base_to_base(params)? {
            ExecutorEntrypoint::transferCall {
                amount: params.amount().units(),
                recipientChain: recipient_chain,
                recipient: params.recipient()?.to_fixed_bytes(),
                refundAddress: params.refund()?.to_fixed_bytes(),
                executorArgs: executor_args,
                transceiverInstructions: self.transceiver_instructions(),
            }
            .abi_encode()
        } else {
            ExecutorEntrypoint::transferMLikeTokenCall {
                amount: params.amount().units(),
                sourceToken: params.source_token().to_evm()?,
                destinationChainId: recipient_chain,
                destinationToken: params.destination_token()?.to_fixed_bytes(),
                recipient: params.recipient()?.to_fixed_bytes(),
                refundAddress: params.refund()?.to_fixed_bytes(),
                executorArgs: executor_args,
                transceiverInstructions: self.transceiver_instructions(),
            }
            .abi_encode()
        };

        let price = self.delivery_price().await?;
        let value = price.saturating_add(quote.estimated_cost);
        debug!(
            delivery_price = %price,
            executor_cost = %quote.estimated_cost,
            event = "executor_transfer_priced"
        );
        let tx = self.transaction(params, entrypoint, input, value)?;
        Ok(BuildStep::new(
            "M0.ExecutorTransfer",
            UnsignedTransaction::Evm(tx),
        ))
    }

    async fn build_transfer(&self, params: &TransferParams) -> Result<Vec<BuildStep>> {
        params.validate()?;
        let source_config = self.source.config();
        let sends_base = source_config.contracts.is_base_token(&params.source_token());
        if sends_base && !source_config.can_send_base_token {
            return Err(RouteError::UnsupportedToken {
                chain: self.source.chain(),
                token: params.source_token().to_native_string(self.source.chain()),
            });
        }
        let spender = self.spender()?;

        let mut steps = Vec::with_capacity(2);
        if let Some(approval) = self.build_approval(params, spender).await? {
            steps.push(approval);
        }

        let transfer = if self.uses_entrypoint() {
            self.build_relay_request(params, params.executor_quote()?)
                .await?
        } else if self.is_base_to_base(params)? {
            self.build_base_transfer(params).await?
        } else {
            self.build_extension_transfer(params).await?
        };
        steps.push(transfer);

        info!(
            source_chain = %self.source.chain(),
            destination_chain = %self.destination.chain,
            steps = steps.len(),
            via_entrypoint = self.uses_entrypoint(),
            event = "evm_transfer_built"
        );
        Ok(steps)
    }
}
