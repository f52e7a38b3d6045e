//! Alloy-based EVM chain reader.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use async_trait::async_trait;
use tracing::Instrument;

use crate::contracts::erc20::Erc20Contract;
use crate::contracts::portal::{PortalContract, WormholeTransceiverContract};
use crate::error::Result;
use crate::protocol::Chain;
use crate::spans;
use crate::traits::EvmChainReader;

/// Production EVM reader wrapping Alloy's [`Provider`] trait.
///
/// Every call goes through the contract bindings in [`crate::contracts`] and
/// runs inside an `m0_route.rpc_call` span tagged with the chain.
///
/// # Examples
///
/// ```rust,no_run
/// use m0_route::providers::AlloyEvmReader;
/// use m0_route::Chain;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://mainnet.base.org")
///     .await?;
///
/// let reader = AlloyEvmReader::new(Chain::Base, provider);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlloyEvmReader<P>
where
    P: Provider<Ethereum> + Clone,
{
    chain: Chain,
    provider: P,
}

impl<P> AlloyEvmReader<P>
where
    P: Provider<Ethereum> + Clone,
{
    pub fn new(chain: Chain, provider: P) -> Self {
        Self { chain, provider }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Returns a reference to the underlying Alloy provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }

    fn portal(&self, manager: Address) -> PortalContract<P> {
        PortalContract::new(manager, self.provider.clone())
    }
}

#[async_trait]
impl<P> EvmChainReader for AlloyEvmReader<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
{
    async fn decimals(&self, token: Address) -> Result<u8> {
        let erc20 = Erc20Contract::new(token, self.provider.clone());
        Ok(erc20
            .decimals()
            .instrument(spans::rpc_call("decimals", self.chain))
            .await?)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let erc20 = Erc20Contract::new(token, self.provider.clone());
        Ok(erc20
            .allowance(owner, spender)
            .instrument(spans::rpc_call("allowance", self.chain))
            .await?)
    }

    async fn quote_delivery_price(
        &self,
        manager: Address,
        destination: u16,
        transceiver_instructions: Bytes,
    ) -> Result<U256> {
        Ok(self
            .portal(manager)
            .quote_delivery_price(destination, transceiver_instructions)
            .instrument(spans::rpc_call("quoteDeliveryPrice", self.chain))
            .await?)
    }

    async fn is_relaying_enabled(&self, transceiver: Address, destination: u16) -> Result<bool> {
        let contract = WormholeTransceiverContract::new(transceiver, self.provider.clone());
        Ok(contract
            .is_relaying_enabled(destination)
            .instrument(spans::rpc_call("isWormholeRelayingEnabled", self.chain))
            .await?)
    }

    async fn rate_limit_duration(&self, manager: Address) -> Result<u64> {
        Ok(self
            .portal(manager)
            .rate_limit_duration()
            .instrument(spans::rpc_call("rateLimitDuration", self.chain))
            .await?)
    }

    async fn current_inbound_capacity(&self, manager: Address, source: u16) -> Result<U256> {
        Ok(self
            .portal(manager)
            .current_inbound_capacity(source)
            .instrument(spans::rpc_call("getCurrentInboundCapacity", self.chain))
            .await?)
    }

    async fn is_message_approved(&self, manager: Address, digest: B256) -> Result<bool> {
        Ok(self
            .portal(manager)
            .is_message_approved(digest)
            .instrument(spans::rpc_call("isMessageApproved", self.chain))
            .await?)
    }

    async fn is_message_executed(&self, manager: Address, digest: B256) -> Result<bool> {
        Ok(self
            .portal(manager)
            .is_message_executed(digest)
            .instrument(spans::rpc_call("isMessageExecuted", self.chain))
            .await?)
    }
}
