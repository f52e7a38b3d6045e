//! M portal (NTT manager), Wormhole transceiver and executor entrypoint bindings
//!
//! The portal is an NTT manager extended with `transferMLikeToken`, which
//! unwraps an extension token to M and bridges it in one call. Executor
//! delivered transfers go through an entrypoint contract whose overloads take
//! an extra [`ExecutorArgs`] struct carrying the signed relay quote.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_sol_types::sol;
use tracing::debug;

use Portal::PortalInstance;
use WormholeTransceiver::WormholeTransceiverInstance;

/// Read-only wrapper over the portal
pub struct PortalContract<P: Provider<Ethereum>> {
    instance: PortalInstance<P>,
}

impl<P: Provider<Ethereum>> PortalContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "portal_contract_initialized"
        );
        Self {
            instance: PortalInstance::new(address, provider),
        }
    }

    /// Total native fee across transceivers for sending one message.
    pub async fn quote_delivery_price(
        &self,
        destination: u16,
        transceiver_instructions: Bytes,
    ) -> Result<U256, alloy_contract::Error> {
        let quote = self
            .instance
            .quoteDeliveryPrice(destination, transceiver_instructions)
            .call()
            .await?;

        debug!(
            destination = destination,
            delivery_price = %quote._1,
            transceiver_count = quote._0.len(),
            contract_address = %self.instance.address(),
            event = "delivery_price_quoted"
        );

        Ok(quote._1)
    }

    pub async fn rate_limit_duration(&self) -> Result<u64, alloy_contract::Error> {
        self.instance.rateLimitDuration().call().await
    }

    pub async fn current_inbound_capacity(
        &self,
        source: u16,
    ) -> Result<U256, alloy_contract::Error> {
        self.instance.getCurrentInboundCapacity(source).call().await
    }

    pub async fn is_message_approved(&self, digest: B256) -> Result<bool, alloy_contract::Error> {
        self.instance.isMessageApproved(digest).call().await
    }

    pub async fn is_message_executed(&self, digest: B256) -> Result<bool, alloy_contract::Error> {
        self.instance.isMessageExecuted(digest).call().await
    }
}

/// Read-only wrapper over the Wormhole transceiver
pub struct WormholeTransceiverContract<P: Provider<Ethereum>> {
    instance: WormholeTransceiverInstance<P>,
}

impl<P: Provider<Ethereum>> WormholeTransceiverContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: WormholeTransceiverInstance::new(address, provider),
        }
    }

    pub async fn is_relaying_enabled(
        &self,
        destination: u16,
    ) -> Result<bool, alloy_contract::Error> {
        let enabled = self
            .instance
            .isWormholeRelayingEnabled(destination)
            .call()
            .await?;
        debug!(
            destination = destination,
            enabled = enabled,
            contract_address = %self.instance.address(),
            event = "relaying_status_retrieved"
        );
        Ok(enabled)
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(all_derives)]
    struct ExecutorArgs {
        uint256 value;
        address refundAddress;
        bytes signedQuote;
        bytes instructions;
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Portal {
        function quoteDeliveryPrice(uint16 recipientChain, bytes memory transceiverInstructions)
            external view returns (uint256[] memory, uint256);
        function rateLimitDuration() external view returns (uint64);
        function getCurrentInboundCapacity(uint16 chainId) external view returns (uint256);
        function isMessageApproved(bytes32 digest) external view returns (bool);
        function isMessageExecuted(bytes32 digest) external view returns (bool);
        function transfer(
            uint256 amount,
            uint16 recipientChain,
            bytes32 recipient,
            bytes32 refundAddress,
            bool shouldQueue,
            bytes memory transceiverInstructions
        ) external payable returns (uint64);
        function transferMLikeToken(
            uint256 amount,
            address sourceToken,
            uint16 destinationChainId,
            bytes32 destinationToken,
            bytes32 recipient,
            bytes32 refundAddress
        ) external payable returns (uint64 sequence);
    }

    #[allow(missing_docs)]
    contract ExecutorEntrypoint {
        function transfer(
            uint256 amount,
            uint16 recipientChain,
            bytes32 recipient,
            bytes32 refundAddress,
            ExecutorArgs calldata executorArgs,
            bytes calldata transceiverInstructions
        ) external payable returns (uint64);
        function transferMLikeToken(
            uint256 amount,
            address sourceToken,
            uint16 destinationChainId,
            bytes32 destinationToken,
            bytes32 recipient,
            bytes32 refundAddress,
            ExecutorArgs calldata executorArgs,
            bytes calldata transceiverInstructions
        ) external payable returns (uint64);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    contract WormholeTransceiver {
        function isWormholeRelayingEnabled(uint16 chainId) external view returns (bool);
    }
);
