// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! ERC20 contract bindings for approval, allowance and metadata reads
//!
//! Portal transfers pull tokens with `transferFrom`, so the sender must have
//! approved the portal (or the relay entrypoint) beforehand.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use Erc20::Erc20Instance;

/// ERC20 contract wrapper for reads
///
/// # Example
///
/// ```rust,no_run
/// use m0_route::Erc20Contract;
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8545").await?;
/// let wrapped_m = address!("437cc33344a0B27A429f795ff6B469C72698B291");
///
/// let erc20 = Erc20Contract::new(wrapped_m, provider);
/// let decimals = erc20.decimals().await?;
/// # Ok(())
/// # }
/// ```
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "erc20_contract_initialized"
        );
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    /// Returns the amount of tokens that `spender` may move on behalf of `owner`.
    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, alloy_contract::Error> {
        debug!(
            owner = %owner,
            spender = %spender,
            contract_address = %self.instance.address(),
            event = "checking_allowance"
        );

        let result = self.instance.allowance(owner, spender).call().await?;

        debug!(
            owner = %owner,
            spender = %spender,
            allowance = %result,
            contract_address = %self.instance.address(),
            event = "allowance_retrieved"
        );

        Ok(result)
    }

    pub async fn decimals(&self) -> Result<u8, alloy_contract::Error> {
        let decimals = self.instance.decimals().call().await?;
        debug!(
            decimals = decimals,
            contract_address = %self.instance.address(),
            event = "decimals_retrieved"
        );
        Ok(decimals)
    }
}

/// Creates an unsigned `approve(spender, amount)` transaction.
///
/// The caller is responsible for signing and sending the transaction.
pub fn approve_transaction(
    token: Address,
    from: Address,
    spender: Address,
    amount: U256,
) -> TransactionRequest {
    info!(
        from = %from,
        spender = %spender,
        amount = %amount,
        contract_address = %token,
        event = "approve_transaction_created"
    );

    let call = Erc20::approveCall { spender, amount };
    TransactionRequest::default()
        .from(from)
        .to(token)
        .input(call.abi_encode().into())
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
);
