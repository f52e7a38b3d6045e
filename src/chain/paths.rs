//! Bridge-path resolution
//!
//! Decides which tokens can leave a chain and what each of them can become
//! on another chain. "Whitelisted" and "bridgeable" are distinct: an SVM
//! extension registered with the swap program is only offered as a source
//! once the portal holds at least one path for it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn, Instrument};

use super::context::ChainContext;
use super::registry::ContractRegistry;
use crate::chain::addresses::SVM_PORTAL_PROGRAM;
use crate::contracts::svm::accounts::{
    AnchorAccount, ChainBridgePaths, SwapGlobal, CHAIN_BRIDGE_PATHS_DISCRIMINATOR,
};
use crate::contracts::svm::instructions::ExtensionAccounts;
use crate::contracts::svm::pda;
use crate::error::Result;
use crate::protocol::{Chain, Platform, TokenId, UniversalAddress};
use crate::spans;

/// One source token and where it may go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub mint: UniversalAddress,
    /// Program accounts of an SVM extension; `None` on EVM.
    pub accounts: Option<ExtensionAccounts>,
    pub destinations: BTreeMap<Chain, BTreeSet<UniversalAddress>>,
}

impl ExtensionEntry {
    fn new(mint: UniversalAddress, accounts: Option<ExtensionAccounts>) -> Self {
        Self {
            mint,
            accounts,
            destinations: BTreeMap::new(),
        }
    }

    /// Whether at least one path leaves from this token.
    pub fn is_bridgeable(&self) -> bool {
        self.destinations.values().any(|tokens| !tokens.is_empty())
    }

    pub fn destinations_on(&self, chain: Chain) -> impl Iterator<Item = &UniversalAddress> {
        self.destinations.get(&chain).into_iter().flatten()
    }
}

/// Every whitelisted source token of one chain with its paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    pub chain: Chain,
    entries: BTreeMap<UniversalAddress, ExtensionEntry>,
}

impl ExtensionTable {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, mint: &UniversalAddress) -> Option<&ExtensionEntry> {
        self.entries.get(mint)
    }

    /// Whitelisted entries, bridgeable or not.
    pub fn whitelisted(&self) -> impl Iterator<Item = &ExtensionEntry> {
        self.entries.values()
    }

    pub fn bridgeable(&self) -> impl Iterator<Item = &ExtensionEntry> {
        self.entries.values().filter(|entry| entry.is_bridgeable())
    }
}

/// Discovers and caches bridge paths per chain.
///
/// Paths change only through administrative actions, so tables are kept
/// until [`refresh`](Self::refresh) or [`refresh_all`](Self::refresh_all).
#[derive(Debug)]
pub struct BridgePathResolver {
    registry: Arc<ContractRegistry>,
    cache: RwLock<HashMap<Chain, Arc<ExtensionTable>>>,
}

impl BridgePathResolver {
    pub fn new(registry: Arc<ContractRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The extension table of `context`'s chain, loading it on first use.
    pub async fn extensions(&self, context: &ChainContext) -> Result<Arc<ExtensionTable>> {
        if let Some(table) = self.cached(context.chain()) {
            return Ok(table);
        }

        let span = spans::resolve_bridge_paths(context.chain(), context.network());
        let table = async {
            match context.platform() {
                Platform::Evm => self.load_evm(context),
                Platform::Svm => self.load_svm(context).await,
            }
            .inspect_err(spans::record_error)
        }
        .instrument(span)
        .await?;

        let table = Arc::new(table);
        info!(
            chain = %context.chain(),
            whitelisted = table.whitelisted().count(),
            bridgeable = table.bridgeable().count(),
            event = "bridge_paths_resolved"
        );
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(context.chain(), table.clone());
        }
        Ok(table)
    }

    /// Tokens that can be sent from `context`'s chain: the base token when
    /// the chain may send it, plus every extension with at least one path.
    pub async fn supported_source_tokens(&self, context: &ChainContext) -> Result<Vec<TokenId>> {
        let contracts = context.contracts().await?;
        let table = self.extensions(context).await?;

        let mut tokens = Vec::new();
        if context.config().can_send_base_token {
            tokens.push(TokenId::new(context.chain(), contracts.token));
        }
        tokens.extend(
            table
                .bridgeable()
                .filter(|entry| entry.mint != contracts.token)
                .map(|entry| TokenId::new(context.chain(), entry.mint)),
        );
        Ok(tokens)
    }

    /// Tokens `source` can arrive as on `to`'s chain.
    ///
    /// Empty when `source` is not a supported source token of `from`.
    pub async fn supported_destination_tokens(
        &self,
        source: &TokenId,
        from: &ChainContext,
        to: &ChainContext,
    ) -> Result<Vec<TokenId>> {
        if source.chain != from.chain() || from.chain() == to.chain() {
            return Ok(Vec::new());
        }
        let sources = self.supported_source_tokens(from).await?;
        if !sources.iter().any(|token| token.address == source.address) {
            debug!(
                token = %source,
                event = "source_token_not_supported"
            );
            return Ok(Vec::new());
        }

        let mut tokens = Vec::new();
        if to.config().can_receive_base_token {
            tokens.push(TokenId::new(to.chain(), to.contracts().await?.token));
        }

        let table = self.extensions(from).await?;
        if let Some(entry) = table.get(&source.address) {
            for address in entry.destinations_on(to.chain()) {
                let token = TokenId::new(to.chain(), *address);
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
        }
        Ok(tokens)
    }

    /// Drops the cached table of one chain.
    pub fn refresh(&self, chain: Chain) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(&chain);
        }
        debug!(chain = %chain, event = "bridge_paths_invalidated");
    }

    pub fn refresh_all(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        debug!(event = "bridge_paths_invalidated_all");
    }

    fn cached(&self, chain: Chain) -> Option<Arc<ExtensionTable>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&chain).cloned())
    }

    /// EVM paths are static: the base token and every extension reach every
    /// extension of every other supported chain.
    fn load_evm(&self, context: &ChainContext) -> Result<ExtensionTable> {
        let network = context.network();
        let local = &context.config().contracts;

        let mut remote = BTreeMap::new();
        for chain in self.registry.supported_chains(network) {
            if chain == context.chain() {
                continue;
            }
            let contracts = self.registry.get_contracts(network, chain)?;
            let extensions: BTreeSet<UniversalAddress> =
                contracts.extensions.iter().copied().collect();
            remote.insert(chain, extensions);
        }

        let mut table = ExtensionTable::new(context.chain());
        for mint in std::iter::once(&local.token).chain(&local.extensions) {
            let mut entry = ExtensionEntry::new(*mint, None);
            entry.destinations = remote.clone();
            table.entries.insert(*mint, entry);
        }
        Ok(table)
    }

    /// SVM paths come from the swap program's whitelist and the portal's
    /// per-destination path accounts.
    async fn load_svm(&self, context: &ChainContext) -> Result<ExtensionTable> {
        let reader = context.svm()?;
        let network = context.network();
        let mut table = ExtensionTable::new(context.chain());

        let Some(data) = reader.get_account_data(pda::swap_global()).await? else {
            warn!(chain = %context.chain(), event = "swap_global_missing");
            return Ok(table);
        };
        let swap_global = SwapGlobal::decode(&data)?;
        for extension in &swap_global.whitelisted_extensions {
            let accounts = ExtensionAccounts {
                program_id: extension.program_id(),
                mint: extension.mint(),
                token_program: extension.token_program(),
            };
            let mint = UniversalAddress::from(extension.mint());
            table
                .entries
                .insert(mint, ExtensionEntry::new(mint, Some(accounts)));
        }

        let path_accounts = reader
            .get_program_accounts(SVM_PORTAL_PROGRAM, CHAIN_BRIDGE_PATHS_DISCRIMINATOR)
            .await?;
        for (address, data) in path_accounts {
            let paths = ChainBridgePaths::decode(&data)?;
            let Some(destination) = Chain::from_m0_chain_id(paths.destination_chain_id, network)
            else {
                debug!(
                    account = %address,
                    destination_chain_id = paths.destination_chain_id,
                    event = "bridge_paths_unknown_destination"
                );
                continue;
            };

            for path in &paths.paths {
                let source = UniversalAddress::new(path.source_mint);
                let Some(entry) = table.entries.get_mut(&source) else {
                    warn!(
                        source_mint = %source.to_pubkey(),
                        destination = %destination,
                        event = "bridge_path_from_unlisted_mint"
                    );
                    continue;
                };
                entry
                    .destinations
                    .entry(destination)
                    .or_default()
                    .insert(UniversalAddress::new(path.destination_token));
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::addresses::{EVM_M_TOKEN, EVM_WRAPPED_M_TOKEN, SVM_WRAPPED_M_MINT};
    use crate::chain::context::PlatformClient;
    use crate::chain::registry::ChainConfig;
    use crate::config::RouteConfig;
    use crate::protocol::Network;
    use crate::testing::{FakeEvmChain, FakeSvmChain};
    use solana_program::pubkey::Pubkey;

    const UNPATHED_MINT: Pubkey = Pubkey::new_from_array([77; 32]);

    fn registry() -> Arc<ContractRegistry> {
        Arc::new(ContractRegistry::initialize(&RouteConfig::default()))
    }

    fn evm_context(chain: Chain) -> ChainContext {
        ChainContext::new(
            ChainConfig::default_for(chain, Network::Mainnet),
            Some(PlatformClient::Evm(Arc::new(FakeEvmChain::new()))),
        )
        .unwrap()
    }

    fn svm_context(svm: Arc<FakeSvmChain>) -> ChainContext {
        svm_context_on(Chain::Solana, svm)
    }

    fn svm_context_on(chain: Chain, svm: Arc<FakeSvmChain>) -> ChainContext {
        ChainContext::new(
            ChainConfig::default_for(chain, Network::Mainnet),
            Some(PlatformClient::Svm(svm)),
        )
        .unwrap()
    }

    fn svm_with_paths() -> Arc<FakeSvmChain> {
        let svm = Arc::new(FakeSvmChain::new());
        svm.whitelist_extension(SVM_WRAPPED_M_MINT);
        svm.whitelist_extension(UNPATHED_MINT);
        svm.add_bridge_paths(
            Chain::Base.m0_chain_id(Network::Mainnet).unwrap(),
            &[(SVM_WRAPPED_M_MINT, EVM_WRAPPED_M_TOKEN.into())],
        );
        svm
    }

    #[tokio::test]
    async fn test_evm_source_tokens() {
        let resolver = BridgePathResolver::new(registry());
        let tokens = resolver
            .supported_source_tokens(&evm_context(Chain::Base))
            .await
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenId::new(Chain::Base, EVM_M_TOKEN),
                TokenId::new(Chain::Base, EVM_WRAPPED_M_TOKEN)
            ]
        );
    }

    #[tokio::test]
    async fn test_evm_to_svm_destinations_omit_base_token() {
        let resolver = BridgePathResolver::new(registry());
        let base = evm_context(Chain::Base);
        let solana = svm_context(svm_with_paths());
        let tokens = resolver
            .supported_destination_tokens(&TokenId::new(Chain::Base, EVM_M_TOKEN), &base, &solana)
            .await
            .unwrap();
        assert_eq!(tokens, vec![TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT)]);
    }

    #[tokio::test]
    async fn test_evm_to_evm_destinations_include_base_token() {
        let resolver = BridgePathResolver::new(registry());
        let tokens = resolver
            .supported_destination_tokens(
                &TokenId::new(Chain::Base, EVM_WRAPPED_M_TOKEN),
                &evm_context(Chain::Base),
                &evm_context(Chain::Arbitrum),
            )
            .await
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenId::new(Chain::Arbitrum, EVM_M_TOKEN),
                TokenId::new(Chain::Arbitrum, EVM_WRAPPED_M_TOKEN)
            ]
        );
    }

    #[tokio::test]
    async fn test_svm_extension_without_paths_is_not_a_source() {
        let resolver = BridgePathResolver::new(registry());
        let solana = svm_context(svm_with_paths());

        let table = resolver.extensions(&solana).await.unwrap();
        assert_eq!(table.whitelisted().count(), 2);

        let tokens = resolver.supported_source_tokens(&solana).await.unwrap();
        assert_eq!(tokens, vec![TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT)]);
    }

    #[tokio::test]
    async fn test_unsupported_source_has_no_destinations() {
        let resolver = BridgePathResolver::new(registry());
        let solana = svm_context(svm_with_paths());
        let base = evm_context(Chain::Base);

        for token in [
            TokenId::new(Chain::Solana, UNPATHED_MINT),
            TokenId::new(Chain::Solana, Pubkey::new_from_array([1; 32])),
            TokenId::new(Chain::Base, EVM_M_TOKEN),
        ] {
            let tokens = resolver
                .supported_destination_tokens(&token, &solana, &base)
                .await
                .unwrap();
            assert!(tokens.is_empty(), "{token} should have no destinations");
        }
    }

    #[tokio::test]
    async fn test_svm_to_evm_destinations() {
        let resolver = BridgePathResolver::new(registry());
        let solana = svm_context(svm_with_paths());
        let tokens = resolver
            .supported_destination_tokens(
                &TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT),
                &solana,
                &evm_context(Chain::Base),
            )
            .await
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenId::new(Chain::Base, EVM_M_TOKEN),
                TokenId::new(Chain::Base, EVM_WRAPPED_M_TOKEN)
            ]
        );

        // no path toward Arbitrum beyond the base token
        let tokens = resolver
            .supported_destination_tokens(
                &TokenId::new(Chain::Solana, SVM_WRAPPED_M_MINT),
                &solana,
                &evm_context(Chain::Arbitrum),
            )
            .await
            .unwrap();
        assert_eq!(tokens, vec![TokenId::new(Chain::Arbitrum, EVM_M_TOKEN)]);
    }

    #[tokio::test]
    async fn test_tables_are_cached_until_refresh() {
        let resolver = BridgePathResolver::new(registry());
        let svm = svm_with_paths();
        let solana = svm_context(svm.clone());

        resolver.extensions(&solana).await.unwrap();
        resolver.extensions(&solana).await.unwrap();
        assert_eq!(svm.program_account_queries(), 1);

        resolver.refresh(Chain::Solana);
        resolver.extensions(&solana).await.unwrap();
        assert_eq!(svm.program_account_queries(), 2);

        resolver.refresh_all();
        resolver.extensions(&solana).await.unwrap();
        assert_eq!(svm.program_account_queries(), 3);
    }

    #[tokio::test]
    async fn test_each_svm_chain_has_its_own_table() {
        let resolver = BridgePathResolver::new(registry());
        let solana_chain = svm_with_paths();
        let fogo_chain = Arc::new(FakeSvmChain::new());
        fogo_chain.whitelist_extension(UNPATHED_MINT);
        let solana = svm_context(solana_chain.clone());
        let fogo = svm_context_on(Chain::Fogo, fogo_chain.clone());

        let solana_table = resolver.extensions(&solana).await.unwrap();
        let fogo_table = resolver.extensions(&fogo).await.unwrap();

        assert_eq!(fogo_table.chain, Chain::Fogo);
        assert_eq!(solana_table.whitelisted().count(), 2);
        assert_eq!(fogo_table.whitelisted().count(), 1);
        assert_eq!(fogo_table.bridgeable().count(), 0);

        resolver.refresh(Chain::Fogo);
        resolver.extensions(&solana).await.unwrap();
        resolver.extensions(&fogo).await.unwrap();
        assert_eq!(solana_chain.program_account_queries(), 1);
        assert_eq!(fogo_chain.program_account_queries(), 2);
    }
}
