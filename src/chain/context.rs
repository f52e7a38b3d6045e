//! Per-chain context passed explicitly to every component.
//!
//! A [`ChainContext`] pairs the static [`ChainConfig`] of one chain with the
//! platform client used to read it. Contracts that live in on-chain state
//! (the SVM M mint) are resolved once and cached for the context's lifetime.

use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::registry::{ChainConfig, ContractSet};
use crate::contracts::svm::accounts::{AnchorAccount, PortalGlobal};
use crate::contracts::svm::pda;
use crate::error::{Result, RouteError};
use crate::protocol::{Chain, Network, Platform};
use crate::traits::{EvmChainReader, SvmAccountReader};

/// Chain-family-specific read access, selected by matching on the tag.
#[derive(Clone)]
pub enum PlatformClient {
    Evm(Arc<dyn EvmChainReader>),
    Svm(Arc<dyn SvmAccountReader>),
}

impl PlatformClient {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformClient::Evm(_) => Platform::Evm,
            PlatformClient::Svm(_) => Platform::Svm,
        }
    }
}

impl fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlatformClient::{}", self.platform())
    }
}

/// Configuration plus client of one (network, chain) pair.
#[derive(Debug)]
pub struct ChainContext {
    config: ChainConfig,
    client: Option<PlatformClient>,
    resolved: RwLock<Option<ContractSet>>,
}

impl ChainContext {
    /// Creates a context; `client` may be omitted for chains that are only
    /// used as destinations of pure lookups.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidConfig`] if the client's platform does not
    /// match the chain's.
    pub fn new(config: ChainConfig, client: Option<PlatformClient>) -> Result<Self> {
        if let Some(client) = &client {
            if client.platform() != config.platform() {
                return Err(RouteError::InvalidConfig(format!(
                    "{} client configured for {} chain {}",
                    client.platform(),
                    config.platform(),
                    config.chain
                )));
            }
        }
        Ok(Self {
            config,
            client,
            resolved: RwLock::new(None),
        })
    }

    pub fn chain(&self) -> Chain {
        self.config.chain
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn platform(&self) -> Platform {
        self.config.platform()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// The platform client, or [`RouteError::UnsupportedPlatform`] when none
    /// is configured.
    pub fn client(&self) -> Result<&PlatformClient> {
        self.client
            .as_ref()
            .ok_or(RouteError::UnsupportedPlatform { chain: self.chain() })
    }

    pub fn evm(&self) -> Result<&Arc<dyn EvmChainReader>> {
        match self.client()? {
            PlatformClient::Evm(reader) => Ok(reader),
            PlatformClient::Svm(_) => Err(RouteError::UnsupportedPlatform { chain: self.chain() }),
        }
    }

    pub fn svm(&self) -> Result<&Arc<dyn SvmAccountReader>> {
        match self.client()? {
            PlatformClient::Svm(reader) => Ok(reader),
            PlatformClient::Evm(_) => Err(RouteError::UnsupportedPlatform { chain: self.chain() }),
        }
    }

    /// The chain's contract set.
    ///
    /// EVM sets are static. On SVM the M mint is read from the portal's
    /// global account on first use, falling back to the configured mint when
    /// the account does not exist or no client is configured.
    pub async fn contracts(&self) -> Result<ContractSet> {
        if let Some(cached) = self.cached() {
            return Ok(cached);
        }

        let mut contracts = self.config.contracts.clone();
        if let (Platform::Svm, Some(PlatformClient::Svm(reader))) =
            (self.platform(), self.client.as_ref())
        {
            match reader.get_account_data(pda::portal_global()).await? {
                Some(data) => {
                    let global = PortalGlobal::decode(&data)?;
                    contracts.token = global.m_mint().into();
                    debug!(
                        chain = %self.chain(),
                        m_mint = %global.m_mint(),
                        event = "portal_global_resolved"
                    );
                }
                None => {
                    warn!(
                        chain = %self.chain(),
                        event = "portal_global_missing"
                    );
                }
            }
        }

        if let Ok(mut slot) = self.resolved.write() {
            *slot = Some(contracts.clone());
        }
        Ok(contracts)
    }

    fn cached(&self) -> Option<ContractSet> {
        self.resolved.read().ok().and_then(|slot| slot.clone())
    }
}
