//! Chain-level configuration: deployment addresses, the contract registry,
//! per-chain contexts and bridge-path resolution.

pub mod addresses;
mod context;
mod paths;
mod registry;

pub use context::{ChainContext, PlatformClient};
pub use paths::{BridgePathResolver, ExtensionEntry, ExtensionTable};
pub use registry::{
    ChainConfig, ContractRegistry, ContractSet, DEFAULT_CAPACITY_WARNING_BPS,
    EVM_EXECUTOR_GAS_LIMIT, SVM_EXECUTOR_GAS_LIMIT, SVM_EXECUTOR_MSG_VALUE,
};
