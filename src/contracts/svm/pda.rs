//! Program-derived addresses of the SVM portal stack.

use solana_program::pubkey::Pubkey;

use crate::chain::addresses::{
    WormholeCoreAccounts, SVM_ASSOCIATED_TOKEN_PROGRAM, SVM_PORTAL_PROGRAM, SVM_SWAP_PROGRAM,
    SVM_WORMHOLE_ADAPTER_PROGRAM,
};

const GLOBAL_SEED: &[u8] = b"global";
const AUTHORITY_SEED: &[u8] = b"authority";
const CHAIN_PATHS_SEED: &[u8] = b"chain_paths";
const MESSAGE_SEED: &[u8] = b"message";
const EMITTER_SEED: &[u8] = b"emitter";
const SEQUENCE_SEED: &[u8] = b"Sequence";
const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";
const M_VAULT_SEED: &[u8] = b"m_vault";
const MINT_AUTHORITY_SEED: &[u8] = b"mint_authority";

fn find(seeds: &[&[u8]], program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(seeds, program).0
}

pub fn portal_global() -> Pubkey {
    find(&[GLOBAL_SEED], &SVM_PORTAL_PROGRAM)
}

pub fn portal_authority() -> Pubkey {
    find(&[AUTHORITY_SEED], &SVM_PORTAL_PROGRAM)
}

/// Bridge paths toward one destination, keyed by its M0 chain id.
pub fn chain_paths(destination_chain_id: u32) -> Pubkey {
    find(
        &[CHAIN_PATHS_SEED, &destination_chain_id.to_le_bytes()],
        &SVM_PORTAL_PROGRAM,
    )
}

/// Receipt the portal writes when it receives a message.
pub fn bridge_message(message_id: &[u8; 32]) -> Pubkey {
    find(&[MESSAGE_SEED, message_id], &SVM_PORTAL_PROGRAM)
}

pub fn swap_global() -> Pubkey {
    find(&[GLOBAL_SEED], &SVM_SWAP_PROGRAM)
}

pub fn extension_global(extension_program: &Pubkey) -> Pubkey {
    find(&[GLOBAL_SEED], extension_program)
}

pub fn extension_m_vault_authority(extension_program: &Pubkey) -> Pubkey {
    find(&[M_VAULT_SEED], extension_program)
}

pub fn extension_mint_authority(extension_program: &Pubkey) -> Pubkey {
    find(&[MINT_AUTHORITY_SEED], extension_program)
}

pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    find(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &SVM_ASSOCIATED_TOKEN_PROGRAM,
    )
}

pub fn wormhole_adapter_global() -> Pubkey {
    find(&[GLOBAL_SEED], &SVM_WORMHOLE_ADAPTER_PROGRAM)
}

/// Emitter address of every message the adapter posts.
pub fn wormhole_emitter() -> Pubkey {
    find(&[EMITTER_SEED], &SVM_WORMHOLE_ADAPTER_PROGRAM)
}

/// Core bridge sequence tracker of the adapter's emitter.
pub fn wormhole_sequence(core: &WormholeCoreAccounts) -> Pubkey {
    find(&[SEQUENCE_SEED, wormhole_emitter().as_ref()], &core.core)
}

pub fn shim_message(core: &WormholeCoreAccounts) -> Pubkey {
    find(&[wormhole_emitter().as_ref()], &core.shim)
}

pub fn shim_event_authority(core: &WormholeCoreAccounts) -> Pubkey {
    find(&[EVENT_AUTHORITY_SEED], &core.shim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::addresses::{
        FOGO_WORMHOLE_CORE_MAINNET, WORMHOLE_CORE_DEVNET, WORMHOLE_CORE_MAINNET,
    };
    use crate::protocol::{Chain, Network};

    #[test]
    fn test_pdas_are_deterministic_and_distinct() {
        assert_eq!(portal_global(), portal_global());
        assert_ne!(portal_global(), swap_global());
        assert_ne!(chain_paths(1), chain_paths(8453));
        assert_ne!(bridge_message(&[1; 32]), bridge_message(&[2; 32]));
    }

    #[test]
    fn test_sequence_depends_on_network() {
        assert_ne!(
            wormhole_sequence(&WORMHOLE_CORE_MAINNET),
            wormhole_sequence(&WORMHOLE_CORE_DEVNET)
        );
        // the shim is shared, so its PDAs are too
        assert_eq!(
            shim_message(&WORMHOLE_CORE_MAINNET),
            shim_message(&WORMHOLE_CORE_DEVNET)
        );
    }

    #[test]
    fn test_core_accounts_derive_from_core_program() {
        assert_eq!(
            WormholeCoreAccounts::derive(WORMHOLE_CORE_MAINNET.core),
            WORMHOLE_CORE_MAINNET
        );
        assert_eq!(WormholeCoreAccounts::derive(WORMHOLE_CORE_DEVNET.core), WORMHOLE_CORE_DEVNET);
    }

    #[test]
    fn test_fogo_has_its_own_core_accounts() {
        let fogo = WormholeCoreAccounts::for_chain(Chain::Fogo, Network::Mainnet);
        assert_eq!(fogo.core, FOGO_WORMHOLE_CORE_MAINNET);
        assert_ne!(fogo.config, WORMHOLE_CORE_MAINNET.config);
        assert_ne!(wormhole_sequence(&fogo), wormhole_sequence(&WORMHOLE_CORE_MAINNET));
        assert_eq!(
            WormholeCoreAccounts::for_chain(Chain::Solana, Network::Testnet),
            WORMHOLE_CORE_DEVNET
        );
    }

    #[test]
    fn test_associated_token_address_depends_on_token_program() {
        let owner = Pubkey::new_from_array([1; 32]);
        let mint = Pubkey::new_from_array([2; 32]);
        let a = associated_token_address(&owner, &mint, &Pubkey::new_from_array([3; 32]));
        let b = associated_token_address(&owner, &mint, &Pubkey::new_from_array([4; 32]));
        assert_ne!(a, b);
    }
}
