use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak;

use crate::{
    error::RaffleError,
    state::raffle::Raffle,
};

/// Event emitted when an entrant is admitted to a raffle
#[event]
pub struct RaffleEntered {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The entrant's address
    pub entrant: Pubkey,
    /// The entrant's ticket commitment
    pub commitment: [u8; 32],
    /// Registry index assigned to the entrant; winners are drawn over these
    pub index: u32,
}

/// Instruction to enter a dynamically gated raffle
///
/// # Arguments
/// * `ctx` - The context object containing the raffle account and entrant
/// * `commitment` - keccak256 hash of the entrant's ticket secret
/// * `proof` - Merkle proof that the commitment is a leaf of the raffle's
///   participant tree
///
/// # Security Considerations
/// The instruction performs several critical checks:
/// 1. Rejects entry into statically seeded raffles, whose participant set
///    was fixed at creation
/// 2. Verifies the Merkle proof against the configured root before admission
///    is attempted; any proof failure is a plain rejection, indistinguishable
///    between "wrong proof" and "malformed input"
/// 3. The registry enforces the entry window, commitment and identity
///    uniqueness, and the capacity cap
///
/// # Implementation Notes
/// - The commitment is submitted in place of the ticket secret, so entering
///   reveals nothing about the ticket itself
/// - The assigned registry index, not the identity, is what the draw
///   operates on
pub fn enter_raffle(
    ctx: Context<EnterRaffle>,
    commitment: [u8; 32],
    proof: Vec<[u8; 32]>,
) -> Result<()> {
    let entrant = ctx.accounts.entrant.key();
    let raffle = &mut ctx.accounts.raffle;

    require!(!raffle.is_static(), RaffleError::ParticipantsSealed);
    require!(
        verify_merkle_proof(commitment, &proof, raffle.merkle_root),
        RaffleError::NotEligible
    );

    let index = raffle.admit(entrant, commitment)?;

    emit!(RaffleEntered {
        raffle: raffle.key(),
        entrant,
        commitment,
        index,
    });

    Ok(())
}

/// Verifies that `leaf` belongs to the tree committed to by `root`.
///
/// Siblings are combined with the sorted-pair rule: the two hashes are
/// ordered ascending before hashing, so proofs carry no left/right position
/// bits. This must match the tree-construction side exactly (merkletreejs
/// with `sortPairs`, OpenZeppelin MerkleProof) or every proof fails.
///
/// An empty proof is valid only for a single-leaf tree, where the leaf is
/// the root.
pub fn verify_merkle_proof(leaf: [u8; 32], proof: &[[u8; 32]], root: [u8; 32]) -> bool {
    let mut computed = leaf;
    for sibling in proof {
        computed = hash_sorted_pair(&computed, sibling);
    }
    computed == root
}

pub fn hash_sorted_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    if a <= b {
        keccak::hashv(&[a.as_slice(), b.as_slice()]).to_bytes()
    } else {
        keccak::hashv(&[b.as_slice(), a.as_slice()]).to_bytes()
    }
}

/// Accounts required for the enter_raffle instruction
#[derive(Accounts)]
pub struct EnterRaffle<'info> {
    /// The raffle account being entered
    #[account(mut)]
    pub raffle: Account<'info, Raffle>,

    /// The entrant submitting a ticket commitment; one entry per identity
    pub entrant: Signer<'info>,
}
