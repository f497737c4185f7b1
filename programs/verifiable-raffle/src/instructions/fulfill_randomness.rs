use anchor_lang::prelude::*;

use crate::{
    error::RaffleError,
    state::raffle::Raffle,
};

/// Event emitted when the winner set is finalized
#[event]
pub struct WinnersSelected {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// The request the delivered randomness answered
    pub request_id: u64,
    /// Winner indices into the entrant registry, in draw order
    pub winners: Vec<u32>,
}

/// Instruction through which randomness enters the system. Invoked by the
/// oracle collaborator, not by end users, in answer to a
/// `RandomnessRequested` event. In tests the oracle is mocked by signing
/// with the configured oracle authority and passing chosen values.
///
/// # Arguments
/// * `ctx` - The context object containing the raffle and oracle authority
/// * `request_id` - Correlation id of the request being answered
/// * `randomness` - Exactly one independent 256-bit value per winner
///
/// # Security Considerations
/// 1. Only the oracle authority configured at creation may deliver values
///    (`has_one` constraint)
/// 2. The request id must match the single outstanding request and the batch
///    size must match the winner count; mismatched deliveries are dropped
///    with no state change
/// 3. Exactly one delivery ever succeeds - once Complete, every further
///    call is rejected, so winners are determined only once
///
/// # Implementation Notes
/// - Winner selection runs against the registry size at fulfillment time;
///   if the pool cannot cover the winner count the whole transition fails
///   and the raffle stays in PendingRandomness with no remediation path
pub fn fulfill_randomness(
    ctx: Context<FulfillRandomness>,
    request_id: u64,
    randomness: Vec<[u8; 32]>,
) -> Result<()> {
    let raffle = &mut ctx.accounts.raffle;

    raffle.fulfill(request_id, &randomness)?;

    emit!(WinnersSelected {
        raffle: raffle.key(),
        request_id,
        winners: raffle.winners().to_vec(),
    });

    Ok(())
}

/// Accounts required for the fulfill_randomness instruction
#[derive(Accounts)]
pub struct FulfillRandomness<'info> {
    /// The raffle account awaiting randomness
    #[account(
        mut,
        has_one = oracle_authority @ RaffleError::Unauthorized,
    )]
    pub raffle: Account<'info, Raffle>,

    /// The oracle authority configured at raffle creation
    pub oracle_authority: Signer<'info>,
}
