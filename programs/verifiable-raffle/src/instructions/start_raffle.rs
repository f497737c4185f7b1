use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak;
use arrayref::array_ref;

use crate::{
    error::RaffleError,
    state::raffle::Raffle,
};

/// Event emitted when entries close and randomness is requested. The oracle
/// collaborator watches for this event and answers through the
/// `fulfill_randomness` instruction, correlated by `request_id`.
#[event]
pub struct RandomnessRequested {
    /// The pubkey of the raffle
    pub raffle: Pubkey,
    /// Identifier correlating this request with its fulfillment
    pub request_id: u64,
    /// Number of 256-bit values requested, one per winner
    pub batch_size: u32,
    /// Oracle subscription funding the request
    pub subscription_id: u64,
    /// Oracle gas lane identifier
    pub key_hash: [u8; 32],
    /// Gas budget for the oracle callback
    pub callback_gas_limit: u32,
    /// Confirmations the oracle waits for before responding
    pub request_confirmations: u16,
    /// Number of entrants the draw will run over
    pub pool_size: u32,
}

/// Instruction to close the entry window and request randomness. This is the
/// atomic close-and-request step of the lifecycle: `Open -> Closed ->
/// PendingRandomness` happens in one call, and once it succeeds there is no
/// path back to Open. Exposed under two names, `start_raffle` for
/// dynamically gated raffles and `run_raffle` for seeded ones; both run this
/// handler.
///
/// # Security Considerations
/// 1. Only the raffle operator may close entries (`has_one` constraint)
/// 2. An empty pool cannot be closed
/// 3. At most one randomness request is ever outstanding; the lack of any
///    cancellation path prevents the operator from re-rolling a pending
///    request that looks unfavorable
///
/// # Implementation Notes
/// - The request id is derived from the raffle key, the current slot, and
///   the pool size, and recorded before the event is emitted; fulfillments
///   carrying any other id are rejected
pub fn start_raffle(ctx: Context<StartRaffle>) -> Result<()> {
    let raffle = &mut ctx.accounts.raffle;

    let clock = Clock::get()?;
    let request_id = derive_request_id(&raffle.key(), clock.slot, raffle.entrant_count());

    raffle.close_and_request(request_id)?;

    emit!(RandomnessRequested {
        raffle: raffle.key(),
        request_id,
        batch_size: raffle.winner_count,
        subscription_id: raffle.subscription_id,
        key_hash: raffle.key_hash,
        callback_gas_limit: raffle.callback_gas_limit,
        request_confirmations: raffle.request_confirmations,
        pool_size: raffle.entrant_count(),
    });

    Ok(())
}

/// Correlation id for the oracle round trip, folded down from a keccak256
/// digest of the raffle key, the slot the request was made in, and the final
/// pool size.
fn derive_request_id(raffle: &Pubkey, slot: u64, pool_size: u32) -> u64 {
    let digest = keccak::hashv(&[
        raffle.as_ref(),
        &slot.to_le_bytes(),
        &pool_size.to_le_bytes(),
    ])
    .to_bytes();
    u64::from_le_bytes(*array_ref![digest, 0, 8])
}

/// Accounts required for the start_raffle and run_raffle instructions
#[derive(Accounts)]
pub struct StartRaffle<'info> {
    /// The raffle account whose entry window is being closed
    #[account(
        mut,
        has_one = operator @ RaffleError::Unauthorized,
    )]
    pub raffle: Account<'info, Raffle>,

    /// The raffle operator
    pub operator: Signer<'info>,
}
