use anchor_lang::prelude::*;

use crate::{
    error::RaffleError,
    state::raffle::{Raffle, RaffleState, EMPTY_ROOT},
};

/// Construction parameters for a raffle instance. Static and dynamic entry
/// are two configurations of the one state machine: a seeded `participants`
/// list with an empty Merkle root, or an empty list with a participant tree
/// root that gates `enter_raffle`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct RaffleParams {
    /// Number of winners drawn, fixed for the life of the instance
    pub winner_count: u32,
    /// Number of random values requested per draw; must equal `winner_count`
    pub randomness_batch_size: u32,
    /// Hard cap on the entrant registry, bounding the modulo reduction pool
    pub max_entrants: u32,
    /// Root of the participant tree, or all zeroes for the static variant
    pub merkle_root: [u8; 32],
    /// Pre-seeded ticket commitments (static variant only)
    pub participants: Vec<[u8; 32]>,
    /// The only identity allowed to deliver randomness fulfillments
    pub oracle_authority: Pubkey,
    /// Oracle subscription funding the randomness request
    pub subscription_id: u64,
    /// Oracle gas lane identifier
    pub key_hash: [u8; 32],
    /// Gas budget for the oracle callback
    pub callback_gas_limit: u32,
    /// Confirmations the oracle waits for before responding
    pub request_confirmations: u16,
}

/// Event emitted when a raffle is created
#[event]
pub struct RaffleCreated {
    /// The pubkey of the created raffle
    pub raffle: Pubkey,
    /// The operator allowed to close entries and request randomness
    pub operator: Pubkey,
    /// Number of winners this raffle will draw
    pub winner_count: u32,
    /// Registry capacity
    pub max_entrants: u32,
    /// Participant tree root (all zeroes for seeded raffles)
    pub merkle_root: [u8; 32],
    /// Number of participants seeded at creation
    pub seeded_participants: u32,
}

/// Instruction to create a new raffle instance
///
/// # Arguments
/// * `ctx` - The context object containing all required accounts
/// * `params` - Construction parameters, see [`RaffleParams`]
///
/// # Security Considerations
/// The instruction performs several critical checks:
/// 1. Validates winner_count is greater than 0
/// 2. Validates the randomness batch size equals winner_count, so one
///    fulfillment delivers exactly one value per winner
/// 3. Validates the registry cap can hold at least winner_count entrants
/// 4. Rejects a seeded participant list combined with a Merkle root, and a
///    dynamic raffle without one - the two entry modes are exclusive
/// 5. Seeds participants through the registry so commitment uniqueness and
///    the cap hold for seeded raffles too
///
/// # Implementation Notes
/// - The raffle account is a fresh keypair account sized from the registry
///   cap and winner count, so the registry can never outgrow its allocation
/// - The signer becomes the raffle operator
/// - Initializes the raffle in Open state with no outstanding request
pub fn init_raffle(ctx: Context<InitRaffle>, params: RaffleParams) -> Result<()> {
    require!(params.winner_count > 0, RaffleError::InvalidWinnerCount);
    require!(
        params.randomness_batch_size == params.winner_count,
        RaffleError::BadBatchSize
    );
    require!(
        params.max_entrants >= params.winner_count,
        RaffleError::InvalidRegistryCap
    );
    if params.participants.is_empty() {
        require!(
            params.merkle_root != EMPTY_ROOT,
            RaffleError::MissingMerkleRoot
        );
    } else {
        require!(
            params.merkle_root == EMPTY_ROOT,
            RaffleError::ConflictingEntryModes
        );
    }

    let raffle = &mut ctx.accounts.raffle;
    raffle.operator = ctx.accounts.operator.key();
    raffle.oracle_authority = params.oracle_authority;
    raffle.subscription_id = params.subscription_id;
    raffle.key_hash = params.key_hash;
    raffle.callback_gas_limit = params.callback_gas_limit;
    raffle.request_confirmations = params.request_confirmations;
    raffle.winner_count = params.winner_count;
    raffle.max_entrants = params.max_entrants;
    raffle.merkle_root = params.merkle_root;
    raffle.raffle_state = RaffleState::Open;
    raffle.pending_request = None;
    raffle.entrants = Vec::new();
    raffle.winners = Vec::new();

    for commitment in &params.participants {
        raffle.seed_participant(*commitment)?;
    }

    emit!(RaffleCreated {
        raffle: raffle.key(),
        operator: raffle.operator,
        winner_count: raffle.winner_count,
        max_entrants: raffle.max_entrants,
        merkle_root: raffle.merkle_root,
        seeded_participants: raffle.entrant_count(),
    });

    Ok(())
}

/// Accounts required for the init_raffle instruction
#[derive(Accounts)]
#[instruction(params: RaffleParams)]
pub struct InitRaffle<'info> {
    /// The raffle account being created; sized so the entrant registry and
    /// winner set fit at capacity
    #[account(
        init,
        payer = operator,
        space = Raffle::space(params.max_entrants, params.winner_count),
    )]
    pub raffle: Account<'info, Raffle>,

    /// The raffle operator, paying for the account
    #[account(mut)]
    pub operator: Signer<'info>,

    pub system_program: Program<'info, System>,
}
