use anchor_lang::prelude::*;
use instructions::*;

pub mod error;
pub mod instructions;
pub mod state;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod verifiable_raffle {
    use super::*;

    pub fn init_raffle(ctx: Context<InitRaffle>, params: RaffleParams) -> Result<()> {
        instructions::init_raffle::init_raffle(ctx, params)
    }

    pub fn enter_raffle(
        ctx: Context<EnterRaffle>,
        commitment: [u8; 32],
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::enter_raffle::enter_raffle(ctx, commitment, proof)
    }

    /// Closes the entry window and requests randomness for a dynamically
    /// gated raffle.
    pub fn start_raffle(ctx: Context<StartRaffle>) -> Result<()> {
        instructions::start_raffle::start_raffle(ctx)
    }

    /// The statically seeded variant's spelling of the same close-and-request
    /// step: the pool was fixed at creation, so one call runs the raffle up
    /// to the point the oracle answers.
    pub fn run_raffle(ctx: Context<StartRaffle>) -> Result<()> {
        instructions::start_raffle::start_raffle(ctx)
    }

    pub fn fulfill_randomness(
        ctx: Context<FulfillRandomness>,
        request_id: u64,
        randomness: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::fulfill_randomness::fulfill_randomness(ctx, request_id, randomness)
    }
}
