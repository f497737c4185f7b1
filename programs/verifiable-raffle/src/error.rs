use anchor_lang::error_code;

#[error_code]
pub enum RaffleError {
    #[msg("Only the raffle operator may perform this action")]
    Unauthorized,
    #[msg("Operation is not valid in the current raffle state")]
    InvalidTransition,
    #[msg("Raffle has already completed")]
    RaffleAlreadyComplete,
    #[msg("Randomness for this raffle was already consumed")]
    AlreadyFulfilled,
    #[msg("A randomness request is already outstanding")]
    RequestAlreadyPending,
    #[msg("Ticket commitment is not part of the participant tree")]
    NotEligible,
    #[msg("Commitment or identity has already entered this raffle")]
    DuplicateEntry,
    #[msg("Entrant registry has reached its capacity")]
    RegistryFull,
    #[msg("Request id does not match the outstanding randomness request")]
    UnknownRequest,
    #[msg("Randomness batch size does not match the winner count")]
    BadBatchSize,
    #[msg("Cannot close entries on an empty pool")]
    EmptyPool,
    #[msg("Not enough entrants to draw the configured number of winners")]
    InsufficientPool,
    #[msg("Winner count must be greater than zero")]
    InvalidWinnerCount,
    #[msg("Registry capacity must be at least the winner count")]
    InvalidRegistryCap,
    #[msg("A merkle root is required when no participants are seeded")]
    MissingMerkleRoot,
    #[msg("Seeded participants cannot be combined with a merkle root")]
    ConflictingEntryModes,
    #[msg("Raffle participants were fixed at creation")]
    ParticipantsSealed,
    Overflow,
}
