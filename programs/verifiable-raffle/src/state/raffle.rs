use anchor_lang::prelude::*;

use crate::error::RaffleError;

/// Sentinel root for statically seeded raffles. A raffle either carries a
/// participant tree root (dynamic entry) or a seeded participant list, never
/// both.
pub const EMPTY_ROOT: [u8; 32] = [0u8; 32];

// 32 (identity) + 32 (commitment)
pub const ENTRANT_SIZE: usize = 32 + 32;

/// Lifecycle tag for a raffle instance. Transitions only ever move forward:
/// Open -> Closed -> PendingRandomness -> Complete. `Closed` is the transient
/// mid-point of the atomic close-and-request step and is never observable
/// between transactions. `Complete` is terminal.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RaffleState {
    Open = 0,
    Closed = 1,
    PendingRandomness = 2,
    Complete = 3,
}

/// A single admitted participant. The commitment is the keccak256 hash of the
/// participant's ticket secret; the identity is the signer that submitted it
/// (`Pubkey::default()` for participants seeded at creation, which have no
/// submitter). The position of an entrant in the registry is the index
/// winners are drawn over.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Entrant {
    pub identity: Pubkey,
    pub commitment: [u8; 32],
}

#[account]
pub struct Raffle {
    /// the only identity allowed to close entries and request randomness (32)
    pub operator: Pubkey,
    /// the only identity allowed to deliver randomness fulfillments (32)
    pub oracle_authority: Pubkey,
    /// oracle subscription funding the request (8)
    pub subscription_id: u64,
    /// oracle gas lane identifier, passed through in the request event (32)
    pub key_hash: [u8; 32],
    /// gas budget for the oracle callback (4)
    pub callback_gas_limit: u32,
    /// confirmations the oracle waits for before responding (2)
    pub request_confirmations: u16,
    /// number of winners drawn, fixed for the life of the instance (4)
    pub winner_count: u32,
    /// hard cap on the entrant registry (4)
    pub max_entrants: u32,
    /// participant tree root; EMPTY_ROOT for the statically seeded variant (32)
    pub merkle_root: [u8; 32],
    /// lifecycle tag (1)
    pub raffle_state: RaffleState,
    /// the single outstanding randomness request, if any (1 + 8)
    pub pending_request: Option<u64>,
    /// admitted entrants in insertion order (4 + 64 * max_entrants)
    pub entrants: Vec<Entrant>,
    /// winner indices in draw order; empty until Complete (4 + 4 * winner_count)
    pub winners: Vec<u32>,
}

impl Raffle {
    pub fn space(max_entrants: u32, winner_count: u32) -> usize {
        8 // discriminator
            + 32 // operator
            + 32 // oracle_authority
            + 8 // subscription_id
            + 32 // key_hash
            + 4 // callback_gas_limit
            + 2 // request_confirmations
            + 4 // winner_count
            + 4 // max_entrants
            + 32 // merkle_root
            + 1 // raffle_state
            + 9 // pending_request
            + 4 + max_entrants as usize * ENTRANT_SIZE // entrants
            + 4 + winner_count as usize * 4 // winners
    }

    /// True when the participant set was fixed at creation instead of being
    /// gated by Merkle proofs.
    pub fn is_static(&self) -> bool {
        self.merkle_root == EMPTY_ROOT
    }

    pub fn entrant_count(&self) -> u32 {
        self.entrants.len() as u32
    }

    pub fn entrant_at(&self, index: u32) -> Option<&Entrant> {
        self.entrants.get(index as usize)
    }

    /// Winner indices into the entrant registry, in draw order. Empty until
    /// the raffle is Complete. Callers that need a canonical ordering must
    /// sort explicitly.
    pub fn winners(&self) -> &[u32] {
        &self.winners
    }

    fn ensure_not_complete(&self) -> Result<()> {
        require!(
            self.raffle_state != RaffleState::Complete,
            RaffleError::RaffleAlreadyComplete
        );
        Ok(())
    }

    /// Appends a participant seeded at creation. Enforces commitment
    /// uniqueness and the registry cap; identity checks do not apply since
    /// seeded participants have no submitter.
    pub fn seed_participant(&mut self, commitment: [u8; 32]) -> Result<u32> {
        require!(
            (self.entrants.len() as u32) < self.max_entrants,
            RaffleError::RegistryFull
        );
        require!(
            !self.entrants.iter().any(|e| e.commitment == commitment),
            RaffleError::DuplicateEntry
        );

        self.entrants.push(Entrant {
            identity: Pubkey::default(),
            commitment,
        });
        Ok(self.entrants.len() as u32 - 1)
    }

    /// Admits an eligible entrant while the entry window is open, returning
    /// the assigned registry index. Eligibility (the Merkle proof) is checked
    /// by the caller before admission is attempted. Each commitment and each
    /// identity may appear at most once for the life of the registry.
    pub fn admit(&mut self, identity: Pubkey, commitment: [u8; 32]) -> Result<u32> {
        self.ensure_not_complete()?;
        require!(
            self.raffle_state == RaffleState::Open,
            RaffleError::InvalidTransition
        );
        require!(
            !self
                .entrants
                .iter()
                .any(|e| e.commitment == commitment || e.identity == identity),
            RaffleError::DuplicateEntry
        );
        require!(
            (self.entrants.len() as u32) < self.max_entrants,
            RaffleError::RegistryFull
        );

        self.entrants.push(Entrant {
            identity,
            commitment,
        });
        Ok(self.entrants.len() as u32 - 1)
    }

    /// The atomic close-and-request step: seals the entry window and records
    /// the single outstanding randomness request. There is no path back to
    /// Open afterwards, so an operator cannot re-roll an unfavorable pending
    /// request.
    pub fn close_and_request(&mut self, request_id: u64) -> Result<()> {
        self.ensure_not_complete()?;
        require!(
            self.raffle_state == RaffleState::Open,
            RaffleError::InvalidTransition
        );
        require!(!self.entrants.is_empty(), RaffleError::EmptyPool);
        self.raffle_state = RaffleState::Closed;

        require!(
            self.pending_request.is_none(),
            RaffleError::RequestAlreadyPending
        );
        self.pending_request = Some(request_id);
        self.raffle_state = RaffleState::PendingRandomness;
        Ok(())
    }

    /// Consumes a randomness fulfillment. Exactly one fulfillment succeeds
    /// per instance: the request id must match the outstanding request, the
    /// batch size must match the winner count, and a completed raffle rejects
    /// every further delivery. On any failure the raffle is left untouched;
    /// in particular an `InsufficientPool` failure leaves the instance
    /// permanently stuck in PendingRandomness.
    pub fn fulfill(&mut self, request_id: u64, randomness: &[[u8; 32]]) -> Result<()> {
        require!(
            self.raffle_state != RaffleState::Complete,
            RaffleError::AlreadyFulfilled
        );
        let pending = self.pending_request.ok_or(RaffleError::UnknownRequest)?;
        require!(pending == request_id, RaffleError::UnknownRequest);
        require!(
            randomness.len() == self.winner_count as usize,
            RaffleError::BadBatchSize
        );

        let winners = select_winners(randomness, self.entrant_count(), self.winner_count)?;

        self.winners = winners;
        self.pending_request = None;
        self.raffle_state = RaffleState::Complete;
        Ok(())
    }
}

/// Draws `winner_count` distinct entrant indices from a batch of 256-bit
/// random values. Each value is reduced modulo the pool size; a collision
/// with an already-drawn index is resolved by deterministic linear probing
/// (+1 mod pool size), so the result is bit-for-bit reproducible from the
/// same inputs. Winners come back in draw order, not sorted.
///
/// Plain modulo against a non-power-of-two pool is biased toward low indices.
/// That bias is negligible for 256 bits of entropy at realistic pool sizes
/// and is kept as-is for compatibility with the reference drawing procedure;
/// a de-biased variant would change winner outcomes.
pub fn select_winners(
    randomness: &[[u8; 32]],
    pool_size: u32,
    winner_count: u32,
) -> Result<Vec<u32>> {
    require!(pool_size >= winner_count, RaffleError::InsufficientPool);

    let mut winners: Vec<u32> = Vec::with_capacity(winner_count as usize);
    for word in randomness.iter().take(winner_count as usize) {
        let mut candidate = reduce_to_pool(word, pool_size);
        while winners.contains(&candidate) {
            candidate = (candidate + 1) % pool_size;
        }
        winners.push(candidate);
    }
    Ok(winners)
}

/// Reduces a big-endian 256-bit value modulo `pool_size` without truncating
/// the input first. Byte-at-a-time remainder keeps the arithmetic inside
/// u128 while matching `value mod pool_size` over the full 256 bits.
fn reduce_to_pool(word: &[u8; 32], pool_size: u32) -> u32 {
    let modulus = pool_size as u128;
    let mut rem: u128 = 0;
    for byte in word {
        rem = ((rem << 8) | *byte as u128) % modulus;
    }
    rem as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    fn word(value: u64) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        bytes
    }

    fn commitment(tag: u8) -> [u8; 32] {
        [tag; 32]
    }

    fn static_raffle(seeds: &[[u8; 32]], winner_count: u32, max_entrants: u32) -> Raffle {
        let mut raffle = Raffle {
            operator: Pubkey::new_unique(),
            oracle_authority: Pubkey::new_unique(),
            subscription_id: 1,
            key_hash: [7u8; 32],
            callback_gas_limit: 2_500_000,
            request_confirmations: 5,
            winner_count,
            max_entrants,
            merkle_root: EMPTY_ROOT,
            raffle_state: RaffleState::Open,
            pending_request: None,
            entrants: Vec::new(),
            winners: Vec::new(),
        };
        for seed in seeds {
            raffle.seed_participant(*seed).unwrap();
        }
        raffle
    }

    fn dynamic_raffle(root: [u8; 32], winner_count: u32, max_entrants: u32) -> Raffle {
        let mut raffle = static_raffle(&[], winner_count, max_entrants);
        raffle.merkle_root = root;
        raffle
    }

    fn assert_raffle_err<T: std::fmt::Debug>(result: Result<T>, expected: RaffleError) {
        let expected: Error = expected.into();
        match result {
            Err(err) => assert_eq!(err, expected),
            Ok(value) => panic!("expected {:?}, got Ok({:?})", expected, value),
        }
    }

    fn eight_seeds() -> Vec<[u8; 32]> {
        (1u8..=8).map(commitment).collect()
    }

    #[test]
    fn reduce_handles_full_width_values() {
        // 2^256 - 1 = 1 (mod 7) and has all low bits set for powers of two.
        assert_eq!(reduce_to_pool(&[0xff; 32], 7), 1);
        assert_eq!(reduce_to_pool(&[0xff; 32], 8), 7);
        assert_eq!(reduce_to_pool(&word(9), 8), 1);
        assert_eq!(reduce_to_pool(&word(0), 5), 0);
    }

    #[test]
    fn select_winners_resolves_collisions_by_linear_probe() {
        // 9 % 8 == 1 collides with the second draw and probes forward past
        // the already-taken 2.
        let values = [word(0), word(1), word(1), word(9)];
        let winners = select_winners(&values, 8, 4).unwrap();
        assert_eq!(winners, vec![0, 1, 2, 3]);
    }

    #[test]
    fn select_winners_probe_wraps_around_the_pool() {
        let values = [word(2), word(2), word(2)];
        let winners = select_winners(&values, 3, 3).unwrap();
        assert_eq!(winners, vec![2, 0, 1]);
    }

    #[test]
    fn select_winners_preserves_draw_order() {
        let values = [word(5), word(2), word(7)];
        let winners = select_winners(&values, 8, 3).unwrap();
        assert_eq!(winners, vec![5, 2, 7]);
    }

    #[test]
    fn select_winners_is_deterministic() {
        let values: Vec<[u8; 32]> = (0..7).map(|i| word(i * 31 + 11)).collect();
        let first = select_winners(&values, 8, 7).unwrap();
        let second = select_winners(&values, 8, 7).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
        for index in &first {
            assert!(*index < 8);
        }
        let mut sorted = first.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 7);
    }

    #[test]
    fn select_winners_rejects_small_pool() {
        assert_raffle_err(
            select_winners(&[word(1), word(2)], 1, 2),
            RaffleError::InsufficientPool,
        );
    }

    #[test]
    fn seeded_registry_rejects_duplicates_and_overflow() {
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        assert_eq!(raffle.entrant_count(), 8);
        assert_raffle_err(
            raffle.seed_participant(commitment(9)),
            RaffleError::RegistryFull,
        );

        let mut raffle = static_raffle(&eight_seeds(), 7, 16);
        assert_raffle_err(
            raffle.seed_participant(commitment(3)),
            RaffleError::DuplicateEntry,
        );
        assert_eq!(raffle.entrant_count(), 8);
    }

    #[test]
    fn admit_assigns_indices_in_insertion_order() {
        let mut raffle = dynamic_raffle([1u8; 32], 2, 8);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        assert_eq!(raffle.admit(alice, commitment(1)).unwrap(), 0);
        assert_eq!(raffle.admit(bob, commitment(2)).unwrap(), 1);
        assert_eq!(raffle.entrant_at(0).unwrap().identity, alice);
        assert_eq!(raffle.entrant_at(1).unwrap().commitment, commitment(2));
        assert!(raffle.entrant_at(2).is_none());
    }

    #[test]
    fn admit_rejects_duplicate_commitment_and_identity() {
        let mut raffle = dynamic_raffle([1u8; 32], 2, 8);
        let alice = Pubkey::new_unique();
        raffle.admit(alice, commitment(1)).unwrap();

        // Same commitment from a fresh identity.
        assert_raffle_err(
            raffle.admit(Pubkey::new_unique(), commitment(1)),
            RaffleError::DuplicateEntry,
        );
        // Same identity with a fresh commitment.
        assert_raffle_err(
            raffle.admit(alice, commitment(2)),
            RaffleError::DuplicateEntry,
        );
        assert_eq!(raffle.entrant_count(), 1);
    }

    #[test]
    fn admit_enforces_the_registry_cap() {
        let mut raffle = dynamic_raffle([1u8; 32], 2, 2);
        raffle.admit(Pubkey::new_unique(), commitment(1)).unwrap();
        raffle.admit(Pubkey::new_unique(), commitment(2)).unwrap();
        assert_raffle_err(
            raffle.admit(Pubkey::new_unique(), commitment(3)),
            RaffleError::RegistryFull,
        );
    }

    #[test]
    fn admit_is_rejected_outside_the_entry_window() {
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        raffle.close_and_request(42).unwrap();
        assert_raffle_err(
            raffle.admit(Pubkey::new_unique(), commitment(9)),
            RaffleError::InvalidTransition,
        );

        let values: Vec<[u8; 32]> = (0..7).map(word).collect();
        raffle.fulfill(42, &values).unwrap();
        assert_raffle_err(
            raffle.admit(Pubkey::new_unique(), commitment(9)),
            RaffleError::RaffleAlreadyComplete,
        );
    }

    #[test]
    fn close_rejects_an_empty_pool() {
        // Scenario D.
        let mut raffle = dynamic_raffle([1u8; 32], 2, 8);
        assert_raffle_err(raffle.close_and_request(42), RaffleError::EmptyPool);
        assert_eq!(raffle.raffle_state, RaffleState::Open);
    }

    #[test]
    fn close_twice_is_an_invalid_transition() {
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        raffle.close_and_request(42).unwrap();
        assert_eq!(raffle.raffle_state, RaffleState::PendingRandomness);
        assert_eq!(raffle.pending_request, Some(42));
        assert_raffle_err(raffle.close_and_request(43), RaffleError::InvalidTransition);
        assert_eq!(raffle.pending_request, Some(42));
    }

    #[test]
    fn static_raffle_runs_to_seven_winners_exactly_once() {
        // Scenario A: 8 seeded participants, 7 winners.
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        assert!(raffle.winners().is_empty());

        raffle.close_and_request(42).unwrap();
        let values: Vec<[u8; 32]> = (0..7).map(|i| word(i * 1000 + 3)).collect();
        raffle.fulfill(42, &values).unwrap();

        assert_eq!(raffle.raffle_state, RaffleState::Complete);
        assert_eq!(raffle.pending_request, None);
        let winners = raffle.winners().to_vec();
        assert_eq!(winners.len(), 7);
        for index in &winners {
            assert!(*index < 8);
        }
        let mut sorted = winners.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 7);

        // A second delivery, even with the matching id and values, is
        // rejected and the winner set is unchanged.
        assert_raffle_err(raffle.fulfill(42, &values), RaffleError::AlreadyFulfilled);
        assert_eq!(raffle.winners(), winners.as_slice());
    }

    #[test]
    fn fulfill_rejects_unknown_requests() {
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        let values: Vec<[u8; 32]> = (0..7).map(word).collect();

        // No request outstanding yet.
        assert_raffle_err(raffle.fulfill(42, &values), RaffleError::UnknownRequest);

        raffle.close_and_request(42).unwrap();
        assert_raffle_err(raffle.fulfill(41, &values), RaffleError::UnknownRequest);
        assert_eq!(raffle.raffle_state, RaffleState::PendingRandomness);
    }

    #[test]
    fn fulfill_rejects_a_wrong_batch_size() {
        // Scenario C: batch size != winner count is dropped with no state
        // change, no partial acceptance.
        let mut raffle = static_raffle(&eight_seeds(), 7, 8);
        raffle.close_and_request(42).unwrap();

        let short: Vec<[u8; 32]> = (0..6).map(word).collect();
        assert_raffle_err(raffle.fulfill(42, &short), RaffleError::BadBatchSize);
        assert_eq!(raffle.raffle_state, RaffleState::PendingRandomness);
        assert_eq!(raffle.pending_request, Some(42));
        assert!(raffle.winners().is_empty());

        let long: Vec<[u8; 32]> = (0..8).map(word).collect();
        assert_raffle_err(raffle.fulfill(42, &long), RaffleError::BadBatchSize);
        assert_eq!(raffle.raffle_state, RaffleState::PendingRandomness);
    }

    #[test]
    fn insufficient_pool_leaves_the_raffle_stuck_pending() {
        // 3 entrants cannot cover 7 winners; the instance has no remediation
        // path and stays in PendingRandomness.
        let seeds: Vec<[u8; 32]> = (1u8..=3).map(commitment).collect();
        let mut raffle = static_raffle(&seeds, 7, 8);
        raffle.close_and_request(42).unwrap();

        let values: Vec<[u8; 32]> = (0..7).map(word).collect();
        assert_raffle_err(raffle.fulfill(42, &values), RaffleError::InsufficientPool);
        assert_eq!(raffle.raffle_state, RaffleState::PendingRandomness);
        assert!(raffle.winners().is_empty());

        assert_raffle_err(raffle.fulfill(42, &values), RaffleError::InsufficientPool);
    }

    #[test]
    fn space_covers_a_full_registry() {
        // 8 + fixed fields + both vecs at capacity.
        assert_eq!(Raffle::space(0, 0), 176);
        assert_eq!(Raffle::space(8, 7), 176 + 8 * ENTRANT_SIZE + 7 * 4);
    }
}
