//! Randomness and identifiers shared by the controllers.
//!
//! None of this needs to be cryptographically strong. A seeded generator
//! makes a whole game reproducible, which the tests and the CLI `--seed`
//! flag rely on.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

pub type GameRng = rand_pcg::Pcg64;

/// Generator seeded from OS entropy.
pub fn entropy_rng() -> GameRng {
    GameRng::from_entropy()
}

pub fn seeded_rng(seed: u64) -> GameRng {
    GameRng::seed_from_u64(seed)
}

/// `Some(seed)` gives a reproducible generator, `None` an entropy-seeded one.
pub fn rng_from(seed: Option<u64>) -> GameRng {
    seed.map(seeded_rng).unwrap_or_else(entropy_rng)
}

/// Uniformly random permutation of `items`.
pub fn shuffled<T: Clone>(items: &[T], rng: &mut GameRng) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Process-wide unique identifier for a session.
pub fn new_session_id() -> Uuid {
    Uuid::new_v4()
}
