//! Process-wide seeding.
//!
//! Environments and agents draw their seeds from a global seed sequence, so that
//! setting the global seed once reproduces a whole experiment.
//!
//! ```rust
//! use berry_core::seeding;
//!
//! seeding::set_global_seed(42);
//! let a = seeding::spawn_seed();
//! seeding::set_global_seed(42);
//! assert_eq!(a, seeding::spawn_seed());
//! ```
use log::debug;
use once_cell::sync::Lazy;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::sync::Mutex;

const DEFAULT_GLOBAL_SEED: u64 = 42;

static SEEDER: Lazy<Mutex<SmallRng>> =
    Lazy::new(|| Mutex::new(SmallRng::seed_from_u64(DEFAULT_GLOBAL_SEED)));

/// Restarts the global seed sequence from `seed`.
pub fn set_global_seed(seed: u64) {
    debug!("Set global seed to {}", seed);
    let mut seeder = SEEDER.lock().unwrap_or_else(|e| e.into_inner());
    *seeder = SmallRng::seed_from_u64(seed);
}

/// Draws the next seed of the global seed sequence.
pub fn spawn_seed() -> u64 {
    let mut seeder = SEEDER.lock().unwrap_or_else(|e| e.into_inner());
    seeder.gen()
}

/// Builds a random number generator.
///
/// With `None`, the seed is drawn with [`spawn_seed`].
pub fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    SmallRng::seed_from_u64(seed.unwrap_or_else(spawn_seed))
}
