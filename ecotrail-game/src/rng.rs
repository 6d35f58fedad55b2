//! Seeded random streams shared by the battle and route sessions.
//!
//! Every roll in the engine takes `&mut impl Rng`, so callers can inject any
//! source. Sessions default to an [`RngBundle`]: one user seed fans out into
//! independent, domain-separated streams so that adding a draw to combat never
//! shifts the loot table.

use std::cell::{RefCell, RefMut};

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Independent random streams derived from a single user seed.
#[derive(Debug)]
pub struct RngBundle {
    seed: u64,
    combat: RefCell<CountingRng<SmallRng>>,
    growth: RefCell<CountingRng<SmallRng>>,
    loot: RefCell<CountingRng<SmallRng>>,
    route: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            combat: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"combat"))),
            growth: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"growth"))),
            loot: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"loot"))),
            route: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"route"))),
        }
    }

    /// Construct the bundle from OS entropy. The drawn seed stays available
    /// through [`RngBundle::seed`] so a session can be replayed.
    #[must_use]
    pub fn from_entropy() -> Self {
        let seed = ChaCha20Rng::from_entropy().next_u64();
        Self::from_user_seed(seed)
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Damage variance and potion heals.
    #[must_use]
    pub fn combat(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.combat.borrow_mut()
    }

    /// Experience rolls and level-up stat picks.
    #[must_use]
    pub fn growth(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.growth.borrow_mut()
    }

    /// Eco route reward rolls.
    #[must_use]
    pub fn loot(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.loot.borrow_mut()
    }

    /// Base distances and transfer descriptions.
    #[must_use]
    pub fn route(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.route.borrow_mut()
    }

    /// Total draws across every stream.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        [
            self.combat.borrow().draws(),
            self.growth.borrow().draws(),
            self.loot.borrow().draws(),
            self.route.borrow().draws(),
        ]
        .iter()
        .fold(0_u64, |acc, draws| acc.saturating_add(*draws))
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so construction cannot fail for 8 bytes.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
