//! Ecotrail Game Engine
//!
//! Rules for the Ecotrail dragon battle and eco-route planner. Both screens
//! share one persisted progress record: routes earn CO₂ savings and items,
//! savings buy challenge tokens, and tokens buy dragon encounters.
//! This crate holds no UI code.

pub mod battle;
pub mod character;
pub mod combat;
pub mod constants;
pub mod inventory;
pub mod numbers;
pub mod planner;
pub mod progress;
pub mod progression;
pub mod rng;
pub mod routes;
pub mod store;

// Re-export commonly used types
pub use battle::{BattleAction, BattleError, BattlePhase, BattleSession, BattleView, LogLine};
pub use character::{Difficulty, DragonOpponent, DragonTheme, EcoAction, PlayerCharacter};
pub use combat::{Combatant, Strike, dragon_strike, player_strike, resolve_attack, strike_damage};
pub use inventory::{Equipped, InventoryError, PotionUse, equip, use_potion};
pub use planner::{RouteError, RoutePlanner, RouteSearch, RouteSelection};
pub use progress::{
    ExchangeError, ExchangeReceipt, Inventory, ItemKind, PlayerSnapshot, ProgressRecord,
};
pub use progression::{
    EncounterResult, LevelUp, ProgressionOutcome, StatGain, apply_experience, defeat_exp,
    exp_gain, resolve_encounter,
};
pub use rng::{CountingRng, RngBundle};
pub use routes::{
    LegKind, Reward, Rewards, RouteCandidate, RouteMode, TransferLeg, TransferPlan,
    build_candidates, generate_candidates, roll_eco_rewards,
};
pub use store::{JsonFileStore, MemoryStore, ProgressStorage, ProgressStore, StoreError};

/// Entry point wiring both screens to one progress store.
#[derive(Debug, Clone)]
pub struct EcoTrail {
    store: ProgressStore,
}

impl EcoTrail {
    /// Load progress from `storage`.
    pub fn open(storage: impl ProgressStorage + 'static) -> Self {
        Self {
            store: ProgressStore::open(storage),
        }
    }

    /// Load progress from the default save file in the working directory.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(JsonFileStore::default())
    }

    #[must_use]
    pub const fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Snapshot of the shared progress record.
    #[must_use]
    pub fn progress(&self) -> ProgressRecord {
        self.store.record()
    }

    /// Battle screen session. `seed` makes its rolls reproducible.
    #[must_use]
    pub fn battle(&self, seed: Option<u64>) -> BattleSession {
        match seed {
            Some(seed) => BattleSession::with_seed(self.store.clone(), seed),
            None => BattleSession::new(self.store.clone()),
        }
    }

    /// Route screen session. `seed` makes its rolls reproducible.
    #[must_use]
    pub fn planner(&self, seed: Option<u64>) -> RoutePlanner {
        match seed {
            Some(seed) => RoutePlanner::with_seed(self.store.clone(), seed),
            None => RoutePlanner::new(self.store.clone()),
        }
    }
}
