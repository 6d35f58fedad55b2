//! Cross-session player progress shared by the battle and route screens.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    CO2_PER_CHALLENGE_KG, PLAYER_BASE_ATTACK, PLAYER_BASE_DEFENSE, PLAYER_BASE_HP,
};
use crate::numbers::{floor_f64_to_u32, u32_to_f64};

/// Item kinds that can be carried, rewarded, and consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Potion,
    Sword,
    Armor,
}

impl ItemKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Potion => "potion",
            Self::Sword => "sword",
            Self::Armor => "armor",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Potion => "HP Potion",
            Self::Sword => "Iron Sword",
            Self::Armor => "Iron Armor",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Carried item counts. Shared shape between the save file and the character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub potions: u32,
    #[serde(default)]
    pub iron_sword: u32,
    #[serde(default)]
    pub iron_armor: u32,
}

impl Inventory {
    #[must_use]
    pub const fn count(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Potion => self.potions,
            ItemKind::Sword => self.iron_sword,
            ItemKind::Armor => self.iron_armor,
        }
    }

    pub fn add(&mut self, kind: ItemKind, count: u32) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(count);
    }

    /// Remove one unit. Returns `false` and leaves the count untouched when empty.
    pub fn take_one(&mut self, kind: ItemKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    fn slot_mut(&mut self, kind: ItemKind) -> &mut u32 {
        match kind {
            ItemKind::Potion => &mut self.potions,
            ItemKind::Sword => &mut self.iron_sword,
            ItemKind::Armor => &mut self.iron_armor,
        }
    }
}

/// Character stats embedded in the save file by the battle screen.
///
/// Missing fields fall back to the starting hero's values, so a partial
/// snapshot never discards the rest of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub level: u32,
    pub exp: u32,
    pub attack: u32,
    pub defense: u32,
    pub max_hp: u32,
    pub inventory: Inventory,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0,
            attack: PLAYER_BASE_ATTACK,
            defense: PLAYER_BASE_DEFENSE,
            max_hp: PLAYER_BASE_HP,
            inventory: Inventory::default(),
        }
    }
}

/// The persisted progress document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub total_co2_saved: f64,
    #[serde(default)]
    pub game_challenges: u32,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub eco_routes_taken: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSnapshot>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            total_co2_saved: 0.0,
            game_challenges: 0,
            inventory: Inventory::default(),
            eco_routes_taken: 0,
            player: None,
        }
    }
}

/// Result of converting saved CO₂ into challenge tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    pub tokens_gained: u32,
    pub co2_spent: f64,
    pub co2_remaining: f64,
    pub game_challenges: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ExchangeError {
    #[error("insufficient CO₂ reduction: need at least {required:.1} kg, have {available:.1} kg")]
    InsufficientCo2 { required: f64, available: f64 },
}

impl ProgressRecord {
    /// Consume one challenge token. Returns `false` when none are left.
    pub fn spend_challenge(&mut self) -> bool {
        if self.game_challenges == 0 {
            return false;
        }
        self.game_challenges -= 1;
        true
    }

    /// Convert every full CO₂ block into one challenge token in a single step.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InsufficientCo2`] without touching the record
    /// when less than one block has been saved.
    pub fn exchange(&mut self) -> Result<ExchangeReceipt, ExchangeError> {
        if self.total_co2_saved < CO2_PER_CHALLENGE_KG {
            return Err(ExchangeError::InsufficientCo2 {
                required: CO2_PER_CHALLENGE_KG,
                available: self.total_co2_saved,
            });
        }
        let tokens_gained = floor_f64_to_u32(self.total_co2_saved / CO2_PER_CHALLENGE_KG);
        let co2_spent = u32_to_f64(tokens_gained) * CO2_PER_CHALLENGE_KG;
        self.total_co2_saved -= co2_spent;
        self.game_challenges = self.game_challenges.saturating_add(tokens_gained);
        Ok(ExchangeReceipt {
            tokens_gained,
            co2_spent,
            co2_remaining: self.total_co2_saved,
            game_challenges: self.game_challenges,
        })
    }
}
