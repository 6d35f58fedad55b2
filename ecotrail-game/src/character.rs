//! Player character and dragon presets.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ECO_ACTION_COORDINATES, ECO_ACTION_LOCATION, PLAYER_BASE_ATTACK, PLAYER_BASE_DEFENSE,
    PLAYER_BASE_HP, PLAYER_NAME,
};
use crate::progress::{Inventory, PlayerSnapshot, ProgressRecord};

/// The player's hero. Lives for the whole process and is saved after every
/// meaningful change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub level: u32,
    pub exp: u32,
    pub inventory: Inventory,
}

impl Default for PlayerCharacter {
    fn default() -> Self {
        Self {
            name: PLAYER_NAME.to_string(),
            hp: PLAYER_BASE_HP,
            max_hp: PLAYER_BASE_HP,
            attack: PLAYER_BASE_ATTACK,
            defense: PLAYER_BASE_DEFENSE,
            level: 1,
            exp: 0,
            inventory: Inventory::default(),
        }
    }
}

impl PlayerCharacter {
    /// Restore the character from a progress record.
    ///
    /// Stats come from the embedded snapshot when present; the inventory is
    /// always seeded from the record's top-level inventory, which the route
    /// screen writes to. The character starts at full health.
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        let mut character = Self::default();
        if let Some(snapshot) = record.player {
            character.max_hp = snapshot.max_hp.max(1);
            character.attack = snapshot.attack;
            character.defense = snapshot.defense;
            character.level = snapshot.level.max(1);
            character.exp = snapshot.exp;
        }
        character.hp = character.max_hp;
        character.inventory = record.inventory;
        character
    }

    #[must_use]
    pub const fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            level: self.level,
            exp: self.exp,
            attack: self.attack,
            defense: self.defense,
            max_hp: self.max_hp,
            inventory: self.inventory,
        }
    }

    /// Write the character back into the record: stats into the snapshot and
    /// the inventory into both the snapshot and the top-level inventory.
    pub fn store_into(&self, record: &mut ProgressRecord) {
        record.player = Some(self.snapshot());
        record.inventory = self.inventory;
    }

    pub fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }

    /// Heal up to `max_hp`, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

/// The three fixed dragon presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragonTheme {
    #[default]
    Flame,
    Desert,
    Wasteland,
}

impl DragonTheme {
    pub const ALL: [Self; 3] = [Self::Flame, Self::Desert, Self::Wasteland];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flame => "flame",
            Self::Desert => "desert",
            Self::Wasteland => "wasteland",
        }
    }

    /// Environmental action performed after beating this theme's dragon.
    #[must_use]
    pub const fn eco_action(self) -> EcoAction {
        let action = match self {
            Self::Wasteland => "Grass Grid Deployed",
            Self::Desert => "Atriplex nummularia (Old Man Saltbush) Planted",
            Self::Flame => "Eucalyptus microtheca Planted",
        };
        EcoAction {
            theme: self,
            location: ECO_ACTION_LOCATION,
            coordinates: ECO_ACTION_COORDINATES,
            action,
        }
    }
}

impl fmt::Display for DragonTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DragonTheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flame" => Ok(Self::Flame),
            "desert" => Ok(Self::Desert),
            "wasteland" => Ok(Self::Wasteland),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragonOpponent {
    pub theme: DragonTheme,
    pub name: String,
    pub emoji: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub level: u32,
    pub difficulty: Difficulty,
}

impl DragonOpponent {
    /// Fresh, full-health dragon for the given preset.
    #[must_use]
    pub fn preset(theme: DragonTheme) -> Self {
        let (name, emoji, max_hp, attack, defense, level, difficulty) = match theme {
            DragonTheme::Flame => ("Flame", "🔥", 150, 25, 15, 3, Difficulty::Hard),
            DragonTheme::Desert => ("Desert", "🏜️", 120, 20, 12, 2, Difficulty::Medium),
            DragonTheme::Wasteland => ("Wasteland", "🌫️", 100, 18, 10, 1, Difficulty::Easy),
        };
        Self {
            theme,
            name: name.to_string(),
            emoji: emoji.to_string(),
            hp: max_hp,
            max_hp,
            attack,
            defense,
            level,
            difficulty,
        }
    }

    pub fn reset(&mut self) {
        self.hp = self.max_hp;
    }

    #[must_use]
    pub const fn damage_taken(&self) -> u32 {
        self.max_hp.saturating_sub(self.hp)
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

/// Real-world planting or restoration credited for a victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EcoAction {
    pub theme: DragonTheme,
    pub location: &'static str,
    pub coordinates: &'static str,
    pub action: &'static str,
}
