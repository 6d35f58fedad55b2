//! Damage resolution between the hero and a dragon.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::character::{DragonOpponent, PlayerCharacter};
use crate::constants::{
    DEFEND_STANCE_BONUS, DRAGON_DAMAGE_VARIANCE, MIN_DAMAGE, PLAYER_DAMAGE_VARIANCE,
};

/// Anything that can deal and receive blows.
pub trait Combatant {
    fn attack(&self) -> u32;
    fn defense(&self) -> u32;
    fn hp(&self) -> u32;
    fn set_hp(&mut self, hp: u32);
}

impl Combatant for PlayerCharacter {
    fn attack(&self) -> u32 {
        self.attack
    }
    fn defense(&self) -> u32 {
        self.defense
    }
    fn hp(&self) -> u32 {
        self.hp
    }
    fn set_hp(&mut self, hp: u32) {
        self.hp = hp.min(self.max_hp);
    }
}

impl Combatant for DragonOpponent {
    fn attack(&self) -> u32 {
        self.attack
    }
    fn defense(&self) -> u32 {
        self.defense
    }
    fn hp(&self) -> u32 {
        self.hp
    }
    fn set_hp(&mut self, hp: u32) {
        self.hp = hp.min(self.max_hp);
    }
}

/// Outcome of a single blow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub roll: i32,
    pub damage: u32,
    pub defender_hp_after: u32,
    pub defeated: bool,
}

/// `max(1, attack + roll - defense - bonus)`.
#[must_use]
pub fn strike_damage(attack: u32, roll: i32, defense: u32, defense_bonus: u32) -> u32 {
    let raw = i64::from(attack) + i64::from(roll) - i64::from(defense) - i64::from(defense_bonus);
    u32::try_from(raw.max(i64::from(MIN_DAMAGE))).unwrap_or(u32::MAX)
}

/// Roll `uniform(-variance, variance)` and apply the blow, clamping hp at zero.
pub fn resolve_attack(
    attacker: &impl Combatant,
    defender: &mut impl Combatant,
    variance: i32,
    defense_bonus: u32,
    rng: &mut impl Rng,
) -> Strike {
    let variance = variance.abs();
    let roll = rng.gen_range(-variance..=variance);
    let damage = strike_damage(attacker.attack(), roll, defender.defense(), defense_bonus);
    let hp_after = defender.hp().saturating_sub(damage);
    defender.set_hp(hp_after);
    Strike {
        roll,
        damage,
        defender_hp_after: hp_after,
        defeated: hp_after == 0,
    }
}

/// The hero's attack against the dragon.
pub fn player_strike(
    player: &PlayerCharacter,
    dragon: &mut DragonOpponent,
    rng: &mut impl Rng,
) -> Strike {
    resolve_attack(player, dragon, PLAYER_DAMAGE_VARIANCE, 0, rng)
}

/// The dragon's counter-attack. `defending` applies the defend-stance bonus.
pub fn dragon_strike(
    dragon: &DragonOpponent,
    player: &mut PlayerCharacter,
    defending: bool,
    rng: &mut impl Rng,
) -> Strike {
    let bonus = if defending { DEFEND_STANCE_BONUS } else { 0 };
    resolve_attack(dragon, player, DRAGON_DAMAGE_VARIANCE, bonus, rng)
}
