//! Experience gain and level-up resolution after an encounter.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::character::{DragonOpponent, PlayerCharacter};
use crate::constants::{
    DEFEAT_EXP_DIVISOR, DEFEAT_EXP_FLOOR, EXP_PER_LEVEL, LEVEL_UP_ATTACK_CHANCE, LEVEL_UP_HP_GAIN,
    LEVEL_UP_STAT_MAX, LEVEL_UP_STAT_MIN, VICTORY_EXP_MAX, VICTORY_EXP_MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterResult {
    Victory,
    Defeat,
}

/// The one stat raised by a single level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGain {
    Attack(u32),
    Defense(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub new_level: u32,
    pub max_hp: u32,
    pub gain: StatGain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionOutcome {
    pub result: EncounterResult,
    pub exp_gained: u32,
    pub level_ups: Vec<LevelUp>,
}

/// Experience earned for ending an encounter against `dragon` in its current state.
///
/// A loss still pays out half the damage dealt, never less than the floor.
pub fn exp_gain(result: EncounterResult, dragon: &DragonOpponent, rng: &mut impl Rng) -> u32 {
    match result {
        EncounterResult::Victory => rng.gen_range(VICTORY_EXP_MIN..=VICTORY_EXP_MAX),
        EncounterResult::Defeat => exp_for_damage(dragon.damage_taken()),
    }
}

#[must_use]
pub const fn defeat_exp(dragon_max_hp: u32, dragon_hp: u32) -> u32 {
    exp_for_damage(dragon_max_hp.saturating_sub(dragon_hp))
}

const fn exp_for_damage(damage_dealt: u32) -> u32 {
    let earned = damage_dealt / DEFEAT_EXP_DIVISOR;
    if earned > DEFEAT_EXP_FLOOR {
        earned
    } else {
        DEFEAT_EXP_FLOOR
    }
}

/// Add experience and roll one level-up per full threshold crossed.
///
/// Each level raises `max_hp` by the fixed growth, refills hp, and raises
/// exactly one of attack or defense.
pub fn apply_experience(
    player: &mut PlayerCharacter,
    exp: u32,
    rng: &mut impl Rng,
) -> Vec<LevelUp> {
    player.exp = player.exp.saturating_add(exp);
    let mut level_ups = Vec::new();
    while player.exp >= EXP_PER_LEVEL {
        player.level = player.level.saturating_add(1);
        player.exp -= EXP_PER_LEVEL;
        let raise_attack = rng.gen_bool(LEVEL_UP_ATTACK_CHANCE);
        let amount = rng.gen_range(LEVEL_UP_STAT_MIN..=LEVEL_UP_STAT_MAX);
        let gain = if raise_attack {
            player.attack = player.attack.saturating_add(amount);
            StatGain::Attack(amount)
        } else {
            player.defense = player.defense.saturating_add(amount);
            StatGain::Defense(amount)
        };
        player.max_hp = player.max_hp.saturating_add(LEVEL_UP_HP_GAIN);
        player.heal_full();
        level_ups.push(LevelUp {
            new_level: player.level,
            max_hp: player.max_hp,
            gain,
        });
    }
    level_ups
}

/// Resolve an ended encounter: award experience, level up, then auto-heal.
pub fn resolve_encounter(
    player: &mut PlayerCharacter,
    dragon: &DragonOpponent,
    result: EncounterResult,
    rng: &mut impl Rng,
) -> ProgressionOutcome {
    let exp_gained = exp_gain(result, dragon, rng);
    let level_ups = apply_experience(player, exp_gained, rng);
    player.heal_full();
    ProgressionOutcome {
        result,
        exp_gained,
        level_ups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::DragonTheme;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn defeat_exp_is_half_damage_with_floor() {
        assert_eq!(defeat_exp(100, 40), 30);
        assert_eq!(defeat_exp(100, 95), 10);
        assert_eq!(defeat_exp(150, 0), 75);
        assert_eq!(defeat_exp(120, 99), 10);
        assert_eq!(defeat_exp(100, 100), 10);
    }

    #[test]
    fn victory_exp_in_range() {
        let dragon = DragonOpponent::preset(DragonTheme::Desert);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            let exp = exp_gain(EncounterResult::Victory, &dragon, &mut rng);
            assert!((50..=80).contains(&exp));
        }
    }

    #[test]
    fn multiple_thresholds_level_multiple_times() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut hero = PlayerCharacter {
            exp: 90,
            ..PlayerCharacter::default()
        };
        let before = hero.clone();
        let ups = apply_experience(&mut hero, 215, &mut rng);
        assert_eq!(ups.len(), 3);
        assert_eq!(hero.level, 4);
        assert_eq!(hero.exp, 5);
        assert_eq!(hero.max_hp, before.max_hp + 45);
        assert_eq!(hero.hp, hero.max_hp);
        let gained = (hero.attack - before.attack) + (hero.defense - before.defense);
        let rolled: u32 = ups
            .iter()
            .map(|up| match up.gain {
                StatGain::Attack(n) | StatGain::Defense(n) => n,
            })
            .sum();
        assert_eq!(gained, rolled);
        assert!((6..=12).contains(&rolled));
    }

    #[test]
    fn level_count_matches_threshold_arithmetic() {
        let mut rng = SmallRng::seed_from_u64(77);
        for start in [0_u32, 10, 50, 99] {
            for gain in [0_u32, 1, 50, 100, 180, 250] {
                let mut hero = PlayerCharacter {
                    exp: start,
                    ..PlayerCharacter::default()
                };
                let ups = apply_experience(&mut hero, gain, &mut rng);
                let expected = (start + gain) / 100;
                assert_eq!(ups.len() as u32, expected);
                assert_eq!(hero.level, 1 + expected);
                assert!(hero.exp < 100);
                assert_eq!(hero.max_hp, 100 + 15 * expected);
            }
        }
    }

    #[test]
    fn resolution_always_heals() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut hero = PlayerCharacter {
            hp: 0,
            ..PlayerCharacter::default()
        };
        let mut dragon = DragonOpponent::preset(DragonTheme::Wasteland);
        dragon.hp = 40;
        let outcome = resolve_encounter(&mut hero, &dragon, EncounterResult::Defeat, &mut rng);
        assert_eq!(outcome.exp_gained, 30);
        assert!(outcome.level_ups.is_empty());
        assert_eq!(hero.hp, hero.max_hp);
        assert_eq!(hero.exp, 30);
    }
}
