//! Consumable and equippable item effects.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::PlayerCharacter;
use crate::constants::{ARMOR_DEFENSE_BONUS, POTION_HEAL_MAX, POTION_HEAL_MIN, SWORD_ATTACK_BONUS};
use crate::progress::ItemKind;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no HP potions left")]
    NoPotions,
    #[error("no {0} to equip")]
    NothingToEquip(ItemKind),
    #[error("{0} cannot be equipped")]
    NotEquippable(ItemKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionUse {
    pub rolled: u32,
    pub healed: u32,
    pub hp_after: u32,
    pub potions_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipped {
    pub item: ItemKind,
    pub attack: u32,
    pub defense: u32,
    pub remaining: u32,
}

/// Drink one potion, healing `uniform(30, 50)` capped at `max_hp`.
///
/// # Errors
///
/// Returns [`InventoryError::NoPotions`] with no state change when empty.
pub fn use_potion(
    player: &mut PlayerCharacter,
    rng: &mut impl Rng,
) -> Result<PotionUse, InventoryError> {
    if !player.inventory.take_one(ItemKind::Potion) {
        return Err(InventoryError::NoPotions);
    }
    let rolled = rng.gen_range(POTION_HEAL_MIN..=POTION_HEAL_MAX);
    let healed = player.heal(rolled);
    Ok(PotionUse {
        rolled,
        healed,
        hp_after: player.hp,
        potions_left: player.inventory.potions,
    })
}

/// Consume one sword or armor for a permanent stat bonus. Bonuses stack.
///
/// # Errors
///
/// Returns an error with no state change when the item is not equippable or
/// none are carried.
pub fn equip(player: &mut PlayerCharacter, item: ItemKind) -> Result<Equipped, InventoryError> {
    if item == ItemKind::Potion {
        return Err(InventoryError::NotEquippable(item));
    }
    if !player.inventory.take_one(item) {
        return Err(InventoryError::NothingToEquip(item));
    }
    match item {
        ItemKind::Sword => player.attack = player.attack.saturating_add(SWORD_ATTACK_BONUS),
        ItemKind::Armor => player.defense = player.defense.saturating_add(ARMOR_DEFENSE_BONUS),
        ItemKind::Potion => {}
    }
    Ok(Equipped {
        item,
        attack: player.attack,
        defense: player.defense,
        remaining: player.inventory.count(item),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn equip_sword_consumes_and_boosts() {
        let mut hero = PlayerCharacter::default();
        hero.inventory.iron_sword = 1;
        let equipped = equip(&mut hero, ItemKind::Sword).unwrap();
        assert_eq!(equipped.remaining, 0);
        assert_eq!(hero.attack, 30);

        let before = hero.clone();
        assert_eq!(
            equip(&mut hero, ItemKind::Sword),
            Err(InventoryError::NothingToEquip(ItemKind::Sword))
        );
        assert_eq!(hero, before);
    }

    #[test]
    fn armor_bonuses_stack() {
        let mut hero = PlayerCharacter::default();
        hero.inventory.iron_armor = 2;
        equip(&mut hero, ItemKind::Armor).unwrap();
        equip(&mut hero, ItemKind::Armor).unwrap();
        assert_eq!(hero.defense, 26);
        assert_eq!(hero.inventory.iron_armor, 0);
    }

    #[test]
    fn potions_cannot_be_equipped() {
        let mut hero = PlayerCharacter::default();
        hero.inventory.potions = 1;
        assert_eq!(
            equip(&mut hero, ItemKind::Potion),
            Err(InventoryError::NotEquippable(ItemKind::Potion))
        );
        assert_eq!(hero.inventory.potions, 1);
    }

    #[test]
    fn potion_heals_within_range_and_caps() {
        let mut rng = SmallRng::seed_from_u64(21);
        let mut hero = PlayerCharacter {
            hp: 20,
            ..PlayerCharacter::default()
        };
        hero.inventory.potions = 2;
        let used = use_potion(&mut hero, &mut rng).unwrap();
        assert!((30..=50).contains(&used.rolled));
        assert_eq!(used.healed, used.rolled);
        assert_eq!(hero.hp, 20 + used.rolled);

        hero.hp = 95;
        let capped = use_potion(&mut hero, &mut rng).unwrap();
        assert_eq!(capped.healed, 5);
        assert_eq!(hero.hp, 100);
        assert_eq!(capped.potions_left, 0);
    }

    #[test]
    fn empty_potion_bag_is_rejected() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut hero = PlayerCharacter {
            hp: 10,
            ..PlayerCharacter::default()
        };
        assert_eq!(use_potion(&mut hero, &mut rng), Err(InventoryError::NoPotions));
        assert_eq!(hero.hp, 10);
    }
}
