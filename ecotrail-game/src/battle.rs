//! Turn protocol for a dragon encounter.
//!
//! A [`BattleSession`] owns the hero, the selected dragon and the encounter
//! phase. Every entry point returns a [`BattleView`] with the lines logged by
//! that call, so a presentation layer only has to render what it gets back.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::character::{DragonOpponent, DragonTheme, EcoAction, PlayerCharacter};
use crate::combat::{Strike, dragon_strike, player_strike};
use crate::constants::{
    LOG_BATTLE_STARTED, LOG_DEFEAT, LOG_DEFEND_STANCE, LOG_DRAGON_APPEARED, LOG_DRAGON_STRIKE,
    LOG_EQUIP_ARMOR, LOG_EQUIP_SWORD, LOG_EXP_GAINED, LOG_LEVEL_UP, LOG_PLAYER_STRIKE,
    LOG_POTION_EMPTY, LOG_POTION_USED, LOG_RESTARTED, LOG_THEME_SELECTED, LOG_VICTORY,
};
use crate::inventory::{InventoryError, equip, use_potion};
use crate::progress::{ItemKind, ProgressRecord};
use crate::progression::{EncounterResult, ProgressionOutcome, StatGain, resolve_encounter};
use crate::rng::RngBundle;
use crate::store::ProgressStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    #[default]
    Menu,
    Battle,
    Victory,
    Defeat,
}

impl BattlePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Battle => "battle",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
        }
    }
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player's choice for one battle turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleAction {
    Attack,
    Defend,
    UsePotion,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BattleError {
    #[error("no remaining challenges; exchange CO₂ reduction for challenges first")]
    NoChallenges,
    #[error("no battle in progress (phase: {0})")]
    NotInBattle(BattlePhase),
    #[error("a battle is already in progress")]
    AlreadyInBattle,
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// One user-facing battle log line with its stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub key: String,
    pub text: String,
}

/// Snapshot returned from every battle entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleView {
    pub player: PlayerCharacter,
    pub dragon: DragonOpponent,
    pub phase: BattlePhase,
    pub game_challenges: u32,
    pub lines: Vec<LogLine>,
    pub player_strike: Option<Strike>,
    pub dragon_strike: Option<Strike>,
    pub outcome: Option<ProgressionOutcome>,
    pub eco_action: Option<EcoAction>,
}

/// Per-call scratch collected while an entry point runs.
#[derive(Debug, Default)]
struct Turn {
    lines: Vec<LogLine>,
    player_strike: Option<Strike>,
    dragon_strike: Option<Strike>,
    outcome: Option<ProgressionOutcome>,
    eco_action: Option<EcoAction>,
}

impl Turn {
    fn log(&mut self, key: &str, text: String) {
        log::debug!("{key}: {text}");
        self.lines.push(LogLine {
            key: key.to_string(),
            text,
        });
    }
}

/// The battle screen's engine state.
#[derive(Debug)]
pub struct BattleSession {
    store: ProgressStore,
    rng: RngBundle,
    player: PlayerCharacter,
    dragon: DragonOpponent,
    phase: BattlePhase,
    history: Vec<LogLine>,
    challenges_used: u32,
    last_save_error: Option<String>,
}

impl BattleSession {
    /// Start a session against the shared store with an entropy-seeded RNG.
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self::with_rng(store, RngBundle::from_entropy())
    }

    /// Start a session whose rolls are reproducible from `seed`.
    #[must_use]
    pub fn with_seed(store: ProgressStore, seed: u64) -> Self {
        Self::with_rng(store, RngBundle::from_user_seed(seed))
    }

    #[must_use]
    pub fn with_rng(store: ProgressStore, rng: RngBundle) -> Self {
        let player = store.with_record(PlayerCharacter::from_record);
        Self {
            store,
            rng,
            player,
            dragon: DragonOpponent::preset(DragonTheme::default()),
            phase: BattlePhase::Menu,
            history: Vec::new(),
            challenges_used: 0,
            last_save_error: None,
        }
    }

    #[must_use]
    pub const fn player(&self) -> &PlayerCharacter {
        &self.player
    }

    #[must_use]
    pub const fn dragon(&self) -> &DragonOpponent {
        &self.dragon
    }

    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    #[must_use]
    pub const fn theme(&self) -> DragonTheme {
        self.dragon.theme
    }

    /// Every line logged since the current encounter started.
    #[must_use]
    pub fn history(&self) -> &[LogLine] {
        &self.history
    }

    /// Tokens consumed by this session.
    #[must_use]
    pub const fn challenges_used(&self) -> u32 {
        self.challenges_used
    }

    /// The most recent save failure, cleared by the next successful save.
    #[must_use]
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Current state without taking an action.
    #[must_use]
    pub fn view(&self) -> BattleView {
        self.render(Turn::default())
    }

    /// Pick the dragon for the next encounter.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::AlreadyInBattle`] while an encounter is running.
    pub fn select_theme(&mut self, theme: DragonTheme) -> Result<BattleView, BattleError> {
        if self.phase == BattlePhase::Battle {
            return Err(BattleError::AlreadyInBattle);
        }
        self.dragon = DragonOpponent::preset(theme);
        let mut turn = Turn::default();
        turn.log(
            LOG_THEME_SELECTED,
            format!(
                "Selected {} theme! Difficulty: {}",
                self.dragon.name, self.dragon.difficulty
            ),
        );
        Ok(self.finish(turn))
    }

    /// Spend one challenge token and enter battle at full health.
    ///
    /// # Errors
    ///
    /// Fails without consuming anything when a battle is already running or
    /// no tokens are left.
    pub fn start_battle(&mut self) -> Result<BattleView, BattleError> {
        if self.phase == BattlePhase::Battle {
            return Err(BattleError::AlreadyInBattle);
        }
        if !self.store.update(ProgressRecord::spend_challenge) {
            return Err(BattleError::NoChallenges);
        }
        self.sync_inventory();
        self.challenges_used = self.challenges_used.saturating_add(1);
        self.phase = BattlePhase::Battle;
        self.history.clear();
        self.player.heal_full();
        self.dragon.reset();

        let mut turn = Turn::default();
        turn.log(
            LOG_DRAGON_APPEARED,
            format!("{} {} appeared!", self.dragon.emoji, self.dragon.name),
        );
        let remaining = self.store.with_record(|record| record.game_challenges);
        turn.log(
            LOG_BATTLE_STARTED,
            format!("Battle started! Remaining challenges: {remaining}"),
        );
        self.persist();
        Ok(self.finish(turn))
    }

    /// Dispatch a turn action.
    ///
    /// # Errors
    ///
    /// See [`BattleSession::attack`], [`BattleSession::defend`] and
    /// [`BattleSession::use_potion`].
    pub fn act(&mut self, action: BattleAction) -> Result<BattleView, BattleError> {
        match action {
            BattleAction::Attack => self.attack(),
            BattleAction::Defend => self.defend(),
            BattleAction::UsePotion => self.use_potion(),
        }
    }

    /// Strike the dragon; if it survives, it strikes back.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::NotInBattle`] outside an encounter.
    pub fn attack(&mut self) -> Result<BattleView, BattleError> {
        self.ensure_in_battle()?;
        let mut turn = Turn::default();
        let strike = player_strike(&self.player, &mut self.dragon, &mut *self.rng.combat());
        turn.log(
            LOG_PLAYER_STRIKE,
            format!(
                "{} dealt {} damage to {}!",
                self.player.name, strike.damage, self.dragon.name
            ),
        );
        turn.player_strike = Some(strike);
        if self.dragon.is_defeated() {
            self.conclude(EncounterResult::Victory, &mut turn);
        } else {
            self.counter_attack(false, &mut turn);
        }
        Ok(self.finish(turn))
    }

    /// Brace for the dragon's counter-attack with the defend-stance bonus.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::NotInBattle`] outside an encounter.
    pub fn defend(&mut self) -> Result<BattleView, BattleError> {
        self.ensure_in_battle()?;
        let mut turn = Turn::default();
        turn.log(
            LOG_DEFEND_STANCE,
            format!("{} entered defense stance!", self.player.name),
        );
        self.counter_attack(true, &mut turn);
        Ok(self.finish(turn))
    }

    /// Drink a potion, then take the dragon's counter-attack.
    ///
    /// With no potions left the turn is a logged no-op: nothing is consumed
    /// and the dragon does not act.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::NotInBattle`] outside an encounter.
    pub fn use_potion(&mut self) -> Result<BattleView, BattleError> {
        self.ensure_in_battle()?;
        self.sync_inventory();
        let mut turn = Turn::default();
        let used = use_potion(&mut self.player, &mut *self.rng.combat());
        match used {
            Ok(used) => {
                turn.log(
                    LOG_POTION_USED,
                    format!(
                        "Used HP potion, restored {} HP! Remaining potions: {}",
                        used.healed, used.potions_left
                    ),
                );
            }
            Err(err) => {
                turn.log(LOG_POTION_EMPTY, format!("{err}!"));
                return Ok(self.finish(turn));
            }
        }
        self.push_inventory();
        self.persist();
        self.counter_attack(false, &mut turn);
        Ok(self.finish(turn))
    }

    /// Permanently equip one sword or armor from the inventory.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::Inventory`] with no state change when the item
    /// is missing or not equippable.
    pub fn equip(&mut self, item: ItemKind) -> Result<BattleView, BattleError> {
        self.sync_inventory();
        let equipped = equip(&mut self.player, item)?;
        let mut turn = Turn::default();
        match equipped.item {
            ItemKind::Sword => turn.log(
                LOG_EQUIP_SWORD,
                format!("Equipped iron sword! Attack is now {}", equipped.attack),
            ),
            ItemKind::Armor => turn.log(
                LOG_EQUIP_ARMOR,
                format!("Equipped iron armor! Defense is now {}", equipped.defense),
            ),
            ItemKind::Potion => {}
        }
        self.push_inventory();
        self.persist();
        Ok(self.finish(turn))
    }

    /// Reset the hero to starting stats, keeping the saved inventory.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::AlreadyInBattle`] while an encounter is running.
    pub fn restart(&mut self) -> Result<BattleView, BattleError> {
        if self.phase == BattlePhase::Battle {
            return Err(BattleError::AlreadyInBattle);
        }
        self.player = PlayerCharacter {
            inventory: self.store.with_record(|record| record.inventory),
            ..PlayerCharacter::default()
        };
        self.dragon = DragonOpponent::preset(self.dragon.theme);
        self.phase = BattlePhase::Menu;
        self.history.clear();
        let mut turn = Turn::default();
        turn.log(
            LOG_RESTARTED,
            format!("Game restarted! Ready to face {}?", self.dragon.name),
        );
        self.persist();
        Ok(self.finish(turn))
    }

    fn ensure_in_battle(&self) -> Result<(), BattleError> {
        if self.phase == BattlePhase::Battle {
            Ok(())
        } else {
            Err(BattleError::NotInBattle(self.phase))
        }
    }

    fn counter_attack(&mut self, defending: bool, turn: &mut Turn) {
        let strike = dragon_strike(
            &self.dragon,
            &mut self.player,
            defending,
            &mut *self.rng.combat(),
        );
        turn.log(
            LOG_DRAGON_STRIKE,
            format!(
                "{} dealt {} damage to {}!",
                self.dragon.name, strike.damage, self.player.name
            ),
        );
        turn.dragon_strike = Some(strike);
        if self.player.is_defeated() {
            self.conclude(EncounterResult::Defeat, turn);
        }
    }

    fn conclude(&mut self, result: EncounterResult, turn: &mut Turn) {
        let outcome = resolve_encounter(
            &mut self.player,
            &self.dragon,
            result,
            &mut *self.rng.growth(),
        );
        match result {
            EncounterResult::Victory => {
                self.phase = BattlePhase::Victory;
                turn.log(
                    LOG_VICTORY,
                    format!("Victory! Defeated {}!", self.dragon.name),
                );
                turn.eco_action = Some(self.dragon.theme.eco_action());
            }
            EncounterResult::Defeat => {
                self.phase = BattlePhase::Defeat;
                turn.log(
                    LOG_DEFEAT,
                    format!(
                        "You were defeated by {}... but your experience and equipment are saved!",
                        self.dragon.name
                    ),
                );
            }
        }
        turn.log(
            LOG_EXP_GAINED,
            format!("Gained experience: {}", outcome.exp_gained),
        );
        for level_up in &outcome.level_ups {
            let text = match level_up.gain {
                StatGain::Attack(n) => {
                    format!("Level up! Now Lv.{}, Attack +{n}", level_up.new_level)
                }
                StatGain::Defense(n) => {
                    format!("Level up! Now Lv.{}, Defense +{n}", level_up.new_level)
                }
            };
            turn.log(LOG_LEVEL_UP, text);
        }
        turn.outcome = Some(outcome);
        self.dragon.reset();
        self.persist();
    }

    /// Pull the shared inventory in; the route screen may have added rewards.
    fn sync_inventory(&mut self) {
        self.player.inventory = self.store.with_record(|record| record.inventory);
    }

    /// Write an inventory change made by this session into the record.
    /// Only valid right after [`Self::sync_inventory`] in the same call.
    fn push_inventory(&mut self) {
        let inventory = self.player.inventory;
        self.store.update(|record| record.inventory = inventory);
    }

    /// Save the character. The inventory is re-read first so rewards the
    /// route screen granted mid-battle survive the write.
    fn persist(&mut self) {
        self.sync_inventory();
        let player = &self.player;
        self.store.update(|record| player.store_into(record));
        self.last_save_error = self.store.commit().err().map(|err| err.to_string());
    }

    fn finish(&mut self, turn: Turn) -> BattleView {
        self.history.extend(turn.lines.iter().cloned());
        self.render(turn)
    }

    fn render(&self, turn: Turn) -> BattleView {
        BattleView {
            player: self.player.clone(),
            dragon: self.dragon.clone(),
            phase: self.phase,
            game_challenges: self.store.with_record(|record| record.game_challenges),
            lines: turn.lines,
            player_strike: turn.player_strike,
            dragon_strike: turn.dragon_strike,
            outcome: turn.outcome,
            eco_action: turn.eco_action,
        }
    }
}
