//! Centralized balance and tuning constants for Ecotrail game logic.
//!
//! These values define the arithmetic for battles, leveling, route synthesis
//! and the CO₂ exchange. Keeping them together ensures that gameplay can only
//! be adjusted via code changes reviewed in version control.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_DRAGON_APPEARED: &str = "log.battle.dragon-appeared";
pub(crate) const LOG_BATTLE_STARTED: &str = "log.battle.started";
pub(crate) const LOG_PLAYER_STRIKE: &str = "log.battle.player-strike";
pub(crate) const LOG_DRAGON_STRIKE: &str = "log.battle.dragon-strike";
pub(crate) const LOG_DEFEND_STANCE: &str = "log.battle.defend";
pub(crate) const LOG_POTION_USED: &str = "log.inventory.potion-used";
pub(crate) const LOG_POTION_EMPTY: &str = "log.inventory.potion-empty";
pub(crate) const LOG_EQUIP_SWORD: &str = "log.inventory.equip-sword";
pub(crate) const LOG_EQUIP_ARMOR: &str = "log.inventory.equip-armor";
pub(crate) const LOG_VICTORY: &str = "log.battle.victory";
pub(crate) const LOG_DEFEAT: &str = "log.battle.defeat";
pub(crate) const LOG_EXP_GAINED: &str = "log.progress.exp";
pub(crate) const LOG_LEVEL_UP: &str = "log.progress.level-up";
pub(crate) const LOG_THEME_SELECTED: &str = "log.battle.theme";
pub(crate) const LOG_RESTARTED: &str = "log.battle.restart";

// Player defaults ----------------------------------------------------------
pub const PLAYER_NAME: &str = "Hero";
pub const PLAYER_BASE_HP: u32 = 100;
pub const PLAYER_BASE_ATTACK: u32 = 20;
pub const PLAYER_BASE_DEFENSE: u32 = 10;

// Combat tuning ------------------------------------------------------------
pub const PLAYER_DAMAGE_VARIANCE: i32 = 5;
pub const DRAGON_DAMAGE_VARIANCE: i32 = 3;
pub const DEFEND_STANCE_BONUS: u32 = 5;
pub const MIN_DAMAGE: u32 = 1;

// Inventory tuning ---------------------------------------------------------
pub const POTION_HEAL_MIN: u32 = 30;
pub const POTION_HEAL_MAX: u32 = 50;
pub const SWORD_ATTACK_BONUS: u32 = 10;
pub const ARMOR_DEFENSE_BONUS: u32 = 8;

// Progression tuning -------------------------------------------------------
pub const EXP_PER_LEVEL: u32 = 100;
pub const VICTORY_EXP_MIN: u32 = 50;
pub const VICTORY_EXP_MAX: u32 = 80;
pub const DEFEAT_EXP_FLOOR: u32 = 10;
pub const DEFEAT_EXP_DIVISOR: u32 = 2;
pub const LEVEL_UP_HP_GAIN: u32 = 15;
pub const LEVEL_UP_STAT_MIN: u32 = 2;
pub const LEVEL_UP_STAT_MAX: u32 = 4;
pub const LEVEL_UP_ATTACK_CHANCE: f64 = 0.5;

// Route synthesis ----------------------------------------------------------
pub const BASE_DISTANCE_MIN_KM: u32 = 5;
pub const BASE_DISTANCE_MAX_KM: u32 = 50;
pub const DRIVING_CO2_PER_KM: f64 = 0.2;
pub const TRANSIT_CO2_PER_KM: f64 = 0.05;
pub const BUS_DISTANCE_FACTOR: f64 = 1.2;
pub const TRANSFER_CODES_MIN: usize = 2;
pub const TRANSFER_CODES_MAX: usize = 4;
pub const TRANSFER_SUB_LEGS_MAX: usize = 2;
pub const WALK_SUB_LEG_MIN_KM: f64 = 0.2;
pub const WALK_SUB_LEG_MAX_KM: f64 = 0.8;
pub const CYCLE_SUB_LEG_MIN_KM: f64 = 0.5;
pub const CYCLE_SUB_LEG_MAX_KM: f64 = 2.0;
pub const ROUTE_CODE_POOL: [&str; 20] = [
    "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R101", "R102", "R103", "R104",
    "R105", "R106", "R107", "R108", "R109", "R110",
];
pub const START_PLACEHOLDER: &str = "Please enter start address...";
pub const END_PLACEHOLDER: &str = "Please enter end address...";

// Rewards and exchange -----------------------------------------------------
pub const POTION_REWARD_CHANCE: f64 = 0.5;
pub const EQUIPMENT_REWARD_CHANCE: f64 = 0.1;
pub const SWORD_SHARE_OF_EQUIPMENT: f64 = 0.5;
pub const CO2_PER_CHALLENGE_KG: f64 = 10.0;

// Environmental actions ----------------------------------------------------
pub const ECO_ACTION_LOCATION: &str = "Central Australia";
pub const ECO_ACTION_COORDINATES: &str = "25.2744°S, 133.7751°E";
