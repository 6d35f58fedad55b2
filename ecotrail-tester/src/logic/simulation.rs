use anyhow::{Context, Result};
use ecotrail_game::{
    BattleAction, BattlePhase, BattleSession, BattleView, DragonTheme, EcoTrail, ItemKind,
    JsonFileStore, MemoryStore, ProgressRecord, ProgressStorage, RouteCandidate, RoutePlanner,
};
use serde::Serialize;
use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use twox_hash::XxHash64;

/// Turn cap per encounter; a fight this long means the rules stopped converging.
pub const MAX_TURNS_PER_BATTLE: u32 = 500;

const COMMUTE_START: &str = "Home";
const COMMUTE_END: &str = "Work";

/// How the simulated player fights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStrategy {
    /// Attack every turn.
    Aggressive,
    /// Defend every third turn.
    Guarded,
    /// Drink a potion below a third of max hp.
    Healer,
}

impl BattleStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Guarded => "guarded",
            Self::Healer => "healer",
        }
    }

    fn choose(self, battle: &BattleSession, turn: u32) -> BattleAction {
        let hero = battle.player();
        match self {
            Self::Aggressive => BattleAction::Attack,
            Self::Guarded if turn % 3 == 2 => BattleAction::Defend,
            Self::Guarded => BattleAction::Attack,
            Self::Healer if hero.hp * 3 < hero.max_hp && hero.inventory.potions > 0 => {
                BattleAction::UsePotion
            }
            Self::Healer => BattleAction::Attack,
        }
    }
}

/// Which candidate the simulated commuter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommuteChoice {
    /// Largest CO₂ saving.
    Greenest,
    /// First eco candidate in list order.
    FirstEco,
    /// Always drive.
    Driving,
}

impl CommuteChoice {
    fn pick(self, candidates: &[RouteCandidate]) -> usize {
        match self {
            Self::Greenest => candidates
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.co2_saved().total_cmp(&b.co2_saved()))
                .map_or(0, |(index, _)| index),
            Self::FirstEco => candidates
                .iter()
                .position(|candidate| candidate.is_eco)
                .unwrap_or(0),
            Self::Driving => candidates
                .iter()
                .position(|candidate| !candidate.is_eco)
                .unwrap_or(0),
        }
    }
}

pub type Expectation = fn(&SimulationSummary) -> Result<()>;

/// A scripted play session: commute, exchange, then fight.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub commutes: u32,
    pub commute: CommuteChoice,
    pub battles: u32,
    pub strategy: BattleStrategy,
    pub theme: DragonTheme,
    pub equip_rewards: bool,
    /// Take one commute every this many battle turns; 0 never does.
    pub commute_every_turns: u32,
    pub expectations: Vec<Expectation>,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            commutes: 5,
            commute: CommuteChoice::FirstEco,
            battles: 1,
            strategy: BattleStrategy::Aggressive,
            theme: DragonTheme::default(),
            equip_rewards: false,
            commute_every_turns: 0,
            expectations: Vec::new(),
        }
    }
}

impl SimulationPlan {
    #[must_use]
    pub fn new(commute: CommuteChoice, strategy: BattleStrategy) -> Self {
        Self {
            commute,
            strategy,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_commutes(mut self, commutes: u32) -> Self {
        self.commutes = commutes;
        self
    }

    #[must_use]
    pub const fn with_battles(mut self, battles: u32) -> Self {
        self.battles = battles;
        self
    }

    #[must_use]
    pub const fn with_theme(mut self, theme: DragonTheme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub const fn with_equipment(mut self) -> Self {
        self.equip_rewards = true;
        self
    }

    #[must_use]
    pub const fn with_commutes_during_battle(mut self, every_turns: u32) -> Self {
        self.commute_every_turns = every_turns;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// Everything observed while running one plan under one seed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub routes_taken: u32,
    pub mid_battle_routes: u32,
    pub eco_routes: u32,
    pub co2_saved: f64,
    pub tokens_earned: u32,
    pub exchange_rejections: u32,
    pub items_equipped: u32,
    pub battles_fought: u32,
    pub victories: u32,
    pub defeats: u32,
    pub turns: u32,
    pub final_level: u32,
    pub save_errors: u32,
    pub violations: Vec<String>,
    pub final_record: ProgressRecord,
    pub fingerprint: u64,
}

impl SimulationSummary {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        format!("{:016x}", self.fingerprint)
    }
}

/// Drives the engine through a [`SimulationPlan`].
#[derive(Debug, Clone, Default)]
pub struct GameSimulator {
    save_dir: Option<PathBuf>,
}

impl GameSimulator {
    /// Run against in-memory progress, or against JSON files in `save_dir`.
    #[must_use]
    pub const fn new(save_dir: Option<PathBuf>) -> Self {
        Self { save_dir }
    }

    #[must_use]
    pub fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }

    /// Play `plan` from a fresh record.
    ///
    /// # Errors
    ///
    /// Returns an error when the save directory cannot be prepared or the
    /// engine rejects a step the plan guarantees to be valid.
    pub fn run_plan(
        &self,
        plan: &SimulationPlan,
        label: &str,
        seed: u64,
    ) -> Result<SimulationSummary> {
        let save_path = self.prepare_save(label, seed)?;
        let game = match &save_path {
            Some(path) => EcoTrail::open(JsonFileStore::new(path)),
            None => EcoTrail::open(MemoryStore::new()),
        };
        let mut summary = SimulationSummary::new(seed);
        let mut hasher = XxHash64::with_seed(seed);

        let mut planner = game.planner(Some(seed));
        commute(&mut planner, plan, &mut summary, &mut hasher)?;

        let mut battle = game.battle(Some(seed));
        if plan.equip_rewards {
            for item in [ItemKind::Sword, ItemKind::Armor] {
                while battle.equip(item).is_ok() {
                    summary.items_equipped += 1;
                }
            }
        }
        battle
            .select_theme(plan.theme)
            .context("theme selection outside battle")?;
        for _ in 0..plan.battles {
            if battle.start_battle().is_err() {
                break;
            }
            summary.battles_fought += 1;
            fight(&mut battle, &mut planner, plan, &mut summary, &mut hasher)?;
            if battle.last_save_error().is_some() {
                summary.save_errors += 1;
            }
            let saved = game.store().with_record(|record| record.inventory);
            if battle.player().inventory != saved {
                summary.violations.push(format!(
                    "battle inventory {:?} diverged from saved {saved:?}",
                    battle.player().inventory
                ));
            }
        }

        summary.final_level = battle.player().level;
        summary.final_record = game.progress();
        hasher.write(&serde_json::to_vec(&summary.final_record)?);
        summary.fingerprint = hasher.finish();

        if let Some(path) = save_path {
            let reloaded = JsonFileStore::new(&path).load();
            if reloaded != summary.final_record {
                summary
                    .violations
                    .push(format!("save file {} diverged from memory", path.display()));
            }
        }
        log::debug!(
            "{label} seed {seed}: {} routes, {} battles, fingerprint {}",
            summary.routes_taken,
            summary.battles_fought,
            summary.fingerprint_hex()
        );
        Ok(summary)
    }

    fn prepare_save(&self, label: &str, seed: u64) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.save_dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let slug: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let path = dir.join(format!("{slug}-{seed}.json"));
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("clearing {}", path.display()))?;
        }
        Ok(Some(path))
    }
}

fn take_route(
    planner: &mut RoutePlanner,
    choice: CommuteChoice,
    summary: &mut SimulationSummary,
    hasher: &mut XxHash64,
) -> Result<()> {
    let candidates = planner.generate_routes(COMMUTE_START, COMMUTE_END)?;
    let index = choice.pick(candidates);
    let selection = planner.select_route(index)?;
    summary.routes_taken += 1;
    if selection.candidate.is_eco {
        summary.eco_routes += 1;
    }
    summary.co2_saved += selection.co2_saved;
    hasher.write(selection.candidate.mode.key().as_bytes());
    hasher.write(selection.candidate.transfer.to_string().as_bytes());
    if planner.last_save_error().is_some() {
        summary.save_errors += 1;
    }
    Ok(())
}

fn commute(
    planner: &mut RoutePlanner,
    plan: &SimulationPlan,
    summary: &mut SimulationSummary,
    hasher: &mut XxHash64,
) -> Result<()> {
    for _ in 0..plan.commutes {
        take_route(planner, plan.commute, summary, hasher)?;
    }
    match planner.exchange_challenges() {
        Ok(receipt) => summary.tokens_earned += receipt.tokens_gained,
        Err(err) => {
            log::debug!("exchange rejected: {err}");
            summary.exchange_rejections += 1;
        }
    }
    Ok(())
}

fn fight(
    battle: &mut BattleSession,
    planner: &mut RoutePlanner,
    plan: &SimulationPlan,
    summary: &mut SimulationSummary,
    hasher: &mut XxHash64,
) -> Result<()> {
    let mut turn = 0;
    while battle.phase() == BattlePhase::Battle {
        if turn >= MAX_TURNS_PER_BATTLE {
            summary
                .violations
                .push(format!("battle exceeded {MAX_TURNS_PER_BATTLE} turns"));
            return Ok(());
        }
        if plan.commute_every_turns > 0 && turn > 0 && turn % plan.commute_every_turns == 0 {
            take_route(planner, plan.commute, summary, hasher)?;
            summary.mid_battle_routes += 1;
        }
        let action = plan.strategy.choose(battle, turn);
        let view = battle.act(action)?;
        for line in &view.lines {
            hasher.write(line.key.as_bytes());
        }
        check_bounds(&view, &mut summary.violations);
        turn += 1;
    }
    summary.turns += turn;
    match battle.phase() {
        BattlePhase::Victory => summary.victories += 1,
        BattlePhase::Defeat => summary.defeats += 1,
        BattlePhase::Menu | BattlePhase::Battle => {}
    }
    Ok(())
}

fn check_bounds(view: &BattleView, violations: &mut Vec<String>) {
    if view.player.hp > view.player.max_hp {
        violations.push(format!(
            "hero hp {} above max {}",
            view.player.hp, view.player.max_hp
        ));
    }
    if view.dragon.hp > view.dragon.max_hp {
        violations.push(format!(
            "dragon hp {} above max {}",
            view.dragon.hp, view.dragon.max_hp
        ));
    }
    if view.phase != BattlePhase::Battle && view.player.exp >= 100 {
        violations.push(format!("exp {} left unconverted", view.player.exp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_fingerprint() {
        let plan = SimulationPlan::new(CommuteChoice::Greenest, BattleStrategy::Healer)
            .with_commutes(20)
            .with_battles(3);
        let simulator = GameSimulator::default();
        let a = simulator.run_plan(&plan, "replay", 42).unwrap();
        let b = simulator.run_plan(&plan, "replay", 42).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.final_record, b.final_record);
        assert!(a.violations.is_empty());
    }

    #[test]
    fn driving_never_earns_tokens() {
        let plan = SimulationPlan::new(CommuteChoice::Driving, BattleStrategy::Aggressive)
            .with_commutes(8);
        let summary = GameSimulator::default().run_plan(&plan, "drive", 3).unwrap();
        assert_eq!(summary.eco_routes, 0);
        assert_eq!(summary.exchange_rejections, 1);
        assert_eq!(summary.battles_fought, 0);
        assert!(summary.co2_saved.abs() < f64::EPSILON);
    }

    #[test]
    fn greenest_pick_maximises_saving() {
        let game = EcoTrail::open(MemoryStore::new());
        let mut planner = game.planner(Some(1));
        let candidates = planner.generate_routes("A", "B").unwrap().to_vec();
        let best = CommuteChoice::Greenest.pick(&candidates);
        assert!(
            candidates
                .iter()
                .all(|candidate| candidate.co2_saved() <= candidates[best].co2_saved())
        );
        assert_eq!(CommuteChoice::FirstEco.pick(&candidates), 1);
        assert_eq!(CommuteChoice::Driving.pick(&candidates), 0);
    }

    #[test]
    fn commutes_between_turns_keep_inventories_aligned() {
        let plan = SimulationPlan::new(CommuteChoice::FirstEco, BattleStrategy::Healer)
            .with_commutes(25)
            .with_battles(4)
            .with_commutes_during_battle(1);
        for seed in [2_u64, 17, 400] {
            let summary = GameSimulator::default().run_plan(&plan, "crosstown", seed).unwrap();
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            assert!(summary.battles_fought > 0);
            assert!(summary.mid_battle_routes > 0);
            assert_eq!(summary.routes_taken, 25 + summary.mid_battle_routes);
        }
    }

    #[test]
    fn file_backed_runs_match_memory_runs() {
        let dir = std::env::temp_dir().join(format!("ecotrail-sim-{}", std::process::id()));
        let plan = SimulationPlan::new(CommuteChoice::Greenest, BattleStrategy::Guarded)
            .with_commutes(15)
            .with_battles(2);
        let on_disk = GameSimulator::new(Some(dir.clone()))
            .run_plan(&plan, "Disk Run", 9)
            .unwrap();
        let in_memory = GameSimulator::default().run_plan(&plan, "Disk Run", 9).unwrap();
        assert!(on_disk.violations.is_empty(), "{:?}", on_disk.violations);
        assert_eq!(on_disk.save_errors, 0);
        assert_eq!(on_disk.fingerprint, in_memory.fingerprint);
        assert!(dir.join("disk-run-9.json").exists());
        let _ = fs::remove_dir_all(dir);
    }
}
