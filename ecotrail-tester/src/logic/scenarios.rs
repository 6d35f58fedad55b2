use anyhow::{Result, ensure};
use ecotrail_game::DragonTheme;

use super::simulation::{BattleStrategy, CommuteChoice, SimulationPlan, SimulationSummary};

/// Named plan with a human description.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

fn no_violations(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.violations.is_empty(),
        "invariant violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn battles_resolve(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.victories + summary.defeats == summary.battles_fought,
        "{} battles fought but {} victories and {} defeats",
        summary.battles_fought,
        summary.victories,
        summary.defeats
    );
    Ok(())
}

fn co2_ledger_balances(summary: &SimulationSummary) -> Result<()> {
    let spent = f64::from(summary.tokens_earned) * 10.0;
    let remaining = summary.final_record.total_co2_saved;
    ensure!(
        (remaining + spent - summary.co2_saved).abs() < 1e-6,
        "saved {:.3} kg but {remaining:.3} kg left after spending {spent:.1} kg",
        summary.co2_saved
    );
    ensure!(
        remaining < 10.0 || summary.exchange_rejections > 0 || summary.tokens_earned > 0,
        "{remaining:.3} kg left unexchanged"
    );
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    no_violations(summary)?;
    ensure!(summary.routes_taken == 3, "expected 3 routes, took {}", summary.routes_taken);
    ensure!(summary.eco_routes == 3, "every smoke route should be eco");
    ensure!(
        summary.final_record.eco_routes_taken == 3,
        "eco route counter is {}",
        summary.final_record.eco_routes_taken
    );
    Ok(())
}

fn campaign_expectation(summary: &SimulationSummary) -> Result<()> {
    no_violations(summary)?;
    battles_resolve(summary)?;
    co2_ledger_balances(summary)?;
    ensure!(summary.tokens_earned > 0, "a long green commute should earn tokens");
    ensure!(summary.battles_fought > 0, "earned tokens should fund a battle");
    ensure!(summary.save_errors == 0, "{} saves failed", summary.save_errors);
    Ok(())
}

fn driver_expectation(summary: &SimulationSummary) -> Result<()> {
    no_violations(summary)?;
    ensure!(summary.eco_routes == 0, "driving is not an eco route");
    ensure!(summary.co2_saved.abs() < f64::EPSILON, "driving saved CO₂");
    ensure!(summary.exchange_rejections == 1, "exchange should be rejected");
    ensure!(summary.battles_fought == 0, "battle started without tokens");
    Ok(())
}

fn exchange_expectation(summary: &SimulationSummary) -> Result<()> {
    co2_ledger_balances(summary)?;
    let remaining = summary.final_record.total_co2_saved;
    ensure!(
        (0.0..10.0).contains(&remaining),
        "exchange left {remaining:.3} kg"
    );
    ensure!(
        summary.final_record.game_challenges == summary.tokens_earned,
        "token balance {} differs from tokens earned {}",
        summary.final_record.game_challenges,
        summary.tokens_earned
    );
    Ok(())
}

fn gauntlet_expectation(summary: &SimulationSummary) -> Result<()> {
    no_violations(summary)?;
    battles_resolve(summary)?;
    ensure!(summary.final_level >= 1, "level dropped below 1");
    let player = summary
        .final_record
        .player
        .ok_or_else(|| anyhow::anyhow!("battle screen did not save the character"))?;
    ensure!(player.level == summary.final_level, "saved level is stale");
    ensure!(player.exp < 100, "saved exp {} not converted", player.exp);
    ensure!(
        player.inventory == summary.final_record.inventory,
        "character and record inventories disagree"
    );
    Ok(())
}

fn crosstown_expectation(summary: &SimulationSummary) -> Result<()> {
    no_violations(summary)?;
    battles_resolve(summary)?;
    ensure!(
        summary.battles_fought == 0 || summary.mid_battle_routes > 0,
        "no commute happened between battle turns"
    );
    let saved = summary.final_record.inventory;
    if let Some(player) = summary.final_record.player {
        ensure!(
            player.inventory == saved,
            "character inventory {:?} differs from saved {saved:?}",
            player.inventory
        );
    }
    Ok(())
}

fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario {
            key: "smoke",
            name: "Smoke",
            description: "Three eco commutes and one attempted battle",
            plan: SimulationPlan::new(CommuteChoice::FirstEco, BattleStrategy::Aggressive)
                .with_commutes(3)
                .with_expectation(smoke_expectation),
        },
        TestScenario {
            key: "campaign",
            name: "Green Campaign",
            description: "Forty greenest commutes funding a series of flame dragon fights",
            plan: SimulationPlan::new(CommuteChoice::Greenest, BattleStrategy::Healer)
                .with_commutes(40)
                .with_battles(20)
                .with_equipment()
                .with_theme(DragonTheme::Flame)
                .with_expectation(campaign_expectation),
        },
        TestScenario {
            key: "driver",
            name: "Driver",
            description: "Driving every day earns nothing and unlocks no battles",
            plan: SimulationPlan::new(CommuteChoice::Driving, BattleStrategy::Aggressive)
                .with_commutes(10)
                .with_expectation(driver_expectation),
        },
        TestScenario {
            key: "exchange",
            name: "Batched Exchange",
            description: "One exchange converts every full 10 kg block at once",
            plan: SimulationPlan::new(CommuteChoice::Greenest, BattleStrategy::Aggressive)
                .with_commutes(12)
                .with_battles(0)
                .with_expectation(exchange_expectation),
        },
        TestScenario {
            key: "gauntlet",
            name: "Wasteland Gauntlet",
            description: "Guarded fights against the wasteland dragon until tokens run out",
            plan: SimulationPlan::new(CommuteChoice::Greenest, BattleStrategy::Guarded)
                .with_commutes(30)
                .with_battles(50)
                .with_theme(DragonTheme::Wasteland)
                .with_expectation(gauntlet_expectation),
        },
        TestScenario {
            key: "crosstown",
            name: "Crosstown Dash",
            description: "Commutes taken between battle turns keep their rewards",
            plan: SimulationPlan::new(CommuteChoice::FirstEco, BattleStrategy::Healer)
                .with_commutes(25)
                .with_battles(6)
                .with_commutes_during_battle(2)
                .with_expectation(crosstown_expectation),
        },
    ]
}

/// Keys and descriptions of every scenario, in catalog order.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog()
        .into_iter()
        .find(|scenario| scenario.key.eq_ignore_ascii_case(key))
}
