use ecotrail_game::{
    BattleAction, BattleError, BattlePhase, BattleSession, DragonTheme, EcoTrail, ItemKind,
    MemoryStore, RouteMode, defeat_exp,
};

fn assert_hp_bounds(battle: &BattleSession) {
    let hero = battle.player();
    let dragon = battle.dragon();
    assert!(hero.hp <= hero.max_hp, "hero hp {} > {}", hero.hp, hero.max_hp);
    assert!(
        dragon.hp <= dragon.max_hp,
        "dragon hp {} > {}",
        dragon.hp,
        dragon.max_hp
    );
}

/// Earn tokens on the route screen until `tokens` are available.
fn commute_for_tokens(game: &EcoTrail, seed: u64, tokens: u32) {
    let mut planner = game.planner(Some(seed));
    while game.progress().game_challenges < tokens {
        planner.generate_routes("Home", "Campus").unwrap();
        planner.select_route(5).unwrap();
        if game.progress().total_co2_saved >= 10.0 {
            planner.exchange_challenges().unwrap();
        }
    }
}

#[test]
fn routes_fund_battles_across_many_seeds() {
    for seed in 0..40_u64 {
        let game = EcoTrail::open(MemoryStore::new());
        commute_for_tokens(&game, seed, 1);
        let mut battle = game.battle(Some(seed));
        let theme = DragonTheme::ALL[usize::try_from(seed % 3).unwrap()];
        battle.select_theme(theme).unwrap();

        let before = battle.player().clone();
        let tokens = game.progress().game_challenges;
        battle.start_battle().unwrap();
        assert_eq!(game.progress().game_challenges, tokens - 1);

        let mut turns = 0;
        while battle.phase() == BattlePhase::Battle {
            let action = match turns % 4 {
                1 => BattleAction::Defend,
                3 => BattleAction::UsePotion,
                _ => BattleAction::Attack,
            };
            battle.act(action).unwrap();
            assert_hp_bounds(&battle);
            turns += 1;
            assert!(turns < 500, "battle did not end for seed {seed}");
        }

        let hero = battle.player();
        assert!(matches!(
            battle.phase(),
            BattlePhase::Victory | BattlePhase::Defeat
        ));
        assert_eq!(hero.hp, hero.max_hp);
        assert!(hero.exp < 100);
        let levels = hero.level - before.level;
        assert_eq!(hero.max_hp, before.max_hp + 15 * levels);
        assert_eq!(battle.dragon().hp, battle.dragon().max_hp);

        let saved = game.progress().player.unwrap();
        assert_eq!(saved.level, hero.level);
        assert_eq!(saved.exp, hero.exp);
        assert_eq!(saved.inventory, game.progress().inventory);
    }
}

#[test]
fn terminal_phase_needs_a_new_token() {
    let game = EcoTrail::open(MemoryStore::new());
    commute_for_tokens(&game, 7, 1);
    let mut battle = game.battle(Some(7));
    battle.start_battle().unwrap();
    while battle.phase() == BattlePhase::Battle {
        battle.attack().unwrap();
    }
    assert!(matches!(
        battle.attack(),
        Err(BattleError::NotInBattle(BattlePhase::Victory | BattlePhase::Defeat))
    ));
    if game.progress().game_challenges == 0 {
        assert_eq!(battle.start_battle(), Err(BattleError::NoChallenges));
    }
}

#[test]
fn victory_reports_an_eco_action_and_defeat_pays_damage() {
    let game = EcoTrail::open(MemoryStore::new());
    game.store().update(|record| record.game_challenges = 50);

    for seed in 0..50_u64 {
        let mut battle = game.battle(Some(seed));
        battle.select_theme(DragonTheme::Wasteland).unwrap();
        battle.start_battle().unwrap();
        let mut last = None;
        while battle.phase() == BattlePhase::Battle {
            last = Some(battle.attack().unwrap());
        }
        let view = last.unwrap();
        let outcome = view.outcome.clone().unwrap();
        match view.phase {
            BattlePhase::Victory => {
                let action = view.eco_action.clone().unwrap();
                assert_eq!(action.theme, DragonTheme::Wasteland);
                assert!((50..=80).contains(&outcome.exp_gained));
            }
            BattlePhase::Defeat => {
                assert!(view.eco_action.is_none());
                let strike = view.player_strike.unwrap();
                let dragon_max = battle.dragon().max_hp;
                assert_eq!(
                    outcome.exp_gained,
                    defeat_exp(dragon_max, strike.defender_hp_after)
                );
                assert!(outcome.exp_gained >= 10);
            }
            other => panic!("unexpected phase {other}"),
        }
    }
}

#[test]
fn route_rewards_reach_the_battle_screen() {
    let game = EcoTrail::open(MemoryStore::new());
    let mut planner = game.planner(Some(11));
    let mut battle = game.battle(Some(11));

    let mut swords = 0;
    for _ in 0..200 {
        let candidates = planner.generate_routes("Home", "Market").unwrap();
        let index = candidates
            .iter()
            .position(|candidate| {
                candidate
                    .rewards
                    .iter()
                    .any(|reward| reward.kind == ItemKind::Sword)
            })
            .unwrap_or(1);
        let selection = planner.select_route(index).unwrap();
        assert_ne!(selection.candidate.mode, RouteMode::Driving);
        swords = selection.inventory.iron_sword;
        if swords > 0 {
            break;
        }
    }
    assert!(swords > 0, "no sword reward in 200 searches");

    let attack = battle.player().attack;
    battle.equip(ItemKind::Sword).unwrap();
    assert_eq!(battle.player().attack, attack + 10);
    assert_eq!(game.progress().inventory.iron_sword, swords - 1);
}

#[test]
fn rewards_taken_mid_battle_outlive_the_encounter() {
    let game = EcoTrail::open(MemoryStore::new());
    game.store().update(|record| record.game_challenges = 1);
    let mut planner = game.planner(Some(31));
    let mut battle = game.battle(Some(31));
    battle.select_theme(DragonTheme::Flame).unwrap();
    battle.start_battle().unwrap();
    battle.attack().unwrap();

    let mut potions = 0;
    for _ in 0..100 {
        let candidates = planner.generate_routes("Arena", "Garden").unwrap();
        let Some(index) = candidates.iter().position(|candidate| {
            candidate
                .rewards
                .iter()
                .any(|reward| reward.kind == ItemKind::Potion)
        }) else {
            continue;
        };
        potions = planner.select_route(index).unwrap().inventory.potions;
        break;
    }
    assert!(potions > 0, "no potion reward in 100 searches");
    let rewarded = game.progress().inventory;

    let mut turns = 0;
    while battle.phase() == BattlePhase::Battle && turns < 500 {
        battle.act(BattleAction::Attack).unwrap();
        turns += 1;
    }
    assert_ne!(battle.phase(), BattlePhase::Battle);

    let record = game.progress();
    assert_eq!(record.inventory, rewarded);
    assert_eq!(record.player.map(|player| player.inventory), Some(rewarded));
    assert_eq!(battle.player().inventory, rewarded);

    battle.restart().unwrap();
    assert_eq!(game.progress().inventory, rewarded);
}

#[test]
fn restart_returns_to_menu_without_spending() {
    let game = EcoTrail::open(MemoryStore::new());
    game.store().update(|record| {
        record.game_challenges = 2;
        record.inventory.potions = 3;
    });
    let mut battle = game.battle(Some(3));
    battle.start_battle().unwrap();
    assert_eq!(battle.restart(), Err(BattleError::AlreadyInBattle));
    while battle.phase() == BattlePhase::Battle {
        battle.attack().unwrap();
    }
    let view = battle.restart().unwrap();
    assert_eq!(view.phase, BattlePhase::Menu);
    assert_eq!(view.player.level, 1);
    assert_eq!(view.player.attack, 20);
    assert_eq!(view.player.inventory.potions, 3);
    assert_eq!(game.progress().game_challenges, 1);
}
