//! Route candidate synthesis and eco reward rolls.
//!
//! There is no map data: a search draws one base distance and derives six
//! fixed candidates from it. Only the transfer descriptions and the rewards
//! attached to eco candidates are random.
use rand::Rng;
use rand::seq::{SliceRandom, index};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{
    BASE_DISTANCE_MAX_KM, BASE_DISTANCE_MIN_KM, BUS_DISTANCE_FACTOR, CYCLE_SUB_LEG_MAX_KM,
    CYCLE_SUB_LEG_MIN_KM, DRIVING_CO2_PER_KM, EQUIPMENT_REWARD_CHANCE, POTION_REWARD_CHANCE,
    ROUTE_CODE_POOL, SWORD_SHARE_OF_EQUIPMENT, TRANSFER_CODES_MAX, TRANSFER_CODES_MIN,
    TRANSFER_SUB_LEGS_MAX, TRANSIT_CO2_PER_KM, WALK_SUB_LEG_MAX_KM, WALK_SUB_LEG_MIN_KM,
};
use crate::numbers::{round_to_tenths, u32_to_f64};
use crate::progress::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Driving,
    Bus,
    BusWalkingA,
    BusWalkingB,
    BusCyclingA,
    BusCyclingB,
}

/// Non-transit segment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    Walk,
    Cycle,
}

impl LegKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Cycle => "cycle",
        }
    }

    const fn sub_leg_range(self) -> (f64, f64) {
        match self {
            Self::Walk => (WALK_SUB_LEG_MIN_KM, WALK_SUB_LEG_MAX_KM),
            Self::Cycle => (CYCLE_SUB_LEG_MIN_KM, CYCLE_SUB_LEG_MAX_KM),
        }
    }
}

/// Fixed per-mode formulas over the base distance.
struct ModeFormula {
    distance_factor: f64,
    time_factor: f64,
    time_offset: f64,
    co2_per_km: f64,
    co2_offset: f64,
}

impl RouteMode {
    /// Candidate order in every search.
    pub const ALL: [Self; 6] = [
        Self::Driving,
        Self::Bus,
        Self::BusWalkingA,
        Self::BusWalkingB,
        Self::BusCyclingA,
        Self::BusCyclingB,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Bus => "bus",
            Self::BusWalkingA => "bus_walking_a",
            Self::BusWalkingB => "bus_walking_b",
            Self::BusCyclingA => "bus_cycling_a",
            Self::BusCyclingB => "bus_cycling_b",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Driving => "Driving Route",
            Self::Bus => "Bus Route",
            Self::BusWalkingA => "Bus + Walking Route A",
            Self::BusWalkingB => "Bus + Walking Route B",
            Self::BusCyclingA => "Bus + Cycling Route A",
            Self::BusCyclingB => "Bus + Cycling Route B",
        }
    }

    #[must_use]
    pub const fn is_eco(self) -> bool {
        !matches!(self, Self::Driving)
    }

    /// Mandatory final non-transit segment, if the mode has one.
    #[must_use]
    pub const fn last_mile(self) -> Option<(LegKind, f64)> {
        match self {
            Self::Driving | Self::Bus => None,
            Self::BusWalkingA => Some((LegKind::Walk, 1.0)),
            Self::BusWalkingB => Some((LegKind::Walk, 1.5)),
            Self::BusCyclingA => Some((LegKind::Cycle, 3.0)),
            Self::BusCyclingB => Some((LegKind::Cycle, 5.0)),
        }
    }

    const fn formula(self) -> ModeFormula {
        let (distance_factor, time_factor, time_offset, co2_per_km, co2_offset) = match self {
            Self::Driving => (1.0, 2.0, 0.0, DRIVING_CO2_PER_KM, 0.0),
            Self::Bus => (BUS_DISTANCE_FACTOR, 3.0, 0.0, TRANSIT_CO2_PER_KM, 0.0),
            Self::BusWalkingA => (1.0, 2.5, 12.0, TRANSIT_CO2_PER_KM, 0.2),
            Self::BusWalkingB => (1.0, 2.3, 18.0, TRANSIT_CO2_PER_KM, 0.3),
            Self::BusCyclingA => (1.0, 2.5, 12.0, TRANSIT_CO2_PER_KM, 0.6),
            Self::BusCyclingB => (1.0, 2.2, 20.0, TRANSIT_CO2_PER_KM, 1.0),
        };
        ModeFormula {
            distance_factor,
            time_factor,
            time_offset,
            co2_per_km,
            co2_offset,
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferLeg {
    Transit { code: String },
    Connection { kind: LegKind, km: f64 },
    LastMile { kind: LegKind, km: f64 },
}

impl fmt::Display for TransferLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transit { code } => f.write_str(code),
            Self::Connection { kind, km } => write!(f, "({} {km:.1}km)", kind.as_str()),
            Self::LastMile { kind, km } => {
                write!(f, "{} {km:.1}km to destination", kind.as_str())
            }
        }
    }
}

/// Ordered transit legs of one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub legs: SmallVec<[TransferLeg; 8]>,
}

impl TransferPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Route codes in riding order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.legs.iter().filter_map(|leg| match leg {
            TransferLeg::Transit { code } => Some(code.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for TransferPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, leg) in self.legs.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{leg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub kind: ItemKind,
    pub count: u32,
}

pub type Rewards = SmallVec<[Reward; 2]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub name: String,
    pub mode: RouteMode,
    pub is_eco: bool,
    pub distance_km: f64,
    pub time_minutes: f64,
    pub co2_kg: f64,
    pub transfer: TransferPlan,
    pub rewards: Rewards,
}

impl RouteCandidate {
    /// Emission of driving this candidate's own distance.
    #[must_use]
    pub fn driving_co2(&self) -> f64 {
        self.distance_km * DRIVING_CO2_PER_KM
    }

    /// CO₂ saved compared with driving; zero for the driving candidate.
    #[must_use]
    pub fn co2_saved(&self) -> f64 {
        if self.is_eco {
            self.driving_co2() - self.co2_kg
        } else {
            0.0
        }
    }
}

/// Draw the base distance for one search.
pub fn roll_base_distance(rng: &mut impl Rng) -> u32 {
    rng.gen_range(BASE_DISTANCE_MIN_KM..=BASE_DISTANCE_MAX_KM)
}

/// Draw a base distance and derive the six candidates from it.
pub fn generate_candidates(
    route_rng: &mut impl Rng,
    loot_rng: &mut impl Rng,
) -> (u32, Vec<RouteCandidate>) {
    let base_km = roll_base_distance(route_rng);
    (base_km, build_candidates(base_km, route_rng, loot_rng))
}

/// Derive the six candidates for `base_km`.
///
/// Distance, time and CO₂ are pure functions of `base_km`; `route_rng`
/// drives transfer descriptions and `loot_rng` the eco rewards.
pub fn build_candidates(
    base_km: u32,
    route_rng: &mut impl Rng,
    loot_rng: &mut impl Rng,
) -> Vec<RouteCandidate> {
    let base = u32_to_f64(base_km);
    RouteMode::ALL
        .iter()
        .map(|&mode| {
            let formula = mode.formula();
            let transfer = match mode {
                RouteMode::Driving => TransferPlan::default(),
                _ => build_transfer(mode.last_mile(), route_rng),
            };
            let rewards = if mode.is_eco() {
                roll_eco_rewards(loot_rng)
            } else {
                Rewards::new()
            };
            RouteCandidate {
                name: mode.display_name().to_string(),
                mode,
                is_eco: mode.is_eco(),
                distance_km: base * formula.distance_factor,
                time_minutes: base * formula.time_factor + formula.time_offset,
                co2_kg: base * formula.co2_per_km - formula.co2_offset,
                transfer,
                rewards,
            }
        })
        .collect()
}

/// Independent reward rolls for one eco candidate: maybe a potion, and at
/// most one piece of equipment.
pub fn roll_eco_rewards(rng: &mut impl Rng) -> Rewards {
    let mut rewards = Rewards::new();
    if rng.gen_bool(POTION_REWARD_CHANCE) {
        rewards.push(Reward {
            kind: ItemKind::Potion,
            count: 1,
        });
    }
    if rng.gen_bool(EQUIPMENT_REWARD_CHANCE) {
        let kind = if rng.gen_bool(SWORD_SHARE_OF_EQUIPMENT) {
            ItemKind::Sword
        } else {
            ItemKind::Armor
        };
        rewards.push(Reward { kind, count: 1 });
    }
    rewards
}

/// Sample distinct route codes, and for walk/cycle modes insert connection
/// legs after randomly chosen non-final codes plus the last-mile leg.
pub fn build_transfer(last_mile: Option<(LegKind, f64)>, rng: &mut impl Rng) -> TransferPlan {
    let count = rng.gen_range(TRANSFER_CODES_MIN..=TRANSFER_CODES_MAX);
    let codes: Vec<&str> = ROUTE_CODE_POOL
        .choose_multiple(rng, count)
        .copied()
        .collect();

    let mut plan = TransferPlan::default();
    let Some((kind, final_km)) = last_mile else {
        plan.legs.extend(codes.into_iter().map(|code| TransferLeg::Transit {
            code: code.to_string(),
        }));
        return plan;
    };

    let gaps = codes.len() - 1;
    let connections = rng.gen_range(1..=TRANSFER_SUB_LEGS_MAX.min(gaps));
    let connect_after = index::sample(rng, gaps, connections).into_vec();
    let (min_km, max_km) = kind.sub_leg_range();
    for (i, code) in codes.into_iter().enumerate() {
        plan.legs.push(TransferLeg::Transit {
            code: code.to_string(),
        });
        if connect_after.contains(&i) {
            plan.legs.push(TransferLeg::Connection {
                kind,
                km: round_to_tenths(rng.gen_range(min_km..=max_km)),
            });
        }
    }
    plan.legs.push(TransferLeg::LastMile {
        kind,
        km: final_km,
    });
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn candidates(base: u32, seed: u64) -> Vec<RouteCandidate> {
        let mut route = SmallRng::seed_from_u64(seed);
        let mut loot = SmallRng::seed_from_u64(seed ^ 0xFF);
        build_candidates(base, &mut route, &mut loot)
    }

    #[test]
    fn base_ten_figures() {
        let all = candidates(10, 1);
        assert_eq!(all.len(), 6);
        let driving = &all[0];
        assert_eq!(driving.mode, RouteMode::Driving);
        assert!(!driving.is_eco);
        assert!(close(driving.distance_km, 10.0));
        assert!(close(driving.time_minutes, 20.0));
        assert!(close(driving.co2_kg, 2.0));
        assert!(driving.rewards.is_empty());
        assert!(driving.transfer.is_empty());

        let bus = &all[1];
        assert!(close(bus.distance_km, 12.0));
        assert!(close(bus.time_minutes, 30.0));
        assert!(close(bus.co2_kg, 0.5));

        let cycle_b = &all[5];
        assert!(close(cycle_b.time_minutes, 42.0));
        assert!(close(cycle_b.co2_kg, -0.5));
    }

    #[test]
    fn eco_candidates_save_co2_for_every_base() {
        for base in BASE_DISTANCE_MIN_KM..=BASE_DISTANCE_MAX_KM {
            for candidate in candidates(base, u64::from(base)) {
                assert_eq!(candidate.is_eco, candidate.mode != RouteMode::Driving);
                if candidate.is_eco {
                    assert!(candidate.co2_kg < candidate.driving_co2());
                    assert!(candidate.co2_saved() > 0.0);
                } else {
                    assert!(close(candidate.co2_saved(), 0.0));
                }
            }
        }
    }

    #[test]
    fn bus_saving_uses_its_longer_distance() {
        let all = candidates(20, 3);
        assert!(close(all[1].co2_saved(), 20.0 * 1.2 * 0.2 - 20.0 * 0.05));
    }

    #[test]
    fn transfers_use_distinct_codes_and_end_with_last_mile() {
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..200 {
            let plan = build_transfer(Some((LegKind::Cycle, 3.0)), &mut rng);
            let codes: Vec<&str> = plan.codes().collect();
            assert!((2..=4).contains(&codes.len()));
            let unique: HashSet<&str> = codes.iter().copied().collect();
            assert_eq!(unique.len(), codes.len());
            assert!(codes.iter().all(|code| ROUTE_CODE_POOL.contains(code)));

            let connections: Vec<f64> = plan
                .legs
                .iter()
                .filter_map(|leg| match leg {
                    TransferLeg::Connection { km, .. } => Some(*km),
                    _ => None,
                })
                .collect();
            assert!((1..=2).contains(&connections.len()));
            assert!(connections.len() < codes.len());
            assert!(connections.iter().all(|km| (0.5..=2.0).contains(km)));
            assert_eq!(
                plan.legs.last(),
                Some(&TransferLeg::LastMile {
                    kind: LegKind::Cycle,
                    km: 3.0
                })
            );
            assert!(matches!(plan.legs[0], TransferLeg::Transit { .. }));
        }
    }

    #[test]
    fn plain_bus_has_codes_only() {
        let mut rng = SmallRng::seed_from_u64(5);
        let plan = build_transfer(None, &mut rng);
        assert!(
            plan.legs
                .iter()
                .all(|leg| matches!(leg, TransferLeg::Transit { .. }))
        );
        assert!(!plan.to_string().contains("destination"));
    }

    #[test]
    fn transfer_renders_arrow_chain() {
        let plan = TransferPlan {
            legs: SmallVec::from_vec(vec![
                TransferLeg::Transit { code: "R3".into() },
                TransferLeg::Connection {
                    kind: LegKind::Walk,
                    km: 0.4,
                },
                TransferLeg::Transit {
                    code: "R105".into(),
                },
                TransferLeg::LastMile {
                    kind: LegKind::Walk,
                    km: 1.0,
                },
            ]),
        };
        assert_eq!(
            plan.to_string(),
            "R3 -> (walk 0.4km) -> R105 -> walk 1.0km to destination"
        );
    }

    #[test]
    fn rewards_hold_at_most_one_equipment_piece() {
        let mut rng = SmallRng::seed_from_u64(44);
        let mut potions = 0_u32;
        let mut equipment = 0_u32;
        for _ in 0..4000 {
            let rewards = roll_eco_rewards(&mut rng);
            assert!(rewards.len() <= 2);
            let gear = rewards
                .iter()
                .filter(|reward| reward.kind != ItemKind::Potion)
                .count();
            assert!(gear <= 1);
            potions += u32::try_from(rewards.len() - gear).unwrap();
            equipment += u32::try_from(gear).unwrap();
        }
        assert!((1700..=2300).contains(&potions));
        assert!((250..=550).contains(&equipment));
    }

    #[test]
    fn base_distance_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..500 {
            assert!((5..=50).contains(&roll_base_distance(&mut rng)));
        }
    }
}
