use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::TestScenario;
use super::simulation::{GameSimulator, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Fingerprint of the first iteration, stable for a given seed.
    pub fingerprint: Option<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    simulator: GameSimulator,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(simulator: GameSimulator, verbose: bool) -> Self {
        Self { simulator, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy.label(),
                    seed
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut fingerprint = None;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self
                .simulator
                .run_plan(&scenario.plan, scenario.name, iteration_seed)
                .and_then(|summary| {
                    if i == 0 {
                        self.check_replay(&scenario.plan, scenario.name, &summary)?;
                    }
                    Ok(summary)
                });

            let summary = match outcome {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}): run aborted: {err:#}",
                        i + 1
                    ));
                    continue;
                }
            };
            if i == 0 {
                fingerprint = Some(summary.fingerprint_hex());
            }

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                failures.push(format!(
                    "Iteration {} (seed {}, routes {}, battles {}, level {}): {}",
                    i + 1,
                    summary.seed,
                    summary.routes_taken,
                    summary.battles_fought,
                    summary.final_level,
                    err
                ));
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) co2:{:.1}kg tokens:{} wins:{}/{}",
                        i + 1,
                        iterations,
                        summary.co2_saved,
                        summary.tokens_earned,
                        summary.victories,
                        summary.battles_fought
                    );
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            fingerprint,
            average_duration,
            performance_data,
        }
    }

    /// Re-run in memory with the same seed; the fingerprint must not move.
    fn check_replay(
        &self,
        plan: &SimulationPlan,
        label: &str,
        first: &SimulationSummary,
    ) -> anyhow::Result<()> {
        let replay = GameSimulator::default().run_plan(plan, label, first.seed)?;
        anyhow::ensure!(
            replay.fingerprint == first.fingerprint,
            "replay of seed {} diverged: {} vs {}",
            first.seed,
            first.fingerprint_hex(),
            replay.fingerprint_hex()
        );
        if self.verbose {
            println!("  🔁 Replay matched {}", first.fingerprint_hex());
        }
        Ok(())
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
