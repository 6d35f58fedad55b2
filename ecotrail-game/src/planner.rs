//! The route screen: search, selection and the CO₂ exchange.
use serde::Serialize;
use thiserror::Error;

use crate::constants::{END_PLACEHOLDER, START_PLACEHOLDER};
use crate::progress::{ExchangeError, ExchangeReceipt, Inventory, ProgressRecord};
use crate::rng::RngBundle;
use crate::routes::{RouteCandidate, Rewards, generate_candidates};
use crate::store::ProgressStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("please enter a start address")]
    BlankStart,
    #[error("please enter an end address")]
    BlankEnd,
    #[error("no route candidates; search for routes first")]
    NoCandidates,
    #[error("route {index} does not exist ({available} candidates)")]
    IndexOutOfRange { index: usize, available: usize },
}

/// The endpoints and base distance behind the current candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSearch {
    pub start: String,
    pub end: String,
    pub base_km: u32,
}

/// Summary of a chosen route and the totals after applying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSelection {
    pub candidate: RouteCandidate,
    pub co2_saved: f64,
    pub rewards_granted: Rewards,
    pub total_co2_saved: f64,
    pub eco_routes_taken: u32,
    pub game_challenges: u32,
    pub inventory: Inventory,
}

#[derive(Debug)]
pub struct RoutePlanner {
    store: ProgressStore,
    rng: RngBundle,
    search: Option<RouteSearch>,
    candidates: Vec<RouteCandidate>,
    last_save_error: Option<String>,
}

fn is_blank(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == START_PLACEHOLDER || text == END_PLACEHOLDER
}

impl RoutePlanner {
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self::with_rng(store, RngBundle::from_entropy())
    }

    #[must_use]
    pub fn with_seed(store: ProgressStore, seed: u64) -> Self {
        Self::with_rng(store, RngBundle::from_user_seed(seed))
    }

    #[must_use]
    pub fn with_rng(store: ProgressStore, rng: RngBundle) -> Self {
        Self {
            store,
            rng,
            search: None,
            candidates: Vec::new(),
            last_save_error: None,
        }
    }

    /// Candidates of the current search; empty after a selection.
    #[must_use]
    pub fn candidates(&self) -> &[RouteCandidate] {
        &self.candidates
    }

    #[must_use]
    pub const fn search(&self) -> Option<&RouteSearch> {
        self.search.as_ref()
    }

    /// Snapshot of the shared progress record.
    #[must_use]
    pub fn progress(&self) -> ProgressRecord {
        self.store.record()
    }

    #[must_use]
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Fabricate six candidates between two free-text endpoints.
    ///
    /// Any previous candidates are replaced.
    ///
    /// # Errors
    ///
    /// Rejects blank or placeholder endpoints, keeping the previous search.
    pub fn generate_routes(
        &mut self,
        start: &str,
        end: &str,
    ) -> Result<&[RouteCandidate], RouteError> {
        if is_blank(start) {
            return Err(RouteError::BlankStart);
        }
        if is_blank(end) {
            return Err(RouteError::BlankEnd);
        }
        let (base_km, candidates) =
            generate_candidates(&mut *self.rng.route(), &mut *self.rng.loot());
        log::debug!(
            "generated {} routes from {start:?} to {end:?} over {base_km} km",
            candidates.len()
        );
        self.search = Some(RouteSearch {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
            base_km,
        });
        self.candidates = candidates;
        Ok(&self.candidates)
    }

    /// Take candidate `index` of the current search.
    ///
    /// Eco candidates grant their rewards, count as an eco route and add
    /// their CO₂ saving; the record is then persisted. Driving changes
    /// nothing. Either way the candidates are discarded.
    ///
    /// # Errors
    ///
    /// Fails without changing anything when there is no search or the index
    /// is out of range.
    pub fn select_route(&mut self, index: usize) -> Result<RouteSelection, RouteError> {
        if self.candidates.is_empty() {
            return Err(RouteError::NoCandidates);
        }
        if index >= self.candidates.len() {
            return Err(RouteError::IndexOutOfRange {
                index,
                available: self.candidates.len(),
            });
        }
        let candidate = self.candidates.swap_remove(index);
        self.candidates.clear();
        self.search = None;

        let co2_saved = candidate.co2_saved();
        let rewards_granted = if candidate.is_eco {
            candidate.rewards.clone()
        } else {
            Rewards::new()
        };
        if candidate.is_eco {
            self.store.update(|record| {
                for reward in &rewards_granted {
                    record.inventory.add(reward.kind, reward.count);
                }
                if let Some(player) = record.player.as_mut() {
                    player.inventory = record.inventory;
                }
                record.eco_routes_taken = record.eco_routes_taken.saturating_add(1);
                record.total_co2_saved += co2_saved;
            });
            self.persist();
        }
        log::debug!(
            "selected {} (eco: {}, saved {co2_saved:.2} kg, {} rewards)",
            candidate.name,
            candidate.is_eco,
            rewards_granted.len()
        );

        let record = self.store.record();
        Ok(RouteSelection {
            candidate,
            co2_saved,
            rewards_granted,
            total_co2_saved: record.total_co2_saved,
            eco_routes_taken: record.eco_routes_taken,
            game_challenges: record.game_challenges,
            inventory: record.inventory,
        })
    }

    /// Convert every full CO₂ block into challenge tokens and persist.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InsufficientCo2`] with no state change when
    /// less than one block has been saved.
    pub fn exchange_challenges(&mut self) -> Result<ExchangeReceipt, ExchangeError> {
        let receipt = self.store.update(ProgressRecord::exchange)?;
        log::debug!(
            "exchanged {:.1} kg for {} challenges",
            receipt.co2_spent,
            receipt.tokens_gained
        );
        self.persist();
        Ok(receipt)
    }

    fn persist(&mut self) {
        self.last_save_error = self.store.commit().err().map(|err| err.to_string());
    }
}
