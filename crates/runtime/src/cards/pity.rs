use serde::{Deserialize, Serialize};

use crate::cards::PityHistory;

/// Draws per step of the dynamic boost curve.
const BOOST_STEP_DRAWS: i64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PityConfig {
    pub rare_tier_id: i32,
    pub epic_tier_id: i32,
    pub legendary_tier_id: i32,

    /// Dry streak length that forces the tier. Zero or less disables the guarantee.
    pub rare_at: i64,
    pub epic_at: i64,
    pub legendary_at: i64,

    pub boost_increment: f64,
    pub boost_max: f64,
}

impl Default for PityConfig {
    fn default() -> Self {
        Self {
            rare_tier_id: 3,
            epic_tier_id: 4,
            legendary_tier_id: 5,

            rare_at: 30,
            epic_at: 60,
            legendary_at: 90,

            boost_increment: 0.1,
            boost_max: 1.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PityInfo {
    pub total_draws: i64,
    pub draws_since_rare: i64,
    pub draws_since_epic: i64,
    pub draws_since_legendary: i64,
    pub forced_tier_id: Option<i32>,
    pub dynamic_boost_factor: f64,
    /// Set when the history could not be read and neutral values were used.
    pub degraded: bool,
}

impl PityInfo {
    /// Neutral values used when the history lookup fails.
    pub fn neutral() -> Self {
        Self {
            total_draws: 0,
            draws_since_rare: 0,
            draws_since_epic: 0,
            draws_since_legendary: 0,
            forced_tier_id: None,
            dynamic_boost_factor: 1.0,
            degraded: true,
        }
    }

    /// Lifetime draw count, unknown when degraded.
    pub fn known_total_draws(&self) -> Option<i64> {
        (!self.degraded).then_some(self.total_draws)
    }
}

/// Derives pity state from the append-only draw history. Nothing is stored,
/// so the counters can never drift from the records.
pub struct PityTracker;

impl PityTracker {
    pub fn compute(history: &PityHistory, config: &PityConfig) -> PityInfo {
        let draws_since = |tier_id: i32| -> i64 {
            history.tiers_newest_first
                .iter()
                .position(|drawn| *drawn >= tier_id)
                .map(|offset| offset as i64)
                .unwrap_or(history.total_draws)
        };

        let draws_since_rare = draws_since(config.rare_tier_id);
        let draws_since_epic = draws_since(config.epic_tier_id);
        let draws_since_legendary = draws_since(config.legendary_tier_id);

        let triggered = |since: i64, at: i64| at > 0 && since >= at;
        // strongest guarantee wins
        let forced_tier_id = if triggered(draws_since_legendary, config.legendary_at) {
            Some(config.legendary_tier_id)
        } else if triggered(draws_since_epic, config.epic_at) {
            Some(config.epic_tier_id)
        } else if triggered(draws_since_rare, config.rare_at) {
            Some(config.rare_tier_id)
        } else {
            None
        };

        let steps = (draws_since_rare / BOOST_STEP_DRAWS) as f64;
        let dynamic_boost_factor = (1.0 + steps * config.boost_increment)
            .min(config.boost_max)
            .max(1.0);

        PityInfo {
            total_draws: history.total_draws,
            draws_since_rare,
            draws_since_epic,
            draws_since_legendary,
            forced_tier_id,
            dynamic_boost_factor,
            degraded: false,
        }
    }
}
