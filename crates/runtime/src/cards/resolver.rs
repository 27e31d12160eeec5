use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{DrawMethod, PityInfo, ProbabilityAdjuster, RarityTier};

/// Source of uniform randomness for draws.
pub trait DrawRng: Send {
    /// A uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// A uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.unit() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

impl<R: rand::RngCore + Send> DrawRng for R {
    fn unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub tier_id: i32,
    pub method: DrawMethod,
    /// Boost actually applied to the catalog; `None` for guaranteed draws.
    pub effective_boost: Option<f64>,
}

pub struct RarityResolver;

impl RarityResolver {
    /// Picks a tier for one draw.
    ///
    /// A pity guarantee short-circuits sampling entirely. Otherwise the larger
    /// of the pool boost and the pity boost is applied to the catalog and one
    /// uniform roll walks the cumulative distribution in ascending tier order.
    /// Returns `None` only for an empty catalog with no guarantee pending.
    pub fn resolve<R: DrawRng + ?Sized>(
        tiers: &[RarityTier],
        pool_boost: f64,
        pity: &PityInfo,
        rng: &mut R,
    ) -> Option<Resolution> {
        if let Some(tier_id) = pity.forced_tier_id {
            return Some(Resolution { tier_id, method: DrawMethod::Guaranteed, effective_boost: None });
        }

        let effective_boost = pool_boost.max(pity.dynamic_boost_factor);
        let adjusted = ProbabilityAdjuster::adjust(tiers, effective_boost);
        let roll = rng.unit();

        let tier_id = Self::walk(&adjusted, roll)?;
        Some(Resolution { tier_id, method: DrawMethod::Random, effective_boost: Some(effective_boost) })
    }

    /// Returns the first tier whose cumulative mass meets or exceeds `roll`,
    /// falling back to the lowest tier if rounding leaves the roll uncovered.
    fn walk(sorted_tiers: &[RarityTier], roll: f64) -> Option<i32> {
        let lowest = sorted_tiers.first()?.id;

        let mut cumulative = 0.0;
        for tier in sorted_tiers {
            if tier.base_probability <= 0.0 {
                continue;
            }
            cumulative += tier.base_probability;
            if cumulative >= roll {
                return Some(tier.id);
            }
        }

        Some(lowest)
    }
}
