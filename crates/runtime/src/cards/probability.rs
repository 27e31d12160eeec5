use std::ops::Range;

use tracing::debug;

use crate::cards::RarityTier;

const RARE_CAP: f64 = 5.0;
const UNCOMMON_CAP: f64 = 3.0;
const UNCOMMON_SLOPE: f64 = 0.7;
const CONSERVATION_TOLERANCE: f64 = 1e-12;

/// Redistributes tier probabilities towards the rarer tiers by one scalar boost.
///
/// Tiers are split into three bands by id: the lowest two are *common*, the
/// highest two are *rare*, anything in between is *uncommon*. The rare and
/// uncommon bands are inflated (with caps) and the common band absorbs the
/// difference. Each band keeps its internal shape.
pub struct ProbabilityAdjuster;

struct Bands {
    common: Range<usize>,
    uncommon: Range<usize>,
    rare: Range<usize>,
}

impl Bands {
    /// `n` tiers sorted ascending by id.
    fn split(n: usize) -> Self {
        let common_len = n.min(2);
        let rare_len = (n - common_len).min(2);
        Self {
            common: 0..common_len,
            uncommon: common_len..n - rare_len,
            rare: n - rare_len..n,
        }
    }
}

impl ProbabilityAdjuster {
    pub fn adjust(tiers: &[RarityTier], boost_factor: f64) -> Vec<RarityTier> {
        let mut sorted = tiers.to_vec();
        sorted.sort_by_key(|tier| tier.id);

        if !boost_factor.is_finite() || boost_factor <= 1.0 {
            return sorted;
        }

        let bands = Bands::split(sorted.len());
        let mass = |range: &Range<usize>| -> f64 {
            sorted[range.clone()].iter().map(|t| t.base_probability).sum()
        };

        let p_common = mass(&bands.common);
        let p_uncommon = mass(&bands.uncommon);
        let p_rare = mass(&bands.rare);

        let p_rare_new = (p_rare * boost_factor).min(p_rare * RARE_CAP);
        let p_uncommon_new = (p_uncommon * (UNCOMMON_SLOPE * boost_factor + (1.0 - UNCOMMON_SLOPE)))
            .min(p_uncommon * UNCOMMON_CAP);
        let p_common_new = (1.0 - p_uncommon_new - p_rare_new).max(0.0);

        Self::rescale_band(&mut sorted, &bands.common, p_common, p_common_new);
        Self::rescale_band(&mut sorted, &bands.uncommon, p_uncommon, p_uncommon_new);
        Self::rescale_band(&mut sorted, &bands.rare, p_rare, p_rare_new);

        // Only reachable when the common band is empty or the upper bands
        // overflow one; renormalize so the distribution still sums to one.
        let total: f64 = sorted.iter().map(|t| t.base_probability).sum();
        if total > 0.0 && (total - 1.0).abs() > CONSERVATION_TOLERANCE {
            debug!("[ProbabilityAdjuster] renormalizing boosted mass {} (boost {})", total, boost_factor);
            for tier in sorted.iter_mut() {
                tier.base_probability /= total;
            }
        }

        sorted
    }

    fn rescale_band(tiers: &mut [RarityTier], band: &Range<usize>, old_mass: f64, new_mass: f64) {
        if band.is_empty() || old_mass <= 0.0 {
            return;
        }
        for tier in &mut tiers[band.clone()] {
            tier.base_probability = tier.base_probability / old_mass * new_mass;
        }
    }

    /// Summed probability of the rare band (the top two tiers).
    pub fn rare_band_mass(tiers: &[RarityTier]) -> f64 {
        let mut sorted: Vec<&RarityTier> = tiers.iter().collect();
        sorted.sort_by_key(|tier| tier.id);
        let bands = Bands::split(sorted.len());
        sorted[bands.rare].iter().map(|t| t.base_probability).sum()
    }
}
