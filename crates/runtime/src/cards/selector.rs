use sqlx::types::Uuid;
use tracing::debug;

use crate::cards::{Card, DrawRng, PoolCard, RarityTier};
use crate::draw::DrawError;
use crate::store::CardSource;

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub card: Card,
    /// Tier the card was actually drawn from.
    pub tier_id: i32,
    /// Whether the resolved tier was empty and a lower tier was used.
    pub cascaded: bool,
}

pub struct CardSelector;

impl CardSelector {
    /// Selects an approved card from `pool_id` at `tier_id`, cascading to
    /// lower tiers (descending id) when a tier has nothing eligible. Never
    /// cascades upward.
    pub async fn select<S, R>(
        source: &mut S,
        tiers: &[RarityTier],
        pool_id: Uuid,
        tier_id: i32,
        rng: &mut R,
    ) -> Result<Selection, DrawError>
    where
        S: CardSource + ?Sized,
        R: DrawRng + ?Sized,
    {
        let mut candidates: Vec<i32> = tiers.iter()
            .map(|tier| tier.id)
            .filter(|id| *id < tier_id)
            .collect();
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        // the resolved tier is tried first even if the catalog does not list it
        candidates.insert(0, tier_id);

        for candidate in candidates {
            let eligible: Vec<PoolCard> = source.eligible_cards(pool_id, candidate).await?
                .into_iter()
                .filter(|pool_card| pool_card.card.is_drawable() && pool_card.card.rarity_tier_id == candidate)
                .collect();

            if let Some(picked) = Self::pick(&eligible, rng) {
                if candidate != tier_id {
                    debug!("[CardSelector] pool {} tier {} empty, cascaded to tier {}", pool_id, tier_id, candidate);
                }
                return Ok(Selection {
                    card: picked.card.clone(),
                    tier_id: candidate,
                    cascaded: candidate != tier_id,
                });
            }
        }

        Err(DrawError::NoEligibleCard { pool_id, tier_id })
    }

    /// Weighted choice when any card carries a positive weight (unweighted
    /// cards count as 1.0), uniform otherwise.
    pub fn pick<'a, R: DrawRng + ?Sized>(cards: &'a [PoolCard], rng: &mut R) -> Option<&'a PoolCard> {
        if cards.is_empty() {
            return None;
        }

        let weighted = cards.iter().any(|c| c.weight.is_some_and(|w| w.is_finite() && w > 0.0));
        if !weighted {
            return cards.get(rng.index(cards.len()));
        }

        let weight_of = |card: &PoolCard| match card.weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            Some(_) => 0.0,
            None => 1.0,
        };
        let total: f64 = cards.iter().map(weight_of).sum();
        let target = rng.unit() * total;

        let mut cumulative = 0.0;
        for card in cards {
            let weight = weight_of(card);
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            if target < cumulative {
                return Some(card);
            }
        }

        // rounding at the top end; take the last card that has any weight
        cards.iter().rev().find(|card| weight_of(*card) > 0.0)
    }
}
