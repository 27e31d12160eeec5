use std::time::Duration;

use promptdraw_common::{env_or, EnvVars};

use crate::cards::PityConfig;

pub struct DrawEngineEnv {
    pub pity: PityConfig,
    pub rarity_cache_ttl_secs: u64,
    pub draw_timeout_secs: u64,
    pub event_buffer: usize,
}

impl DrawEngineEnv {
    pub fn rarity_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.rarity_cache_ttl_secs)
    }

    pub fn draw_timeout(&self) -> Duration {
        Duration::from_secs(self.draw_timeout_secs)
    }
}

impl EnvVars for DrawEngineEnv {
    fn load() -> Self {
        let defaults = PityConfig::default();
        Self {
            pity: PityConfig {
                rare_tier_id: env_or("PITY_RARE_TIER", defaults.rare_tier_id),
                epic_tier_id: env_or("PITY_EPIC_TIER", defaults.epic_tier_id),
                legendary_tier_id: env_or("PITY_LEGENDARY_TIER", defaults.legendary_tier_id),
                rare_at: env_or("PITY_RARE_AT", defaults.rare_at),
                epic_at: env_or("PITY_EPIC_AT", defaults.epic_at),
                legendary_at: env_or("PITY_LEGENDARY_AT", defaults.legendary_at),
                boost_increment: env_or("PITY_BOOST_INCREMENT", defaults.boost_increment),
                boost_max: env_or("PITY_BOOST_MAX", defaults.boost_max),
            },
            rarity_cache_ttl_secs: env_or("RARITY_CACHE_TTL_SECS", 300),
            draw_timeout_secs: env_or("DRAW_TIMEOUT_SECS", 10),
            event_buffer: env_or("DRAW_EVENT_BUFFER", 256),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PITY_RARE_TIER" => self.pity.rare_tier_id.to_string(),
            "PITY_EPIC_TIER" => self.pity.epic_tier_id.to_string(),
            "PITY_LEGENDARY_TIER" => self.pity.legendary_tier_id.to_string(),
            "PITY_RARE_AT" => self.pity.rare_at.to_string(),
            "PITY_EPIC_AT" => self.pity.epic_at.to_string(),
            "PITY_LEGENDARY_AT" => self.pity.legendary_at.to_string(),
            "PITY_BOOST_INCREMENT" => self.pity.boost_increment.to_string(),
            "PITY_BOOST_MAX" => self.pity.boost_max.to_string(),
            "RARITY_CACHE_TTL_SECS" => self.rarity_cache_ttl_secs.to_string(),
            "DRAW_TIMEOUT_SECS" => self.draw_timeout_secs.to_string(),
            "DRAW_EVENT_BUFFER" => self.event_buffer.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}
