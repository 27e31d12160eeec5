use promptdraw_common::{env_or, EnvVars};

pub struct DatabaseEnv {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl EnvVars for DatabaseEnv {
    fn load() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 20),
            acquire_timeout_secs: env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "DATABASE_URL" => self.database_url.clone(),
            "DATABASE_MAX_CONNECTIONS" => self.max_connections.to_string(),
            "DATABASE_ACQUIRE_TIMEOUT_SECS" => self.acquire_timeout_secs.to_string(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
