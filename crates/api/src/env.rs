use promptdraw_common::{env_or, EnvVars};

pub struct ApiServerEnv {
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl EnvVars for ApiServerEnv {
    fn load() -> Self {
        Self {
            port: env_or("PORT", 3033),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "PORT" => self.port.to_string(),
            "REQUEST_TIMEOUT_SECS" => self.request_timeout_secs.to_string(),
            _ => panic!("{} is not set", key),
        }
    }
}
