//! Configuration management.
//!
//! Loads settings from environment variables and .env file. Upstream URLs
//! are not configurable here; see `api::client::Endpoints`.

/// Service configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    // HTTP surface
    pub allow_origin: String,
    pub host: String,
    pub port: u16,

    // Upstream fetching
    pub request_timeout_secs: u64,
    pub user_agent: String,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8787,
            request_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; ScoreFetcher/1.0)".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            allow_origin: env_str("ALLOW_ORIGIN", &defaults.allow_origin),
            host: env_str("HOST", &defaults.host),
            port: env_u16("PORT", defaults.port),

            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            user_agent: env_str("USER_AGENT", &defaults.user_agent),

            log_level: env_str("LOG_LEVEL", &defaults.log_level),
            log_json: env_bool("LOG_JSON", defaults.log_json),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.allow_origin.trim().is_empty() {
            errors.push("ALLOW_ORIGIN must not be empty".to_string());
        }

        if self.host.trim().is_empty() {
            errors.push("HOST must not be empty".to_string());
        }

        if self.request_timeout_secs == 0 {
            errors.push("REQUEST_TIMEOUT_SECS must be at least 1".to_string());
        }

        if self.user_agent.trim().is_empty() {
            errors.push("USER_AGENT must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_addr(), "0.0.0.0:8787");
        assert_eq!(settings.allow_origin, "*");
    }

    #[test]
    fn validation_collects_every_error() {
        let settings = Settings {
            allow_origin: " ".to_string(),
            request_timeout_secs: 0,
            ..Settings::default()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("ALLOW_ORIGIN"));
        assert!(errors[1].contains("REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn unparseable_numbers_fall_back_to_default() {
        std::env::set_var("SCORES_RELAY_TEST_PORT", "not-a-port");
        assert_eq!(env_u16("SCORES_RELAY_TEST_PORT", 8787), 8787);
        std::env::set_var("SCORES_RELAY_TEST_FLAG", "YES");
        assert!(env_bool("SCORES_RELAY_TEST_FLAG", false));
    }
}
