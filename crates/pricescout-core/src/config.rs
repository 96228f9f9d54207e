use crate::app_config::{AppConfig, Environment, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; the lookup is injected so tests can use a
/// plain `HashMap` instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_timeout = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            secs => Ok(secs),
        }
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
            },
        }
    };

    let env = parse_environment(&or_default("PRICESCOUT_ENV", "development"));
    let log_level = or_default("PRICESCOUT_LOG_LEVEL", "info");
    let stores_path = PathBuf::from(or_default("PRICESCOUT_STORES_PATH", "./config/stores.yaml"));

    let http_timeout_secs = parse_timeout("PRICESCOUT_HTTP_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("PRICESCOUT_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("PRICESCOUT_ACCEPT_LANGUAGE", DEFAULT_ACCEPT_LANGUAGE);

    let browser_enabled = parse_bool("PRICESCOUT_BROWSER_ENABLED", true)?;
    let chrome_executable = lookup("PRICESCOUT_CHROME_EXECUTABLE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let navigation_timeout_secs = parse_timeout("PRICESCOUT_NAVIGATION_TIMEOUT_SECS", "30")?;
    let ready_timeout_secs = parse_timeout("PRICESCOUT_READY_TIMEOUT_SECS", "10")?;
    let settle_delay_ms = parse_u64("PRICESCOUT_SETTLE_DELAY_MS", "2000")?;

    let mock_seed = match lookup("PRICESCOUT_MOCK_SEED") {
        Err(_) => None,
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("PRICESCOUT_MOCK_SEED", e.to_string()))?,
        ),
    };

    Ok(AppConfig {
        env,
        log_level,
        stores_path,
        http_timeout_secs,
        user_agent,
        accept_language,
        browser_enabled,
        chrome_executable,
        navigation_timeout_secs,
        ready_timeout_secs,
        settle_delay_ms,
        mock_seed,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(parse_environment("development"), Environment::Development);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_defaults_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.stores_path.to_str(), Some("./config/stores.yaml"));
        assert_eq!(cfg.http_timeout_secs, 15);
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(cfg.accept_language, "en-US,en;q=0.9");
        assert!(cfg.browser_enabled);
        assert!(cfg.chrome_executable.is_none());
        assert_eq!(cfg.navigation_timeout_secs, 30);
        assert_eq!(cfg.ready_timeout_secs, 10);
        assert_eq!(cfg.settle_delay_ms, 2000);
        assert!(cfg.mock_seed.is_none());
    }

    #[test]
    fn http_timeout_override() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_HTTP_TIMEOUT_SECS", "5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.http_timeout_secs, 5);
    }

    #[test]
    fn http_timeout_invalid() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_HTTP_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_HTTP_TIMEOUT_SECS"),
            "expected InvalidEnvVar(PRICESCOUT_HTTP_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn zero_timeouts_rejected() {
        for var in [
            "PRICESCOUT_HTTP_TIMEOUT_SECS",
            "PRICESCOUT_NAVIGATION_TIMEOUT_SECS",
            "PRICESCOUT_READY_TIMEOUT_SECS",
        ] {
            let mut map = HashMap::new();
            map.insert(var, "0");
            let err = build_app_config(lookup_from_map(&map)).unwrap_err();
            match err {
                ConfigError::InvalidEnvVar { var: got, reason } => {
                    assert_eq!(got, var);
                    assert_eq!(reason, "must be greater than zero");
                }
                other => panic!("expected InvalidEnvVar for {var}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn zero_settle_delay_allowed() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_SETTLE_DELAY_MS", "0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.settle_delay_ms, 0);
    }

    #[test]
    fn browser_enabled_accepts_common_spellings() {
        for (raw, expected) in [("false", false), ("0", false), ("off", false), ("YES", true)] {
            let mut map = HashMap::new();
            map.insert("PRICESCOUT_BROWSER_ENABLED", raw);
            let cfg = build_app_config(lookup_from_map(&map)).unwrap();
            assert_eq!(cfg.browser_enabled, expected, "input {raw}");
        }
    }

    #[test]
    fn browser_enabled_rejects_garbage() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_BROWSER_ENABLED", "maybe");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_BROWSER_ENABLED"),
            "expected InvalidEnvVar(PRICESCOUT_BROWSER_ENABLED), got: {result:?}"
        );
    }

    #[test]
    fn chrome_executable_blank_is_none() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_CHROME_EXECUTABLE", "  ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.chrome_executable.is_none());
    }

    #[test]
    fn chrome_executable_set() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_CHROME_EXECUTABLE", "/usr/bin/chromium");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.chrome_executable.as_deref().and_then(|p| p.to_str()),
            Some("/usr/bin/chromium")
        );
    }

    #[test]
    fn mock_seed_parsed() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_MOCK_SEED", "42");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.mock_seed, Some(42));
    }

    #[test]
    fn mock_seed_invalid() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_MOCK_SEED", "-1");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICESCOUT_MOCK_SEED"),
            "expected InvalidEnvVar(PRICESCOUT_MOCK_SEED), got: {result:?}"
        );
    }

    #[test]
    fn settle_delay_override() {
        let mut map = HashMap::new();
        map.insert("PRICESCOUT_SETTLE_DELAY_MS", "500");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.settle_delay_ms, 500);
    }
}
