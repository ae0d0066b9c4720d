use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse. All variables have
/// defaults; none are required.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("REFURB_LOG_LEVEL", "info");
    let countries_path = lookup("REFURB_COUNTRIES_PATH").ok().map(PathBuf::from);
    let output_path = PathBuf::from(or_default(
        "REFURB_OUTPUT_PATH",
        "./refurbs_by_country.json",
    ));

    let max_pages_per_country = parse_usize("REFURB_MAX_PAGES", "25")?;
    let page_delay_ms = parse_u64("REFURB_PAGE_DELAY_MS", "2000")?;
    let stable_timeout_secs = parse_u64("REFURB_STABLE_TIMEOUT_SECS", "30")?;
    let max_nav_retries = parse_u32("REFURB_MAX_NAV_RETRIES", "3")?;
    let backoff_base_secs = parse_u64("REFURB_BACKOFF_BASE_SECS", "5")?;
    let user_agent = or_default(
        "REFURB_USER_AGENT",
        "Mozilla/5.0 (compatible; refurbscan/0.1)",
    );

    Ok(AppConfig {
        log_level,
        countries_path,
        output_path,
        max_pages_per_country,
        page_delay_ms,
        stable_timeout_secs,
        max_nav_retries,
        backoff_base_secs,
        user_agent,
    })
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
    fn build_app_config_all_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.countries_path.is_none());
        assert_eq!(cfg.output_path, PathBuf::from("./refurbs_by_country.json"));
        assert_eq!(cfg.max_pages_per_country, 25);
        assert_eq!(cfg.page_delay_ms, 2000);
        assert_eq!(cfg.stable_timeout_secs, 30);
        assert_eq!(cfg.max_nav_retries, 3);
        assert_eq!(cfg.backoff_base_secs, 5);
    }

    #[test]
    fn build_app_config_overrides() {
        let mut map = HashMap::new();
        map.insert("REFURB_MAX_PAGES", "5");
        map.insert("REFURB_PAGE_DELAY_MS", "500");
        map.insert("REFURB_COUNTRIES_PATH", "/etc/refurb/countries.yaml");
        map.insert("REFURB_USER_AGENT", "custom-agent/2.0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.max_pages_per_country, 5);
        assert_eq!(cfg.page_delay_ms, 500);
        assert_eq!(
            cfg.countries_path.as_deref(),
            Some(std::path::Path::new("/etc/refurb/countries.yaml"))
        );
        assert_eq!(cfg.user_agent, "custom-agent/2.0");
    }

    #[test]
    fn build_app_config_invalid_max_pages() {
        let mut map = HashMap::new();
        map.insert("REFURB_MAX_PAGES", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REFURB_MAX_PAGES"),
            "expected InvalidEnvVar(REFURB_MAX_PAGES), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_invalid_backoff() {
        let mut map = HashMap::new();
        map.insert("REFURB_BACKOFF_BASE_SECS", "-1");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REFURB_BACKOFF_BASE_SECS"),
            "expected InvalidEnvVar(REFURB_BACKOFF_BASE_SECS), got: {result:?}"
        );
    }
}
