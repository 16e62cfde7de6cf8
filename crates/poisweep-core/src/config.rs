use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.placesearch.example.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
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

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive finite number, got {value}"),
            })
        }
    };

    let provider_api_key = lookup("POISWEEP_PROVIDER_API_KEY").ok();
    let provider_base_url = or_default("POISWEEP_PROVIDER_BASE_URL", DEFAULT_BASE_URL);
    let request_timeout_secs = parse_u64("POISWEEP_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("POISWEEP_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("POISWEEP_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_concurrent_anchors = parse_usize("POISWEEP_MAX_CONCURRENT_ANCHORS", "1")?;
    let inter_request_delay_ms = parse_u64("POISWEEP_INTER_REQUEST_DELAY_MS", "250")?;
    let aggregate_budget_secs = parse_u64("POISWEEP_AGGREGATE_BUDGET_SECS", "120")?;
    let default_radius_km = parse_f64("POISWEEP_DEFAULT_RADIUS_KM", "5.0")?;
    let default_max_results = parse_u32("POISWEEP_DEFAULT_MAX_RESULTS", "20")?;
    let anchors_path = PathBuf::from(or_default("POISWEEP_ANCHORS_PATH", "./config/anchors.yaml"));
    let log_level = or_default("POISWEEP_LOG_LEVEL", "info");
    let country = lookup("POISWEEP_COUNTRY").ok();
    let language = lookup("POISWEEP_LANGUAGE").ok();

    Ok(AppConfig {
        provider_api_key,
        provider_base_url,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_anchors,
        inter_request_delay_ms,
        aggregate_budget_secs,
        default_radius_km,
        default_max_results,
        anchors_path,
        log_level,
        country,
        language,
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
    fn empty_env_yields_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.provider_api_key.is_none());
        assert_eq!(cfg.provider_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_backoff_base_ms, 1000);
        assert_eq!(cfg.max_concurrent_anchors, 1);
        assert_eq!(cfg.inter_request_delay_ms, 250);
        assert_eq!(cfg.aggregate_budget_secs, 120);
        assert!((cfg.default_radius_km - 5.0).abs() < f64::EPSILON);
        assert_eq!(cfg.default_max_results, 20);
        assert_eq!(cfg.anchors_path, PathBuf::from("./config/anchors.yaml"));
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.country.is_none());
    }

    #[test]
    fn overrides_are_picked_up() {
        let mut map = HashMap::new();
        map.insert("POISWEEP_PROVIDER_API_KEY", "secret");
        map.insert("POISWEEP_MAX_CONCURRENT_ANCHORS", "4");
        map.insert("POISWEEP_DEFAULT_RADIUS_KM", "2.5");
        map.insert("POISWEEP_COUNTRY", "in");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.provider_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.max_concurrent_anchors, 4);
        assert!((cfg.default_radius_km - 2.5).abs() < f64::EPSILON);
        assert_eq!(cfg.country.as_deref(), Some("in"));
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut map = HashMap::new();
        map.insert("POISWEEP_MAX_RETRIES", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POISWEEP_MAX_RETRIES"),
            "expected InvalidEnvVar(POISWEEP_MAX_RETRIES), got: {result:?}"
        );
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut map = HashMap::new();
        map.insert("POISWEEP_DEFAULT_RADIUS_KM", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "POISWEEP_DEFAULT_RADIUS_KM"),
            "expected InvalidEnvVar(POISWEEP_DEFAULT_RADIUS_KM), got: {result:?}"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut map = HashMap::new();
        map.insert("POISWEEP_PROVIDER_API_KEY", "super-secret-token");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("[redacted]"));
    }
}
