use std::path::PathBuf;

/// Application configuration, sourced from `POISWEEP_*` environment
/// variables. See [`crate::load_app_config`].
#[derive(Clone)]
pub struct AppConfig {
    /// Bearer token for the place-search provider. Optional at load time so
    /// offline subcommands (registry listing, distance checks, export of a
    /// saved set) work without credentials.
    pub provider_api_key: Option<String>,
    pub provider_base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound on concurrently in-flight provider calls.
    pub max_concurrent_anchors: usize,
    /// Politeness delay applied after each provider call.
    pub inter_request_delay_ms: u64,
    /// Wall-clock budget for a whole aggregation pass.
    pub aggregate_budget_secs: u64,
    pub default_radius_km: f64,
    pub default_max_results: u32,
    pub anchors_path: PathBuf,
    pub log_level: String,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "provider_api_key",
                &self.provider_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("provider_base_url", &self.provider_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_concurrent_anchors", &self.max_concurrent_anchors)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("aggregate_budget_secs", &self.aggregate_budget_secs)
            .field("default_radius_km", &self.default_radius_km)
            .field("default_max_results", &self.default_max_results)
            .field("anchors_path", &self.anchors_path)
            .field("log_level", &self.log_level)
            .field("country", &self.country)
            .field("language", &self.language)
            .finish()
    }
}
