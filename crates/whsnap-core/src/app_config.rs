use std::path::PathBuf;

use crate::ConfigError;

pub const ENRICHMENT_CLIENT_ID_VAR: &str = "WHSNAP_ENRICHMENT_CLIENT_ID";

/// Process-wide settings for a snapshot run, read from `WHSNAP_*` variables.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub warehouses_path: PathBuf,

    pub search_base_url: String,
    pub search_api_key: Option<String>,
    pub search_category_url: String,
    /// Value for the `item_program_eligibility` filter (e.g. `ShipIt`).
    pub search_eligibility: Option<String>,
    pub locale: String,

    pub enrichment_url: String,
    /// Only `whsnap run` needs it; see [`AppConfig::enrichment_client_id`].
    pub enrichment_client_id: Option<String>,
    pub enrichment_batch_size: usize,
    pub enrichment_max_attempts: u32,
    pub enrichment_backoff_base_secs: u64,
    pub enrichment_backoff_cap_secs: u64,
    pub inter_batch_delay_ms: u64,

    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub referer: String,
    pub page_rows: u32,
    pub inter_page_delay_ms: u64,

    pub cookies_path: PathBuf,
    pub capture_drop_path: PathBuf,
    pub capture_timeout_secs: u64,
    pub capture_poll_secs: u64,

    pub output_dir: PathBuf,
    pub archive_raw_responses: bool,
    pub raw_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("warehouses_path", &self.warehouses_path)
            .field("search_base_url", &self.search_base_url)
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_category_url", &self.search_category_url)
            .field("search_eligibility", &self.search_eligibility)
            .field("locale", &self.locale)
            .field("enrichment_url", &self.enrichment_url)
            .field(
                "enrichment_client_id",
                &self.enrichment_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field("enrichment_batch_size", &self.enrichment_batch_size)
            .field("enrichment_max_attempts", &self.enrichment_max_attempts)
            .field(
                "enrichment_backoff_base_secs",
                &self.enrichment_backoff_base_secs,
            )
            .field(
                "enrichment_backoff_cap_secs",
                &self.enrichment_backoff_cap_secs,
            )
            .field("inter_batch_delay_ms", &self.inter_batch_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("referer", &self.referer)
            .field("page_rows", &self.page_rows)
            .field("inter_page_delay_ms", &self.inter_page_delay_ms)
            .field("cookies_path", &self.cookies_path)
            .field("capture_drop_path", &self.capture_drop_path)
            .field("capture_timeout_secs", &self.capture_timeout_secs)
            .field("capture_poll_secs", &self.capture_poll_secs)
            .field("output_dir", &self.output_dir)
            .field("archive_raw_responses", &self.archive_raw_responses)
            .field("raw_dir", &self.raw_dir)
            .finish()
    }
}

impl AppConfig {
    /// The enrichment client id, required for snapshot runs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `WHSNAP_ENRICHMENT_CLIENT_ID`
    /// was unset or blank.
    pub fn enrichment_client_id(&self) -> Result<&str, ConfigError> {
        self.enrichment_client_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(ENRICHMENT_CLIENT_ID_VAR.to_string()))
    }
}
