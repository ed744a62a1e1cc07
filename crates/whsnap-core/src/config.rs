use std::path::PathBuf;

use crate::app_config::{AppConfig, ENRICHMENT_CLIENT_ID_VAR};
use crate::ConfigError;

pub const DEFAULT_SEARCH_BASE_URL: &str =
    "https://search.costco.com/api/apps/www_costco_com/query/www_costco_com_navigation";
pub const DEFAULT_ENRICHMENT_URL: &str =
    "https://ecom-api.costco.com/ebusiness/product/v1/products/graphql";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
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
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
#[allow(clippy::too_many_lines)] // one binding per setting; splitting would only scatter the defaults
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, format!("expected a boolean, got \"{raw}\""))),
        }
    };

    let enrichment_client_id = lookup(ENRICHMENT_CLIENT_ID_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let log_level = or_default("WHSNAP_LOG_LEVEL", "info");
    let warehouses_path = PathBuf::from(or_default(
        "WHSNAP_WAREHOUSES_PATH",
        "./config/warehouses.yaml",
    ));

    let search_base_url = or_default("WHSNAP_SEARCH_BASE_URL", DEFAULT_SEARCH_BASE_URL);
    let search_api_key = optional("WHSNAP_SEARCH_API_KEY");
    let search_category_url = or_default("WHSNAP_SEARCH_CATEGORY_URL", "/grocery-household.html");
    let search_eligibility = optional("WHSNAP_SEARCH_ELIGIBILITY");
    let locale = or_default("WHSNAP_LOCALE", "en-US");

    let enrichment_url = or_default("WHSNAP_ENRICHMENT_URL", DEFAULT_ENRICHMENT_URL);
    let enrichment_batch_size = parse_usize("WHSNAP_ENRICHMENT_BATCH_SIZE", "100")?;
    if enrichment_batch_size == 0 {
        return Err(invalid(
            "WHSNAP_ENRICHMENT_BATCH_SIZE",
            "must be greater than zero".to_string(),
        ));
    }
    let enrichment_max_attempts = parse_u32("WHSNAP_ENRICHMENT_MAX_ATTEMPTS", "3")?;
    let enrichment_backoff_base_secs = parse_u64("WHSNAP_ENRICHMENT_BACKOFF_BASE_SECS", "1")?;
    let enrichment_backoff_cap_secs = parse_u64("WHSNAP_ENRICHMENT_BACKOFF_CAP_SECS", "8")?;
    let inter_batch_delay_ms = parse_u64("WHSNAP_INTER_BATCH_DELAY_MS", "250")?;

    let request_timeout_secs = parse_u64("WHSNAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("WHSNAP_USER_AGENT", "Mozilla/5.0");
    let referer = or_default("WHSNAP_REFERER", "https://www.costco.com/");
    let page_rows = parse_u32("WHSNAP_PAGE_ROWS", "100")?;
    if page_rows == 0 {
        return Err(invalid(
            "WHSNAP_PAGE_ROWS",
            "must be greater than zero".to_string(),
        ));
    }
    let inter_page_delay_ms = parse_u64("WHSNAP_INTER_PAGE_DELAY_MS", "200")?;

    let cookies_path = PathBuf::from(or_default("WHSNAP_COOKIES_PATH", "./data/cookies.json"));
    let capture_drop_path = PathBuf::from(or_default(
        "WHSNAP_CAPTURE_DROP_PATH",
        "./data/cookies.capture.json",
    ));
    let capture_timeout_secs = parse_u64("WHSNAP_CAPTURE_TIMEOUT_SECS", "120")?;
    let capture_poll_secs = parse_u64("WHSNAP_CAPTURE_POLL_SECS", "2")?;

    let output_dir = PathBuf::from(or_default("WHSNAP_OUTPUT_DIR", "./data/snapshots"));
    let archive_raw_responses = parse_bool("WHSNAP_ARCHIVE_RAW_RESPONSES", "true")?;
    let raw_dir = PathBuf::from(or_default("WHSNAP_RAW_DIR", "./data/raw_responses"));

    Ok(AppConfig {
        log_level,
        warehouses_path,
        search_base_url,
        search_api_key,
        search_category_url,
        search_eligibility,
        locale,
        enrichment_url,
        enrichment_client_id,
        enrichment_batch_size,
        enrichment_max_attempts,
        enrichment_backoff_base_secs,
        enrichment_backoff_cap_secs,
        inter_batch_delay_ms,
        request_timeout_secs,
        user_agent,
        referer,
        page_rows,
        inter_page_delay_ms,
        cookies_path,
        capture_drop_path,
        capture_timeout_secs,
        capture_poll_secs,
        output_dir,
        archive_raw_responses,
        raw_dir,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
