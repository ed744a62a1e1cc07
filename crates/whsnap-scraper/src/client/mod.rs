//! HTTP client for the primary product-search endpoint.

mod paginate;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use whsnap_core::WarehouseContext;

use crate::error::ScraperError;
use crate::session::SessionContext;
use crate::types::SearchResponse;

/// Maximum number of pages to fetch before returning an error.
/// Guards against a server that keeps returning full pages forever.
pub(super) const MAX_PAGES: usize = 500;

/// Fixed search parameters. Per-warehouse values come from [`WarehouseContext`].
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub base_url: String,
    /// Category page the search is scoped to (sent as `url`).
    pub category_url: String,
    /// Program-eligibility filter, e.g. `"2DayDelivery"`. Sent as a tagged `fq`.
    pub eligibility: Option<String>,
    pub locale: String,
    pub rows: u32,
    pub inter_page_delay_ms: u64,
}

/// Raw probe-style response: status plus body text.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub status: u16,
    pub body: String,
}

/// Client for one warehouse's search endpoint.
///
/// The query (everything except `start`/`rows`) is built once at
/// construction; each page request only rewrites the two paging params.
#[derive(Debug)]
pub struct SearchClient {
    pub(super) client: Client,
    pub(super) endpoint: Url,
    pub(super) rows: u32,
    pub(super) inter_page_delay_ms: u64,
}

impl SearchClient {
    /// # Errors
    ///
    /// - [`ScraperError::InvalidEndpoint`] if `params.base_url` does not parse.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        params: &SearchParams,
        ctx: &WarehouseContext,
    ) -> Result<Self, ScraperError> {
        let endpoint = Self::endpoint_url(params, ctx)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            rows: params.rows.max(1),
            inter_page_delay_ms: params.inter_page_delay_ms,
        })
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    fn endpoint_url(params: &SearchParams, ctx: &WarehouseContext) -> Result<Url, ScraperError> {
        let mut url = Url::parse(&params.base_url).map_err(|e| ScraperError::InvalidEndpoint {
            url: params.base_url.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("expoption", "lw")
                .append_pair("q", "*:*")
                .append_pair("locale", &params.locale)
                .append_pair("start", "0")
                .append_pair("expand", "false")
                .append_pair("userLocation", &ctx.user_location)
                .append_pair("loc", &ctx.location_list())
                .append_pair("whloc", &ctx.warehouse_filter)
                .append_pair("rows", &params.rows.to_string())
                .append_pair("url", &params.category_url);
            if let Some(eligibility) = params.eligibility.as_deref().filter(|e| !e.is_empty()) {
                query.append_pair(
                    "fq",
                    &format!(
                        "{{!tag=item_program_eligibility}}item_program_eligibility:(\"{eligibility}\")"
                    ),
                );
            }
            query
                .append_pair("chdcategory", "true")
                .append_pair("chdheader", "true");
        }
        Ok(url)
    }

    /// The endpoint with `start`/`rows` replaced; every other parameter is
    /// kept in place.
    pub(crate) fn page_url(&self, start: u64, rows: u32) -> String {
        let pairs: Vec<(String, String)> = self
            .endpoint
            .query_pairs()
            .map(|(k, v)| {
                let v = match k.as_ref() {
                    "start" => start.to_string(),
                    "rows" => rows.to_string(),
                    _ => v.into_owned(),
                };
                (k.into_owned(), v)
            })
            .collect();
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }

    /// Issues one page request and returns status and body without
    /// interpreting either.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on transport failure.
    pub async fn fetch_raw(
        &self,
        session: &SessionContext,
        start: u64,
        rows: u32,
    ) -> Result<RawPage, ScraperError> {
        let url = self.page_url(start, rows);
        tracing::debug!(url = %url, start, rows, "search request");
        let response = self
            .client
            .get(&url)
            .headers(session.headers())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawPage { status, body })
    }

    /// Fetches and parses one page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Unauthorized`] on HTTP 401.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-200 status.
    /// - [`ScraperError::Http`] on transport failure.
    /// - [`ScraperError::Deserialize`] if the body is not a search response.
    pub async fn fetch_page(
        &self,
        session: &SessionContext,
        start: u64,
        rows: u32,
    ) -> Result<SearchResponse, ScraperError> {
        let raw = self.fetch_raw(session, start, rows).await?;

        if raw.status == StatusCode::UNAUTHORIZED.as_u16() {
            return Err(ScraperError::Unauthorized {
                url: self.endpoint.to_string(),
            });
        }
        if raw.status != StatusCode::OK.as_u16() {
            return Err(ScraperError::unexpected_status(
                raw.status,
                self.endpoint.as_str(),
                &raw.body,
            ));
        }

        serde_json::from_str::<SearchResponse>(&raw.body).map_err(|e| ScraperError::Deserialize {
            context: format!("search page start={start}"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
