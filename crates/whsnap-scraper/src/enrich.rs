//! Batched lookups against the product graph endpoint.
//!
//! Enrichment is best effort. A batch that fails for any reason, after
//! transport retries, contributes nothing and the run continues.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use whsnap_core::WarehouseContext;

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::session::SessionContext;
use crate::types::{EnrichmentPayload, EnrichmentResponse};

const PRODUCTS_QUERY: &str = "query products($clientId: String!, $itemNumbers: [String], \
$locale: [String], $warehouseNumber: String) { products(clientId: $clientId, \
itemNumbers: $itemNumbers, locale: $locale, warehouseNumber: $warehouseNumber) { \
catalogData { itemNumber programTypes priceData { price listPrice } attributes { key value } } \
fulfillmentData { itemNumber warehouseNumber channel price } \
childData { itemNumber parentItemNumber programTypes priceData { price listPrice } attributes { key value } } } }";

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub url: String,
    pub client_id: String,
    pub locales: Vec<String>,
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub inter_batch_delay_ms: u64,
}

#[derive(Debug)]
pub struct EnrichmentClient {
    client: Client,
    settings: EnrichmentSettings,
}

impl EnrichmentClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be built.
    pub fn new(timeout_secs: u64, settings: EnrichmentSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, settings })
    }

    /// Looks up every distinct, non-empty item number.
    ///
    /// Numbers are deduplicated and sorted, then sent in batches of
    /// `batch_size`. Items the endpoint knows nothing about are absent
    /// from the result.
    pub async fn fetch<'a, I>(
        &self,
        session: &SessionContext,
        item_numbers: I,
        ctx: &WarehouseContext,
    ) -> HashMap<String, EnrichmentPayload>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let numbers: Vec<&str> = item_numbers
            .into_iter()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let batch_size = self.settings.batch_size.max(1);
        let batch_count = numbers.len().div_ceil(batch_size);
        let mut merged: HashMap<String, EnrichmentPayload> = HashMap::new();

        for (index, batch) in numbers.chunks(batch_size).enumerate() {
            if index > 0 && self.settings.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.inter_batch_delay_ms)).await;
            }

            match self.fetch_batch(session, batch, ctx).await {
                Ok(payloads) => {
                    tracing::info!(
                        batch = index + 1,
                        batches = batch_count,
                        requested = batch.len(),
                        returned = payloads.len(),
                        "enrichment batch"
                    );
                    merged.extend(payloads);
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index + 1,
                        batches = batch_count,
                        requested = batch.len(),
                        error = %e,
                        "enrichment batch failed; continuing without it"
                    );
                }
            }
        }

        merged
    }

    /// One batch, retried on transport failure only.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] once retries are exhausted.
    /// - [`ScraperError::UnexpectedStatus`] on a non-200 response.
    /// - [`ScraperError::Deserialize`] on a malformed body.
    async fn fetch_batch(
        &self,
        session: &SessionContext,
        batch: &[&str],
        ctx: &WarehouseContext,
    ) -> Result<HashMap<String, EnrichmentPayload>, ScraperError> {
        let body = json!({
            "query": PRODUCTS_QUERY,
            "variables": {
                "itemNumbers": batch,
                "clientId": self.settings.client_id,
                "locale": self.settings.locales,
                "warehouseNumber": ctx.warehouse_number,
            }
        });
        let url = self.settings.url.as_str();

        let response = retry_with_backoff(self.settings.retry, || {
            let body = &body;
            async move {
                let response = self
                    .client
                    .post(url)
                    .headers(session.headers())
                    .json(body)
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let text = response.text().await?;
                if status != 200 {
                    return Err(ScraperError::unexpected_status(status, url, &text));
                }
                serde_json::from_str::<EnrichmentResponse>(&text).map_err(|e| {
                    ScraperError::Deserialize {
                        context: format!("enrichment batch of {}", batch.len()),
                        source: e,
                    }
                })
            }
        })
        .await?;

        if !response.errors.is_empty() {
            tracing::warn!(
                errors = response.errors.len(),
                first = %response.errors[0],
                "enrichment response carried errors; discarding batch"
            );
            return Ok(HashMap::new());
        }

        Ok(response
            .data
            .and_then(|d| d.products)
            .map(crate::types::ProductsData::into_payloads)
            .unwrap_or_default())
    }
}
