//! Multi-page document fetch for `SearchClient`.

use std::time::Duration;

use crate::error::ScraperError;
use crate::session::SessionContext;
use crate::types::CatalogDocument;

use super::SearchClient;
use super::MAX_PAGES;

impl SearchClient {
    /// Fetches every document for the configured query.
    ///
    /// Starts at offset 0 and advances by the page size. `numFound` is read
    /// from the first page only. Stops on the first of:
    /// - a page with no documents,
    /// - the accumulated count reaching the declared total,
    /// - a page shorter than the page size.
    ///
    /// A short delay separates page requests. A failed page aborts the whole
    /// fetch; documents from earlier pages are discarded.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_page`].
    /// Returns [`ScraperError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn paginate(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<CatalogDocument>, ScraperError> {
        let rows = self.rows;
        let mut documents: Vec<CatalogDocument> = Vec::new();
        let mut start = 0u64;
        let mut declared_total: Option<u64> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ScraperError::PaginationLimit {
                    url: self.endpoint.to_string(),
                    max_pages: MAX_PAGES,
                });
            }

            if page_count > 1 && self.inter_page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_page_delay_ms)).await;
            }

            let page = self.fetch_page(session, start, rows).await?;
            if page_count == 1 {
                declared_total = page.response.num_found;
            }

            let page_len = page.response.docs.len();
            if page_len == 0 {
                tracing::debug!(start, "empty page; stopping");
                break;
            }
            documents.extend(page.response.docs);

            tracing::info!(
                page = page_count,
                start,
                got = page_len,
                collected = documents.len(),
                num_found = declared_total,
                "fetched search page"
            );

            if declared_total.is_some_and(|total| documents.len() as u64 >= total) {
                break;
            }
            if page_len < rows as usize {
                break;
            }
            start += u64::from(rows);
        }

        Ok(documents)
    }
}
