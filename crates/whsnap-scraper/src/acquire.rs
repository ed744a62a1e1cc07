//! Authorized, paginated retrieval of one warehouse's catalog documents.

use serde_json::Value;

use crate::client::SearchClient;
use crate::error::ScraperError;
use crate::probe::AuthController;
use crate::session::{CredentialCapture, SessionContext};
use crate::types::CatalogDocument;

/// What a successful acquisition hands to the rest of the pipeline.
#[derive(Debug)]
pub struct Acquisition {
    pub documents: Vec<CatalogDocument>,
    /// The session that produced `documents`; enrichment reuses it.
    pub session: SessionContext,
    /// Body of the successful probe, for archiving.
    pub probe_body: Option<Value>,
    /// Whether an empty first pass forced a mid-run refresh.
    pub reactive_refresh: bool,
}

/// Probe, refresh if rejected, then paginate.
///
/// An empty result is read as a possibly expired session: credentials are
/// refreshed once and pagination runs once more. A second empty result is
/// accepted as a genuinely empty catalog.
///
/// # Errors
///
/// - [`ScraperError::Authorization`] if refresh fails or is rejected.
/// - Any pagination error from [`SearchClient::paginate`].
pub async fn acquire_documents<C: CredentialCapture>(
    client: &SearchClient,
    auth: &AuthController<C>,
    session: SessionContext,
) -> Result<Acquisition, ScraperError> {
    let (mut session, mut probe) = auth.ensure_authorized(client, session).await?;
    let mut documents = client.paginate(&session).await?;
    let mut reactive_refresh = false;

    if documents.is_empty() {
        tracing::warn!("first page came back empty; treating as expired session");
        let (refreshed, reprobe) = auth.refresh_and_verify(client, &session).await?;
        session = refreshed;
        probe = reprobe;
        reactive_refresh = true;
        documents = client.paginate(&session).await?;
        if documents.is_empty() {
            tracing::warn!("catalog still empty after refresh");
        }
    }

    tracing::info!(
        documents = documents.len(),
        reactive_refresh,
        "acquired catalog documents"
    );
    Ok(Acquisition {
        documents,
        session,
        probe_body: probe.body,
        reactive_refresh,
    })
}
