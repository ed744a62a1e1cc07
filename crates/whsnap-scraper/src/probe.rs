//! Credential verification and the single-shot refresh protocol.

use serde_json::Value;

use crate::client::SearchClient;
use crate::error::ScraperError;
use crate::session::{CredentialCapture, CredentialStore, SessionContext};

/// Result of a minimal page-one request.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    /// The parsed body, when it was JSON.
    pub body: Option<Value>,
}

impl ProbeOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }

    fn describe(&self) -> String {
        self.status
            .map_or_else(|| "no response".to_owned(), |s| format!("HTTP {s}"))
    }
}

/// Verifies the session and, when it is rejected, refreshes credentials
/// through the capture collaborator exactly once.
#[derive(Debug)]
pub struct AuthController<C> {
    store: CredentialStore,
    capture: C,
}

impl<C: CredentialCapture> AuthController<C> {
    pub fn new(store: CredentialStore, capture: C) -> Self {
        Self { store, capture }
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Issues `start=0&rows=1` with the session's headers. Never fails:
    /// a transport error is reported as an outcome without status.
    pub async fn verify(&self, client: &SearchClient, session: &SessionContext) -> ProbeOutcome {
        match client.fetch_raw(session, 0, 1).await {
            Ok(raw) => {
                let body = serde_json::from_str::<Value>(&raw.body).ok();
                tracing::info!(status = raw.status, "probe response");
                ProbeOutcome {
                    status: Some(raw.status),
                    body,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "probe request failed");
                ProbeOutcome::default()
            }
        }
    }

    /// Verifies `session`; on rejection runs [`Self::refresh_and_verify`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Authorization`] if the refreshed session is
    /// still rejected or capture fails.
    pub async fn ensure_authorized(
        &self,
        client: &SearchClient,
        session: SessionContext,
    ) -> Result<(SessionContext, ProbeOutcome), ScraperError> {
        let outcome = self.verify(client, &session).await;
        if outcome.is_ok() {
            return Ok((session, outcome));
        }
        tracing::warn!(
            outcome = %outcome.describe(),
            "stored credentials rejected; refreshing"
        );
        self.refresh_and_verify(client, &session).await
    }

    /// Captures a new credential set, persists it, derives a new session
    /// and verifies it once. No further retry.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Authorization`] if capture fails or the new
    /// session is rejected.
    pub async fn refresh_and_verify(
        &self,
        client: &SearchClient,
        session: &SessionContext,
    ) -> Result<(SessionContext, ProbeOutcome), ScraperError> {
        let credentials =
            self.capture
                .refresh_credentials()
                .await
                .map_err(|e| ScraperError::Authorization {
                    reason: format!("credential capture failed: {e}"),
                })?;
        tracing::info!(cookies = credentials.cookies.len(), "captured new credentials");
        self.store.save(&credentials);

        let refreshed = session.with_credentials(Some(&credentials));
        let outcome = self.verify(client, &refreshed).await;
        if !outcome.is_ok() {
            return Err(ScraperError::Authorization {
                reason: format!("probe still failing after refresh ({})", outcome.describe()),
            });
        }
        Ok((refreshed, outcome))
    }
}
