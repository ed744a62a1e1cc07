//! The external interactive credential-capture step.
//!
//! Signing in happens outside this process (a person driving a browser, or
//! a browser-automation tool). The core only sees the
//! [`CredentialCapture`] trait; [`FileDropCapture`] is the shipped
//! implementation, which waits for that agent to export its cookie jar.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::CredentialSet;
use crate::error::CaptureError;

/// Cookie names whose presence means the bot-manager session is established.
pub const SECURITY_COOKIE_NAMES: [&str; 5] = ["bm_s", "bm_sz", "bm_sc", "_abck", "ak_bmsc"];

/// Obtains a fresh credential set from an interactive agent.
pub trait CredentialCapture {
    /// Blocks (cooperatively) until credentials are captured or the agent's
    /// own deadline passes.
    fn refresh_credentials(
        &self,
    ) -> impl Future<Output = Result<CredentialSet, CaptureError>> + Send;
}

/// Waits for a browser cookie export (a JSON cookie list) at `drop_path`.
///
/// Polls every `poll_interval` until the export contains one of
/// [`SECURITY_COOKIE_NAMES`] or `timeout` elapses. At the deadline it
/// returns whatever was exported, or [`CaptureError::Timeout`] if nothing
/// was. An export left over from an earlier capture is removed first.
#[derive(Debug, Clone)]
pub struct FileDropCapture {
    drop_path: PathBuf,
    timeout: Duration,
    poll_interval: Duration,
}

impl FileDropCapture {
    #[must_use]
    pub fn new(drop_path: impl Into<PathBuf>, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            drop_path: drop_path.into(),
            timeout,
            poll_interval,
        }
    }

    fn clear_stale_export(&self) -> Result<(), CaptureError> {
        match std::fs::remove_file(&self.drop_path) {
            Ok(()) => {
                tracing::debug!(path = %self.drop_path.display(), "removed stale cookie export");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CaptureError::Io {
                path: self.drop_path.display().to_string(),
                source: e,
            }),
        }
    }

    /// `Ok(None)` while nothing has been exported yet.
    fn read_export(&self) -> Result<Option<CredentialSet>, CaptureError> {
        let content = match std::fs::read_to_string(&self.drop_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CaptureError::Io {
                    path: self.drop_path.display().to_string(),
                    source: e,
                })
            }
        };
        serde_json::from_str::<CredentialSet>(&content)
            .map(Some)
            .map_err(|e| CaptureError::Parse {
                path: self.drop_path.display().to_string(),
                source: e,
            })
    }
}

fn has_security_cookie(set: &CredentialSet) -> bool {
    set.names().any(|n| SECURITY_COOKIE_NAMES.contains(&n))
}

impl CredentialCapture for FileDropCapture {
    async fn refresh_credentials(&self) -> Result<CredentialSet, CaptureError> {
        self.clear_stale_export()?;
        tracing::info!(
            path = %self.drop_path.display(),
            timeout_secs = self.timeout.as_secs(),
            "sign in with the browser and export its cookies to the drop path; waiting"
        );

        let started = Instant::now();
        let mut captured: Option<CredentialSet> = None;
        let mut last_error: Option<CaptureError> = None;

        loop {
            match self.read_export() {
                Ok(Some(set)) => {
                    if has_security_cookie(&set) {
                        let names: Vec<&str> = set.names().collect();
                        tracing::info!(cookies = ?names, "detected security cookies");
                        return Ok(set);
                    }
                    captured = Some(set);
                }
                Ok(None) => {}
                // A half-written export parses badly; try again next poll.
                Err(e) => {
                    tracing::debug!(error = %e, "cookie export not readable yet");
                    last_error = Some(e);
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                break;
            }
            tokio::time::sleep(self.poll_interval.min(self.timeout - elapsed)).await;
        }

        match captured.filter(|set| !set.is_empty()) {
            Some(set) => {
                tracing::warn!(
                    cookies = set.cookies.len(),
                    "capture timed out without security cookies; proceeding with what was exported"
                );
                Ok(set)
            }
            None => Err(last_error.unwrap_or(CaptureError::Timeout {
                waited_secs: self.timeout.as_secs(),
            })),
        }
    }
}
