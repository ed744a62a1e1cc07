use std::io;
use std::path::{Path, PathBuf};

use super::CredentialSet;

/// JSON cookie list at a fixed path.
///
/// Read once at start, rewritten wholesale after each successful capture.
/// I/O failures are logged and never abort the run: the caller keeps the
/// in-memory credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when the file is missing or unreadable.
    #[must_use]
    pub fn load(&self) -> Option<CredentialSet> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no stored credentials");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read credentials file");
                return None;
            }
        };

        match serde_json::from_str::<CredentialSet>(&content) {
            Ok(set) => {
                tracing::debug!(path = %self.path.display(), cookies = set.cookies.len(), "loaded credentials");
                Some(set)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "credentials file is not a cookie list");
                None
            }
        }
    }

    /// Overwrites the store. Failures are logged, not returned.
    pub fn save(&self, credentials: &CredentialSet) {
        match self.write(credentials) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), cookies = credentials.cookies.len(), "wrote credentials");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to write credentials; continuing with in-memory session"
                );
            }
        }
    }

    /// Writes to a sibling temp file, then renames over the store.
    fn write(&self, credentials: &CredentialSet) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(credentials).map_err(io::Error::other)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let result = std::fs::write(&tmp, json).and_then(|()| std::fs::rename(&tmp, &self.path));
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }
}
