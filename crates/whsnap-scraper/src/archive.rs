//! Optional on-disk copy of one raw search response per run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// `search_response_<UTC %Y%m%dT%H%M%SZ>.json` inside `dir`.
#[must_use]
pub fn archive_path(dir: &Path, at: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "search_response_{}.json",
        at.format("%Y%m%dT%H%M%SZ")
    ))
}

/// Writes `body` pretty-printed. Failures are logged and swallowed.
pub fn archive_response(dir: &Path, body: &Value, at: DateTime<Utc>) -> Option<PathBuf> {
    let path = archive_path(dir, at);
    let result = std::fs::create_dir_all(dir).and_then(|()| {
        let pretty = serde_json::to_string_pretty(body).map_err(std::io::Error::other)?;
        std::fs::write(&path, pretty)
    });
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "archived raw search response");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to archive raw response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn path_uses_compact_utc_timestamp() {
        let path = archive_path(Path::new("raw"), at());
        assert_eq!(path, Path::new("raw/search_response_20250309T140507Z.json"));
    }

    #[test]
    fn writes_pretty_json_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("nested/raw");
        let body = json!({"response": {"numFound": 1}});

        let path = archive_response(&raw, &body, at()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), body);
    }

    #[test]
    fn unwritable_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        assert!(archive_response(&blocker, &json!({}), at()).is_none());
    }
}
