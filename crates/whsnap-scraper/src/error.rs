use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("401 unauthorized from {url}")]
    Unauthorized { url: String },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        /// First 300 characters of the response body.
        body: String,
    },

    #[error("invalid endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },

    #[error("authorization failed: {reason}")]
    Authorization { reason: String },
}

impl ScraperError {
    /// Builds [`ScraperError::UnexpectedStatus`], truncating `body` to its
    /// first 300 characters.
    pub(crate) fn unexpected_status(status: u16, url: &str, body: &str) -> Self {
        ScraperError::UnexpectedStatus {
            status,
            url: url.to_owned(),
            body: body.chars().take(300).collect(),
        }
    }
}

/// Failures of the external credential-capture collaborator.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no credentials captured within {waited_secs}s")]
    Timeout { waited_secs: u64 },

    #[error("failed to read captured credentials from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("captured credentials at {path} are not a cookie list: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
