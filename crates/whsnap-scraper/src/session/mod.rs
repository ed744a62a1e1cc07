//! Session credentials: the on-disk cookie store and the per-request
//! [`SessionContext`] derived from it.

mod capture;
mod store;

pub use capture::{CredentialCapture, FileDropCapture, SECURITY_COOKIE_NAMES};
pub use store::CredentialStore;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, REFERER, USER_AGENT};
use serde::{Deserialize, Serialize};

/// One cookie as exported by a browser. Only `name` and `value` are read;
/// every other attribute (domain, path, expiry, ...) is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Cookie {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            value: Some(value.to_owned()),
            attributes: serde_json::Map::new(),
        }
    }
}

/// The full set of session tokens. Replaced wholesale on refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialSet {
    pub cookies: Vec<Cookie>,
}

impl CredentialSet {
    #[must_use]
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.iter().filter_map(|c| c.name.as_deref())
    }

    /// `name=value` pairs joined with `"; "`. Entries missing a name or a
    /// value are skipped.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        self.cookies
            .iter()
            .filter_map(|c| match (&c.name, &c.value) {
                (Some(name), Some(value)) => Some(format!("{name}={value}")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Static request headers shared by every call in a run.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    pub accept: String,
    pub user_agent: String,
    pub referer: String,
    /// Sent as `x-api-key` when present.
    pub api_key: Option<String>,
}

impl RequestProfile {
    #[must_use]
    pub fn new(user_agent: &str, referer: &str, api_key: Option<&str>) -> Self {
        Self {
            accept: "application/json".to_owned(),
            user_agent: user_agent.to_owned(),
            referer: referer.to_owned(),
            api_key: api_key.map(str::to_owned),
        }
    }
}

/// Everything a request needs to authenticate: the static profile plus the
/// cookie header derived from the current [`CredentialSet`].
///
/// Passed explicitly to the paginator and enrichment client. A refresh
/// produces a new context rather than mutating a shared one.
#[derive(Debug, Clone)]
pub struct SessionContext {
    profile: RequestProfile,
    cookie_header: Option<String>,
}

impl SessionContext {
    #[must_use]
    pub fn new(profile: RequestProfile, credentials: Option<&CredentialSet>) -> Self {
        let cookie_header = credentials
            .map(CredentialSet::to_header_value)
            .filter(|h| !h.is_empty());
        Self {
            profile,
            cookie_header,
        }
    }

    /// Same profile, new credentials.
    #[must_use]
    pub fn with_credentials(&self, credentials: Option<&CredentialSet>) -> Self {
        Self::new(self.profile.clone(), credentials)
    }

    #[must_use]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    #[must_use]
    pub fn profile(&self) -> &RequestProfile {
        &self.profile
    }

    /// Headers for a request. Values that are not valid header text are
    /// dropped with a warning.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, ACCEPT, &self.profile.accept);
        insert(&mut headers, USER_AGENT, &self.profile.user_agent);
        insert(&mut headers, REFERER, &self.profile.referer);
        insert(
            &mut headers,
            HeaderName::from_static("x-requested-with"),
            "XMLHttpRequest",
        );
        if let Some(key) = &self.profile.api_key {
            insert(&mut headers, HeaderName::from_static("x-api-key"), key);
        }
        if let Some(cookie) = &self.cookie_header {
            insert(&mut headers, COOKIE, cookie);
        }
        headers
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => {
            tracing::warn!(header = %name, error = %e, "dropping header with invalid value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RequestProfile {
        RequestProfile::new("Mozilla/5.0", "https://www.costco.com/", Some("key-1"))
    }

    #[test]
    fn header_value_joins_pairs_in_order() {
        let set = CredentialSet::new(vec![Cookie::new("bm_s", "abc"), Cookie::new("_abck", "x=y")]);
        assert_eq!(set.to_header_value(), "bm_s=abc; _abck=x=y");
    }

    #[test]
    fn header_value_skips_malformed_entries() {
        let set: CredentialSet = serde_json::from_str(
            r#"[
                {"name": "a", "value": "1"},
                {"name": "no_value"},
                {"value": "no_name"},
                {"name": "b", "value": "", "domain": ".costco.com"}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.to_header_value(), "a=1; b=");
    }

    #[test]
    fn cookie_attributes_round_trip() {
        let raw = r#"[{"name":"a","value":"1","domain":".costco.com","httpOnly":true}]"#;
        let set: CredentialSet = serde_json::from_str(raw).unwrap();
        assert_eq!(
            set.cookies[0].attributes.get("domain"),
            Some(&serde_json::json!(".costco.com"))
        );
        let back = serde_json::to_value(&set).unwrap();
        assert_eq!(back[0]["httpOnly"], serde_json::json!(true));
    }

    #[test]
    fn session_without_credentials_has_no_cookie_header() {
        let session = SessionContext::new(profile(), None);
        assert!(session.cookie_header().is_none());
        assert!(session.headers().get(COOKIE).is_none());
    }

    #[test]
    fn session_with_empty_set_has_no_cookie_header() {
        let session = SessionContext::new(profile(), Some(&CredentialSet::default()));
        assert!(session.cookie_header().is_none());
    }

    #[test]
    fn headers_carry_profile_and_cookie() {
        let set = CredentialSet::new(vec![Cookie::new("bm_s", "abc")]);
        let headers = SessionContext::new(profile(), Some(&set)).headers();
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "Mozilla/5.0");
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.costco.com/");
        assert_eq!(headers.get("x-api-key").unwrap(), "key-1");
        assert_eq!(headers.get(COOKIE).unwrap(), "bm_s=abc");
    }

    #[test]
    fn with_credentials_replaces_cookie_header() {
        let old = CredentialSet::new(vec![Cookie::new("a", "1")]);
        let new = CredentialSet::new(vec![Cookie::new("b", "2")]);
        let session = SessionContext::new(profile(), Some(&old));
        let refreshed = session.with_credentials(Some(&new));
        assert_eq!(session.cookie_header(), Some("a=1"));
        assert_eq!(refreshed.cookie_header(), Some("b=2"));
    }
}
