pub mod acquire;
pub mod archive;
pub mod classify;
pub mod client;
pub mod enrich;
pub mod error;
pub mod normalize;
pub mod probe;
pub mod retry;
pub mod session;
pub mod types;

pub use acquire::{acquire_documents, Acquisition};
pub use archive::archive_response;
pub use classify::classify;
pub use client::{SearchClient, SearchParams};
pub use enrich::{EnrichmentClient, EnrichmentSettings};
pub use error::{CaptureError, ScraperError};
pub use normalize::normalize;
pub use probe::{AuthController, ProbeOutcome};
pub use retry::RetryPolicy;
pub use session::{
    Cookie, CredentialCapture, CredentialSet, CredentialStore, FileDropCapture, RequestProfile,
    SessionContext, SECURITY_COOKIE_NAMES,
};
pub use types::{CatalogDocument, EnrichmentPayload};
