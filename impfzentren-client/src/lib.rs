//! Impfzentren Client Library
//!
//! Checks appointment availability on the Bavarian vaccination-center
//! citizen portal:
//! - OIDC form login per identity (Authenticator)
//! - Round-robin identity rotation (IdentityRotator)
//! - District / center / site enumeration (ResourceWalker)
//! - Next-appointment probing per site (AppointmentProber)
//! - Stage checkpoints as JSON files (JsonStore, Pipeline)
//!
//! All network access goes through the [`HttpTransport`] trait, so the whole
//! pipeline can run against scripted responses.

pub mod auth;
pub mod config;
pub mod env;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod prober;
pub mod rotator;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;
pub mod walker;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use auth::bearer::TokenField;
pub use auth::{Authenticator, OidcConfig};
pub use config::{load_identities, parse_identities};
pub use env::Environment;
pub use error::{ClientError, Result};
pub use http_client::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use pipeline::{Pipeline, RunSummary, Stage};
pub use prober::AppointmentProber;
pub use rotator::{AuthenticatedIdentity, IdentityRotator};
pub use session::{ReqwestSessionFactory, Session, SessionFactory};
pub use store::JsonStore;
pub use types::{
    ApiId, AppointmentSlot, CenterIndex, District, Identity, ProbeOutcome, ProbeResult,
    SiteMap, SiteRecord, TokenPair,
};
pub use walker::ResourceWalker;
