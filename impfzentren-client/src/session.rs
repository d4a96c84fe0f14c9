//! Per-identity HTTP session

use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{HttpRequest, HttpResponse, HttpTransport, HttpUtils, ReqwestTransport};
use crate::types::Identity;

/// Header announcing who to contact about the traffic.
pub const ABUSE_CONTACT_HEADER: &str = "X-Abuse-Contact";

/// Session handle of one identity.
///
/// Owns the transport (and with it the cookie jar) established during login.
/// After login it is only used to send further requests.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    abuse_contact: Option<String>,
}

impl Session {
    pub fn new(transport: Arc<dyn HttpTransport>, abuse_contact: Option<String>) -> Self {
        Self {
            transport,
            abuse_contact,
        }
    }

    /// Send a request in this session, adding the abuse contact header.
    pub async fn send(&self, request: HttpRequest, component: &str) -> Result<HttpResponse> {
        let request = match &self.abuse_contact {
            Some(contact) => request.header(ABUSE_CONTACT_HEADER, contact.as_str()),
            None => request,
        };
        HttpUtils::execute(self.transport.as_ref(), request, component).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("abuse_contact", &self.abuse_contact)
            .finish_non_exhaustive()
    }
}

/// Opens a fresh session for an identity.
pub trait SessionFactory: Send + Sync {
    fn open(&self, identity: &Identity) -> Result<Session>;
}

/// Default factory: one cookie-keeping reqwest client per identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestSessionFactory;

impl SessionFactory for ReqwestSessionFactory {
    fn open(&self, identity: &Identity) -> Result<Session> {
        Ok(Session::new(
            Arc::new(ReqwestTransport::new()?),
            identity.abuse_contact.clone(),
        ))
    }
}
