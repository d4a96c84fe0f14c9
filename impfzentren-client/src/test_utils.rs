//! Test helpers
//!
//! Scripted transports and fixture factories for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Map;

use crate::env::Environment;
use crate::error::Result;
use crate::http_client::{HttpRequest, HttpResponse, HttpTransport};
use crate::rotator::{AuthenticatedIdentity, IdentityRotator};
use crate::session::{Session, SessionFactory};
use crate::types::{Identity, TokenPair};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

// ===== MockTransport =====

/// Transport answering every request through a closure and recording it.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Transport answering 404 to everything.
    pub fn not_found() -> Self {
        Self::new(|_| Ok(HttpResponse::new(404, "")))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

// ===== MockSessionFactory =====

/// Opens every session on the same scripted transport.
pub struct MockSessionFactory {
    transport: Arc<MockTransport>,
}

impl MockSessionFactory {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self { transport }
    }
}

impl SessionFactory for MockSessionFactory {
    fn open(&self, identity: &Identity) -> Result<Session> {
        Ok(Session::new(
            self.transport.clone(),
            identity.abuse_contact.clone(),
        ))
    }
}

// ===== Log capture =====

/// Process-wide logger recording every formatted message.
struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.lines.lock().unwrap().push(record.args().to_string());
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

/// Install the capture logger at trace level. Safe to call from every test.
///
/// Tests share the logger, so assertions should look for values unique to
/// the test.
pub fn capture_logs() {
    // Err only means an earlier test installed it already.
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Trace);
}

/// Captured lines containing `needle`.
pub fn logged_lines_containing(needle: &str) -> Vec<String> {
    CAPTURE
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}

// ===== Fixtures =====

pub fn identity(name: &str) -> Identity {
    Identity {
        username: name.to_string(),
        password: format!("pw-{name}"),
        credential_id: format!("cred-{name}"),
        user_uuid: format!("uuid-{name}"),
        env: Environment::Production,
        abuse_contact: None,
    }
}

/// Authenticated identity holding `refresh-{name}` / `access-{name}` tokens.
pub fn member(name: &str, transport: &Arc<MockTransport>) -> AuthenticatedIdentity {
    AuthenticatedIdentity {
        identity: identity(name),
        tokens: TokenPair {
            access_token: Some(format!("access-{name}")),
            refresh_token: Some(format!("refresh-{name}")),
            metadata: Map::new(),
        },
        session: Session::new(transport.clone(), None),
    }
}

/// Rotator over `names`, all sharing `transport`.
pub fn rotator(names: &[&str], transport: &Arc<MockTransport>) -> IdentityRotator {
    IdentityRotator::new(names.iter().map(|n| member(n, transport)).collect()).unwrap()
}

/// Keycloak-like login page whose form posts to `action`.
pub fn login_page(action: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
<div id="kc-content"><form id="kc-form-login" onsubmit="login.disabled = true; return true;" action="{}" method="post">
<input tabindex="1" id="username" name="username" type="text" autofocus autocomplete="off"/>
<input tabindex="2" id="password" name="password" type="password" autocomplete="off"/>
<input type="hidden" id="id-hidden-input" name="credentialId"/>
<input tabindex="4" name="login" id="kc-login" type="submit" value="Anmelden"/>
</form></div></body></html>"#,
        action.replace('&', "&amp;")
    )
}
