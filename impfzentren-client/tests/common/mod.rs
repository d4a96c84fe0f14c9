//! Shared test tools: a scripted portal behind the public transport trait

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use impfzentren_client::{
    Authenticator, HttpMethod, HttpRequest, HttpResponse, HttpTransport, Identity, Result,
    Session, SessionFactory, parse_identities,
};

/// Assert a `Result` is `Ok` and unwrap it (the test fails otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

pub const LOGIN_ACTION: &str =
    "https://ciam.impfzentren.bayern/auth/realms/C19V-Citizen/login-actions/authenticate?session_code=sc&amp;execution=ex";

pub const CONFIG: &str = r#"[
    {"username": "alice@example.org", "password": "pw-a", "credentialId": "c-a", "userUUID": "uuid-alice", "abusecontact": "ops@example.org"},
    {"username": "bob@example.org", "password": "pw-b", "credentialId": "c-b", "userUUID": "uuid-bob", "env": "prod"}
]"#;

pub fn identities() -> Vec<Identity> {
    parse_identities(CONFIG).unwrap_or_default()
}

/// In-memory portal: login endpoints, the REST reads and the appointment
/// endpoint.
///
/// Districts: `A` → centers 1, 2 and `B` → center 3. Site 12 is listed by
/// both center 1 and center 2. Site 11 has a slot, site 31 answers 500 and
/// every other site 404.
pub struct FakePortal {
    pub login_html: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakePortal {
    pub fn new() -> Arc<Self> {
        Self::with_login_page(login_page(LOGIN_ACTION))
    }

    pub fn with_login_page(html: String) -> Arc<Self> {
        Arc::new(Self {
            login_html: html,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests sent to the API host.
    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.host_str() == Some("impfzentren.bayern"))
            .collect()
    }

    fn answer(&self, request: &HttpRequest) -> HttpResponse {
        let path = request.url.path();
        match (request.method, path) {
            (HttpMethod::Get, p) if p.ends_with("/openid-connect/auth") => {
                HttpResponse::new(200, self.login_html.clone())
            }
            (HttpMethod::Post, p) if p.ends_with("/login-actions/authenticate") => {
                let user = request.form_value("username").unwrap_or_default();
                let user = user.split('@').next().unwrap_or_default();
                HttpResponse::new(302, "").with_location(format!(
                    "https://impfzentren.bayern/citizen/#state=s&session_state=ss&code=code-{user}"
                ))
            }
            (HttpMethod::Post, p) if p.ends_with("/openid-connect/token") => {
                let user = request
                    .form_value("code")
                    .and_then(|c| c.strip_prefix("code-"))
                    .unwrap_or_default();
                HttpResponse::new(
                    200,
                    format!(
                        r#"{{"access_token":"acc-{user}","refresh_token":"ref-{user}","expires_in":300,"refresh_expires_in":1800}}"#
                    ),
                )
            }
            (HttpMethod::Get, "/api/v1/vaccines/") => HttpResponse::new(
                200,
                r#"[{"id":"V1","name":"Comirnaty"},{"id":"V2","name":"Spikevax"}]"#,
            ),
            (HttpMethod::Get, "/api/v1/districts/") => HttpResponse::new(
                200,
                r#"[
                    {"id": 91, "name": "A", "centers": [{"id": 1}, {"id": 2}]},
                    {"id": 92, "name": "B", "centers": [{"id": 3}]}
                ]"#,
            ),
            (HttpMethod::Get, "/api/v1/centers/1/sites") => HttpResponse::new(
                200,
                r#"[
                    {"id": 11, "name": "Messe", "type": "VACCINATION_CENTER", "address": {"city": "München"}},
                    {"id": 12, "name": "Klinikum", "type": "HOSPITAL"}
                ]"#,
            ),
            (HttpMethod::Get, "/api/v1/centers/2/sites") => HttpResponse::new(
                200,
                r#"[
                    {"id": 12, "name": "Klinikum Ost", "type": "HOSPITAL"},
                    {"id": 21, "name": "Turnhalle", "type": "VACCINATION_CENTER"}
                ]"#,
            ),
            (HttpMethod::Get, "/api/v1/centers/3/sites") => HttpResponse::new(
                200,
                r#"[{"id": 31, "name": "Mobil", "type": "MOBILE"}]"#,
            ),
            (HttpMethod::Get, p) if p.ends_with("/appointments/next") => {
                match request.query_value("possibleSiteId").as_deref() {
                    Some("11") => HttpResponse::new(
                        200,
                        r#"{"firstVaccinationDate":"2021-06-01","firstVaccinationTime":"10:00","vaccineId":"V1"}"#,
                    ),
                    Some("31") => HttpResponse::new(500, "Internal Server Error"),
                    _ => HttpResponse::new(404, ""),
                }
            }
            _ => HttpResponse::new(404, ""),
        }
    }
}

#[async_trait]
impl HttpTransport for FakePortal {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.answer(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        Ok(response)
    }
}

/// Opens every session on the same portal.
pub struct PortalSessions(pub Arc<FakePortal>);

impl SessionFactory for PortalSessions {
    fn open(&self, identity: &Identity) -> Result<Session> {
        Ok(Session::new(self.0.clone(), identity.abuse_contact.clone()))
    }
}

pub fn authenticator(portal: &Arc<FakePortal>) -> Authenticator {
    Authenticator::with_session_factory(Arc::new(PortalSessions(portal.clone())))
}

/// Keycloak-like login page. `action` must already be HTML-escaped.
pub fn login_page(action: &str) -> String {
    format!(
        r#"<html><body><form id="kc-form-login" action="{action}" method="post">
<input name="username"/><input name="password" type="password"/>
<input type="hidden" name="credentialId"/></form></body></html>"#
    )
}
