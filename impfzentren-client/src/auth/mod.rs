//! OpenID-Connect form login
//!
//! The portal offers no API login. The flow replays what the citizen
//! frontend does in a browser:
//!
//! 1. GET the authorization endpoint, which starts a session and returns
//!    the Keycloak login page
//! 2. read the submit target of `#kc-form-login`
//! 3. POST the credentials there without following the redirect
//! 4. take the authorization code from the `Location` fragment
//! 5. exchange the code at the token endpoint
//!
//! All five steps share one [`Session`] so the provider's cookies carry over.

pub mod bearer;
pub mod form;
pub mod redirect;

use std::sync::Arc;

use url::Url;

use crate::error::{ClientError, Result};
use crate::http_client::{HttpRequest, HttpUtils};
use crate::rotator::AuthenticatedIdentity;
use crate::session::{ReqwestSessionFactory, Session, SessionFactory};
use crate::types::{Identity, TokenPair};
use crate::utils::log_sanitizer::mask_secret;

const COMPONENT: &str = "auth";

/// OIDC client registration of the citizen frontend.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub client_id: String,
    pub realm: String,
    pub scope: String,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            client_id: "c19v-frontend".to_string(),
            realm: "C19V-Citizen".to_string(),
            scope: "openid".to_string(),
        }
    }
}

impl OidcConfig {
    pub fn auth_endpoint(&self, identity: &Identity) -> String {
        format!(
            "{}/auth/realms/{}/protocol/openid-connect/auth",
            identity.env.iam_base(),
            self.realm
        )
    }

    pub fn token_endpoint(&self, identity: &Identity) -> String {
        format!(
            "{}/auth/realms/{}/protocol/openid-connect/token",
            identity.env.iam_base(),
            self.realm
        )
    }
}

/// Performs the authorization-code login for identities, one at a time.
pub struct Authenticator {
    config: OidcConfig,
    sessions: Arc<dyn SessionFactory>,
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator {
    pub fn new() -> Self {
        Self::with_session_factory(Arc::new(ReqwestSessionFactory))
    }

    pub fn with_session_factory(sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            config: OidcConfig::default(),
            sessions,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: OidcConfig) -> Self {
        self.config = config;
        self
    }

    /// Log one identity in.
    ///
    /// Opens a new session and returns it together with the token endpoint
    /// response. Token fields are not validated here.
    ///
    /// # Errors
    /// - [`ClientError::LoginParse`] when the login page has no usable form
    /// - [`ClientError::LoginRedirect`] when the credential submission does not
    ///   redirect with a code (wrong credentials, MFA, disabled account)
    /// - transport and parse errors of any step
    pub async fn login(&self, identity: &Identity) -> Result<(Session, TokenPair)> {
        log::info!("[{COMPONENT}] Logging in {}", identity.username);

        let session = self.sessions.open(identity)?;
        let action = self.fetch_login_action(&session, identity).await?;
        let code = self.submit_credentials(&session, identity, action).await?;
        let tokens = self.exchange_code(&session, identity, &code).await?;

        log::info!("[{COMPONENT}] Logged in {}", identity.username);
        Ok((session, tokens))
    }

    /// Log every identity in, in configuration order.
    ///
    /// Stops at the first failure; a partial identity set is never returned.
    pub async fn login_all(&self, identities: Vec<Identity>) -> Result<Vec<AuthenticatedIdentity>> {
        if identities.is_empty() {
            return Err(ClientError::NoIdentities);
        }

        let mut members = Vec::with_capacity(identities.len());
        for identity in identities {
            let (session, tokens) = self.login(&identity).await?;
            members.push(AuthenticatedIdentity {
                identity,
                tokens,
                session,
            });
        }
        Ok(members)
    }

    /// Steps 1-2: load the login page and read the form's submit target.
    async fn fetch_login_action(&self, session: &Session, identity: &Identity) -> Result<Url> {
        let nonce = uuid::Uuid::new_v4().to_string();
        let redirect_uri = identity.env.redirect_uri();
        let request = HttpRequest::get(HttpUtils::parse_url(
            &self.config.auth_endpoint(identity),
        )?)
        .query("client_id", &self.config.client_id)
        .query("redirect_uri", &redirect_uri)
        .query("response_mode", "fragment")
        .query("response_type", "code")
        .query("scope", &self.config.scope)
        .query("nonce", &nonce);

        let page_url = request.url.clone();
        let response = session.send(request, COMPONENT).await?;
        if !response.is_success() {
            log::warn!(
                "[{COMPONENT}] Login page answered HTTP {} for {}",
                response.status,
                identity.username
            );
        }

        form::extract_login_action(&response.body, &page_url).map_err(|e| {
            ClientError::LoginParse {
                username: identity.username.clone(),
                detail: e.to_string(),
            }
        })
    }

    /// Steps 3-4: submit the credentials and read the code off the redirect.
    async fn submit_credentials(
        &self,
        session: &Session,
        identity: &Identity,
        action: Url,
    ) -> Result<String> {
        log::debug!(
            "[{COMPONENT}] Submitting credentials for {} (password {})",
            identity.username,
            mask_secret(&identity.password)
        );

        let request = HttpRequest::post_form(
            action.clone(),
            [
                ("username", identity.username.as_str()),
                ("password", identity.password.as_str()),
                ("credentialId", identity.credential_id.as_str()),
            ],
        );
        let response = session.send(request, COMPONENT).await?;

        redirect::extract_code(response.location.as_deref(), response.status, &action).map_err(
            |e| ClientError::LoginRedirect {
                username: identity.username.clone(),
                detail: e.to_string(),
            },
        )
    }

    /// Step 5: exchange the code for the token pair.
    async fn exchange_code(
        &self,
        session: &Session,
        identity: &Identity,
        code: &str,
    ) -> Result<TokenPair> {
        let redirect_uri = identity.env.redirect_uri();
        let request = HttpRequest::post_form(
            HttpUtils::parse_url(&self.config.token_endpoint(identity))?,
            [
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("code", code),
            ],
        )
        .redact_response();
        let response = session.send(request, COMPONENT).await?;
        if !response.is_success() {
            log::warn!(
                "[{COMPONENT}] Token endpoint answered HTTP {} for {}",
                response.status,
                identity.username
            );
        }

        HttpUtils::parse_json_redacted(&response.body, COMPONENT)
    }
}
