use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::env::Environment;
use crate::error::ClientError;
use crate::utils::log_sanitizer::mask_secret;

/// Timestamp format of [`ProbeResult::lastcheck`] (local time, minute resolution).
pub const LASTCHECK_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============ Identity ============

/// One set of portal credentials, as loaded from configuration.
///
/// Immutable after load. `Debug` output masks the password.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password: String,
    #[serde(rename = "credentialId")]
    pub credential_id: String,
    #[serde(rename = "userUUID")]
    pub user_uuid: String,
    #[serde(default)]
    pub env: Environment,
    /// Value of the `X-Abuse-Contact` header sent with every request.
    #[serde(
        rename = "abusecontact",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub abuse_contact: Option<String>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("credential_id", &self.credential_id)
            .field("user_uuid", &self.user_uuid)
            .field("env", &self.env)
            .field("abuse_contact", &self.abuse_contact)
            .finish()
    }
}

// ============ Tokens ============

/// Token endpoint response.
///
/// Token fields are optional on purpose: the login flow stores whatever the
/// provider returned and a missing token only surfaces when an authorization
/// header is requested. Every other field (`expires_in`, `token_type`, ...)
/// is kept verbatim in `metadata`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &self.access_token.as_deref().map(mask_secret))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(mask_secret),
            )
            .field("metadata", &self.metadata.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============ Portal identifiers ============

/// Identifier as used by the portal API: integer or string.
///
/// Serialized back exactly as received, so persisted blobs keep the
/// upstream representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ApiId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for ApiId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

// ============ Districts / Centers / Sites ============

/// Administrative district with its vaccination centers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct District {
    pub name: String,
    #[serde(default)]
    pub centers: Vec<CenterRef>,
    /// Remaining payload fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Center reference inside a [`District`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CenterRef {
    pub id: ApiId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Site entry as returned by `/api/v1/centers/{centerId}/sites`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSite {
    pub id: ApiId,
    /// Passed through as sent; `null` and absent both map to `None`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(rename = "type", default)]
    pub site_type: Option<String>,
}

/// Site record as persisted in the `sites` and `appointments` blobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteRecord {
    /// Center the site belongs to.
    pub center: ApiId,
    pub name: Option<String>,
    /// Postal address; `null` when the API omits it.
    pub address: Option<Value>,
    #[serde(rename = "type")]
    pub site_type: Option<String>,
    /// Result of the latest probe, absent until the site has been probed.
    #[serde(flatten)]
    pub probe: Option<ProbeResult>,
}

impl SiteRecord {
    /// Map an API site into its record, keyed by the site id.
    pub fn from_api(site: ApiSite, center: &ApiId) -> (String, Self) {
        (
            site.id.to_string(),
            Self {
                center: center.clone(),
                name: site.name,
                address: site.address,
                site_type: site.site_type,
                probe: None,
            },
        )
    }

    /// Store the outcome of one probe attempt.
    ///
    /// Sets `first_available` from the outcome and stamps `lastcheck` in the
    /// same step, so no outcome leaves the record unstamped.
    pub fn record_probe(&mut self, outcome: &ProbeOutcome, checked_at: NaiveDateTime) {
        self.probe = Some(ProbeResult {
            first_available: outcome.slot().cloned(),
            lastcheck: checked_at.format(LASTCHECK_FORMAT).to_string(),
        });
    }

    /// Site name for log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn first_available(&self) -> Option<&AppointmentSlot> {
        self.probe.as_ref().and_then(|p| p.first_available.as_ref())
    }

    pub fn lastcheck(&self) -> Option<&str> {
        self.probe.as_ref().map(|p| p.lastcheck.as_str())
    }
}

/// District name → center ids, in district order.
pub type CenterIndex = IndexMap<String, Vec<ApiId>>;

/// Site id → site record, in insertion order.
pub type SiteMap = IndexMap<String, SiteRecord>;

// ============ Appointments ============

/// Next free appointment slot of a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSlot {
    pub date: String,
    pub time: String,
    pub vaccine: ApiId,
}

/// Persisted probe result. Cannot exist without a `lastcheck` stamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeResult {
    /// `null` when no slot is known.
    pub first_available: Option<AppointmentSlot>,
    pub lastcheck: String,
}

/// Body of `/api/v1/citizens/{userUUID}/appointments/next`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAppointment {
    pub first_vaccination_date: String,
    pub first_vaccination_time: String,
    pub vaccine_id: ApiId,
}

impl From<NextAppointment> for AppointmentSlot {
    fn from(next: NextAppointment) -> Self {
        Self {
            date: next.first_vaccination_date,
            time: next.first_vaccination_time,
            vaccine: next.vaccine_id,
        }
    }
}

/// Classified outcome of one appointment query.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// HTTP 200/201/202 with a slot.
    Available(AppointmentSlot),
    /// HTTP 404: no appointment known for this site.
    NotFound,
    /// Any status other than 2xx-with-slot or 404.
    UnexpectedStatus(u16),
    /// Success status, but the body was not a slot.
    Malformed(ClientError),
    /// The request never produced a response.
    Transport(ClientError),
}

impl ProbeOutcome {
    pub fn slot(&self) -> Option<&AppointmentSlot> {
        match self {
            Self::Available(slot) => Some(slot),
            _ => None,
        }
    }
}
