//! Portal environments and host derivation

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Application host of the production portal.
pub const PRODUCTION_API_HOST: &str = "impfzentren.bayern";
/// Identity-provider host of the production portal.
pub const PRODUCTION_IAM_HOST: &str = "ciam.impfzentren.bayern";

/// Tag that selects production explicitly.
const PRODUCTION_TAG: &str = "prod";

/// Portal environment an identity belongs to.
///
/// Configured through the optional `env` field. An absent field or `"prod"`
/// selects production; any other tag `X` selects the `X-` prefixed hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Named(String),
}

impl Environment {
    /// Build an environment from an optional configuration tag.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            None | Some("" | PRODUCTION_TAG) => Self::Production,
            Some(tag) => Self::Named(tag.to_string()),
        }
    }

    /// Host of the REST API and citizen frontend.
    pub fn api_host(&self) -> String {
        match self {
            Self::Production => PRODUCTION_API_HOST.to_string(),
            Self::Named(tag) => format!("{tag}-{PRODUCTION_API_HOST}"),
        }
    }

    /// Host of the OpenID-Connect identity provider.
    pub fn iam_host(&self) -> String {
        match self {
            Self::Production => PRODUCTION_IAM_HOST.to_string(),
            Self::Named(tag) => format!("{tag}-{PRODUCTION_IAM_HOST}"),
        }
    }

    pub fn api_base(&self) -> String {
        format!("https://{}", self.api_host())
    }

    pub fn iam_base(&self) -> String {
        format!("https://{}", self.iam_host())
    }

    /// Redirect URI registered for the citizen frontend client.
    pub fn redirect_uri(&self) -> String {
        format!("https://{}/citizen/", self.api_host())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str(PRODUCTION_TAG),
            Self::Named(tag) => f.write_str(tag),
        }
    }
}

impl Serialize for Environment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_tag(tag.as_deref()))
    }
}
