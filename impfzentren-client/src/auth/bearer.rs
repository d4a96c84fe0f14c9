//! Authorization header builder

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::types::TokenPair;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Token pair field used as bearer credential.
///
/// Defaults to the refresh token: it stays valid for about 30 minutes while
/// the access token expires after about 5, and tokens are never refreshed
/// during a run. Long runs will outlive both; there is no renewal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenField {
    #[default]
    Refresh,
    Access,
}

impl TokenField {
    /// Name of the field in the token endpoint response.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Refresh => "refresh_token",
            Self::Access => "access_token",
        }
    }

    fn read(self, tokens: &TokenPair) -> Option<&str> {
        match self {
            Self::Refresh => tokens.refresh_token.as_deref(),
            Self::Access => tokens.access_token.as_deref(),
        }
    }
}

/// Build `("Authorization", "Bearer <token>")` from the configured token field.
///
/// # Errors
/// [`ClientError::MissingToken`] when the field is absent or empty.
pub fn authorization_header(tokens: &TokenPair, field: TokenField) -> Result<(&'static str, String)> {
    let token = field
        .read(tokens)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ClientError::MissingToken {
            field: field.field_name().to_string(),
        })?;
    Ok((AUTHORIZATION_HEADER, format!("Bearer {token}")))
}
