//! Authorization code extraction from the post-login redirect

use url::Url;

/// Why no authorization code could be taken from the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectError {
    MissingLocation { status: u16 },
    InvalidLocation(String),
    MissingCode,
}

impl std::fmt::Display for RedirectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLocation { status } => {
                write!(f, "HTTP {status} without Location header")
            }
            Self::InvalidLocation(detail) => write!(f, "invalid Location header: {detail}"),
            Self::MissingCode => write!(f, "redirect fragment has no 'code' parameter"),
        }
    }
}

/// Extract `code` from the fragment of a `Location` header.
///
/// With `response_mode=fragment` the provider redirects to
/// `{redirect_uri}#state=..&session_state=..&code=..`. A relative location is
/// resolved against `base`.
pub fn extract_code(location: Option<&str>, status: u16, base: &Url) -> Result<String, RedirectError> {
    let location = location.ok_or(RedirectError::MissingLocation { status })?;
    let url = base
        .join(location)
        .map_err(|e| RedirectError::InvalidLocation(e.to_string()))?;

    let fragment = url.fragment().unwrap_or_default();
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or(RedirectError::MissingCode)
}
