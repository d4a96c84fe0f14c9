//! Login form extraction

use scraper::{Html, Selector};
use url::Url;

/// Element id of the Keycloak login form.
pub const LOGIN_FORM_ID: &str = "kc-form-login";

/// Why the submit target could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingForm,
    MissingAction,
    InvalidAction(String),
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingForm => write!(f, "no element with id '{LOGIN_FORM_ID}'"),
            Self::MissingAction => write!(f, "element '{LOGIN_FORM_ID}' has no action attribute"),
            Self::InvalidAction(detail) => write!(f, "invalid form action: {detail}"),
        }
    }
}

/// Extract the submit URL of the login form.
///
/// The `action` attribute carries the provider's session-correlation
/// parameters (`session_code`, `execution`, `tab_id`). Attribute entities are
/// decoded by the parser; a relative action is resolved against `page_url`.
pub fn extract_login_action(html: &str, page_url: &Url) -> Result<Url, FormError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("#{LOGIN_FORM_ID}"))
        .map_err(|e| FormError::InvalidAction(format!("{e:?}")))?;

    let form = document
        .select(&selector)
        .next()
        .ok_or(FormError::MissingForm)?;
    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(FormError::MissingAction)?;

    page_url
        .join(action)
        .map_err(|e| FormError::InvalidAction(e.to_string()))
}
