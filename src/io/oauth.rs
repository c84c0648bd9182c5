//! Completing an OAuth sign-in from the provider's redirect.
//!
//! The backend finishes the provider handshake and redirects to
//! `.../oauth2/redirect?token=<jwt>` or `...?error=<reason>`. The user pastes
//! that URL (or just its query string) into `tf oauth` or the login screen.

use url::{Url, form_urlencoded};

use crate::io::api::{ApiError, Backend};
use crate::io::state::{ClientState, Session};
use crate::model::user::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    #[error("Authentication failed: {0}")]
    Provider(String),
    #[error("Authentication failed: Token missing.")]
    MissingToken,
    #[error("Failed to retrieve user details after login: {0}")]
    Profile(ApiError),
}

/// Parameters carried by the redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub token: Option<String>,
    pub error: Option<String>,
}

/// Parse a redirect URL or bare query string. Later duplicates win.
pub fn parse_redirect(input: &str) -> OAuthRedirect {
    let input = input.trim();
    let mut redirect = OAuthRedirect::default();
    let mut take = |key: &str, value: String| {
        let value = Some(value).filter(|v| !v.is_empty());
        match key {
            "token" => redirect.token = value,
            "error" => redirect.error = value,
            _ => {}
        }
    };

    match Url::parse(input) {
        Ok(url) => {
            for (key, value) in url.query_pairs() {
                take(&*key, value.into_owned());
            }
        }
        Err(_) => {
            let query = input.split_once('?').map_or(input, |(_, q)| q);
            let query = query.split('#').next().unwrap_or_default();
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                take(&*key, value.into_owned());
            }
        }
    }
    redirect
}

/// Finish an OAuth sign-in: store the token, fetch the profile, and establish
/// the session. Any failure leaves no token behind.
pub fn complete_oauth(
    input: &str,
    backend: &mut dyn Backend,
    session: &mut Session,
    state: &mut ClientState,
) -> Result<User, OAuthError> {
    let redirect = parse_redirect(input);
    if let Some(error) = redirect.error {
        tracing::warn!(%error, "oauth provider returned an error");
        session.sign_out(state);
        return Err(OAuthError::Provider(error));
    }
    let Some(token) = redirect.token else {
        tracing::warn!("oauth redirect carried no token");
        session.sign_out(state);
        return Err(OAuthError::MissingToken);
    };

    session.sign_in(state, token.clone(), None);
    backend.set_token(Some(token));
    match backend.current_user() {
        Ok(user) => {
            tracing::info!(user = %user.email, "signed in via oauth");
            session.user = Some(user.clone());
            Ok(user)
        }
        Err(e) => {
            session.sign_out(state);
            backend.set_token(None);
            Err(OAuthError::Profile(e))
        }
    }
}
