//! Login, signup and logout.
//!
//! Remote failures are turned into the fixed messages shown on the auth
//! screens; the token slot only changes on success.

use thiserror::Error;

use crate::api::{Backend, Credentials, Registration};
use crate::app::error::{GENERIC_FAILURE, NOT_VERIFIED};
use crate::app::{ApiError, Result};
use crate::domain::Session;
use crate::forms::{FormErrors, LoginForm, SignupForm};
use crate::session::SessionStore;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const ALREADY_EXISTS: &str = "Email or username already exists";
pub const INVALID_DATA: &str = "Invalid data, please check your inputs";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Invalid(FormErrors),

    #[error("{0}")]
    Rejected(String),
}

fn login_failure(err: &ApiError) -> AuthError {
    let message = match err {
        ApiError::Unauthorized(_) => INVALID_CREDENTIALS,
        ApiError::Forbidden(_) => NOT_VERIFIED,
        _ => GENERIC_FAILURE,
    };
    AuthError::Rejected(message.to_string())
}

fn signup_failure(err: &ApiError) -> AuthError {
    let message = match err {
        ApiError::Conflict(_) => ALREADY_EXISTS,
        ApiError::BadRequest(_) => INVALID_DATA,
        _ => GENERIC_FAILURE,
    };
    AuthError::Rejected(message.to_string())
}

/// Exchange credentials for a token and store it.
///
/// Returns the decoded session; `None` when the server issued a token the
/// client cannot read, which still counts as logged in for requests.
pub async fn login(
    backend: &dyn Backend,
    store: &dyn SessionStore,
    form: &LoginForm,
) -> Result<Option<Session>> {
    form.check().map_err(AuthError::Invalid)?;

    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    let token = match backend.login(&credentials).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Login failed for {}: {}", credentials.email, e);
            return Err(login_failure(&e).into());
        }
    };

    store.set_token(&token)?;
    let session = store.session();
    match &session {
        Some(s) => tracing::info!("Logged in as {}", s.username),
        None => tracing::warn!("Logged in but the token could not be decoded"),
    }
    Ok(session)
}

/// Register a new account. Does not log in: the account still has to be
/// verified by email.
pub async fn signup(backend: &dyn Backend, form: &SignupForm) -> Result<String> {
    form.check().map_err(AuthError::Invalid)?;

    let registration = Registration {
        username: form.username.clone(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    match backend.register(&registration).await {
        Ok(user) => {
            tracing::info!("Registered user {}", user.id);
            Ok(format!("Welcome {}", user.display_name()))
        }
        Err(e) => {
            tracing::warn!("Signup failed for {}: {}", registration.username, e);
            Err(signup_failure(&e).into())
        }
    }
}

pub fn logout(store: &dyn SessionStore) -> Result<()> {
    store.clear()?;
    tracing::info!("Logged out");
    Ok(())
}

/// The current session, if the stored token is present, readable and
/// unexpired.
pub fn whoami(store: &dyn SessionStore) -> Option<Session> {
    store.session()
}
