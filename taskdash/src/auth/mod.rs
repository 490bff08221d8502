//! Signing in.
//!
//! Login and signup input is checked locally before any request is made;
//! the messages are the ones shown under the login form. A successful
//! login yields a [`Session`], which [`session::SessionStore`] can persist.

pub mod session;

pub use session::{SessionError, SessionStore};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskdash_proto::{AuthResponse, LoginRequest, SignupRequest, User};

use crate::api::ApiError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Shown when the store rejects credentials without a usable message.
pub const LOGIN_FAILED: &str = "Invalid email or password";

/// Login form validation failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// A required field is blank.
    #[error("Please fill in all fields")]
    MissingFields,
    /// The email has no `@`.
    #[error("Please enter a valid email")]
    InvalidEmail,
    /// The password is shorter than [`MIN_PASSWORD_LEN`].
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

fn check_email_and_password(email: &str, password: &str) -> Result<(), CredentialError> {
    if email.is_empty() || password.is_empty() {
        return Err(CredentialError::MissingFields);
    }
    if !email.contains('@') {
        return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

/// Validates login input, in form order.
///
/// # Errors
///
/// Returns the first [`CredentialError`] that applies.
pub fn validate_login(email: &str, password: &str) -> Result<LoginRequest, CredentialError> {
    let email = email.trim();
    check_email_and_password(email, password)?;
    Ok(LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Validates signup input. The name is required as well.
///
/// # Errors
///
/// Returns the first [`CredentialError`] that applies.
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
) -> Result<SignupRequest, CredentialError> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(CredentialError::MissingFields);
    }
    check_email_and_password(email, password)?;
    Ok(SignupRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

/// Message for a failed login or signup request.
#[must_use]
pub fn failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Auth(_) => LOGIN_FAILED.to_string(),
        ApiError::Validation(detail) if !detail.is_empty() => detail.clone(),
        ApiError::Validation(_) => LOGIN_FAILED.to_string(),
        other => other.user_message(),
    }
}

/// The signed-in user and their bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// The user the token belongs to.
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}
