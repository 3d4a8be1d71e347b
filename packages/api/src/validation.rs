//! Form checks that run before any store call. The messages are the ones shown
//! under the sign-up, login and settings forms.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AuthError;
use crate::models::Registration;

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whether `email` looks like a deliverable address.
pub fn is_valid_email(email: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^[A-Za-z0-9+._%\-]{1,256}@[A-Za-z0-9][A-Za-z0-9\-]{0,64}(\.[A-Za-z0-9][A-Za-z0-9\-]{0,25})+$",
        )
        .expect("valid regex")
    });
    RE.is_match(email.trim())
}

/// Check a sign-up form. The first failing rule wins.
pub fn validate_registration(form: &Registration, min_password_length: usize) -> Result<(), AuthError> {
    if form.name.trim().is_empty() {
        return Err(AuthError::validation("Please enter your full name"));
    }
    if form.username.trim().is_empty() {
        return Err(AuthError::validation("Please enter a username"));
    }
    if form.email.trim().is_empty() {
        return Err(AuthError::validation("Please enter your email"));
    }
    if !is_valid_email(&form.email) {
        return Err(AuthError::validation("Please enter a valid email address"));
    }
    validate_new_password(&form.password, min_password_length)?;
    if form.password != form.confirm_password {
        return Err(AuthError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Check a login form.
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::validation("Please enter your email"));
    }
    if password.is_empty() {
        return Err(AuthError::validation("Please enter your password"));
    }
    if !is_valid_email(email) {
        return Err(AuthError::validation("Please enter a valid email address"));
    }
    Ok(())
}

pub fn validate_new_password(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.trim().is_empty() {
        return Err(AuthError::validation("Please enter a password"));
    }
    if password.chars().count() < min_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(())
}
