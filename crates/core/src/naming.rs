//! Validation rules for the names that end up inside storage paths and job ids.
//!
//! Backend names may not contain `-`, which is what lets a job id be parsed
//! back into its fields even when the username contains dashes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum length of a backend name.
pub const MAX_BACKEND_NAME_LEN: usize = 50;

/// Maximum length of a username.
pub const MAX_USERNAME_LEN: usize = 150;

static BACKEND_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("valid regex"));

/// Validate a backend name.
///
/// Rules:
/// - 1 to `MAX_BACKEND_NAME_LEN` characters.
/// - ASCII letters, digits and underscore only.
pub fn validate_backend_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_BACKEND_NAME_LEN {
        return Err(CoreError::Invalid(format!(
            "Backend name must be 1-{MAX_BACKEND_NAME_LEN} characters"
        )));
    }
    if !BACKEND_NAME_RE.is_match(name) {
        return Err(CoreError::Invalid(format!(
            "Backend name '{name}' may only contain letters, digits and '_'"
        )));
    }
    Ok(())
}

/// Validate a username.
///
/// Rules:
/// - 1 to `MAX_USERNAME_LEN` characters.
/// - ASCII letters, digits and `_ . @ + -`; never `/`.
/// - Not made of dots only (`.` and `..` are not path segments).
pub fn validate_username(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.len() > MAX_USERNAME_LEN {
        return Err(CoreError::Invalid(format!(
            "Username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !USERNAME_RE.is_match(name) {
        return Err(CoreError::Invalid(format!(
            "Username '{name}' contains characters that cannot be stored"
        )));
    }
    if name.bytes().all(|b| b == b'.') {
        return Err(CoreError::Invalid(format!(
            "Username '{name}' cannot consist of dots only"
        )));
    }
    Ok(())
}
