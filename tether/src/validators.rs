use std::sync::LazyLock;

use email_address::EmailAddress;
use regex::Regex;
use url::Url;

use crate::errors::ValidationIssue;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.]{3,30}$").expect("username pattern compiles"));

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_POST_BODY_CHARS: usize = 5000;
pub const MAX_COMMENT_BODY_CHARS: usize = 1000;
pub const MAX_BIO_CHARS: usize = 1000;

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Usernames are 3-30 chars of ASCII letters, digits, `_` or `.`.
pub fn is_valid_username(value: &str) -> bool {
    USERNAME_PATTERN.is_match(value)
}

/// Accepts either an absolute URL or a server-relative `/uploads/...` reference.
pub fn is_valid_media_reference(value: &str) -> bool {
    (value.starts_with("/uploads/") && !value.contains("..")) || is_valid_url(value)
}

/// Pushes an issue when `value` is blank after trimming.
pub fn require_text(issues: &mut Vec<ValidationIssue>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::new(field, "required", format!("{field} must not be empty")));
    }
}

/// Pushes an issue when `value` exceeds `max` characters.
pub fn limit_chars(issues: &mut Vec<ValidationIssue>, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        issues.push(ValidationIssue::new(
            field,
            "too_long",
            format!("{field} must be at most {max} characters"),
        ));
    }
}
