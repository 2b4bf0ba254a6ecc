/// Input validators for account fields
/// Features:
/// 1. Required-field checks (blank after trimming counts as missing)
/// 2. Length limits
/// 3. Email format validation
/// 4. Rejection of control characters and null bytes

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_USERNAME_LENGTH: usize = 64;
const MAX_FULL_NAME_LENGTH: usize = 256;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt only reads the first 72 bytes

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Returns the trimmed value, or `EmptyField` when it is absent or blank
pub fn require_field(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

/// Like `require_field`, but keeps the value untouched apart from the blank check.
/// Passwords may legitimately start or end with whitespace.
pub fn require_password(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value {
        Some(password) if !password.trim().is_empty() => {
            if password.len() > MAX_PASSWORD_LENGTH {
                return Err(ValidationError::TooLong(field.to_string(), MAX_PASSWORD_LENGTH));
            }
            Ok(password.to_string())
        }
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

/// Validates an email address and returns it trimmed and lower-cased
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a username and returns it trimmed and lower-cased
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

/// Validates a display name
pub fn is_valid_full_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("fullName".to_string()));
    }

    if trimmed.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::TooLong("fullName".to_string(), MAX_FULL_NAME_LENGTH));
    }

    // null bytes and control characters
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("fullName".to_string()));
    }

    Ok(trimmed.to_string())
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    // Overlong local part
    if let Some(at_pos) = email.find('@') {
        let local_part = &email[..at_pos];
        if local_part.len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_trims() {
        assert_eq!(require_field("username", Some("  alice ")).unwrap(), "alice");
    }

    #[test]
    fn test_require_field_rejects_blank_and_missing() {
        assert!(matches!(
            require_field("username", Some("   ")),
            Err(ValidationError::EmptyField(_))
        ));
        assert!(matches!(
            require_field("username", None),
            Err(ValidationError::EmptyField(_))
        ));
    }

    #[test]
    fn test_require_password_keeps_whitespace() {
        assert_eq!(require_password("password", Some(" p1 ")).unwrap(), " p1 ");
        assert!(require_password("password", Some("   ")).is_err());
        assert!(require_password("password", None).is_err());
    }

    #[test]
    fn test_require_password_length_limit() {
        let too_long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            require_password("password", Some(&too_long)),
            Err(ValidationError::TooLong(_, _))
        ));
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email(" Alice@X.com ").unwrap(), "alice@x.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@b").is_err());
    }

    #[test]
    fn test_username_is_lowercased() {
        assert_eq!(is_valid_username("Alice").unwrap(), "alice");
    }

    #[test]
    fn test_username_rejects_whitespace() {
        assert!(is_valid_username("al ice").is_err());
        assert!(is_valid_username("").is_err());
        assert!(is_valid_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_valid_full_name() {
        assert!(is_valid_full_name("John Doe").is_ok());
        assert!(is_valid_full_name("Jean-Pierre").is_ok());
        assert!(is_valid_full_name("O'Brien").is_ok());
    }

    #[test]
    fn test_full_name_control_characters() {
        assert!(is_valid_full_name("Name\0with\0null").is_err());
        assert!(is_valid_full_name(&"a".repeat(257)).is_err());
    }
}
