//! Field-level input validation.
//!
//! Every failure is a [`WardenError::Validation`] attributable to one
//! input field. Uniqueness is not checked here — that belongs to the
//! store (unique indexes) and the controller hooks that pre-check it.

use crate::error::{WardenError, WardenResult};

pub const NAME_MAX: usize = 122;
pub const PASSWORD_MIN: usize = 7;
pub const PASSWORD_MAX: usize = 24;

/// Usernames: 4–122 characters.
pub fn validate_username(username: &str) -> WardenResult<()> {
    if username.len() <= 3 {
        return Err(WardenError::validation(
            "Username must be longer than 3 symbols.",
        ));
    }
    if username.len() > NAME_MAX {
        return Err(WardenError::validation(
            "Username can't be longer than 122 symbols.",
        ));
    }
    Ok(())
}

/// Display names: optional, at most 122 characters. Blank is allowed
/// (the caller substitutes the username).
pub fn validate_display_name(name: &str) -> WardenResult<()> {
    if name.len() > NAME_MAX {
        return Err(WardenError::validation(
            "Name can't be longer than 122 symbols.",
        ));
    }
    Ok(())
}

/// Passwords: 7–24 characters.
pub fn validate_password(password: &str) -> WardenResult<()> {
    if password.len() < PASSWORD_MIN {
        return Err(WardenError::validation(
            "Password must be longer than 6 symbols.",
        ));
    }
    if password.len() > PASSWORD_MAX {
        return Err(WardenError::validation(
            "Password can't be longer than 24 symbols.",
        ));
    }
    Ok(())
}

/// Group names: 4–122 characters.
pub fn validate_group_name(name: &str) -> WardenResult<()> {
    if name.len() <= 3 {
        return Err(WardenError::validation(
            "Group name must be longer than 3 symbols.",
        ));
    }
    if name.len() > NAME_MAX {
        return Err(WardenError::validation(
            "Group name can't be longer than 122 symbols.",
        ));
    }
    Ok(())
}

/// Permission names: 4–122 characters.
pub fn validate_permission_name(name: &str) -> WardenResult<()> {
    if name.len() <= 3 {
        return Err(WardenError::validation(
            "Permission name must be longer than 3 symbols.",
        ));
    }
    if name.len() > NAME_MAX {
        return Err(WardenError::validation(
            "Permission name can't be longer than 122 symbols.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_boundaries() {
        assert!(validate_group_name("abc").is_err());
        assert!(validate_group_name("abcd").is_ok());
        assert!(validate_group_name(&"g".repeat(122)).is_ok());
        assert!(validate_group_name(&"g".repeat(123)).is_err());
    }

    #[test]
    fn username_boundaries() {
        assert!(validate_username("bob").is_err());
        assert!(validate_username("bob1").is_ok());
        assert!(validate_username(&"u".repeat(123)).is_err());
    }

    #[test]
    fn password_boundaries() {
        assert!(validate_password("six666").is_err());
        assert!(validate_password("seven77").is_ok());
        assert!(validate_password(&"p".repeat(24)).is_ok());
        assert!(validate_password(&"p".repeat(25)).is_err());
    }

    #[test]
    fn display_name_allows_blank() {
        assert!(validate_display_name("").is_ok());
        assert!(validate_display_name(&"n".repeat(123)).is_err());
    }

    #[test]
    fn validation_errors_render_their_message() {
        let err = validate_group_name("abc").unwrap_err();
        assert_eq!(err.to_string(), "Group name must be longer than 3 symbols.");
    }
}
