//! Input validation for registration and profile updates.

use super::errors::{AuthError, AuthResult};
use super::models::{RegisterRequest, UpdateUserRequest};

/// Longest accepted name or email, in characters
pub const MAX_FIELD_LEN: usize = 100;

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate every field of a registration request
pub fn validate_register(request: &RegisterRequest) -> AuthResult<()> {
    validate_name("firstName", &request.first_name)?;
    if let Some(ref last_name) = request.last_name {
        validate_optional_name("lastName", last_name)?;
    }
    validate_email(&request.email)?;
    validate_password(&request.password)
}

/// Validate the fields present in a profile update
pub fn validate_update(request: &UpdateUserRequest) -> AuthResult<()> {
    if let Some(ref first_name) = request.first_name {
        validate_name("firstName", first_name)?;
    }
    if let Some(Some(ref last_name)) = request.last_name {
        validate_optional_name("lastName", last_name)?;
    }
    if let Some(ref password) = request.password {
        validate_password(password)?;
    }
    Ok(())
}

/// Validate a required name field
pub fn validate_name(field: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{field} must not be empty")));
    }
    validate_optional_name(field, value)
}

fn validate_optional_name(field: &str, value: &str) -> AuthResult<()> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AuthError::Validation(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate email format
///
/// Accepts `local@domain.tld` where the local part and every domain label
/// are non-empty and contain no whitespace.
pub fn validate_email(email: &str) -> AuthResult<()> {
    let invalid = || AuthError::Validation("email must be a valid email address".to_string());

    if email.chars().count() > MAX_FIELD_LEN {
        return Err(AuthError::Validation(format!(
            "email must be at most {MAX_FIELD_LEN} characters"
        )));
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    let valid_label = |label: &&str| {
        label.chars().all(|c| c.is_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    };
    if !labels.iter().all(valid_label) {
        return Err(invalid());
    }

    Ok(())
}

/// Validate password strength
///
/// At least 8 characters with one lowercase letter, one uppercase letter,
/// one digit and one symbol.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if !has_lowercase || !has_uppercase || !has_digit || !has_symbol {
        return Err(AuthError::Validation(
            "password must contain a lowercase letter, an uppercase letter, a number and a symbol"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Test".to_string(),
            last_name: Some("Test".to_string()),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_register(&register("a@b.com", "Str0ng!Pass")).is_ok());
        assert!(validate_register(&register("test@test.com", "StrongPass123!")).is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        for email in [
            "",
            "plain",
            "@b.com",
            "a@",
            "a@b",
            "a@b.",
            "a@.com",
            "a@@b.com",
            "a b@c.com",
            "a@-b.com",
        ] {
            assert!(validate_email(email).is_err(), "{email:?} should be rejected");
        }
    }

    #[test]
    fn test_weak_passwords() {
        for password in ["Sh0rt!", "alllowercase1!", "ALLUPPERCASE1!", "NoDigits!!", "NoSymbol123"] {
            assert!(
                validate_password(password).is_err(),
                "{password:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_name_limits() {
        assert!(validate_name("firstName", "   ").is_err());
        assert!(validate_name("firstName", &"x".repeat(MAX_FIELD_LEN)).is_ok());
        assert!(validate_name("firstName", &"x".repeat(MAX_FIELD_LEN + 1)).is_err());
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        assert!(validate_update(&UpdateUserRequest::default()).is_ok());
        let weak = UpdateUserRequest {
            password: Some("weak".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_update(&weak), Err(AuthError::Validation(_))));

        let cleared = UpdateUserRequest {
            last_name: Some(None),
            ..Default::default()
        };
        assert!(validate_update(&cleared).is_ok());

        let too_long = UpdateUserRequest {
            last_name: Some(Some("x".repeat(MAX_FIELD_LEN + 1))),
            ..Default::default()
        };
        assert!(validate_update(&too_long).is_err());
    }

    proptest! {
        #[test]
        fn prop_short_passwords_rejected(password in ".{0,7}") {
            prop_assert!(validate_password(&password).is_err());
        }

        #[test]
        fn prop_well_formed_emails_accepted(
            local in "[a-z0-9._]{1,20}",
            domain in "[a-z0-9]{1,20}",
            tld in "[a-z]{2,6}",
        ) {
            let email = format!("{local}@{domain}.{tld}");
            prop_assert!(validate_email(&email).is_ok());
        }

        #[test]
        fn prop_strong_passwords_accepted(
            lower in "[a-z]{2,10}",
            upper in "[A-Z]{2,10}",
            digits in "[0-9]{2,10}",
            symbols in "[!@#$%^&*]{2,10}",
        ) {
            let password = format!("{lower}{upper}{digits}{symbols}");
            prop_assert!(validate_password(&password).is_ok());
        }
    }
}
