use validator::Validate;

#[derive(Validate)]
struct EmailAddress {
    #[validate(email)]
    value: String,
}

/// Canonical form used for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EmailAddress {
        value: email.to_string(),
    }
    .validate()
    .is_ok()
}
