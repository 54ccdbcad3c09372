use super::{ServiceError, ServiceResult};

/// Trimmed, non-empty text no longer than `max` characters
pub fn required_text(field: &'static str, value: &str, max: usize) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(field, "This field is required"));
    }
    if trimmed.chars().count() > max {
        return Err(ServiceError::validation(field, format!("Must be at most {} characters", max)));
    }
    Ok(trimmed.to_string())
}

/// Like `required_text`, but empty input becomes `None`
pub fn optional_text(field: &'static str, value: Option<&str>, max: usize) -> ServiceResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Lower-cased e-mail address with a plausible `local@domain.tld` shape
pub fn email(value: &str) -> ServiceResult<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };

    if !valid || email.len() > 254 {
        return Err(ServiceError::validation("email", "Must be a valid e-mail address"));
    }
    Ok(email)
}

pub fn password(field: &'static str, value: &str, min_length: usize) -> ServiceResult<()> {
    if value.chars().count() < min_length {
        return Err(ServiceError::validation(
            field,
            format!("Must be at least {} characters", min_length),
        ));
    }
    if value.len() > 256 {
        return Err(ServiceError::validation(field, "Must be at most 256 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(required_text("name", "  Sales  ", 10).unwrap(), "Sales");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text("phone", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("phone", None, 10).unwrap(), None);
        assert_eq!(optional_text("phone", Some(" 555 "), 10).unwrap(), Some("555".to_string()));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(email(" Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "ada@.com", "a b@example.com", "a@b@c.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn password_length_is_enforced() {
        assert!(password("password", "short", 6).is_err());
        assert!(password("password", "long enough", 6).is_ok());
    }
}
