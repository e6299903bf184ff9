use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "This field is required"));
    }
    Ok(())
}

/// National ID: exactly 10 digits.
pub static IDENTIFICATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Mobile numbers start with 09 followed by 8 digits.
pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^09\d{8}$").unwrap());

pub static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(invalid("required", "Card number is required"));
    }
    if digits.len() < 16 {
        return Err(invalid("card_length", "Card number must have 16 digits"));
    }
    if !all_digits(&digits) {
        return Err(invalid("card_digits", "Card number must contain only digits"));
    }
    Ok(())
}

pub fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "CVV is required"));
    }
    if !(3..=4).contains(&value.len()) || !all_digits(value) {
        return Err(invalid("cvv_format", "CVV must have 3 or 4 digits"));
    }
    Ok(())
}

pub fn validate_cardholder(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    if value.trim().chars().count() < 2 {
        return Err(invalid("cardholder_length", "Cardholder name is too short"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identification_pattern() {
        assert!(IDENTIFICATION_RE.is_match("1712345678"));
        assert!(!IDENTIFICATION_RE.is_match("171234567"));
        assert!(!IDENTIFICATION_RE.is_match("17123456a8"));
        assert!(!IDENTIFICATION_RE.is_match("17123456789"));
    }

    #[test]
    fn phone_pattern() {
        assert!(PHONE_RE.is_match("0991234567"));
        assert!(!PHONE_RE.is_match("0891234567"));
        assert!(!PHONE_RE.is_match("099123456"));
        assert!(!PHONE_RE.is_match("09912345678"));
    }

    #[test]
    fn email_pattern() {
        assert!(EMAIL_RE.is_match("ana@example.com"));
        assert!(!EMAIL_RE.is_match("ana@example"));
        assert!(!EMAIL_RE.is_match("ana @example.com"));
        assert!(!EMAIL_RE.is_match("@example.com"));
        assert!(!EMAIL_RE.is_match("ana@.com"));
        assert!(!EMAIL_RE.is_match("ana@ex@ample.com"));
    }

    #[test]
    fn blank_is_required() {
        assert!(required("   ").is_err());
        assert!(required("x").is_ok());
    }

    #[test]
    fn card_rules() {
        assert!(validate_card_number("4111 1111 1111 1111").is_ok());
        assert!(validate_card_number("4111 1111 1111").is_err());
        assert!(validate_card_number("4111-1111-1111-1111").is_err());
        assert!(validate_cvv("123").is_ok());
        assert!(validate_cvv("1234").is_ok());
        assert!(validate_cvv("12").is_err());
        assert!(validate_cardholder(" A ").is_err());
        assert!(validate_cardholder("Ana Pérez").is_ok());
    }
}
