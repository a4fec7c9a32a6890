//! Field validators for the registration form.
//!
//! Each validator covers both presence and format so a field reports at most
//! one error.

use validator::ValidationError;

// Word and digit classes are ASCII-only.
lazy_static::lazy_static! {
    static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"(?i-u)^[\w.\-]+@[\w\-]+\.[a-z]{2,}$").unwrap();
    static ref PHONE_REGEX: regex::Regex =
        regex::Regex::new(r"(?-u)^[+\d][\d\s()\-]{6,}$").unwrap();
}

/// Study years accepted on the form.
pub const VALID_YEARS: [&str; 4] = ["1", "2", "3", "4"];

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Returns true if the value looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Validates a required email address.
pub fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("email_required", "Email is required."));
    }
    if !is_valid_email(value) {
        return Err(error("email_format", "Enter a valid email."));
    }
    Ok(())
}

/// Validates a required WhatsApp phone number.
pub fn validate_whatsapp(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("whatsapp_required", "Whatsapp number is required."));
    }
    if !PHONE_REGEX.is_match(value) {
        return Err(error("whatsapp_format", "Enter a valid phone number."));
    }
    Ok(())
}

/// Validates a required participant name.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("name_required", "Name is required."));
    }
    Ok(())
}

/// Validates a required faculty name.
pub fn validate_faculty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("faculty_required", "Faculty is required."));
    }
    Ok(())
}

/// Validates the study year ("1" to "4").
pub fn validate_year(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("year_required", "Year is required."));
    }
    if !VALID_YEARS.contains(&value) {
        return Err(error("year_range", "Select a year between 1 and 4."));
    }
    Ok(())
}
