//! Field validators.
//!
//! Each validator takes the raw text of one input and either returns the
//! parsed, canonical value or a `ValidationError` carrying the message shown
//! under the field. Validators are pure; numeric fields are parsed here and
//! nowhere earlier, and a malformed number is always an error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::profile::model::{ActivityLevel, CUISINES, Gender, Goal};

pub const AGE_RANGE: (u32, u32) = (18, 60);
pub const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 120.0);
pub const HEIGHT_RANGE_CM: (f64, f64) = (152.4, 187.96);
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type Validated<T> = Result<T, ValidationError>;

/// Non-empty after trimming.
pub fn required<'a>(label: &str, raw: &'a str) -> Validated<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ValidationError::new(format!("{label} is required")))
    } else {
        Ok(trimmed)
    }
}

pub fn age(raw: &str) -> Validated<u32> {
    let value = required("Age", raw)?
        .parse::<u32>()
        .map_err(|_| ValidationError::new("Age must be a whole number"))?;
    age_value(value)
}

/// Range check for an age that is already a number.
pub fn age_value(value: u32) -> Validated<u32> {
    let (min, max) = AGE_RANGE;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::new(format!(
            "Age must be between {min} and {max}"
        )));
    }
    Ok(value)
}

pub fn weight_kg(raw: &str) -> Validated<f64> {
    weight_kg_value(number("Weight", raw)?)
}

pub fn weight_kg_value(value: f64) -> Validated<f64> {
    let (min, max) = WEIGHT_RANGE_KG;
    in_range("Weight", value, min, max, "kg")
}

pub fn height_cm(raw: &str) -> Validated<f64> {
    height_cm_value(number("Height", raw)?)
}

pub fn height_cm_value(value: f64) -> Validated<f64> {
    let (min, max) = HEIGHT_RANGE_CM;
    in_range("Height", value, min, max, "cm")
}

fn number(label: &str, raw: &str) -> Validated<f64> {
    required(label, raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::new(format!("{label} must be a number")))
}

// NaN fails both comparisons, so it is rejected explicitly.
fn in_range(label: &str, value: f64, min: f64, max: f64, unit: &str) -> Validated<f64> {
    if !value.is_finite() {
        return Err(ValidationError::new(format!("{label} must be a number")));
    }
    if value < min || value > max {
        return Err(ValidationError::new(format!(
            "{label} must be between {min} and {max} {unit}"
        )));
    }
    Ok(value)
}

/// One of a fixed option set, matched case-insensitively; returns the
/// canonical spelling.
pub fn one_of(label: &str, raw: &str, options: &[&'static str]) -> Validated<&'static str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("Please select a {}", label.to_lowercase())));
    }
    options
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(value))
        .copied()
        .ok_or_else(|| {
            ValidationError::new(format!("{label} must be one of: {}", options.join(", ")))
        })
}

pub fn gender(raw: &str) -> Validated<Gender> {
    let label = one_of("Gender", raw, Gender::LABELS)?;
    Gender::from_label(label).ok_or_else(|| ValidationError::new("Unknown gender"))
}

pub fn activity(raw: &str) -> Validated<ActivityLevel> {
    let label = one_of("Activity level", raw, ActivityLevel::LABELS)?;
    ActivityLevel::from_label(label).ok_or_else(|| ValidationError::new("Unknown activity level"))
}

pub fn cuisine(raw: &str) -> Validated<&'static str> {
    one_of("Cuisine", raw, CUISINES)
}

pub fn goal(raw: &str) -> Validated<Goal> {
    let label = one_of("Goal", raw, Goal::LABELS)?;
    Goal::from_label(label).ok_or_else(|| ValidationError::new("Unknown goal"))
}

/// Free-text restriction entry. Empty is fine. Several words without a comma
/// are rejected, and every comma-separated segment must be non-empty.
pub fn custom_restrictions(raw: &str) -> Validated<Vec<String>> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if !text.contains(',') && text.split_whitespace().count() > 1 {
        return Err(ValidationError::new(
            "Please separate multiple ingredients with commas",
        ));
    }
    let parts: Vec<String> = text.split(',').map(|s| s.trim().to_string()).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ValidationError::new("Ingredient names cannot be empty"));
    }
    Ok(parts)
}

pub fn email(raw: &str) -> Validated<String> {
    let value = required("Email", raw)?;
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::new("Please enter a valid email address"));
    }
    Ok(value.to_string())
}

/// Sign-in password: present and long enough.
pub fn login_password(raw: &str) -> Validated<&str> {
    if raw.is_empty() {
        return Err(ValidationError::new("Password is required"));
    }
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(raw)
}

/// New password: sign-in rules plus an uppercase letter and a digit.
pub fn new_password(raw: &str) -> Validated<&str> {
    let value = login_password(raw)?;
    if !value.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::new(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("Password must contain at least one number"));
    }
    Ok(value)
}

pub fn confirm_password(password: &str, confirmation: &str) -> Validated<()> {
    if confirmation.is_empty() {
        return Err(ValidationError::new("Please confirm your password"));
    }
    if password != confirmation {
        return Err(ValidationError::new("Passwords do not match"));
    }
    Ok(())
}

/// Strip everything but digits and cap the length, as applied while typing.
pub fn sanitize_otp(raw: &str, length: usize) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(length).collect()
}

pub fn otp(raw: &str, length: usize) -> Validated<String> {
    let code = sanitize_otp(raw, length);
    if code.is_empty() {
        return Err(ValidationError::new("Verification code is required"));
    }
    if code.len() != length {
        return Err(ValidationError::new(format!(
            "Enter the {length}-digit verification code"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_boundaries() {
        assert!(age("17").is_err());
        assert_eq!(age("18").unwrap(), 18);
        assert_eq!(age("60").unwrap(), 60);
        assert!(age("61").is_err());
        assert_eq!(age(" 25 ").unwrap(), 25);
    }

    #[test]
    fn age_rejects_non_integers_instead_of_zero() {
        assert_eq!(age("").unwrap_err().message, "Age is required");
        assert_eq!(age("abc").unwrap_err().message, "Age must be a whole number");
        assert!(age("25.5").is_err());
        assert!(age("-20").is_err());
    }

    #[test]
    fn weight_boundaries() {
        assert!(weight_kg("29.9").is_err());
        assert_eq!(weight_kg("30").unwrap(), 30.0);
        assert_eq!(weight_kg("120").unwrap(), 120.0);
        assert!(weight_kg("120.1").is_err());
        assert!(weight_kg("heavy").is_err());
        assert!(weight_kg("NaN").is_err());
    }

    #[test]
    fn height_boundaries() {
        assert!(height_cm("152.3").is_err());
        assert_eq!(height_cm("152.4").unwrap(), 152.4);
        assert_eq!(height_cm("187.96").unwrap(), 187.96);
        assert!(height_cm("188").is_err());
    }

    #[test]
    fn typed_values_share_the_text_ranges() {
        assert!(age_value(5).is_err());
        assert_eq!(age_value(18).unwrap(), 18);
        assert!(weight_kg_value(-3.0).is_err());
        assert!(weight_kg_value(f64::INFINITY).is_err());
        assert_eq!(weight_kg_value(120.0).unwrap(), 120.0);
        assert_eq!(
            height_cm_value(f64::NAN).unwrap_err().message,
            "Height must be a number"
        );
        assert!(height_cm_value(152.4).is_ok());
    }

    #[test]
    fn choices_accept_only_enumerated_values() {
        assert_eq!(gender("male").unwrap(), Gender::Male);
        assert!(gender("other").is_err());
        assert_eq!(activity("Moderate").unwrap(), ActivityLevel::Moderate);
        assert!(activity("extreme").is_err());
        assert_eq!(cuisine("italian").unwrap(), "Italian");
        assert!(cuisine("Martian").is_err());
        assert_eq!(goal("fat loss").unwrap(), Goal::FatLoss);
        assert_eq!(
            goal("").unwrap_err().message,
            "Please select a goal"
        );
    }

    #[test]
    fn custom_ingredient_comma_rule() {
        assert_eq!(
            custom_restrictions("Sugar Nuts").unwrap_err().message,
            "Please separate multiple ingredients with commas"
        );
        assert_eq!(
            custom_restrictions("Sugar, Nuts").unwrap(),
            vec!["Sugar".to_string(), "Nuts".to_string()]
        );
        assert_eq!(custom_restrictions("Sugar").unwrap(), vec!["Sugar".to_string()]);
        assert!(custom_restrictions("   ").unwrap().is_empty());
        assert!(custom_restrictions("Sugar,").is_err());
        assert!(custom_restrictions("Sugar,,Nuts").is_err());
    }

    #[test]
    fn email_shape() {
        assert_eq!(email(" a@b.com ").unwrap(), "a@b.com");
        assert_eq!(email("").unwrap_err().message, "Email is required");
        assert!(email("a@b").is_err());
        assert!(email("a b@c.com").is_err());
        assert!(email("@b.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert_eq!(new_password("").unwrap_err().message, "Password is required");
        assert!(new_password("Ab1").is_err());
        assert!(new_password("abcdef1").is_err());
        assert!(new_password("Abcdefg").is_err());
        assert!(new_password("Abcdef1").is_ok());
        assert!(login_password("abcdef").is_ok());
    }

    #[test]
    fn confirmation_must_match_exactly() {
        assert!(confirm_password("Abcdef1", "Abcdef1").is_ok());
        assert_eq!(
            confirm_password("Abcdef1", "abcdef1").unwrap_err().message,
            "Passwords do not match"
        );
        assert!(confirm_password("Abcdef1", "").is_err());
    }

    #[test]
    fn otp_is_sanitized_then_length_checked() {
        assert_eq!(sanitize_otp("12-34 5a6", 6), "123456");
        assert_eq!(sanitize_otp("1234567", 6), "123456");
        assert_eq!(otp("12 34 56", 6).unwrap(), "123456");
        assert!(otp("12345", 6).is_err());
        assert_eq!(otp("abc", 6).unwrap_err().message, "Verification code is required");
    }
}
