//! PhoneNumber value object.

use super::digits_only;
use super::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Maximum number of digits kept: two for the area code plus nine.
pub const PHONE_MAX_DIGITS: usize = 11;

/// A Brazilian phone number stored as digits only.
///
/// # Example
///
/// ```
/// use customer_registry_mcp::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("(11) 9 8765-4321").unwrap();
/// assert_eq!(phone.as_str(), "11987654321");
/// assert_eq!(phone.formatted(), "(11) 9 8765-4321");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber from formatted or raw input.
    ///
    /// # Validation Rules
    ///
    /// - Only digits, spaces, hyphens, parentheses, plus sign and periods
    /// - At least 10 digits (area code + 8-digit landline)
    /// - Digits beyond the eleventh are dropped
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPhone` if the phone format is invalid.
    pub fn new(phone: impl Into<String>) -> Result<Self, ValidationError> {
        let phone = phone.into();

        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+' | '.'));
        let digits: String = digits_only(&phone).chars().take(PHONE_MAX_DIGITS).collect();

        if !allowed || digits.len() < 10 {
            return Err(ValidationError::InvalidPhone(phone));
        }

        Ok(Self(digits))
    }

    /// Get the digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Render as `(AA) N NNNN-NNNN`.
    pub fn formatted(&self) -> String {
        format_phone(&self.0)
    }
}

/// Progressively format a (possibly partial) phone number for display.
///
/// Grouping is area code, one digit, four digits, four digits; input past
/// eleven digits is ignored.
pub fn format_phone(input: &str) -> String {
    let digits: String = digits_only(input).chars().take(PHONE_MAX_DIGITS).collect();
    let n = digits.len();
    if n == 0 {
        return String::new();
    }

    let mut formatted = format!("({}", &digits[..n.min(2)]);
    if n > 2 {
        formatted.push_str(&format!(") {}", &digits[2..3]));
    }
    if n > 3 {
        formatted.push_str(&format!(" {}", &digits[3..n.min(7)]));
    }
    if n > 7 {
        formatted.push_str(&format!("-{}", &digits[7..]));
    }
    formatted
}

impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PhoneNumber::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validates_format() {
        assert!(PhoneNumber::new("").is_err());
        assert!(PhoneNumber::new("no digits").is_err());
        assert!(PhoneNumber::new("1234-5678").is_err());
        assert!(PhoneNumber::new("invalid@phone").is_err());
        assert!(PhoneNumber::new("(11) 3456-7890").is_ok());
        assert!(PhoneNumber::new("11987654321").is_ok());
    }

    #[test]
    fn test_phone_keeps_eleven_digits() {
        let phone = PhoneNumber::new("+55 (11) 98765-4321").unwrap();
        assert_eq!(phone.as_str(), "55119876543");
    }

    #[test]
    fn test_format_phone_progressive() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("1"), "(1");
        assert_eq!(format_phone("11"), "(11");
        assert_eq!(format_phone("119"), "(11) 9");
        assert_eq!(format_phone("11987"), "(11) 9 87");
        assert_eq!(format_phone("1198765"), "(11) 9 8765");
        assert_eq!(format_phone("11987654"), "(11) 9 8765-4");
        assert_eq!(format_phone("11987654321"), "(11) 9 8765-4321");
        assert_eq!(format_phone("1198765432199"), "(11) 9 8765-4321");
    }

    #[test]
    fn test_phone_serialization() {
        let phone = PhoneNumber::new("(11) 9 8765-4321").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"11987654321\"");
        let back: PhoneNumber = serde_json::from_str("\"11987654321\"").unwrap();
        assert_eq!(back, phone);
    }
}
