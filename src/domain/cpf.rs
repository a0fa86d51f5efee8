//! Cpf value object (Brazilian individual taxpayer number).

use super::digits_only;
use super::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of digits in a complete CPF.
pub const CPF_LENGTH: usize = 11;

/// A CPF stored the way the registry stores it: digits only, at most 11.
///
/// Construction only sanitizes; use [`Cpf::is_valid`] to check the
/// verification digits.
///
/// # Example
///
/// ```
/// use customer_registry_mcp::domain::Cpf;
///
/// let cpf = Cpf::new("529.982.247-25").unwrap();
/// assert_eq!(cpf.as_str(), "52998224725");
/// assert!(cpf.is_valid());
/// assert_eq!(cpf.formatted(), "529.982.247-25");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf(String);

impl Cpf {
    /// Sanitize raw input into a CPF.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` if the input has no digits.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let digits: String = digits_only(raw.as_ref()).chars().take(CPF_LENGTH).collect();
        if digits.is_empty() {
            return Err(ValidationError::MissingField("CPF"));
        }
        Ok(Self(digits))
    }

    /// Sanitize and require valid verification digits.
    pub fn parse_valid(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let cpf = Self::new(raw.as_ref())?;
        if !cpf.is_valid() {
            return Err(ValidationError::InvalidCpf(raw.as_ref().to_string()));
        }
        Ok(cpf)
    }

    /// Check length, repeated-digit sequences and both verification digits.
    pub fn is_valid(&self) -> bool {
        let digits: Vec<u32> = self.0.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != CPF_LENGTH {
            return false;
        }
        if digits.iter().all(|d| *d == digits[0]) {
            return false;
        }

        check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
    }

    /// Get the digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Render with the usual `000.000.000-00` punctuation.
    pub fn formatted(&self) -> String {
        format_cpf(&self.0)
    }
}

/// Mod-11 verification digit over `digits` with weights `len+1 ..= 2`.
fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}

/// Progressively format a (possibly partial) CPF for display.
///
/// Non-digits are dropped first, so the function accepts formatted input too.
pub fn format_cpf(input: &str) -> String {
    let d = digits_only(input);
    let n = d.len();
    match n {
        0..=3 => d,
        4..=6 => format!("{}.{}", &d[..3], &d[3..]),
        7..=9 => format!("{}.{}.{}", &d[..3], &d[3..6], &d[6..]),
        _ => format!(
            "{}.{}.{}-{}",
            &d[..3],
            &d[3..6],
            &d[6..9],
            &d[9..n.min(CPF_LENGTH)]
        ),
    }
}

impl Serialize for Cpf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cpf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cpf::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_sanitizes_input() {
        let cpf = Cpf::new(" 529.982.247-25 ").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");

        let cpf = Cpf::new("529982247251234").unwrap();
        assert_eq!(cpf.as_str(), "52998224725");
    }

    #[test]
    fn test_cpf_requires_digits() {
        assert_eq!(Cpf::new("").unwrap_err(), ValidationError::MissingField("CPF"));
        assert!(Cpf::new("abc.def").is_err());
    }

    #[test]
    fn test_cpf_check_digits() {
        assert!(Cpf::new("52998224725").unwrap().is_valid());
        assert!(Cpf::new("12345678909").unwrap().is_valid());
        assert!(!Cpf::new("12345678901").unwrap().is_valid());
        assert!(!Cpf::new("52998224724").unwrap().is_valid());
    }

    #[test]
    fn test_cpf_rejects_repeated_and_short() {
        assert!(!Cpf::new("11111111111").unwrap().is_valid());
        assert!(!Cpf::new("00000000000").unwrap().is_valid());
        assert!(!Cpf::new("5299822472").unwrap().is_valid());
    }

    #[test]
    fn test_parse_valid() {
        assert!(Cpf::parse_valid("529.982.247-25").is_ok());
        assert!(matches!(
            Cpf::parse_valid("123.456.789-01"),
            Err(ValidationError::InvalidCpf(_))
        ));
    }

    #[test]
    fn test_format_cpf_progressive() {
        assert_eq!(format_cpf(""), "");
        assert_eq!(format_cpf("123"), "123");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("1234567"), "123.456.7");
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf("123456789012345"), "123.456.789-01");
        assert_eq!(format_cpf("123.456.789-01"), "123.456.789-01");
    }
}
