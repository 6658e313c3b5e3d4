use std::fmt;
use std::str::FromStr;

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// A contact phone number, normalized to an optional `+` followed by digits.
///
/// Separators (spaces, dashes, parentheses) are stripped before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl FromStr for PhoneNumber {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err("Phone number cannot be empty".into());
        }

        let international = value.starts_with('+');
        let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
        let stripped: String = value
            .chars()
            .skip(usize::from(international))
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect();

        if stripped != digits {
            return Err("Phone number contains invalid characters".into());
        }
        if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
            return Err("Phone number must contain 7 to 15 digits".into());
        }

        let normalized = if international {
            format!("+{}", digits)
        } else {
            digits
        };
        Ok(Self(normalized))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
