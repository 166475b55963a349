use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const IDENTIFIER_LEN: usize = 11;

/// Normalized 11-digit CPF. Only [`validate`] constructs one, so every value carries
/// correct check digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    digits: [u8; IDENTIFIER_LEN],
}

impl Identifier {
    pub fn digits(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.digits
    }

    pub fn digit_sum(&self) -> u32 {
        self.digits.iter().map(|digit| u32::from(*digit)).sum()
    }

    pub fn last_digit(&self) -> u8 {
        self.digits[IDENTIFIER_LEN - 1]
    }

    /// Bare digits, e.g. `12345678909`.
    pub fn as_string(&self) -> String {
        self.digits.iter().map(|digit| char::from(b'0' + digit)).collect()
    }

    /// Punctuated as `ddd.ddd.ddd-dd`.
    pub fn formatted(&self) -> String {
        let raw = self.as_string();
        format!("{}.{}.{}-{}", &raw[0..3], &raw[3..6], &raw[6..9], &raw[9..11])
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl FromStr for Identifier {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        validate(raw)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

/// Reasons an input fails validation. All of them surface to users as the same message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("identifier must contain exactly 11 digits")]
    WrongLength,
    #[error("identifier digits are all identical")]
    AllDigitsIdentical,
    #[error("first check digit does not match")]
    FirstCheckDigitMismatch,
    #[error("second check digit does not match")]
    SecondCheckDigitMismatch,
}

pub type ValidationResult = Result<Identifier, ValidationError>;

/// Drops every character that is not an ASCII digit.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn validate(raw: &str) -> ValidationResult {
    let normalized = normalize(raw);
    if normalized.len() != IDENTIFIER_LEN {
        return Err(ValidationError::WrongLength);
    }

    let mut digits = [0u8; IDENTIFIER_LEN];
    for (slot, byte) in digits.iter_mut().zip(normalized.bytes()) {
        *slot = byte - b'0';
    }

    if digits.iter().all(|digit| *digit == digits[0]) {
        return Err(ValidationError::AllDigitsIdentical);
    }
    if check_digit(&digits[..9]) != digits[9] {
        return Err(ValidationError::FirstCheckDigitMismatch);
    }
    if check_digit(&digits[..10]) != digits[10] {
        return Err(ValidationError::SecondCheckDigitMismatch);
    }

    Ok(Identifier { digits })
}

// Weights descend from len + 1 down to 2; a remainder of 10 counts as 0.
fn check_digit(prefix: &[u8]) -> u8 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(index, digit)| u32::from(*digit) * (top - index as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        remainder => remainder as u8,
    }
}

/// Progressive mask applied while a CPF is being typed; digits past the eleventh are dropped.
pub fn mask_input(raw: &str) -> String {
    let digits: String = normalize(raw).chars().take(IDENTIFIER_LEN).collect();
    let mut masked = String::with_capacity(IDENTIFIER_LEN + 3);
    for (index, digit) in digits.chars().enumerate() {
        match index {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(digit);
    }
    masked
}

/// Whether the input carries the 11 digits a search needs. Check digits are not examined.
pub fn is_submittable(raw: &str) -> bool {
    normalize(raw).len() == IDENTIFIER_LEN
}

/// Appends both check digits to a nine-digit base.
#[cfg(test)]
pub(crate) fn with_check_digits(base: &str) -> String {
    let mut digits: Vec<u8> = normalize(base).bytes().map(|byte| byte - b'0').collect();
    digits.truncate(9);
    digits.push(check_digit(&digits));
    digits.push(check_digit(&digits));
    digits.iter().map(|digit| char::from(b'0' + digit)).collect()
}
