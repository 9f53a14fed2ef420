use std::fmt;

use thiserror::Error;

pub const VIN_LENGTH: usize = 17;

/// Letters a VIN never contains because they read like 1, 0 and 9.
const FORBIDDEN_LETTERS: [char; 3] = ['I', 'O', 'Q'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VinError {
    #[error("VIN is required")]
    MissingField,
    #[error("VIN must not be empty")]
    EmptyValue,
    #[error("VIN must be exactly 17 characters")]
    InvalidLength,
    #[error("VIN cannot contain the letters I, O, or Q")]
    IllegalCharacter,
    #[error("VIN may contain only A-Z and 0-9")]
    NonAlphanumeric,
}

/// A trimmed, uppercased VIN that passed every format rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vin(String);

impl Vin {
    pub fn parse(raw: &str) -> Result<Self, VinError> {
        normalize_and_validate(Some(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks run in order and the first failure is returned.
pub fn normalize_and_validate(raw: Option<&str>) -> Result<Vin, VinError> {
    let raw = raw.ok_or(VinError::MissingField)?;
    let candidate = raw.trim().to_uppercase();

    if candidate.is_empty() {
        return Err(VinError::EmptyValue);
    }
    if candidate.chars().count() != VIN_LENGTH {
        return Err(VinError::InvalidLength);
    }
    if candidate.contains(&FORBIDDEN_LETTERS[..]) {
        return Err(VinError::IllegalCharacter);
    }
    if !candidate
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(VinError::NonAlphanumeric);
    }

    Ok(Vin(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let vin = Vin::parse("  1hgcm82633a004352\t").unwrap();
        assert_eq!(vin.as_str(), "1HGCM82633A004352");
    }

    #[test]
    fn reports_each_failure_kind() {
        assert_eq!(normalize_and_validate(None), Err(VinError::MissingField));
        assert_eq!(Vin::parse("   "), Err(VinError::EmptyValue));
        assert_eq!(Vin::parse("1HGCM82633A00435"), Err(VinError::InvalidLength));
        assert_eq!(Vin::parse("1HGCM82633A00435299"), Err(VinError::InvalidLength));
        assert_eq!(Vin::parse("1HGCM8I633A004352"), Err(VinError::IllegalCharacter));
        assert_eq!(Vin::parse("1HGCM82633A00!352"), Err(VinError::NonAlphanumeric));
    }

    #[test]
    fn lowercase_forbidden_letters_are_caught_after_uppercasing() {
        assert_eq!(Vin::parse("1hgcm8o633a004352"), Err(VinError::IllegalCharacter));
        assert_eq!(Vin::parse("1hgcm8q633a004352"), Err(VinError::IllegalCharacter));
    }

    #[test]
    fn length_is_checked_before_characters() {
        // 16 chars with a forbidden letter still reports length first
        assert_eq!(Vin::parse("1HGCM8I633A00435"), Err(VinError::InvalidLength));
        assert_eq!(Vin::parse("!!!"), Err(VinError::InvalidLength));
    }

    #[test]
    fn forbidden_letter_wins_over_symbol() {
        assert_eq!(Vin::parse("1HGCM8I633A00!352"), Err(VinError::IllegalCharacter));
    }

    #[test]
    fn non_ascii_letters_are_rejected() {
        assert_eq!(Vin::parse("1HGCM82633A00É352"), Err(VinError::NonAlphanumeric));
    }

    #[test]
    fn error_messages_name_the_rule() {
        assert!(VinError::InvalidLength.to_string().contains("17 characters"));
        assert!(VinError::IllegalCharacter.to_string().contains("cannot contain"));
        assert!(VinError::NonAlphanumeric.to_string().contains("only A-Z and 0-9"));
    }

    fn arb_valid_vin() -> impl Strategy<Value = String> {
        "[a-hj-npr-zA-HJ-NPR-Z0-9]{17}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_wrong_length_is_rejected(s in "[A-HJ-NPR-Z0-9]{0,40}") {
            prop_assume!(!s.is_empty() && s.len() != VIN_LENGTH);
            prop_assert_eq!(Vin::parse(&s), Err(VinError::InvalidLength));
        }

        #[test]
        fn prop_normalization_is_idempotent(
            s in arb_valid_vin(),
            pad_left in "[ \t]{0,3}",
            pad_right in "[ \t]{0,3}",
        ) {
            let raw = format!("{pad_left}{s}{pad_right}");
            let once = Vin::parse(&raw).unwrap();
            let twice = Vin::parse(once.as_str()).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.as_str(), s.to_uppercase());
        }
    }
}
