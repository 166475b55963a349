use super::identifier::Identifier;

/// Roughly one identifier in three carries a prize: those whose last digit is divisible by 3.
pub fn has_prize(identifier: &Identifier) -> bool {
    identifier.last_digit() % 3 == 0
}
