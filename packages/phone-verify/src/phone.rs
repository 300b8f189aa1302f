//! Phone number and code helpers.

pub const PHONE_DIGITS: usize = 10;
pub const CODE_DIGITS: usize = 6;

/// Keep only ASCII digits, truncated to [`PHONE_DIGITS`].
pub fn normalize_phone_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect()
}

pub fn is_complete_phone_number(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

/// `+<country><phone>`, the form the provider expects.
pub fn qualify(country_code: &str, phone: &str) -> String {
    format!("+{}{}", country_code.trim_start_matches('+'), phone)
}

/// Masked form for logs: only the last 4 digits survive.
pub fn mask(phone: &str) -> String {
    let visible = phone.len().saturating_sub(4);
    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_formatting_and_truncates() {
        assert_eq!(normalize_phone_number("(987) 654-3210"), "9876543210");
        assert_eq!(normalize_phone_number("98765 43210 99"), "9876543210");
        assert_eq!(normalize_phone_number("abc"), "");
    }

    #[test]
    fn ignores_non_ascii_digits() {
        // Devanagari digits are numeric but not ASCII
        assert_eq!(normalize_phone_number("९८७12"), "12");
    }

    #[test]
    fn completeness_requires_ten_digits() {
        assert!(is_complete_phone_number("9876543210"));
        assert!(!is_complete_phone_number("987654321"));
    }

    #[test]
    fn code_must_be_six_ascii_digits() {
        assert!(is_valid_code("123456"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("12a456"));
    }

    #[test]
    fn qualifies_with_country_code() {
        assert_eq!(qualify("91", "9876543210"), "+919876543210");
        assert_eq!(qualify("+91", "9876543210"), "+919876543210");
    }

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask("9876543210"), "******3210");
        assert_eq!(mask("12"), "12");
    }
}
