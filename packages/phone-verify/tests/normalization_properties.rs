use phone_verify::phone::{is_complete_phone_number, mask, normalize_phone_number};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn normalized_phone_is_digits_at_most_ten(raw in ".{0,40}") {
        let normalized = normalize_phone_number(&raw);
        prop_assert!(normalized.len() <= 10);
        prop_assert!(normalized.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn normalization_is_idempotent(raw in "[0-9 ()+\\-]{0,24}") {
        let once = normalize_phone_number(&raw);
        prop_assert_eq!(normalize_phone_number(&once), once);
    }

    #[test]
    fn ten_leading_digits_survive_formatting(digits in "[0-9]{10}", noise in "[ ()\\-]{0,6}") {
        let raw = format!("{noise}{}{noise}{}", &digits[..5], &digits[5..]);
        let normalized = normalize_phone_number(&raw);
        prop_assert!(is_complete_phone_number(&normalized));
        prop_assert_eq!(normalized, digits);
    }

    #[test]
    fn mask_keeps_length_and_last_four(digits in "[0-9]{10}") {
        let masked = mask(&digits);
        prop_assert_eq!(masked.len(), 10);
        prop_assert_eq!(&masked[6..], &digits[6..]);
    }
}
