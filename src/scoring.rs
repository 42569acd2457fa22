//! Final score calculation.
//!
//! Takes the raw score list read off a sheet, keeps the usable values,
//! averages the highest N of them and rounds half away from zero.
//! Arithmetic is done in `Decimal` so a mean of exactly 88.5 stays 88.5
//! until the final rounding step.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

/// Default number of highest scores averaged per student.
pub const DEFAULT_TOP_N: usize = 12;

/// Raw scores split into values that count and tokens that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSelection {
    /// Usable numeric values, in input order
    pub accepted: Vec<Decimal>,
    /// Tokens that are neither numbers nor plain digit strings
    pub discarded: Vec<Value>,
}

/// Code points of digit zero for each run of ten decimal digits (Unicode Nd).
const DIGIT_ZEROS: [u32; 67] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950,
];

/// Value of a decimal digit in any script, e.g. `'7'`, `'７'` or `'٧'`.
pub fn decimal_digit_value(c: char) -> Option<u32> {
    let code = c as u32;
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .map(|zero| code - zero)
}

/// Rewrites decimal digits of any script as ASCII digits; other chars are kept.
///
/// Full-width `"９０"` becomes `"90"`.
pub fn to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match decimal_digit_value(c) {
            Some(d) => char::from(b'0' + d as u8),
            None => c,
        })
        .collect()
}

/// Returns true for non-empty strings made only of decimal digits.
///
/// Digits of any script count (full-width `"９０"` included). Signs, decimal
/// points and surrounding whitespace are not accepted.
pub fn is_digit_string(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| decimal_digit_value(c).is_some())
}

/// Converts one raw token to a decimal score, if it is usable.
fn token_value(token: &Value) -> Option<Decimal> {
    match token {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                // Shortest round-trip text keeps 87.5 as 87.5 instead of the binary expansion
                Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        Value::String(s) if is_digit_string(s) => Decimal::from_str(&to_ascii_digits(s)).ok(),
        _ => None,
    }
}

/// Splits raw tokens into accepted values and discarded tokens.
pub fn select_scores(scores: &[Value]) -> ScoreSelection {
    let mut selection = ScoreSelection::default();
    for token in scores {
        match token_value(token) {
            Some(value) => selection.accepted.push(value),
            None => selection.discarded.push(token.clone()),
        }
    }
    selection
}

/// Averages the `top_n` highest values and rounds half away from zero.
///
/// Returns 0 when `values` is empty. A `top_n` of 0 is treated as 1.
pub fn average_top(values: &[Decimal], top_n: usize) -> i64 {
    if values.is_empty() {
        return 0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    let take = top_n.max(1).min(sorted.len());
    let top = &sorted[..take];
    let count = Decimal::from(take);

    let mut sum = Decimal::ZERO;
    for value in top {
        match sum.checked_add(*value) {
            Some(next) => sum = next,
            // Far outside i64 once the sum leaves Decimal's range
            None if value.is_sign_negative() => return i64::MIN,
            None => return i64::MAX,
        }
    }
    let mean = sum / count;

    let rounded = mean.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Computes a student's final score from the raw score list.
///
/// Unusable tokens are dropped with a log line; they never count toward the
/// mean. Never fails: empty or fully unusable input yields 0.
pub fn compute_final_score(scores: &[Value], top_n: usize) -> i64 {
    let selection = select_scores(scores);
    for token in &selection.discarded {
        crate::log(&format!("Ignoring unusable score token: {}", token));
    }
    average_top(&selection.accepted, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scores(value: Value) -> Vec<Value> {
        value.as_array().cloned().unwrap()
    }

    #[test]
    fn test_empty_scores_yield_zero() {
        for n in [1, 2, 12, 100] {
            assert_eq!(compute_final_score(&[], n), 0);
        }
    }

    #[test]
    fn test_mixed_tokens_top_two() {
        let raw = scores(json!([90, 85, "70", "abc", null]));
        assert_eq!(compute_final_score(&raw, 2), 88);
    }

    #[test]
    fn test_full_width_digit_strings_count() {
        let raw = scores(json!(["９０", 80]));
        assert_eq!(compute_final_score(&raw, 12), 85);
        assert_eq!(to_ascii_digits("９０"), "90");
        assert_eq!(decimal_digit_value('３'), Some(3));
        assert_eq!(decimal_digit_value('a'), None);
    }

    #[test]
    fn test_booleans_discarded() {
        let raw = scores(json!([true, false, 80]));
        assert_eq!(compute_final_score(&raw, 12), 80);
        assert_eq!(select_scores(&raw).discarded, vec![json!(true), json!(false)]);
    }

    #[test]
    fn test_fewer_than_top_n_uses_all() {
        let raw = scores(json!([88, 89]));
        assert_eq!(compute_final_score(&raw, 12), 89);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        // 88.5 -> 89, 86.5 -> 87 (banker's rounding would give 88 and 86)
        assert_eq!(compute_final_score(&scores(json!([88, 89])), 2), 89);
        assert_eq!(compute_final_score(&scores(json!([86, 87])), 2), 87);
        assert_eq!(compute_final_score(&scores(json!([0, 1])), 2), 1);
        assert_eq!(compute_final_score(&scores(json!([99.5])), 1), 100);
    }

    #[test]
    fn test_below_half_rounds_down() {
        // (90 + 85 + 85) / 3 = 86.666.. -> 87, (90 + 80 + 80) / 3 = 83.333.. -> 83
        assert_eq!(compute_final_score(&scores(json!([90, 85, 85])), 3), 87);
        assert_eq!(compute_final_score(&scores(json!([90, 80, 80])), 3), 83);
    }

    #[test]
    fn test_only_unusable_tokens_yield_zero() {
        let raw = scores(json!(["abc", null, "", "-5", "87.5", " 90", true, {"a": 1}]));
        assert_eq!(compute_final_score(&raw, 12), 0);
    }

    #[test]
    fn test_permutation_invariance() {
        let a = scores(json!([70, "95", 60, 88.5, "x", 100, 77]));
        let mut b = a.clone();
        b.reverse();
        let mut c = a.clone();
        c.rotate_left(3);
        for n in 1..=8 {
            let expected = compute_final_score(&a, n);
            assert_eq!(compute_final_score(&b, n), expected);
            assert_eq!(compute_final_score(&c, n), expected);
        }
    }

    #[test]
    fn test_unusable_tokens_do_not_affect_count() {
        // If "abc" or null counted, the mean would drop below 90
        let clean = scores(json!([90, 90]));
        let noisy = scores(json!([90, "abc", null, 90, "N/A"]));
        assert_eq!(compute_final_score(&clean, 12), 90);
        assert_eq!(compute_final_score(&noisy, 12), 90);
    }

    #[test]
    fn test_top_n_picks_highest() {
        let raw = scores(json!([50, 100, 60, 90, 70, 80]));
        // (100 + 90 + 80) / 3 = 90
        assert_eq!(compute_final_score(&raw, 3), 90);
    }

    #[test]
    fn test_default_top_n_with_many_scores() {
        // 14 scores, the two lowest (10, 20) fall outside the top 12
        let raw = scores(json!([
            10, 20, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 80
        ]));
        assert_eq!(compute_final_score(&raw, DEFAULT_TOP_N), 80);
    }

    #[test]
    fn test_zero_top_n_treated_as_one() {
        let raw = scores(json!([60, 95]));
        assert_eq!(compute_final_score(&raw, 0), 95);
    }

    #[test]
    fn test_no_clamping() {
        assert_eq!(compute_final_score(&scores(json!([150, 130])), 2), 140);
        assert_eq!(compute_final_score(&scores(json!([-10, -20])), 2), -15);
    }

    #[test]
    fn test_negative_half_rounds_away_from_zero() {
        assert_eq!(compute_final_score(&scores(json!([-88, -89])), 2), -89);
    }

    #[test]
    fn test_digit_strings() {
        assert!(is_digit_string("90"));
        assert!(is_digit_string("007"));
        assert!(!is_digit_string(""));
        assert!(!is_digit_string("87.5"));
        assert!(!is_digit_string("-5"));
        assert!(!is_digit_string("+5"));
        assert!(!is_digit_string(" 90"));
        assert!(!is_digit_string("九十"));
        assert!(is_digit_string("９０"));
        assert!(is_digit_string("٧٥"));
        assert!(!is_digit_string("²"));
    }

    #[test]
    fn test_select_scores_partitions() {
        let raw = scores(json!([90, "85", "abc", null, 77.25]));
        let selection = select_scores(&raw);
        assert_eq!(
            selection.accepted,
            vec![
                Decimal::from(90),
                Decimal::from(85),
                Decimal::from_str("77.25").unwrap()
            ]
        );
        assert_eq!(selection.discarded, vec![json!("abc"), json!(null)]);
    }

    #[test]
    fn test_float_kept_exact() {
        let selection = select_scores(&scores(json!([87.5])));
        assert_eq!(selection.accepted, vec![Decimal::from_str("87.5").unwrap()]);
    }

    #[test]
    fn test_oversized_digit_string_discarded() {
        let huge = "9".repeat(40);
        let raw = vec![json!(huge), json!(80)];
        assert_eq!(compute_final_score(&raw, 12), 80);
    }

    #[test]
    fn test_average_top_empty() {
        assert_eq!(average_top(&[], 12), 0);
    }

    #[test]
    fn test_average_top_overflowing_sum() {
        let big = Decimal::MAX;
        assert_eq!(average_top(&[big, big], 2), i64::MAX);
    }
}
