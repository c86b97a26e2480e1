//! AdvanceStringIndex

use crate::string::JsString;

/// Next index after `index`, stepping over a whole surrogate pair when
/// `unicode` is set.
pub fn advance_string_index(input: &JsString, index: usize, unicode: bool) -> usize {
    if !unicode || index.saturating_add(1) >= input.len() {
        return index.saturating_add(1);
    }
    let Some(first) = input.code_unit_at(index) else {
        return index + 1;
    };
    if !(0xD800..=0xDBFF).contains(&first) {
        return index + 1;
    }
    match input.code_unit_at(index + 1) {
        Some(second) if (0xDC00..=0xDFFF).contains(&second) => index + 2,
        _ => index + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_pair() {
        let s = JsString::from("\u{1F600}");
        assert_eq!(advance_string_index(&s, 0, true), 2);
        assert_eq!(advance_string_index(&s, 0, false), 1);
    }

    #[test]
    fn test_last_unit_and_past_end() {
        let s = JsString::from("a\u{1F600}");
        assert_eq!(advance_string_index(&s, 2, true), 3);
        assert_eq!(advance_string_index(&s, 3, true), 4);
        assert_eq!(advance_string_index(&s, 10, true), 11);
    }

    #[test]
    fn test_saturates_at_usize_max() {
        let s = JsString::from("a");
        assert_eq!(advance_string_index(&s, usize::MAX, false), usize::MAX);
        assert_eq!(advance_string_index(&s, usize::MAX, true), usize::MAX);
    }

    #[test]
    fn test_lone_surrogates() {
        let lone_high = JsString::from_utf16(vec![0xD83D, 0x0061]);
        assert_eq!(advance_string_index(&lone_high, 0, true), 1);
        let low_first = JsString::from_utf16(vec![0xDE00, 0xD83D]);
        assert_eq!(advance_string_index(&low_first, 0, true), 1);
    }
}
