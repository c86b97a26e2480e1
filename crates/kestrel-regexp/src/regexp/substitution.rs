//! `$`-template expansion (GetSubstitution)
//!
//! Tokens: `$$`, `$&`, `` $` ``, `$'`, `$n` and `$nn`. A two-digit reference
//! is taken only when it names an existing capture; otherwise the single
//! digit is used. References to capture 0 or past the last capture are not
//! substitutions: the `$` is emitted and scanning resumes at the digit.

use crate::string::{JsString, StringBuilder};

const DOLLAR: u16 = b'$' as u16;
const AMPERSAND: u16 = b'&' as u16;
const BACKTICK: u16 = b'`' as u16;
const APOSTROPHE: u16 = b'\'' as u16;

fn digit(unit: u16) -> Option<usize> {
    (u16::from(b'0')..=u16::from(b'9'))
        .contains(&unit)
        .then(|| usize::from(unit - u16::from(b'0')))
}

/// Expand `template` for one match.
///
/// `captures` holds groups 1..=n; `None` is a group that did not
/// participate and expands to nothing.
pub fn get_substitution(
    matched: &JsString,
    source: &JsString,
    position: usize,
    captures: &[Option<JsString>],
    template: &JsString,
) -> JsString {
    let units = template.as_utf16();
    let capture_count = captures.len();
    let tail_pos = (position + matched.len()).min(source.len());
    let mut out = StringBuilder::with_capacity(units.len());
    let mut i = 0;

    while i < units.len() {
        let unit = units[i];
        if unit != DOLLAR || i + 1 >= units.len() {
            out.push_unit(unit);
            i += 1;
            continue;
        }
        let next = units[i + 1];
        match next {
            DOLLAR => {
                out.push_unit(DOLLAR);
                i += 2;
            }
            AMPERSAND => {
                out.push_str(matched);
                i += 2;
            }
            BACKTICK => {
                out.push_range(source, 0, position);
                i += 2;
            }
            APOSTROPHE => {
                out.push_range(source, tail_pos, source.len());
                i += 2;
            }
            _ => {
                let Some(first) = digit(next) else {
                    out.push_unit(DOLLAR);
                    i += 1;
                    continue;
                };
                let two_digit = units
                    .get(i + 2)
                    .copied()
                    .and_then(digit)
                    .map(|second| first * 10 + second)
                    .filter(|&n| n <= capture_count);
                let (index, consumed) = match two_digit {
                    Some(n) => (n, 3),
                    None => (first, 2),
                };
                if index == 0 || index > capture_count {
                    out.push_unit(DOLLAR);
                    i += 1;
                    continue;
                }
                if let Some(capture) = &captures[index - 1] {
                    out.push_str(capture);
                }
                i += consumed;
            }
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str, captures: &[Option<&str>]) -> String {
        let captures: Vec<Option<JsString>> = captures
            .iter()
            .map(|c| c.map(JsString::from))
            .collect();
        get_substitution(
            &JsString::from("AB"),
            &JsString::from("xABy"),
            1,
            &captures,
            &JsString::from(template),
        )
        .to_string()
    }

    #[test]
    fn test_numbered_captures() {
        assert_eq!(expand("[$1-$2]", &[Some("A"), Some("B")]), "[A-B]");
    }

    #[test]
    fn test_out_of_range_reference_is_literal() {
        assert_eq!(expand("$9", &[Some("A"), Some("B")]), "$9");
        assert_eq!(expand("$0", &[Some("A")]), "$0");
    }

    #[test]
    fn test_two_digit_fallback() {
        // $12 with two captures is $1 followed by "2"
        assert_eq!(expand("$12", &[Some("A"), Some("B")]), "A2");
        assert_eq!(expand("$01", &[Some("A")]), "A");
        assert_eq!(expand("$00", &[Some("A")]), "$00");
    }

    #[test]
    fn test_special_tokens() {
        assert_eq!(expand("$$", &[]), "$");
        assert_eq!(expand("<$&>", &[]), "<AB>");
        assert_eq!(expand("$`", &[]), "x");
        assert_eq!(expand("$'", &[]), "y");
    }

    #[test]
    fn test_trailing_and_unknown_dollar() {
        assert_eq!(expand("a$", &[]), "a$");
        assert_eq!(expand("$x", &[]), "$x");
        assert_eq!(expand("$<n>", &[Some("A")]), "$<n>");
    }

    #[test]
    fn test_undefined_capture_is_empty() {
        assert_eq!(expand("[$1]", &[None]), "[]");
    }
}
