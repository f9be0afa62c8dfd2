//! Tokenizing `netstats`/`advnetstats` dumps.
//!
//! Telemetry arrives as whitespace separated words. Words of the form
//! `key:value` carry data; everything else (units like `K` or `ms`, line
//! noise, the echoed command) is dropped.
//!
//! ```text
//! call:0 tar:16 K rar:16 K tvr:48 K rvr:48 K
//! tapl:0 rapl:0 taj:3 ms raj:3 ms tvpl:0 rvpl:0
//! ```

use log::debug;

/// Value the device prints for a field with no data.
pub const PLACEHOLDER: &str = "---";

/// A `key:value` word from a telemetry dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Split a raw dump into tokens, in order of appearance.
///
/// Each word is split on its first `:`; words with an empty key or value
/// are discarded.
pub fn tokenize(raw: &str) -> Vec<RawToken<'_>> {
    raw.split_ascii_whitespace()
        .filter_map(|word| word.split_once(':'))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| RawToken { key, value })
        .collect()
}

fn numeric_only(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

fn parse_int(value: &str) -> Option<i32> {
    if let Ok(v) = value.parse::<i32>() {
        return Some(v);
    }
    let v = value.parse::<f32>().ok().filter(|v| v.is_finite())?;
    let rounded = (v + 0.5).floor();
    if rounded < i32::MIN as f32 || rounded > i32::MAX as f32 {
        return None;
    }
    Some(rounded as i32)
}

fn parse_float(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Coerce a telemetry value to an integer.
///
/// Tries a direct integer parse, then a rounded float parse, then the same
/// again after stripping everything but digits and `.`.
pub fn to_int(value: &str) -> Option<i32> {
    if value.is_empty() {
        return None;
    }
    let result = parse_int(value).or_else(|| parse_int(&numeric_only(value)));
    if result.is_none() {
        debug!("unable to convert '{}' to an integer", value);
    }
    result
}

/// Coerce a telemetry value to a float, with the same stripping fallback.
pub fn to_float(value: &str) -> Option<f32> {
    if value.is_empty() {
        return None;
    }
    let result = parse_float(value).or_else(|| parse_float(&numeric_only(value)));
    if result.is_none() {
        debug!("unable to convert '{}' to a float", value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_units() {
        let tokens = tokenize("tar:16 K rar:16 K");
        assert_eq!(
            tokens,
            vec![
                RawToken { key: "tar", value: "16" },
                RawToken { key: "rar", value: "16" },
            ]
        );
    }

    #[test]
    fn test_tokenize_splits_on_first_colon() {
        let tokens = tokenize("rsid:sip:user@host");
        assert_eq!(tokens, vec![RawToken { key: "rsid", value: "sip:user@host" }]);
    }

    #[test]
    fn test_tokenize_discards_empty_sides() {
        assert!(tokenize("ccaps: :foo call").is_empty());
        assert_eq!(tokenize("%pktloss:0.0 %").len(), 1);
    }

    #[test]
    fn test_tokenize_multiline() {
        let tokens = tokenize("netstats\r\r\ncall:0 txrate:64 K\r\r\ntvp:H.264 tvf:640x368\r\r\n");
        let keys: Vec<&str> = tokens.iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["call", "txrate", "tvp", "tvf"]);
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int("16"), Some(16));
        assert_eq!(to_int("-5"), Some(-5));
        assert_eq!(to_int("2.5"), Some(3));
        assert_eq!(to_int("abc123"), Some(123));
        assert_eq!(to_int("3ms"), Some(3));
        assert_eq!(to_int(""), None);
        assert_eq!(to_int("---"), None);
        assert_eq!(to_int("1.2.3"), None);
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float("0.1"), Some(0.1));
        assert_eq!(to_float("29"), Some(29.0));
        assert_eq!(to_float("12.5%"), Some(12.5));
        assert_eq!(to_float(""), None);
        assert_eq!(to_float("---"), None);
        assert_eq!(to_float("inf"), None);
    }
}
