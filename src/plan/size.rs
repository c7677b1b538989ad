//! Human-readable sizes for sort annotations and row labels.

use regex::Regex;
use std::sync::LazyLock;

// Whole-string match: number, optional fraction, at most one space, unit.
static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(\.\d+)?\s?([A-Za-z]+)$").expect("size pattern is valid")
});

/// Format `"1234kB"` as `"1,234 kB"`.
///
/// The unit is kept verbatim. Anything that is not `<number><unit>` is
/// returned unchanged.
pub fn format_size(size: &str) -> String {
    let Some(caps) = SIZE_RE.captures(size) else {
        return size.to_string();
    };

    let int_part = &caps[1];
    let fraction = caps.get(2).map_or("", |m| m.as_str());
    let unit = &caps[3];

    format!("{}{} {}", group_digits(int_part), fraction, unit)
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    group_digits(&n.to_string())
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
