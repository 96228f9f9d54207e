//! Text-to-number parsers for scraped price and rating strings.
//!
//! Both functions are total: they never fail, they signal "nothing usable"
//! with a sentinel (`0.0` for prices, `None` for ratings).

use std::sync::LazyLock;

use regex::Regex;

static HTML_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(?:#\d+|#x[0-9a-f]+|[a-z]+);").expect("valid regex"));

static RATING_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid regex"));

/// Longest digit-and-separator run accepted as a price or rating. Anything
/// longer is page noise (SKUs, tracking ids), not an amount.
const MAX_NUMBER_CHARS: usize = 32;

/// Parses a scraped price string into a number.
///
/// Returns `0.0` when no price can be read. Callers must treat `0.0` as
/// "reject this record", never as "free".
///
/// Separator handling:
/// - comma and dot both present: whichever occurs last is the decimal
///   separator (`"1.299,99"` and `"1,299.99"` both give `1299.99`)
/// - comma only: decimal when one or two digits follow the last comma,
///   thousands otherwise (`"12,5"` → `12.5`, `"1,299"` → `1299`)
/// - dot only: parsed as-is; repeated dots are thousands separators
#[must_use]
pub fn normalize_price(raw: &str) -> f64 {
    let without_entities = HTML_ENTITY_RE.replace_all(raw, "");
    let compact: String = without_entities
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let Some(start) = compact.find(|c: char| c.is_ascii_digit()) else {
        return 0.0;
    };
    let tail = &compact[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(tail.len());
    let number = tail[..end].trim_end_matches([',', '.']);
    if number.len() > MAX_NUMBER_CHARS {
        return 0.0;
    }

    canonicalize_separators(number)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Rewrites `number` (digits, commas, dots only) into a `str::parse`-able
/// form with a single `.` decimal point.
fn canonicalize_separators(number: &str) -> String {
    match (number.rfind(','), number.rfind('.')) {
        (Some(comma), Some(dot)) => {
            let (decimal, thousands) = if comma > dot { (',', '.') } else { ('.', ',') };
            number
                .chars()
                .filter(|&c| c != thousands)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (Some(last), None) => single_separator(number, ',', last),
        (None, Some(last)) if number.matches('.').count() > 1 => {
            single_separator(number, '.', last)
        }
        _ => number.to_string(),
    }
}

/// Handles a number that uses only `sep`. The last occurrence is the decimal
/// point when at most two digits follow it; every other occurrence is a
/// thousands separator.
fn single_separator(number: &str, sep: char, last: usize) -> String {
    let fraction_digits = number.len() - last - 1;
    let mut out = String::with_capacity(number.len());
    for (idx, c) in number.char_indices() {
        if c != sep {
            out.push(c);
        } else if idx == last && fraction_digits <= 2 {
            out.push('.');
        }
    }
    out
}

/// Reads a 0–5 rating from free text.
///
/// Takes the first numeric token; values above 5 are assumed to be on a
/// 0–10 scale and halved. Returns `None` when the text has no number or the
/// halved value is still out of range, so an absent rating never turns
/// into a zero.
#[must_use]
pub fn normalize_rating(raw: &str) -> Option<f64> {
    let token = RATING_TOKEN_RE.find(raw)?.as_str();
    if token.len() > MAX_NUMBER_CHARS {
        return None;
    }
    let token = token.replace(',', ".");
    let value = token.parse::<f64>().ok()?;
    let scaled = if value > 5.0 { value / 2.0 } else { value };
    (0.0..=5.0).contains(&scaled).then_some(scaled)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
