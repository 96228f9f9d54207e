use super::*;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// -----------------------------------------------------------------------
// normalize_price
// -----------------------------------------------------------------------

#[test]
fn price_european_format() {
    assert_close(normalize_price("€1.299,99"), 1299.99);
}

#[test]
fn price_us_format() {
    assert_close(normalize_price("$1,299.99"), 1299.99);
}

#[test]
fn price_comma_decimal() {
    assert_close(normalize_price("12,5"), 12.5);
    assert_close(normalize_price("12,50 €"), 12.5);
}

#[test]
fn price_comma_thousands() {
    assert_close(normalize_price("1,299"), 1299.0);
    assert_close(normalize_price("€ 12,345"), 12345.0);
}

#[test]
fn price_dot_only() {
    assert_close(normalize_price("19.99"), 19.99);
    assert_close(normalize_price("EUR 499"), 499.0);
}

#[test]
fn price_repeated_separators() {
    assert_close(normalize_price("1.299.000"), 1_299_000.0);
    assert_close(normalize_price("1,299,99"), 1299.99);
}

#[test]
fn price_non_breaking_and_thin_spaces() {
    assert_close(normalize_price("1\u{a0}299,99\u{a0}€"), 1299.99);
    assert_close(normalize_price("1\u{202f}299,00"), 1299.0);
}

#[test]
fn price_html_entities() {
    assert_close(normalize_price("&euro;&nbsp;849,00"), 849.0);
    assert_close(normalize_price("849.00&#160;&#8364;"), 849.0);
}

#[test]
fn price_surrounding_text() {
    assert_close(normalize_price("Now only €549.90!"), 549.9);
    assert_close(normalize_price("Price: 1.049,00 € incl. VAT"), 1049.0);
}

#[test]
fn price_takes_first_amount_of_a_range() {
    assert_close(normalize_price("€12.50 - €15.00"), 12.5);
}

#[test]
fn price_trailing_separator() {
    assert_close(normalize_price("499,-"), 499.0);
    assert_close(normalize_price("499."), 499.0);
}

#[test]
fn price_unparseable_is_zero() {
    assert_close(normalize_price("abc"), 0.0);
    assert_close(normalize_price(""), 0.0);
    assert_close(normalize_price("€"), 0.0);
    assert_close(normalize_price("Call for price"), 0.0);
}

#[test]
fn price_oversized_digit_run_is_zero() {
    let long = "9".repeat(800);
    assert_close(normalize_price(&long), 0.0);
    assert_close(normalize_price(&format!("€{long},00")), 0.0);
    assert_close(normalize_price(&"1".repeat(40)), 0.0);
}

#[test]
fn price_long_but_bounded_amount_parses() {
    assert_close(normalize_price("1.234.567.890,12"), 1_234_567_890.12);
}

#[test]
fn price_is_idempotent_on_normalized_values() {
    for raw in ["€1.299,99", "$1,299.99", "12,5", "0.5", "7"] {
        let once = normalize_price(raw);
        let twice = normalize_price(&once.to_string());
        assert_close(twice, once);
    }
}

// -----------------------------------------------------------------------
// normalize_rating
// -----------------------------------------------------------------------

#[test]
fn rating_ten_point_scale_is_halved() {
    assert_eq!(normalize_rating("9/10"), Some(4.5));
    assert_eq!(normalize_rating("8.4"), Some(4.2));
}

#[test]
fn rating_five_point_scale_passes_through() {
    assert_eq!(normalize_rating("4.2 stars"), Some(4.2));
    assert_eq!(normalize_rating("Rated 5 out of 5"), Some(5.0));
    assert_eq!(normalize_rating("0"), Some(0.0));
}

#[test]
fn rating_comma_decimal() {
    assert_eq!(normalize_rating("4,5"), Some(4.5));
}

#[test]
fn rating_absent_without_number() {
    assert_eq!(normalize_rating("no rating"), None);
    assert_eq!(normalize_rating(""), None);
}

#[test]
fn rating_out_of_range_after_halving_is_absent() {
    assert_eq!(normalize_rating("87 reviews"), None);
}

#[test]
fn rating_oversized_digit_run_is_absent() {
    assert_eq!(normalize_rating(&"4".repeat(800)), None);
}

#[test]
fn rating_is_idempotent_on_normalized_values() {
    for raw in ["9/10", "4.2 stars", "3"] {
        let once = normalize_rating(raw).unwrap();
        assert_eq!(normalize_rating(&once.to_string()), Some(once));
    }
}
