use branch_forecast::utils::{days_between, parse_date, parse_event_date, round_value, ParsedDate};
use chrono::NaiveDate;
use rstest::rstest;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[rstest]
#[case("2024-03-01", day(2024, 3, 1))]
#[case("  2024-03-01  ", day(2024, 3, 1))]
#[case("2024-03-01T23:59:59", day(2024, 3, 1))]
#[case("2024-03-01 08:15:00", day(2024, 3, 1))]
#[case("2024-03-01T08:15:00.250", day(2024, 3, 1))]
#[case("2024-03-01T10:00", day(2024, 3, 1))]
#[case("2024-03-01 10:00", day(2024, 3, 1))]
#[case("2024-03-01T23:30:00+05:00", day(2024, 3, 1))]
#[case("Aug 16", day(2023, 8, 16))]
#[case("August 16", day(2023, 8, 16))]
fn test_parse_date_accepted_forms(#[case] input: &str, #[case] expected: NaiveDate) {
    assert_eq!(parse_date(input, 2023), ParsedDate::Parsed(expected));
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("yesterday")]
#[case("2024-13-01")]
#[case("16/08/2024")]
fn test_parse_date_rejects(#[case] input: &str) {
    let parsed = parse_date(input, 2023);
    assert_eq!(parsed, ParsedDate::Unparsable);
    assert!(!parsed.is_parsed());
    assert_eq!(parsed.date(), None);
}

#[test]
fn test_parse_event_date_uses_leading_token() {
    assert_eq!(
        parse_event_date("2025-08-16 10:00", 2025).date(),
        Some(day(2025, 8, 16))
    );
    // The first token of "Aug 16" is not a date on its own
    assert_eq!(parse_event_date("Aug 16", 2025).date(), Some(day(2025, 8, 16)));
    assert_eq!(parse_event_date("soon", 2025), ParsedDate::Unparsable);
}

#[rstest]
#[case(11.428571, 11.43)]
#[case(10.0, 10.0)]
#[case(0.004, 0.0)]
#[case(-2.675_1, -2.68)]
fn test_round_value(#[case] input: f64, #[case] expected: f64) {
    assert_eq!(round_value(input), expected);
}

#[test]
fn test_days_between() {
    assert_eq!(days_between(day(2024, 2, 28), day(2024, 3, 1)), 2);
    assert_eq!(days_between(day(2024, 3, 1), day(2024, 2, 28)), -2);
    assert_eq!(days_between(day(2024, 3, 1), day(2024, 3, 1)), 0);
}
