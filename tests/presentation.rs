//! Tests for presentation module

use chrono::{FixedOffset, NaiveDate};
use visit_finder::presentation::*;
use visit_finder::{find_visits_in, parse_timeline, MonthKey, VisitConfig, VisitReport};

const SAMPLE: &str = include_str!("fixtures/sample_history.json");

#[test]
fn test_sample_rendered_in_japanese() {
    let segments = parse_timeline(SAMPLE).unwrap();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let report = find_visits_in(&segments, &VisitConfig::default(), &tokyo);

    let text = render_text(&report, DateStyle::Japanese);
    assert_eq!(
        text,
        "2024年12月\n  2024/12/1（日）\n  2024/12/3（火）\n  2024/12/20（金）\n"
    );
}

#[test]
fn test_weekdays() {
    let date = NaiveDate::from_ymd_opt(2014, 10, 17).unwrap();
    assert_eq!(weekday_label(date, DateStyle::Iso), "Fri");
    assert_eq!(weekday_label(date, DateStyle::Japanese), "金");
}

#[test]
fn test_month_labels() {
    assert_eq!(month_label(MonthKey::new(2014, 10), DateStyle::Iso), "2014-10");
    assert_eq!(
        month_label(MonthKey::new(2014, 10), DateStyle::Japanese),
        "2014年10月"
    );
}

#[test]
fn test_no_visits_message() {
    let text = render_text(&VisitReport::NoVisits, DateStyle::Iso);
    assert_eq!(text.trim_end(), no_visits_message(DateStyle::Iso));
}

#[test]
fn test_json_output() {
    let json = render_json(&VisitReport::NoVisits).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["status"], "noVisits");
}
