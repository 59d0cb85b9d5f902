//! Rendering of visit reports.
//!
//! Months are rendered in the order the report gives them; nothing here
//! re-sorts. Weekday names and locale-specific labels only exist at this
//! layer, the core works with plain calendar dates.

use chrono::{Datelike, NaiveDate};

use crate::error::VisitError;
use crate::{MonthKey, VisitReport};

/// Label style for months and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `2025-01`, `2025-01-14 (Tue)`
    #[default]
    Iso,
    /// `2025年1月`, `2025/1/14（火）`
    Japanese,
}

const JA_WEEKDAYS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

/// Heading for a month.
pub fn month_label(month: MonthKey, style: DateStyle) -> String {
    match style {
        DateStyle::Iso => month.to_string(),
        DateStyle::Japanese => format!("{}年{}月", month.year, month.month),
    }
}

/// Short weekday name of a date.
pub fn weekday_label(date: NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Iso => date.format("%a").to_string(),
        DateStyle::Japanese => {
            JA_WEEKDAYS[date.weekday().num_days_from_monday() as usize].to_string()
        }
    }
}

/// A date followed by its weekday.
pub fn date_label(date: NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Iso => format!("{} ({})", date.format("%Y-%m-%d"), weekday_label(date, style)),
        DateStyle::Japanese => format!(
            "{}/{}/{}（{}）",
            date.year(),
            date.month(),
            date.day(),
            weekday_label(date, style)
        ),
    }
}

/// Message shown when a run matched nothing.
pub fn no_visits_message(style: DateStyle) -> &'static str {
    match style {
        DateStyle::Iso => "No visits near the reference point were found in this history.",
        DateStyle::Japanese => "指定された期間内に訪問記録はありませんでした。",
    }
}

/// One user-facing message per failure class.
pub fn failure_message(err: &VisitError, style: DateStyle) -> String {
    let (en, ja) = match err {
        VisitError::MalformedInput { .. } => (
            "The file is not a valid location history export.",
            "ロケーション履歴ファイルの形式が正しくありません。",
        ),
        VisitError::InvalidCoordinateFormat { .. } => (
            "Enter coordinates as 'lat, lng' or '(lat, lng)'.",
            "座標は「緯度, 経度」または「(緯度, 経度)」の形式で入力してください。",
        ),
        VisitError::InvalidReferencePoint { .. } => (
            "Enter a valid latitude and longitude.",
            "有効な緯度と経度を入力してください。",
        ),
        VisitError::InvalidTolerance { .. } => (
            "The search radius must be a non-negative number.",
            "検索範囲には0以上の数値を入力してください。",
        ),
        VisitError::Io { .. } => (
            "The file could not be read.",
            "ファイルを読み込めませんでした。",
        ),
    };
    match style {
        DateStyle::Iso => en.to_string(),
        DateStyle::Japanese => ja.to_string(),
    }
}

/// Render a report as indented plain text.
pub fn render_text(report: &VisitReport, style: DateStyle) -> String {
    if let VisitReport::NoVisits = report {
        return format!("{}\n", no_visits_message(style));
    }

    let mut out = String::new();
    for month in report.months() {
        out.push_str(&format!("{}\n", month_label(month.month, style)));
        for date in &month.dates {
            out.push_str(&format!("  {}\n", date_label(*date, style)));
        }
    }
    out
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &VisitReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonthVisits;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_labels() {
        // 2025-01-14 was a Tuesday
        let d = date(2025, 1, 14);
        assert_eq!(date_label(d, DateStyle::Iso), "2025-01-14 (Tue)");
        assert_eq!(date_label(d, DateStyle::Japanese), "2025/1/14（火）");
        assert_eq!(month_label(MonthKey::of(d), DateStyle::Japanese), "2025年1月");
    }

    #[test]
    fn test_render_keeps_order() {
        let report = VisitReport::Found {
            months: vec![
                MonthVisits {
                    month: MonthKey::new(2025, 1),
                    dates: vec![date(2025, 1, 14)],
                },
                MonthVisits {
                    month: MonthKey::new(2014, 10),
                    dates: vec![date(2014, 10, 17), date(2014, 10, 20)],
                },
            ],
        };
        let text = render_text(&report, DateStyle::Iso);
        assert_eq!(
            text,
            "2025-01\n  2025-01-14 (Tue)\n2014-10\n  2014-10-17 (Fri)\n  2014-10-20 (Mon)\n"
        );
    }

    #[test]
    fn test_render_no_visits() {
        let text = render_text(&VisitReport::NoVisits, DateStyle::Japanese);
        assert!(text.contains("訪問記録はありませんでした"));
    }
}
