//! 通用日期工具函数

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime};

/// 解析后端返回的日期，兼容纯日期与带时间的时间戳
pub fn parse_wire_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|ts| ts.date())
}

/// 日期加减天数，越界时保持原值
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// 向前回退若干个月，月末自动对齐（如 5月31日 回退 3 个月为 2月最后一天）
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

/// 两个日期之间相差的天数
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `YYYY-MM` 形式的月份键
pub fn year_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_wire_date() {
        assert_eq!(parse_wire_date("2024-05-01"), Some(d(2024, 5, 1)));
        assert_eq!(parse_wire_date("2024-05-01T23:10:00+08:00"), Some(d(2024, 5, 1)));
        assert_eq!(parse_wire_date("2024-05-01T08:00:00.123"), Some(d(2024, 5, 1)));
        assert_eq!(parse_wire_date("yesterday"), None);
    }

    #[test]
    fn test_months_before_clamps_month_end() {
        assert_eq!(months_before(d(2024, 5, 31), 3), d(2024, 2, 29));
        assert_eq!(months_before(d(2024, 1, 15), 12), d(2023, 1, 15));
    }

    #[test]
    fn test_year_month_and_days() {
        assert_eq!(year_month(d(2024, 3, 9)), "2024-03");
        assert_eq!(days_between(d(2024, 3, 1), d(2024, 3, 11)), 10);
        assert_eq!(add_days(d(2024, 2, 28), 2), d(2024, 3, 1));
    }
}
