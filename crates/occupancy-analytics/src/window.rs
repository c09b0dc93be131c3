//! 统计时间窗口

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use occupancy_core::OccupancyError;

/// 看板可选的回溯窗口
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl TimeWindow {
    /// 月度趋势使用的日历月数
    pub fn months(&self) -> u32 {
        match self {
            TimeWindow::ThreeMonths => 3,
            TimeWindow::SixMonths => 6,
            TimeWindow::OneYear => 12,
        }
    }

    /// 直方图使用的天数
    pub fn days(&self) -> i64 {
        match self {
            TimeWindow::ThreeMonths => 90,
            TimeWindow::SixMonths => 180,
            TimeWindow::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::ThreeMonths => "Last 3 Months",
            TimeWindow::SixMonths => "Last 6 Months",
            TimeWindow::OneYear => "Last 1 Year",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3m" => Ok(TimeWindow::ThreeMonths),
            "6m" => Ok(TimeWindow::SixMonths),
            "1y" => Ok(TimeWindow::OneYear),
            other => Err(OccupancyError::Validation(format!(
                "unknown time window: {other} (expected 3m, 6m or 1y)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_lengths() {
        assert_eq!("6m".parse::<TimeWindow>().unwrap().months(), 6);
        assert_eq!(TimeWindow::OneYear.days(), 365);
        assert!("2w".parse::<TimeWindow>().is_err());
    }
}
