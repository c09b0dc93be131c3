//! 住院天数分布直方图

use chrono::NaiveDate;
use occupancy_core::utils::days_between;
use occupancy_core::Patient;
use serde::{Deserialize, Serialize};

use crate::lookup::{FacilityLookup, HospitalFilter};
use crate::window::TimeWindow;

/// 直方图固定箱宽（天）
pub const BIN_WIDTH: i64 = 5;

/// 分箱参数：`[min - 1, max + 1]`，宽度固定为 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBins {
    pub start: i64,
    pub end: i64,
    pub size: i64,
}

/// 单个箱的计数，区间为 `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LosHistogram {
    /// 原始住院天数，供前端直方图组件自行分箱
    pub values: Vec<i64>,
    pub bins: Option<HistogramBins>,
    pub counts: Vec<HistogramBin>,
}

/// 已出院患者的实际住院天数分布
///
/// 只统计入院日期距 `today` 不超过窗口天数的患者，缺失住院天数的记录跳过。
pub fn length_of_stay_histogram(
    patients: &[Patient],
    lookup: &FacilityLookup,
    filter: &HospitalFilter,
    window: TimeWindow,
    today: NaiveDate,
) -> LosHistogram {
    let values: Vec<i64> = patients
        .iter()
        .filter(|p| !p.is_ongoing() && filter.matches(lookup, p))
        .filter(|p| {
            p.vdate
                .map_or(false, |admitted| days_between(admitted, today) <= window.days())
        })
        .filter_map(|p| p.lengthofstay)
        .collect();

    let (Some(min), Some(max)) = (values.iter().min().copied(), values.iter().max().copied()) else {
        return LosHistogram::default();
    };

    let bins = HistogramBins {
        start: min - 1,
        end: max + 1,
        size: BIN_WIDTH,
    };

    let mut counts = Vec::new();
    let mut lower = bins.start;
    while lower <= bins.end {
        let upper = lower + bins.size;
        let count = values.iter().filter(|v| **v >= lower && **v < upper).count();
        counts.push(HistogramBin { lower, upper, count });
        lower = upper;
    }

    LosHistogram {
        values,
        bins: Some(bins),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, facility, patient};

    fn discharged(eid: i64, facid: i64, admitted: &str, stay: i64) -> Patient {
        let mut p = patient(eid, facid, admitted, Some("2024-06-01"), 3);
        p.lengthofstay = Some(stay);
        p
    }

    #[test]
    fn test_bins_span_min_to_max() {
        let lookup = FacilityLookup::new(&[facility(1, "Hospital A", 10, 50000)]);
        let patients = vec![
            discharged(1, 1, "2024-05-01", 2),
            discharged(2, 1, "2024-05-02", 4),
            discharged(3, 1, "2024-05-03", 11),
            patient(4, 1, "2024-05-03", None, 8),
        ];

        let hist = length_of_stay_histogram(&patients, &lookup, &HospitalFilter::all(), TimeWindow::ThreeMonths, date("2024-06-10"));
        assert_eq!(hist.values, vec![2, 4, 11]);
        assert_eq!(hist.bins, Some(HistogramBins { start: 1, end: 12, size: 5 }));
        let counts: Vec<usize> = hist.counts.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(hist.counts.iter().map(|b| b.count).sum::<usize>(), hist.values.len());
    }

    #[test]
    fn test_window_excludes_old_admissions() {
        let lookup = FacilityLookup::new(&[facility(1, "Hospital A", 10, 50000)]);
        let patients = vec![
            discharged(1, 1, "2024-01-01", 3),
            discharged(2, 1, "2024-05-20", 6),
        ];

        let recent = length_of_stay_histogram(&patients, &lookup, &HospitalFilter::all(), TimeWindow::ThreeMonths, date("2024-06-10"));
        assert_eq!(recent.values, vec![6]);

        let year = length_of_stay_histogram(&patients, &lookup, &HospitalFilter::all(), TimeWindow::OneYear, date("2024-06-10"));
        assert_eq!(year.values, vec![3, 6]);
    }

    #[test]
    fn test_empty_input_has_no_bins() {
        let lookup = FacilityLookup::default();
        let hist = length_of_stay_histogram(&[], &lookup, &HospitalFilter::all(), TimeWindow::SixMonths, date("2024-06-10"));
        assert!(hist.bins.is_none());
        assert!(hist.counts.is_empty());
    }
}
