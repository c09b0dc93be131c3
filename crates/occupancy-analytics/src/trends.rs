//! 入院趋势：历史月度入院数与未来每日在院预测

use chrono::NaiveDate;
use occupancy_core::utils::{add_days, months_before, year_month};
use occupancy_core::Patient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::cmp::max;

use crate::lookup::{FacilityLookup, HospitalFilter};
use crate::window::TimeWindow;

/// 月度入院数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

/// 某日预计在院人数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: usize,
}

/// 历史入院月度统计
///
/// 患者有效区间 `[入院日, 出院日或预测结束日]` 与 `[now - window, now]` 相交时计入，
/// 按入院年月分桶，按时间升序返回；没有入院的月份不输出。
pub fn historical_admissions(
    patients: &[Patient],
    lookup: &FacilityLookup,
    filter: &HospitalFilter,
    window: TimeWindow,
    now: NaiveDate,
) -> Vec<MonthlyCount> {
    let start = months_before(now, window.months());
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();

    for patient in patients.iter().filter(|p| filter.matches(lookup, p)) {
        let (Some(admitted), Some(end)) = (patient.vdate, patient.effective_end()) else {
            continue;
        };
        if end >= start && admitted <= now {
            *buckets.entry(year_month(admitted)).or_default() += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

/// 未来每日在院人数预测
///
/// 对每位在院患者，从 `max(入院日, today)` 到 `入院日 + 预测住院天数` 的每一天计数加一，
/// 结果按日期升序，不会出现早于 `today` 的日期。
///
/// 复杂度为 O(患者数 × 住院天数)，只适合小规模数据；患者量大或预测住院期很长时不应直接调用。
pub fn predicted_admissions(
    patients: &[Patient],
    lookup: &FacilityLookup,
    filter: &HospitalFilter,
    today: NaiveDate,
) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for patient in patients
        .iter()
        .filter(|p| p.is_ongoing() && filter.matches(lookup, p))
    {
        let (Some(admitted), Some(end)) = (patient.vdate, patient.projected_end()) else {
            continue;
        };
        let mut day = max(admitted, today);
        while day <= end {
            *days.entry(day).or_default() += 1;
            let next = add_days(day, 1);
            if next == day {
                break;
            }
            day = next;
        }
    }

    days.into_iter()
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}
