//! 机构占用率与床位使用统计

use chrono::NaiveDate;
use occupancy_core::{Facility, OccupancyError, Patient, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lookup::HospitalFilter;

/// 占用率分级，对应页面上的样式类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyClass {
    #[serde(rename = "occupancy-low")]
    Low,
    #[serde(rename = "occupancy-medium")]
    Medium,
    #[serde(rename = "occupancy-high")]
    High,
}

impl OccupancyClass {
    pub fn from_rate(rate: f64) -> Self {
        if rate < 50.0 {
            OccupancyClass::Low
        } else if rate < 80.0 {
            OccupancyClass::Medium
        } else {
            OccupancyClass::High
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            OccupancyClass::Low => "occupancy-low",
            OccupancyClass::Medium => "occupancy-medium",
            OccupancyClass::High => "occupancy-high",
        }
    }
}

/// 在 `as_of` 当天处于预测住院区间内的在院患者数
pub fn occupied_beds(facility: &Facility, patients: &[Patient], as_of: NaiveDate) -> usize {
    patients
        .iter()
        .filter(|p| p.facid == Some(facility.facid) && p.is_ongoing())
        .filter(|p| match (p.vdate, p.projected_end()) {
            (Some(admitted), Some(end)) => admitted <= as_of && as_of <= end,
            _ => false,
        })
        .count()
}

/// 计算机构在指定日期的占用率（百分比，保留两位小数，封顶 100）
///
/// 区间 `[入院日, 入院日 + 预测住院天数]` 两端均包含。容量为 0 时返回
/// `InvalidCapacity`，由调用方决定如何展示。
pub fn occupancy_rate(facility: &Facility, patients: &[Patient], as_of: NaiveDate) -> Result<f64> {
    if facility.capacity <= 0 {
        warn!("Facility {} has no bed capacity", facility.name);
        return Err(OccupancyError::InvalidCapacity {
            facility: facility.name.clone(),
        });
    }

    let count = occupied_beds(facility, patients, as_of);
    let rate = (100.0 * count as f64 / facility.capacity as f64).min(100.0);
    Ok(round2(rate))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 单个机构的容量与已占用床位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityUsage {
    pub hospital: String,
    pub capacity: i64,
    pub occupied: usize,
    pub over_capacity: bool,
}

/// 床位使用对比：未出院或出院日期晚于 `today` 的患者均计为占用
pub fn capacity_utilisation(
    facilities: &[Facility],
    patients: &[Patient],
    filter: &HospitalFilter,
    today: NaiveDate,
) -> Vec<CapacityUsage> {
    facilities
        .iter()
        .filter(|f| filter.matches_name(&f.name))
        .map(|facility| {
            let occupied = patients
                .iter()
                .filter(|p| p.facid == Some(facility.facid))
                .filter(|p| p.discharged.map_or(true, |d| d > today))
                .count();
            CapacityUsage {
                hospital: facility.name.clone(),
                capacity: facility.capacity,
                occupied,
                over_capacity: occupied as i64 >= facility.capacity,
            }
        })
        .collect()
}
