//! # 占用率统计模块
//!
//! 基于一次拉取的机构与患者快照做纯函数统计，包括：
//! - 机构占用率及分级
//! - 在院患者性别分布
//! - 历史入院月度趋势与未来每日在院预测
//! - 住院天数直方图与床位使用对比
//! - 列表搜索、邮编就近排序与分页

pub mod demographics;
pub mod length_of_stay;
pub mod listing;
pub mod lookup;
pub mod occupancy;
pub mod trends;
pub mod window;

#[cfg(test)]
pub(crate) mod fixtures;

// 重新导出主要类型
pub use demographics::{gender_distribution, GenderDistribution};
pub use length_of_stay::{length_of_stay_histogram, HistogramBin, HistogramBins, LosHistogram};
pub use listing::{
    is_valid_postcode_input, paginate, pagination_items, search_checkout,
    sort_by_postcode_proximity, Page, PageItem,
};
pub use lookup::{FacilityLookup, HospitalFilter};
pub use occupancy::{capacity_utilisation, occupancy_rate, CapacityUsage, OccupancyClass};
pub use trends::{historical_admissions, predicted_admissions, DailyCount, MonthlyCount};
pub use window::TimeWindow;
