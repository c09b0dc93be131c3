//! 列表工具：邮编就近排序、待出院搜索与分页

use occupancy_core::{CheckoutPatient, Facility};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 按与输入邮编的差值绝对值升序排列（稳定排序）；未输入邮编时保持原顺序
pub fn sort_by_postcode_proximity(facilities: &mut [Facility], postcode: Option<i64>) {
    if let Some(postcode) = postcode {
        facilities.sort_by_key(|f| (f.postcode - postcode).abs());
    }
}

/// 邮编输入框只接受最多 5 位数字
pub fn is_valid_postcode_input(input: &str) -> bool {
    static POSTCODE: OnceLock<Regex> = OnceLock::new();
    POSTCODE
        .get_or_init(|| Regex::new(r"^\d{0,5}$").expect("static postcode pattern"))
        .is_match(input)
}

/// 待出院列表的模糊搜索（不区分大小写），匹配患者号、机构、入院日期与预测天数
pub fn search_checkout<'a>(rows: &'a [CheckoutPatient], query: &str) -> Vec<&'a CheckoutPatient> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return rows.iter().collect();
    }

    rows.iter()
        .filter(|row| {
            row.eid.to_string().contains(&query)
                || row
                    .facility
                    .as_deref()
                    .map_or(false, |f| f.to_lowercase().contains(&query))
                || row
                    .vdate
                    .map_or(false, |d| d.format("%Y-%m-%d").to_string().contains(&query))
                || row
                    .pred_lengthofstay
                    .map_or(false, |v| v.to_string().contains(&query))
        })
        .collect()
}

/// 一页数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 当前页首行在全部数据中的序号（从 0 开始）
    pub start_index: usize,
}

/// 分页；页码被限制在 `[1, max(1, total_pages)]`
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start_index = (page - 1) * per_page;
    let end = (start_index + per_page).min(total_items);

    Page {
        items: items.get(start_index..end).unwrap_or_default().to_vec(),
        page,
        per_page,
        total_pages,
        total_items,
        start_index,
    }
}

/// 分页条目：页码或省略号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Number(usize),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Number(n) => serializer.serialize_u64(*n as u64),
            PageItem::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// 当前页前后各两页，并补上首页、末页与省略号
pub fn pagination_items(current: usize, total_pages: usize) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let start = current.saturating_sub(2).max(1);
    let end = (current + 2).min(total_pages);
    let mut items = Vec::new();

    if start > 1 {
        items.push(PageItem::Number(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(PageItem::Number));
    if end < total_pages {
        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Number(total_pages));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, facility};
    use PageItem::{Ellipsis, Number};

    fn row(eid: i64, facility: Option<&str>, vdate: &str, pred: i64) -> CheckoutPatient {
        CheckoutPatient {
            eid,
            facility: facility.map(str::to_string),
            vdate: Some(date(vdate)),
            pred_lengthofstay: Some(pred),
        }
    }

    #[test]
    fn test_postcode_proximity() {
        let mut facilities = vec![
            facility(1, "Far", 10, 80000),
            facility(2, "Near", 10, 50010),
            facility(3, "Exact", 10, 50000),
        ];
        sort_by_postcode_proximity(&mut facilities, None);
        assert_eq!(facilities[0].name, "Far");

        sort_by_postcode_proximity(&mut facilities, Some(50000));
        let names: Vec<&str> = facilities.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Exact", "Near", "Far"]);
    }

    #[test]
    fn test_postcode_input() {
        assert!(is_valid_postcode_input(""));
        assert!(is_valid_postcode_input("50586"));
        assert!(!is_valid_postcode_input("505861"));
        assert!(!is_valid_postcode_input("5a"));
    }

    #[test]
    fn test_search_checkout() {
        let rows = vec![
            row(101, Some("Hospital Selayang"), "2024-05-01", 4),
            row(202, None, "2024-06-12", 7),
        ];
        assert_eq!(search_checkout(&rows, "").len(), 2);
        assert_eq!(search_checkout(&rows, "SELAYANG")[0].eid, 101);
        assert_eq!(search_checkout(&rows, "06-12")[0].eid, 202);
        assert_eq!(search_checkout(&rows, "7")[0].eid, 202);
        assert!(search_checkout(&rows, "unknown").is_empty());
    }

    #[test]
    fn test_paginate_clamps_page() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate(&items, 3, 5);
        assert_eq!(page.items, vec![11, 12]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.start_index, 10);

        assert_eq!(paginate(&items, 9, 5).page, 3);
        assert_eq!(paginate(&items, 0, 5).items, vec![1, 2, 3, 4, 5]);

        let empty: Page<u32> = paginate(&[], 2, 5);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_pagination_items_window() {
        assert_eq!(pagination_items(1, 3), vec![Number(1), Number(2), Number(3)]);
        assert_eq!(
            pagination_items(6, 10),
            vec![Number(1), Ellipsis, Number(4), Number(5), Number(6), Number(7), Number(8), Ellipsis, Number(10)]
        );
        assert_eq!(
            pagination_items(4, 6),
            vec![Number(1), Number(2), Number(3), Number(4), Number(5), Number(6)]
        );
        assert!(pagination_items(1, 0).is_empty());
    }

    #[test]
    fn test_page_items_serialize_for_view() {
        let items = pagination_items(1, 5);
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json, serde_json::json!([1, 2, 3, "...", 5]));
    }
}
