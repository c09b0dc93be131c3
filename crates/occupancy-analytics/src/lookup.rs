//! 机构查找表
//!
//! 每次拉取机构快照后构建一次，在所有统计函数之间共享。

use occupancy_core::{Facility, FacilityId, Patient, UNKNOWN_FACILITY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 机构 ID 与名称的双向查找表
#[derive(Debug, Clone, Default)]
pub struct FacilityLookup {
    names: HashMap<FacilityId, String>,
    ids: HashMap<String, FacilityId>,
}

impl FacilityLookup {
    pub fn new(facilities: &[Facility]) -> Self {
        let mut names = HashMap::with_capacity(facilities.len());
        let mut ids = HashMap::with_capacity(facilities.len());
        for facility in facilities {
            names.insert(facility.facid, facility.name.clone());
            ids.entry(facility.name.clone()).or_insert(facility.facid);
        }
        Self { names, ids }
    }

    /// 机构名称，无法解析时为 "Unknown"
    pub fn name_of(&self, facid: Option<FacilityId>) -> &str {
        facid
            .and_then(|id| self.names.get(&id))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_FACILITY)
    }

    /// 患者所属机构名称
    pub fn hospital_of(&self, patient: &Patient) -> &str {
        self.name_of(patient.facid)
    }

    pub fn id_of(&self, name: &str) -> Option<FacilityId> {
        self.ids.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// 按机构名称过滤；空名称表示全部机构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalFilter(Option<String>);

impl HospitalFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(name))
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// 按名称匹配机构
    pub fn matches_name(&self, hospital: &str) -> bool {
        match &self.0 {
            None => true,
            Some(name) => name == hospital,
        }
    }

    /// 通过查找表解析患者机构后匹配
    pub fn matches(&self, lookup: &FacilityLookup, patient: &Patient) -> bool {
        self.matches_name(lookup.hospital_of(patient))
    }
}

impl From<Option<String>> for HospitalFilter {
    fn from(value: Option<String>) -> Self {
        value.map(HospitalFilter::named).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{facility, patient};

    #[test]
    fn test_unresolved_facility_is_unknown() {
        let lookup = FacilityLookup::new(&[facility(1, "Hospital A", 10, 50000)]);
        assert_eq!(lookup.name_of(Some(FacilityId(1))), "Hospital A");
        assert_eq!(lookup.name_of(Some(FacilityId(9))), "Unknown");
        assert_eq!(lookup.name_of(None), "Unknown");
        assert_eq!(lookup.id_of("Hospital A"), Some(FacilityId(1)));
    }

    #[test]
    fn test_filter_matches_by_name() {
        let lookup = FacilityLookup::new(&[
            facility(1, "Hospital A", 10, 50000),
            facility(2, "Hospital B", 10, 50100),
        ]);
        let p = patient(1, 2, "2024-01-01", None, 3);

        assert!(HospitalFilter::all().matches(&lookup, &p));
        assert!(HospitalFilter::named("Hospital B").matches(&lookup, &p));
        assert!(!HospitalFilter::named("Hospital A").matches(&lookup, &p));
        assert_eq!(HospitalFilter::named("  "), HospitalFilter::all());
    }
}
