//! 测试用的机构与患者构造函数

use chrono::NaiveDate;
use occupancy_core::{Comorbidities, Facility, FacilityId, Gender, LabValues, Patient};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn facility(id: i64, name: &str, capacity: i64, postcode: i64) -> Facility {
    Facility {
        facid: FacilityId(id),
        name: name.to_string(),
        capacity,
        postcode,
        address: format!("{name} address"),
        contact_no: "03-0000000".to_string(),
    }
}

pub fn patient(
    eid: i64,
    facid: i64,
    admitted: &str,
    discharged: Option<&str>,
    predicted_days: i64,
) -> Patient {
    Patient {
        eid,
        facid: Some(FacilityId(facid)),
        gender: Gender::Female,
        vdate: Some(date(admitted)),
        discharged: discharged.map(date),
        pred_lengthofstay: Some(predicted_days),
        lengthofstay: None,
        rcount: Some("0".to_string()),
        secondarydiagnosisnonicd9: Some(1),
        comorbidities: Comorbidities::default(),
        labs: LabValues::default(),
    }
}
