//! 核心数据模型定义
//!
//! 字段名与后端 REST 接口保持一致（`facid`、`vdate`、`pred_lengthofstay` 等），
//! 只在 Rust 侧换成更明确的类型。

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::utils::parse_wire_date;

/// 医疗机构标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FacilityId(pub i64);

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for FacilityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireScalar::deserialize(deserializer)? {
            WireScalar::Int(v) => Ok(FacilityId(v)),
            WireScalar::Text(s) => s
                .trim()
                .parse()
                .map(FacilityId)
                .map_err(|_| serde::de::Error::custom(format!("invalid facility id: {s}"))),
            other => Err(serde::de::Error::custom(format!(
                "invalid facility id: {other:?}"
            ))),
        }
    }
}

/// 医疗机构（只读参考数据）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub facid: FacilityId,
    pub name: String,
    pub capacity: i64,
    pub postcode: i64,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "contactNo", default)]
    pub contact_no: String,
}

/// 性别
///
/// 后端存储 `M`/`F`，录入表单使用 `Male`/`Female`；其他取值一律归为 `Unknown`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// 后端存储使用的代码
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Gender::Male => Some("M"),
            Gender::Female => Some("F"),
            Gender::Unknown => None,
        }
    }

    /// 表单与图表中显示的名称
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Gender::Male,
            "f" | "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl From<Option<String>> for Gender {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Gender::parse).unwrap_or(Gender::Unknown)
    }
}

impl From<Gender> for Option<String> {
    fn from(gender: Gender) -> Self {
        gender.code().map(str::to_string)
    }
}

/// 合并症标记，后端以 0/1 整数存储，可能为 null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comorbidities {
    #[serde(default, deserialize_with = "de_flag")]
    pub dialysisrenalendstage: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub asthma: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub irondef: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub pneum: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub substancedependence: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub psychologicaldisordermajor: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub depress: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub psychother: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub fibrosisandother: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub malnutrition: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub hemo: bool,
}

/// 化验指标，均要求非负
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabValues {
    #[serde(default)]
    pub hemoglobin: Option<f64>,
    #[serde(default)]
    pub leukocytes: Option<f64>,
    #[serde(default)]
    pub sodium: Option<f64>,
    #[serde(default)]
    pub glucose: Option<f64>,
    #[serde(default)]
    pub bloodureanitro: Option<f64>,
    #[serde(default)]
    pub creatinine: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub respiration: Option<f64>,
}

/// 患者记录（`GET /patients` 的一行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub eid: i64,
    #[serde(default, deserialize_with = "de_opt_facility_id")]
    pub facid: Option<FacilityId>,
    #[serde(default)]
    pub gender: Gender,
    /// 入院日期
    #[serde(default, deserialize_with = "de_opt_date")]
    pub vdate: Option<NaiveDate>,
    /// 出院日期，`None` 表示仍在院
    #[serde(default, deserialize_with = "de_opt_date")]
    pub discharged: Option<NaiveDate>,
    /// 模型预测住院天数
    #[serde(default)]
    pub pred_lengthofstay: Option<i64>,
    /// 实际住院天数，出院时由后端写入
    #[serde(default)]
    pub lengthofstay: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub rcount: Option<String>,
    #[serde(default)]
    pub secondarydiagnosisnonicd9: Option<i64>,
    #[serde(flatten)]
    pub comorbidities: Comorbidities,
    #[serde(flatten)]
    pub labs: LabValues,
}

impl Patient {
    /// 判断患者是否仍在院
    pub fn is_ongoing(&self) -> bool {
        self.discharged.is_none()
    }

    /// 预测住院天数，缺失或为负时按 0 处理
    pub fn predicted_stay_days(&self) -> i64 {
        self.pred_lengthofstay.unwrap_or(0).max(0)
    }

    /// 按预测住院天数推算的出院日期
    pub fn projected_end(&self) -> Option<NaiveDate> {
        self.vdate
            .map(|admitted| crate::utils::add_days(admitted, self.predicted_stay_days()))
    }

    /// 有效住院区间的结束日：实际出院日期优先，否则取预测结束日
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.discharged.or_else(|| self.projected_end())
    }
}

/// 待出院患者列表行（`GET /checkout-patients/`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPatient {
    pub eid: i64,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub vdate: Option<NaiveDate>,
    #[serde(default)]
    pub pred_lengthofstay: Option<i64>,
}

impl CheckoutPatient {
    /// 机构名称，无法解析时显示 "Unknown"
    pub fn facility_name(&self) -> &str {
        self.facility.as_deref().unwrap_or(UNKNOWN_FACILITY)
    }
}

/// 出院接口的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DischargeReceipt {
    pub status: String,
    #[serde(default)]
    pub length_of_stay: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DischargeReceipt {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// 预测接口的响应，第一个元素为预测住院天数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: Vec<f64>,
}

impl Prediction {
    pub fn length_of_stay(&self) -> Option<i64> {
        self.prediction.first().map(|v| v.round() as i64)
    }
}

/// 无法解析的机构显示名
pub const UNKNOWN_FACILITY: &str = "Unknown";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<WireScalar>::deserialize(deserializer)? {
        None => false,
        Some(WireScalar::Bool(b)) => b,
        Some(WireScalar::Int(v)) => v != 0,
        Some(WireScalar::Float(v)) => v != 0.0,
        Some(WireScalar::Text(s)) => matches!(s.trim(), "1" | "true" | "True"),
    })
}

fn de_opt_facility_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FacilityId>, D::Error> {
    Ok(match Option::<WireScalar>::deserialize(deserializer)? {
        Some(WireScalar::Int(v)) => Some(FacilityId(v)),
        Some(WireScalar::Text(s)) => s.trim().parse().ok().map(FacilityId),
        _ => None,
    })
}

fn de_opt_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_wire_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {s}"))),
    }
}

fn de_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<WireScalar>::deserialize(deserializer)? {
        None => None,
        Some(WireScalar::Text(s)) => Some(s),
        Some(WireScalar::Int(v)) => Some(v.to_string()),
        Some(WireScalar::Float(v)) => Some(v.to_string()),
        Some(WireScalar::Bool(b)) => Some(b.to_string()),
    })
}
