//! 入院登记请求模型
//!
//! `POST /predict/` 的请求体，以及表单字段的声明顺序。

use serde::{Deserialize, Serialize, Serializer};

use crate::models::{Comorbidities, Gender, LabValues};

/// 入院表单字段，顺序即表单中的声明顺序（首个错误字段按此顺序定位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionField {
    Facility,
    Gender,
    Rcount,
    Secondarydiagnosisnonicd9,
    Hemoglobin,
    Leukocytes,
    Sodium,
    Glucose,
    Bloodureanitro,
    Creatinine,
    Bmi,
    Pulse,
    Respiration,
}

impl AdmissionField {
    pub const ALL: [AdmissionField; 13] = [
        AdmissionField::Facility,
        AdmissionField::Gender,
        AdmissionField::Rcount,
        AdmissionField::Secondarydiagnosisnonicd9,
        AdmissionField::Hemoglobin,
        AdmissionField::Leukocytes,
        AdmissionField::Sodium,
        AdmissionField::Glucose,
        AdmissionField::Bloodureanitro,
        AdmissionField::Creatinine,
        AdmissionField::Bmi,
        AdmissionField::Pulse,
        AdmissionField::Respiration,
    ];

    pub const LABS: [AdmissionField; 9] = [
        AdmissionField::Hemoglobin,
        AdmissionField::Leukocytes,
        AdmissionField::Sodium,
        AdmissionField::Glucose,
        AdmissionField::Bloodureanitro,
        AdmissionField::Creatinine,
        AdmissionField::Bmi,
        AdmissionField::Pulse,
        AdmissionField::Respiration,
    ];

    /// 与后端一致的字段名
    pub fn key(&self) -> &'static str {
        match self {
            AdmissionField::Facility => "facility",
            AdmissionField::Gender => "gender",
            AdmissionField::Rcount => "rcount",
            AdmissionField::Secondarydiagnosisnonicd9 => "secondarydiagnosisnonicd9",
            AdmissionField::Hemoglobin => "hemoglobin",
            AdmissionField::Leukocytes => "leukocytes",
            AdmissionField::Sodium => "sodium",
            AdmissionField::Glucose => "glucose",
            AdmissionField::Bloodureanitro => "bloodureanitro",
            AdmissionField::Creatinine => "creatinine",
            AdmissionField::Bmi => "bmi",
            AdmissionField::Pulse => "pulse",
            AdmissionField::Respiration => "respiration",
        }
    }

    /// 提示信息中使用的显示名
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionField::Facility => "facility",
            AdmissionField::Gender => "gender",
            AdmissionField::Rcount => "readmission count",
            AdmissionField::Secondarydiagnosisnonicd9 => "secondary diagnosis",
            AdmissionField::Hemoglobin => "hemoglobin",
            AdmissionField::Leukocytes => "leukocytes",
            AdmissionField::Sodium => "sodium",
            AdmissionField::Glucose => "glucose",
            AdmissionField::Bloodureanitro => "blood urea nitrogen",
            AdmissionField::Creatinine => "creatinine",
            AdmissionField::Bmi => "BMI",
            AdmissionField::Pulse => "pulse",
            AdmissionField::Respiration => "respiration",
        }
    }

    pub fn is_lab(&self) -> bool {
        Self::LABS.contains(self)
    }
}

/// 再入院次数选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmissionCount {
    Count(u8),
    FiveOrMore,
}

impl ReadmissionCount {
    /// 表单下拉框中的全部选项
    pub const OPTIONS: [&'static str; 6] = ["0", "1", "2", "3", "4", "5+"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "5+" => Some(ReadmissionCount::FiveOrMore),
            v => v
                .parse::<u8>()
                .ok()
                .filter(|n| *n <= 4)
                .map(ReadmissionCount::Count),
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            ReadmissionCount::Count(n) => n.to_string(),
            ReadmissionCount::FiveOrMore => "5+".to_string(),
        }
    }
}

/// 次要诊断数量允许的最大值
pub const MAX_SECONDARY_DIAGNOSES: i64 = 10;

/// 已通过表单校验的入院请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionRequest {
    #[serde(rename = "patientId")]
    pub patient_id: i64,
    /// 机构名称（后端按名称查找机构）
    pub facility: String,
    #[serde(serialize_with = "ser_gender_label")]
    pub gender: Gender,
    pub rcount: String,
    pub secondarydiagnosisnonicd9: i64,
    #[serde(flatten)]
    pub comorbidities: Comorbidities,
    #[serde(flatten)]
    pub labs: LabValues,
}

fn ser_gender_label<S: Serializer>(gender: &Gender, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(gender.label())
}
