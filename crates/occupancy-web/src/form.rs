//! 入院表单校验
//!
//! 每次校验都重新计算完整的错误表，并按字段声明顺序给出首个出错字段，
//! 前端据此滚动定位。校验只是提示性的，预测接口的结果才是最终依据。

use occupancy_core::admission::MAX_SECONDARY_DIAGNOSES;
use occupancy_core::{
    AdmissionField, AdmissionRequest, Comorbidities, Gender, LabValues, ReadmissionCount,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// 表单原始输入，所有字段保持提交时的文本
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdmissionFormInput {
    #[serde(deserialize_with = "de_text")]
    pub facility: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub rcount: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub secondarydiagnosisnonicd9: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub hemoglobin: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub leukocytes: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub sodium: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub glucose: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub bloodureanitro: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub creatinine: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub bmi: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub pulse: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub respiration: Option<String>,
    #[serde(flatten)]
    pub comorbidities: Comorbidities,
}

impl AdmissionFormInput {
    /// 字段的原始文本，空白视为未填写
    pub fn raw(&self, field: AdmissionField) -> Option<&str> {
        let value = match field {
            AdmissionField::Facility => &self.facility,
            AdmissionField::Gender => &self.gender,
            AdmissionField::Rcount => &self.rcount,
            AdmissionField::Secondarydiagnosisnonicd9 => &self.secondarydiagnosisnonicd9,
            AdmissionField::Hemoglobin => &self.hemoglobin,
            AdmissionField::Leukocytes => &self.leukocytes,
            AdmissionField::Sodium => &self.sodium,
            AdmissionField::Glucose => &self.glucose,
            AdmissionField::Bloodureanitro => &self.bloodureanitro,
            AdmissionField::Creatinine => &self.creatinine,
            AdmissionField::Bmi => &self.bmi,
            AdmissionField::Pulse => &self.pulse,
            AdmissionField::Respiration => &self.respiration,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// 按字段声明顺序排列的错误表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(AdmissionField, String)>,
}

impl FieldErrors {
    fn insert(&mut self, field: AdmissionField, message: impl Into<String>) {
        self.errors.push((field, message.into()));
        self.errors.sort_by_key(|(f, _)| *f);
    }

    pub fn get(&self, field: AdmissionField) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// 首个出错字段（滚动定位目标）
    pub fn first_invalid_field(&self) -> Option<AdmissionField> {
        self.errors.first().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AdmissionField, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, message) in &self.errors {
            map.serialize_entry(field.key(), message)?;
        }
        map.end()
    }
}

/// 校验表单并生成入院请求
pub fn validate(
    input: &AdmissionFormInput,
    facility_names: &[String],
    patient_id: i64,
) -> Result<AdmissionRequest, FieldErrors> {
    let mut errors = FieldErrors::default();

    let facility = match input.raw(AdmissionField::Facility) {
        None => {
            errors.insert(AdmissionField::Facility, "Please select a facility");
            None
        }
        Some(name) if !facility_names.iter().any(|f| f == name) => {
            errors.insert(AdmissionField::Facility, "Please select a valid facility");
            None
        }
        Some(name) => Some(name.to_string()),
    };

    let gender = match input.raw(AdmissionField::Gender).map(Gender::parse) {
        Some(gender) if gender != Gender::Unknown => Some(gender),
        _ => {
            errors.insert(AdmissionField::Gender, "Please select a gender");
            None
        }
    };

    let rcount = match input.raw(AdmissionField::Rcount).and_then(ReadmissionCount::parse) {
        Some(count) => Some(count.as_wire()),
        None => {
            errors.insert(AdmissionField::Rcount, "Please select a readmission count");
            None
        }
    };

    let secondary = match input.raw(AdmissionField::Secondarydiagnosisnonicd9) {
        None => {
            errors.insert(
                AdmissionField::Secondarydiagnosisnonicd9,
                "Please enter secondary diagnosis",
            );
            None
        }
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if (0..=MAX_SECONDARY_DIAGNOSES).contains(&n) => Some(n),
            Ok(_) => {
                errors.insert(
                    AdmissionField::Secondarydiagnosisnonicd9,
                    format!("Secondary diagnosis must be between 0 and {}", MAX_SECONDARY_DIAGNOSES),
                );
                None
            }
            Err(_) => {
                errors.insert(
                    AdmissionField::Secondarydiagnosisnonicd9,
                    "Secondary diagnosis must be a whole number",
                );
                None
            }
        },
    };

    let mut labs = LabValues::default();
    for field in AdmissionField::LABS {
        let Some(raw) = input.raw(field) else {
            errors.insert(field, format!("Please enter {}", field.label()));
            continue;
        };
        match raw.parse::<f64>() {
            Ok(v) if !v.is_finite() => {
                errors.insert(field, format!("{} must be a number", field.label()));
            }
            Ok(v) if v < 0.0 => {
                errors.insert(field, "Numeric values must not be negative");
            }
            Ok(v) => set_lab(&mut labs, field, v),
            Err(_) => {
                errors.insert(field, format!("{} must be a number", field.label()));
            }
        }
    }

    match (facility, gender, rcount, secondary) {
        (Some(facility), Some(gender), Some(rcount), Some(secondary)) if errors.is_empty() => {
            Ok(AdmissionRequest {
                patient_id,
                facility,
                gender,
                rcount,
                secondarydiagnosisnonicd9: secondary,
                comorbidities: input.comorbidities.clone(),
                labs,
            })
        }
        _ => Err(errors),
    }
}

fn set_lab(labs: &mut LabValues, field: AdmissionField, value: f64) {
    let slot = match field {
        AdmissionField::Hemoglobin => &mut labs.hemoglobin,
        AdmissionField::Leukocytes => &mut labs.leukocytes,
        AdmissionField::Sodium => &mut labs.sodium,
        AdmissionField::Glucose => &mut labs.glucose,
        AdmissionField::Bloodureanitro => &mut labs.bloodureanitro,
        AdmissionField::Creatinine => &mut labs.creatinine,
        AdmissionField::Bmi => &mut labs.bmi,
        AdmissionField::Pulse => &mut labs.pulse,
        AdmissionField::Respiration => &mut labs.respiration,
        _ => return,
    };
    *slot = Some(value);
}
