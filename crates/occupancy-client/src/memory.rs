//! 内存后端
//!
//! 复现预测后端的数据语义：出院时写入出院日期与实际住院天数，
//! 待出院列表只包含在院患者，预测时新建患者记录。用于演示与测试。

use async_trait::async_trait;
use chrono::NaiveDate;
use occupancy_core::utils::days_between;
use occupancy_core::{
    AdmissionRequest, CheckoutPatient, DischargeReceipt, Facility, OccupancyError, Patient,
    Prediction, Result,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::BackendApi;

#[derive(Debug)]
struct MemoryState {
    facilities: Vec<Facility>,
    patients: Vec<Patient>,
    offline: bool,
}

/// 内存中的后端实现
#[derive(Debug)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    today: NaiveDate,
    predicted_stay: i64,
}

impl MemoryBackend {
    pub fn new(facilities: Vec<Facility>, patients: Vec<Patient>, today: NaiveDate) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                facilities,
                patients,
                offline: false,
            }),
            today,
            predicted_stay: 3,
        }
    }

    /// 设置预测接口返回的住院天数
    pub fn with_predicted_stay(mut self, days: i64) -> Self {
        self.predicted_stay = days;
        self
    }

    /// 模拟后端不可达
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    pub async fn patient(&self, eid: i64) -> Option<Patient> {
        self.state
            .read()
            .await
            .patients
            .iter()
            .find(|p| p.eid == eid)
            .cloned()
    }

    async fn ensure_online(&self) -> Result<()> {
        if self.state.read().await.offline {
            Err(OccupancyError::Network(
                "Unable to reach the server (connection refused)".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BackendApi for MemoryBackend {
    async fn facilities(&self) -> Result<Vec<Facility>> {
        self.ensure_online().await?;
        Ok(self.state.read().await.facilities.clone())
    }

    async fn patients(&self) -> Result<Vec<Patient>> {
        self.ensure_online().await?;
        Ok(self.state.read().await.patients.clone())
    }

    async fn next_patient_id(&self) -> Result<i64> {
        self.ensure_online().await?;
        let state = self.state.read().await;
        Ok(state.patients.iter().map(|p| p.eid).max().unwrap_or(0) + 1)
    }

    async fn checkout_patients(&self) -> Result<Vec<CheckoutPatient>> {
        self.ensure_online().await?;
        let state = self.state.read().await;
        let names: HashMap<_, _> = state
            .facilities
            .iter()
            .map(|f| (f.facid, f.name.clone()))
            .collect();

        Ok(state
            .patients
            .iter()
            .filter(|p| p.is_ongoing())
            .map(|p| CheckoutPatient {
                eid: p.eid,
                facility: p.facid.and_then(|id| names.get(&id).cloned()),
                vdate: p.vdate,
                pred_lengthofstay: p.pred_lengthofstay,
            })
            .collect())
    }

    async fn discharge_patient(&self, eid: i64) -> Result<DischargeReceipt> {
        self.ensure_online().await?;
        let mut state = self.state.write().await;
        let patient = state
            .patients
            .iter_mut()
            .find(|p| p.eid == eid)
            .ok_or_else(|| OccupancyError::NotFound(format!("Patient {} does not exist", eid)))?;

        let length_of_stay = patient.vdate.map(|admitted| days_between(admitted, self.today));
        patient.discharged = Some(self.today);
        patient.lengthofstay = length_of_stay;
        info!("Memory backend discharged patient {}", eid);

        Ok(DischargeReceipt {
            status: "success".to_string(),
            length_of_stay,
            message: None,
        })
    }

    async fn predict(&self, request: &AdmissionRequest) -> Result<Prediction> {
        self.ensure_online().await?;
        let mut state = self.state.write().await;
        let facid = state
            .facilities
            .iter()
            .find(|f| f.name == request.facility)
            .map(|f| f.facid)
            .ok_or_else(|| {
                OccupancyError::NotFound(format!("No Facility matches {}", request.facility))
            })?;

        debug!("Memory backend admitting patient {}", request.patient_id);
        state.patients.push(Patient {
            eid: request.patient_id,
            facid: Some(facid),
            gender: request.gender,
            vdate: Some(self.today),
            discharged: None,
            pred_lengthofstay: Some(self.predicted_stay),
            lengthofstay: None,
            rcount: Some(request.rcount.clone()),
            secondarydiagnosisnonicd9: Some(request.secondarydiagnosisnonicd9),
            comorbidities: request.comorbidities.clone(),
            labs: request.labs.clone(),
        });

        Ok(Prediction {
            prediction: vec![self.predicted_stay as f64],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occupancy_core::{Comorbidities, FacilityId, Gender, LabValues};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn backend() -> MemoryBackend {
        let facilities = vec![Facility {
            facid: FacilityId(1),
            name: "Hospital A".to_string(),
            capacity: 10,
            postcode: 50000,
            address: String::new(),
            contact_no: String::new(),
        }];
        let patients = vec![Patient {
            eid: 1,
            facid: Some(FacilityId(1)),
            gender: Gender::Male,
            vdate: Some(d("2024-05-01")),
            discharged: None,
            pred_lengthofstay: Some(4),
            lengthofstay: None,
            rcount: None,
            secondarydiagnosisnonicd9: None,
            comorbidities: Comorbidities::default(),
            labs: LabValues::default(),
        }];
        MemoryBackend::new(facilities, patients, d("2024-05-06"))
    }

    #[tokio::test]
    async fn test_discharge_updates_listing() {
        let backend = backend();
        assert_eq!(backend.checkout_patients().await.unwrap().len(), 1);

        let receipt = backend.discharge_patient(1).await.unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.length_of_stay, Some(5));
        assert!(backend.checkout_patients().await.unwrap().is_empty());

        let err = backend.discharge_patient(99).await.unwrap_err();
        assert!(matches!(err, OccupancyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_predict_admits_patient() {
        let backend = backend().with_predicted_stay(6);
        let eid = backend.next_patient_id().await.unwrap();
        assert_eq!(eid, 2);

        let request = AdmissionRequest {
            patient_id: eid,
            facility: "Hospital A".to_string(),
            gender: Gender::Female,
            rcount: "0".to_string(),
            secondarydiagnosisnonicd9: 1,
            comorbidities: Comorbidities::default(),
            labs: LabValues::default(),
        };
        let prediction = backend.predict(&request).await.unwrap();
        assert_eq!(prediction.length_of_stay(), Some(6));
        assert_eq!(backend.patient(2).await.unwrap().pred_lengthofstay, Some(6));
    }

    #[tokio::test]
    async fn test_offline_backend_fails_with_network_error() {
        let backend = backend();
        backend.set_offline(true).await;
        assert!(matches!(backend.patients().await, Err(OccupancyError::Network(_))));
    }
}
