//! 预测后端 REST 接口
//!
//! 路径与后端保持一致：数据接口位于 `{base_url}{api_prefix}` 下，
//! 预测接口位于 `{base_url}/predict/`。

use async_trait::async_trait;
use occupancy_core::{
    AdmissionRequest, CheckoutPatient, DischargeReceipt, Facility, OccupancyError, Patient,
    Prediction, Result,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// 后端连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// 后端服务根地址
    pub base_url: String,
    /// 数据接口前缀
    pub api_prefix: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/ml_model".to_string(),
            api_prefix: "/api".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// 后端访问接口
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET /facilities`
    async fn facilities(&self) -> Result<Vec<Facility>>;

    /// `GET /patients`
    async fn patients(&self) -> Result<Vec<Patient>>;

    /// `GET /patient/max-id`，返回下一个可用的患者号
    async fn next_patient_id(&self) -> Result<i64>;

    /// `GET /checkout-patients/`
    async fn checkout_patients(&self) -> Result<Vec<CheckoutPatient>>;

    /// `POST /discharge-patient/{id}/`
    async fn discharge_patient(&self, eid: i64) -> Result<DischargeReceipt>;

    /// `POST /predict/`
    async fn predict(&self, request: &AdmissionRequest) -> Result<Prediction>;
}

/// 一次视图加载拉取到的机构与患者快照
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub facilities: Vec<Facility>,
    pub patients: Vec<Patient>,
}

/// 并发拉取机构与患者列表
pub async fn fetch_snapshot(backend: &dyn BackendApi) -> Result<Snapshot> {
    let (facilities, patients) = tokio::try_join!(backend.facilities(), backend.patients())?;
    Ok(Snapshot {
        facilities,
        patients,
    })
}

#[derive(Debug, Deserialize)]
struct MaxIdResponse {
    #[serde(rename = "maxId")]
    max_id: i64,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    patients: Vec<CheckoutPatient>,
}

/// 基于 reqwest 的后端实现
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OccupancyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Backend client configured for {}", config.base_url);
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_prefix.trim_end_matches('/'),
            path
        )
    }

    fn predict_url(&self) -> String {
        format!("{}/predict/", self.config.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error("GET", url, e))?;
        read_json(url, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<&B>,
    ) -> Result<T> {
        debug!("POST {}", url);
        let mut request = self.client.post(url);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        let response = request
            .send()
            .await
            .map_err(|e| network_error("POST", url, e))?;
        read_json(url, response).await
    }
}

fn network_error(method: &str, url: &str, err: reqwest::Error) -> OccupancyError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    error!("{} {} failed: {}", method, url, reason);
    OccupancyError::Network(format!("Unable to reach the server ({})", reason))
}

async fn read_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| OccupancyError::Network(format!("Failed to read response: {}", e)))?;

    if status == reqwest::StatusCode::NOT_FOUND {
        error!("{} returned 404", url);
        return Err(OccupancyError::NotFound(backend_message(&body, "Resource not found")));
    }
    if !status.is_success() {
        error!("{} returned {}: {}", url, status, body);
        return Err(OccupancyError::Backend {
            status: status.as_u16(),
            message: backend_message(&body, "The server could not complete the request"),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!("Unexpected response from {}: {}", url, e);
        OccupancyError::Backend {
            status: status.as_u16(),
            message: format!("Unexpected response from server: {}", e),
        }
    })
}

/// 从后端错误体中提取 `message` 或 `error` 字段
fn backend_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn facilities(&self) -> Result<Vec<Facility>> {
        self.get_json(&self.api_url("/facilities")).await
    }

    async fn patients(&self) -> Result<Vec<Patient>> {
        self.get_json(&self.api_url("/patients")).await
    }

    async fn next_patient_id(&self) -> Result<i64> {
        let response: MaxIdResponse = self.get_json(&self.api_url("/patient/max-id")).await?;
        Ok(response.max_id)
    }

    async fn checkout_patients(&self) -> Result<Vec<CheckoutPatient>> {
        let response: CheckoutResponse =
            self.get_json(&self.api_url("/checkout-patients/")).await?;
        Ok(response.patients)
    }

    async fn discharge_patient(&self, eid: i64) -> Result<DischargeReceipt> {
        let url = self.api_url(&format!("/discharge-patient/{}/", eid));
        let receipt: DischargeReceipt = self.post_json::<(), _>(&url, None).await?;
        if receipt.is_success() {
            info!("Patient {} discharged", eid);
            Ok(receipt)
        } else {
            let message = receipt
                .message
                .unwrap_or_else(|| format!("Failed to discharge patient {}", eid));
            error!("Discharge of patient {} rejected: {}", eid, message);
            Err(OccupancyError::Backend {
                status: 200,
                message,
            })
        }
    }

    async fn predict(&self, request: &AdmissionRequest) -> Result<Prediction> {
        let prediction: Prediction = self.post_json(&self.predict_url(), Some(request)).await?;
        if prediction.prediction.is_empty() {
            return Err(OccupancyError::Backend {
                status: 200,
                message: "Prediction response was empty".to_string(),
            });
        }
        Ok(prediction)
    }
}
