//! HTTP处理器
//!
//! 每个页面路径返回该页面的视图模型。受限页面先经过路由守卫，未通过时
//! 返回 303 及目标路径。页面数据通过 `ViewLoader` 加载，请求被丢弃时
//! 未完成的后端调用随之取消。

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use occupancy_analytics::{
    capacity_utilisation, gender_distribution, historical_admissions,
    is_valid_postcode_input, length_of_stay_histogram, occupancy_rate, paginate,
    pagination_items, predicted_admissions, search_checkout, sort_by_postcode_proximity,
    CapacityUsage, DailyCount, FacilityLookup, GenderDistribution, HospitalFilter, LosHistogram,
    MonthlyCount, OccupancyClass, Page, PageItem, TimeWindow,
};
use occupancy_client::{
    fetch_snapshot, BackendApi, DischargeEntry, DischargeOutcome, DischargeWorkflow, ViewLoader,
};
use occupancy_core::admission::MAX_SECONDARY_DIAGNOSES;
use occupancy_core::utils::add_days;
use occupancy_core::{AdmissionField, Gender, OccupancyError, ReadmissionCount, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::form::{validate, AdmissionFormInput};
use crate::guard::{guard, navigation, Access, Navigation, Route};
use crate::session::{ClientSession, SessionStore};

/// 页面参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// 首页每页机构数
    pub home_page_size: usize,
    /// 待出院列表每页行数
    pub checkout_page_size: usize,
    /// 首页日期选择器可选的未来天数
    pub forecast_horizon_days: i64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            home_page_size: 5,
            checkout_page_size: 5,
            forecast_horizon_days: 15,
        }
    }
}

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendApi>,
    pub session: Arc<SessionStore>,
    pub discharge: Arc<DischargeWorkflow>,
    pub views: ViewConfig,
    /// 服务器关闭令牌，视图加载令牌均为其子令牌
    pub shutdown: CancellationToken,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        session: Arc<SessionStore>,
        views: ViewConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            discharge: Arc::new(DischargeWorkflow::new(backend.clone())),
            backend,
            session,
            views,
            shutdown,
            today: None,
        }
    }

    /// 固定"今天"，用于测试与演示
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn mount(&self, view: &'static str) -> ViewLoader {
        ViewLoader::mount(view, &self.shutdown)
    }
}

/// 路由守卫；未通过时返回重定向响应
fn redirect_for(route: Route, session: &Session) -> Option<Response> {
    match guard(route, session) {
        Access::Granted => None,
        Access::Redirect(target) => {
            info!("Redirecting {} to {}", route.path(), target.path());
            Some(redirect(target))
        }
    }
}

pub(crate) fn redirect(target: Route) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, target.path())],
        Json(json!({ "redirect": target.path() })),
    )
        .into_response()
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 导航栏
pub async fn nav(ClientSession { session, .. }: ClientSession) -> Json<NavView> {
    Json(NavView {
        session,
        navigation: navigation(&session),
    })
}

#[derive(Debug, Serialize)]
pub struct NavView {
    pub session: Session,
    pub navigation: Navigation,
}

// ---------------------------------------------------------------------------
// 首页
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    pub date: Option<String>,
    pub postcode: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRow {
    pub index: usize,
    pub name: String,
    pub postcode: i64,
    pub address: String,
    /// 容量为 0 的机构为 `None`
    pub occupancy_rate: Option<f64>,
    pub occupancy_class: Option<OccupancyClass>,
    pub contact_no: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub date: NaiveDate,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub postcode: Option<String>,
    pub facilities: Page<FacilityRow>,
    pub pagination: Vec<PageItem>,
    pub navigation: Navigation,
}

/// 机构占用率列表
pub async fn home(
    State(state): State<AppState>,
    client: ClientSession,
    Query(params): Query<HomeParams>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::Home, &client.session) {
        return Ok(response);
    }

    let today = state.today();
    let min_date = today;
    let max_date = add_days(today, state.views.forecast_horizon_days);
    let date = match params.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => today,
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .filter(|d| (min_date..=max_date).contains(d))
            .ok_or_else(|| {
                OccupancyError::Validation(format!(
                    "Please choose a date between {} and {}",
                    min_date, max_date
                ))
            })?,
    };

    let postcode_input = params
        .postcode
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let postcode = match postcode_input {
        None => None,
        Some(raw) if is_valid_postcode_input(raw) => raw.parse::<i64>().ok(),
        Some(_) => {
            return Err(OccupancyError::Validation(
                "Postcode must be at most 5 digits".to_string(),
            )
            .into())
        }
    };

    let loader = state.mount("home");
    let snapshot = loader
        .load(fetch_snapshot(state.backend.as_ref()))
        .await
        .into_result()?;
    info!(
        "Home view loaded {} facilities and {} patients",
        snapshot.facilities.len(),
        snapshot.patients.len()
    );

    let mut facilities = snapshot.facilities;
    sort_by_postcode_proximity(&mut facilities, postcode);
    let page = paginate(&facilities, params.page.unwrap_or(1), state.views.home_page_size);

    let rows = page
        .items
        .iter()
        .enumerate()
        .map(|(i, facility)| {
            let rate = match occupancy_rate(facility, &snapshot.patients, date) {
                Ok(rate) => Some(rate),
                Err(e) => {
                    warn!("Occupancy rate unavailable for {}: {}", facility.name, e);
                    None
                }
            };
            FacilityRow {
                index: page.start_index + i + 1,
                name: facility.name.clone(),
                postcode: facility.postcode,
                address: facility.address.clone(),
                occupancy_rate: rate,
                occupancy_class: rate.map(OccupancyClass::from_rate),
                contact_no: facility.contact_no.clone(),
            }
        })
        .collect();

    Ok(Json(HomeView {
        date,
        min_date,
        max_date,
        postcode: postcode_input.map(str::to_string),
        pagination: pagination_items(page.page, page.total_pages),
        facilities: Page {
            items: rows,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            start_index: page.start_index,
        },
        navigation: navigation(&client.session),
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// 入院登记
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionFormView {
    pub patient_id: i64,
    pub facilities: Vec<String>,
    pub genders: Vec<&'static str>,
    pub rcount_options: Vec<&'static str>,
    pub max_secondary_diagnoses: i64,
    pub fields: Vec<FieldSpec>,
    pub navigation: Navigation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionSubmitted {
    pub patient_id: i64,
    pub facility: String,
    pub predicted_length_of_stay: Option<i64>,
    pub message: &'static str,
}

async fn load_form_data(state: &AppState, view: &'static str) -> ApiResult<(i64, Vec<String>)> {
    let loader = state.mount(view);
    let backend = state.backend.as_ref();
    let (patient_id, facilities) = loader
        .load(async { tokio::try_join!(backend.next_patient_id(), backend.facilities()) })
        .await
        .into_result()?;
    Ok((patient_id, facilities.into_iter().map(|f| f.name).collect()))
}

/// 入院表单
pub async fn admission_form(
    State(state): State<AppState>,
    client: ClientSession,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::AdmissionForm, &client.session) {
        return Ok(response);
    }

    let (patient_id, facilities) = load_form_data(&state, "admission-form").await?;

    Ok(Json(AdmissionFormView {
        patient_id,
        facilities,
        genders: vec![Gender::Male.label(), Gender::Female.label()],
        rcount_options: ReadmissionCount::OPTIONS.to_vec(),
        max_secondary_diagnoses: MAX_SECONDARY_DIAGNOSES,
        fields: AdmissionField::ALL
            .iter()
            .map(|f| FieldSpec {
                key: f.key(),
                label: f.label(),
            })
            .collect(),
        navigation: navigation(&client.session),
    })
    .into_response())
}

/// 提交入院表单并返回预测住院天数
pub async fn submit_admission(
    State(state): State<AppState>,
    client: ClientSession,
    Json(input): Json<AdmissionFormInput>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::AdmissionForm, &client.session) {
        return Ok(response);
    }

    let (patient_id, facilities) = load_form_data(&state, "admission-form").await?;
    let request = match validate(&input, &facilities, patient_id) {
        Ok(request) => request,
        Err(errors) => {
            warn!("Admission form rejected with {} invalid fields", errors.len());
            let body = json!({
                "error": true,
                "kind": "validation",
                "message": "Please correct the highlighted fields",
                "status": StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                "fields": errors,
                "firstInvalidField": errors.first_invalid_field().map(|f| f.key()),
            });
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
        }
    };

    let prediction = state.backend.predict(&request).await?;
    info!(
        "Admitted patient {} to {} with predicted stay {:?}",
        request.patient_id,
        request.facility,
        prediction.length_of_stay()
    );

    Ok(Json(AdmissionSubmitted {
        patient_id: request.patient_id,
        facility: request.facility,
        predicted_length_of_stay: prediction.length_of_stay(),
        message: "Admission form is submitted.",
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// 出院办理
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutParams {
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRow {
    pub eid: i64,
    pub facility: String,
    pub vdate: Option<NaiveDate>,
    pub pred_lengthofstay: Option<i64>,
    pub discharge: DischargeEntry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub search: String,
    pub patients: Page<CheckoutRow>,
    pub pagination: Vec<PageItem>,
    pub no_records: bool,
    pub navigation: Navigation,
}

/// 待出院患者列表
pub async fn checkout(
    State(state): State<AppState>,
    client: ClientSession,
    Query(params): Query<CheckoutParams>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::Checkout, &client.session) {
        return Ok(response);
    }

    let loader = state.mount("checkout");
    let rows = loader
        .load(state.backend.checkout_patients())
        .await
        .into_result()?;

    let search = params.search.unwrap_or_default();
    let matched: Vec<_> = search_checkout(&rows, search.trim())
        .into_iter()
        .cloned()
        .collect();
    let page = paginate(&matched, params.page.unwrap_or(1), state.views.checkout_page_size);
    let entries = state.discharge.snapshot().await;

    let items = page
        .items
        .iter()
        .map(|row| CheckoutRow {
            eid: row.eid,
            facility: row.facility_name().to_string(),
            vdate: row.vdate,
            pred_lengthofstay: row.pred_lengthofstay,
            discharge: entries.get(&row.eid).cloned().unwrap_or_default(),
        })
        .collect();

    Ok(Json(CheckoutView {
        no_records: page.total_items == 0,
        pagination: pagination_items(page.page, page.total_pages),
        patients: Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            start_index: page.start_index,
        },
        search,
        navigation: navigation(&client.session),
    })
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct DischargeStateView {
    pub eid: i64,
    #[serde(flatten)]
    pub entry: DischargeEntry,
}

/// 打开出院确认框
pub async fn confirm_discharge(
    State(state): State<AppState>,
    client: ClientSession,
    Path(eid): Path<i64>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::Checkout, &client.session) {
        return Ok(response);
    }
    let entry = state.discharge.request_confirmation(eid).await?;
    Ok(Json(DischargeStateView { eid, entry }).into_response())
}

/// 关闭出院确认框
pub async fn cancel_discharge(
    State(state): State<AppState>,
    client: ClientSession,
    Path(eid): Path<i64>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::Checkout, &client.session) {
        return Ok(response);
    }
    let entry = state.discharge.cancel(eid).await?;
    Ok(Json(DischargeStateView { eid, entry }).into_response())
}

/// 确认出院
pub async fn discharge_patient(
    State(state): State<AppState>,
    client: ClientSession,
    Path(eid): Path<i64>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::Checkout, &client.session) {
        return Ok(response);
    }
    let outcome: DischargeOutcome = state.discharge.discharge(eid).await?;
    Ok(Json(outcome).into_response())
}

// ---------------------------------------------------------------------------
// 管理看板
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub hospital: Option<String>,
    pub history: Option<String>,
    pub los: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub hospitals: Vec<String>,
    pub hospital: Option<String>,
    pub history_window: TimeWindow,
    pub los_window: TimeWindow,
    pub capacity: Vec<CapacityUsage>,
    pub gender: GenderDistribution,
    pub historical_admissions: Vec<MonthlyCount>,
    pub predicted_admissions: Vec<DailyCount>,
    pub length_of_stay: LosHistogram,
    pub navigation: Navigation,
}

fn parse_window(raw: Option<&str>) -> ApiResult<TimeWindow> {
    match raw.map(str::trim).filter(|w| !w.is_empty()) {
        None => Ok(TimeWindow::default()),
        Some(w) => Ok(w.parse()?),
    }
}

/// 管理看板
pub async fn admin_dashboard(
    State(state): State<AppState>,
    client: ClientSession,
    Query(params): Query<DashboardParams>,
) -> ApiResult<Response> {
    if let Some(response) = redirect_for(Route::AdminDashboard, &client.session) {
        return Ok(response);
    }

    let history_window = parse_window(params.history.as_deref())?;
    let los_window = parse_window(params.los.as_deref())?;

    let loader = state.mount("admin-dashboard");
    let snapshot = loader
        .load(fetch_snapshot(state.backend.as_ref()))
        .await
        .into_result()?;

    let lookup = FacilityLookup::new(&snapshot.facilities);
    let filter = HospitalFilter::from(params.hospital);
    if let Some(name) = filter.name() {
        if !lookup.contains_name(name) {
            return Err(OccupancyError::Validation(format!("Unknown hospital: {}", name)).into());
        }
    }

    let today = state.today();
    let patients = &snapshot.patients;
    info!(
        "Dashboard loaded for {} (history {}, los {})",
        filter.name().unwrap_or("all hospitals"),
        history_window.label(),
        los_window.label()
    );

    Ok(Json(DashboardView {
        hospitals: snapshot.facilities.iter().map(|f| f.name.clone()).collect(),
        hospital: filter.name().map(str::to_string),
        history_window,
        los_window,
        capacity: capacity_utilisation(&snapshot.facilities, patients, &filter, today),
        gender: gender_distribution(patients, &lookup, &filter),
        historical_admissions: historical_admissions(
            patients,
            &lookup,
            &filter,
            history_window,
            today,
        ),
        predicted_admissions: predicted_admissions(patients, &lookup, &filter, today),
        length_of_stay: length_of_stay_histogram(patients, &lookup, &filter, los_window, today),
        navigation: navigation(&client.session),
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_app;
    use crate::session::MemoryStorage;
    use axum::body::Body;
    use axum::http::Request;
    use occupancy_client::MemoryBackend;
    use occupancy_core::{Comorbidities, Facility, FacilityId, LabValues, Patient, Role};
    use serde_json::Value;
    use tower::ServiceExt;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn facility(id: i64, name: &str, capacity: i64, postcode: i64) -> Facility {
        Facility {
            facid: FacilityId(id),
            name: name.to_string(),
            capacity,
            postcode,
            address: format!("{} address", name),
            contact_no: "03-1234567".to_string(),
        }
    }

    fn patient(eid: i64, facid: i64, gender: Gender, admitted: &str, pred: i64) -> Patient {
        Patient {
            eid,
            facid: Some(FacilityId(facid)),
            gender,
            vdate: Some(d(admitted)),
            discharged: None,
            pred_lengthofstay: Some(pred),
            lengthofstay: None,
            rcount: Some("0".to_string()),
            secondarydiagnosisnonicd9: Some(0),
            comorbidities: Comorbidities::default(),
            labs: LabValues::default(),
        }
    }

    /// 路由、内存后端与当前客户端的会话标识
    struct TestApp {
        state: AppState,
        backend: Arc<MemoryBackend>,
        token: Option<String>,
    }

    async fn setup(role: Option<Role>) -> TestApp {
        let today = d("2024-06-10");
        let facilities = vec![
            facility(1, "Hospital A", 10, 50000),
            facility(2, "Hospital B", 0, 60000),
        ];
        let mut patients: Vec<Patient> = (1..=6)
            .map(|eid| patient(eid, 1, Gender::Male, "2024-06-08", 5))
            .collect();
        patients.push(patient(7, 1, Gender::Female, "2024-06-09", 3));
        let backend = Arc::new(MemoryBackend::new(facilities, patients, today));

        let session = Arc::new(
            SessionStore::restore(Arc::new(MemoryStorage::new()))
                .await
                .unwrap(),
        );
        let token = match role {
            Some(role) => Some(session.login(role).await.unwrap().0),
            None => None,
        };

        let state = AppState::new(
            backend.clone(),
            session,
            ViewConfig::default(),
            CancellationToken::new(),
        )
        .with_today(today);
        TestApp {
            state,
            backend,
            token,
        }
    }

    struct Reply {
        status: StatusCode,
        body: Value,
        location: Option<String>,
        cookie: Option<String>,
    }

    impl TestApp {
        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Reply {
            self.send_as(self.token.as_deref(), method, uri, body).await
        }

        async fn send_as(
            &self,
            token: Option<&str>,
            method: &str,
            uri: &str,
            body: Option<Value>,
        ) -> Reply {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(v) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            let response = create_app(self.state.clone())
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();

            let status = response.status();
            let header_value = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .map(|v| v.to_str().unwrap().to_string())
            };
            let location = header_value(header::LOCATION);
            let cookie = header_value(header::SET_COOKIE);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            Reply {
                status,
                body,
                location,
                cookie,
            }
        }
    }

    #[tokio::test]
    async fn test_home_lists_occupancy() {
        let app = setup(None).await;
        let reply = app.send("GET", "/?postcode=50010", None).await;

        assert_eq!(reply.status, StatusCode::OK);
        let rows = reply.body["facilities"]["items"].as_array().unwrap();
        assert_eq!(rows[0]["name"], "Hospital A");
        assert_eq!(rows[0]["index"], 1);
        assert_eq!(rows[0]["occupancyRate"], 70.0);
        assert_eq!(rows[0]["occupancyClass"], "occupancy-medium");
        assert_eq!(rows[1]["occupancyRate"], Value::Null);
        assert_eq!(reply.body["maxDate"], "2024-06-25");
        assert_eq!(reply.body["navigation"]["links"][1]["label"], "Staff Login");
    }

    #[tokio::test]
    async fn test_home_rejects_bad_inputs() {
        let app = setup(None).await;

        let reply = app.send("GET", "/?date=2024-07-30", None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["kind"], "validation");

        let reply = app.send("GET", "/?postcode=123456", None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_home_shows_backend_failure() {
        let app = setup(None).await;
        app.backend.set_offline(true).await;

        let reply = app.send("GET", "/", None).await;
        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
        assert!(reply.body["message"]
            .as_str()
            .unwrap()
            .contains("Unable to reach the server"));
    }

    #[tokio::test]
    async fn test_login_flow() {
        let app = setup(None).await;

        let reply = app
            .send(
                "POST",
                "/login",
                Some(json!({"username": "admin", "password": "wrong"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["message"], "Invalid username or password");
        assert_eq!(app.state.session.active_sessions().await, 0);

        let reply = app
            .send(
                "POST",
                "/login",
                Some(json!({"username": "admin", "password": "admin"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["redirect"], "/admin-dashboard");
        assert_eq!(reply.body["session"]["role"], "admin");
        let token = reply.body["sessionId"].as_str().unwrap().to_string();
        assert!(reply.cookie.unwrap().starts_with(&format!("occupancy_session={}", token)));

        let reply = app.send_as(Some(&token), "GET", "/login", None).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some("/admin-dashboard"));

        let reply = app.send_as(Some(&token), "POST", "/logout", None).await;
        assert_eq!(reply.body["redirect"], "/");
        assert!(reply.cookie.unwrap().contains("Max-Age=0"));
        assert!(!app.state.session.current(Some(&token)).await.logged_in);
    }

    #[tokio::test]
    async fn test_login_does_not_authenticate_other_clients() {
        let app = setup(None).await;

        let reply = app
            .send(
                "POST",
                "/login",
                Some(json!({"username": "admin", "password": "admin"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        let token = reply.body["sessionId"].as_str().unwrap().to_string();

        let reply = app.send_as(None, "GET", "/admin-dashboard", None).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some("/login"));

        let reply = app.send_as(Some("someone-else"), "GET", "/admin-dashboard", None).await;
        assert_eq!(reply.location.as_deref(), Some("/login"));

        let reply = app.send_as(Some(&token), "GET", "/admin-dashboard", None).await;
        assert_eq!(reply.status, StatusCode::OK);

        let reply = app.send_as(None, "GET", "/nav", None).await;
        assert_eq!(reply.body["session"]["loggedIn"], false);
    }

    #[tokio::test]
    async fn test_guard_redirects() {
        let app = setup(None).await;
        let reply = app.send("GET", "/checkout", None).await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some("/login"));

        let app = setup(Some(Role::Admin)).await;
        let reply = app.send("GET", "/admission-form", None).await;
        assert_eq!(reply.location.as_deref(), Some("/admin-dashboard"));
    }

    #[tokio::test]
    async fn test_admission_form_submission() {
        let app = setup(Some(Role::Nurse)).await;

        let reply = app.send("GET", "/admission-form", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["patientId"], 8);
        assert_eq!(reply.body["facilities"], json!(["Hospital A", "Hospital B"]));

        let reply = app
            .send(
                "POST",
                "/admission-form",
                Some(json!({"facility": "Hospital A", "gender": "Male"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(reply.body["firstInvalidField"], "rcount");
        assert_eq!(reply.body["fields"]["rcount"], "Please select a readmission count");

        let form = json!({
            "facility": "Hospital A", "gender": "Male", "rcount": "1",
            "secondarydiagnosisnonicd9": "2", "hemoglobin": "13", "leukocytes": "7",
            "sodium": "140", "glucose": "100", "bloodureanitro": "12",
            "creatinine": "1", "bmi": "25", "pulse": "70", "respiration": "6"
        });
        let reply = app.send("POST", "/admission-form", Some(form)).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Admission form is submitted.");
        assert_eq!(reply.body["predictedLengthOfStay"], 3);
        assert!(app.backend.patient(8).await.is_some());
    }

    #[tokio::test]
    async fn test_checkout_discharge_flow() {
        let app = setup(Some(Role::Nurse)).await;

        let reply = app.send("GET", "/checkout?page=2", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["patients"]["totalItems"], 7);
        assert_eq!(reply.body["patients"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(reply.body["pagination"], json!([1, 2]));

        let reply = app.send("POST", "/checkout/7/confirm", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "awaiting_confirmation");

        let reply = app.send("POST", "/checkout/7/discharge", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["result"], "discharged");
        assert_eq!(reply.body["lengthOfStay"], 1);
        assert_eq!(reply.body["remaining"].as_array().unwrap().len(), 6);

        let reply = app.send("POST", "/checkout/7/discharge", None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["result"], "already_discharged");

        let reply = app.send("POST", "/checkout/7/confirm", None).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);

        let reply = app.send("POST", "/checkout/1/discharge", None).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body["kind"], "workflow");

        let reply = app.send("GET", "/checkout?search=zzz", None).await;
        assert_eq!(reply.body["noRecords"], true);
    }

    #[tokio::test]
    async fn test_admin_dashboard() {
        let app = setup(Some(Role::Admin)).await;

        let reply = app
            .send("GET", "/admin-dashboard?hospital=Hospital%20A&history=6m", None)
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["hospital"], "Hospital A");
        assert_eq!(reply.body["historyWindow"], "6m");
        assert_eq!(reply.body["gender"]["male"], 6);
        assert_eq!(reply.body["gender"]["female"], 1);
        assert_eq!(reply.body["capacity"].as_array().unwrap().len(), 1);

        let reply = app.send("GET", "/admin-dashboard?los=2w", None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        let reply = app.send("GET", "/admin-dashboard?hospital=Nowhere", None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cancelled_view_is_not_applied() {
        let app = setup(Some(Role::Admin)).await;
        app.state.shutdown.cancel();

        let reply = app.send("GET", "/admin-dashboard", None).await;
        assert_eq!(reply.status, StatusCode::CONFLICT);
        assert_eq!(reply.body["kind"], "workflow");
    }
}
