//! 床位占用看板演示程序
//!
//! 使用内存后端演示：
//! - 首页机构占用率
//! - 管理看板的各项统计
//! - 出院办理工作流

use anyhow::Result;
use chrono::{Local, NaiveDate};
use occupancy_analytics::{
    capacity_utilisation, gender_distribution, historical_admissions, length_of_stay_histogram,
    occupancy_rate, predicted_admissions, sort_by_postcode_proximity, FacilityLookup,
    HospitalFilter, OccupancyClass, TimeWindow,
};
use occupancy_client::{fetch_snapshot, BackendApi, DischargeWorkflow, MemoryBackend};
use occupancy_core::utils::add_days;
use occupancy_core::{Comorbidities, Facility, FacilityId, Gender, LabValues, Patient};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("🏥 启动床位占用看板演示");

    let today = Local::now().date_naive();
    let backend = Arc::new(MemoryBackend::new(seed_facilities(), seed_patients(today), today));

    // 1. 首页占用率
    demo_home(backend.as_ref(), today).await?;

    // 2. 管理看板
    demo_dashboard(backend.as_ref(), today).await?;

    // 3. 出院办理
    demo_discharge(backend.clone()).await?;

    info!("✅ 演示完成");
    Ok(())
}

/// 演示首页占用率
async fn demo_home(backend: &dyn BackendApi, today: NaiveDate) -> Result<()> {
    info!("📋 首页占用率（按邮编 50400 就近排序）");

    let snapshot = fetch_snapshot(backend).await?;
    let mut facilities = snapshot.facilities;
    sort_by_postcode_proximity(&mut facilities, Some(50400));

    for facility in &facilities {
        match occupancy_rate(facility, &snapshot.patients, today) {
            Ok(rate) => info!(
                "  {:<28} {:>6.2}% {}",
                facility.name,
                rate,
                OccupancyClass::from_rate(rate).css_class()
            ),
            Err(e) => warn!("  {:<28} 无法计算: {}", facility.name, e),
        }
    }
    Ok(())
}

/// 演示管理看板
async fn demo_dashboard(backend: &dyn BackendApi, today: NaiveDate) -> Result<()> {
    info!("📊 管理看板");

    let snapshot = fetch_snapshot(backend).await?;
    let lookup = FacilityLookup::new(&snapshot.facilities);
    let filter = HospitalFilter::all();
    let patients = &snapshot.patients;

    for usage in capacity_utilisation(&snapshot.facilities, patients, &filter, today) {
        info!(
            "  {} 床位 {}/{}{}",
            usage.hospital,
            usage.occupied,
            usage.capacity,
            if usage.over_capacity { " (超出容量)" } else { "" }
        );
    }

    let gender = gender_distribution(patients, &lookup, &filter);
    info!(
        "  在院性别分布: 男 {} / 女 {} / 未知 {}",
        gender.male, gender.female, gender.unknown
    );

    for month in historical_admissions(patients, &lookup, &filter, TimeWindow::SixMonths, today) {
        info!("  {} 入院 {} 人", month.month, month.count);
    }

    let predicted = predicted_admissions(patients, &lookup, &filter, today);
    info!("  未来预测在院天数: {} 天", predicted.len());

    let histogram =
        length_of_stay_histogram(patients, &lookup, &filter, TimeWindow::OneYear, today);
    for bin in &histogram.counts {
        info!("  住院 [{}, {}) 天: {}", bin.lower, bin.upper, bin.count);
    }
    Ok(())
}

/// 演示出院办理
async fn demo_discharge(backend: Arc<MemoryBackend>) -> Result<()> {
    info!("🚪 出院办理");

    let workflow = DischargeWorkflow::new(backend.clone());
    let before = backend.checkout_patients().await?;
    info!("  待出院患者: {} 人", before.len());

    let Some(first) = before.first() else {
        warn!("  没有在院患者");
        return Ok(());
    };

    workflow.request_confirmation(first.eid).await?;
    let outcome = workflow.discharge(first.eid).await?;
    info!(
        "  患者 {} 已出院，住院 {:?} 天，剩余 {} 人",
        outcome.eid,
        outcome.length_of_stay,
        outcome.remaining.map_or(0, |rows| rows.len())
    );

    backend.set_offline(true).await;
    if let Some(next) = before.get(1) {
        workflow.request_confirmation(next.eid).await?;
        if let Err(e) = workflow.discharge(next.eid).await {
            let entry = workflow.status(next.eid).await;
            warn!("  患者 {} 出院失败 ({:?}): {}", next.eid, entry.status, e);
        }
    }
    backend.set_offline(false).await;
    Ok(())
}

fn seed_facilities() -> Vec<Facility> {
    [
        (1, "Hospital Kuala Lumpur", 40, 50586),
        (2, "Hospital Selayang", 25, 68100),
        (3, "Hospital Putrajaya", 20, 62250),
        (4, "Klinik Kesihatan Sentul", 0, 51000),
    ]
    .into_iter()
    .map(|(id, name, capacity, postcode)| Facility {
        facid: FacilityId(id),
        name: name.to_string(),
        capacity,
        postcode,
        address: format!("{} {}", postcode, name),
        contact_no: format!("03-{:07}", id * 1111111),
    })
    .collect()
}

fn seed_patients(today: NaiveDate) -> Vec<Patient> {
    (1..=60)
        .map(|eid| {
            let facid = eid % 3 + 1;
            let admitted = add_days(today, -(eid * 4 % 200));
            let predicted = eid % 9 + 1;
            let discharged = (eid % 4 != 0).then(|| add_days(admitted, predicted));
            Patient {
                eid,
                facid: Some(FacilityId(facid)),
                gender: match eid % 5 {
                    0 => Gender::Unknown,
                    1 | 3 => Gender::Female,
                    _ => Gender::Male,
                },
                vdate: Some(admitted),
                discharged,
                pred_lengthofstay: Some(predicted),
                lengthofstay: discharged.map(|_| predicted),
                rcount: Some((eid % 5).to_string()),
                secondarydiagnosisnonicd9: Some(eid % 10),
                comorbidities: Comorbidities {
                    asthma: eid % 7 == 0,
                    ..Default::default()
                },
                labs: LabValues {
                    hemoglobin: Some(12.0 + (eid % 4) as f64),
                    ..Default::default()
                },
            }
        })
        .collect()
}
