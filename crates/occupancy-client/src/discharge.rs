//! 出院办理工作流
//!
//! 每个患者一条状态记录，状态转换由转换表约束。确认出院时先在同一把写锁内
//! 完成在途检查与 `Submitting` 转换，再在独立任务中核对在院列表并调用后端；
//! 成功后重新拉取待出院列表。

use occupancy_core::{CheckoutPatient, OccupancyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::api::BackendApi;

/// 出院办理状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeStatus {
    #[default]
    Ongoing,
    AwaitingConfirmation,
    Submitting,
    Discharged,
    Failed,
}

/// 状态转换事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeEvent {
    RequestConfirmation,
    Confirm,
    Cancel,
    Succeeded,
    Rejected,
}

/// 出院状态机
#[derive(Debug)]
pub struct DischargeStateMachine {
    transitions: HashMap<(DischargeStatus, DischargeEvent), DischargeStatus>,
}

impl DischargeStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        use DischargeEvent::*;
        use DischargeStatus::*;

        let mut transitions = HashMap::new();
        transitions.insert((Ongoing, RequestConfirmation), AwaitingConfirmation);
        transitions.insert((AwaitingConfirmation, Cancel), Ongoing);
        transitions.insert((AwaitingConfirmation, Confirm), Submitting);
        transitions.insert((Submitting, Succeeded), Discharged);
        transitions.insert((Submitting, Rejected), Failed);
        transitions.insert((Failed, Confirm), Submitting);
        transitions.insert((Failed, Cancel), Ongoing);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: DischargeStatus, event: DischargeEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: DischargeStatus, event: DischargeEvent) -> Result<DischargeStatus> {
        self.transitions
            .get(&(from, event))
            .copied()
            .ok_or_else(|| OccupancyError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            })
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: DischargeStatus) -> Vec<DischargeEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for DischargeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个患者的出院办理记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DischargeEntry {
    pub status: DischargeStatus,
    /// 最近一次失败的提示，确认框保持打开时重新展示
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeResult {
    Discharged,
    AlreadyDischarged,
}

/// 一次确认出院的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeOutcome {
    pub eid: i64,
    pub result: DischargeResult,
    pub length_of_stay: Option<i64>,
    /// 出院后重新拉取的待出院列表
    pub remaining: Option<Vec<CheckoutPatient>>,
    /// 重新拉取列表失败时的提示；出院本身已成功
    pub refresh_error: Option<String>,
}

impl DischargeOutcome {
    fn already_discharged(eid: i64) -> Self {
        Self {
            eid,
            result: DischargeResult::AlreadyDischarged,
            length_of_stay: None,
            remaining: None,
            refresh_error: None,
        }
    }
}

/// 出院办理工作流
///
/// 是否已出院以后端的在院列表为准；本地记录只保存确认框与提交中的状态，
/// 出院成功并刷新列表后即删除。
pub struct DischargeWorkflow {
    inner: Arc<WorkflowInner>,
}

struct WorkflowInner {
    backend: Arc<dyn BackendApi>,
    machine: DischargeStateMachine,
    entries: RwLock<HashMap<i64, DischargeEntry>>,
}

impl DischargeWorkflow {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            inner: Arc::new(WorkflowInner {
                backend,
                machine: DischargeStateMachine::new(),
                entries: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub async fn status(&self, eid: i64) -> DischargeEntry {
        self.inner
            .entries
            .read()
            .await
            .get(&eid)
            .cloned()
            .unwrap_or_default()
    }

    /// 所有非默认状态的记录
    pub async fn snapshot(&self) -> HashMap<i64, DischargeEntry> {
        self.inner.entries.read().await.clone()
    }

    /// 打开确认框；不在院的患者不能办理
    pub async fn request_confirmation(&self, eid: i64) -> Result<DischargeEntry> {
        if !self.inner.is_ongoing(eid).await? {
            self.inner.forget(eid).await;
            warn!("Patient {} is not ongoing, confirmation refused", eid);
            return Err(OccupancyError::Workflow(format!(
                "Patient {} is no longer an ongoing patient",
                eid
            )));
        }
        self.inner.apply(eid, DischargeEvent::RequestConfirmation).await
    }

    /// 关闭确认框，清除上一次的失败提示
    pub async fn cancel(&self, eid: i64) -> Result<DischargeEntry> {
        let entry = self.inner.apply(eid, DischargeEvent::Cancel).await?;
        self.inner.entries.write().await.remove(&eid);
        Ok(entry)
    }

    /// 确认出院
    ///
    /// 提交在独立任务中完成，调用方中途放弃（如客户端断开）时记录仍会
    /// 落到 `Discharged` 或 `Failed`，不会停留在 `Submitting`。
    pub async fn discharge(&self, eid: i64) -> Result<DischargeOutcome> {
        if self.status(eid).await.status == DischargeStatus::Ongoing
            && !self.inner.is_ongoing(eid).await?
        {
            self.inner.forget(eid).await;
            info!("Patient {} is already discharged", eid);
            return Ok(DischargeOutcome::already_discharged(eid));
        }

        {
            let mut entries = self.inner.entries.write().await;
            let current = entries.get(&eid).map(|e| e.status).unwrap_or_default();
            let next = self.inner.machine.transition(current, DischargeEvent::Confirm)?;
            entries.insert(
                eid,
                DischargeEntry {
                    status: next,
                    error: None,
                },
            );
        }

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.submit(eid).await })
            .await
            .map_err(|e| {
                OccupancyError::Internal(format!("Discharge task for patient {} failed: {}", eid, e))
            })?
    }
}

impl WorkflowInner {
    async fn is_ongoing(&self, eid: i64) -> Result<bool> {
        let rows = self.backend.checkout_patients().await?;
        Ok(rows.iter().any(|row| row.eid == eid))
    }

    /// 删除已失效的记录；提交中的记录由提交任务收尾
    async fn forget(&self, eid: i64) {
        let mut entries = self.entries.write().await;
        if entries.get(&eid).map(|e| e.status) != Some(DischargeStatus::Submitting) {
            entries.remove(&eid);
        }
    }

    async fn submit(&self, eid: i64) -> Result<DischargeOutcome> {
        let receipt = match self.is_ongoing(eid).await {
            Ok(false) => {
                self.entries.write().await.remove(&eid);
                info!("Patient {} was discharged elsewhere", eid);
                return Ok(DischargeOutcome::already_discharged(eid));
            }
            Ok(true) => self.backend.discharge_patient(eid).await,
            Err(err) => Err(err),
        };

        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(err) => {
                error!("Error discharging patient {}: {}", eid, err);
                let mut entries = self.entries.write().await;
                let entry = entries.entry(eid).or_default();
                entry.status = self.machine.transition(entry.status, DischargeEvent::Rejected)?;
                entry.error = Some(err.user_message());
                return Err(err);
            }
        };

        self.apply(eid, DischargeEvent::Succeeded).await?;
        info!("Discharged patient {} after {:?} days", eid, receipt.length_of_stay);

        let (remaining, refresh_error) = match self.backend.checkout_patients().await {
            Ok(rows) => {
                self.entries.write().await.remove(&eid);
                (Some(rows), None)
            }
            Err(err) => {
                warn!("Failed to refresh checkout list after discharge: {}", err);
                (None, Some(err.user_message()))
            }
        };

        Ok(DischargeOutcome {
            eid,
            result: DischargeResult::Discharged,
            length_of_stay: receipt.length_of_stay,
            remaining,
            refresh_error,
        })
    }

    async fn apply(&self, eid: i64, event: DischargeEvent) -> Result<DischargeEntry> {
        let mut entries = self.entries.write().await;
        let current = entries.get(&eid).map(|e| e.status).unwrap_or_default();
        let next = self.machine.transition(current, event)?;
        let entry = entries.entry(eid).or_default();
        entry.status = next;
        Ok(entry.clone())
    }
}
