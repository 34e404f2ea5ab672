//! 面试组流程 - 流程层
//!
//! 核心职责：面试组设备的每个特权动作都先过会话闸门
//!
//! 流程顺序：
//! 1. 校验组号（正整数，不信任上游）
//! 2. 校验会话（令牌 → 教师 → 组号 → 有效期，宁可拒绝）
//! 3. 执行状态机操作，审计元数据带上确认教师

use std::sync::Arc;

use crate::error::AppResult;
use crate::models::applicant::Applicant;
use crate::models::teacher::PanelNumber;
use crate::services::notifier::Notifier;
use crate::services::panel_session::{AssignOutcome, ConfirmOutcome, PanelSessionService};
use crate::services::state_machine::ApplicantStateMachine;
use crate::store::{ApplicantStore, CheckpointSink, TeacherStore};

/// 面试组流程
///
/// - 编排"会话校验 → 状态转换"的固定顺序
/// - 不持有任何表数据，只依赖业务能力（services）
pub struct PanelFlow<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    session: PanelSessionService<S>,
    machine: Arc<ApplicantStateMachine<S, N>>,
}

impl<S, N> PanelFlow<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    pub fn new(
        session: PanelSessionService<S>,
        machine: Arc<ApplicantStateMachine<S, N>>,
    ) -> Self {
        Self { session, machine }
    }

    /// 设备确认身份（登录 / 续期）
    pub async fn confirm_identity(
        &self,
        panel: i64,
        teacher_id: &str,
        device_id: &str,
        existing_token: Option<&str>,
    ) -> AppResult<ConfirmOutcome> {
        let panel = PanelNumber::new(panel)?;
        self.session
            .confirm_identity(panel, teacher_id, device_id, existing_token)
            .await
    }

    /// 改座（管理 / 自助换组）
    pub async fn assign_teacher(
        &self,
        panel: i64,
        teacher_id: &str,
        remove_teacher_id: Option<&str>,
    ) -> AppResult<AssignOutcome> {
        let panel = PanelNumber::new(panel)?;
        self.session
            .assign_teacher_to_panel(panel, teacher_id, remove_teacher_id)
            .await
    }

    /// 检索考生（开始 / 完成面试前的扫码查询）
    pub async fn search(
        &self,
        panel: i64,
        session_token: &str,
        application_number: &str,
    ) -> AppResult<Applicant> {
        let panel = PanelNumber::new(panel)?;
        self.session.validate_session(panel, session_token).await?;
        self.machine.lookup_for_panel(application_number).await
    }

    /// 开始面试
    pub async fn start_interview(
        &self,
        panel: i64,
        session_token: &str,
        application_number: &str,
    ) -> AppResult<Applicant> {
        let panel = PanelNumber::new(panel)?;
        let teacher = self.session.validate_session(panel, session_token).await?;
        self.machine
            .start_interview(application_number, panel, &teacher)
            .await
    }

    /// 完成面试
    pub async fn complete_interview(
        &self,
        panel: i64,
        session_token: &str,
        application_number: &str,
    ) -> AppResult<Applicant> {
        let panel = PanelNumber::new(panel)?;
        let teacher = self.session.validate_session(panel, session_token).await?;
        self.machine
            .complete_interview(application_number, panel, &teacher)
            .await
    }
}
