//! 到场 / 核验流程 - 流程层
//!
//! 核心职责：定义"一次扫码"的完整处理流程
//!
//! 流程顺序：
//! 1. 到场扫码 → 状态机登记 → 重复扫码折叠为"已办理"
//! 2. 核验扫码 → 状态机核验 → 前置失败原样返回给终端
//!
//! 公示大屏是面向考生的自助入口：重复扫码不是错误，
//! 折叠成带标记的成功响应，由大屏渲染"您已完成登记"。

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::services::notifier::Notifier;
use crate::services::state_machine::ApplicantStateMachine;
use crate::store::{ApplicantStore, CheckpointSink, TeacherStore};
use crate::workflow::checkin_ctx::CheckinCtx;

/// 到场扫码的处理结果
#[derive(Debug, Clone)]
pub struct ArrivalOutcome {
    pub applicant: Applicant,
    /// 是否属于重复扫码（考生早已到场 / 已走到后续环节）
    pub already_processed: bool,
}

/// 到场 / 核验流程
pub struct CheckinFlow<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    machine: Arc<ApplicantStateMachine<S, N>>,
}

impl<S, N> CheckinFlow<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    pub fn new(machine: Arc<ApplicantStateMachine<S, N>>) -> Self {
        Self { machine }
    }

    /// 到场扫码
    ///
    /// 首次扫码执行登记转换；考生状态已越过 ARRIVED 时
    /// 折叠为 `already_processed = true` 的成功响应。
    pub async fn scan_arrival(
        &self,
        application_number: &str,
        ctx: &CheckinCtx,
    ) -> AppResult<ArrivalOutcome> {
        match self
            .machine
            .mark_arrived(application_number, ctx.actor.clone())
            .await
        {
            Ok(applicant) => Ok(ArrivalOutcome {
                applicant,
                already_processed: false,
            }),
            Err(AppError::PreconditionFailed { current, .. })
                if current >= ApplicantStatus::Arrived =>
            {
                info!(
                    "[申请 {}] {} 重复扫码，当前状态 {}，按已办理返回",
                    application_number, ctx, current
                );
                let applicant = self.machine.load(application_number).await?;
                Ok(ArrivalOutcome {
                    applicant,
                    already_processed: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// 核验扫码
    ///
    /// 前置失败（未到场 / 已核验）原样返回，由核验终端
    /// 渲染"尚未到场"或"已核验"的提示，不折叠。
    pub async fn scan_verification(
        &self,
        application_number: &str,
        ctx: &CheckinCtx,
    ) -> AppResult<Applicant> {
        self.machine
            .verify_documents(application_number, ctx.actor.clone())
            .await
    }
}
