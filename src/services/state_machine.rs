//! 考生状态机 - 业务能力层
//!
//! 核心职责：一次只处理一名考生的状态转换
//!
//! 转换顺序：
//! REGISTERED → ARRIVED → DOCUMENT_VERIFIED → INTERVIEW_IN_PROGRESS → INTERVIEW_COMPLETED
//!
//! 约定：
//! - 每个转换都是"期望状态 + 条件写"，原子性由存储层保证
//! - 重复提交返回携带真实当前状态的 PreconditionFailed
//! - 条件写成功之后才执行检查点 / 短信等旁路动作，
//!   每个旁路动作各自捕获记录，绝不影响已定的转换结果

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::models::checkpoint::{ActorRef, CheckpointType};
use crate::models::teacher::PanelNumber;
use crate::services::checkpoint_ledger::CheckpointLedger;
use crate::services::notifier::{Notifier, SmsTemplate};
use crate::services::panel_session::SessionTeacher;
use crate::store::{ApplicantStore, CheckpointSink, StatusPatch, TeacherStore};

/// 报名号格式：字母数字开头，允许字母数字、横线、斜线
const APPLICATION_NUMBER_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9/\-]*$";

/// 短信旁路的硬超时：转换已落库，网关挂死不能拖住签到响应
const SMS_DISPATCH_TIMEOUT: Duration = Duration::from_secs(3);

/// 考生状态机
pub struct ApplicantStateMachine<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    store: Arc<S>,
    ledger: CheckpointLedger<S>,
    notifier: Arc<N>,
    application_number_pattern: Regex,
}

impl<S, N> ApplicantStateMachine<S, N>
where
    S: ApplicantStore + TeacherStore + CheckpointSink,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            ledger: CheckpointLedger::new(Arc::clone(&store)),
            store,
            notifier,
            application_number_pattern: Regex::new(APPLICATION_NUMBER_PATTERN)
                .expect("内置报名号正则"),
        }
    }

    /// 报名号格式校验（上游校验过也再拒一次，不信任输入）
    fn validate_application_number(&self, raw: &str) -> AppResult<()> {
        if raw.is_empty() || !self.application_number_pattern.is_match(raw) {
            return Err(AppError::InvalidInput {
                field: "application_number",
                value: raw.to_string(),
                reason: "报名号格式不合法".to_string(),
            });
        }
        Ok(())
    }

    /// 按报名号读取考生（只读）
    pub async fn load(&self, application_number: &str) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;
        self.store.get_applicant(application_number).await
    }

    /// 登记到场：REGISTERED → ARRIVED
    ///
    /// # 参数
    /// - `application_number`: 报名号
    /// - `actor`: 操作主体（志愿者扫码 / 公示大屏自助）
    pub async fn mark_arrived(
        &self,
        application_number: &str,
        actor: ActorRef,
    ) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;

        let applicant = self
            .store
            .update_applicant_status(
                application_number,
                ApplicantStatus::Registered,
                ApplicantStatus::Arrived,
                StatusPatch {
                    arrived_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!("[申请 {}] ✓ 已登记到场", application_number);

        // ========== 条件写已成功，以下全部尽力而为 ==========
        self.ledger
            .record(
                application_number,
                CheckpointType::Arrival,
                actor.clone(),
                json!({
                    "previous_status": ApplicantStatus::Registered.as_str(),
                    "new_status": ApplicantStatus::Arrived.as_str(),
                    "source": actor.to_string(),
                }),
            )
            .await;
        self.dispatch_sms(
            &applicant,
            SmsTemplate::Arrival,
            vec![
                ("name", applicant.name.clone()),
                ("next_venue", applicant.instructions.clone()),
            ],
        )
        .await;

        Ok(applicant)
    }

    /// 材料核验：ARRIVED → DOCUMENT_VERIFIED
    pub async fn verify_documents(
        &self,
        application_number: &str,
        actor: ActorRef,
    ) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;

        let applicant = self
            .store
            .update_applicant_status(
                application_number,
                ApplicantStatus::Arrived,
                ApplicantStatus::DocumentVerified,
                StatusPatch {
                    document_verified_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!("[申请 {}] ✓ 材料核验完成", application_number);

        self.ledger
            .record(
                application_number,
                CheckpointType::DocumentVerification,
                actor.clone(),
                json!({
                    "previous_status": ApplicantStatus::Arrived.as_str(),
                    "new_status": ApplicantStatus::DocumentVerified.as_str(),
                    "source": actor.to_string(),
                }),
            )
            .await;
        self.dispatch_sms(
            &applicant,
            SmsTemplate::Verified,
            vec![("name", applicant.name.clone())],
        )
        .await;

        Ok(applicant)
    }

    /// 开始面试：DOCUMENT_VERIFIED → INTERVIEW_IN_PROGRESS
    ///
    /// 清空上一轮的面试记名；已在面试中的考生再次调用本转换
    /// 会得到 PreconditionFailed（不提供跨设备"续面"路径）。
    pub async fn start_interview(
        &self,
        application_number: &str,
        panel: PanelNumber,
        confirmed_by: &SessionTeacher,
    ) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;

        let applicant = self
            .store
            .update_applicant_status(
                application_number,
                ApplicantStatus::DocumentVerified,
                ApplicantStatus::InterviewInProgress,
                StatusPatch {
                    interviewed_by_emails: Some(None),
                    assigned_panel_id: Some(panel.get()),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "[申请 {}] ✓ 第 {} 组开始面试（确认人: {}）",
            application_number, panel, confirmed_by.name
        );

        self.ledger
            .record(
                application_number,
                CheckpointType::InterviewStarted,
                ActorRef::Panel(panel),
                json!({
                    "previous_status": ApplicantStatus::DocumentVerified.as_str(),
                    "new_status": ApplicantStatus::InterviewInProgress.as_str(),
                    "panel": panel.get(),
                    "confirmed_by": confirmed_by.name,
                }),
            )
            .await;

        Ok(applicant)
    }

    /// 完成面试：INTERVIEW_IN_PROGRESS → INTERVIEW_COMPLETED
    ///
    /// 记名教师 = {确认会话的教师邮箱} ∪ {当前挂接在该组的在岗教师邮箱}，
    /// 去重后逗号拼接。组内名单查询失败时退化为只记确认教师；
    /// 结果为空集时保持 None（上游即为宽松语义）。
    pub async fn complete_interview(
        &self,
        application_number: &str,
        panel: PanelNumber,
        confirmed_by: &SessionTeacher,
    ) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;

        let credited = self.credited_emails(panel, confirmed_by).await;

        let applicant = self
            .store
            .update_applicant_status(
                application_number,
                ApplicantStatus::InterviewInProgress,
                ApplicantStatus::InterviewCompleted,
                StatusPatch {
                    interviewed_at: Some(Utc::now()),
                    interviewed_by_emails: Some(credited.clone()),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "[申请 {}] ✓ 第 {} 组面试完成（记名: {}）",
            application_number,
            panel,
            credited.as_deref().unwrap_or("无")
        );

        self.ledger
            .record(
                application_number,
                CheckpointType::InterviewCompleted,
                ActorRef::Panel(panel),
                json!({
                    "previous_status": ApplicantStatus::InterviewInProgress.as_str(),
                    "new_status": ApplicantStatus::InterviewCompleted.as_str(),
                    "panel": panel.get(),
                    "confirmed_by": confirmed_by.name,
                    "credited_emails": credited,
                }),
            )
            .await;
        self.dispatch_sms(
            &applicant,
            SmsTemplate::Completed,
            vec![("name", applicant.name.clone())],
        )
        .await;

        Ok(applicant)
    }

    /// 面试组检索（只读）：仅 DOCUMENT_VERIFIED / INTERVIEW_IN_PROGRESS 可见
    pub async fn lookup_for_panel(&self, application_number: &str) -> AppResult<Applicant> {
        self.validate_application_number(application_number)?;
        let applicant = self.store.get_applicant(application_number).await?;
        match applicant.status {
            ApplicantStatus::DocumentVerified | ApplicantStatus::InterviewInProgress => {
                Ok(applicant)
            }
            current => Err(AppError::precondition_failed(
                application_number,
                current,
                ApplicantStatus::DocumentVerified,
            )),
        }
    }

    /// 计算记名教师邮箱集合
    async fn credited_emails(
        &self,
        panel: PanelNumber,
        confirmed_by: &SessionTeacher,
    ) -> Option<String> {
        let mut emails = BTreeSet::new();
        if !confirmed_by.email.is_empty() {
            emails.insert(confirmed_by.email.clone());
        }

        match self.store.list_panel_teachers(panel).await {
            Ok(roster) => {
                for teacher in roster {
                    if teacher.active && !teacher.email.is_empty() {
                        emails.insert(teacher.email);
                    }
                }
            }
            Err(e) => {
                // 名单查询失败退化为只记确认教师
                warn!("⚠️ 第 {} 组教师名单查询失败（退化处理）: {}", panel, e);
            }
        }

        if emails.is_empty() {
            None
        } else {
            Some(emails.into_iter().collect::<Vec<_>>().join(","))
        }
    }

    /// 发送转换后短信（尽力而为，等待上限见 `SMS_DISPATCH_TIMEOUT`）
    async fn dispatch_sms(
        &self,
        applicant: &Applicant,
        template: SmsTemplate,
        params: Vec<(&'static str, String)>,
    ) {
        if applicant.phone.is_empty() {
            return;
        }
        let send = self.notifier.send(&applicant.phone, template, &params);
        match tokio::time::timeout(SMS_DISPATCH_TIMEOUT, send).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    "[申请 {}] ⚠️ 短信发送失败（已忽略）: {}",
                    applicant.application_number, e
                );
            }
            Err(_) => {
                warn!(
                    "[申请 {}] ⚠️ 短信发送超过 {} 秒未返回（已放弃）",
                    applicant.application_number,
                    SMS_DISPATCH_TIMEOUT.as_secs()
                );
            }
        }
    }
}
