//! 记录存储层 - 基础设施层
//!
//! 持有共享的考生 / 教师 / 检查点数据，只向上暴露窄接口。
//! 状态机的全部并发安全都压在 `update_applicant_status` 的
//! 条件写语义上：期望状态检查与写入必须是同一个不可分割的操作。

pub mod memory;

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::models::checkpoint::Checkpoint;
use crate::models::teacher::{PanelNumber, Teacher};

/// 考生状态条件更新的补丁
///
/// 时间戳与记名字段使用双层 Option：外层 None 表示不动，
/// `interviewed_by_emails` 的 `Some(None)` 表示显式清空（面试重启）。
#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub arrived_at: Option<DateTime<Utc>>,
    pub document_verified_at: Option<DateTime<Utc>>,
    pub interviewed_at: Option<DateTime<Utc>>,
    pub interviewed_by_emails: Option<Option<String>>,
    pub assigned_panel_id: Option<u32>,
}

/// 教师面试组字段的更新补丁
///
/// 外层 None 表示不动，`Some(None)` 表示清空该字段。
#[derive(Debug, Clone, Default)]
pub struct TeacherPanelPatch {
    pub panel: Option<Option<PanelNumber>>,
    pub session_token: Option<Option<String>>,
    pub device_id: Option<Option<String>>,
    pub last_confirmed_at: Option<Option<DateTime<Utc>>>,
}

impl TeacherPanelPatch {
    /// 清空全部面试组字段（移除 / 重新落座时使用）
    pub fn clear_all() -> Self {
        Self {
            panel: Some(None),
            session_token: Some(None),
            device_id: Some(None),
            last_confirmed_at: Some(None),
        }
    }
}

/// 考生存储能力
#[allow(async_fn_in_trait)]
pub trait ApplicantStore: Send + Sync {
    /// 按报名号读取考生，不存在返回 `NotFound`
    async fn get_applicant(&self, application_number: &str) -> AppResult<Applicant>;

    /// 写入 / 覆盖考生记录（批量导入、自助注册）
    ///
    /// # 返回
    /// 新插入返回 true，覆盖已有记录返回 false
    async fn put_applicant(&self, applicant: Applicant) -> AppResult<bool>;

    /// 条件状态更新（整个系统唯一的并发关键路径）
    ///
    /// 检查当前状态等于 `expected` 并写入 `new_status` + 补丁，
    /// 作为一个不可分割的操作执行。状态不符返回携带真实当前
    /// 状态的 `PreconditionFailed`，并发竞争下恰有一方胜出。
    async fn update_applicant_status(
        &self,
        application_number: &str,
        expected: ApplicantStatus,
        new_status: ApplicantStatus,
        patch: StatusPatch,
    ) -> AppResult<Applicant>;
}

/// 教师存储能力
#[allow(async_fn_in_trait)]
pub trait TeacherStore: Send + Sync {
    async fn get_teacher(&self, teacher_id: &str) -> AppResult<Teacher>;

    /// 写入 / 覆盖教师记录（管理侧建档）
    async fn put_teacher(&self, teacher: Teacher) -> AppResult<()>;

    /// 按会话令牌反查教师（非空令牌全局唯一）
    async fn find_teacher_by_session_token(&self, token: &str) -> AppResult<Option<Teacher>>;

    /// 列出当前挂接在某面试组的全部教师
    async fn list_panel_teachers(&self, panel: PanelNumber) -> AppResult<Vec<Teacher>>;

    /// 更新教师的面试组 / 会话字段
    ///
    /// 写入新令牌时由存储层强制非空令牌的全局唯一性。
    async fn update_teacher_panel_fields(
        &self,
        teacher_id: &str,
        patch: TeacherPanelPatch,
    ) -> AppResult<Teacher>;
}

/// 检查点追加能力（只追加，无读取接口）
#[allow(async_fn_in_trait)]
pub trait CheckpointSink: Send + Sync {
    async fn append_checkpoint(&self, checkpoint: Checkpoint) -> AppResult<()>;
}

pub use memory::MemoryStore;
