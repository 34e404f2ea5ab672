//! 检查点审计记录
//!
//! 每次成功的状态转换恰好产生一条检查点，只追加、不修改、不删除。
//! 检查点写入失败不允许影响主流程（尽力而为的旁路记录）。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::teacher::PanelNumber;

/// 检查点类型（闭合枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointType {
    Arrival,
    DocumentVerification,
    InterviewStarted,
    InterviewCompleted,
}

impl CheckpointType {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointType::Arrival => "ARRIVAL",
            CheckpointType::DocumentVerification => "DOCUMENT_VERIFICATION",
            CheckpointType::InterviewStarted => "INTERVIEW_STARTED",
            CheckpointType::InterviewCompleted => "INTERVIEW_COMPLETED",
        }
    }
}

impl fmt::Display for CheckpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 执行检查点操作的主体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActorRef {
    /// 引导志愿者（工号）
    Volunteer(String),
    /// 核验岗工作人员（工号）
    Staff(String),
    /// 面试组（组号）
    Panel(PanelNumber),
    /// 公示大屏（自助扫码，无人工主体）
    DisplayBoard,
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRef::Volunteer(id) => write!(f, "volunteer:{}", id),
            ActorRef::Staff(id) => write!(f, "staff:{}", id),
            ActorRef::Panel(panel) => write!(f, "panel:{}", panel),
            ActorRef::DisplayBoard => write!(f, "display-board"),
        }
    }
}

/// 一条检查点记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    /// 考生报名号（外部引用）
    pub application_number: String,
    pub checkpoint_type: CheckpointType,
    pub actor: ActorRef,
    pub recorded_at: DateTime<Utc>,
    /// 自由元数据（前后状态、确认人、来源等）
    pub metadata: JsonValue,
}

impl Checkpoint {
    pub fn new(
        application_number: impl Into<String>,
        checkpoint_type: CheckpointType,
        actor: ActorRef,
        metadata: JsonValue,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_number: application_number.into(),
            checkpoint_type,
            actor,
            recorded_at: Utc::now(),
            metadata,
        }
    }
}
