//! 考生记录与状态机定义
//!
//! 状态沿固定顺序单调推进，禁止跳级、禁止回退。
//! 面试侧的"完成一个、准备下一个"是面试组的视角，
//! 考生本身到达 `InterviewCompleted` 后即终止。

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// 考生状态（闭合枚举，按声明顺序全序排列）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantStatus {
    /// 已报名（导入 / 自助注册后的初始状态）
    Registered,
    /// 已到场
    Arrived,
    /// 材料核验完成
    DocumentVerified,
    /// 面试进行中
    InterviewInProgress,
    /// 面试已完成（终态）
    InterviewCompleted,
}

impl ApplicantStatus {
    /// 数据库 / 审计口径的状态名
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicantStatus::Registered => "REGISTERED",
            ApplicantStatus::Arrived => "ARRIVED",
            ApplicantStatus::DocumentVerified => "DOCUMENT_VERIFIED",
            ApplicantStatus::InterviewInProgress => "INTERVIEW_IN_PROGRESS",
            ApplicantStatus::InterviewCompleted => "INTERVIEW_COMPLETED",
        }
    }

    /// 从状态名解析
    pub fn from_str_name(name: &str) -> Option<Self> {
        match name {
            "REGISTERED" => Some(ApplicantStatus::Registered),
            "ARRIVED" => Some(ApplicantStatus::Arrived),
            "DOCUMENT_VERIFIED" => Some(ApplicantStatus::DocumentVerified),
            "INTERVIEW_IN_PROGRESS" => Some(ApplicantStatus::InterviewInProgress),
            "INTERVIEW_COMPLETED" => Some(ApplicantStatus::InterviewCompleted),
            _ => None,
        }
    }

    /// 合法的下一个状态（终态返回 None）
    pub fn next(self) -> Option<Self> {
        match self {
            ApplicantStatus::Registered => Some(ApplicantStatus::Arrived),
            ApplicantStatus::Arrived => Some(ApplicantStatus::DocumentVerified),
            ApplicantStatus::DocumentVerified => Some(ApplicantStatus::InterviewInProgress),
            ApplicantStatus::InterviewInProgress => Some(ApplicantStatus::InterviewCompleted),
            ApplicantStatus::InterviewCompleted => None,
        }
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 考生记录
///
/// 以报名号为自然主键，每个报名号一行。
/// 三个时间戳字段每个最多被设置一次；`interviewed_by_emails`
/// 仅在面试重启时被清空（面试完成时写入）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    /// 报名号（自然主键）
    pub application_number: String,
    pub name: String,
    pub phone: String,
    pub program: String,
    pub campus: String,
    /// 预约面试日期
    pub interview_date: Option<NaiveDate>,
    /// 预约面试时间
    pub interview_time: Option<NaiveTime>,
    /// 面试地点
    pub location: String,
    /// 下一步指引（到场后提示）
    pub instructions: String,
    pub status: ApplicantStatus,
    pub arrived_at: Option<DateTime<Utc>>,
    pub document_verified_at: Option<DateTime<Utc>>,
    pub interviewed_at: Option<DateTime<Utc>>,
    /// 最近一次面试记入的教师邮箱集合（逗号拼接、去重）
    pub interviewed_by_emails: Option<String>,
    /// 当前被叫到的面试组号
    pub assigned_panel_id: Option<u32>,
}

impl Applicant {
    /// 创建一个刚报名的考生（批量导入 / 自助注册入口）
    pub fn registered(
        application_number: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            application_number: application_number.into(),
            name: name.into(),
            phone: phone.into(),
            program: String::new(),
            campus: String::new(),
            interview_date: None,
            interview_time: None,
            location: String::new(),
            instructions: String::new(),
            status: ApplicantStatus::Registered,
            arrived_at: None,
            document_verified_at: None,
            interviewed_at: None,
            interviewed_by_emails: None,
            assigned_panel_id: None,
        }
    }
}
