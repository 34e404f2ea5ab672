use std::fmt;

use crate::models::applicant::ApplicantStatus;

/// 应用程序错误类型
///
/// 核心错误分类：状态机前置条件、面试组会话、分组容量、存储层。
/// 只有检查点写入和短信发送的失败会被调用方记录后吞掉，
/// 其余错误一律以类型化结果返回给上层。
#[derive(Debug)]
pub enum AppError {
    /// 记录不存在（考生 / 教师 / 会话令牌）
    NotFound {
        resource: &'static str,
        key: String,
    },
    /// 状态转换前置条件不满足（含重复提交场景）
    ///
    /// 携带当前真实状态，便于调用方渲染"已办理"之类的提示
    PreconditionFailed {
        application_number: String,
        current: ApplicantStatus,
        required: ApplicantStatus,
    },
    /// 会话无效（令牌缺失 / 不匹配 / 过期），必须重新确认身份
    SessionInvalid { reason: SessionRejectReason },
    /// 教师无权操作该面试组
    Forbidden {
        teacher_id: String,
        claimed_panel: u32,
        actual_panel: Option<u32>,
    },
    /// 面试组容量冲突：未明确指定移除对象时不允许挤掉现有教师
    Conflict { panel: u32, message: String },
    /// 输入不合法（组号非正整数、报名号格式错误等）
    InvalidInput {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// 记录存储调用失败（网络 / 超时 / 锁中毒），读操作可自由重试
    Store { op: &'static str, message: String },
    /// 短信发送错误（仅用于日志，不会传播给考生侧调用方）
    Notify {
        template: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 配置错误
    Config { message: String },
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

/// 会话被拒绝的具体原因
///
/// 所有分支都按"宁可拒绝"处理：数据缺失或不一致时一律视为无效
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRejectReason {
    /// 没有任何教师持有该令牌
    TokenUnknown,
    /// 提交的令牌与该教师当前令牌不一致（令牌已在别处轮换）
    TokenMismatch,
    /// 令牌对应教师并不在所声明的面试组
    PanelMismatch,
    /// 教师从未确认过身份
    NeverConfirmed,
    /// 距上次确认已超过会话有效期
    Expired { elapsed_minutes: i64 },
    /// 教师已停用
    TeacherInactive,
}

impl fmt::Display for SessionRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRejectReason::TokenUnknown => write!(f, "会话令牌不存在"),
            SessionRejectReason::TokenMismatch => {
                write!(f, "会话令牌不匹配，请重新登录")
            }
            SessionRejectReason::PanelMismatch => write!(f, "令牌与所声明的面试组不符"),
            SessionRejectReason::NeverConfirmed => write!(f, "尚未确认过身份"),
            SessionRejectReason::Expired { elapsed_minutes } => {
                write!(
                    f,
                    "会话已过期（距上次确认 {} 分钟），请重新确认",
                    elapsed_minutes
                )
            }
            SessionRejectReason::TeacherInactive => write!(f, "教师账号已停用"),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { resource, key } => {
                write!(f, "{} 不存在: {}", resource, key)
            }
            AppError::PreconditionFailed {
                application_number,
                current,
                required,
            } => {
                write!(
                    f,
                    "报名号 {} 当前状态为 {}，该操作要求状态为 {}",
                    application_number, current, required
                )
            }
            AppError::SessionInvalid { reason } => {
                write!(f, "会话无效: {}", reason)
            }
            AppError::Forbidden {
                teacher_id,
                claimed_panel,
                actual_panel,
            } => {
                write!(
                    f,
                    "教师 {} 无权操作第 {} 组（实际所在组: {:?}）",
                    teacher_id, claimed_panel, actual_panel
                )
            }
            AppError::Conflict { panel, message } => {
                write!(f, "第 {} 组分配冲突: {}", panel, message)
            }
            AppError::InvalidInput {
                field,
                value,
                reason,
            } => {
                write!(f, "输入不合法 ({} = '{}'): {}", field, value, reason)
            }
            AppError::Store { op, message } => {
                write!(f, "存储操作失败 ({}): {}", op, message)
            }
            AppError::Notify { template, source } => {
                write!(f, "短信发送失败 (模板: {}): {}", template, source)
            }
            AppError::Config { message } => write!(f, "配置错误: {}", message),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Notify { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(format!("IO错误: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON处理失败: {}", err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Other(format!("CSV解析失败: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config {
            message: format!("TOML解析失败: {}", err),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建"记录不存在"错误
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        AppError::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// 创建状态前置条件错误
    pub fn precondition_failed(
        application_number: impl Into<String>,
        current: ApplicantStatus,
        required: ApplicantStatus,
    ) -> Self {
        AppError::PreconditionFailed {
            application_number: application_number.into(),
            current,
            required,
        }
    }

    /// 创建会话无效错误
    pub fn session_invalid(reason: SessionRejectReason) -> Self {
        AppError::SessionInvalid { reason }
    }

    /// 创建存储层错误
    pub fn store_failed(op: &'static str, message: impl Into<String>) -> Self {
        AppError::Store {
            op,
            message: message.into(),
        }
    }

    /// 创建短信发送错误
    pub fn notify_failed(
        template: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Notify {
            template: template.into(),
            source: Box::new(source),
        }
    }

    /// 是否为前置条件失败（重复提交等预期内结果）
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, AppError::PreconditionFailed { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
