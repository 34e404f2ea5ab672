//! 教师与面试组编号定义

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 面试组编号（经过校验的正整数）
///
/// 组号来自设备侧输入（桌牌上印的小整数），边界处统一校验，
/// 非正整数一律拒绝，不信任上游校验。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PanelNumber(u32);

impl PanelNumber {
    /// 校验并构造面试组编号
    ///
    /// # 参数
    /// - `raw`: 设备侧提交的原始整数
    ///
    /// # 返回
    /// 非正整数返回 `InvalidInput`
    pub fn new(raw: i64) -> crate::error::AppResult<Self> {
        if raw <= 0 || raw > u32::MAX as i64 {
            return Err(crate::error::AppError::InvalidInput {
                field: "panel",
                value: raw.to_string(),
                reason: "面试组编号必须是正整数".to_string(),
            });
        }
        Ok(PanelNumber(raw as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PanelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 面试教师
///
/// `panel` 及三个会话字段只允许身份与会话协议修改；
/// 同一面试组同时最多挂接 2 名教师（容量不变量由分配流程保证）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    /// 是否在岗（停用教师不参与面试记名，也无法通过会话校验）
    pub active: bool,
    /// 当前挂接的面试组编号
    pub panel: Option<PanelNumber>,
    /// 当前会话令牌（全局唯一，存在即有效性待 TTL 判定）
    pub panel_session_token: Option<String>,
    /// 最近确认身份的设备标识（仅作参考信息）
    pub panel_device_id: Option<String>,
    /// 最近一次确认身份的时间
    pub panel_last_confirmed_at: Option<DateTime<Utc>>,
}

impl Teacher {
    /// 创建一名未分组的在岗教师
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            active: true,
            panel: None,
            panel_session_token: None,
            panel_device_id: None,
            panel_last_confirmed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_number_rejects_non_positive() {
        assert!(PanelNumber::new(0).is_err());
        assert!(PanelNumber::new(-3).is_err());
        assert_eq!(PanelNumber::new(5).unwrap().get(), 5);
    }
}
