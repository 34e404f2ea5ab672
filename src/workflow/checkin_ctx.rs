//! 签到操作上下文
//!
//! 封装"谁在哪个点位做这次操作"这一信息

use std::fmt::Display;

use crate::models::checkpoint::ActorRef;

/// 签到操作上下文
#[derive(Debug, Clone)]
pub struct CheckinCtx {
    /// 操作主体（志愿者 / 核验岗 / 公示大屏）
    pub actor: ActorRef,

    /// 点位名称（仅用于日志显示）
    pub station: String,
}

impl CheckinCtx {
    /// 创建新的签到上下文
    pub fn new(actor: ActorRef, station: impl Into<String>) -> Self {
        Self {
            actor,
            station: station.into(),
        }
    }

    /// 公示大屏自助扫码的上下文
    pub fn display_board() -> Self {
        Self {
            actor: ActorRef::DisplayBoard,
            station: "公示大屏".to_string(),
        }
    }
}

impl Display for CheckinCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[点位#{} 主体#{}]", self.station, self.actor)
    }
}
