//! 通知发送能力 - 业务能力层
//!
//! 职责：
//! - 给定手机号 + 模板 + 参数，发出一条外呼消息
//! - 只负责"发出"，不保证送达（外部通道的事）
//! - 失败由调用方记录日志后丢弃，绝不影响状态转换结果

use tracing::info;

use crate::error::AppResult;
use crate::utils::logging::mask_phone;

/// 短信模板（具体模板编号由通道配置映射）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmsTemplate {
    /// 到场确认（含下一步指引）
    Arrival,
    /// 材料核验完成
    Verified,
    /// 面试完成
    Completed,
}

impl SmsTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            SmsTemplate::Arrival => "arrival",
            SmsTemplate::Verified => "verified",
            SmsTemplate::Completed => "completed",
        }
    }
}

/// 通知发送契约
///
/// 状态机在条件写成功之后才会调用，调用结果不回传考生侧。
#[allow(async_fn_in_trait)]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        phone: &str,
        template: SmsTemplate,
        params: &[(&'static str, String)],
    ) -> AppResult<()>;
}

/// 仅记录日志的通知实现（未配置短信通道时的缺省实现）
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(
        &self,
        phone: &str,
        template: SmsTemplate,
        params: &[(&'static str, String)],
    ) -> AppResult<()> {
        info!(
            "📨 [仅日志] 模拟发送短信: 手机号 {} | 模板 {} | 参数 {} 个",
            mask_phone(phone),
            template.as_str(),
            params.len()
        );
        Ok(())
    }
}
