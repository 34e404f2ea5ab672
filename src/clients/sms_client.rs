/// 短信通道 API 客户端
///
/// 封装与外部短信网关的 HTTP 调用，按模板名映射到通道侧模板编号。
/// 网关返回非 200 或 code != 0 都视为发送失败，由上层记录后丢弃。
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::notifier::{Notifier, SmsTemplate};
use crate::utils::logging::mask_phone;

/// 网关调用的整体超时（秒），挂死的网关按发送失败处理
const HTTP_TIMEOUT_SECS: u64 = 5;

/// 短信网关客户端
pub struct SmsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    template_arrival: String,
    template_verified: String,
    template_completed: String,
}

impl SmsClient {
    /// 创建新的短信客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("内置 HTTP 客户端配置"),
            base_url: config.sms_api_base_url.clone(),
            api_key: config.sms_api_key.clone(),
            template_arrival: config.sms_template_arrival.clone(),
            template_verified: config.sms_template_verified.clone(),
            template_completed: config.sms_template_completed.clone(),
        }
    }

    /// 模板名 → 通道侧模板编号
    fn template_id(&self, template: SmsTemplate) -> &str {
        match template {
            SmsTemplate::Arrival => &self.template_arrival,
            SmsTemplate::Verified => &self.template_verified,
            SmsTemplate::Completed => &self.template_completed,
        }
    }
}

impl Notifier for SmsClient {
    async fn send(
        &self,
        phone: &str,
        template: SmsTemplate,
        params: &[(&'static str, String)],
    ) -> AppResult<()> {
        let template_id = self.template_id(template).to_string();
        let payload = json!({
            "phone": phone,
            "templateId": template_id,
            "params": params
                .iter()
                .map(|(k, v)| json!({ "name": k, "value": v }))
                .collect::<Vec<_>>(),
        });

        debug!(
            "发送短信: 手机号 {} | 模板 {}",
            mask_phone(phone),
            template.as_str()
        );

        let response = self
            .http
            .post(format!("{}/sms/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify_failed(template.as_str(), e))?;

        if !response.status().is_success() {
            return Err(AppError::Notify {
                template: template.as_str().to_string(),
                source: format!("网关返回状态码 {}", response.status()).into(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::notify_failed(template.as_str(), e))?;

        match body.get("code").and_then(|v| v.as_i64()) {
            Some(0) => Ok(()),
            code => Err(AppError::Notify {
                template: template.as_str().to_string(),
                source: format!("网关返回业务码 {:?}", code).into(),
            }),
        }
    }
}
