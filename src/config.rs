use std::path::Path;

use serde::Deserialize;

use crate::error::AppResult;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 面试组会话有效期（分钟）
    pub session_ttl_minutes: i64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 启动时导入的报名 CSV 路径（可选）
    pub seed_csv: Option<String>,
    // --- 短信通道配置（留空则仅记录日志，不外发） ---
    pub sms_api_base_url: String,
    pub sms_api_key: String,
    /// 到场确认短信模板
    pub sms_template_arrival: String,
    /// 材料核验完成短信模板
    pub sms_template_verified: String,
    /// 面试完成短信模板
    pub sms_template_completed: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_ttl_minutes: 30,
            verbose_logging: false,
            seed_csv: None,
            sms_api_base_url: String::new(),
            sms_api_key: String::new(),
            sms_template_arrival: "ADMISSION_ARRIVAL".to_string(),
            sms_template_verified: "ADMISSION_VERIFIED".to_string(),
            sms_template_completed: "ADMISSION_COMPLETED".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载（缺省值见 `Default`）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            session_ttl_minutes: std::env::var("SESSION_TTL_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.session_ttl_minutes),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            seed_csv: std::env::var("SEED_CSV").ok().or(default.seed_csv),
            sms_api_base_url: std::env::var("SMS_API_BASE_URL").unwrap_or(default.sms_api_base_url),
            sms_api_key: std::env::var("SMS_API_KEY").unwrap_or(default.sms_api_key),
            sms_template_arrival: std::env::var("SMS_TEMPLATE_ARRIVAL").unwrap_or(default.sms_template_arrival),
            sms_template_verified: std::env::var("SMS_TEMPLATE_VERIFIED").unwrap_or(default.sms_template_verified),
            sms_template_completed: std::env::var("SMS_TEMPLATE_COMPLETED").unwrap_or(default.sms_template_completed),
        }
    }

    /// 从 TOML 配置文件加载
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// 加载配置：存在 config.toml 时优先使用，否则回退到环境变量
    pub fn load() -> AppResult<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::from_env())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            session_ttl_minutes = 45
            sms_api_base_url = "https://sms.example.cn"
            "#,
        )
        .unwrap();
        assert_eq!(config.session_ttl_minutes, 45);
        assert_eq!(config.sms_api_base_url, "https://sms.example.cn");
        // 未显式给出的字段取缺省值
        assert_eq!(config.sms_template_arrival, "ADMISSION_ARRIVAL");
        assert!(!config.verbose_logging);
    }
}
