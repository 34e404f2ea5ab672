/// 日志工具模块
///
/// 提供 tracing 初始化与敏感信息脱敏的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志（RUST_LOG 可覆盖；未设置时由 `verbose` 决定缺省级别）
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 缺省日志级别：详细模式放开到 debug
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose { "debug" } else { "info" })
}

/// 记录程序启动信息
///
/// # 参数
/// - `session_ttl_minutes`: 会话有效期
pub fn log_startup(session_ttl_minutes: i64) {
    info!("{}", "=".repeat(60));
    info!("🚀 招生面试日核心服务启动");
    info!("⏱️ 面试组会话有效期: {} 分钟", session_ttl_minutes);
    info!("{}", "=".repeat(60));
}

/// 记录导入完成信息
pub fn log_import_done(inserted: usize, total: usize, path: &str) {
    info!("✓ 报名数据导入完成: 新增 {}/{} 条 (来源: {})", inserted, total, path);
}

/// 手机号脱敏（只保留末 4 位）
pub fn mask_phone(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let tail: String = phone.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}

/// 会话令牌脱敏（只保留前 6 位，错误路径严禁输出完整令牌）
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(6).collect();
    format!("{}…", head)
}
