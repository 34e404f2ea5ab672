use anyhow::Result;

use admission_checkin::app::App;
use admission_checkin::config::Config;
use admission_checkin::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（config.toml 优先，其次环境变量）
    let config = Config::load()?;

    // 初始化日志（详细开关来自配置）
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
