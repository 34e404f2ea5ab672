//! 应用装配 - 编排层
//!
//! 负责把配置、存储、状态机、面试组流程接到一起，
//! 并在启动时完成报名数据导入。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clients::SmsClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::loaders::load_applicants_csv;
use crate::services::notifier::{LogNotifier, Notifier, SmsTemplate};
use crate::services::panel_session::PanelSessionService;
use crate::services::state_machine::ApplicantStateMachine;
use crate::store::{ApplicantStore, MemoryStore};
use crate::utils::logging;
use crate::workflow::{CheckinFlow, PanelFlow};

/// 运行期通知通道：配置了短信网关则外发，否则仅记日志
pub enum AppNotifier {
    Sms(SmsClient),
    Log(LogNotifier),
}

impl Notifier for AppNotifier {
    async fn send(
        &self,
        phone: &str,
        template: SmsTemplate,
        params: &[(&'static str, String)],
    ) -> AppResult<()> {
        match self {
            AppNotifier::Sms(client) => client.send(phone, template, params).await,
            AppNotifier::Log(log) => log.send(phone, template, params).await,
        }
    }
}

/// 面试日核心应用
pub struct App {
    config: Config,
    store: Arc<MemoryStore>,
    checkin: CheckinFlow<MemoryStore, AppNotifier>,
    panel: PanelFlow<MemoryStore, AppNotifier>,
}

impl App {
    /// 初始化应用：装配存储、通知通道与两条流程
    pub async fn initialize(config: Config) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());

        let notifier = if config.sms_api_base_url.is_empty() {
            info!("未配置短信网关，通知仅记录日志");
            Arc::new(AppNotifier::Log(LogNotifier))
        } else {
            Arc::new(AppNotifier::Sms(SmsClient::new(&config)))
        };

        let machine = Arc::new(ApplicantStateMachine::new(
            Arc::clone(&store),
            notifier,
        ));
        let session = PanelSessionService::new(Arc::clone(&store), config.session_ttl_minutes);

        Ok(Self {
            checkin: CheckinFlow::new(Arc::clone(&machine)),
            panel: PanelFlow::new(session, machine),
            store,
            config,
        })
    }

    /// 启动：导入报名数据并报告就绪状态
    pub async fn run(&self) -> Result<()> {
        logging::log_startup(self.config.session_ttl_minutes);

        if let Some(seed_csv) = &self.config.seed_csv {
            self.import_applicants(Path::new(seed_csv))
                .await
                .with_context(|| format!("导入报名 CSV 失败: {seed_csv}"))?;
        }

        info!(
            "✓ 就绪，当前考生 {} 名，检查点 {} 条",
            self.store.applicant_count(),
            self.store.checkpoint_count()
        );
        Ok(())
    }

    /// 批量导入报名表（重复报名号不覆盖已有进度）
    async fn import_applicants(&self, path: &Path) -> Result<usize> {
        let applicants = load_applicants_csv(path)?;
        let total = applicants.len();
        let mut inserted = 0usize;

        for applicant in applicants {
            // 已有记录说明当天流程可能已开始，跳过以免覆盖状态
            match self.store.get_applicant(&applicant.application_number).await {
                Ok(_) => continue,
                Err(_) => {
                    if self.store.put_applicant(applicant).await? {
                        inserted += 1;
                    }
                }
            }
        }

        logging::log_import_done(inserted, total, &path.display().to_string());
        Ok(inserted)
    }

    /// 到场 / 核验流程入口
    pub fn checkin(&self) -> &CheckinFlow<MemoryStore, AppNotifier> {
        &self.checkin
    }

    /// 面试组流程入口
    pub fn panel(&self) -> &PanelFlow<MemoryStore, AppNotifier> {
        &self.panel
    }

    /// 底层存储（管理侧建档 / 诊断用）
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::applicant::Applicant;
    use crate::models::checkpoint::ActorRef;
    use crate::workflow::CheckinCtx;

    #[tokio::test]
    async fn starts_without_seed_and_reports_store_counts() {
        let app = App::initialize(Config::default()).await.unwrap();
        app.run().await.unwrap();
        assert_eq!(app.store().applicant_count(), 0);
        assert_eq!(app.store().checkpoint_count(), 0);
    }

    #[tokio::test]
    async fn checkin_flow_is_wired_through_the_app() {
        let app = App::initialize(Config::default()).await.unwrap();
        app.store()
            .put_applicant(Applicant::registered("APP-100", "测试考生", "13800000100"))
            .await
            .unwrap();

        let ctx = CheckinCtx::new(ActorRef::Volunteer("v-01".into()), "入口 1");
        let outcome = app.checkin().scan_arrival("APP-100", &ctx).await.unwrap();
        assert!(!outcome.already_processed);
        assert_eq!(app.store().applicant_count(), 1);
        assert_eq!(app.store().checkpoint_count(), 1);
    }
}
