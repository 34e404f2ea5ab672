//! # Admission Checkin
//!
//! 招生面试日多环节签到的核心服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Store）
//! - `store/` - 持有共享记录，只暴露窄接口
//! - `MemoryStore` - 原子条件写的进程内实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，一次只处理一名考生 / 一名教师
//! - `ApplicantStateMachine` - 状态转换能力
//! - `PanelSessionService` - 面试组身份与会话能力
//! - `CheckpointLedger` - 检查点追加能力
//! - `Notifier` - 通知发送能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次扫码 / 一次面试组动作"的完整流程
//! - `CheckinCtx` - 上下文封装（操作主体 + 点位）
//! - `CheckinFlow` - 到场 / 核验流程（含大屏重复扫码折叠）
//! - `PanelFlow` - 会话闸门 → 状态转换的固定顺序
//!
//! ### ④ 编排层（App）
//! - `app` - 装配配置、存储与流程，启动时导入报名数据
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, SessionRejectReason};
pub use models::{ActorRef, Applicant, ApplicantStatus, Checkpoint, CheckpointType, PanelNumber, Teacher};
pub use services::{ApplicantStateMachine, PanelSessionService, SessionTeacher};
pub use store::MemoryStore;
pub use workflow::{ArrivalOutcome, CheckinCtx, CheckinFlow, PanelFlow};
