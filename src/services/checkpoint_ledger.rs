//! 检查点台账服务 - 业务能力层
//!
//! 职责：
//! - 每次成功的状态转换后追加一条检查点
//! - 只追加，不提供读取（看板消费不在本服务范围内）
//! - 写入失败记日志后吞掉，绝不中断调用方的主转换

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::models::checkpoint::{ActorRef, Checkpoint, CheckpointType};
use crate::store::CheckpointSink;

/// 检查点台账
pub struct CheckpointLedger<S: CheckpointSink> {
    sink: Arc<S>,
}

impl<S: CheckpointSink> CheckpointLedger<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// 追加一条检查点（尽力而为，永不报错）
    ///
    /// # 参数
    /// - `application_number`: 报名号
    /// - `checkpoint_type`: 检查点类型
    /// - `actor`: 操作主体
    /// - `metadata`: 前后状态、确认人等自由元数据
    pub async fn record(
        &self,
        application_number: &str,
        checkpoint_type: CheckpointType,
        actor: ActorRef,
        metadata: JsonValue,
    ) {
        let checkpoint =
            Checkpoint::new(application_number, checkpoint_type, actor, metadata);

        match self.sink.append_checkpoint(checkpoint).await {
            Ok(()) => {
                debug!(
                    "[申请 {}] 检查点已记录: {}",
                    application_number, checkpoint_type
                );
            }
            Err(e) => {
                // 台账是旁路记录，失败只告警
                warn!(
                    "[申请 {}] ⚠️ 检查点写入失败（已忽略）: {} - {}",
                    application_number, checkpoint_type, e
                );
            }
        }
    }
}
