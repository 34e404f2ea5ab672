//! 面试组身份与会话协议 - 业务能力层
//!
//! 同一个组号（桌牌上的小整数）下最多挂接 2 名教师，
//! 两台设备各自凭轮换的会话令牌证明"现在坐在这里的是谁"。
//!
//! 约定：
//! - 校验一律宁可拒绝：数据缺失 / 不一致都按会话无效处理
//! - 令牌是高熵随机串，只做精确比对，错误路径不输出完整令牌
//! - confirm / assign 都是"读完再写"，统一用服务内互斥锁串行化，
//!   避免两次并发改座把容量不变量改坏

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult, SessionRejectReason};
use crate::models::teacher::PanelNumber;
use crate::store::{TeacherPanelPatch, TeacherStore};
use crate::utils::logging::token_preview;

/// 通过会话校验的教师身份（用于审计与面试记名）
#[derive(Debug, Clone)]
pub struct SessionTeacher {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// 面试组内的一名教师（确认身份时回传给设备）
#[derive(Debug, Clone)]
pub struct PanelMate {
    pub teacher_id: String,
    pub name: String,
    /// 是否就是本次确认身份的教师
    pub is_self: bool,
}

/// 确认身份的结果
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// 当前有效令牌（可能是新铸的）
    pub session_token: String,
    /// 本次是否铸造了新令牌
    pub minted: bool,
    /// 该组当前的教师搭档（含自己）
    pub panel_teachers: Vec<PanelMate>,
}

/// 改座的结果
#[derive(Debug, Clone)]
pub struct AssignOutcome {
    pub teacher_id: String,
    pub panel: PanelNumber,
    /// 从别的组挪过来时报告原组号（用于设备侧提示文案）
    pub moved_from_panel: Option<PanelNumber>,
    pub removed_teacher_id: Option<String>,
}

/// 铸造新会话令牌（纯函数，密码学随机，64 位十六进制）
pub fn mint_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// 会话新鲜度判定：恰好到 TTL 仍有效，越过一瞬即失效
fn session_is_fresh(elapsed: Duration, ttl: Duration) -> bool {
    elapsed <= ttl
}

/// 面试组身份与会话服务
pub struct PanelSessionService<S: TeacherStore> {
    store: Arc<S>,
    session_ttl: Duration,
    /// 串行化 confirm / assign 的读写序列
    mutation_lock: tokio::sync::Mutex<()>,
}

impl<S: TeacherStore> PanelSessionService<S> {
    pub fn new(store: Arc<S>, session_ttl_minutes: i64) -> Self {
        Self {
            store,
            session_ttl: Duration::minutes(session_ttl_minutes),
            mutation_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// 确认身份：设备声明"教师 X 现在坐在第 N 组"
    ///
    /// # 参数
    /// - `existing_token`: 设备缓存的旧令牌；与库内令牌不一致说明
    ///   凭据已在别处轮换，拒绝并要求重新登录
    ///
    /// # 返回
    /// 当前令牌 + 该组教师搭档（自己带标记）
    pub async fn confirm_identity(
        &self,
        panel: PanelNumber,
        teacher_id: &str,
        device_id: &str,
        existing_token: Option<&str>,
    ) -> AppResult<ConfirmOutcome> {
        let _guard = self.mutation_lock.lock().await;

        let teacher = self.store.get_teacher(teacher_id).await?;
        if !teacher.active {
            return Err(AppError::session_invalid(SessionRejectReason::TeacherInactive));
        }
        if teacher.panel != Some(panel) {
            return Err(AppError::Forbidden {
                teacher_id: teacher_id.to_string(),
                claimed_panel: panel.get(),
                actual_panel: teacher.panel.map(PanelNumber::get),
            });
        }

        // 旧设备拿着轮换前的令牌来确认：直接拒绝，防止静默顶号
        if let (Some(stored), Some(supplied)) =
            (teacher.panel_session_token.as_deref(), existing_token)
        {
            if stored != supplied {
                return Err(AppError::session_invalid(SessionRejectReason::TokenMismatch));
            }
        }

        let (session_token, minted) = match &teacher.panel_session_token {
            Some(stored) => (stored.clone(), false),
            None => (mint_session_token(), true),
        };

        self.store
            .update_teacher_panel_fields(
                teacher_id,
                TeacherPanelPatch {
                    session_token: if minted {
                        Some(Some(session_token.clone()))
                    } else {
                        None
                    },
                    device_id: Some(Some(device_id.to_string())),
                    last_confirmed_at: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await?;

        let panel_teachers = self
            .store
            .list_panel_teachers(panel)
            .await?
            .into_iter()
            .map(|t| PanelMate {
                is_self: t.id == teacher_id,
                teacher_id: t.id,
                name: t.name,
            })
            .collect();

        info!(
            "✓ 第 {} 组教师 {} 完成身份确认（令牌 {}，{}）",
            panel,
            teacher.name,
            token_preview(&session_token),
            if minted { "新铸" } else { "续期" }
        );

        Ok(ConfirmOutcome {
            session_token,
            minted,
            panel_teachers,
        })
    }

    /// 会话校验：所有面试组特权操作（检索 / 开始 / 完成）的闸门
    ///
    /// 任何一项不满足即判无效：令牌不存在、组号不符、
    /// 从未确认、距上次确认超过有效期。
    pub async fn validate_session(
        &self,
        panel: PanelNumber,
        session_token: &str,
    ) -> AppResult<SessionTeacher> {
        let teacher = self
            .store
            .find_teacher_by_session_token(session_token)
            .await?
            .ok_or_else(|| AppError::session_invalid(SessionRejectReason::TokenUnknown))?;

        if !teacher.active {
            return Err(AppError::session_invalid(SessionRejectReason::TeacherInactive));
        }
        if teacher.panel != Some(panel) {
            return Err(AppError::session_invalid(SessionRejectReason::PanelMismatch));
        }
        let confirmed_at = teacher
            .panel_last_confirmed_at
            .ok_or_else(|| AppError::session_invalid(SessionRejectReason::NeverConfirmed))?;

        let elapsed = Utc::now() - confirmed_at;
        if !session_is_fresh(elapsed, self.session_ttl) {
            return Err(AppError::session_invalid(SessionRejectReason::Expired {
                elapsed_minutes: elapsed.num_minutes(),
            }));
        }

        Ok(SessionTeacher {
            id: teacher.id,
            name: teacher.name,
            email: teacher.email,
        })
    }

    /// 改座：把教师分配到某面试组
    ///
    /// 容量不变量：一组最多 2 名教师。超员且未指明移除对象时
    /// 返回 Conflict，绝不静默挤掉任何人；被移除与被分配教师的
    /// 会话字段都会清空，落座后必须重新确认身份。
    pub async fn assign_teacher_to_panel(
        &self,
        panel: PanelNumber,
        teacher_id: &str,
        remove_teacher_id: Option<&str>,
    ) -> AppResult<AssignOutcome> {
        let _guard = self.mutation_lock.lock().await;

        let assignee = self.store.get_teacher(teacher_id).await?;

        if let Some(remove_id) = remove_teacher_id {
            if remove_id == teacher_id {
                return Err(AppError::InvalidInput {
                    field: "remove_teacher_id",
                    value: remove_id.to_string(),
                    reason: "待移除教师不能是被分配教师本人".to_string(),
                });
            }
        }

        // 现有占位（不含被分配教师本人：原地重新分配不算冲突）
        let occupants: Vec<_> = self
            .store
            .list_panel_teachers(panel)
            .await?
            .into_iter()
            .filter(|t| t.id != teacher_id)
            .collect();

        let removed_teacher_id = match remove_teacher_id {
            Some(remove_id) => {
                if !occupants.iter().any(|t| t.id == remove_id) {
                    return Err(AppError::Conflict {
                        panel: panel.get(),
                        message: format!("待移除教师 {} 不在该组", remove_id),
                    });
                }
                Some(remove_id.to_string())
            }
            None => {
                if occupants.len() >= 2 {
                    let names: Vec<_> =
                        occupants.iter().map(|t| t.name.as_str()).collect();
                    return Err(AppError::Conflict {
                        panel: panel.get(),
                        message: format!(
                            "该组已有教师（{}），请先选择要移除的人",
                            names.join("、")
                        ),
                    });
                }
                None
            }
        };

        if let Some(remove_id) = &removed_teacher_id {
            self.store
                .update_teacher_panel_fields(remove_id, TeacherPanelPatch::clear_all())
                .await?;
        }

        let moved_from_panel = assignee.panel.filter(|p| *p != panel);

        // 落座即作废既有会话（哪怕原先在别的组有有效会话）
        self.store
            .update_teacher_panel_fields(
                teacher_id,
                TeacherPanelPatch {
                    panel: Some(Some(panel)),
                    session_token: Some(None),
                    device_id: Some(None),
                    last_confirmed_at: Some(None),
                },
            )
            .await?;

        info!(
            "✓ 教师 {} 已分配到第 {} 组{}{}",
            assignee.name,
            panel,
            moved_from_panel
                .map(|p| format!("（原第 {} 组）", p))
                .unwrap_or_default(),
            removed_teacher_id
                .as_ref()
                .map(|id| format!("，移除 {}", id))
                .unwrap_or_default()
        );

        Ok(AssignOutcome {
            teacher_id: teacher_id.to_string(),
            panel,
            moved_from_panel,
            removed_teacher_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::teacher::Teacher;
    use crate::store::MemoryStore;

    const TTL_MINUTES: i64 = 30;

    fn service(store: Arc<MemoryStore>) -> PanelSessionService<MemoryStore> {
        PanelSessionService::new(store, TTL_MINUTES)
    }

    async fn seed_teacher_on_panel(store: &MemoryStore, id: &str, name: &str, panel: u32) {
        let mut teacher = Teacher::new(id, name, format!("{id}@school.cn"));
        teacher.panel = Some(PanelNumber::new(panel as i64).unwrap());
        store.put_teacher(teacher).await.unwrap();
    }

    /// 把某教师的确认时间回拨 `minutes` 分钟（模拟时间流逝）
    async fn backdate_confirmation(store: &MemoryStore, teacher_id: &str, minutes: i64) {
        store
            .update_teacher_panel_fields(
                teacher_id,
                TeacherPanelPatch {
                    last_confirmed_at: Some(Some(Utc::now() - Duration::minutes(minutes))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn confirm_mints_token_once_and_refreshes_in_place() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));
        let panel = PanelNumber::new(5).unwrap();

        let first = svc
            .confirm_identity(panel, "t1", "device-a", None)
            .await
            .unwrap();
        assert!(first.minted);
        assert_eq!(first.session_token.len(), 64);

        // 带旧令牌再确认：续期，不换令牌
        let second = svc
            .confirm_identity(panel, "t1", "device-a", Some(&first.session_token))
            .await
            .unwrap();
        assert!(!second.minted);
        assert_eq!(second.session_token, first.session_token);
        assert!(second.panel_teachers.iter().any(|m| m.is_self));
    }

    #[tokio::test]
    async fn stale_device_token_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));
        let panel = PanelNumber::new(5).unwrap();

        svc.confirm_identity(panel, "t1", "device-a", None).await.unwrap();
        let err = svc
            .confirm_identity(panel, "t1", "device-b", Some("stale-token"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::SessionInvalid {
                reason: SessionRejectReason::TokenMismatch
            }
        ));
    }

    #[tokio::test]
    async fn wrong_panel_claim_is_forbidden() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));

        let err = svc
            .confirm_identity(PanelNumber::new(6).unwrap(), "t1", "device-a", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn session_ttl_boundary_is_enforced() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));
        let panel = PanelNumber::new(5).unwrap();

        let confirmed = svc
            .confirm_identity(panel, "t1", "device-a", None)
            .await
            .unwrap();
        let token = confirmed.session_token;

        // 有效期内（29 分钟）通过
        backdate_confirmation(&store, "t1", TTL_MINUTES - 1).await;
        let teacher = svc.validate_session(panel, &token).await.unwrap();
        assert_eq!(teacher.id, "t1");

        // 超过有效期（31 分钟）宁可拒绝
        backdate_confirmation(&store, "t1", TTL_MINUTES + 1).await;
        let err = svc.validate_session(panel, &token).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::SessionInvalid {
                reason: SessionRejectReason::Expired { .. }
            }
        ));
    }

    #[test]
    fn session_valid_at_exactly_the_ttl_instant() {
        let ttl = Duration::minutes(TTL_MINUTES);
        // 恰好 T+30:00 仍然有效
        assert!(session_is_fresh(ttl, ttl));
        // 多一秒即失效
        assert!(!session_is_fresh(ttl + Duration::seconds(1), ttl));
        assert!(session_is_fresh(ttl - Duration::seconds(1), ttl));
    }

    #[tokio::test]
    async fn validation_fails_closed_on_every_gap() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));
        let panel = PanelNumber::new(5).unwrap();

        // 无人持有该令牌
        let err = svc.validate_session(panel, "no-such-token").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::SessionInvalid {
                reason: SessionRejectReason::TokenUnknown
            }
        ));

        // 有令牌但从未确认（管理员手工塞令牌的异常数据）
        store
            .update_teacher_panel_fields(
                "t1",
                TeacherPanelPatch {
                    session_token: Some(Some("manually-set-token".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = svc
            .validate_session(panel, "manually-set-token")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::SessionInvalid {
                reason: SessionRejectReason::NeverConfirmed
            }
        ));
    }

    #[tokio::test]
    async fn capacity_invariant_requires_explicit_eviction() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        seed_teacher_on_panel(&store, "t2", "李老师", 5).await;
        store.put_teacher(Teacher::new("t3", "赵老师", "t3@school.cn")).await.unwrap();
        let svc = service(Arc::clone(&store));
        let panel = PanelNumber::new(5).unwrap();

        // 不指明移除对象：冲突，且现有两人原封不动
        let err = svc
            .assign_teacher_to_panel(panel, "t3", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        let occupants = store.list_panel_teachers(panel).await.unwrap();
        assert_eq!(occupants.len(), 2);

        // 指明移除 t1：成功，t1 的全部面试组字段被清空
        let outcome = svc
            .assign_teacher_to_panel(panel, "t3", Some("t1"))
            .await
            .unwrap();
        assert_eq!(outcome.removed_teacher_id.as_deref(), Some("t1"));
        let t1 = store.get_teacher("t1").await.unwrap();
        assert_eq!(t1.panel, None);
        assert_eq!(t1.panel_session_token, None);
        assert_eq!(t1.panel_last_confirmed_at, None);
    }

    #[tokio::test]
    async fn reseating_rotates_token_and_invalidates_old_session() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        let svc = service(Arc::clone(&store));
        let panel5 = PanelNumber::new(5).unwrap();
        let panel9 = PanelNumber::new(9).unwrap();

        let token = svc
            .confirm_identity(panel5, "t1", "device-a", None)
            .await
            .unwrap()
            .session_token;
        assert!(svc.validate_session(panel5, &token).await.is_ok());

        // 改座到第 9 组：旧令牌立刻失效，原组号回报给设备
        let outcome = svc
            .assign_teacher_to_panel(panel9, "t1", None)
            .await
            .unwrap();
        assert_eq!(outcome.moved_from_panel, Some(panel5));
        let err = svc.validate_session(panel5, &token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionInvalid { .. }));
        let err = svc.validate_session(panel9, &token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionInvalid { .. }));
    }

    #[tokio::test]
    async fn removing_teacher_not_on_panel_conflicts() {
        let store = Arc::new(MemoryStore::new());
        seed_teacher_on_panel(&store, "t1", "王老师", 5).await;
        store.put_teacher(Teacher::new("t3", "赵老师", "t3@school.cn")).await.unwrap();
        let svc = service(Arc::clone(&store));

        let err = svc
            .assign_teacher_to_panel(PanelNumber::new(5).unwrap(), "t3", Some("t9"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[test]
    fn minted_tokens_are_unique_and_opaque() {
        let a = mint_session_token();
        let b = mint_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
