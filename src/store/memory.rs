//! 进程内记录存储
//!
//! 用一把互斥锁保护全部表，条件状态更新的"检查 + 写入"
//! 完整落在同一个临界区内，天然满足原子条件写的契约。
//! 同时在写入口强制执行非空会话令牌的全局唯一不变量。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, AppResult};
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::models::checkpoint::Checkpoint;
use crate::models::teacher::{PanelNumber, Teacher};
use crate::store::{ApplicantStore, CheckpointSink, StatusPatch, TeacherPanelPatch, TeacherStore};

#[derive(Default)]
struct Tables {
    applicants: HashMap<String, Applicant>,
    teachers: HashMap<String, Teacher>,
    checkpoints: Vec<Checkpoint>,
}

/// 进程内存储（测试与单机部署共用）
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取锁（锁中毒视为一次存储故障，而不是 panic 扩散）
    fn lock(&self, op: &'static str) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::store_failed(op, "存储互斥锁中毒"))
    }

    /// 某考生的全部检查点（测试 / 诊断用，不属于核心契约）
    pub fn checkpoints_for(&self, application_number: &str) -> Vec<Checkpoint> {
        match self.tables.lock() {
            Ok(tables) => tables
                .checkpoints
                .iter()
                .filter(|cp| cp.application_number == application_number)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// 当前检查点总数（测试 / 诊断用）
    pub fn checkpoint_count(&self) -> usize {
        self.tables.lock().map(|t| t.checkpoints.len()).unwrap_or(0)
    }

    /// 考生总数（启动统计用）
    pub fn applicant_count(&self) -> usize {
        self.tables.lock().map(|t| t.applicants.len()).unwrap_or(0)
    }
}

impl ApplicantStore for MemoryStore {
    async fn get_applicant(&self, application_number: &str) -> AppResult<Applicant> {
        let tables = self.lock("get_applicant")?;
        tables
            .applicants
            .get(application_number)
            .cloned()
            .ok_or_else(|| AppError::not_found("考生", application_number))
    }

    async fn put_applicant(&self, applicant: Applicant) -> AppResult<bool> {
        let mut tables = self.lock("put_applicant")?;
        let inserted = !tables
            .applicants
            .contains_key(&applicant.application_number);
        tables
            .applicants
            .insert(applicant.application_number.clone(), applicant);
        Ok(inserted)
    }

    async fn update_applicant_status(
        &self,
        application_number: &str,
        expected: ApplicantStatus,
        new_status: ApplicantStatus,
        patch: StatusPatch,
    ) -> AppResult<Applicant> {
        let mut tables = self.lock("update_applicant_status")?;
        let applicant = tables
            .applicants
            .get_mut(application_number)
            .ok_or_else(|| AppError::not_found("考生", application_number))?;

        // 检查与写入同锁完成：竞争的两次同类转换恰有一方通过
        if applicant.status != expected {
            return Err(AppError::precondition_failed(
                application_number,
                applicant.status,
                expected,
            ));
        }

        applicant.status = new_status;
        if let Some(ts) = patch.arrived_at {
            applicant.arrived_at = Some(ts);
        }
        if let Some(ts) = patch.document_verified_at {
            applicant.document_verified_at = Some(ts);
        }
        if let Some(ts) = patch.interviewed_at {
            applicant.interviewed_at = Some(ts);
        }
        if let Some(emails) = patch.interviewed_by_emails {
            applicant.interviewed_by_emails = emails;
        }
        if let Some(panel) = patch.assigned_panel_id {
            applicant.assigned_panel_id = Some(panel);
        }

        Ok(applicant.clone())
    }
}

impl TeacherStore for MemoryStore {
    async fn get_teacher(&self, teacher_id: &str) -> AppResult<Teacher> {
        let tables = self.lock("get_teacher")?;
        tables
            .teachers
            .get(teacher_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("教师", teacher_id))
    }

    async fn put_teacher(&self, teacher: Teacher) -> AppResult<()> {
        let mut tables = self.lock("put_teacher")?;
        if let Some(token) = &teacher.panel_session_token {
            let duplicated = tables
                .teachers
                .values()
                .any(|t| t.id != teacher.id && t.panel_session_token.as_deref() == Some(token));
            if duplicated {
                return Err(AppError::store_failed(
                    "put_teacher",
                    "会话令牌唯一性不变量被破坏",
                ));
            }
        }
        tables.teachers.insert(teacher.id.clone(), teacher);
        Ok(())
    }

    async fn find_teacher_by_session_token(&self, token: &str) -> AppResult<Option<Teacher>> {
        let tables = self.lock("find_teacher_by_session_token")?;
        Ok(tables
            .teachers
            .values()
            .find(|t| t.panel_session_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list_panel_teachers(&self, panel: PanelNumber) -> AppResult<Vec<Teacher>> {
        let tables = self.lock("list_panel_teachers")?;
        Ok(tables
            .teachers
            .values()
            .filter(|t| t.panel == Some(panel))
            .cloned()
            .collect())
    }

    async fn update_teacher_panel_fields(
        &self,
        teacher_id: &str,
        patch: TeacherPanelPatch,
    ) -> AppResult<Teacher> {
        let mut tables = self.lock("update_teacher_panel_fields")?;

        if let Some(Some(token)) = &patch.session_token {
            let duplicated = tables
                .teachers
                .values()
                .any(|t| t.id != teacher_id && t.panel_session_token.as_deref() == Some(token));
            if duplicated {
                return Err(AppError::store_failed(
                    "update_teacher_panel_fields",
                    "会话令牌唯一性不变量被破坏",
                ));
            }
        }

        let teacher = tables
            .teachers
            .get_mut(teacher_id)
            .ok_or_else(|| AppError::not_found("教师", teacher_id))?;

        if let Some(panel) = patch.panel {
            teacher.panel = panel;
        }
        if let Some(token) = patch.session_token {
            teacher.panel_session_token = token;
        }
        if let Some(device) = patch.device_id {
            teacher.panel_device_id = device;
        }
        if let Some(ts) = patch.last_confirmed_at {
            teacher.panel_last_confirmed_at = ts;
        }

        Ok(teacher.clone())
    }
}

impl CheckpointSink for MemoryStore {
    async fn append_checkpoint(&self, checkpoint: Checkpoint) -> AppResult<()> {
        let mut tables = self.lock("append_checkpoint")?;
        tables.checkpoints.push(checkpoint);
        Ok(())
    }
}
