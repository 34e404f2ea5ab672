//! 面试日端到端流程测试
//!
//! 覆盖两条完整链路：
//! 1. 考生从报名到面试完成的五段状态流
//! 2. 面试组教师的确认 / 改座 / 令牌轮换链路

use std::sync::{Arc, Mutex};

use admission_checkin::error::{AppError, AppResult};
use admission_checkin::models::applicant::{Applicant, ApplicantStatus};
use admission_checkin::models::checkpoint::{ActorRef, CheckpointType};
use admission_checkin::models::teacher::{PanelNumber, Teacher};
use admission_checkin::services::notifier::{Notifier, SmsTemplate};
use admission_checkin::services::panel_session::PanelSessionService;
use admission_checkin::services::state_machine::ApplicantStateMachine;
use admission_checkin::store::{ApplicantStore, MemoryStore, TeacherStore};
use admission_checkin::workflow::{CheckinCtx, CheckinFlow, PanelFlow};
use tokio_test::assert_ok;

/// 记录每次外呼的测试通知通道
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, SmsTemplate)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, SmsTemplate)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        phone: &str,
        template: SmsTemplate,
        _params: &[(&'static str, String)],
    ) -> AppResult<()> {
        self.sent.lock().unwrap().push((phone.to_string(), template));
        Ok(())
    }
}

/// 发送必失败的通知通道（验证失败被吞掉）
struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send(
        &self,
        _phone: &str,
        template: SmsTemplate,
        _params: &[(&'static str, String)],
    ) -> AppResult<()> {
        Err(AppError::Notify {
            template: template.as_str().to_string(),
            source: "模拟短信网关故障".into(),
        })
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    checkin: CheckinFlow<MemoryStore, RecordingNotifier>,
    panel: PanelFlow<MemoryStore, RecordingNotifier>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let machine = Arc::new(ApplicantStateMachine::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
    ));
    let session = PanelSessionService::new(Arc::clone(&store), 30);
    Harness {
        checkin: CheckinFlow::new(Arc::clone(&machine)),
        panel: PanelFlow::new(session, machine),
        store,
        notifier,
    }
}

async fn seed_teacher(store: &MemoryStore, id: &str, name: &str, panel: Option<i64>) {
    let mut teacher = Teacher::new(id, name, format!("{id}@school.cn"));
    teacher.panel = panel.map(|p| PanelNumber::new(p).unwrap());
    store.put_teacher(teacher).await.unwrap();
}

#[tokio::test]
async fn applicant_walks_the_whole_pipeline() {
    let h = harness();
    h.store
        .put_applicant(Applicant::registered("APP-001", "陈伟", "13800000001"))
        .await
        .unwrap();
    seed_teacher(&h.store, "t-a", "王老师", Some(3)).await;

    // 到场扫码
    let arrival = assert_ok!(
        h.checkin
            .scan_arrival("APP-001", &CheckinCtx::display_board())
            .await
    );
    assert_eq!(arrival.applicant.status, ApplicantStatus::Arrived);
    assert!(arrival.applicant.arrived_at.is_some());
    let checkpoints = h.store.checkpoints_for("APP-001");
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints[0].checkpoint_type, CheckpointType::Arrival);
    assert_eq!(checkpoints[0].actor, ActorRef::DisplayBoard);

    // 材料核验
    let ctx = CheckinCtx::new(ActorRef::Staff("s-01".into()), "核验台 1");
    let verified = assert_ok!(h.checkin.scan_verification("APP-001", &ctx).await);
    assert_eq!(verified.status, ApplicantStatus::DocumentVerified);

    // 面试组登录后开始面试
    let token = assert_ok!(h.panel.confirm_identity(3, "t-a", "pad-01", None).await)
        .session_token;
    let started = assert_ok!(h.panel.start_interview(3, &token, "APP-001").await);
    assert_eq!(started.status, ApplicantStatus::InterviewInProgress);
    assert_eq!(started.interviewed_by_emails, None);

    // 同一会话完成面试
    let done = assert_ok!(h.panel.complete_interview(3, &token, "APP-001").await);
    assert_eq!(done.status, ApplicantStatus::InterviewCompleted);
    assert!(done.interviewed_at.is_some());
    assert_eq!(done.interviewed_by_emails.as_deref(), Some("t-a@school.cn"));

    // 四段转换各留一条检查点
    let types: Vec<_> = h
        .store
        .checkpoints_for("APP-001")
        .into_iter()
        .map(|cp| cp.checkpoint_type)
        .collect();
    assert_eq!(
        types,
        vec![
            CheckpointType::Arrival,
            CheckpointType::DocumentVerification,
            CheckpointType::InterviewStarted,
            CheckpointType::InterviewCompleted,
        ]
    );

    // 到场 / 核验 / 完成各发一条通知，且都在转换落库之后
    let sent = h.notifier.sent();
    assert_eq!(
        sent,
        vec![
            ("13800000001".to_string(), SmsTemplate::Arrival),
            ("13800000001".to_string(), SmsTemplate::Verified),
            ("13800000001".to_string(), SmsTemplate::Completed),
        ]
    );
}

#[tokio::test]
async fn panel_seating_and_token_rotation_scenario() {
    let h = harness();
    seed_teacher(&h.store, "t1", "王老师", Some(5)).await;
    seed_teacher(&h.store, "t2", "李老师", None).await;
    seed_teacher(&h.store, "t3", "赵老师", None).await;
    let panel5 = PanelNumber::new(5).unwrap();

    // T1 首次确认：铸造 tok1
    let tok1 = assert_ok!(h.panel.confirm_identity(5, "t1", "pad-a", None).await)
        .session_token;

    // T2 落座第 5 组（容量到 2）
    assert_ok!(h.panel.assign_teacher(5, "t2", None).await);

    // T3 未指明移除对象：冲突，且 T1/T2 原封不动
    let err = h.panel.assign_teacher(5, "t3", None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
    let occupants = h.store.list_panel_teachers(panel5).await.unwrap();
    assert_eq!(occupants.len(), 2);

    // T3 指明移除 T1：成功
    let outcome = assert_ok!(h.panel.assign_teacher(5, "t3", Some("t1")).await);
    assert_eq!(outcome.removed_teacher_id.as_deref(), Some("t1"));

    // T1 的旧令牌随即失效
    let session = PanelSessionService::new(Arc::clone(&h.store), 30);
    let err = session.validate_session(panel5, &tok1).await.unwrap_err();
    assert!(matches!(err, AppError::SessionInvalid { .. }));

    // T1 已被整组清空
    let t1 = h.store.get_teacher("t1").await.unwrap();
    assert_eq!(t1.panel, None);
    assert_eq!(t1.panel_session_token, None);
}

#[tokio::test]
async fn notifier_outage_never_fails_the_scan() {
    let store = Arc::new(MemoryStore::new());
    store
        .put_applicant(Applicant::registered("APP-030", "李娜", "13800000030"))
        .await
        .unwrap();
    let machine = Arc::new(ApplicantStateMachine::new(
        Arc::clone(&store),
        Arc::new(FailingNotifier),
    ));
    let checkin = CheckinFlow::new(machine);

    // 短信网关全挂，转换照常成功
    let outcome = checkin
        .scan_arrival("APP-030", &CheckinCtx::display_board())
        .await
        .unwrap();
    assert_eq!(outcome.applicant.status, ApplicantStatus::Arrived);
    assert_eq!(store.checkpoints_for("APP-030").len(), 1);
}

#[tokio::test]
async fn credited_teachers_include_whole_panel_roster() {
    let h = harness();
    let mut applicant = Applicant::registered("APP-031", "张敏", "13800000031");
    applicant.status = ApplicantStatus::DocumentVerified;
    h.store.put_applicant(applicant).await.unwrap();
    seed_teacher(&h.store, "t-a", "主考官", Some(8)).await;
    seed_teacher(&h.store, "t-b", "副考官", Some(8)).await;

    let token = assert_ok!(h.panel.confirm_identity(8, "t-a", "pad-a", None).await)
        .session_token;
    assert_ok!(h.panel.start_interview(8, &token, "APP-031").await);
    let done = assert_ok!(h.panel.complete_interview(8, &token, "APP-031").await);

    // 确认教师 ∪ 组内在岗教师，去重、顺序无关
    assert_eq!(
        done.interviewed_by_emails.as_deref(),
        Some("t-a@school.cn,t-b@school.cn")
    );
}
