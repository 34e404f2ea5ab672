pub mod checkpoint_ledger;
pub mod notifier;
pub mod panel_session;
pub mod state_machine;

pub use checkpoint_ledger::CheckpointLedger;
pub use notifier::{LogNotifier, Notifier, SmsTemplate};
pub use panel_session::{mint_session_token, PanelSessionService, SessionTeacher};
pub use state_machine::ApplicantStateMachine;
