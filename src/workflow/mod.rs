pub mod checkin_ctx;
pub mod checkin_flow;
pub mod panel_flow;

pub use checkin_ctx::CheckinCtx;
pub use checkin_flow::{ArrivalOutcome, CheckinFlow};
pub use panel_flow::PanelFlow;
