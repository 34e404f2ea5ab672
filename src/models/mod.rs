pub mod applicant;
pub mod checkpoint;
pub mod loaders;
pub mod teacher;

pub use applicant::{Applicant, ApplicantStatus};
pub use checkpoint::{ActorRef, Checkpoint, CheckpointType};
pub use teacher::{PanelNumber, Teacher};
