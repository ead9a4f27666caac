//! Helpdesk Stages: the ticket resolution workflow.
//!
//! # Pipeline Flow
//!
//! ```text
//! Intake → Understand → Prepare → Ask ⏸ → Wait → Retrieve → Decide → Update → Create → Do → Complete
//!              ↓            ↓       ↓                ↓          ↓        ↓         ↓
//!          entities     entities  question        kb_data    score   close or   response
//!                                 + answer                  decision  update
//! ```
//!
//! Every stage runs on every ticket. Decide only changes which calls Update
//! issues and whether an escalation call is made, never the stage order.

mod act;
mod ask;
mod complete;
mod create;
mod decide;
mod desk;
mod intake;
mod prepare;
mod retrieve;
mod understand;
mod update;
mod wait;

pub use act::DoStage;
pub use ask::AskStage;
pub use complete::CompleteStage;
pub use create::CreateStage;
pub use decide::{read_score, DecideStage};
pub use desk::{TicketDesk, TicketRun};
pub use intake::IntakeStage;
pub use prepare::PrepareStage;
pub use retrieve::RetrieveStage;
pub use understand::UnderstandStage;
pub use update::UpdateStage;
pub use wait::WaitStage;

use helpdesk_core::{Stage, WorkflowEngine};

/// Stage names in execution order
pub const STAGE_NAMES: [&str; 11] = [
    "Intake",
    "Understand",
    "Prepare",
    "Ask",
    "Wait",
    "Retrieve",
    "Decide",
    "Update",
    "Create",
    "Do",
    "Complete",
];

/// The eleven stages in execution order.
pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(IntakeStage),
        Box::new(UnderstandStage),
        Box::new(PrepareStage),
        Box::new(AskStage),
        Box::new(WaitStage),
        Box::new(RetrieveStage),
        Box::new(DecideStage),
        Box::new(UpdateStage),
        Box::new(CreateStage),
        Box::new(DoStage),
        Box::new(CompleteStage),
    ]
}

pub fn standard_pipeline() -> WorkflowEngine {
    WorkflowEngine::new(standard_stages())
}
