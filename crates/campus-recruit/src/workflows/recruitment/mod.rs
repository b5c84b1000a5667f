//! Recruitment-stage workflow: the shared stage pipeline, applications bound
//! to their position's current stage, and the audited transitions between them.

pub mod domain;
pub mod engine;
pub mod memory;
pub mod repository;
pub mod router;
pub mod stages;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, Application, ApplicationId, ApplicationStatus, CandidateId, Comment, CommentId,
    Position, PositionId, PositionStatus, RecruitmentStage, Role, StageId, StageStanding,
    TransitionError, UserId, AUTO_REJECTION_REASON,
};
pub use engine::{
    ApplicationDetail, ApplicationFilter, RecruitmentWorkflow, StageAdvance, StageStatistics,
    WorkflowError, APPROVAL_NOTE, AUTO_REJECTION_NOTE, REACTIVATION_NOTE, STAGE_ADVANCE_PREFIX,
};
pub use memory::{InMemoryCandidateDirectory, InMemoryRecruitmentStore};
pub use repository::{
    CandidateDirectory, Changeset, RecruitmentRepository, RepositoryError, StageMove,
};
pub use router::recruitment_router;
pub use stages::{StageRegistry, STANDARD_STAGE_NAMES};
