use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, CandidateId, Comment, NewComment, Position, PositionDraft,
    PositionId, StageId, UserId,
};

/// Move of a position from one stage to the next, applied only if the
/// position is still at `from` when the changeset commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMove {
    pub position: PositionId,
    pub from: StageId,
    pub to: StageId,
}

/// Every row write and audit comment of one workflow operation.
///
/// Application rows carry the revision they were read at; a commit whose rows
/// are stale is refused as a whole.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub applications: Vec<Application>,
    pub stage_move: Option<StageMove>,
    pub comments: Vec<NewComment>,
}

/// Storage abstraction over positions, applications, and the comment log.
///
/// `commit` is the only write path for existing rows and must be all-or-nothing.
pub trait RecruitmentRepository: Send + Sync {
    fn insert_position(&self, draft: PositionDraft) -> Result<Position, RepositoryError>;
    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the candidate already applied.
    fn insert_application(
        &self,
        candidate: CandidateId,
        position: PositionId,
        applied_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError>;
    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn applications_for_position(
        &self,
        position: PositionId,
    ) -> Result<Vec<Application>, RepositoryError>;
    /// Comments of one application, newest first.
    fn comments(&self, application: ApplicationId) -> Result<Vec<Comment>, RepositoryError>;
    fn commit(&self, changeset: Changeset) -> Result<(), RepositoryError>;
}

/// Resolves the candidate profile attached to an authenticated user.
pub trait CandidateDirectory: Send + Sync {
    fn candidate_for(&self, user: UserId) -> Result<Option<CandidateId>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
