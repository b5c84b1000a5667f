use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Actor, AdvanceOutcome, Application, ApplicationId, ApplicationStatus, CandidateId, Comment,
    NewComment, Position, PositionDraft, PositionId, RecruitmentStage, StageId, TransitionError,
};
use super::repository::{
    CandidateDirectory, Changeset, RecruitmentRepository, RepositoryError, StageMove,
};
use super::stages::StageRegistry;

pub const APPROVAL_NOTE: &str = "Application approved for this stage";
pub const REACTIVATION_NOTE: &str = "Application reactivated";
pub const AUTO_REJECTION_NOTE: &str = "Application automatically rejected on stage advance";
pub const STAGE_ADVANCE_PREFIX: &str = "[Passage au stage suivant] ";

/// Result of moving a position to its next stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageAdvance {
    pub approved_count: usize,
    pub rejected_count: usize,
    pub next_stage: RecruitmentStage,
}

impl StageAdvance {
    pub fn summary(&self) -> String {
        format!(
            "{} application(s) moved to {}, {} rejected.",
            self.approved_count, self.next_stage.name, self.rejected_count
        )
    }
}

/// Head counts of a position's applications at its current stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatistics {
    pub position: String,
    pub current_stage: RecruitmentStage,
    pub total_active: usize,
    pub approved_current_stage: usize,
    pub pending_approval: usize,
    pub total_rejected: usize,
    pub can_proceed_to_next: bool,
}

/// Which applications of a position to list. `Active` covers both pending and
/// approved ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationFilter {
    #[default]
    Active,
    Only(ApplicationStatus),
}

impl ApplicationFilter {
    fn matches(self, application: &Application) -> bool {
        match self {
            ApplicationFilter::Active => application.is_active(),
            ApplicationFilter::Only(status) => application.status() == status,
        }
    }
}

/// Application joined with its position, stage and comment trail for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub id: ApplicationId,
    pub candidate: CandidateId,
    pub position: PositionId,
    pub position_title: String,
    pub current_stage: Option<StageId>,
    pub current_stage_name: String,
    pub status: &'static str,
    pub is_active: bool,
    pub is_approved_current_stage: bool,
    pub rejection_reason: String,
    pub rejection_stage: Option<StageId>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
}

/// Orchestrates stage advancement and per-application transitions.
///
/// Each operation reads a snapshot, applies the transition in memory and
/// hands the resulting rows and audit comments to the repository as a single
/// [`Changeset`].
pub struct RecruitmentWorkflow<R, C> {
    stages: Arc<StageRegistry>,
    repository: Arc<R>,
    candidates: Arc<C>,
}

impl<R, C> RecruitmentWorkflow<R, C>
where
    R: RecruitmentRepository + 'static,
    C: CandidateDirectory + 'static,
{
    pub fn new(stages: Arc<StageRegistry>, repository: Arc<R>, candidates: Arc<C>) -> Self {
        Self {
            stages,
            repository,
            candidates,
        }
    }

    pub fn stages(&self) -> &StageRegistry {
        &self.stages
    }

    /// Register a position; without an explicit stage it starts at the first active one.
    pub fn open_position(
        &self,
        actor: &Actor,
        title: impl Into<String>,
        department: impl Into<String>,
        current_stage: Option<StageId>,
    ) -> Result<Position, WorkflowError> {
        let current_stage = match current_stage {
            Some(id) => Some(self.stage(id)?.id),
            None => self.stages.first_active().map(|stage| stage.id),
        };

        let position = self.repository.insert_position(PositionDraft {
            title: title.into(),
            department: department.into(),
            current_stage,
            created_by: actor.id,
            created_at: Utc::now(),
        })?;
        info!(position = %position.id, stage = ?position.current_stage, "position opened");
        Ok(position)
    }

    pub fn position(&self, id: PositionId) -> Result<Position, WorkflowError> {
        self.repository
            .position(id)?
            .ok_or(WorkflowError::NotFound("position"))
    }

    /// File an application on behalf of the candidate profile owned by `actor`.
    pub fn apply(
        &self,
        actor: &Actor,
        position: PositionId,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let candidate = self
            .candidates
            .candidate_for(actor.id)?
            .ok_or(WorkflowError::NotFound("candidate profile"))?;
        let position = self.position(position)?;

        let application = self
            .repository
            .insert_application(candidate, position.id, Utc::now())
            .map_err(|err| match err {
                RepositoryError::Conflict => WorkflowError::DuplicateApplication,
                other => WorkflowError::Repository(other),
            })?;
        info!(application = %application.id, position = %position.id, "application received");
        self.detail_for(application, &position)
    }

    pub fn approve(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let mut application = self.application(id)?;
        application
            .approve()
            .map_err(|err| self.refused(id, err))?;

        self.repository.commit(Changeset {
            comments: vec![NewComment::by(actor, id, APPROVAL_NOTE)],
            applications: vec![application],
            stage_move: None,
        })?;
        info!(application = %id, actor = %actor.id, "application approved for current stage");
        self.detail(id)
    }

    pub fn reject(
        &self,
        actor: &Actor,
        id: ApplicationId,
        reason: &str,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let mut application = self.application(id)?;
        let position = self.position(application.position)?;
        let stage = application.current_stage(&position);
        application
            .reject(reason, stage)
            .map_err(|err| self.refused(id, err))?;

        self.repository.commit(Changeset {
            comments: vec![NewComment::by(
                actor,
                id,
                format!("Application rejected: {reason}"),
            )],
            applications: vec![application],
            stage_move: None,
        })?;
        info!(application = %id, actor = %actor.id, "application rejected");
        self.detail(id)
    }

    pub fn reactivate(
        &self,
        actor: &Actor,
        id: ApplicationId,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let mut application = self.application(id)?;
        application
            .reactivate()
            .map_err(|err| self.refused(id, err))?;

        self.repository.commit(Changeset {
            comments: vec![NewComment::by(actor, id, REACTIVATION_NOTE)],
            applications: vec![application],
            stage_move: None,
        })?;
        info!(application = %id, actor = %actor.id, "application reactivated");
        self.detail(id)
    }

    /// Move a position to its next stage, carrying approved applications over
    /// and rejecting every other active one.
    pub fn advance_stage(
        &self,
        actor: &Actor,
        position: PositionId,
        global_comment: Option<&str>,
    ) -> Result<StageAdvance, WorkflowError> {
        let position = self.position(position)?;
        let current = position
            .current_stage
            .ok_or(WorkflowError::NoCurrentStage)?;
        let current = self.stage(current)?;
        let next = self
            .stages
            .next_stage(current)
            .ok_or(WorkflowError::NoNextStage)?
            .clone();

        let global_comment = global_comment
            .map(str::trim)
            .filter(|comment| !comment.is_empty());

        let mut changeset = Changeset {
            stage_move: Some(StageMove {
                position: position.id,
                from: current.id,
                to: next.id,
            }),
            ..Changeset::default()
        };
        let mut approved_count = 0;
        let mut rejected_count = 0;

        let active = self
            .repository
            .applications_for_position(position.id)?
            .into_iter()
            .filter(Application::is_active);

        for mut application in active {
            match application.resolve_stage_exit(current.id) {
                AdvanceOutcome::CarriedOver => {
                    approved_count += 1;
                    if let Some(comment) = global_comment {
                        changeset.comments.push(NewComment::by(
                            actor,
                            application.id,
                            format!("{STAGE_ADVANCE_PREFIX}{comment}"),
                        ));
                    }
                }
                AdvanceOutcome::Eliminated => {
                    rejected_count += 1;
                    changeset.comments.push(NewComment::by(
                        actor,
                        application.id,
                        AUTO_REJECTION_NOTE,
                    ));
                }
            }
            changeset.applications.push(application);
        }

        self.repository.commit(changeset)?;
        info!(
            position = %position.id,
            from = %current.name,
            to = %next.name,
            approved_count,
            rejected_count,
            "position advanced to next stage"
        );

        Ok(StageAdvance {
            approved_count,
            rejected_count,
            next_stage: next,
        })
    }

    /// Append a free-form note to an application's trail.
    pub fn add_comment(
        &self,
        actor: &Actor,
        id: ApplicationId,
        content: &str,
    ) -> Result<Vec<Comment>, WorkflowError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(WorkflowError::InvalidInput("comment content is empty"));
        }
        self.application(id)?;
        self.repository.commit(Changeset {
            comments: vec![NewComment::by(actor, id, content)],
            ..Changeset::default()
        })?;
        self.comments(id)
    }

    pub fn comments(&self, id: ApplicationId) -> Result<Vec<Comment>, WorkflowError> {
        self.application(id)?;
        Ok(self.repository.comments(id)?)
    }

    pub fn detail(&self, id: ApplicationId) -> Result<ApplicationDetail, WorkflowError> {
        let application = self.application(id)?;
        let position = self.position(application.position)?;
        self.detail_for(application, &position)
    }

    pub fn applications(
        &self,
        position: PositionId,
        filter: ApplicationFilter,
    ) -> Result<Vec<ApplicationDetail>, WorkflowError> {
        let position = self.position(position)?;
        let mut matching: Vec<Application> = self
            .repository
            .applications_for_position(position.id)?
            .into_iter()
            .filter(|application| filter.matches(application))
            .collect();
        matching.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));

        matching
            .into_iter()
            .map(|application| self.detail_for(application, &position))
            .collect()
    }

    pub fn stage_statistics(&self, position: PositionId) -> Result<StageStatistics, WorkflowError> {
        let position = self.position(position)?;
        let current = position
            .current_stage
            .ok_or(WorkflowError::NoCurrentStage)?;
        let current_stage = self.stage(current)?.clone();

        let applications = self.repository.applications_for_position(position.id)?;
        let count = |status: ApplicationStatus| {
            applications
                .iter()
                .filter(|application| application.status() == status)
                .count()
        };
        let approved_current_stage = count(ApplicationStatus::Approved);
        let pending_approval = count(ApplicationStatus::Pending);

        Ok(StageStatistics {
            position: position.title,
            current_stage,
            total_active: approved_current_stage + pending_approval,
            approved_current_stage,
            pending_approval,
            total_rejected: count(ApplicationStatus::Rejected),
            can_proceed_to_next: approved_current_stage > 0,
        })
    }

    fn application(&self, id: ApplicationId) -> Result<Application, WorkflowError> {
        self.repository
            .application(id)?
            .ok_or(WorkflowError::NotFound("application"))
    }

    fn stage(&self, id: StageId) -> Result<&RecruitmentStage, WorkflowError> {
        self.stages.get(id).ok_or(WorkflowError::NotFound("stage"))
    }

    fn refused(&self, id: ApplicationId, err: TransitionError) -> WorkflowError {
        warn!(application = %id, error = %err, "transition refused");
        WorkflowError::InvalidTransition(err)
    }

    fn detail_for(
        &self,
        application: Application,
        position: &Position,
    ) -> Result<ApplicationDetail, WorkflowError> {
        let current_stage = application.current_stage(position);
        let current_stage_name = current_stage
            .and_then(|id| self.stages.get(id))
            .map(|stage| stage.name.clone())
            .unwrap_or_else(|| "-".to_string());
        let comments = self.repository.comments(application.id)?;

        Ok(ApplicationDetail {
            id: application.id,
            candidate: application.candidate,
            position: position.id,
            position_title: position.title.clone(),
            current_stage,
            current_stage_name,
            status: application.status().label(),
            is_active: application.is_active(),
            is_approved_current_stage: application.is_approved_current_stage(),
            rejection_reason: application.rejection_reason().to_string(),
            rejection_stage: application.rejection_stage(),
            applied_at: application.applied_at,
            updated_at: application.updated_at,
            comments,
        })
    }
}

/// Error raised by the recruitment workflow.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("position has no current stage")]
    NoCurrentStage,
    #[error("no next stage available")]
    NoNextStage,
    #[error("candidate has already applied to this position")]
    DuplicateApplication,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
