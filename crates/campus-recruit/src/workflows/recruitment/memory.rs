//! In-memory storage backing the API service, the CLI demo, and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, CandidateId, Comment, CommentId, Position, PositionDraft,
    PositionId, PositionStatus, StageStanding, UserId,
};
use super::repository::{CandidateDirectory, Changeset, RecruitmentRepository, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    positions: BTreeMap<PositionId, Position>,
    applications: BTreeMap<ApplicationId, Application>,
    /// Uniqueness index over (candidate, position).
    by_candidate: HashMap<(CandidateId, PositionId), ApplicationId>,
    comments: Vec<Comment>,
    next_position_id: u64,
    next_application_id: u64,
    next_comment_id: u64,
}

impl StoreState {
    fn validate(&self, changeset: &Changeset) -> Result<(), RepositoryError> {
        if let Some(stage_move) = &changeset.stage_move {
            let position = self
                .positions
                .get(&stage_move.position)
                .ok_or(RepositoryError::NotFound)?;
            if position.current_stage != Some(stage_move.from) {
                return Err(RepositoryError::Conflict);
            }
        }

        for application in &changeset.applications {
            let stored = self
                .applications
                .get(&application.id)
                .ok_or(RepositoryError::NotFound)?;
            if stored.revision != application.revision {
                return Err(RepositoryError::Conflict);
            }
        }

        if changeset
            .comments
            .iter()
            .any(|comment| !self.applications.contains_key(&comment.application))
        {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    fn apply(&mut self, changeset: Changeset, now: DateTime<Utc>) {
        if let Some(stage_move) = changeset.stage_move {
            if let Some(position) = self.positions.get_mut(&stage_move.position) {
                position.current_stage = Some(stage_move.to);
            }
        }

        for mut application in changeset.applications {
            application.revision += 1;
            application.updated_at = now;
            self.applications.insert(application.id, application);
        }

        for comment in changeset.comments {
            self.next_comment_id += 1;
            self.comments.push(Comment {
                id: CommentId(self.next_comment_id),
                application: comment.application,
                author: comment.author,
                author_name: comment.author_name,
                content: comment.content,
                created_at: comment.created_at,
            });
        }
    }
}

/// Single-mutex store: a commit validates the whole changeset before writing
/// any row, so readers never observe half of it.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecruitmentStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRecruitmentStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Detach a removed user account from the comments it wrote; the
    /// comments and the recorded display name are kept.
    pub fn detach_author(&self, user: UserId) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        let mut detached = 0;
        for comment in state.comments.iter_mut() {
            if comment.author == Some(user) {
                comment.author = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    pub fn comment_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.comments.len())
    }
}

impl RecruitmentRepository for InMemoryRecruitmentStore {
    fn insert_position(&self, draft: PositionDraft) -> Result<Position, RepositoryError> {
        let mut state = self.lock()?;
        state.next_position_id += 1;
        let position = Position {
            id: PositionId(state.next_position_id),
            title: draft.title,
            department: draft.department,
            status: PositionStatus::Open,
            current_stage: draft.current_stage,
            created_by: draft.created_by,
            created_at: draft.created_at,
        };
        state.positions.insert(position.id, position.clone());
        Ok(position)
    }

    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        Ok(self.lock()?.positions.get(&id).cloned())
    }

    fn insert_application(
        &self,
        candidate: CandidateId,
        position: PositionId,
        applied_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if !state.positions.contains_key(&position) {
            return Err(RepositoryError::NotFound);
        }
        if state.by_candidate.contains_key(&(candidate, position)) {
            return Err(RepositoryError::Conflict);
        }

        state.next_application_id += 1;
        let application = Application {
            id: ApplicationId(state.next_application_id),
            candidate,
            position,
            standing: StageStanding::Pending,
            applied_at,
            updated_at: applied_at,
            revision: 0,
        };
        state
            .by_candidate
            .insert((candidate, position), application.id);
        state
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn applications_for_position(
        &self,
        position: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .values()
            .filter(|application| application.position == position)
            .cloned()
            .collect())
    }

    fn comments(&self, application: ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        let state = self.lock()?;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|comment| comment.application == application)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    fn commit(&self, changeset: Changeset) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.validate(&changeset)?;
        state.apply(changeset, Utc::now());
        Ok(())
    }
}

/// Candidate profiles keyed by the owning user account.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCandidateDirectory {
    profiles: Arc<Mutex<HashMap<UserId, CandidateId>>>,
}

impl InMemoryCandidateDirectory {
    pub fn register(&self, user: UserId, candidate: CandidateId) -> Result<(), RepositoryError> {
        let mut profiles = self
            .profiles
            .lock()
            .map_err(|_| RepositoryError::Unavailable("directory mutex poisoned".to_string()))?;
        if profiles.contains_key(&user) {
            return Err(RepositoryError::Conflict);
        }
        profiles.insert(user, candidate);
        Ok(())
    }
}

impl CandidateDirectory for InMemoryCandidateDirectory {
    fn candidate_for(&self, user: UserId) -> Result<Option<CandidateId>, RepositoryError> {
        let profiles = self
            .profiles
            .lock()
            .map_err(|_| RepositoryError::Unavailable("directory mutex poisoned".to_string()))?;
        Ok(profiles.get(&user).copied())
    }
}
