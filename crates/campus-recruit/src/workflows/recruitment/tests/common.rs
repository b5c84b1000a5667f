use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::workflows::recruitment::domain::{
    Actor, Application, ApplicationId, CandidateId, Comment, Position, PositionDraft, PositionId,
    RecruitmentStage, Role, StageId, UserId,
};
use crate::workflows::recruitment::memory::{InMemoryCandidateDirectory, InMemoryRecruitmentStore};
use crate::workflows::recruitment::repository::{
    Changeset, RecruitmentRepository, RepositoryError,
};
use crate::workflows::recruitment::stages::StageRegistry;
use crate::workflows::recruitment::RecruitmentWorkflow;

pub(super) type MemoryWorkflow = RecruitmentWorkflow<InMemoryRecruitmentStore, InMemoryCandidateDirectory>;

pub(super) const RECEPTION: StageId = StageId(1);
pub(super) const PRE_SELECTION: StageId = StageId(2);
pub(super) const INTERVIEW: StageId = StageId(3);

/// Reception(1), PreSelection(2), Interview(3), all active.
pub(super) fn three_stage_registry() -> StageRegistry {
    StageRegistry::new([
        stage(RECEPTION, "Reception", 1),
        stage(PRE_SELECTION, "PreSelection", 2),
        stage(INTERVIEW, "Interview", 3),
    ])
}

fn stage(id: StageId, name: &str, order: i32) -> RecruitmentStage {
    RecruitmentStage {
        id,
        name: name.to_string(),
        order,
        is_active: true,
    }
}

pub(super) fn hr() -> Actor {
    Actor {
        id: UserId(1),
        role: Role::Hr,
        display_name: "Nadia Benali".to_string(),
    }
}

pub(super) fn candidate_user(n: u64) -> Actor {
    Actor {
        id: UserId(100 + n),
        role: Role::Candidate,
        display_name: format!("Candidate {n}"),
    }
}

pub(super) struct Fixture {
    pub(super) service: Arc<MemoryWorkflow>,
    pub(super) store: Arc<InMemoryRecruitmentStore>,
    pub(super) directory: Arc<InMemoryCandidateDirectory>,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(three_stage_registry())
}

pub(super) fn fixture_with(registry: StageRegistry) -> Fixture {
    let store = Arc::new(InMemoryRecruitmentStore::default());
    let directory = Arc::new(InMemoryCandidateDirectory::default());
    for n in 1..=5 {
        directory
            .register(candidate_user(n).id, CandidateId(n))
            .expect("candidate registered");
    }
    let service = Arc::new(RecruitmentWorkflow::new(
        Arc::new(registry),
        store.clone(),
        directory.clone(),
    ));
    Fixture {
        service,
        store,
        directory,
    }
}

impl Fixture {
    pub(super) fn open_position(&self, stage: Option<StageId>) -> PositionId {
        self.service
            .open_position(&hr(), "Assistant Professor, Networks", "Computer Science", stage)
            .expect("position opens")
            .id
    }

    pub(super) fn apply(&self, n: u64, position: PositionId) -> ApplicationId {
        self.service
            .apply(&candidate_user(n), position)
            .expect("application accepted")
            .id
    }

    pub(super) fn stored(&self, id: ApplicationId) -> Application {
        self.store
            .application(id)
            .expect("fetch succeeds")
            .expect("application present")
    }

    pub(super) fn position(&self, id: PositionId) -> Position {
        self.store
            .position(id)
            .expect("fetch succeeds")
            .expect("position present")
    }

    pub(super) fn comments(&self, id: ApplicationId) -> Vec<Comment> {
        self.store.comments(id).expect("comments load")
    }

    pub(super) fn comment_count(&self) -> usize {
        self.store.comment_count().expect("count loads")
    }
}

/// Store whose reads succeed but whose commits always fail.
#[derive(Default)]
pub(super) struct BrokenCommitStore {
    pub(super) inner: InMemoryRecruitmentStore,
}

impl RecruitmentRepository for BrokenCommitStore {
    fn insert_position(&self, draft: PositionDraft) -> Result<Position, RepositoryError> {
        self.inner.insert_position(draft)
    }

    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        self.inner.position(id)
    }

    fn insert_application(
        &self,
        candidate: CandidateId,
        position: PositionId,
        applied_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(candidate, position, applied_at)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.application(id)
    }

    fn applications_for_position(
        &self,
        position: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_position(position)
    }

    fn comments(&self, application: ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        self.inner.comments(application)
    }

    fn commit(&self, _changeset: Changeset) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }
}

/// Store that, once armed, holds every commit until `parties` callers have
/// reached it, so their reads all happen before any of them writes.
pub(super) struct RendezvousStore {
    pub(super) inner: InMemoryRecruitmentStore,
    armed: AtomicBool,
    barrier: Barrier,
}

impl RendezvousStore {
    pub(super) fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryRecruitmentStore::default(),
            armed: AtomicBool::new(false),
            barrier: Barrier::new(parties),
        }
    }

    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl RecruitmentRepository for RendezvousStore {
    fn insert_position(&self, draft: PositionDraft) -> Result<Position, RepositoryError> {
        self.inner.insert_position(draft)
    }

    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        self.inner.position(id)
    }

    fn insert_application(
        &self,
        candidate: CandidateId,
        position: PositionId,
        applied_at: DateTime<Utc>,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(candidate, position, applied_at)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.application(id)
    }

    fn applications_for_position(
        &self,
        position: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_position(position)
    }

    fn comments(&self, application: ApplicationId) -> Result<Vec<Comment>, RepositoryError> {
        self.inner.comments(application)
    }

    fn commit(&self, changeset: Changeset) -> Result<(), RepositoryError> {
        if self.armed.load(Ordering::SeqCst) {
            self.barrier.wait();
        }
        self.inner.commit(changeset)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}
