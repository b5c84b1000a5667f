use campus_recruit::workflows::recruitment::{
    CandidateId, InMemoryCandidateDirectory, InMemoryRecruitmentStore, RecruitmentWorkflow,
    RepositoryError, StageRegistry, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ServiceWorkflow =
    RecruitmentWorkflow<InMemoryRecruitmentStore, InMemoryCandidateDirectory>;

/// User ids at or above this offset own the seeded candidate profiles.
pub(crate) const SEEDED_USER_OFFSET: u64 = 100;

/// Upper bound on seeded candidate profiles accepted from the command line.
pub(crate) const MAX_SEEDED_CANDIDATES: u64 = 10_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Candidate directory pre-populated with `count` profiles: user `100 + n`
/// owns candidate `n`.
pub(crate) fn seeded_directory(count: u64) -> Result<InMemoryCandidateDirectory, RepositoryError> {
    let directory = InMemoryCandidateDirectory::default();
    for n in 1..=count {
        directory.register(seeded_user(n), CandidateId(n))?;
    }
    Ok(directory)
}

pub(crate) fn seeded_user(n: u64) -> UserId {
    UserId(SEEDED_USER_OFFSET + n)
}

pub(crate) fn in_memory_workflow(
    registry: StageRegistry,
    directory: InMemoryCandidateDirectory,
) -> Arc<ServiceWorkflow> {
    Arc::new(RecruitmentWorkflow::new(
        Arc::new(registry),
        Arc::new(InMemoryRecruitmentStore::default()),
        Arc::new(directory),
    ))
}
