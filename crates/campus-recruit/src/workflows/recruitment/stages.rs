use std::collections::{BTreeSet, HashMap};

use super::domain::{RecruitmentStage, StageId};

/// Names of the institution's default pipeline, in order.
pub const STANDARD_STAGE_NAMES: [&str; 6] = [
    "Réception",
    "Présélection RH",
    "Entretien",
    "Validation Direction",
    "Contrat",
    "Archivage",
];

/// The single ordered stage sequence shared by every position.
///
/// Stages are kept by id and indexed by `(order, id)`, so two stages with the
/// same `order` are sequenced by id.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: HashMap<StageId, RecruitmentStage>,
    active_index: BTreeSet<(i32, StageId)>,
}

impl StageRegistry {
    pub fn new(stages: impl IntoIterator<Item = RecruitmentStage>) -> Self {
        let mut registry = Self::default();
        for stage in stages {
            if let Some(previous) = registry.stages.get(&stage.id) {
                registry.active_index.remove(&(previous.order, previous.id));
            }
            if stage.is_active {
                registry.active_index.insert((stage.order, stage.id));
            }
            registry.stages.insert(stage.id, stage);
        }
        registry
    }

    /// Active stages named in pipeline order, ids and orders assigned from 1.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().enumerate().map(|(idx, name)| {
            let position = idx as u64 + 1;
            RecruitmentStage {
                id: StageId(position),
                name: name.into(),
                order: position as i32,
                is_active: true,
            }
        }))
    }

    pub fn standard() -> Self {
        Self::from_names(STANDARD_STAGE_NAMES)
    }

    pub fn get(&self, id: StageId) -> Option<&RecruitmentStage> {
        self.stages.get(&id)
    }

    /// Active stage with the lowest order, where new positions start.
    pub fn first_active(&self) -> Option<&RecruitmentStage> {
        self.active_index
            .iter()
            .next()
            .and_then(|(_, id)| self.stages.get(id))
    }

    /// The active stage following `stage`, or `None` when `stage` is the last one.
    ///
    /// `stage` itself need not be active; only stages with a strictly greater
    /// order qualify.
    pub fn next_stage(&self, stage: &RecruitmentStage) -> Option<&RecruitmentStage> {
        self.active_index
            .range((stage.order.saturating_add(1), StageId(0))..)
            .next()
            .filter(|(order, _)| *order > stage.order)
            .and_then(|(_, id)| self.stages.get(id))
    }

    pub fn active(&self) -> Vec<&RecruitmentStage> {
        self.active_index
            .iter()
            .filter_map(|(_, id)| self.stages.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
