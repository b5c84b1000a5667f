use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a recruitment stage in the shared pipeline.
    StageId
);
numeric_id!(
    /// Identifier of an open (or closed) position.
    PositionId
);
numeric_id!(
    /// Identifier of a candidate's application to one position.
    ApplicationId
);
numeric_id!(
    /// Identifier of a candidate profile.
    CandidateId
);
numeric_id!(
    /// Identifier of an authenticated user account.
    UserId
);
numeric_id!(CommentId);

/// One ordered step of the recruitment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitmentStage {
    pub id: StageId,
    pub name: String,
    pub order: i32,
    pub is_active: bool,
}

/// Lifecycle of a position, independent of its recruitment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    #[default]
    Open,
    InProgress,
    Filled,
    Cancelled,
}

impl PositionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::InProgress => "in_progress",
            PositionStatus::Filled => "filled",
            PositionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub title: String,
    pub department: String,
    pub status: PositionStatus,
    pub current_stage: Option<StageId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a position; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionDraft {
    pub title: String,
    pub department: String,
    pub current_stage: Option<StageId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Where an application stands at its position's current stage.
///
/// `Approved` and `Rejected` are mutually exclusive by construction; the flat
/// `is_active` / `is_approved_current_stage` flags are derived from this.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageStanding {
    #[default]
    Pending,
    Approved,
    Rejected {
        reason: String,
        stage: Option<StageId>,
    },
}

/// Derived status exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A state precondition that an application did not meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot approve a rejected application")]
    ApproveRejected,
    #[error("application is already rejected")]
    AlreadyRejected,
    #[error("application is already active")]
    AlreadyActive,
}

/// What happened to an active application when its position moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    CarriedOver,
    Eliminated,
}

/// One candidate's bid for one position.
///
/// The application has no stage of its own: it is always at its position's
/// current stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate: CandidateId,
    pub position: PositionId,
    pub standing: StageStanding,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every committed write.
    pub revision: u64,
}

pub const AUTO_REJECTION_REASON: &str = "Non approuvée lors du passage au stage suivant";

impl Application {
    pub fn is_active(&self) -> bool {
        !matches!(self.standing, StageStanding::Rejected { .. })
    }

    pub fn is_approved_current_stage(&self) -> bool {
        matches!(self.standing, StageStanding::Approved)
    }

    pub fn rejection_reason(&self) -> &str {
        match &self.standing {
            StageStanding::Rejected { reason, .. } => reason,
            _ => "",
        }
    }

    pub fn rejection_stage(&self) -> Option<StageId> {
        match &self.standing {
            StageStanding::Rejected { stage, .. } => *stage,
            _ => None,
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        match self.standing {
            StageStanding::Rejected { .. } => ApplicationStatus::Rejected,
            StageStanding::Approved => ApplicationStatus::Approved,
            StageStanding::Pending => ApplicationStatus::Pending,
        }
    }

    /// The stage this application is at, read through its position.
    pub fn current_stage(&self, position: &Position) -> Option<StageId> {
        debug_assert_eq!(position.id, self.position);
        position.current_stage
    }

    pub(crate) fn approve(&mut self) -> Result<(), TransitionError> {
        if !self.is_active() {
            return Err(TransitionError::ApproveRejected);
        }
        self.standing = StageStanding::Approved;
        Ok(())
    }

    pub(crate) fn reject(
        &mut self,
        reason: impl Into<String>,
        stage: Option<StageId>,
    ) -> Result<(), TransitionError> {
        if !self.is_active() {
            return Err(TransitionError::AlreadyRejected);
        }
        self.standing = StageStanding::Rejected {
            reason: reason.into(),
            stage,
        };
        Ok(())
    }

    pub(crate) fn reactivate(&mut self) -> Result<(), TransitionError> {
        if self.is_active() {
            return Err(TransitionError::AlreadyActive);
        }
        self.standing = StageStanding::Pending;
        Ok(())
    }

    /// Resolve an active application when its position leaves `stage`:
    /// approved ones start the next stage pending, everything else is rejected.
    pub(crate) fn resolve_stage_exit(&mut self, stage: StageId) -> AdvanceOutcome {
        if self.is_approved_current_stage() {
            self.standing = StageStanding::Pending;
            AdvanceOutcome::CarriedOver
        } else {
            self.standing = StageStanding::Rejected {
                reason: AUTO_REJECTION_REASON.to_string(),
                stage: Some(stage),
            };
            AdvanceOutcome::Eliminated
        }
    }
}

/// Audit log entry attached to an application. Never edited once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub application: ApplicationId,
    /// Empty once the authoring account has been removed.
    pub author: Option<UserId>,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment waiting to be appended by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub application: ApplicationId,
    pub author: Option<UserId>,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn by(actor: &Actor, application: ApplicationId, content: impl Into<String>) -> Self {
        Self {
            application,
            author: Some(actor.id),
            author_name: Some(actor.display_name.clone()),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Role held by an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hr,
    DepartmentHead,
    Direction,
    Candidate,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Hr => "hr",
            Role::DepartmentHead => "department_head",
            Role::Direction => "direction",
            Role::Candidate => "candidate",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hr" | "rh" => Some(Self::Hr),
            "department_head" | "chefdedepartement" => Some(Self::DepartmentHead),
            "direction" => Some(Self::Direction),
            "candidate" | "candidat" => Some(Self::Candidate),
            _ => None,
        }
    }
}

/// Already-authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    pub display_name: String,
}
