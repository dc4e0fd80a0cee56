//! Onboarding plans, progress aggregation, badges and rankings, plus the service and HTTP
//! surface built on them.
//!
//! `plan`, `mutation`, `progress`, `badges` and `leaderboard` are pure and never touch I/O.
//! The collaborator seams (`repository`, `generation`, `auth`) are traits so the service can be
//! exercised with in-memory implementations.

pub mod auth;
pub mod badges;
pub mod domain;
pub mod drive;
pub mod generation;
pub mod leaderboard;
pub mod mutation;
pub mod plan;
pub mod progress;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, IdentityProvider, Principal, Role};
pub use badges::{Badge, BadgeView};
pub use domain::{
    Challenge, ChallengeId, DailyQuizPointer, Message, MessageSender, Question, Quiz,
    QuizCompletion, QuizId, QuizScore, Review, Submission, SubmissionId, TestCase, Trainee,
    TraineeId, TraineeStatus,
};
pub use drive::GoogleDriveStorage;
pub use generation::{
    ChatCompletionsClient, ChatCompletionsConfig, GenerationError, PromptRequest, PromptTemplate,
    TextGenerator,
};
pub use leaderboard::{
    export_leaderboard_csv, LeaderboardEntry, LeaderboardExportError, SortDirection, TableSort,
    TraineeColumn, TraineeFilter,
};
pub use mutation::{PlanEdit, PlanEditError, TaskFieldValue, WeekFieldValue};
pub use plan::{Plan, PlanValidationError, PlanWeek, Task, TaskKey, TaskKind, TaskStatus, WeekStatus};
pub use progress::{CertificationStatus, TraineeSnapshot};
pub use repository::{
    FileStorage, OnboardingRepository, RepositoryError, StorageError, StoredFile, TraineePatch,
};
pub use roster::{RosterImportError, RosterImporter};
pub use router::onboarding_router;
pub use service::{
    AssignmentUpload, ChallengeOutcome, MindsetError, OnboardingService, ProgressReport,
    QuizAttemptOutcome, TaskCompletion, TraineeDashboard, TraineeSummary, ValidationError,
};
