use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Challenge, ChallengeId, DailyQuizPointer, Message, Quiz, QuizCompletion, QuizId, Submission,
    SubmissionId, Trainee, TraineeId,
};
use super::plan::Plan;

/// Document store behind the onboarding service.
///
/// Implementations only persist; every rule lives in the service and the pure modules.
pub trait OnboardingRepository: Send + Sync {
    fn trainees(&self) -> Result<Vec<Trainee>, RepositoryError>;
    fn trainee(&self, id: &TraineeId) -> Result<Option<Trainee>, RepositoryError>;
    fn trainee_by_email(&self, email: &str) -> Result<Option<Trainee>, RepositoryError>;
    fn trainees_in_department(&self, department: &str) -> Result<Vec<Trainee>, RepositoryError>;
    fn insert_trainee(&self, trainee: Trainee) -> Result<Trainee, RepositoryError>;
    fn update_trainee(
        &self,
        id: &TraineeId,
        patch: TraineePatch,
    ) -> Result<Trainee, RepositoryError>;
    /// Whole-document replace; the last writer wins. Task keys must be stored as given, since
    /// submissions and task completions refer to them.
    fn replace_plan(&self, id: &TraineeId, plan: Plan) -> Result<(), RepositoryError>;

    fn quizzes(&self) -> Result<Vec<Quiz>, RepositoryError>;
    fn quiz(&self, id: &QuizId) -> Result<Option<Quiz>, RepositoryError>;
    fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, RepositoryError>;

    fn challenges(&self) -> Result<Vec<Challenge>, RepositoryError>;
    fn challenge(&self, id: &ChallengeId) -> Result<Option<Challenge>, RepositoryError>;
    fn insert_challenge(&self, challenge: Challenge) -> Result<Challenge, RepositoryError>;

    fn submissions_for(&self, trainee: &TraineeId) -> Result<Vec<Submission>, RepositoryError>;
    fn submission(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;
    fn insert_submission(&self, submission: Submission) -> Result<Submission, RepositoryError>;
    fn update_submission(&self, submission: Submission) -> Result<(), RepositoryError>;

    fn messages(&self, trainee: &TraineeId) -> Result<Vec<Message>, RepositoryError>;
    fn append_message(&self, trainee: &TraineeId, message: Message)
        -> Result<(), RepositoryError>;

    fn daily_quiz(&self) -> Result<Option<DailyQuizPointer>, RepositoryError>;
    fn set_daily_quiz(&self, pointer: DailyQuizPointer) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Partial trainee update; `None` leaves the stored field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraineePatch {
    pub name: Option<String>,
    pub department: Option<String>,
    pub batch: Option<String>,
    pub progress: Option<u8>,
    pub onboarding_plan: Option<Plan>,
    pub quiz_completions: Option<Vec<QuizCompletion>>,
    pub completed_challenge_ids: Option<Vec<ChallengeId>>,
    pub assigned_quiz_ids: Option<Vec<QuizId>>,
    pub assigned_challenge_ids: Option<Vec<ChallengeId>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl TraineePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Writes the set fields into `trainee`, clamping progress on the way in.
    pub fn apply_to(self, trainee: &mut Trainee) {
        if let Some(name) = self.name {
            trainee.name = name;
        }
        if let Some(department) = self.department {
            trainee.department = department;
        }
        if let Some(batch) = self.batch {
            trainee.batch = batch;
        }
        if let Some(progress) = self.progress {
            trainee.set_progress(progress);
        }
        if let Some(plan) = self.onboarding_plan {
            trainee.onboarding_plan = plan;
        }
        if let Some(completions) = self.quiz_completions {
            trainee.quiz_completions = completions;
        }
        if let Some(ids) = self.completed_challenge_ids {
            trainee.completed_challenge_ids = ids;
        }
        if let Some(ids) = self.assigned_quiz_ids {
            trainee.assigned_quiz_ids = ids;
        }
        if let Some(ids) = self.assigned_challenge_ids {
            trainee.assigned_challenge_ids = ids;
        }
        if let Some(at) = self.last_login {
            trainee.last_login = Some(at);
        }
    }
}

/// Blob store for uploaded assignment files.
pub trait FileStorage: Send + Sync {
    fn store(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("file storage unavailable: {0}")]
    Unavailable(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_clamps_progress_and_keeps_unset_fields() {
        let mut trainee = Trainee::new("t1", "Ana", "ana@example.com", "Engineering", "2025-A")
            .with_progress(30);
        let patch = TraineePatch {
            progress: Some(250),
            batch: Some("2025-B".to_string()),
            ..TraineePatch::default()
        };

        patch.apply_to(&mut trainee);

        assert_eq!(trainee.progress(), 100);
        assert_eq!(trainee.batch, "2025-B");
        assert_eq!(trainee.department, "Engineering");
    }

    #[test]
    fn empty_patch_deserializes_from_empty_object() {
        let patch: TraineePatch = serde_json::from_str("{}").expect("valid patch");
        assert!(patch.is_empty());
    }
}
