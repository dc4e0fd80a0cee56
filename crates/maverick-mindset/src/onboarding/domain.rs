use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::plan::{Plan, TaskKey};

pub const MAX_PROGRESS: u8 = 100;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Document id of a trainee record.
    TraineeId
);
string_id!(QuizId);
string_id!(ChallengeId);
string_id!(SubmissionId);

/// Display label for a trainee's standing, derived from progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraineeStatus {
    #[serde(rename = "On Track")]
    OnTrack,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Need Attention")]
    NeedAttention,
    #[serde(rename = "Not Started")]
    NotStarted,
}

impl TraineeStatus {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::OnTrack,
            Self::NeedAttention,
            Self::AtRisk,
            Self::NotStarted,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::AtRisk => "At Risk",
            Self::NeedAttention => "Need Attention",
            Self::NotStarted => "Not Started",
        }
    }

    pub fn from_progress(progress: u8) -> Self {
        match progress.min(MAX_PROGRESS) {
            0 => Self::NotStarted,
            1..=39 => Self::AtRisk,
            40..=69 => Self::NeedAttention,
            _ => Self::OnTrack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompletion {
    pub date: NaiveDate,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<QuizId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainee {
    pub id: TraineeId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default, deserialize_with = "deserialize_progress")]
    progress: u8,
    #[serde(default)]
    pub onboarding_plan: Plan,
    #[serde(default)]
    pub quiz_completions: Vec<QuizCompletion>,
    #[serde(default)]
    pub completed_challenge_ids: Vec<ChallengeId>,
    #[serde(default)]
    pub assigned_quiz_ids: Vec<QuizId>,
    #[serde(default)]
    pub assigned_challenge_ids: Vec<ChallengeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl Trainee {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
        batch: impl Into<String>,
    ) -> Self {
        Self {
            id: TraineeId(id.into()),
            name: name.into(),
            email: email.into(),
            department: department.into(),
            batch: batch.into(),
            progress: 0,
            onboarding_plan: Plan::default(),
            quiz_completions: Vec::new(),
            completed_challenge_ids: Vec::new(),
            assigned_quiz_ids: Vec::new(),
            assigned_challenge_ids: Vec::new(),
            last_login: None,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Stores progress clamped to [0, 100].
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(MAX_PROGRESS);
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.set_progress(progress);
        self
    }

    pub fn status(&self) -> TraineeStatus {
        TraineeStatus::from_progress(self.progress)
    }

    pub fn has_completed_challenge(&self, id: &ChallengeId) -> bool {
        self.completed_challenge_ids.contains(id)
    }

    /// Records a completed challenge once; returns false when it was already recorded.
    pub fn record_challenge(&mut self, id: ChallengeId) -> bool {
        if self.has_completed_challenge(&id) {
            return false;
        }
        self.completed_challenge_ids.push(id);
        true
    }

    pub fn assign_quiz(&mut self, id: QuizId) {
        if !self.assigned_quiz_ids.contains(&id) {
            self.assigned_quiz_ids.push(id);
        }
    }

    pub fn assign_challenge(&mut self, id: ChallengeId) {
        if !self.assigned_challenge_ids.contains(&id) {
            self.assigned_challenge_ids.push(id);
        }
    }
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("progress must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, MAX_PROGRESS as f64) as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub score: u8,
    pub feedback: String,
    pub reviewed_at: DateTime<Utc>,
}

/// File deliverable uploaded against one plan task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub trainee_id: TraineeId,
    pub assignment_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_key: Option<TaskKey>,
    pub file_name: String,
    pub file_url: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

impl Submission {
    pub fn is_reviewed(&self) -> bool {
        self.review.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub topic: String,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Counts answers matching the correct option, position by position.
    pub fn grade(&self, answers: &[String]) -> QuizScore {
        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.correct_answer.trim() == answer.trim())
            .count();

        QuizScore {
            correct,
            total: self.questions.len(),
        }
    }

    /// Whether the daily pointer currently selects this quiz.
    pub fn is_daily(&self, pointer: Option<&DailyQuizPointer>) -> bool {
        pointer.is_some_and(|pointer| pointer.quiz_id == self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// The one quiz currently served as "today's quiz".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuizPointer {
    pub quiz_id: QuizId,
    pub set_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    Admin,
    Trainee,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender: MessageSender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}
