use maverick_mindset::onboarding::{
    AuthError, Challenge, ChallengeId, ChatCompletionsClient, DailyQuizPointer, FileStorage, GenerationError,
    IdentityProvider, Message, OnboardingRepository, Plan, Principal, PromptRequest, Quiz, QuizId,
    RepositoryError, StorageError, StoredFile, Submission, SubmissionId, TextGenerator, Trainee,
    TraineeId, TraineePatch,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store; trainees keep roster order so leaderboard ties stay stable.
#[derive(Default, Clone)]
pub(crate) struct InMemoryOnboardingRepository {
    trainees: Arc<Mutex<Vec<Trainee>>>,
    quizzes: Arc<Mutex<Vec<Quiz>>>,
    challenges: Arc<Mutex<Vec<Challenge>>>,
    submissions: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
    messages: Arc<Mutex<HashMap<TraineeId, Vec<Message>>>>,
    daily_quiz: Arc<Mutex<Option<DailyQuizPointer>>>,
}

impl OnboardingRepository for InMemoryOnboardingRepository {
    fn trainees(&self) -> Result<Vec<Trainee>, RepositoryError> {
        Ok(self.trainees.lock().expect("repository mutex poisoned").clone())
    }

    fn trainee(&self, id: &TraineeId) -> Result<Option<Trainee>, RepositoryError> {
        let guard = self.trainees.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|trainee| &trainee.id == id).cloned())
    }

    fn trainee_by_email(&self, email: &str) -> Result<Option<Trainee>, RepositoryError> {
        let guard = self.trainees.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|trainee| trainee.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn trainees_in_department(&self, department: &str) -> Result<Vec<Trainee>, RepositoryError> {
        let guard = self.trainees.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|trainee| trainee.department == department)
            .cloned()
            .collect())
    }

    fn insert_trainee(&self, trainee: Trainee) -> Result<Trainee, RepositoryError> {
        let mut guard = self.trainees.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == trainee.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(trainee.clone());
        Ok(trainee)
    }

    fn update_trainee(
        &self,
        id: &TraineeId,
        patch: TraineePatch,
    ) -> Result<Trainee, RepositoryError> {
        let mut guard = self.trainees.lock().expect("repository mutex poisoned");
        let trainee = guard
            .iter_mut()
            .find(|trainee| &trainee.id == id)
            .ok_or(RepositoryError::NotFound)?;
        patch.apply_to(trainee);
        Ok(trainee.clone())
    }

    fn replace_plan(&self, id: &TraineeId, plan: Plan) -> Result<(), RepositoryError> {
        let patch = TraineePatch {
            onboarding_plan: Some(plan),
            ..TraineePatch::default()
        };
        self.update_trainee(id, patch).map(|_| ())
    }

    fn quizzes(&self) -> Result<Vec<Quiz>, RepositoryError> {
        Ok(self.quizzes.lock().expect("repository mutex poisoned").clone())
    }

    fn quiz(&self, id: &QuizId) -> Result<Option<Quiz>, RepositoryError> {
        let guard = self.quizzes.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|quiz| &quiz.id == id).cloned())
    }

    fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, RepositoryError> {
        let mut guard = self.quizzes.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == quiz.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(quiz.clone());
        Ok(quiz)
    }

    fn challenges(&self) -> Result<Vec<Challenge>, RepositoryError> {
        Ok(self.challenges.lock().expect("repository mutex poisoned").clone())
    }

    fn challenge(&self, id: &ChallengeId) -> Result<Option<Challenge>, RepositoryError> {
        let guard = self.challenges.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|challenge| &challenge.id == id).cloned())
    }

    fn insert_challenge(&self, challenge: Challenge) -> Result<Challenge, RepositoryError> {
        let mut guard = self.challenges.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == challenge.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(challenge.clone());
        Ok(challenge)
    }

    fn submissions_for(&self, trainee: &TraineeId) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.submissions.lock().expect("repository mutex poisoned");
        let mut submissions: Vec<Submission> = guard
            .values()
            .filter(|submission| &submission.trainee_id == trainee)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(submissions)
    }

    fn submission(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.submissions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert_submission(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut guard = self.submissions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&submission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    fn update_submission(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut guard = self.submissions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&submission.id) {
            guard.insert(submission.id.clone(), submission);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn messages(&self, trainee: &TraineeId) -> Result<Vec<Message>, RepositoryError> {
        let guard = self.messages.lock().expect("repository mutex poisoned");
        Ok(guard.get(trainee).cloned().unwrap_or_default())
    }

    fn append_message(&self, trainee: &TraineeId, message: Message) -> Result<(), RepositoryError> {
        let mut guard = self.messages.lock().expect("repository mutex poisoned");
        guard.entry(trainee.clone()).or_default().push(message);
        Ok(())
    }

    fn daily_quiz(&self) -> Result<Option<DailyQuizPointer>, RepositoryError> {
        Ok(self.daily_quiz.lock().expect("repository mutex poisoned").clone())
    }

    fn set_daily_quiz(&self, pointer: DailyQuizPointer) -> Result<(), RepositoryError> {
        *self.daily_quiz.lock().expect("repository mutex poisoned") = Some(pointer);
        Ok(())
    }
}

/// Keeps uploads in memory and hands back `memory://` links.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFileStorage {
    files: Arc<Mutex<HashMap<String, StoredUpload>>>,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredUpload {
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

impl InMemoryFileStorage {
    #[cfg(test)]
    pub(crate) fn get(&self, path: &str) -> Option<StoredUpload> {
        self.files.lock().expect("storage mutex poisoned").get(path).cloned()
    }
}

impl FileStorage for InMemoryFileStorage {
    fn store(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        let mut guard = self.files.lock().expect("storage mutex poisoned");
        if guard.contains_key(path) {
            return Err(StorageError::Rejected(format!("{path} already exists")));
        }
        guard.insert(
            path.to_string(),
            StoredUpload {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(StoredFile {
            path: path.to_string(),
            url: format!("memory://{path}"),
        })
    }
}

/// Token table standing in for the hosted identity provider.
#[derive(Default)]
pub(crate) struct StaticIdentityProvider {
    sessions: RwLock<HashMap<String, Principal>>,
}

impl StaticIdentityProvider {
    pub(crate) fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.sessions
            .write()
            .expect("identity lock poisoned")
            .insert(token.into(), principal);
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.read().expect("identity lock poisoned").len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        self.sessions
            .read()
            .expect("identity lock poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Remote generator when an API key is configured; otherwise every request fails as disabled.
pub(crate) enum ConfiguredGenerator {
    Remote(ChatCompletionsClient),
    Disabled,
}

impl ConfiguredGenerator {
    pub(crate) fn is_enabled(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl TextGenerator for ConfiguredGenerator {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        match self {
            Self::Remote(client) => client.generate(request),
            Self::Disabled => Err(GenerationError::Disabled),
        }
    }
}

pub(crate) fn dev_token(trainee: &TraineeId) -> String {
    format!("dev-{trainee}")
}
