use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::onboarding::auth::{AuthError, IdentityProvider, Principal};
use crate::onboarding::domain::{
    Challenge, ChallengeId, DailyQuizPointer, Message, Question, Quiz, QuizId, Submission,
    SubmissionId, Trainee, TraineeId,
};
use crate::onboarding::generation::{GenerationError, PromptRequest, PromptTemplate, TextGenerator};
use crate::onboarding::plan::{Plan, PlanWeek, Task, TaskKind};
use crate::onboarding::repository::{
    FileStorage, OnboardingRepository, RepositoryError, StorageError, StoredFile, TraineePatch,
};
use crate::onboarding::{onboarding_router, OnboardingService};

pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const ANA_TOKEN: &str = "ana-token";
pub(super) const BO_TOKEN: &str = "bo-token";

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap()
}

pub(super) fn admin() -> Principal {
    Principal::admin("admin-1", "lead@example.com")
}

pub(super) fn ana() -> Principal {
    Principal::trainee("t1", "ana@example.com")
}

pub(super) fn bo() -> Principal {
    Principal::trainee("t2", "bo@example.com")
}

pub(super) fn git_quiz() -> Quiz {
    Quiz {
        id: QuizId::from("quiz-git"),
        title: "Git basics".to_string(),
        topic: "Version control".to_string(),
        questions: vec![
            Question {
                question: "Which command records changes?".to_string(),
                options: vec!["git commit".to_string(), "git push".to_string()],
                correct_answer: "git commit".to_string(),
            },
            Question {
                question: "Which command uploads commits?".to_string(),
                options: vec!["git fetch".to_string(), "git push".to_string()],
                correct_answer: "git push".to_string(),
            },
        ],
    }
}

pub(super) fn challenge(id: &str) -> Challenge {
    Challenge {
        id: ChallengeId::from(id),
        title: format!("Challenge {id}"),
        description: "Reverse a string".to_string(),
        difficulty: "Easy".to_string(),
        tags: vec!["strings".to_string()],
        test_cases: Vec::new(),
    }
}

pub(super) fn starter_plan() -> Plan {
    Plan::new(vec![
        PlanWeek::with_tasks(
            "Week 1",
            "Setup",
            vec![
                Task::new("Install toolchain", TaskKind::Basic),
                Task::new("Share your dotfiles repo", TaskKind::Link),
                Task::referencing("Git quiz", TaskKind::Quiz, "quiz-git"),
            ],
        ),
        PlanWeek::with_tasks(
            "Week 2",
            "Codebase",
            vec![Task::referencing("Solve c1", TaskKind::Challenge, "c1")],
        ),
    ])
}

pub(super) fn seeded_repository() -> Arc<MemoryRepository> {
    let repository = Arc::new(MemoryRepository::default());
    let mut ana = Trainee::new("t1", "Ana", "ana@example.com", "Engineering", "2025-A")
        .with_progress(35);
    ana.onboarding_plan = starter_plan();
    let bo = Trainee::new("t2", "Bo", "bo@example.com", "Sales", "2025-A").with_progress(80);
    let cy = Trainee::new("t3", "Cy", "cy@example.com", "Engineering", "2025-B").with_progress(80);

    for trainee in [ana, bo, cy] {
        repository.insert_trainee(trainee).expect("seed trainee");
    }
    repository.insert_quiz(git_quiz()).expect("seed quiz");
    for id in ["c1", "c2"] {
        repository.insert_challenge(challenge(id)).expect("seed challenge");
    }
    repository
}

pub(super) type TestService = OnboardingService<MemoryRepository, ScriptedGenerator, MemoryStorage>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<ScriptedGenerator>,
    Arc<MemoryStorage>,
) {
    let repository = seeded_repository();
    let generator = Arc::new(ScriptedGenerator::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = OnboardingService::new(repository.clone(), generator.clone(), storage.clone())
        .with_clock(fixed_now);
    (service, repository, generator, storage)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    onboarding_router(Arc::new(service), Arc::new(StaticIdentity::standard()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    trainees: Mutex<Vec<Trainee>>,
    quizzes: Mutex<Vec<Quiz>>,
    challenges: Mutex<Vec<Challenge>>,
    submissions: Mutex<Vec<Submission>>,
    messages: Mutex<HashMap<TraineeId, Vec<Message>>>,
    daily: Mutex<Option<DailyQuizPointer>>,
}

impl MemoryRepository {
    pub(super) fn stored_trainee(&self, id: &str) -> Trainee {
        self.trainee(&TraineeId::from(id))
            .expect("repository read")
            .expect("trainee present")
    }
}

impl OnboardingRepository for MemoryRepository {
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
        self.update_trainee(
            id,
            TraineePatch {
                onboarding_plan: Some(plan),
                ..TraineePatch::default()
            },
        )
        .map(|_| ())
    }

    fn quizzes(&self) -> Result<Vec<Quiz>, RepositoryError> {
        Ok(self.quizzes.lock().expect("repository mutex poisoned").clone())
    }

    fn quiz(&self, id: &QuizId) -> Result<Option<Quiz>, RepositoryError> {
        let guard = self.quizzes.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|quiz| &quiz.id == id).cloned())
    }

    fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, RepositoryError> {
        self.quizzes
            .lock()
            .expect("repository mutex poisoned")
            .push(quiz.clone());
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
        self.challenges
            .lock()
            .expect("repository mutex poisoned")
            .push(challenge.clone());
        Ok(challenge)
    }

    fn submissions_for(&self, trainee: &TraineeId) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.submissions.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|submission| &submission.trainee_id == trainee)
            .cloned()
            .collect())
    }

    fn submission(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.submissions.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|submission| &submission.id == id).cloned())
    }

    fn insert_submission(&self, submission: Submission) -> Result<Submission, RepositoryError> {
        let mut guard = self.submissions.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == submission.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(submission.clone());
        Ok(submission)
    }

    fn update_submission(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut guard = self.submissions.lock().expect("repository mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == submission.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = submission;
        Ok(())
    }

    fn messages(&self, trainee: &TraineeId) -> Result<Vec<Message>, RepositoryError> {
        let guard = self.messages.lock().expect("repository mutex poisoned");
        Ok(guard.get(trainee).cloned().unwrap_or_default())
    }

    fn append_message(&self, trainee: &TraineeId, message: Message) -> Result<(), RepositoryError> {
        self.messages
            .lock()
            .expect("repository mutex poisoned")
            .entry(trainee.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    fn daily_quiz(&self) -> Result<Option<DailyQuizPointer>, RepositoryError> {
        Ok(self.daily.lock().expect("repository mutex poisoned").clone())
    }

    fn set_daily_quiz(&self, pointer: DailyQuizPointer) -> Result<(), RepositoryError> {
        *self.daily.lock().expect("repository mutex poisoned") = Some(pointer);
        Ok(())
    }
}

/// Replays queued responses and records the templates it was asked for.
#[derive(Default)]
pub(super) struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<PromptRequest>>,
}

impl ScriptedGenerator {
    pub(super) fn push(&self, response: &str) {
        self.responses
            .lock()
            .expect("generator mutex poisoned")
            .push_back(Ok(response.to_string()));
    }

    pub(super) fn push_error(&self, error: GenerationError) {
        self.responses
            .lock()
            .expect("generator mutex poisoned")
            .push_back(Err(error));
    }

    pub(super) fn templates(&self) -> Vec<PromptTemplate> {
        self.requests
            .lock()
            .expect("generator mutex poisoned")
            .iter()
            .map(|request| request.template)
            .collect()
    }

    pub(super) fn last_request(&self) -> Option<PromptRequest> {
        self.requests
            .lock()
            .expect("generator mutex poisoned")
            .last()
            .cloned()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        self.requests
            .lock()
            .expect("generator mutex poisoned")
            .push(request.clone());
        self.responses
            .lock()
            .expect("generator mutex poisoned")
            .pop_front()
            .unwrap_or(Err(GenerationError::Disabled))
    }
}

#[derive(Default)]
pub(super) struct MemoryStorage {
    files: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryStorage {
    pub(super) fn stored(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .get(path)
            .cloned()
    }

    pub(super) fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl FileStorage for MemoryStorage {
    fn store(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(StoredFile {
            path: path.to_string(),
            url: format!("memory://{path}"),
        })
    }
}

pub(super) struct OfflineStorage;

impl FileStorage for OfflineStorage {
    fn store(
        &self,
        _path: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        Err(StorageError::Unavailable("bucket offline".to_string()))
    }
}

pub(super) struct StaticIdentity {
    sessions: HashMap<String, Principal>,
}

impl StaticIdentity {
    pub(super) fn standard() -> Self {
        let sessions = [
            (ADMIN_TOKEN, admin()),
            (ANA_TOKEN, ana()),
            (BO_TOKEN, bo()),
        ]
        .into_iter()
        .map(|(token, principal)| (token.to_string(), principal))
        .collect();
        Self { sessions }
    }
}

impl IdentityProvider for StaticIdentity {
    fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

pub(super) const GENERATED_PLAN: &str = r#"{"weeks":[
  {"week":"Week 1","topic":"Welcome","tasks":[
    {"description":"Meet your buddy","type":"basic"},
    {"description":"Take the Git quiz","type":"quiz","id":"quiz-git"}
  ]},
  {"week":"Week 2","topic":"First code","tasks":[
    {"description":"Solve c2","type":"challenge","id":"c2"}
  ]}
]}"#;

pub(super) const CATCH_UP_WEEK: &str = r#"{"week":"","topic":"Get back on track","tasks":[
  {"description":"Pair with your buddy on the toolchain","type":"basic"}
]}"#;
