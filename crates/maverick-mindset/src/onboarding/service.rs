use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::auth::{Principal, Role};
use super::badges::{self, BadgeView};
use super::domain::{
    Challenge, ChallengeId, DailyQuizPointer, Message, MessageSender, Quiz, QuizCompletion,
    QuizId, Review, Submission, SubmissionId, Trainee, TraineeId, TraineeStatus,
};
use super::generation::{
    self, GenerationError, PromptRequest, PromptTemplate, TextGenerator,
};
use super::leaderboard::{self, LeaderboardEntry, TableSort, TraineeColumn, TraineeFilter};
use super::mutation::{self, PlanEdit, PlanEditError};
use super::plan::{Plan, PlanValidationError, TaskKey, TaskKind};
use super::progress::{self, TraineeSnapshot};
use super::repository::{
    FileStorage, OnboardingRepository, RepositoryError, StorageError, TraineePatch,
};

/// Messages sent to the assistant along with a new chat message.
pub const CHAT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_PLAN_WEEKS: u8 = 4;
pub const MAX_PLAN_WEEKS: u8 = 12;
pub const DEFAULT_QUIZ_QUESTIONS: u8 = 5;

fn next_submission_id() -> SubmissionId {
    SubmissionId(format!("sub-{}", Uuid::new_v4().simple()))
}

/// Read-modify-write facade over the repository, generator and file store.
///
/// Every call re-reads the documents it needs; nothing is cached between calls.
pub struct OnboardingService<R, G, F> {
    repository: Arc<R>,
    generator: Arc<G>,
    storage: Arc<F>,
    clock: fn() -> DateTime<Utc>,
}

impl<R, G, F> OnboardingService<R, G, F>
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    pub fn new(repository: Arc<R>, generator: Arc<G>, storage: Arc<F>) -> Self {
        Self {
            repository,
            generator,
            storage,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Loads a trainee, storing keys for any plan tasks that were saved without one so the
    /// keys handed out stay valid on later reads.
    fn trainee(&self, id: &TraineeId) -> Result<Trainee, MindsetError> {
        let mut trainee = self
            .repository
            .trainee(id)?
            .ok_or_else(|| MindsetError::not_found("trainee", id))?;
        let assigned = trainee.onboarding_plan.assign_missing_keys();
        if assigned > 0 {
            self.repository
                .replace_plan(id, trainee.onboarding_plan.clone())?;
            debug!(trainee = %id, assigned, "task keys assigned to stored plan");
        }
        Ok(trainee)
    }

    fn total_challenges(&self) -> Result<usize, MindsetError> {
        Ok(self.repository.challenges()?.len())
    }

    /// Adds roster trainees whose email is not enrolled yet; returns how many were added.
    pub fn import_roster(
        &self,
        actor: &Principal,
        trainees: Vec<Trainee>,
    ) -> Result<usize, MindsetError> {
        require_admin(actor)?;
        let mut added = 0;
        let mut skipped = 0;
        for trainee in trainees {
            if self.repository.trainee_by_email(&trainee.email)?.is_some() {
                debug!(email = %trainee.email, "roster trainee already enrolled");
                continue;
            }
            let id = trainee.id.clone();
            match self.repository.insert_trainee(trainee) {
                Ok(_) => added += 1,
                Err(RepositoryError::Conflict) => {
                    warn!(trainee = %id, "roster trainee id already taken; row skipped");
                    skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
        info!(added, skipped, "roster imported");
        Ok(added)
    }

    pub fn list_trainees(
        &self,
        actor: &Principal,
        filter: &TraineeFilter,
        sort: Option<TableSort<TraineeColumn>>,
    ) -> Result<Vec<TraineeSummary>, MindsetError> {
        require_admin(actor)?;
        let trainees = match filter.department.as_deref() {
            Some(department) => self.repository.trainees_in_department(department)?,
            None => self.repository.trainees()?,
        };

        let mut rows: Vec<Trainee> = leaderboard::filter_trainees(&trainees, filter)
            .into_iter()
            .cloned()
            .collect();
        if let Some(sort) = sort {
            leaderboard::sort_rows(&mut rows, &sort, |trainee, column| column.value(trainee));
        }

        Ok(rows.iter().map(TraineeSummary::from).collect())
    }

    pub fn dashboard(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
    ) -> Result<TraineeDashboard, MindsetError> {
        authorize(actor, trainee_id)?;
        let trainee = self.trainee(trainee_id)?;
        let submissions = self.repository.submissions_for(trainee_id)?;
        let snapshot = progress::derive_status(&trainee, &submissions);
        let badges = badges::evaluate(&trainee, self.total_challenges()?)
            .into_iter()
            .map(|badge| badge.view())
            .collect();

        Ok(TraineeDashboard {
            snapshot,
            badges,
            plan: trainee.onboarding_plan,
            submissions,
        })
    }

    pub fn leaderboard(
        &self,
        _actor: &Principal,
        department: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, MindsetError> {
        let trainees = self.repository.trainees()?;
        Ok(leaderboard::leaderboard(&trainees, department))
    }

    pub fn apply_plan_edit(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        edit: &PlanEdit,
    ) -> Result<Plan, MindsetError> {
        require_admin(actor)?;
        let trainee = self.trainee(trainee_id)?;
        let plan = mutation::apply(&trainee.onboarding_plan, edit)?;
        self.repository.replace_plan(trainee_id, plan.clone())?;
        info!(trainee = %trainee_id, weeks = plan.len(), "plan edit saved");
        Ok(plan)
    }

    /// Replaces the whole plan after a structural check.
    pub fn save_plan(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        mut plan: Plan,
    ) -> Result<Plan, MindsetError> {
        require_admin(actor)?;
        plan.assign_missing_keys();
        plan.validate()?;
        self.trainee(trainee_id)?;
        self.repository.replace_plan(trainee_id, plan.clone())?;
        info!(trainee = %trainee_id, weeks = plan.len(), tasks = plan.task_count(), "plan saved");
        Ok(plan)
    }

    /// Generates a fresh plan and assigns the catalog items it references.
    pub fn generate_plan(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        weeks: Option<u8>,
    ) -> Result<Plan, MindsetError> {
        require_admin(actor)?;
        let weeks = weeks.unwrap_or(DEFAULT_PLAN_WEEKS);
        if weeks == 0 || weeks > MAX_PLAN_WEEKS {
            return Err(MindsetError::invalid(format!(
                "plan length must be between 1 and {MAX_PLAN_WEEKS} weeks"
            )));
        }

        let trainee = self.trainee(trainee_id)?;
        let quizzes = self.repository.quizzes()?;
        let challenges = self.repository.challenges()?;
        let request = PromptRequest::new(PromptTemplate::OnboardingPlan)
            .with("name", trainee.name.as_str())
            .with("department", trainee.department.as_str())
            .with("batch", trainee.batch.as_str())
            .with("weeks", weeks.to_string())
            .with("quizzes", catalog_listing(quizzes.iter().map(|q| (&q.id.0, &q.title))))
            .with(
                "challenges",
                catalog_listing(challenges.iter().map(|c| (&c.id.0, &c.title))),
            );

        let raw = self.generate(&request)?;
        let plan = generation::parse_plan(&raw)?;

        let known_quizzes: HashSet<&str> = quizzes.iter().map(|q| q.id.0.as_str()).collect();
        let known_challenges: HashSet<&str> =
            challenges.iter().map(|c| c.id.0.as_str()).collect();
        let mut assigned = trainee.clone();
        for task in plan.tasks() {
            let Some(id) = task.id.as_deref() else {
                continue;
            };
            match task.kind {
                TaskKind::Quiz if known_quizzes.contains(id) => assigned.assign_quiz(QuizId::from(id)),
                TaskKind::Challenge if known_challenges.contains(id) => {
                    assigned.assign_challenge(ChallengeId::from(id))
                }
                _ => {
                    return Err(GenerationError::invalid(
                        PromptTemplate::OnboardingPlan,
                        format!("task references unknown {} `{id}`", task.kind.label()),
                    )
                    .into())
                }
            }
        }

        self.repository.update_trainee(
            trainee_id,
            TraineePatch {
                onboarding_plan: Some(plan.clone()),
                assigned_quiz_ids: Some(assigned.assigned_quiz_ids),
                assigned_challenge_ids: Some(assigned.assigned_challenge_ids),
                ..TraineePatch::default()
            },
        )?;
        info!(trainee = %trainee_id, weeks = plan.len(), "generated plan saved");
        Ok(plan)
    }

    /// Prepends a generated catch-up week for a trainee who is behind.
    pub fn generate_catch_up(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
    ) -> Result<Plan, MindsetError> {
        require_admin(actor)?;
        let trainee = self.trainee(trainee_id)?;
        if trainee.status() == TraineeStatus::OnTrack {
            return Err(MindsetError::invalid("trainee is on track; no catch-up needed"));
        }

        let pending: Vec<String> = trainee
            .onboarding_plan
            .tasks()
            .filter(|task| !task.is_completed())
            .map(|task| format!("- {}", task.description))
            .collect();
        let request = PromptRequest::new(PromptTemplate::CatchUpPlan)
            .with("name", trainee.name.as_str())
            .with("department", trainee.department.as_str())
            .with("progress", trainee.progress().to_string())
            .with("pending_tasks", pending.join("\n"));

        let raw = self.generate(&request)?;
        let week = generation::parse_catch_up_week(&raw)?;
        let plan = mutation::prepend_catch_up(&trainee.onboarding_plan, week);
        self.repository.replace_plan(trainee_id, plan.clone())?;
        info!(trainee = %trainee_id, "catch-up week added");
        Ok(plan)
    }

    /// Trainee marks one of their tasks done; link tasks must carry the link.
    pub fn complete_task(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        completion: TaskCompletion,
    ) -> Result<Plan, MindsetError> {
        authorize(actor, trainee_id)?;
        let trainee = self.trainee(trainee_id)?;
        let (week_index, task_index) = completion.locate(&trainee.onboarding_plan)?;
        let link = completion
            .submitted_link
            .map(|link| link.trim().to_string())
            .filter(|link| !link.is_empty());
        let needs_link = link.is_none();

        let plan = mutation::complete_task(&trainee.onboarding_plan, week_index, task_index, link)?;
        let kind = trainee.onboarding_plan.weeks[week_index].tasks[task_index].kind;
        if kind == TaskKind::Link && needs_link {
            return Err(MindsetError::invalid("link tasks need a submitted link"));
        }
        self.repository.replace_plan(trainee_id, plan.clone())?;
        info!(trainee = %trainee_id, week_index, task_index, "task completed");
        Ok(plan)
    }

    /// Grades a quiz attempt, logs the completion and bumps progress.
    pub fn submit_quiz(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        quiz_id: &QuizId,
        answers: &[String],
    ) -> Result<QuizAttemptOutcome, MindsetError> {
        authorize(actor, trainee_id)?;
        let mut trainee = self.trainee(trainee_id)?;
        let quiz = self
            .repository
            .quiz(quiz_id)?
            .ok_or_else(|| MindsetError::not_found("quiz", quiz_id))?;
        if answers.len() != quiz.questions.len() {
            return Err(MindsetError::invalid(format!(
                "expected {} answers, got {}",
                quiz.questions.len(),
                answers.len()
            )));
        }

        let score = quiz.grade(answers);
        let score_pct = progress::quiz_score_pct(score);
        let previous = trainee.progress();
        let updated = progress::apply_quiz_progress(previous, score);

        trainee.quiz_completions.push(QuizCompletion {
            date: self.now().date_naive(),
            score: score_pct,
            quiz_id: Some(quiz_id.clone()),
        });
        let plan = complete_catalog_tasks(&trainee.onboarding_plan, TaskKind::Quiz, &quiz_id.0)?;

        let stored = self.repository.update_trainee(
            trainee_id,
            TraineePatch {
                progress: Some(updated),
                quiz_completions: Some(trainee.quiz_completions),
                onboarding_plan: Some(plan),
                ..TraineePatch::default()
            },
        )?;
        info!(
            trainee = %trainee_id,
            quiz = %quiz_id,
            score_pct,
            progress = stored.progress(),
            "quiz scored"
        );

        Ok(QuizAttemptOutcome {
            correct: score.correct,
            total: score.total,
            score_pct,
            progress_delta: stored.progress().saturating_sub(previous),
            progress: stored.progress(),
            badges: self.badge_views(&stored)?,
        })
    }

    /// Records a solved challenge once; repeats are accepted but change nothing.
    pub fn complete_challenge(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        challenge_id: &ChallengeId,
    ) -> Result<ChallengeOutcome, MindsetError> {
        authorize(actor, trainee_id)?;
        let mut trainee = self.trainee(trainee_id)?;
        if self.repository.challenge(challenge_id)?.is_none() {
            return Err(MindsetError::not_found("challenge", challenge_id));
        }

        let newly_completed = trainee.record_challenge(challenge_id.clone());
        let stored = if newly_completed {
            let plan = complete_catalog_tasks(
                &trainee.onboarding_plan,
                TaskKind::Challenge,
                &challenge_id.0,
            )?;
            let stored = self.repository.update_trainee(
                trainee_id,
                TraineePatch {
                    completed_challenge_ids: Some(trainee.completed_challenge_ids),
                    onboarding_plan: Some(plan),
                    ..TraineePatch::default()
                },
            )?;
            info!(trainee = %trainee_id, challenge = %challenge_id, "challenge completed");
            stored
        } else {
            debug!(trainee = %trainee_id, challenge = %challenge_id, "challenge already recorded");
            trainee
        };

        Ok(ChallengeOutcome {
            newly_completed,
            challenges_completed: stored.completed_challenge_ids.len(),
            badges: self.badge_views(&stored)?,
        })
    }

    /// Stores an uploaded file and records the submission against a task.
    pub fn submit_assignment(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        upload: AssignmentUpload,
    ) -> Result<Submission, MindsetError> {
        authorize(actor, trainee_id)?;
        let trainee = self.trainee(trainee_id)?;

        let file_name = upload.file_name.trim();
        if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
            return Err(MindsetError::invalid("file name must be a plain, non-empty name"));
        }
        if upload.bytes.is_empty() {
            return Err(MindsetError::invalid("uploaded file is empty"));
        }

        let (task_key, assignment_title) = match (&upload.task_key, &upload.assignment_title) {
            (Some(key), _) => {
                let (week_index, task_index) = trainee
                    .onboarding_plan
                    .find_task(key)
                    .ok_or_else(|| MindsetError::not_found("task", key))?;
                let task = &trainee.onboarding_plan.weeks[week_index].tasks[task_index];
                (Some(key.clone()), task.description.clone())
            }
            (None, Some(title)) if !title.trim().is_empty() => (None, title.trim().to_string()),
            _ => {
                return Err(MindsetError::invalid(
                    "submission needs a task key or an assignment title",
                ))
            }
        };

        let id = next_submission_id();
        if self.repository.submission(&id)?.is_some() {
            return Err(MindsetError::Conflict(format!(
                "submission id {id} is already taken"
            )));
        }
        let path = format!("submissions/{}/{}/{}", trainee_id, id, file_name);
        let stored = self
            .storage
            .store(&path, &upload.content_type, upload.bytes)?;

        let submission = Submission {
            id,
            trainee_id: trainee_id.clone(),
            assignment_title,
            task_key,
            file_name: file_name.to_string(),
            file_url: stored.url,
            submitted_at: self.now(),
            review: None,
        };
        let submission = match self.repository.insert_submission(submission) {
            Ok(submission) => submission,
            Err(err) => {
                warn!(
                    trainee = %trainee_id,
                    path = %path,
                    error = %err,
                    "uploaded file has no submission record"
                );
                return Err(err.into());
            }
        };
        info!(trainee = %trainee_id, submission = %submission.id, "assignment submitted");
        Ok(submission)
    }

    /// Attaches the one review a submission may receive.
    pub fn review_submission(
        &self,
        actor: &Principal,
        submission_id: &SubmissionId,
        score: u8,
        feedback: String,
    ) -> Result<Submission, MindsetError> {
        require_admin(actor)?;
        if score > 100 {
            return Err(MindsetError::invalid("review score must be between 0 and 100"));
        }
        let mut submission = self
            .repository
            .submission(submission_id)?
            .ok_or_else(|| MindsetError::not_found("submission", submission_id))?;
        if submission.is_reviewed() {
            warn!(submission = %submission_id, "second review rejected");
            return Err(MindsetError::Conflict(format!(
                "submission {submission_id} has already been reviewed"
            )));
        }

        submission.review = Some(Review {
            score,
            feedback: feedback.trim().to_string(),
            reviewed_at: self.now(),
        });
        self.repository.update_submission(submission.clone())?;
        info!(submission = %submission_id, score, "submission reviewed");
        Ok(submission)
    }

    pub fn quizzes(&self, _actor: &Principal) -> Result<Vec<Quiz>, MindsetError> {
        Ok(self.repository.quizzes()?)
    }

    pub fn challenges(&self, _actor: &Principal) -> Result<Vec<Challenge>, MindsetError> {
        Ok(self.repository.challenges()?)
    }

    pub fn daily_quiz(&self, _actor: &Principal) -> Result<Option<Quiz>, MindsetError> {
        let Some(pointer) = self.repository.daily_quiz()? else {
            return Ok(None);
        };
        Ok(self.repository.quiz(&pointer.quiz_id)?)
    }

    /// Points "today's quiz" at `quiz_id`, replacing any previous choice.
    pub fn set_daily_quiz(
        &self,
        actor: &Principal,
        quiz_id: &QuizId,
    ) -> Result<DailyQuizPointer, MindsetError> {
        require_admin(actor)?;
        if self.repository.quiz(quiz_id)?.is_none() {
            return Err(MindsetError::not_found("quiz", quiz_id));
        }
        let pointer = DailyQuizPointer {
            quiz_id: quiz_id.clone(),
            set_at: self.now(),
        };
        self.repository.set_daily_quiz(pointer.clone())?;
        info!(quiz = %quiz_id, "daily quiz set");
        Ok(pointer)
    }

    pub fn generate_quiz(
        &self,
        actor: &Principal,
        topic: &str,
        question_count: Option<u8>,
    ) -> Result<Quiz, MindsetError> {
        require_admin(actor)?;
        let topic = required_text(topic, "topic")?;
        let count = question_count.unwrap_or(DEFAULT_QUIZ_QUESTIONS).clamp(1, 20);
        let request = PromptRequest::new(PromptTemplate::Quiz)
            .with("topic", topic)
            .with("question_count", count.to_string());

        let draft = generation::parse_quiz(&self.generate(&request)?)?;
        let quiz = Quiz {
            id: QuizId(format!("quiz-{}", Uuid::new_v4().simple())),
            title: draft.title,
            topic: if draft.topic.trim().is_empty() {
                topic.to_string()
            } else {
                draft.topic
            },
            questions: draft.questions,
        };
        let quiz = self.repository.insert_quiz(quiz)?;
        info!(quiz = %quiz.id, questions = quiz.questions.len(), "quiz generated");
        Ok(quiz)
    }

    pub fn generate_challenge(
        &self,
        actor: &Principal,
        topic: &str,
        difficulty: &str,
    ) -> Result<Challenge, MindsetError> {
        require_admin(actor)?;
        let topic = required_text(topic, "topic")?;
        let difficulty = required_text(difficulty, "difficulty")?;
        let request = PromptRequest::new(PromptTemplate::Challenge)
            .with("topic", topic)
            .with("difficulty", difficulty);

        let draft = generation::parse_challenge(&self.generate(&request)?)?;
        let challenge = Challenge {
            id: ChallengeId(format!("challenge-{}", Uuid::new_v4().simple())),
            title: draft.title,
            description: draft.description,
            difficulty: if draft.difficulty.trim().is_empty() {
                difficulty.to_string()
            } else {
                draft.difficulty
            },
            tags: draft.tags,
            test_cases: draft.test_cases,
        };
        let challenge = self.repository.insert_challenge(challenge)?;
        info!(challenge = %challenge.id, "challenge generated");
        Ok(challenge)
    }

    pub fn messages(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
    ) -> Result<Vec<Message>, MindsetError> {
        authorize(actor, trainee_id)?;
        self.trainee(trainee_id)?;
        Ok(self.repository.messages(trainee_id)?)
    }

    /// Appends a message to the trainee's conversation as the caller's role.
    pub fn send_message(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        text: &str,
    ) -> Result<Message, MindsetError> {
        authorize(actor, trainee_id)?;
        self.trainee(trainee_id)?;
        let message = Message {
            sender: sender_for(actor.role),
            text: required_text(text, "message")?.to_string(),
            sent_at: self.now(),
        };
        self.repository.append_message(trainee_id, message.clone())?;
        Ok(message)
    }

    /// Sends a trainee question to the assistant and stores both sides of the exchange.
    pub fn chat(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
        text: &str,
    ) -> Result<Message, MindsetError> {
        authorize(actor, trainee_id)?;
        let trainee = self.trainee(trainee_id)?;
        let text = required_text(text, "message")?;
        let history = self.repository.messages(trainee_id)?;
        let start = history.len().saturating_sub(CHAT_HISTORY_LIMIT);
        let transcript: Vec<String> = history[start..]
            .iter()
            .map(|message| format!("{}: {}", sender_label(message.sender), message.text))
            .collect();

        let request = PromptRequest::new(PromptTemplate::Chat)
            .with("name", trainee.name.as_str())
            .with("history", transcript.join("\n"))
            .with("message", text);
        let reply = generation::parse_text(PromptTemplate::Chat, &self.generate(&request)?)?;

        self.repository.append_message(
            trainee_id,
            Message {
                sender: sender_for(actor.role),
                text: text.to_string(),
                sent_at: self.now(),
            },
        )?;
        let answer = Message {
            sender: MessageSender::Assistant,
            text: reply,
            sent_at: self.now(),
        };
        self.repository.append_message(trainee_id, answer.clone())?;
        Ok(answer)
    }

    /// Narrative progress summary for managers.
    pub fn progress_report(
        &self,
        actor: &Principal,
        trainee_id: &TraineeId,
    ) -> Result<ProgressReport, MindsetError> {
        require_admin(actor)?;
        let trainee = self.trainee(trainee_id)?;
        let submissions = self.repository.submissions_for(trainee_id)?;
        let snapshot = progress::derive_status(&trainee, &submissions);
        let request = PromptRequest::new(PromptTemplate::Report)
            .with("name", snapshot.name.as_str())
            .with("department", snapshot.department.as_str())
            .with("progress", snapshot.progress.to_string())
            .with("status", snapshot.status_label)
            .with("completed_tasks", snapshot.completed_tasks.to_string())
            .with("total_tasks", snapshot.total_tasks.to_string())
            .with("quizzes_taken", snapshot.quizzes_taken.to_string())
            .with("challenges_completed", snapshot.challenges_completed.to_string());
        let summary = generation::parse_text(PromptTemplate::Report, &self.generate(&request)?)?;

        Ok(ProgressReport { snapshot, summary })
    }

    fn generate(&self, request: &PromptRequest) -> Result<String, MindsetError> {
        debug!(template = request.template.label(), "requesting generation");
        self.generator.generate(request).map_err(|err| {
            warn!(template = request.template.label(), error = %err, "generation failed");
            MindsetError::from(err)
        })
    }

    fn badge_views(&self, trainee: &Trainee) -> Result<Vec<BadgeView>, MindsetError> {
        Ok(badges::evaluate(trainee, self.total_challenges()?)
            .into_iter()
            .map(|badge| badge.view())
            .collect())
    }
}

fn require_admin(actor: &Principal) -> Result<(), MindsetError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(MindsetError::Forbidden("admin role required".to_string()))
    }
}

fn authorize(actor: &Principal, trainee_id: &TraineeId) -> Result<(), MindsetError> {
    if actor.can_act_for(trainee_id) {
        Ok(())
    } else {
        Err(MindsetError::Forbidden(format!(
            "not allowed to act for trainee {trainee_id}"
        )))
    }
}

fn required_text<'a>(value: &'a str, field: &str) -> Result<&'a str, MindsetError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(MindsetError::invalid(format!("{field} must not be empty")))
    } else {
        Ok(trimmed)
    }
}

fn sender_for(role: Role) -> MessageSender {
    match role {
        Role::Admin => MessageSender::Admin,
        Role::Trainee => MessageSender::Trainee,
    }
}

fn sender_label(sender: MessageSender) -> &'static str {
    match sender {
        MessageSender::Admin => "Admin",
        MessageSender::Trainee => "Trainee",
        MessageSender::Assistant => "Assistant",
    }
}

fn catalog_listing<'a>(items: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    let lines: Vec<String> = items.map(|(id, title)| format!("- {id}: {title}")).collect();
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Completes every pending task of `kind` pointing at catalog item `id`.
fn complete_catalog_tasks(plan: &Plan, kind: TaskKind, id: &str) -> Result<Plan, PlanEditError> {
    let targets: Vec<(usize, usize)> = plan
        .weeks
        .iter()
        .enumerate()
        .flat_map(|(week_index, week)| {
            week.tasks
                .iter()
                .enumerate()
                .filter(|(_, task)| {
                    task.kind == kind && !task.is_completed() && task.id.as_deref() == Some(id)
                })
                .map(move |(task_index, _)| (week_index, task_index))
        })
        .collect();

    targets
        .into_iter()
        .try_fold(plan.clone(), |plan, (week_index, task_index)| {
            mutation::complete_task(&plan, week_index, task_index, None)
        })
}

/// Identifies the task being completed, by key or by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    #[serde(default)]
    pub task_key: Option<TaskKey>,
    #[serde(default)]
    pub week_index: Option<usize>,
    #[serde(default)]
    pub task_index: Option<usize>,
    #[serde(default)]
    pub submitted_link: Option<String>,
}

impl TaskCompletion {
    fn locate(&self, plan: &Plan) -> Result<(usize, usize), MindsetError> {
        match (&self.task_key, self.week_index, self.task_index) {
            (Some(key), _, _) => plan
                .find_task(key)
                .ok_or_else(|| MindsetError::not_found("task", key)),
            (None, Some(week_index), Some(task_index)) => Ok((week_index, task_index)),
            _ => Err(MindsetError::invalid(
                "task completion needs a task key or week and task indices",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentUpload {
    pub task_key: Option<TaskKey>,
    pub assignment_title: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraineeSummary {
    pub id: TraineeId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub batch: String,
    pub progress: u8,
    pub status: TraineeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Trainee> for TraineeSummary {
    fn from(trainee: &Trainee) -> Self {
        Self {
            id: trainee.id.clone(),
            name: trainee.name.clone(),
            email: trainee.email.clone(),
            department: trainee.department.clone(),
            batch: trainee.batch.clone(),
            progress: trainee.progress(),
            status: trainee.status(),
            last_login: trainee.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraineeDashboard {
    pub snapshot: TraineeSnapshot,
    pub badges: Vec<BadgeView>,
    pub plan: Plan,
    pub submissions: Vec<Submission>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptOutcome {
    pub correct: usize,
    pub total: usize,
    pub score_pct: u8,
    pub progress_delta: u8,
    pub progress: u8,
    pub badges: Vec<BadgeView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOutcome {
    pub newly_completed: bool,
    pub challenges_completed: usize,
    pub badges: Vec<BadgeView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub snapshot: TraineeSnapshot,
    pub summary: String,
}

/// Input problems surfaced to callers as 422s.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    PlanEdit(#[from] PlanEditError),
    #[error(transparent)]
    Plan(#[from] PlanValidationError),
    #[error("{0}")]
    Input(String),
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum MindsetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MindsetError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::Input(reason.into()))
    }

    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<PlanEditError> for MindsetError {
    fn from(err: PlanEditError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<PlanValidationError> for MindsetError {
    fn from(err: PlanValidationError) -> Self {
        Self::Validation(err.into())
    }
}
