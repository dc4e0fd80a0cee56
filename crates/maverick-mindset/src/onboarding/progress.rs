use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::domain::{QuizScore, Submission, Trainee, TraineeId, TraineeStatus, MAX_PROGRESS};
use super::plan::{Task, TaskKey, TaskKind, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificationStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl CertificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

pub fn certification_status(progress: u8) -> CertificationStatus {
    match progress {
        0 => CertificationStatus::NotStarted,
        p if p >= MAX_PROGRESS => CertificationStatus::Completed,
        _ => CertificationStatus::InProgress,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentState {
    Submitted,
    Pending,
}

impl AssignmentState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEntry {
    pub week_index: usize,
    pub task_index: usize,
    pub week: String,
    pub task_key: TaskKey,
    pub description: String,
    pub kind: TaskKind,
    pub task_status: TaskStatus,
    pub state: AssignmentState,
    pub state_label: &'static str,
}

/// Derived per-trainee view consumed by dashboards, badges and the leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraineeSnapshot {
    pub trainee_id: TraineeId,
    pub name: String,
    pub department: String,
    pub progress: u8,
    pub status: TraineeStatus,
    pub status_label: &'static str,
    pub certification_status: CertificationStatus,
    pub certification_label: &'static str,
    pub assignments: Vec<AssignmentEntry>,
    pub submitted_assignments: usize,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub quizzes_taken: usize,
    pub challenges_completed: usize,
    pub activity_dates: Vec<NaiveDate>,
    pub quiz_streak: usize,
}

/// Whether a submission belongs to the given task of the given trainee.
///
/// Submissions recorded with a task key match on the key alone; older submissions fall back to
/// the literal task description.
pub fn submission_matches(submission: &Submission, trainee_id: &TraineeId, task: &Task) -> bool {
    if &submission.trainee_id != trainee_id {
        return false;
    }

    match &submission.task_key {
        Some(key) => key == &task.key,
        None => submission.assignment_title == task.description,
    }
}

pub fn assignment_states(trainee: &Trainee, submissions: &[Submission]) -> Vec<AssignmentEntry> {
    trainee
        .onboarding_plan
        .weeks
        .iter()
        .enumerate()
        .flat_map(|(week_index, week)| {
            week.tasks
                .iter()
                .enumerate()
                .map(move |(task_index, task)| (week_index, &week.week, task_index, task))
        })
        .map(|(week_index, week, task_index, task)| {
            let submitted = submissions
                .iter()
                .any(|submission| submission_matches(submission, &trainee.id, task));
            let state = if submitted {
                AssignmentState::Submitted
            } else {
                AssignmentState::Pending
            };

            AssignmentEntry {
                week_index,
                task_index,
                week: week.clone(),
                task_key: task.key.clone(),
                description: task.description.clone(),
                kind: task.kind,
                task_status: task.status,
                state,
                state_label: state.label(),
            }
        })
        .collect()
}

/// Distinct days with at least one quiz completion, oldest first.
pub fn activity_dates(trainee: &Trainee) -> Vec<NaiveDate> {
    trainee
        .quiz_completions
        .iter()
        .map(|completion| completion.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Consecutive active days ending at the most recent active day.
pub fn quiz_streak(dates: &[NaiveDate]) -> usize {
    let Some(mut current) = dates.last().copied() else {
        return 0;
    };

    let mut streak = 1;
    for date in dates.iter().rev().skip(1) {
        match current.pred_opt() {
            Some(previous) if *date == previous => {
                streak += 1;
                current = *date;
            }
            _ => break,
        }
    }
    streak
}

/// Progress points earned for a quiz: one point per ten percent, rounded.
pub fn quiz_progress_delta(score: QuizScore) -> u8 {
    if score.total == 0 {
        return 0;
    }

    let correct = score.correct.min(score.total) as f64;
    let score_pct = correct / score.total as f64 * 100.0;
    (score_pct / 10.0).round() as u8
}

pub fn quiz_score_pct(score: QuizScore) -> u8 {
    if score.total == 0 {
        return 0;
    }
    let correct = score.correct.min(score.total) as f64;
    (correct / score.total as f64 * 100.0).round() as u8
}

pub fn apply_quiz_progress(progress: u8, score: QuizScore) -> u8 {
    progress
        .saturating_add(quiz_progress_delta(score))
        .min(MAX_PROGRESS)
}

pub fn derive_status(trainee: &Trainee, submissions: &[Submission]) -> TraineeSnapshot {
    let progress = trainee.progress();
    let status = trainee.status();
    let certification = certification_status(progress);
    let assignments = assignment_states(trainee, submissions);
    let submitted_assignments = assignments
        .iter()
        .filter(|entry| entry.state == AssignmentState::Submitted)
        .count();
    let dates = activity_dates(trainee);
    let streak = quiz_streak(&dates);

    TraineeSnapshot {
        trainee_id: trainee.id.clone(),
        name: trainee.name.clone(),
        department: trainee.department.clone(),
        progress,
        status,
        status_label: status.label(),
        certification_status: certification,
        certification_label: certification.label(),
        assignments,
        submitted_assignments,
        completed_tasks: trainee.onboarding_plan.completed_task_count(),
        total_tasks: trainee.onboarding_plan.task_count(),
        quizzes_taken: trainee.quiz_completions.len(),
        challenges_completed: trainee.completed_challenge_ids.len(),
        activity_dates: dates,
        quiz_streak: streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::domain::{QuizCompletion, SubmissionId};
    use crate::onboarding::plan::{Plan, PlanWeek};
    use chrono::{TimeZone, Utc};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
    }

    fn trainee_with_plan() -> Trainee {
        let mut trainee = Trainee::new("t1", "Ana", "ana@example.com", "Engineering", "2025-A");
        trainee.onboarding_plan = Plan::new(vec![PlanWeek::with_tasks(
            "Week 1",
            "Setup",
            vec![
                Task::new("Upload environment checklist", TaskKind::Basic),
                Task::new("Submit architecture notes", TaskKind::Basic),
            ],
        )]);
        trainee
    }

    fn submission(trainee: &str, title: &str, key: Option<TaskKey>) -> Submission {
        Submission {
            id: SubmissionId::from("s1"),
            trainee_id: TraineeId::from(trainee),
            assignment_title: title.to_string(),
            task_key: key,
            file_name: "notes.pdf".to_string(),
            file_url: "https://files.example.com/notes.pdf".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap(),
            review: None,
        }
    }

    #[test]
    fn certification_partitions_every_progress_value() {
        for progress in 0..=100u8 {
            let status = certification_status(progress);
            let expected = match progress {
                0 => CertificationStatus::NotStarted,
                100 => CertificationStatus::Completed,
                _ => CertificationStatus::InProgress,
            };
            assert_eq!(status, expected, "progress {progress}");
        }
    }

    #[test]
    fn perfect_quiz_at_95_clamps_to_100() {
        let score = QuizScore {
            correct: 10,
            total: 10,
        };

        assert_eq!(quiz_progress_delta(score), 10);
        assert_eq!(apply_quiz_progress(95, score), 100);
    }

    #[test]
    fn quiz_delta_rounds_to_nearest_ten_percent() {
        assert_eq!(quiz_progress_delta(QuizScore { correct: 2, total: 3 }), 7);
        assert_eq!(quiz_progress_delta(QuizScore { correct: 1, total: 3 }), 3);
        assert_eq!(quiz_progress_delta(QuizScore { correct: 0, total: 0 }), 0);
        assert_eq!(apply_quiz_progress(40, QuizScore { correct: 0, total: 5 }), 40);
    }

    #[test]
    fn assignments_match_on_description_for_legacy_submissions() {
        let trainee = trainee_with_plan();
        let submissions = vec![
            submission("t1", "Submit architecture notes", None),
            submission("t2", "Upload environment checklist", None),
        ];

        let states = assignment_states(&trainee, &submissions);

        assert_eq!(states.len(), 2);
        assert_eq!(states[0].state, AssignmentState::Pending);
        assert_eq!(states[1].state, AssignmentState::Submitted);
    }

    #[test]
    fn keyed_submissions_survive_task_rewording() {
        let mut trainee = trainee_with_plan();
        let key = trainee.onboarding_plan.weeks[0].tasks[0].key.clone();
        let submissions = vec![submission("t1", "Upload environment checklist", Some(key))];
        trainee.onboarding_plan.weeks[0].tasks[0].description = "Upload the dev checklist".to_string();

        let states = assignment_states(&trainee, &submissions);

        assert_eq!(states[0].state, AssignmentState::Submitted);
    }

    #[test]
    fn activity_dates_collapse_same_day_completions() {
        let mut trainee = trainee_with_plan();
        for (day, score) in [(3, 80), (1, 60), (3, 100), (2, 70)] {
            trainee.quiz_completions.push(QuizCompletion {
                date: date(day),
                score,
                quiz_id: None,
            });
        }

        let dates = activity_dates(&trainee);

        assert_eq!(dates, vec![date(1), date(2), date(3)]);
        assert_eq!(quiz_streak(&dates), 3);
    }

    #[test]
    fn streak_breaks_on_gap() {
        assert_eq!(quiz_streak(&[]), 0);
        assert_eq!(quiz_streak(&[date(1), date(2), date(5), date(6)]), 2);
    }

    #[test]
    fn snapshot_aggregates_counts() {
        let mut trainee = trainee_with_plan().with_progress(45);
        trainee.onboarding_plan.weeks[0].tasks[0].status = TaskStatus::Completed;
        let submissions = vec![submission("t1", "Submit architecture notes", None)];

        let snapshot = derive_status(&trainee, &submissions);

        assert_eq!(snapshot.certification_status, CertificationStatus::InProgress);
        assert_eq!(snapshot.status, TraineeStatus::NeedAttention);
        assert_eq!(snapshot.completed_tasks, 1);
        assert_eq!(snapshot.total_tasks, 2);
        assert_eq!(snapshot.submitted_assignments, 1);
        assert_eq!(snapshot.quiz_streak, 0);
    }
}
