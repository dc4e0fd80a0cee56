use crate::infra::{ConfiguredGenerator, InMemoryFileStorage, InMemoryOnboardingRepository};
use clap::Args;
use maverick_mindset::error::AppError;
use maverick_mindset::onboarding::leaderboard::{
    export_leaderboard_csv, filter_trainees, leaderboard, sort_rows, LeaderboardEntry,
    SortDirection, TableSort, TraineeColumn, TraineeFilter,
};
use maverick_mindset::onboarding::roster::SAMPLE_ROSTER;
use maverick_mindset::onboarding::{
    AssignmentUpload, Challenge, ChallengeId, MindsetError, OnboardingRepository,
    OnboardingService, PlanEdit, Principal, Question, Quiz, QuizId, RosterImporter,
    TaskCompletion, TaskFieldValue, TaskKind, Trainee, TraineeStatus, WeekFieldValue,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LeaderboardArgs {
    /// Roster CSV export (Id, Name, Email, Department, Batch, Progress, Last Login)
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Only rank trainees from this department
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Write the ranking as CSV instead of printing it
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TraineesArgs {
    /// Roster CSV export
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Case-insensitive match on name or email
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// One of: on-track, need-attention, at-risk, not-started
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<TraineeStatus>,
    /// Column to sort by: name, email, department, batch, progress, status, last-login
    #[arg(long, value_parser = parse_column)]
    pub(crate) sort: Option<TraineeColumn>,
    /// Sort descending instead of ascending
    #[arg(long)]
    pub(crate) desc: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Roster CSV to use instead of the bundled sample
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) fn parse_status(raw: &str) -> Result<TraineeStatus, String> {
    let normalized = raw.trim().to_ascii_lowercase().replace([' ', '_'], "-");
    TraineeStatus::ordered()
        .into_iter()
        .find(|status| status.label().to_ascii_lowercase().replace(' ', "-") == normalized)
        .ok_or_else(|| format!("unknown status '{raw}'"))
}

pub(crate) fn parse_column(raw: &str) -> Result<TraineeColumn, String> {
    match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "name" => Ok(TraineeColumn::Name),
        "email" => Ok(TraineeColumn::Email),
        "department" => Ok(TraineeColumn::Department),
        "batch" => Ok(TraineeColumn::Batch),
        "progress" => Ok(TraineeColumn::Progress),
        "status" => Ok(TraineeColumn::Status),
        "last-login" => Ok(TraineeColumn::LastLogin),
        _ => Err(format!("unknown column '{raw}'")),
    }
}

pub(crate) fn run_leaderboard(args: LeaderboardArgs) -> Result<(), AppError> {
    let trainees = RosterImporter::from_path(&args.roster)?;
    let entries = leaderboard(&trainees, args.department.as_deref());

    match args.export {
        Some(path) => {
            let writer = BufWriter::new(File::create(&path)?);
            export_leaderboard_csv(&entries, writer)?;
            println!("Wrote {} ranked trainees to {}", entries.len(), path.display());
        }
        None => render_leaderboard(&entries),
    }
    Ok(())
}

pub(crate) fn run_trainee_table(args: TraineesArgs) -> Result<(), AppError> {
    let trainees = RosterImporter::from_path(&args.roster)?;
    let filter = TraineeFilter {
        search: args.search,
        department: args.department,
        status: args.status,
    };

    let mut rows: Vec<Trainee> = filter_trainees(&trainees, &filter)
        .into_iter()
        .cloned()
        .collect();
    if let Some(column) = args.sort {
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        sort_rows(&mut rows, &TableSort::new(column, direction), |trainee, column| {
            column.value(trainee)
        });
    }

    println!("{} of {} trainees", rows.len(), trainees.len());
    for trainee in &rows {
        let last_login = trainee
            .last_login
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {:<20} {:<28} {:<12} {:>3}% {:<15} last login {}",
            trainee.name,
            trainee.email,
            trainee.department,
            trainee.progress(),
            trainee.status().label(),
            last_login
        );
    }
    Ok(())
}

fn render_leaderboard(entries: &[LeaderboardEntry]) {
    println!("Leaderboard ({} trainees)", entries.len());
    for entry in entries {
        println!(
            "  {:>6}  {:<20} {:<12} {:>3}%  {}",
            entry.rank_label,
            entry.name,
            entry.department,
            entry.progress,
            entry.status.label()
        );
    }
}

type DemoService =
    OnboardingService<InMemoryOnboardingRepository, ConfiguredGenerator, InMemoryFileStorage>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let trainees = match args.roster {
        Some(path) => RosterImporter::from_path(path)?,
        None => RosterImporter::from_reader(SAMPLE_ROSTER.as_bytes())?,
    };

    let repository = Arc::new(InMemoryOnboardingRepository::default());
    let service: DemoService = OnboardingService::new(
        repository.clone(),
        Arc::new(ConfiguredGenerator::Disabled),
        Arc::new(InMemoryFileStorage::default()),
    );
    let admin = Principal::admin("admin", "admin@maverick.local");

    println!("Maverick Mindset onboarding demo");
    let added = service.import_roster(&admin, trainees)?;
    println!("- Imported {added} trainees");
    seed_catalog(&repository)?;

    let roster = repository.trainees().map_err(MindsetError::from)?;
    let Some(trainee) = pick_demo_trainee(&roster) else {
        println!("Roster is empty; nothing to demo.");
        return Ok(());
    };
    let trainee_id = trainee.id.clone();
    let actor = Principal::trainee(trainee_id.0.clone(), trainee.email.clone());
    println!(
        "- Demo trainee: {} ({}, {}% {})",
        trainee.name,
        trainee.department,
        trainee.progress(),
        trainee.status().label()
    );

    let edits = [
        PlanEdit::AddWeek,
        PlanEdit::SetWeekField {
            week_index: 0,
            change: WeekFieldValue::Topic("Tooling and version control".to_string()),
        },
        PlanEdit::SetTaskField {
            week_index: 0,
            task_index: 0,
            change: TaskFieldValue::Description("Share your dotfiles repository".to_string()),
        },
        PlanEdit::SetTaskField {
            week_index: 0,
            task_index: 0,
            change: TaskFieldValue::Kind(TaskKind::Link),
        },
        PlanEdit::AddTask { week_index: 0 },
        PlanEdit::SetTaskField {
            week_index: 0,
            task_index: 1,
            change: TaskFieldValue::Kind(TaskKind::Quiz),
        },
        PlanEdit::SetTaskField {
            week_index: 0,
            task_index: 1,
            change: TaskFieldValue::CatalogId(Some("quiz-git-basics".to_string())),
        },
        PlanEdit::AddWeek,
        PlanEdit::SetTaskField {
            week_index: 1,
            task_index: 0,
            change: TaskFieldValue::Kind(TaskKind::Challenge),
        },
        PlanEdit::SetTaskField {
            week_index: 1,
            task_index: 0,
            change: TaskFieldValue::CatalogId(Some("challenge-fizzbuzz".to_string())),
        },
    ];
    let mut plan = None;
    for edit in &edits {
        plan = Some(service.apply_plan_edit(&admin, &trainee_id, edit)?);
    }
    if let Some(plan) = &plan {
        println!("\nPlan ({} weeks, {} tasks)", plan.len(), plan.task_count());
        for week in &plan.weeks {
            println!("  {} - {}", week.week, week.topic);
            for task in &week.tasks {
                println!("    [{}] {}", task.kind.label(), task.description);
            }
        }
    }

    let pointer = service.set_daily_quiz(&admin, &QuizId::from("quiz-git-basics"))?;
    println!("\nQuiz catalogue");
    for quiz in service.quizzes(&actor)? {
        let marker = if quiz.is_daily(Some(&pointer)) {
            " (today's quiz)"
        } else {
            ""
        };
        println!("  {}{}", quiz.title, marker);
    }

    println!("\nTrainee activity");
    let completion = TaskCompletion {
        week_index: Some(0),
        task_index: Some(0),
        submitted_link: Some("https://git.example.com/dotfiles".to_string()),
        ..TaskCompletion::default()
    };
    service.complete_task(&actor, &trainee_id, completion)?;
    println!("- Completed the link task");

    let answers = vec!["git commit".to_string(), "git rebase".to_string()];
    let quiz_id = QuizId::from("quiz-git-basics");
    let outcome = service.submit_quiz(&actor, &trainee_id, &quiz_id, &answers)?;
    println!(
        "- Quiz: {}/{} correct ({}%), progress +{} -> {}%",
        outcome.correct, outcome.total, outcome.score_pct, outcome.progress_delta, outcome.progress
    );

    let challenge = service.complete_challenge(
        &actor,
        &trainee_id,
        &ChallengeId::from("challenge-fizzbuzz"),
    )?;
    println!(
        "- Challenge solved ({} completed so far)",
        challenge.challenges_completed
    );

    let submission = service.submit_assignment(
        &actor,
        &trainee_id,
        AssignmentUpload {
            task_key: None,
            assignment_title: Some("Architecture notes".to_string()),
            file_name: "architecture.md".to_string(),
            content_type: "text/markdown".to_string(),
            bytes: b"# Notes\nServices talk over HTTP.".to_vec(),
        },
    )?;
    let reviewed = service.review_submission(
        &admin,
        &submission.id,
        92,
        "Clear and concise.".to_string(),
    )?;
    if let Some(review) = &reviewed.review {
        println!(
            "- Submission {} reviewed: {} ({})",
            reviewed.id, review.score, review.feedback
        );
    }

    let dashboard = service.dashboard(&actor, &trainee_id)?;
    println!("\nDashboard");
    println!(
        "- {} | {}% | {} | certification {}",
        dashboard.snapshot.name,
        dashboard.snapshot.progress,
        dashboard.snapshot.status_label,
        dashboard.snapshot.certification_label
    );
    println!(
        "- Tasks {}/{} | quizzes {} | streak {} day(s)",
        dashboard.snapshot.completed_tasks,
        dashboard.snapshot.total_tasks,
        dashboard.snapshot.quizzes_taken,
        dashboard.snapshot.quiz_streak
    );
    if dashboard.badges.is_empty() {
        println!("- No badges yet");
    }
    for badge in &dashboard.badges {
        println!("- Badge: {} ({})", badge.label, badge.description);
    }

    println!();
    let department = dashboard.snapshot.department.as_str();
    render_leaderboard(&service.leaderboard(&actor, Some(department))?);
    Ok(())
}

fn pick_demo_trainee(trainees: &[Trainee]) -> Option<Trainee> {
    trainees
        .iter()
        .find(|trainee| trainee.status() == TraineeStatus::AtRisk)
        .or_else(|| trainees.first())
        .cloned()
}

fn seed_catalog(repository: &InMemoryOnboardingRepository) -> Result<(), AppError> {
    let quiz = Quiz {
        id: QuizId::from("quiz-git-basics"),
        title: "Git basics".to_string(),
        topic: "Version control".to_string(),
        questions: vec![
            Question {
                question: "Which command records staged changes?".to_string(),
                options: vec!["git commit".to_string(), "git add".to_string()],
                correct_answer: "git commit".to_string(),
            },
            Question {
                question: "Which command publishes local commits?".to_string(),
                options: vec!["git rebase".to_string(), "git push".to_string()],
                correct_answer: "git push".to_string(),
            },
        ],
    };
    let challenge = Challenge {
        id: ChallengeId::from("challenge-fizzbuzz"),
        title: "FizzBuzz".to_string(),
        description: "Print 1..=15 replacing multiples of 3 and 5.".to_string(),
        difficulty: "Easy".to_string(),
        tags: vec!["loops".to_string()],
        test_cases: Vec::new(),
    };

    repository.insert_quiz(quiz).map_err(MindsetError::from)?;
    repository
        .insert_challenge(challenge)
        .map_err(MindsetError::from)?;
    Ok(())
}
