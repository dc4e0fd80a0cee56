use serde::Serialize;

use super::domain::Trainee;

pub const HIGH_FLYER_PROGRESS: u8 = 90;
pub const QUIZ_WHIZ_COMPLETIONS: usize = 20;
pub const PERFECT_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    HighFlyer,
    QuizWhiz,
    CodeSamurai,
    PerfectScorer,
    ChallengeChampion,
    Trailblazer,
}

impl Badge {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::HighFlyer,
            Self::QuizWhiz,
            Self::CodeSamurai,
            Self::PerfectScorer,
            Self::ChallengeChampion,
            Self::Trailblazer,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighFlyer => "High Flyer",
            Self::QuizWhiz => "Quiz Whiz",
            Self::CodeSamurai => "Code Samurai",
            Self::PerfectScorer => "Perfect Scorer",
            Self::ChallengeChampion => "Challenge Champion",
            Self::Trailblazer => "Trailblazer",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::HighFlyer => "Reached 90% onboarding progress",
            Self::QuizWhiz => "Completed 20 or more quizzes",
            Self::CodeSamurai => "Solved at least half of the coding challenges",
            Self::PerfectScorer => "Scored 100% on a quiz",
            Self::ChallengeChampion => "Solved every coding challenge",
            Self::Trailblazer => "Finished the onboarding program",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::HighFlyer => "rocket",
            Self::QuizWhiz => "brain",
            Self::CodeSamurai => "sword",
            Self::PerfectScorer => "target",
            Self::ChallengeChampion => "trophy",
            Self::Trailblazer => "flag",
        }
    }

    fn earned(self, trainee: &Trainee, total_challenges: usize) -> bool {
        let solved = trainee.completed_challenge_ids.len();
        match self {
            Self::HighFlyer => trainee.progress() >= HIGH_FLYER_PROGRESS,
            Self::QuizWhiz => trainee.quiz_completions.len() >= QUIZ_WHIZ_COMPLETIONS,
            // solved >= total / 2 without losing the half on odd totals
            Self::CodeSamurai => total_challenges > 0 && solved * 2 >= total_challenges,
            Self::PerfectScorer => trainee
                .quiz_completions
                .iter()
                .any(|completion| completion.score == PERFECT_SCORE),
            Self::ChallengeChampion => total_challenges > 0 && solved == total_challenges,
            Self::Trailblazer => trainee.progress() == 100,
        }
    }

    pub fn view(self) -> BadgeView {
        BadgeView {
            badge: self,
            label: self.label(),
            description: self.description(),
            icon: self.icon(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeView {
    pub badge: Badge,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Badges the trainee currently holds, in display order.
pub fn evaluate(trainee: &Trainee, total_challenges: usize) -> Vec<Badge> {
    Badge::ordered()
        .into_iter()
        .filter(|badge| badge.earned(trainee, total_challenges))
        .collect()
}
