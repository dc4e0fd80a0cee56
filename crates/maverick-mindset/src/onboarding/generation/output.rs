use serde::Deserialize;

use super::{GenerationError, PromptTemplate};
use crate::onboarding::domain::{Question, TestCase};
use crate::onboarding::mutation::CATCH_UP_LABEL;
use crate::onboarding::plan::{Plan, PlanWeek, TaskKey, TaskStatus, WeekStatus};

/// Quiz content produced by the generator; the service assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub topic: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Wrapped { weeks: Vec<PlanWeek> },
    Bare(Vec<PlanWeek>),
}

/// Models like to wrap JSON in markdown fences even when told not to.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn decode<T: for<'de> Deserialize<'de>>(
    template: PromptTemplate,
    raw: &str,
) -> Result<T, GenerationError> {
    serde_json::from_str(strip_fences(raw))
        .map_err(|err| GenerationError::invalid(template, err.to_string()))
}

/// Generated weeks start fresh: nothing completed, every task keyed anew.
fn reset_week(week: &mut PlanWeek) {
    week.status = WeekStatus::NotStarted;
    for task in &mut week.tasks {
        task.key = TaskKey::generate();
        task.status = TaskStatus::Pending;
        task.submitted_link = None;
    }
}

pub fn parse_plan(raw: &str) -> Result<Plan, GenerationError> {
    let template = PromptTemplate::OnboardingPlan;
    let weeks = match decode::<PlanDocument>(template, raw)? {
        PlanDocument::Wrapped { weeks } | PlanDocument::Bare(weeks) => weeks,
    };
    let mut plan = Plan::new(weeks);
    if plan.is_empty() {
        return Err(GenerationError::invalid(template, "plan has no weeks"));
    }
    plan.weeks.iter_mut().for_each(reset_week);
    plan.validate()
        .map_err(|err| GenerationError::invalid(template, err.to_string()))?;
    Ok(plan)
}

pub(crate) fn parse_catch_up_week(raw: &str) -> Result<PlanWeek, GenerationError> {
    let template = PromptTemplate::CatchUpPlan;
    let mut week: PlanWeek = decode(template, raw)?;
    reset_week(&mut week);
    if week.week.trim().is_empty() {
        week.week = CATCH_UP_LABEL.to_string();
    }

    if week
        .tasks
        .iter()
        .any(|task| task.kind.references_catalog())
    {
        return Err(GenerationError::invalid(
            template,
            "catch-up weeks only hold basic and link tasks",
        ));
    }
    Plan::new(vec![week.clone()])
        .validate()
        .map_err(|err| GenerationError::invalid(template, err.to_string()))?;
    Ok(week)
}

pub fn parse_quiz(raw: &str) -> Result<QuizDraft, GenerationError> {
    let template = PromptTemplate::Quiz;
    let draft: QuizDraft = decode(template, raw)?;

    if draft.title.trim().is_empty() {
        return Err(GenerationError::invalid(template, "quiz has no title"));
    }
    if draft.questions.is_empty() {
        return Err(GenerationError::invalid(template, "quiz has no questions"));
    }
    for (index, question) in draft.questions.iter().enumerate() {
        if question.options.len() < 2 {
            return Err(GenerationError::invalid(
                template,
                format!("question {index} needs at least two options"),
            ));
        }
        if !question
            .options
            .iter()
            .any(|option| option.trim() == question.correct_answer.trim())
        {
            return Err(GenerationError::invalid(
                template,
                format!("question {index} answer is not one of its options"),
            ));
        }
    }

    Ok(draft)
}

pub fn parse_challenge(raw: &str) -> Result<ChallengeDraft, GenerationError> {
    let template = PromptTemplate::Challenge;
    let draft: ChallengeDraft = decode(template, raw)?;

    if draft.title.trim().is_empty() || draft.description.trim().is_empty() {
        return Err(GenerationError::invalid(
            template,
            "challenge needs a title and a description",
        ));
    }

    Ok(draft)
}

/// Plain-text answers only need to be non-blank.
pub(crate) fn parse_text(template: PromptTemplate, raw: &str) -> Result<String, GenerationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(GenerationError::invalid(template, "empty response"));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::plan::TaskKind;

    const PLAN: &str = r#"```json
{"weeks":[
  {"week":"Week 1","topic":"Setup","status":"Completed","tasks":[
    {"description":"Install toolchain","type":"basic","status":"Completed"},
    {"description":"Quiz on Git","type":"quiz","id":"quiz-git"}
  ]},
  {"week":"Week 2","topic":"Codebase","tasks":[{"description":"Read architecture doc","type":"link"}]}
]}
```"#;

    #[test]
    fn fenced_plan_parses_and_resets_progress() {
        let plan = parse_plan(PLAN).expect("valid plan");

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.weeks[0].status, WeekStatus::NotStarted);
        assert_eq!(plan.completed_task_count(), 0);
        assert_eq!(plan.weeks[0].tasks[1].id.as_deref(), Some("quiz-git"));
    }

    #[test]
    fn bare_week_array_is_accepted() {
        let plan = parse_plan(r#"[{"week":"Week 1","topic":"Setup","tasks":[{"description":"Meet the team"}]}]"#)
            .expect("valid plan");
        assert_eq!(plan.weeks[0].tasks[0].kind, TaskKind::Basic);
    }

    #[test]
    fn plan_with_empty_week_is_rejected() {
        let err = parse_plan(r#"{"weeks":[{"week":"Week 1","topic":"Setup","tasks":[]}]}"#)
            .expect_err("empty week");
        assert!(matches!(err, GenerationError::InvalidOutput { template: "onboarding_plan", .. }));
    }

    #[test]
    fn catalog_id_on_basic_task_is_rejected() {
        let raw = r#"{"weeks":[{"week":"Week 1","topic":"Setup","tasks":[{"description":"Read","type":"basic","id":"q1"}]}]}"#;
        assert!(parse_plan(raw).is_err());
    }

    #[test]
    fn prose_is_invalid_output() {
        assert!(matches!(
            parse_plan("Here is your plan: week one..."),
            Err(GenerationError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn quiz_answer_must_be_an_option() {
        let raw = r#"{"title":"Git","questions":[{"question":"Undo a commit?","options":["git revert","git push"],"correctAnswer":"git reset"}]}"#;
        assert!(parse_quiz(raw).is_err());

        let fixed = raw.replace("\"git reset\"", "\"git revert\"");
        let draft = parse_quiz(&fixed).expect("valid quiz");
        assert_eq!(draft.questions.len(), 1);
    }

    #[test]
    fn catch_up_week_rejects_catalog_tasks() {
        let raw = r#"{"week":"Catch-up","topic":"Review","tasks":[{"description":"Retake","type":"quiz","id":"q1"}]}"#;
        assert!(parse_catch_up_week(raw).is_err());
    }

    #[test]
    fn challenge_needs_description() {
        assert!(parse_challenge(r#"{"title":"FizzBuzz","description":" "}"#).is_err());
        let draft = parse_challenge(r#"{"title":"FizzBuzz","description":"Print numbers","tags":["loops"]}"#)
            .expect("valid challenge");
        assert_eq!(draft.tags, vec!["loops"]);
    }
}
