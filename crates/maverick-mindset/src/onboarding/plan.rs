use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_TASK_DESCRIPTION: &str = "New task";
pub const DEFAULT_WEEK_TOPIC: &str = "New Topic";

/// Stable task identity, independent of the task's wording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(pub String);

impl TaskKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Keyless documents deserialize with an empty key until a key is assigned and stored.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Basic,
    Link,
    Quiz,
    Challenge,
}

impl TaskKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Link => "link",
            Self::Quiz => "quiz",
            Self::Challenge => "challenge",
        }
    }

    /// Quiz and challenge tasks point at a catalog entry; the others never do.
    pub const fn references_catalog(self) -> bool {
        matches!(self, Self::Quiz | Self::Challenge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeekStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl WeekStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub key: TaskKey,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    #[serde(default)]
    pub status: TaskStatus,
    /// Quiz or challenge catalog id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_link: Option<String>,
}

impl Task {
    pub fn new(description: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            key: TaskKey::generate(),
            description: description.into(),
            kind,
            status: TaskStatus::Pending,
            id: None,
            submitted_link: None,
        }
    }

    pub fn referencing(description: impl Into<String>, kind: TaskKind, id: impl Into<String>) -> Self {
        let mut task = Self::new(description, kind);
        if kind.references_catalog() {
            task.id = Some(id.into());
        }
        task
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_DESCRIPTION, TaskKind::Basic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWeek {
    pub week: String,
    pub topic: String,
    #[serde(default)]
    pub status: WeekStatus,
    pub tasks: Vec<Task>,
}

impl PlanWeek {
    /// Builds a week seeded with one default task.
    pub fn new(week: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            week: week.into(),
            topic: topic.into(),
            status: WeekStatus::NotStarted,
            tasks: vec![Task::default()],
        }
    }

    pub fn with_tasks(week: impl Into<String>, topic: impl Into<String>, tasks: Vec<Task>) -> Self {
        let mut built = Self::new(week, topic);
        if !tasks.is_empty() {
            built.tasks = tasks;
        }
        built
    }

    /// Trailing digits of the label, e.g. `Week 12` -> 12.
    pub fn ordinal(&self) -> Option<u32> {
        let trimmed = self.week.trim_end();
        let digits_start = trimmed
            .char_indices()
            .rev()
            .take_while(|(_, ch)| ch.is_ascii_digit())
            .last()
            .map(|(idx, _)| idx)?;
        trimmed[digits_start..].parse().ok()
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed()).count()
    }

    /// Status implied by the completion state of the tasks.
    pub fn derived_status(&self) -> WeekStatus {
        let completed = self.completed_tasks();
        if completed == 0 {
            WeekStatus::NotStarted
        } else if completed == self.tasks.len() {
            WeekStatus::Completed
        } else {
            WeekStatus::InProgress
        }
    }
}

/// Ordered weekly onboarding plan assigned to a trainee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub weeks: Vec<PlanWeek>,
}

impl Plan {
    pub fn new(weeks: Vec<PlanWeek>) -> Self {
        Self { weeks }
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.weeks.iter().flat_map(|week| week.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.weeks.iter().map(|week| week.tasks.len()).sum()
    }

    pub fn completed_task_count(&self) -> usize {
        self.weeks.iter().map(PlanWeek::completed_tasks).sum()
    }

    /// Gives every keyless task a fresh key; returns how many were assigned.
    pub fn assign_missing_keys(&mut self) -> usize {
        let mut assigned = 0;
        for task in self.weeks.iter_mut().flat_map(|week| week.tasks.iter_mut()) {
            if task.key.is_unassigned() {
                task.key = TaskKey::generate();
                assigned += 1;
            }
        }
        assigned
    }

    pub fn find_task(&self, key: &TaskKey) -> Option<(usize, usize)> {
        if key.is_unassigned() {
            return None;
        }
        self.weeks.iter().enumerate().find_map(|(week_index, week)| {
            week.tasks
                .iter()
                .position(|task| &task.key == key)
                .map(|task_index| (week_index, task_index))
        })
    }

    /// Structural check applied to generated or uploaded plans before they are stored.
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        for (week_index, week) in self.weeks.iter().enumerate() {
            if week.week.trim().is_empty() {
                return Err(PlanValidationError::MissingWeekLabel { week_index });
            }
            if week.tasks.is_empty() {
                return Err(PlanValidationError::EmptyWeek { week_index });
            }

            for (task_index, task) in week.tasks.iter().enumerate() {
                if task.description.trim().is_empty() {
                    return Err(PlanValidationError::MissingDescription {
                        week_index,
                        task_index,
                    });
                }
                if task.id.is_some() && !task.kind.references_catalog() {
                    return Err(PlanValidationError::UnexpectedCatalogId {
                        week_index,
                        task_index,
                        kind: task.kind,
                    });
                }
                if task.submitted_link.is_some() && task.kind != TaskKind::Link {
                    return Err(PlanValidationError::UnexpectedLink {
                        week_index,
                        task_index,
                        kind: task.kind,
                    });
                }
            }
        }

        Ok(())
    }
}

impl From<Vec<PlanWeek>> for Plan {
    fn from(weeks: Vec<PlanWeek>) -> Self {
        Self::new(weeks)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanValidationError {
    #[error("week {week_index} has no label")]
    MissingWeekLabel { week_index: usize },
    #[error("week {week_index} has no tasks")]
    EmptyWeek { week_index: usize },
    #[error("task {task_index} in week {week_index} has no description")]
    MissingDescription {
        week_index: usize,
        task_index: usize,
    },
    #[error("task {task_index} in week {week_index} is a {} task but carries a catalog id", .kind.label())]
    UnexpectedCatalogId {
        week_index: usize,
        task_index: usize,
        kind: TaskKind,
    },
    #[error("task {task_index} in week {week_index} is a {} task but carries a submitted link", .kind.label())]
    UnexpectedLink {
        week_index: usize,
        task_index: usize,
        kind: TaskKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_link_survives_json_round_trip() {
        let mut task = Task::new("Share your sandbox repository", TaskKind::Link);
        task.submitted_link = Some("https://git.example.com/alex/sandbox?ref=main#L1".to_string());
        let plan = Plan::new(vec![PlanWeek::with_tasks("Week 1", "Tooling", vec![task])]);

        let json = serde_json::to_string(&plan).expect("plan serializes");
        let restored: Plan = serde_json::from_str(&json).expect("plan deserializes");

        assert_eq!(restored, plan);
        assert_eq!(
            restored.weeks[0].tasks[0].submitted_link.as_deref(),
            Some("https://git.example.com/alex/sandbox?ref=main#L1")
        );
    }

    #[test]
    fn absent_optionals_are_omitted_not_empty() {
        let plan = Plan::new(vec![PlanWeek::new("Week 1", "Orientation")]);
        let value = serde_json::to_value(&plan).expect("plan serializes");
        let task = &value[0]["tasks"][0];

        assert_eq!(task["type"], "basic");
        assert_eq!(task["status"], "Pending");
        assert!(task.get("id").is_none());
        assert!(task.get("submittedLink").is_none());
        assert_eq!(value[0]["status"], "Not Started");
    }

    #[test]
    fn legacy_documents_without_keys_are_keyed_once() {
        let raw = r#"[{"week":"Week 1","topic":"Git","tasks":[{"description":"Clone repo","type":"basic","status":"Pending"},{"key":"k-2","description":"Push branch"}]}]"#;
        let mut plan: Plan = serde_json::from_str(raw).expect("legacy plan parses");

        assert_eq!(plan.weeks[0].status, WeekStatus::NotStarted);
        assert!(plan.weeks[0].tasks[0].key.is_unassigned());
        assert_eq!(plan.find_task(&TaskKey::default()), None);

        assert_eq!(plan.assign_missing_keys(), 1);
        let assigned = plan.weeks[0].tasks[0].key.clone();
        assert!(!assigned.is_unassigned());
        assert_eq!(plan.weeks[0].tasks[1].key, TaskKey("k-2".to_string()));

        assert_eq!(plan.assign_missing_keys(), 0);
        assert_eq!(plan.weeks[0].tasks[0].key, assigned);
        assert_eq!(plan.find_task(&assigned), Some((0, 0)));
    }

    #[test]
    fn ordinal_reads_trailing_digits() {
        assert_eq!(PlanWeek::new("Week 12", "x").ordinal(), Some(12));
        assert_eq!(PlanWeek::new("W3 ", "x").ordinal(), Some(3));
        assert_eq!(PlanWeek::new("Catch-up", "x").ordinal(), None);
    }

    #[test]
    fn validate_rejects_catalog_id_on_basic_task() {
        let mut task = Task::default();
        task.id = Some("quiz-1".to_string());
        let plan = Plan::new(vec![PlanWeek::with_tasks("Week 1", "Intro", vec![task])]);

        assert!(matches!(
            plan.validate(),
            Err(PlanValidationError::UnexpectedCatalogId { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_week() {
        let mut week = PlanWeek::new("Week 1", "Intro");
        week.tasks.clear();

        assert_eq!(
            Plan::new(vec![week]).validate(),
            Err(PlanValidationError::EmptyWeek { week_index: 0 })
        );
    }
}
