//! Pure plan editing operations.
//!
//! Every operation borrows the current plan and returns a new one, so a failed edit never leaves
//! a half-applied plan behind. Callers persist the returned plan as a whole-document replace.

use serde::{Deserialize, Serialize};

use super::plan::{
    Plan, PlanWeek, Task, TaskKind, TaskStatus, WeekStatus, DEFAULT_WEEK_TOPIC,
};

pub const CATCH_UP_LABEL: &str = "Catch-up";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanEditError {
    #[error("week index {week_index} out of range (plan has {len} weeks)")]
    WeekOutOfRange { week_index: usize, len: usize },
    #[error("task index {task_index} out of range (week {week_index} has {len} tasks)")]
    TaskOutOfRange {
        week_index: usize,
        task_index: usize,
        len: usize,
    },
    #[error("week {week_index} must keep at least one task")]
    LastTask { week_index: usize },
}

impl PlanEditError {
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::WeekOutOfRange { .. } | Self::TaskOutOfRange { .. }
        )
    }
}

/// A single field assignment on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TaskFieldValue {
    Description(String),
    #[serde(rename = "type")]
    Kind(TaskKind),
    Status(TaskStatus),
    #[serde(rename = "id")]
    CatalogId(Option<String>),
    SubmittedLink(Option<String>),
}

/// A single field assignment on a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum WeekFieldValue {
    #[serde(rename = "week")]
    Label(String),
    Topic(String),
    Status(WeekStatus),
}

/// Admin editing action, as received from the plan editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanEdit {
    AddWeek,
    RemoveWeek {
        week_index: usize,
    },
    AddTask {
        week_index: usize,
    },
    RemoveTask {
        week_index: usize,
        task_index: usize,
    },
    SetTaskField {
        week_index: usize,
        task_index: usize,
        change: TaskFieldValue,
    },
    SetWeekField {
        week_index: usize,
        change: WeekFieldValue,
    },
}

pub fn apply(plan: &Plan, edit: &PlanEdit) -> Result<Plan, PlanEditError> {
    match edit {
        PlanEdit::AddWeek => Ok(add_week(plan)),
        PlanEdit::RemoveWeek { week_index } => remove_week(plan, *week_index),
        PlanEdit::AddTask { week_index } => add_task(plan, *week_index),
        PlanEdit::RemoveTask {
            week_index,
            task_index,
        } => remove_task(plan, *week_index, *task_index),
        PlanEdit::SetTaskField {
            week_index,
            task_index,
            change,
        } => set_task_field(plan, *week_index, *task_index, change.clone()),
        PlanEdit::SetWeekField { week_index, change } => {
            set_week_field(plan, *week_index, change.clone())
        }
    }
}

/// Label number for the next appended week.
pub fn next_week_number(plan: &Plan) -> u32 {
    plan.weeks
        .iter()
        .filter_map(PlanWeek::ordinal)
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(1)
}

pub fn add_week(plan: &Plan) -> Plan {
    let mut next = plan.clone();
    let label = format!("Week {}", next_week_number(plan));
    next.weeks.push(PlanWeek::new(label, DEFAULT_WEEK_TOPIC));
    next
}

pub fn remove_week(plan: &Plan, week_index: usize) -> Result<Plan, PlanEditError> {
    check_week(plan, week_index)?;
    let mut next = plan.clone();
    next.weeks.remove(week_index);
    Ok(next)
}

pub fn add_task(plan: &Plan, week_index: usize) -> Result<Plan, PlanEditError> {
    check_week(plan, week_index)?;
    let mut next = plan.clone();
    next.weeks[week_index].tasks.push(Task::default());
    Ok(next)
}

pub fn remove_task(
    plan: &Plan,
    week_index: usize,
    task_index: usize,
) -> Result<Plan, PlanEditError> {
    check_task(plan, week_index, task_index)?;
    if plan.weeks[week_index].tasks.len() == 1 {
        return Err(PlanEditError::LastTask { week_index });
    }

    let mut next = plan.clone();
    next.weeks[week_index].tasks.remove(task_index);
    Ok(next)
}

/// Sets one task field while keeping the type-dependent fields consistent.
///
/// Switching to `basic` or `link` drops any catalog id, switching away from `link` drops the
/// submitted link. Catalog ids and links assigned to a task of the wrong type are ignored.
pub fn set_task_field(
    plan: &Plan,
    week_index: usize,
    task_index: usize,
    value: TaskFieldValue,
) -> Result<Plan, PlanEditError> {
    check_task(plan, week_index, task_index)?;
    let mut next = plan.clone();
    let task = &mut next.weeks[week_index].tasks[task_index];

    match value {
        TaskFieldValue::Description(description) => task.description = description,
        TaskFieldValue::Kind(kind) => {
            task.kind = kind;
            if !kind.references_catalog() {
                task.id = None;
            }
            if kind != TaskKind::Link {
                task.submitted_link = None;
            }
        }
        TaskFieldValue::Status(status) => task.status = status,
        TaskFieldValue::CatalogId(id) => {
            if task.kind.references_catalog() || id.is_none() {
                task.id = id;
            }
        }
        TaskFieldValue::SubmittedLink(link) => {
            if task.kind == TaskKind::Link || link.is_none() {
                task.submitted_link = link;
            }
        }
    }

    Ok(next)
}

pub fn set_week_field(
    plan: &Plan,
    week_index: usize,
    value: WeekFieldValue,
) -> Result<Plan, PlanEditError> {
    check_week(plan, week_index)?;
    let mut next = plan.clone();
    let week = &mut next.weeks[week_index];

    match value {
        WeekFieldValue::Label(label) => week.week = label,
        WeekFieldValue::Topic(topic) => week.topic = topic,
        WeekFieldValue::Status(status) => week.status = status,
    }

    Ok(next)
}

/// Marks a task completed on behalf of the trainee and refreshes the week status.
pub fn complete_task(
    plan: &Plan,
    week_index: usize,
    task_index: usize,
    submitted_link: Option<String>,
) -> Result<Plan, PlanEditError> {
    check_task(plan, week_index, task_index)?;
    let mut next = plan.clone();
    let week = &mut next.weeks[week_index];
    let task = &mut week.tasks[task_index];

    task.status = TaskStatus::Completed;
    if task.kind == TaskKind::Link {
        if let Some(link) = submitted_link {
            task.submitted_link = Some(link);
        }
    }

    week.status = week.derived_status();
    Ok(next)
}

/// Puts a generated catch-up week in front of the existing plan.
pub fn prepend_catch_up(plan: &Plan, mut catch_up: PlanWeek) -> Plan {
    if catch_up.week.trim().is_empty() {
        catch_up.week = CATCH_UP_LABEL.to_string();
    }
    if catch_up.tasks.is_empty() {
        catch_up.tasks.push(Task::default());
    }
    catch_up.status = WeekStatus::NotStarted;

    let mut next = plan.clone();
    next.weeks.insert(0, catch_up);
    next
}

fn check_week(plan: &Plan, week_index: usize) -> Result<(), PlanEditError> {
    if week_index < plan.weeks.len() {
        Ok(())
    } else {
        Err(PlanEditError::WeekOutOfRange {
            week_index,
            len: plan.weeks.len(),
        })
    }
}

fn check_task(plan: &Plan, week_index: usize, task_index: usize) -> Result<(), PlanEditError> {
    check_week(plan, week_index)?;
    let len = plan.weeks[week_index].tasks.len();
    if task_index < len {
        Ok(())
    } else {
        Err(PlanEditError::TaskOutOfRange {
            week_index,
            task_index,
            len,
        })
    }
}
