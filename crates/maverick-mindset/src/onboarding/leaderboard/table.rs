//! Single-column sorting and filtering shared by the admin list views.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::super::domain::{Trainee, TraineeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Current sort column and direction of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSort<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: PartialEq + Copy> TableSort<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: K) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    /// Re-selecting the active column flips direction; a new column starts ascending.
    pub fn select(self, key: K) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::ascending(key)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
}

impl SortValue {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Stable sort by one column; rows without a value go last in either direction.
pub fn sort_rows<T, K, F>(rows: &mut [T], sort: &TableSort<K>, value_of: F)
where
    K: Copy,
    F: Fn(&T, K) -> Option<SortValue>,
{
    rows.sort_by(|a, b| {
        match (value_of(a, sort.key), value_of(b, sort.key)) {
            (Some(a), Some(b)) => match sort.direction {
                SortDirection::Asc => a.compare(&b),
                SortDirection::Desc => b.compare(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraineeColumn {
    Name,
    Email,
    Department,
    Batch,
    Progress,
    Status,
    LastLogin,
}

impl TraineeColumn {
    pub fn value(self, trainee: &Trainee) -> Option<SortValue> {
        let text = |value: &str| Some(SortValue::Text(value.to_string()));

        match self {
            Self::Name => text(&trainee.name),
            Self::Email => text(&trainee.email),
            Self::Department => text(&trainee.department),
            Self::Batch => text(&trainee.batch),
            Self::Progress => Some(SortValue::Number(trainee.progress() as f64)),
            Self::Status => Some(SortValue::Text(trainee.status().label().to_string())),
            Self::LastLogin => trainee
                .last_login
                .map(|at| SortValue::Number(at.timestamp_millis() as f64)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TraineeFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<TraineeStatus>,
}

impl TraineeFilter {
    pub fn matches(&self, trainee: &Trainee) -> bool {
        if let Some(department) = &self.department {
            if &trainee.department != department {
                return false;
            }
        }

        if let Some(status) = self.status {
            if trainee.status() != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                trainee.name.to_lowercase().contains(&needle)
                    || trainee.email.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

pub fn filter_trainees<'a>(trainees: &'a [Trainee], filter: &TraineeFilter) -> Vec<&'a Trainee> {
    trainees
        .iter()
        .filter(|trainee| filter.matches(trainee))
        .collect()
}
