use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) id: Option<String>,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) department: String,
    pub(crate) batch: String,
    pub(crate) progress: u8,
    pub(crate) last_login: Option<DateTime<Utc>>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RosterRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<RosterRow>() {
        let row = record?;
        let progress = row.progress();
        let last_login = row.last_login.as_deref().and_then(parse_timestamp);

        records.push(RosterRecord {
            id: row.id,
            name: row.name,
            email: row.email.to_ascii_lowercase(),
            department: row.department.unwrap_or_default(),
            batch: row.batch.unwrap_or_default(),
            progress,
            last_login,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Id", default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Department", default, deserialize_with = "empty_string_as_none")]
    department: Option<String>,
    #[serde(rename = "Batch", default, deserialize_with = "empty_string_as_none")]
    batch: Option<String>,
    #[serde(rename = "Progress", default, deserialize_with = "empty_string_as_none")]
    progress: Option<String>,
    #[serde(rename = "Last Login", default, deserialize_with = "empty_string_as_none")]
    last_login: Option<String>,
}

impl RosterRow {
    fn progress(&self) -> u8 {
        self.progress
            .as_deref()
            .map(|value| value.trim_end_matches('%'))
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(|value| value.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn row_parses_progress_and_login() {
        let record = parse_records(Cursor::new(
            "Name,Email,Department,Batch,Progress,Last Login\nAna,ANA@Example.com,Engineering,2025-A,87.6%,2025-03-02\n",
        ))
        .expect("parse")
        .pop()
        .expect("record");

        assert_eq!(record.email, "ana@example.com");
        assert_eq!(record.progress, 88);
        assert_eq!(
            record.last_login.map(|at| at.date_naive()),
            NaiveDate::from_ymd_opt(2025, 3, 2)
        );
    }

    #[test]
    fn missing_optional_columns_default() {
        let record = parse_records(Cursor::new("Name,Email\nBo,bo@example.com\n"))
            .expect("parse")
            .pop()
            .expect("record");

        assert_eq!(record.progress, 0);
        assert!(record.department.is_empty());
        assert!(record.id.is_none());
        assert!(record.last_login.is_none());
    }
}
