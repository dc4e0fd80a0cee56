mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use uuid::Uuid;

use super::domain::Trainee;

/// Bundled example roster used by the `demo` command and tests.
pub const SAMPLE_ROSTER: &str = include_str!("../../../data/sample_roster.csv");

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingField { row: usize, field: &'static str },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read trainee roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid trainee roster CSV data: {}", err),
            RosterImportError::MissingField { row, field } => {
                write!(f, "roster row {} is missing {}", row, field)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::MissingField { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads trainees from a roster export with `Name,Email,Department,Batch,Progress` columns.
///
/// `Id` and `Last Login` columns are optional; rows without an id get a generated one. Rows
/// repeating an email already seen are skipped.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Trainee>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Trainee>, RosterImportError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut trainees = Vec::new();

        for (index, record) in parser::parse_records(reader)?.into_iter().enumerate() {
            let row = index + 1;
            if record.name.is_empty() {
                return Err(RosterImportError::MissingField { row, field: "name" });
            }
            if record.email.is_empty() {
                return Err(RosterImportError::MissingField { row, field: "email" });
            }
            if !seen.insert(record.email.clone()) {
                continue;
            }

            let id = record
                .id
                .unwrap_or_else(|| format!("trainee-{}", Uuid::new_v4().simple()));
            let mut trainee = Trainee::new(
                id,
                record.name,
                record.email,
                record.department,
                record.batch,
            )
            .with_progress(record.progress);
            trainee.last_login = record.last_login;
            trainees.push(trainee);
        }

        Ok(trainees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::domain::TraineeStatus;
    use std::io::Cursor;

    const ROSTER: &str = "\
Name,Email,Department,Batch,Progress
Ana Reyes,ana@example.com,Engineering,2025-A,72
Bo Chen,bo@example.com,Sales,2025-A,
Ana Duplicate,ANA@example.com,Engineering,2025-B,10
Cy Park,cy@example.com,Engineering,2025-B,140
";

    #[test]
    fn imports_rows_in_order_and_skips_duplicate_emails() {
        let trainees = RosterImporter::from_reader(Cursor::new(ROSTER)).expect("import succeeds");

        let names: Vec<_> = trainees.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Reyes", "Bo Chen", "Cy Park"]);
        assert!(trainees[0].id.0.starts_with("trainee-"));
        assert_ne!(trainees[0].id, trainees[2].id);
        assert_eq!(trainees[0].status(), TraineeStatus::OnTrack);
        assert_eq!(trainees[1].progress(), 0);
        assert_eq!(trainees[2].progress(), 100);
    }

    #[test]
    fn explicit_ids_are_kept() {
        let csv = "Id,Name,Email\nemp-7,Dee,dee@example.com\n";
        let trainees = RosterImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(trainees[0].id.0, "emp-7");
    }

    #[test]
    fn blank_email_is_rejected_with_row_number() {
        let csv = "Name,Email\nAna,ana@example.com\nBo,\n";
        let err = RosterImporter::from_reader(Cursor::new(csv)).expect_err("blank email fails");

        assert!(matches!(
            err,
            RosterImportError::MissingField { row: 2, field: "email" }
        ));
    }

    #[test]
    fn propagates_io_errors() {
        struct FailingReader;

        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            }
        }

        let err = RosterImporter::from_reader(FailingReader).expect_err("reader fails");
        assert!(matches!(err, RosterImportError::Csv(_) | RosterImportError::Io(_)));
    }
}
