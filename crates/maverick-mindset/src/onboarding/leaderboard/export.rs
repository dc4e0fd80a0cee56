use std::io::Write;

use super::ranking::LeaderboardEntry;

const HEADER: [&str; 6] = ["Rank", "Medal", "Name", "Department", "Progress", "Status"];

#[derive(Debug)]
pub enum LeaderboardExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for LeaderboardExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaderboardExportError::Io(err) => write!(f, "failed to write leaderboard: {}", err),
            LeaderboardExportError::Csv(err) => write!(f, "failed to encode leaderboard: {}", err),
        }
    }
}

impl std::error::Error for LeaderboardExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeaderboardExportError::Io(err) => Some(err),
            LeaderboardExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LeaderboardExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for LeaderboardExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Writes ranked entries as CSV with a header row.
pub fn export_leaderboard_csv<W: Write>(
    entries: &[LeaderboardEntry],
    writer: W,
) -> Result<(), LeaderboardExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for entry in entries {
        let rank = entry.rank.to_string();
        let progress = entry.progress.to_string();
        csv.write_record([
            rank.as_str(),
            entry.rank_label.as_str(),
            entry.name.as_str(),
            entry.department.as_str(),
            progress.as_str(),
            entry.status.label(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::domain::Trainee;
    use crate::onboarding::leaderboard::leaderboard;

    #[test]
    fn export_writes_header_and_ranked_rows() {
        let trainees = vec![
            Trainee::new("t1", "Ana", "ana@example.com", "Engineering", "2025-A").with_progress(40),
            Trainee::new("t2", "Bo, Jr.", "bo@example.com", "Engineering", "2025-A")
                .with_progress(75),
        ];
        let entries = leaderboard(&trainees, None);

        let mut buffer = Vec::new();
        export_leaderboard_csv(&entries, &mut buffer).expect("export succeeds");
        let text = String::from_utf8(buffer).expect("utf8 output");
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Rank,Medal,Name,Department,Progress,Status");
        assert_eq!(lines[1], "1,Gold,\"Bo, Jr.\",Engineering,75,On Track");
        assert_eq!(lines[2], "2,Silver,Ana,Engineering,40,Need Attention");
    }
}
