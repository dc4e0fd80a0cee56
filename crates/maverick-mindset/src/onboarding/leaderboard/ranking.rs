use serde::Serialize;

use super::super::domain::{Trainee, TraineeId, TraineeStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub rank_label: String,
    pub trainee_id: TraineeId,
    pub name: String,
    pub department: String,
    pub progress: u8,
    pub status: TraineeStatus,
}

/// Medal names for the podium, `{rank}th` for everyone else.
///
/// Ranks past the podium always take the `th` suffix, so 21 renders as `21th`.
pub fn rank_label(rank: usize) -> String {
    match rank {
        1 => "Gold".to_string(),
        2 => "Silver".to_string(),
        3 => "Bronze".to_string(),
        other => format!("{other}th"),
    }
}

/// Trainees ordered by progress, highest first; equal progress keeps input order.
pub fn leaderboard(trainees: &[Trainee], department: Option<&str>) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Trainee> = trainees
        .iter()
        .filter(|trainee| department.map_or(true, |department| trainee.department == department))
        .collect();

    ranked.sort_by(|a, b| b.progress().cmp(&a.progress()));

    ranked
        .into_iter()
        .enumerate()
        .map(|(index, trainee)| {
            let rank = index + 1;
            LeaderboardEntry {
                rank,
                rank_label: rank_label(rank),
                trainee_id: trainee.id.clone(),
                name: trainee.name.clone(),
                department: trainee.department.clone(),
                progress: trainee.progress(),
                status: trainee.status(),
            }
        })
        .collect()
}
