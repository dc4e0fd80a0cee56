mod export;
mod ranking;
pub mod table;

pub use export::{export_leaderboard_csv, LeaderboardExportError};
pub use ranking::{leaderboard, rank_label, LeaderboardEntry};
pub use table::{
    filter_trainees, sort_rows, SortDirection, SortValue, TableSort, TraineeColumn, TraineeFilter,
};
