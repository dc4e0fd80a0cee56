use maverick_mindset::onboarding::leaderboard::{
    export_leaderboard_csv, filter_trainees, leaderboard, sort_rows, SortDirection, TableSort,
    TraineeColumn, TraineeFilter,
};
use maverick_mindset::onboarding::roster::SAMPLE_ROSTER;
use maverick_mindset::onboarding::{RosterImporter, TraineeStatus};

#[test]
fn sample_roster_imports_unique_trainees() {

    let trainees =
        RosterImporter::from_reader(SAMPLE_ROSTER.as_bytes()).expect("sample roster imports");

    assert_eq!(trainees.len(), 6);
    let marcus = trainees
        .iter()
        .find(|trainee| trainee.name == "Marcus Lee")
        .expect("marcus imported");
    assert_eq!(marcus.email, "marcus.lee@example.com");
    assert!(marcus.last_login.is_some());

    let daniel = trainees
        .iter()
        .find(|trainee| trainee.id.0 == "tr-004")
        .expect("daniel imported");
    assert_eq!(daniel.progress(), 29);
    assert_eq!(daniel.status(), TraineeStatus::AtRisk);

    let hana = trainees
        .iter()
        .find(|trainee| trainee.name == "Hana Suzuki")
        .expect("hana imported");
    assert!(hana.id.0.starts_with("trainee-"));
    assert_eq!(hana.status(), TraineeStatus::NotStarted);

    let priya_rows = trainees
        .iter()
        .filter(|trainee| trainee.email == "priya.raman@example.com")
        .count();
    assert_eq!(priya_rows, 1);
}

#[test]
fn leaderboard_export_ranks_sample_roster() {
    let trainees =
        RosterImporter::from_reader(SAMPLE_ROSTER.as_bytes()).expect("sample roster imports");

    let entries = leaderboard(&trainees, None);
    let mut buffer = Vec::new();
    export_leaderboard_csv(&entries, &mut buffer).expect("export succeeds");
    let text = String::from_utf8(buffer).expect("utf8 output");
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(lines.len(), 7);
    assert_eq!(lines[1], "1,Gold,Sofia Alvarez,Design,91,On Track");
    assert_eq!(lines[2], "2,Silver,Priya Raman,Engineering,82,On Track");
    assert_eq!(lines[3], "3,Bronze,Marcus Lee,Engineering,64,Need Attention");
    assert_eq!(lines[4], "4,4th,Leo Martin,Design,47,Need Attention");
    assert!(lines[6].starts_with("6,6th,Hana Suzuki"));
}

#[test]
fn engineering_table_filters_and_sorts_by_last_login() {
    let trainees =
        RosterImporter::from_reader(SAMPLE_ROSTER.as_bytes()).expect("sample roster imports");
    let filter = TraineeFilter {
        department: Some("Engineering".to_string()),
        ..TraineeFilter::default()
    };

    let mut rows: Vec<_> = filter_trainees(&trainees, &filter)
        .into_iter()
        .cloned()
        .collect();
    sort_rows(
        &mut rows,
        &TableSort::new(TraineeColumn::LastLogin, SortDirection::Desc),
        |trainee, column| column.value(trainee),
    );

    let names: Vec<&str> = rows.iter().map(|trainee| trainee.name.as_str()).collect();
    assert_eq!(names, vec!["Priya Raman", "Marcus Lee", "Hana Suzuki"]);
}
