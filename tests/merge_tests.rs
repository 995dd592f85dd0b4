use std::fs;

use labgrade::{
    extract::PartnersMap,
    merge::ScoreMerger,
    roster::Report,
};
use uuid::Uuid;

const REPORT: &str = "Last name,First name,School email,Lab 1 - Lab (10),Lab 2 - Lab (30)
Lovelace,Ada,al12@calvin.edu,8,20
Conway,Cy,cd56@calvin.edu,5,25
Hopper,Grace,gh34@calvin.edu,,30
";

fn partners() -> PartnersMap {
    serde_json::from_str(
        r#"{
            "lab2": [["al12"], ["cd56", "gh34", "zz99"]],
            "lab1": [["al12"], ["cd56"]]
        }"#,
    )
    .expect("parse partners")
}

fn merger() -> ScoreMerger {
    ScoreMerger::new(Report::parse(REPORT).expect("parse report"), partners())
}

#[test]
fn weights_come_from_column_headers() {
    assert_eq!(merger().weights().expect("weights"), vec![0.25, 0.75]);
    assert_eq!(merger().lab_columns(), vec![3, 4]);
}

#[test]
fn groups_share_their_best_score() {
    let merged = merger().merge().expect("merge");

    assert_eq!(
        merged.header(),
        [
            "calvin_id",
            "Last name",
            "First name",
            "School email",
            "Lab 1 - Lab (10)",
            "Lab 2 - Lab (30)",
            "lab_scores"
        ]
    );
    assert_eq!(
        merged.row("al12").map(|row| row.join(",")),
        Some("al12,Lovelace,Ada,al12@calvin.edu,8,20,17".to_string())
    );
    assert_eq!(
        merged.row("cd56").map(|row| row.join(",")),
        Some("cd56,Conway,Cy,cd56@calvin.edu,5,30,23.75".to_string())
    );
    assert_eq!(
        merged.row("gh34").map(|row| row.join(",")),
        Some("gh34,Hopper,Grace,gh34@calvin.edu,0,30,22.5".to_string())
    );
    assert_eq!(merged.total("cd56"), Some(23.75));
    assert_eq!(merged.row("zz99"), None);
}

#[test]
fn merged_scores_round_trip_through_disk() {
    let root = std::env::temp_dir().join(format!("labgrade-merge-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp dir");
    fs::write(root.join("report.csv"), REPORT).expect("write report");
    fs::write(
        root.join("partners.json"),
        serde_json::to_string(&partners()).expect("serialize partners"),
    )
    .expect("write partners");

    let merged = ScoreMerger::from_paths(&root.join("report.csv"), &root.join("partners.json"))
        .expect("load merger")
        .merge()
        .expect("merge");
    merged
        .write(&root.join("merged_scores.csv"))
        .expect("write merged scores");

    let written = fs::read_to_string(root.join("merged_scores.csv")).expect("read merged scores");
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("calvin_id,Last name,First name,School email,Lab 1 - Lab (10),Lab 2 - Lab (30),lab_scores")
    );
    assert_eq!(lines.next(), Some("al12,Lovelace,Ada,al12@calvin.edu,8,20,17"));
    assert_eq!(lines.count(), 2);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn lab_columns_need_point_values() {
    let report = Report::parse("School email,Lab 1 - Lab\nal12@calvin.edu,3\n").expect("parse report");
    let err = ScoreMerger::new(report, PartnersMap::new())
        .merge()
        .expect_err("missing weight");
    assert!(err.to_string().contains("has no point value"));
}

#[test]
fn assignments_without_a_column_are_errors() {
    let mut partners = partners();
    partners.insert("lab3".to_string(), vec![vec!["al12".to_string()]]);

    let result = ScoreMerger::new(Report::parse(REPORT).expect("parse report"), partners).merge();
    assert!(result.is_err());
}

#[test]
fn scores_must_be_numbers() {
    let report = Report::parse("School email,Lab 1 - Lab (5)\nal12@calvin.edu,excused\n")
        .expect("parse report");
    assert!(ScoreMerger::new(report, PartnersMap::new()).merge().is_err());
}
