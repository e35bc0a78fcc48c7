//! End-to-end tests: CSV on disk through the dashboard views.

use std::io::Write;
use tempfile::NamedTempFile;

use berlin_ems::loader::{load_missions, load_regional};
use berlin_ems::normalize::normalize_missions;
use berlin_ems::util::share_pct;
use berlin_ems::{
    aggregate, rank, with_valid_response_time, Config, Dashboard, Dataset, Error, Field, GroupSpec, Measure,
    ParsePolicy, RankSpec, Selection, Value, View, ViewParams,
};

fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

const MISSIONS: &str = "\
Unnamed: 0,mission_created_date,mission_type,mission_location_district,response_time
0,2021-04-03 10:00:00,Brand,Mitte,120
1,2021-04-03 11:00:00,Brand,Mitte,180
2,2021-04-05 12:00:00,Rettungsdienst,Mitte,90
3,2021-04-05 12:30:00,Rettungsdienst,Mitte,-5
4,2022-07-01 03:00:00,Krankentransport,Pankow,300
5,2022-07-02 04:00:00,,,
";

const REGIONAL: &str = "\
district_area_name,source_year,mission_count_all,mission_count_ems,mission_count_fire
A,2022,100,60,30
B,2022,50,20,20
A,2021,80,50,20
";

fn dashboard(missions: &NamedTempFile, regional: &NamedTempFile) -> Dashboard {
    Dashboard::new(Config {
        missions_path: missions.path().to_path_buf(),
        regional_path: regional.path().to_path_buf(),
        ..Config::default()
    })
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn mission_type_scenario() {
    let file = create_test_file(MISSIONS);
    let (records, report) = load_missions(file.path(), ParsePolicy::NullField).unwrap();
    assert_eq!(report.dropped_columns, vec!["Unnamed: 0".to_string()]);
    let rows = normalize_missions(records);

    let mitte_2021 = Selection::new()
        .with(Field::District, "Mitte")
        .with(Field::Year, 2021)
        .apply(&rows)
        .unwrap();
    let valid = with_valid_response_time(&mitte_2021);
    let table = aggregate(
        &valid,
        &GroupSpec::by(&[Field::MissionType])
            .count("count")
            .mean(Measure::ResponseTime, "mean"),
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    let fire = table.find(&[Value::from("Fire Incident")]).unwrap();
    assert_eq!(fire.metrics, vec![2.0, 150.0]);
    let ems = table.find(&[Value::from("Emergency Medical Service")]).unwrap();
    assert_eq!(ems.metrics, vec![1.0, 90.0]);
}

#[test]
fn regional_top_one_scenario() {
    let file = create_test_file(REGIONAL);
    let (rows, _) = load_regional(file.path(), ParsePolicy::NullField).unwrap();
    let y2022 = Selection::new().with(Field::Year, 2022).apply(&rows).unwrap();
    let sums = aggregate(
        &y2022,
        &GroupSpec::by(&[Field::District])
            .sum(Measure::MissionCountAll, "all")
            .sum(Measure::MissionCountEms, "ems"),
    )
    .unwrap();
    let top = rank(&sums, &RankSpec::descending("all").top(1)).unwrap();

    assert_eq!(top.len(), 1);
    assert_eq!(top.rows()[0].keys, vec![Value::from("A")]);
    assert_eq!(top.rows()[0].metrics[0], 100.0);
    let share = share_pct(top.total("ems").unwrap(), top.total("all").unwrap());
    assert_eq!(share, Some(60.0));
}

#[test]
fn negative_response_time_never_reaches_a_mean() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let (records, _) = load_missions(missions.path(), ParsePolicy::NullField).unwrap();
    let rows = normalize_missions(records);
    assert!(rows.iter().any(|r| r.record.response_time == Some(-5.0)));

    let mut dash = dashboard(&missions, &regional);
    let out = dash.run(View::MissionTypes, &ViewParams::default()).unwrap();
    let ems = out
        .table
        .find(&[Value::from("Emergency Medical Service")])
        .unwrap();
    // avg_response_time, total_incidents
    assert_eq!(ems.metrics, vec![90.0, 1.0]);
}

// =============================================================================
// Dashboard session
// =============================================================================

#[test]
fn every_view_runs_on_the_sample_exports() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let mut dash = dashboard(&missions, &regional);
    for view in View::ALL {
        let out = dash
            .run(view, &ViewParams::default())
            .unwrap_or_else(|e| panic!("{view} failed: {e}"));
        assert_eq!(out.view, view);
        assert!(!out.is_empty(), "{view} produced no rows");
    }
}

#[test]
fn overview_counts_every_row() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let mut dash = dashboard(&missions, &regional);
    let out = dash.run(View::Overview, &ViewParams::default()).unwrap();
    assert_eq!(out.cards[0].value, "6");
    assert_eq!(out.cards[1].value, "2");
    assert_eq!(out.cards[2].value, "2021 – 2022");
    // (120 + 180 + 90 + 300) / 4
    assert_eq!(out.cards[3].value, "172.5");
}

#[test]
fn regional_time_goals_reports_shares() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let mut dash = dashboard(&missions, &regional);
    let params = ViewParams {
        year: Some(2022),
        top_n: 1,
        ..ViewParams::default()
    };
    let out = dash.run(View::RegionalTimeGoals, &params).unwrap();
    assert_eq!(out.table.len(), 1);
    assert_eq!(out.cards[1].value, "60.0%");
    assert_eq!(out.cards[2].value, "30.0%");
}

#[test]
fn domain_lists_sorted_values() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let mut dash = dashboard(&missions, &regional);
    assert_eq!(
        dash.domain(Dataset::Missions, Field::District).unwrap(),
        vec![Value::from("Mitte"), Value::from("Pankow")]
    );
    assert_eq!(
        dash.domain(Dataset::Regional, Field::Year).unwrap(),
        vec![Value::from(2021), Value::from(2022)]
    );
}

#[test]
fn session_keeps_the_load_report() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(REGIONAL);
    let mut dash = dashboard(&missions, &regional);
    assert!(dash.load_report(Dataset::Missions).is_none());

    dash.run(View::Overview, &ViewParams::default()).unwrap();
    let report = dash.load_report(Dataset::Missions).unwrap();
    assert_eq!(report.total_rows, 6);
    assert_eq!(report.loaded_rows, 6);
    assert_eq!(report.dropped_columns, vec!["Unnamed: 0".to_string()]);
    assert!(dash.load_report(Dataset::Regional).is_none());

    // A cache hit keeps the report from the read that filled the cache.
    dash.run(View::MissionMix, &ViewParams::default()).unwrap();
    assert_eq!(dash.load_report(Dataset::Missions).unwrap().total_rows, 6);
}

#[test]
fn missing_file_fails_only_that_view() {
    let regional = create_test_file(REGIONAL);
    let mut dash = Dashboard::new(Config {
        missions_path: "/no/such/missions.csv".into(),
        regional_path: regional.path().to_path_buf(),
        ..Config::default()
    });
    assert!(matches!(
        dash.run(View::Overview, &ViewParams::default()),
        Err(Error::NotFound { .. })
    ));
    assert!(dash.run(View::DemandLandscape, &ViewParams::default()).is_ok());
}

#[test]
fn strict_policy_rejects_bad_cells() {
    let missions = create_test_file(
        "mission_created_date,mission_type,mission_location_district,response_time\n\
         2021-01-01 00:00:00,Brand,Mitte,quick\n",
    );
    let regional = create_test_file(REGIONAL);
    let mut dash = Dashboard::new(Config {
        missions_path: missions.path().to_path_buf(),
        regional_path: regional.path().to_path_buf(),
        parse_policy: ParsePolicy::Reject,
        ..Config::default()
    });
    assert!(matches!(
        dash.run(View::Overview, &ViewParams::default()),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn empty_selection_is_an_empty_state() {
    let missions = create_test_file(MISSIONS);
    let regional = create_test_file(
        "district_area_name,source_year,mission_count_all,mission_count_ems,mission_count_fire\n",
    );
    let mut dash = dashboard(&missions, &regional);
    let out = dash.run(View::RegionalTimeGoals, &ViewParams::default()).unwrap();
    assert!(out.is_empty());
    assert_eq!(out.cards[1].value, "undefined");
}
