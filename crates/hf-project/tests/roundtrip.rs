use chrono::NaiveDate;
use hf_project::schema::*;
use hf_project::{SettingsModel, load_json, load_yaml, save_json, save_yaml, validate_project};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn chain_project() -> Project {
    let mut settings = SettingsModel::new();
    settings.set_solver("RK4");
    settings.set_timer(date(2020, 1, 1), date(2020, 1, 3), 1, "Day");
    settings.add_brick("upper", "Storage");
    settings
        .add_parameter_to_current_brick("response_factor", 0.2, "Constant")
        .unwrap();
    settings.add_forcing_to_current_brick("Precipitation").unwrap();
    settings.add_output_to_current_brick("lower", "Direct").unwrap();
    settings.add_brick("lower", "Storage");
    settings
        .add_parameter_to_current_brick("response_factor", 0.1, "Constant")
        .unwrap();
    settings.add_output_to_current_brick("outlet", "Direct").unwrap();
    settings.add_logging_to_current_brick("content").unwrap();
    settings.add_logging_to_item("outlet");

    settings
        .into_project(
            "chain",
            vec![HydroUnitDef { id: 1, area: 2.0 }],
            vec![ForcingSeriesDef {
                variable: "Precipitation".to_string(),
                start: date(2020, 1, 1),
                values: SeriesValues::Uniform(vec![1.0, 2.0, 3.0]),
            }],
        )
        .unwrap()
}

#[test]
fn roundtrip_yaml_chain() {
    let project = chain_project();
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("hf_project_roundtrip_chain.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_chain() {
    let project = chain_project();

    let path = std::env::temp_dir().join("hf_project_roundtrip_chain.json");
    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn distributed_values_parse_from_nested_lists() {
    let yaml = r#"
variable: Precipitation
start: 2020-01-01
values:
  - [1.0, 2.0]
  - [3.0, 4.0]
"#;
    let series: ForcingSeriesDef = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        series.values,
        SeriesValues::Distributed(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
    );
    assert_eq!(series.values.len(), 2);
}

#[test]
fn invalid_project_is_not_saved() {
    let mut project = chain_project();
    project.structures[0].bricks[1].outputs[0].target = "missing".to_string();
    let path = std::env::temp_dir().join("hf_project_invalid.yaml");
    assert!(save_yaml(&path, &project).is_err());
}
