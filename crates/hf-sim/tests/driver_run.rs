//! Integration tests: the model driver and its time loop.

use chrono::{NaiveDate, TimeDelta};
use hf_components::VariableKind;
use hf_project::{HydroUnitDef, Project, SettingsModel};
use hf_sim::{
    BuildError, ModelHydro, ModelState, SimError, StepError, TimeSeries, UniformTimeSeries,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn units() -> Vec<HydroUnitDef> {
    vec![
        HydroUnitDef { id: 10, area: 30.0 },
        HydroUnitDef { id: 20, area: 70.0 },
    ]
}

/// Ten daily steps of a fed linear storage, logging its content and the outlet.
fn project() -> Project {
    let mut settings = SettingsModel::new();
    settings.set_solver("Runge-Kutta");
    settings.set_timer(date(2020, 1, 1), date(2020, 1, 10), 1, "Day");
    settings.add_brick("storage", "Storage");
    settings
        .add_parameter_to_current_brick("response_factor", 0.3, "Constant")
        .unwrap();
    settings.add_forcing_to_current_brick("Precipitation").unwrap();
    settings.add_output_to_current_brick("outlet", "Direct").unwrap();
    settings.add_logging_to_current_brick("content").unwrap();
    settings.add_logging_to_current_brick("output").unwrap();
    settings.add_logging_to_item("outlet");
    settings.into_project("driver", units(), vec![]).unwrap()
}

fn precipitation(days: usize) -> Box<dyn TimeSeries> {
    let values = (0..days).map(|d| (d % 3) as f64 * 5.0).collect();
    Box::new(UniformTimeSeries::uniform(
        VariableKind::Precipitation,
        date(2020, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        TimeDelta::days(1),
        values,
    ))
}

fn ready_model(days: usize) -> ModelHydro {
    let project = project();
    let mut model = ModelHydro::new();
    model.initialize(&project, &project.hydro_units).unwrap();
    assert_eq!(model.state(), ModelState::Ready);
    assert!(model.add_time_series(precipitation(days)));
    assert!(model.attach_time_series_to_hydro_units());
    model
}

#[test]
fn full_run_records_every_step() {
    let mut model = ready_model(10);
    model.run().unwrap();
    assert_eq!(model.state(), ModelState::Completed);

    let logger = model.logger();
    assert_eq!(logger.recorded_steps(), 10);
    assert_eq!(logger.dates().len(), 10);
    assert_eq!(logger.dates()[0], date(2020, 1, 1).and_hms_opt(0, 0, 0).unwrap());

    let content = logger.unit_values("storage:content").unwrap();
    assert_eq!(content.nrows(), 10);
    assert_eq!(content.ncols(), 2);
    // same forcing on both units
    assert_eq!(content.column(0), content.column(1));

    let outflow = logger.unit_values("storage:output").unwrap();
    let outlet = logger.aggregated_values("outlet").unwrap();
    for step in 0..10 {
        assert!((outlet[step] - outflow[(step, 0)] - outflow[(step, 1)]).abs() < 1e-12);
    }
    // no rain on day one: nothing stored, nothing released
    assert_eq!(content[(0, 0)], 0.0);
    assert!(content[(1, 0)] > 0.0);
}

#[test]
fn water_balance_over_the_run() {
    let mut model = ready_model(10);
    model.run().unwrap();
    let logger = model.logger();

    let rain: f64 = (0..10).map(|d| (d % 3) as f64 * 5.0).sum();
    let released: f64 = logger.aggregated_values("outlet").unwrap().iter().sum();
    let stored: f64 = logger
        .unit_values("storage:content")
        .unwrap()
        .row(9)
        .iter()
        .sum();
    assert!((2.0 * rain - released - stored).abs() < 1e-9);
}

#[test]
fn short_forcing_fails_at_the_exhausted_step() {
    let mut complete = ready_model(10);
    complete.run().unwrap();

    let mut model = ready_model(6);
    let err = model.run().unwrap_err();
    assert_eq!(
        err,
        SimError::Step {
            step: 6,
            source: StepError::ForcingExhausted {
                variable: "precipitation".to_string()
            }
        }
    );
    assert_eq!(model.state(), ModelState::Failed);

    let partial = model.logger();
    assert_eq!(partial.recorded_steps(), 6);
    let expected = complete.logger().aggregated_values("outlet").unwrap();
    assert_eq!(
        partial.aggregated_values("outlet").unwrap(),
        expected[..6].to_vec()
    );
}

#[test]
fn series_starting_after_the_timer_fails_before_the_first_step() {
    let project = project();
    let mut model = ModelHydro::new();
    model.initialize(&project, &project.hydro_units).unwrap();
    model.add_time_series(Box::new(UniformTimeSeries::uniform(
        VariableKind::Precipitation,
        date(2020, 1, 5).and_hms_opt(0, 0, 0).unwrap(),
        TimeDelta::days(1),
        vec![1.0; 20],
    )));
    assert!(model.attach_time_series_to_hydro_units());
    let err = model.run().unwrap_err();
    assert!(matches!(err, SimError::Step { step: 0, .. }));
    assert_eq!(model.logger().recorded_steps(), 0);
}

#[test]
fn one_series_per_variable() {
    let mut model = ready_model(10);
    assert!(!model.add_time_series(precipitation(10)));
}

#[test]
fn run_requires_initialization() {
    let mut model = ModelHydro::new();
    assert!(matches!(model.run(), Err(SimError::InvalidState { .. })));
    assert!(!model.attach_time_series_to_hydro_units());

    let mut done = ready_model(10);
    done.run().unwrap();
    assert!(matches!(done.run(), Err(SimError::InvalidState { .. })));
}

#[test]
fn missing_series_is_reported() {
    let project = project();
    let mut model = ModelHydro::new();
    model.initialize(&project, &project.hydro_units).unwrap();
    assert!(!model.attach_time_series_to_hydro_units());
    assert!(matches!(
        model.run(),
        Err(SimError::Step {
            step: 0,
            source: StepError::InvalidConfiguration { .. }
        })
    ));
}

#[test]
fn unresolvable_log_item_should_not_happen() {
    let mut project = project();
    project.structures[0].bricks[0].log.push("snow".to_string());
    let mut model = ModelHydro::new();
    let err = model.initialize(&project, &project.hydro_units).unwrap_err();
    assert!(matches!(
        err,
        SimError::Build(BuildError::ShouldNotHappen { .. })
    ));
    assert_eq!(model.state(), ModelState::Uninitialized);

    let mut project = self::project();
    project.structures[0].log_items.push("evaporation".to_string());
    let err = model.initialize(&project, &project.hydro_units).unwrap_err();
    assert!(matches!(
        err,
        SimError::Build(BuildError::ShouldNotHappen { .. })
    ));
}

#[test]
fn unknown_solver_is_an_invalid_argument() {
    let mut project = project();
    project.solver.name = "Implicit".to_string();
    let mut model = ModelHydro::new();
    let err = model.initialize(&project, &project.hydro_units).unwrap_err();
    assert!(matches!(
        err,
        SimError::Build(BuildError::InvalidArgument { .. })
    ));
}
