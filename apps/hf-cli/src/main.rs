use clap::{Parser, Subcommand, ValueEnum};
use hf_project::{Project, ProjectError};
use hf_sim::{
    BuildError, LogSummary, ModelHydro, SimError, SolverKind, Timer, UniformTimeSeries,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "hf-cli")]
#[command(about = "HydroFlow CLI - conceptual hydrological model runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List the available solvers
    Solvers,
    /// Run a project and print the logged series
    Run {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("Forcing '{variable}': {source}")]
    Forcing {
        variable: String,
        source: BuildError,
    },

    #[error("Forcing setup rejected: {what}")]
    Setup { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Solvers => {
            cmd_solvers();
            Ok(())
        }
        Commands::Run {
            project_path,
            format,
            output,
        } => cmd_run(&project_path, format, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = hf_project::load(project_path)?;
    println!("✓ Project is valid");
    for structure in &project.structures {
        println!(
            "  structure {} ({} bricks, {} splitters)",
            structure.id,
            structure.bricks.len(),
            structure.splitters.len()
        );
    }
    println!(
        "  {} hydro units, {} forcing series",
        project.hydro_units.len(),
        project.forcing.len()
    );
    Ok(())
}

fn cmd_solvers() {
    println!("Available solvers:");
    for kind in SolverKind::ALL {
        println!(
            "  {} (order {}, {} stages) - aliases: {}",
            kind,
            kind.order(),
            kind.stages(),
            kind.aliases().join(", ")
        );
    }
}

fn cmd_run(project_path: &Path, format: OutputFormat, output: Option<&Path>) -> CliResult<()> {
    let project = hf_project::load(project_path)?;
    tracing::info!(project = %project.name, "running");
    let started = Instant::now();

    let mut model = ModelHydro::new();
    model.initialize(&project, &project.hydro_units)?;
    attach_forcing(&mut model, &project)?;
    model.run()?;

    tracing::info!(
        steps = model.logger().recorded_steps(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "done"
    );

    let summary = model.logger().summary();
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
        OutputFormat::Csv => render_csv(&summary),
    };

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        eprintln!(
            "✓ Exported {} time steps to {}",
            summary.dates.len(),
            path.display()
        );
    } else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        if matches!(format, OutputFormat::Json) {
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Feed every forcing series of the project to the model.
fn attach_forcing(model: &mut ModelHydro, project: &Project) -> CliResult<()> {
    let step = Timer::new(&project.timer)
        .map_err(SimError::from)?
        .time_step();
    for def in &project.forcing {
        let series =
            UniformTimeSeries::from_def(def, step).map_err(|source| CliError::Forcing {
                variable: def.variable.clone(),
                source,
            })?;
        if !model.add_time_series(Box::new(series)) {
            return Err(CliError::Setup {
                what: format!("duplicate series for '{}'", def.variable),
            });
        }
    }
    if !model.attach_time_series_to_hydro_units() {
        return Err(CliError::Setup {
            what: "a forcing has no matching series".to_string(),
        });
    }
    Ok(())
}

/// One row per time step: date, basin-level labels, then one column per
/// unit label and unit.
fn render_csv(summary: &LogSummary) -> String {
    let mut csv = String::from("date");
    for label in summary.aggregated.keys() {
        csv.push_str(&format!(",{label}"));
    }
    for (label, units) in &summary.units {
        for unit in 0..units.len() {
            csv.push_str(&format!(",{label}[{unit}]"));
        }
    }
    csv.push('\n');

    for (step, date) in summary.dates.iter().enumerate() {
        csv.push_str(&date.format("%Y-%m-%d %H:%M").to_string());
        for values in summary.aggregated.values() {
            csv.push_str(&format!(",{}", values[step]));
        }
        for units in summary.units.values() {
            for series in units {
                csv.push_str(&format!(",{}", series[step]));
            }
        }
        csv.push('\n');
    }
    csv
}
