use hall_of_fame_enhancers::{
    about,
    config::DashboardConfig,
    filters::{options_for, FilterSelections},
    init_tracing,
    loader::{load, Dataset},
    measurements::{measurement_summary, MeasurementSummary},
    render_chart::write_accessibility_svg,
    session::DashboardSession,
    views::accessibility_chart,
};
use serde::Serialize;
use std::{env, fs, path::Path, sync::Arc};

#[derive(Serialize)]
struct DatasetStats {
    data_dir: String,
    metadata_source: Option<String>,
    measurements: MeasurementSummary,
    metadata_rows: usize,
    curated_enhancers: usize,
    cell_types: Vec<String>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  hof_enhancers_cli --version\n  \
  hof_enhancers_cli [--config PATH] [--data-dir DIR] stats\n  \
  hof_enhancers_cli [--config PATH] [--data-dir DIR] validate\n  \
  hof_enhancers_cli [--config PATH] [--data-dir DIR] options '<selections-json>'\n  \
  hof_enhancers_cli [--config PATH] [--data-dir DIR] view '<selections-json>'\n  \
  hof_enhancers_cli [--config PATH] [--data-dir DIR] chart-svg ENHANCER [CELL_TYPE] OUTPUT.svg\n\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn load_json_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_selections(args: &[String], command: &str) -> Result<FilterSelections, String> {
    let Some(value) = args.get(1) else {
        return Ok(FilterSelections::default());
    };
    let json = load_json_arg(value)?;
    serde_json::from_str(&json).map_err(|e| format!("Invalid selections JSON for {command}: {e}"))
}

fn summarize(config: &DashboardConfig, dataset: &Dataset) -> DatasetStats {
    DatasetStats {
        data_dir: config.data_dir.display().to_string(),
        metadata_source: dataset
            .metadata_source
            .as_ref()
            .map(|p| p.display().to_string()),
        measurements: measurement_summary(&dataset.measurements),
        metadata_rows: dataset.metadata.len(),
        curated_enhancers: dataset.curated.len(),
        cell_types: dataset.cell_types.clone(),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    init_tracing();

    let (config, args) = DashboardConfig::from_args(&args).map_err(|e| e.to_string())?;
    let Some(command) = args.first() else {
        usage();
        return Err("Missing command".to_string());
    };
    let dataset = load(&config).map_err(|e| format!("Error loading data: {e}"))?;

    match command.as_str() {
        "stats" => print_json(&summarize(&config, &dataset)),
        "validate" => print_json(&dataset.report),
        "options" => {
            let selections = parse_selections(&args, command)?;
            let options = options_for(
                &selections,
                &dataset.base_metadata(),
                &dataset.cell_types,
            );
            print_json(&options)
        }
        "view" => {
            let selections = parse_selections(&args, command)?;
            let mut session = DashboardSession::new(Arc::new(dataset));
            print_json(&session.update(selections))
        }
        "chart-svg" => {
            let (enhancer_id, cell_type, output) = match args.len() {
                3 => (&args[1], None, &args[2]),
                4 => (&args[1], Some(args[2].as_str()), &args[3]),
                _ => {
                    usage();
                    return Err(
                        "chart-svg requires: ENHANCER [CELL_TYPE] OUTPUT.svg".to_string()
                    );
                }
            };
            if dataset.measurements_for(enhancer_id).next().is_none() {
                return Err(format!("Enhancer '{enhancer_id}' has no measurements"));
            }
            let chart = accessibility_chart(&dataset, enhancer_id, cell_type);
            write_accessibility_svg(&chart, Path::new(output))
                .map_err(|e| format!("Could not write SVG output '{output}': {e}"))?;
            println!("Wrote accessibility chart for '{enhancer_id}' to '{output}'");
            Ok(())
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
