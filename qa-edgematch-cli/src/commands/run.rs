use crate::cli::{CheckKind, OutputFormat};
use crate::error::{CliError, CliResult, EXIT_ISSUES, EXIT_SUCCESS};
use crate::input::{self, CheckDefinition, LoadedDataset};
use crate::output;
use colored::Colorize;
use qa_edgematch::{
    BorderingLines, BorderingPoints, CollectingReporter, CrossingAreas, CrossingLines,
    EdgeMatchCheck, EdgeMatchConfig, EdgeMatchLayout, EdgeMatchStrategy, Issue, TileDriver,
};
use std::path::Path;

/// Tile size used when neither the command line nor the check sets one.
const DEFAULT_TILE_SIZE: f64 = 1000.0;

pub fn run(
    check_path: &Path,
    data_path: &Path,
    tile_size: Option<f64>,
    extent: Option<&str>,
    format: OutputFormat,
    fail_on_issues: bool,
    quiet: bool,
) -> CliResult<i32> {
    let definition = CheckDefinition::load(check_path)?;
    let dataset = input::load_dataset(data_path)?;
    let (layout, config) = definition.resolve(&dataset)?;

    let run_extent = match extent {
        Some(text) => input::parse_extent(text)?,
        None => dataset
            .source
            .extent()
            .ok_or_else(|| CliError::Input("dataset has no features".into()))?,
    };
    let tile_size = tile_size
        .or(definition.tile_size)
        .unwrap_or(DEFAULT_TILE_SIZE);
    let driver = TileDriver::new(run_extent, tile_size)?;

    let issues = match definition.check {
        CheckKind::BorderingLines => sweep(BorderingLines, &dataset, layout, config, &driver)?,
        CheckKind::CrossingAreas => sweep(CrossingAreas, &dataset, layout, config, &driver)?,
        CheckKind::BorderingPoints => {
            sweep(BorderingPoints, &dataset, layout, config, &driver)?
        }
        CheckKind::CrossingLines => sweep(CrossingLines, &dataset, layout, config, &driver)?,
    };

    match format {
        OutputFormat::Json => println!("{}", output::format_json(&issues, &dataset.names)?),
        OutputFormat::Text => {
            for line in output::format_text(&issues, &dataset.names) {
                println!("{line}");
            }
            if !quiet {
                let summary = format!("{} issue(s)", issues.len());
                if issues.is_empty() {
                    eprintln!("{}", summary.green().bold());
                } else {
                    eprintln!("{}", summary.yellow().bold());
                }
            }
        }
    }

    if fail_on_issues && !issues.is_empty() {
        Ok(EXIT_ISSUES)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn sweep<S: EdgeMatchStrategy>(
    strategy: S,
    dataset: &LoadedDataset,
    layout: EdgeMatchLayout,
    config: EdgeMatchConfig,
    driver: &TileDriver,
) -> CliResult<Vec<Issue>> {
    let run_extent = driver.run_extent();
    let mut check = EdgeMatchCheck::new(strategy, layout, config, &dataset.source)?;
    let mut reporter = CollectingReporter::new();
    let count = driver.run(&mut check, &mut reporter)?;
    tracing::info!(
        issues = count,
        xmin = run_extent.xmin,
        ymin = run_extent.ymin,
        xmax = run_extent.xmax,
        ymax = run_extent.ymax,
        "check finished"
    );
    Ok(reporter.issues)
}
