use anyhow::{Context, Result};
use clap::Parser;
use gacha_audit::audit::run_audit;
use gacha_audit::cli::{Cli, OutputFormat};
use gacha_audit::config::AuditConfig;
use gacha_audit::csv_output::{CsvAuditOutput, CsvSeriesOutput};
use gacha_audit::distribution::{compare, ComparisonOptions, ComparisonSeries, View};
use gacha_audit::ingest;
use gacha_audit::json_output::JsonOutput;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Config file (if any) with command-line overrides applied
fn load_config(args: &Cli) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::default(),
    };

    if args.derive_dispersion {
        config.derive_missing_dispersion = true;
    }
    if let Some(min_prob) = args.min_prob {
        config.distribution.min_prob_percent = min_prob;
    }
    if let Some(max_value) = args.max_value {
        config.distribution.max_value = max_value;
    }
    if args.gaussian {
        config.distribution.gaussian = true;
    }
    if let Some(band) = args.band {
        config.distribution.band = band;
    }

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run_rows(path: &Path, config: &AuditConfig, format: OutputFormat) -> Result<()> {
    let batch = ingest::parse_rows(&read_input(path)?, config.derive_missing_dispersion)
        .with_context(|| format!("Failed to load rows from {}", path.display()))?;

    let report = run_audit(&batch.rows, config)?.with_rejections(batch.rejected);

    match format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_audit(report);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            for r in &report.rejected {
                eprintln!("rejected {}: {}", r.item, r.reason);
            }
            let mut csv = CsvAuditOutput::new();
            for row in report.rows {
                csv.add_row(row);
            }
            print!("{}", csv.to_csv());
        }
    }

    Ok(())
}

fn run_simulation(args: &Cli, path: &Path, config: &AuditConfig) -> Result<()> {
    let sim = ingest::parse_simulation(&read_input(path)?)
        .with_context(|| format!("Failed to load simulation from {}", path.display()))?;

    let mut options = ComparisonOptions::from_config(&config.distribution, args.metric);
    if let Some(view) = args.view {
        options.view = view;
    }
    if !args.percentile.is_empty() {
        options.percentiles = args.percentile.clone();
    }
    options.validate().map_err(|e| anyhow::anyhow!(e))?;

    let (fair, rigged) = sim.histograms(args.metric);
    let series = compare(args.metric, fair, rigged, &options);

    match args.format {
        OutputFormat::Text => {
            print!("{}", series_report(&series));
            for r in &sim.rejected {
                println!("rejected {}: {}", r.item, r.reason);
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.set_comparison(series, sim.rejected);
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            for r in &sim.rejected {
                eprintln!("rejected {}: {}", r.item, r.reason);
            }
            print!("{}", CsvSeriesOutput::new(&series).to_csv());
        }
    }

    Ok(())
}

fn series_report(series: &ComparisonSeries) -> String {
    let mut report = String::new();
    let unit = match series.view {
        View::Histogram => "P(x) %",
        View::Tail => "P(X >= x) %",
    };

    report.push_str(&format!(
        "📊 {} ({:?} view), fair n={}, rigged n={}\n\n",
        series.metric, series.view, series.fair_total, series.rigged_total
    ));
    let mut header = format!("{:>8}  {:>12}  {:>12}", "x", "fair", "rigged");
    if series.fair_gaussian.is_some() {
        header.push_str(&format!("  {:>12}  {:>12}", "fair fit", "rigged fit"));
    }
    if series.fair_band.is_some() {
        header.push_str(&format!("  {:>12}  {:>12}", "band low", "band high"));
    }
    report.push_str(&header);
    report.push('\n');

    for (i, x) in series.domain.iter().enumerate() {
        let mut line = format!(
            "{:>8}  {:>12.4}  {:>12.4}",
            x, series.fair[i], series.rigged[i]
        );
        if let (Some(fg), Some(rg)) = (&series.fair_gaussian, &series.rigged_gaussian) {
            line.push_str(&format!("  {:>12.4}  {:>12.4}", fg[i], rg[i]));
        }
        if let Some(band) = &series.fair_band {
            line.push_str(&format!("  {:>12.4}  {:>12.4}", band.lower[i], band.upper[i]));
        }
        report.push_str(&line);
        report.push('\n');
    }
    report.push_str(&format!("({})\n", unit));

    if !series.markers.is_empty() {
        report.push_str("\nPercentiles:\n");
        for m in &series.markers {
            let show = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            report.push_str(&format!(
                "  P{}: fair={} rigged={}\n",
                (m.quantile * 1000.0).round() / 10.0,
                show(m.fair),
                show(m.rigged)
            ));
        }
    }

    report
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    // Rows and simulation input are mutually exclusive
    match (&args.rows, &args.simulation) {
        (Some(rows), None) => run_rows(rows, &config, args.format),
        (None, Some(sim)) => run_simulation(&args, sim, &config),
        (Some(_), Some(_)) => {
            anyhow::bail!("Cannot specify both --rows and --simulation. Choose one.");
        }
        (None, None) => {
            anyhow::bail!("Must specify either --rows FILE or --simulation FILE. Usage: gacha-audit --rows rows.json");
        }
    }
}
