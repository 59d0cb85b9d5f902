//! visit-finder CLI - list the days a location history passed near a place
//!
//! Usage:
//!   visit-finder <file> [--at "<lat>, <lng>"] [--radius <meters>] [--format json]
//!
//! Parameters not given on the command line come from the preferences file
//! (last saved reference point and radius), then from the built-in defaults.

use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use visit_finder::{
    failure_message, load_timeline, render_json, render_text, DateStyle,
    Preferences, QueryInput, ToleranceBox, VisitConfig, VisitReport, METERS_PER_DEGREE,
};

#[derive(Parser)]
#[command(name = "visit-finder")]
#[command(about = "List the dates a location history passed near a reference point", long_about = None)]
struct Cli {
    /// Location history export (JSON array of timeline segments)
    file: PathBuf,

    /// Reference point as "lat, lng" or "(lat, lng)"
    #[arg(long, allow_hyphen_values = true)]
    at: Option<String>,

    /// Reference latitude (used with --lng when --at is absent)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Reference longitude (used with --lat when --at is absent)
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,

    /// Match radius in meters (converted at 91,000 m per degree)
    #[arg(short, long, conflicts_with = "degrees")]
    radius: Option<f64>,

    /// Match radius in coordinate degrees
    #[arg(long)]
    degrees: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Label style for text output
    #[arg(long, value_enum, default_value_t = Style::Iso)]
    style: Style,

    /// Preferences file with the last used reference point and radius
    #[arg(long, default_value = ".visit-finder.json")]
    prefs: PathBuf,

    /// Save the effective reference point and radius to the preferences file.
    /// The radius is always stored in meters, so a --degrees value is saved
    /// as its meter equivalent (degrees * 91,000)
    #[arg(long)]
    save: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    Iso,
    Japanese,
}

impl From<Style> for DateStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Iso => DateStyle::Iso,
            Style::Japanese => DateStyle::Japanese,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let style = DateStyle::from(cli.style);

    let prefs = match Preferences::load(&cli.prefs) {
        Ok(prefs) => prefs,
        Err(e) => {
            log::warn!("Ignoring preferences: {}", e);
            Preferences::default()
        }
    };
    let query = build_query(&cli, &prefs);

    let config = match VisitConfig::resolve(&query) {
        Ok(config) => config,
        Err(e) => return fail(&e, style),
    };

    let bounds = ToleranceBox::from(&config).bounds();
    log::info!(
        "Searching near {} within lat {:.6}..{:.6}, lng {:.6}..{:.6}",
        config.reference,
        bounds.min().y,
        bounds.max().y,
        bounds.min().x,
        bounds.max().x
    );

    let segments = match load_timeline(&cli.file) {
        Ok(segments) => segments,
        Err(e) => return fail(&e, style),
    };

    let report = run(&segments, &config);
    if let VisitReport::Found { months } = &report {
        log::info!(
            "Found {} visit days across {} months",
            report.total_days(),
            months.len()
        );
    }

    match cli.format {
        Format::Text => print!("{}", render_text(&report, style)),
        Format::Json => match render_json(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    if cli.save {
        let saved = Preferences {
            reference_point: Some(format!(
                "{}, {}",
                config.reference.latitude, config.reference.longitude
            )),
            tolerance_meters: Some(config.tolerance_degrees * METERS_PER_DEGREE),
        };
        if let Err(e) = saved.save(&cli.prefs) {
            log::warn!("Could not save preferences: {}", e);
        }
    }

    ExitCode::SUCCESS
}

/// Command line flags override saved preferences field by field.
fn build_query(cli: &Cli, prefs: &Preferences) -> QueryInput {
    let mut query = prefs.to_query();

    if cli.at.is_some() || cli.lat.is_some() || cli.lng.is_some() {
        query.reference_text = cli.at.clone();
        query.latitude = cli.lat.clone();
        query.longitude = cli.lng.clone();
    }

    if let Some(meters) = cli.radius {
        query.tolerance_meters = Some(meters);
        query.tolerance_degrees = None;
    } else if let Some(degrees) = cli.degrees {
        query.tolerance_meters = None;
        query.tolerance_degrees = Some(degrees);
    }

    query
}

#[cfg(feature = "parallel")]
fn run(segments: &[visit_finder::TimelineSegment], config: &VisitConfig) -> VisitReport {
    visit_finder::find_visits_parallel(segments, config)
}

#[cfg(not(feature = "parallel"))]
fn run(segments: &[visit_finder::TimelineSegment], config: &VisitConfig) -> VisitReport {
    visit_finder::find_visits(segments, config)
}

fn fail(err: &visit_finder::VisitError, style: DateStyle) -> ExitCode {
    log::debug!("{}", err);
    eprintln!("{}", failure_message(err, style));
    eprintln!("  ({})", err);
    ExitCode::FAILURE
}
