use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use tracing::info;

use ecourts_causelist::models::{format_date, RawQuery, SelectionLevel};
use ecourts_causelist::utils::{logging, title_case};
use ecourts_causelist::{App, BatchStats, CaseLookup, CaseLookupQuery, CauseListQuery, Config};

/// Fetch court cause lists from the eCourts portal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (defaults + environment otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for JSON reports and downloaded PDFs
    #[arg(long, global = true)]
    output_dir: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    headful: bool,

    /// Attach to a browser started with --remote-debugging-port instead of launching one
    #[arg(long, global = true)]
    browser_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one query
    Query {
        #[arg(long)]
        state: String,
        #[arg(long)]
        district: String,
        /// Court complex name
        #[arg(long)]
        complex: String,
        /// Court name exactly as listed by the portal
        #[arg(long)]
        court: String,
        /// criminal or civil
        #[arg(long, default_value = "civil")]
        case_type: String,
        /// Cause-list date (DD-MM-YYYY); the portal's default otherwise
        #[arg(long)]
        date: Option<String>,
        /// Keep only rows dated today
        #[arg(long)]
        today: bool,
        /// Keep only rows dated tomorrow
        #[arg(long)]
        tomorrow: bool,
        /// Keep only rows dated on this day (DD-MM-YYYY), repeatable
        #[arg(long = "match-date")]
        match_dates: Vec<String>,
        /// Download PDFs linked from the results page
        #[arg(long)]
        download_pdf: bool,
        /// Pass names to the portal exactly as typed
        #[arg(long)]
        keep_case: bool,
    },
    /// Look up one case by CNR, or by case type, number and year
    Lookup {
        /// Full 16-character CNR
        #[arg(long, conflicts_with_all = ["case_type", "number", "year"])]
        cnr: Option<String>,
        /// Case type as listed on the search page (e.g. CC)
        #[arg(long, requires_all = ["number", "year"])]
        case_type: Option<String>,
        #[arg(long, requires = "case_type")]
        number: Option<String>,
        #[arg(long, requires = "case_type")]
        year: Option<String>,
        /// Keep only listings dated today
        #[arg(long)]
        today: bool,
        /// Keep only listings dated tomorrow
        #[arg(long)]
        tomorrow: bool,
        /// Keep only listings dated on this day (DD-MM-YYYY), repeatable
        #[arg(long = "match-date")]
        match_dates: Vec<String>,
        /// Download PDFs linked from the result page
        #[arg(long)]
        download_pdf: bool,
    },
    /// Run every query file (*.toml) in a folder
    Batch {
        folder: String,
        #[arg(long)]
        download_pdf: bool,
    },
    /// List the options of a level, e.g. `options district --prior "West Bengal"`
    Options {
        /// state, district, complex or court
        level: String,
        /// Values of the lower levels, in order
        #[arg(long)]
        prior: Vec<String>,
        #[arg(long)]
        keep_case: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Query {
            state,
            district,
            complex,
            court,
            case_type,
            date,
            today,
            tomorrow,
            match_dates,
            download_pdf,
            keep_case,
        } => {
            config.download_pdfs |= download_pdf;
            let targets = target_date_args(match_dates, today, tomorrow);

            let raw = RawQuery {
                state: normalize_name(&state, SelectionLevel::State, keep_case),
                district: normalize_name(&district, SelectionLevel::District, keep_case),
                court_complex: normalize_name(&complex, SelectionLevel::CourtComplex, keep_case),
                court: court.trim().to_string(),
                case_type,
                date,
                target_dates: (!targets.is_empty()).then_some(targets),
            };
            let query = CauseListQuery::try_from(raw).context("invalid query")?;

            let stats = App::new(config).run_query(query).await;
            report_single(&stats)
        }
        Command::Lookup {
            cnr,
            case_type,
            number,
            year,
            today,
            tomorrow,
            match_dates,
            download_pdf,
        } => {
            config.download_pdfs |= download_pdf;

            let lookup = match (cnr, case_type, number, year) {
                (Some(cnr), _, _, _) => CaseLookup::cnr(&cnr)?,
                (None, Some(case_type), Some(number), Some(year)) => {
                    CaseLookup::case_number(&case_type, &number, &year)?
                }
                _ => bail!("provide --cnr, or --case-type with --number and --year"),
            };
            let targets = target_date_args(match_dates, today, tomorrow);
            let query = CaseLookupQuery::new(lookup, &targets).context("invalid lookup")?;

            let stats = App::new(config).run_lookup(query).await;
            report_single(&stats)
        }
        Command::Batch {
            folder,
            download_pdf,
        } => {
            config.download_pdfs |= download_pdf;
            let stats = App::new(config).run_folder(&folder).await?;
            if stats.total() > 0 && stats.failed == stats.total() {
                bail!("all {} queries failed", stats.total());
            }
            Ok(())
        }
        Command::Options {
            level,
            prior,
            keep_case,
        } => {
            let level = SelectionLevel::parse(&level)?;
            let prior: Vec<String> = SelectionLevel::ALL
                .into_iter()
                .zip(prior.iter())
                .map(|(lvl, value)| normalize_name(value, lvl, keep_case))
                .collect();

            let options = App::new(config).list_options(level, &prior).await?;
            info!("{} {} option(s)", options.len(), level);
            for option in options {
                println!("{}", option);
            }
            Ok(())
        }
    }
}

/// `--match-date` values plus today / tomorrow, as DD-MM-YYYY strings
fn target_date_args(mut targets: Vec<String>, today: bool, tomorrow: bool) -> Vec<String> {
    let now = Local::now().date_naive();
    if today {
        targets.push(format_date(now));
    }
    if tomorrow {
        targets.push(format_date(now + Duration::days(1)));
    }
    targets
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env()?,
    };

    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.headful {
        config.headless = false;
    }
    if let Some(port) = cli.browser_port {
        config.browser_debug_port = Some(port);
    }
    config.validate()?;
    Ok(config)
}

/// The portal lists states and districts in title case and complexes in upper case
fn normalize_name(value: &str, level: SelectionLevel, keep_case: bool) -> String {
    if keep_case {
        return value.trim().to_string();
    }
    match level {
        SelectionLevel::State | SelectionLevel::District => title_case(value),
        SelectionLevel::CourtComplex => value.trim().to_uppercase(),
        SelectionLevel::Court => value.trim().to_string(),
    }
}

fn report_single(stats: &BatchStats) -> Result<()> {
    let Some(report) = stats.reports.first() else {
        bail!("query produced no report");
    };

    if !report.completed {
        bail!("query failed: {}", report.errors.join("; "));
    }

    if report.listed {
        for entry in &report.entries {
            println!(
                "{}\t{}\t{}\t{}",
                entry.serial_number.as_deref().unwrap_or("-"),
                entry.case_number,
                entry.party_names,
                entry.advocate.as_deref().unwrap_or("-")
            );
        }
    } else {
        println!("not listed");
    }
    Ok(())
}
