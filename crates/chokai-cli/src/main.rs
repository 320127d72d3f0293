//! chokai - operator command line for the community association engine.
//!
//! Resolves the working fiscal year from the session override and the
//! organization calendar, and runs roster and rollover operations against
//! the JSON record store in the data directory.

use std::io;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chokai_core::auth::{OfficerRoster, Session};
use chokai_core::config::{resolve_calendar, Config};
use chokai_core::grade::{resolve_grade, school_age};
use chokai_core::models::{Member, MemberId};
use chokai_core::rollover::{commit_drafts, prepare_from_store};
use chokai_core::roster::member_roster;
use chokai_core::store::{FileStore, RecordStore};
use chokai_core::utils::format_date;
use chokai_core::{FiscalYear, RequestContext};

const USAGE: &str = "\
Usage: chokai <command> [options]

Commands:
  year [--date YYYY-MM-DD]        Show the working fiscal year
  switch-year <YEAR> | --clear    Set or clear the fiscal year override
  era <YEAR> | --parse <LABEL>    Convert between fiscal years and era labels
  grade <YYYY-MM-DD> [--year Y]   Grade band for a birthdate
  roster [--json]                 Active children of the working year
  rollover [--commit] [--as ID]   Draft (and commit) next year's officers

Set RUST_LOG=debug for diagnostic output.";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    let mut config = Config::load_or_default();
    config.apply_env_overrides();
    debug!(?config, "Loaded configuration");

    match command.as_str() {
        "year" => cmd_year(&config, rest),
        "switch-year" => cmd_switch_year(&config, rest),
        "era" => cmd_era(&config, rest),
        "grade" => cmd_grade(&config, rest),
        "roster" => cmd_roster(&config, rest),
        "rollover" => cmd_rollover(&mut config, rest),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn option<'a>(args: &'a [String], name: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| a == name) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{} requires a value", name)),
        None => Ok(None),
    }
}

fn positional(args: &[String]) -> Option<&str> {
    args.iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", raw))
}

fn parse_year(raw: &str) -> Result<FiscalYear> {
    raw.parse()
        .with_context(|| format!("Invalid fiscal year: {}", raw))
}

fn load_session(data_dir: &Path) -> Result<Session> {
    let mut session = Session::new(data_dir.to_path_buf());
    session.load(Utc::now())?;
    Ok(session)
}

fn request_context(config: &Config, today: NaiveDate) -> Result<RequestContext> {
    let session = load_session(&config.data_dir()?)?;
    Ok(RequestContext::from_session(&session, config, today))
}

fn load_members(store: &FileStore) -> Result<Vec<Member>> {
    Ok(store
        .list::<Member>()?
        .into_iter()
        .map(|stored| stored.record)
        .collect())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_year(config: &Config, args: &[String]) -> Result<()> {
    let today = match option(args, "--date")? {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let ctx = request_context(config, today)?;
    println!("{}", ctx.heading());
    println!("{}", ctx.period_label());
    Ok(())
}

fn cmd_switch_year(config: &Config, args: &[String]) -> Result<()> {
    let mut session = load_session(&config.data_dir()?)?;
    let now = Utc::now();
    if flag(args, "--clear") {
        session.clear_fiscal_year(now)?;
        println!("Fiscal year override cleared");
        return Ok(());
    }
    let raw = positional(args).ok_or_else(|| anyhow!("switch-year requires a year"))?;
    let year = parse_year(raw)?;
    session.switch_fiscal_year(year, now)?;
    println!("Working fiscal year set to {}", year);
    Ok(())
}

fn cmd_era(config: &Config, args: &[String]) -> Result<()> {
    let era = resolve_calendar(config).era();
    if let Some(label) = option(args, "--parse")? {
        let year = era.parse(label)?;
        println!("{}", year);
        return Ok(());
    }
    let raw = positional(args).ok_or_else(|| anyhow!("era requires a year or --parse <LABEL>"))?;
    println!("{}", era.label(parse_year(raw)?));
    Ok(())
}

fn cmd_grade(config: &Config, args: &[String]) -> Result<()> {
    let raw = positional(args).ok_or_else(|| anyhow!("grade requires a birthdate"))?;
    let birthdate = parse_date(raw)?;
    let fiscal_year = match option(args, "--year")? {
        Some(year) => parse_year(year)?,
        None => request_context(config, Utc::now().date_naive())?.fiscal_year,
    };
    let grade = resolve_grade(Some(birthdate), fiscal_year);
    println!(
        "{}: {} ({}年度, school age {})",
        format_date(birthdate),
        grade.label,
        fiscal_year,
        school_age(birthdate, fiscal_year)
    );
    Ok(())
}

fn cmd_roster(config: &Config, args: &[String]) -> Result<()> {
    let ctx = request_context(config, Utc::now().date_naive())?;
    let store = FileStore::new(config.data_dir()?)?;
    let rows = member_roster(&load_members(&store)?, ctx.fiscal_year);

    if flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", ctx.heading());
    for row in &rows {
        println!("{}\t{}\t{}", row.grade.label, row.display_name, row.guardian_name);
    }
    println!("{} children", rows.len());
    Ok(())
}

fn cmd_rollover(config: &mut Config, args: &[String]) -> Result<()> {
    let ctx = request_context(config, Utc::now().date_naive())?;
    let mut store = FileStore::new(config.data_dir()?)?;
    let target = ctx.fiscal_year.next();
    let plan = prepare_from_store(&store, target, &ctx.calendar)?;

    println!("{} -> {}", ctx.fiscal_year, target);
    for draft in &plan.assignments {
        println!(
            "  {}\t{}\t{} - {}",
            draft.role_name.as_deref().unwrap_or(draft.role.0.as_str()),
            draft.member,
            format_date(draft.start_date),
            format_date(draft.end_date)
        );
    }
    for task in &plan.tasks {
        let due = task.due_date.map(format_date).unwrap_or_default();
        println!("  [{}] {}\t{}", task.role, task.title, due);
    }
    if plan.is_empty() {
        println!("Nothing to roll over");
        return Ok(());
    }
    if !flag(args, "--commit") {
        println!("Dry run; pass --commit to save");
        return Ok(());
    }

    let actor = match option(args, "--as")? {
        Some(raw) => MemberId(
            raw.parse()
                .with_context(|| format!("Invalid member id: {}", raw))?,
        ),
        None => ctx
            .identity
            .or(config.last_member_id)
            .ok_or_else(|| anyhow!("rollover --commit requires --as <MEMBER_ID>"))?,
    };

    let officers = OfficerRoster::from_store(&store, ctx.fiscal_year)?;
    let report = commit_drafts(&mut store, &officers, actor, &plan, Utc::now())?;
    info!(?report, "Rollover committed");
    println!(
        "Saved {} assignments and {} tasks for {}",
        report.assignments_created + report.assignments_updated,
        report.tasks_created + report.tasks_updated,
        target
    );

    let mut session = load_session(&config.data_dir()?)?;
    session.set_member_id(actor, Utc::now())?;
    config.last_member_id = Some(actor);
    config.save()?;
    Ok(())
}
