pub mod cli;
pub mod dedup;
pub mod normalize;
pub mod rule;
pub mod session;
pub mod store;
pub mod validate;
pub mod value;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{Cli, Commands},
    rule::RuleSet,
    session::{RowOutcome, Workbench},
    store::{CsvStore, TabularStore},
    validate::RowReport,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheet_entry", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => handle_probe(&args),
        Commands::Check(args) => handle_check(&args),
        Commands::Append(args) => handle_append(&args),
        Commands::Update(args) => handle_update(&args),
        Commands::Delete(args) => handle_delete(&args),
    }
}

fn open_workbench(
    input: &Path,
    delimiter: Option<u8>,
    rules_path: Option<&Path>,
) -> Result<Workbench<CsvStore>> {
    let store = CsvStore::open(input, delimiter)?;
    match rules_path {
        Some(path) => {
            let rules =
                RuleSet::load(path).with_context(|| format!("Loading rules from {path:?}"))?;
            Workbench::with_rules(store, rules)
        }
        None => Workbench::open(store),
    }
}

fn report_validation(report: &RowReport) {
    for message in report.error_messages() {
        warn!("error: {message}");
    }
    for message in report.warning_messages() {
        warn!("warning: {message}");
    }
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let store = CsvStore::open(&args.input, args.delimiter)?;
    let rules = RuleSet::infer(&store.load_headers()?);
    for entry in &rules.columns {
        info!(
            "{}. {} -> {}",
            entry.column.position,
            entry.column.name,
            entry.rule.describe()
        );
    }
    if let Some(path) = &args.rules {
        rules
            .save(path)
            .with_context(|| format!("Writing rules to {path:?}"))?;
        info!("Rules for {} column(s) written to {path:?}", rules.len());
    }
    Ok(())
}

fn handle_check(args: &cli::CheckArgs) -> Result<()> {
    let workbench = open_workbench(&args.input, args.delimiter, args.rules.as_deref())?;
    let report = workbench.validate(&args.values)?;
    report_validation(&report);
    if !report.ok {
        bail!("Validation failed on {} field(s)", report.errors.len());
    }
    info!(
        "Row is valid ({} warning(s))",
        report.warnings.len()
    );
    Ok(())
}

fn handle_append(args: &cli::AppendArgs) -> Result<()> {
    let mut workbench = open_workbench(&args.input, args.delimiter, args.rules.as_deref())?;
    let report = workbench.validate(&args.values)?;
    report_validation(&report);
    if !report.ok {
        bail!("Validation failed on {} field(s)", report.errors.len());
    }
    match workbench.add_row(&report, args.force)? {
        RowOutcome::Applied => {}
        RowOutcome::Declined => {
            bail!("Possible duplicate detected; re-run with --force to append anyway")
        }
    }
    workbench.save().context("Saving after append")?;
    info!("Appended and saved to {:?}", args.input);
    Ok(())
}

fn handle_update(args: &cli::UpdateArgs) -> Result<()> {
    let mut workbench = open_workbench(&args.input, args.delimiter, args.rules.as_deref())?;
    workbench.begin_edit(args.row)?;
    let report = workbench.validate(&args.values)?;
    report_validation(&report);
    if !report.ok {
        bail!("Validation failed on {} field(s)", report.errors.len());
    }
    match workbench.update_row(&report, args.force)? {
        RowOutcome::Applied => {}
        RowOutcome::Declined => {
            bail!("Possible duplicate detected; re-run with --force to update anyway")
        }
    }
    workbench.save().context("Saving after update")?;
    info!("Updated row {} in {:?}", args.row, args.input);
    Ok(())
}

fn handle_delete(args: &cli::DeleteArgs) -> Result<()> {
    let mut workbench = open_workbench(&args.input, args.delimiter, None)?;
    workbench.delete_row(args.row)?;
    workbench.save().context("Saving after delete")?;
    info!("Deleted row {} from {:?}", args.row, args.input);
    Ok(())
}
