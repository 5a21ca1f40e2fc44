use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use revdiff_diff::diff_lines;
use revdiff_store::{DirectoryObjectStore, ObjectStore};
use revdiff_types::{ContainerId, Notification, ObjectIdentifier};
use revdiff_watch::{BatchSummary, ChangeHandler, EventOutcome, RevdiffConfig, RevisionResolver};

use crate::cli::*;
use crate::output::{print_report, print_summary, ConsoleSink};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => RevdiffConfig::load(path)?,
        None => RevdiffConfig::default(),
    };
    match cli.command {
        Command::Handle(args) => cmd_handle(args, config, cli.format),
        Command::Diff(args) => cmd_diff(args, cli.format),
        Command::Resolve(args) => cmd_resolve(args, config, cli.format),
        Command::Put(args) => cmd_put(args, config),
    }
}

fn open_store(args: &StoreArgs, config: &RevdiffConfig) -> anyhow::Result<DirectoryObjectStore> {
    let root: PathBuf = args.store.clone().unwrap_or_else(|| config.store.root.clone());
    DirectoryObjectStore::open(&root)
        .with_context(|| format!("cannot open store at {}", root.display()))
}

fn read_events(source: &str) -> anyhow::Result<Notification> {
    let json = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("cannot read notification from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("cannot read notification file {source}"))?
    };
    Ok(Notification::from_json(&json)?)
}

fn cmd_handle(args: HandleArgs, config: RevdiffConfig, format: OutputFormat) -> anyhow::Result<()> {
    let outcomes = handle_batch(args, config, format)?;
    print_summary(&BatchSummary::from_outcomes(&outcomes), format);
    Ok(())
}

fn handle_batch(
    args: HandleArgs,
    mut config: RevdiffConfig,
    format: OutputFormat,
) -> anyhow::Result<Vec<EventOutcome>> {
    if let Some(order) = args.order {
        config.handler.listing_order = order.into();
    }
    if args.no_stage {
        config.handler.staging = false;
    }

    let store = open_store(&args.store, &config)?;
    let notification = read_events(&args.events)?;

    let handler = ChangeHandler::new(
        Arc::new(store),
        &config.handler,
        Box::new(ConsoleSink::new(format)),
    );
    Ok(handler.handle_notification(&notification))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let previous = read_text(&args.previous)?;
    let latest = read_text(&args.latest)?;
    let report = diff_lines(&previous, &latest);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::Text => {
            print_report(&report);
            println!("{}", report.render_summary().dimmed());
        }
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, config: RevdiffConfig, format: OutputFormat) -> anyhow::Result<()> {
    let order = args
        .order
        .map(Into::into)
        .unwrap_or(config.handler.listing_order);
    let store = open_store(&args.store, &config)?;
    let container = ContainerId::new(args.container)?;
    let object = ObjectIdentifier::new(args.object)?;

    let revisions = store.list_revisions(&container)?;
    let previous = RevisionResolver::new(order).resolve(&object, &revisions);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&previous)?),
        OutputFormat::Text => match previous {
            Some(p) if p.ordering_verified => println!("{}", p.marker.to_string().yellow()),
            Some(p) => println!(
                "{} {}",
                p.marker.to_string().yellow(),
                "(unverified listing order)".dimmed()
            ),
            None => println!("no previous version"),
        },
    }
    Ok(())
}

fn cmd_put(args: PutArgs, config: RevdiffConfig) -> anyhow::Result<()> {
    let store = open_store(&args.store, &config)?;
    let container = ContainerId::new(args.container)?;
    let object = ObjectIdentifier::new(args.object)?;
    let data = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let marker = args
        .marker
        .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string());

    store.put_revision(&container, &object, &marker, &data)?;
    println!(
        "{} Recorded {}/{} at {}",
        "✓".green().bold(),
        container,
        object.to_string().bold(),
        marker.yellow()
    );
    Ok(())
}
