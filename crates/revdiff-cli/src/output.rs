use colored::Colorize;
use revdiff_diff::{DiffReport, LineOp};
use revdiff_watch::{BatchSummary, EventOutcome, Outcome, ReportSink};

use crate::cli::OutputFormat;

/// Prints each outcome to stdout as it is reported.
pub struct ConsoleSink {
    format: OutputFormat,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl ReportSink for ConsoleSink {
    fn report(&self, outcome: &EventOutcome) {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(outcome) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "cannot serialize outcome"),
            },
            OutputFormat::Text => print_outcome(outcome),
        }
    }
}

fn print_outcome(outcome: &EventOutcome) {
    let target = outcome.target();
    match &outcome.outcome {
        Outcome::Diffed {
            previous,
            ordering_verified,
            report,
        } => {
            println!(
                "{} {} against {} ({})",
                "✓".green().bold(),
                target.bold(),
                previous.to_string().yellow(),
                report.render_summary()
            );
            if !*ordering_verified {
                println!("  {}", "previous revision chosen from unverified listing order".dimmed());
            }
            print_report(report);
        }
        Outcome::NoPreviousVersion => {
            println!("{} {} no previous version", "•".cyan(), target.bold());
        }
        Outcome::Failed { stage, error } => {
            println!(
                "{} {} failed at {}: {} ({})",
                "✗".red().bold(),
                target.bold(),
                stage.to_string().yellow(),
                error.kind().to_string().red(),
                error.detail()
            );
        }
    }
}

pub fn print_report(report: &DiffReport) {
    for op in &report.ops {
        let line = op.to_string();
        match op {
            LineOp::Added(_) => println!("{}", line.green()),
            LineOp::Removed(_) => println!("{}", line.red()),
            LineOp::Unchanged(_) => println!("{line}"),
        }
    }
}

pub fn print_summary(summary: &BatchSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(summary) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "cannot serialize summary"),
        },
        OutputFormat::Text => println!(
            "\n{} events: {} diffed, {} without previous version, {} failed",
            summary.total.to_string().bold(),
            summary.diffed.to_string().green(),
            summary.no_previous.to_string().cyan(),
            summary.failed.to_string().red()
        ),
    }
}
