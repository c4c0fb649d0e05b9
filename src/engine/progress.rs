//! Console progress reporting for reconciliation runs

use std::time::Duration;

use colored::Colorize;
use declarative::{
    ExecuteSummary, GatewayError, Plan, ProgressCallback, Snapshot, Stage, StageOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};

use super::display::{snapshot_lines, stage_lines};
use crate::ui;

/// Spinner shown while waiting on the cluster
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints the snapshot, each stage's plan section and its outcome
pub struct ConsoleProgress {
    verbose: bool,
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            spinner: None,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_snapshot_start(&mut self) {
        if !self.quiet {
            self.spinner = Some(spinner("Fetching cluster state..."));
        }
    }

    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.clear_spinner();
        if self.quiet {
            return;
        }
        ui::banner("currently configured topics");
        for line in snapshot_lines(snapshot) {
            println!("{line}");
        }
        println!();
    }

    // The error itself is returned to the caller and printed once on exit
    fn on_snapshot_failed(&mut self, error: &GatewayError) {
        self.clear_spinner();
        log::debug!("Snapshot failed: {error}");
    }

    fn on_plan(&mut self, plan: &Plan) {
        if !self.verbose || plan.notes.is_empty() {
            return;
        }
        ui::header("Notes");
        for note in &plan.notes {
            ui::dim(&note.to_string());
        }
        println!();
    }

    fn on_stage_start(&mut self, stage: Stage, plan: &Plan) {
        if self.quiet {
            return;
        }
        ui::banner(stage.title());
        for line in stage_lines(stage, plan) {
            println!("{line}");
        }
    }

    fn on_stage_complete(&mut self, stage: Stage, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Failed { error } => {
                ui::error(&format!("Could not {stage}: {error}"));
            }
            _ if self.quiet => {}
            StageOutcome::NoChange => ui::dim("nothing to do"),
            StageOutcome::Applied { count } => ui::success(&format!("{stage}: {count} applied")),
            StageOutcome::Validated { count } => {
                ui::info(&format!("{stage}: {count} validated (dry run)"));
            }
            StageOutcome::Skipped { reason } => ui::warn(&format!("{stage}: skipped, {reason}")),
        }
        if !self.quiet {
            println!();
        }
    }
}

/// Print the per-stage summary of a run
pub fn print_summary(summary: &ExecuteSummary) {
    ui::header("Summary");
    for (stage, outcome) in &summary.stages {
        let text = outcome.to_string();
        let text = match outcome {
            StageOutcome::Failed { .. } => text.red().to_string(),
            StageOutcome::Applied { .. } => text.green().to_string(),
            StageOutcome::Skipped { .. } => text.yellow().to_string(),
            _ => text.dimmed().to_string(),
        };
        ui::kv(&stage.to_string(), &text);
    }
    println!();

    let changes = summary.total_changes();
    if summary.is_success() {
        ui::success(&format!("Done, {}", ui::plural(changes, "change")));
    } else {
        ui::warn(&format!(
            "Finished with {}, {}",
            ui::plural(summary.failed(), "failed stage"),
            ui::plural(changes, "change")
        ));
    }
}
