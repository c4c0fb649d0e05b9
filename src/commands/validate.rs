//! `ktc validate` - load and merge definitions offline

use anyhow::Result;

use crate::Context;
use crate::cli::ValidateArgs;
use crate::definitions;
use crate::engine::definition_lines;
use crate::ui;

use super::apply::report_definition_errors;

pub async fn run(ctx: &Context, args: ValidateArgs) -> Result<()> {
    let loaded = definitions::load(&args.definitions.definitions, args.definitions.no_replication).await;

    if !ctx.quiet {
        ui::banner("merged topic definitions");
        for line in definition_lines(&loaded.topics) {
            println!("{line}");
        }
        println!();
    }

    report_definition_errors(&loaded.errors);

    if !loaded.errors.is_empty() {
        anyhow::bail!(
            "{} could not be loaded",
            ui::plural(loaded.errors.len(), "definition file")
        );
    }

    ui::success(&format!(
        "{} defined",
        ui::plural(loaded.topics.len(), "topic")
    ));
    Ok(())
}
