//! `ktc describe` - show what is currently on the cluster

use anyhow::{Context as AnyhowContext, Result};
use declarative::fetch_snapshot;
use std::time::Duration;

use crate::Context;
use crate::cli::DescribeArgs;
use crate::config::ClientSettings;
use crate::engine::display::snapshot_lines;
use crate::engine::spinner;
use crate::ui;

pub async fn run(ctx: &Context, args: DescribeArgs) -> Result<()> {
    let settings = ClientSettings::load(&args.cluster.bootstrap, &args.cluster.extra_properties)?;
    let timeout = Duration::from_secs(args.cluster.timeout);
    let admin = super::connect(&settings, timeout)?;

    let pb = (!ctx.quiet).then(|| spinner("Fetching cluster state..."));
    let result = fetch_snapshot(admin.as_ref(), timeout).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let snapshot = result.context("Error retrieving currently configured topics")?;

    if snapshot.is_empty() {
        ui::info("No topics configured");
        return Ok(());
    }

    ui::banner("currently configured topics");
    for line in snapshot_lines(&snapshot) {
        println!("{line}");
    }
    if !ctx.quiet {
        println!();
        ui::dim(&format!(
            "{}, (*) marks topic-level overrides",
            ui::plural(snapshot.len(), "topic")
        ));
    }

    Ok(())
}
