//! `ktc apply` - converge the cluster toward the definitions

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ClusterAdmin, ExecuteOptions, TopicDefinition, execute};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::ClientSettings;
use crate::definitions::{self, DefinitionError};
use crate::engine::{ConsoleProgress, print_summary};
use crate::ui;

pub async fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let settings = ClientSettings::load(&args.cluster.bootstrap, &args.cluster.extra_properties)?;
    let timeout = Duration::from_secs(args.cluster.timeout);
    let admin = super::connect(&settings, timeout)?;

    let loaded = definitions::load(
        &args.definitions.definitions,
        args.definitions.no_replication,
    )
    .await;
    report_definition_errors(&loaded.errors);
    log::info!("Loaded {} topic definition(s)", loaded.topics.len());

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        remove_topics: args.remove_topics,
        timeout,
    };
    reconcile(ctx, admin.as_ref(), &loaded.topics, &opts).await
}

/// Run every stage and print the summary
///
/// Only a failed snapshot is an error; failed stages are reported and the
/// run still succeeds.
async fn reconcile(
    ctx: &Context,
    admin: &dyn ClusterAdmin,
    topics: &BTreeMap<String, TopicDefinition>,
    opts: &ExecuteOptions,
) -> Result<()> {
    let mut progress = ConsoleProgress::new(ctx.verbose > 0, ctx.quiet);
    let summary = execute(admin, topics, opts, &mut progress)
        .await
        .context("Error retrieving currently configured topics")?;

    if !ctx.quiet {
        print_summary(&summary);
    }
    Ok(())
}

/// Print one line per definition file that could not be loaded
pub fn report_definition_errors(errors: &[DefinitionError]) {
    for error in errors {
        ui::error(&error.to_string());
    }
}
