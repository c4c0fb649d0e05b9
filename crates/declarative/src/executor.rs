//! Execution engine - observes the cluster and applies the plan stage by stage

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

use fanout::{combined, to_btree_map};
use log::{debug, info, warn};

use crate::context::{ClusterAdmin, NoProgress, ProgressCallback};
use crate::error::GatewayError;
use crate::planner::Plan;
use crate::types::{
    ExecuteOptions, ExecuteSummary, ObservedTopic, Snapshot, Stage, StageOutcome, TopicDefinition,
};

/// Run a gateway call under a deadline
async fn with_deadline<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    debug!("{operation}: sending (deadline {}s)", after.as_secs_f64());
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout { operation, after }),
    }
}

/// Whether a topic is internal to the cluster (`__consumer_offsets`, ...)
fn is_internal(name: &str) -> bool {
    name.starts_with('_')
}

/// Fetch the current state of every non-internal topic
///
/// Configurations are described one topic per call, concurrently; any
/// failure fails the whole snapshot.
pub async fn fetch_snapshot<G>(gateway: &G, timeout: Duration) -> Result<Snapshot, GatewayError>
where
    G: ClusterAdmin + ?Sized,
{
    let names: BTreeSet<String> = with_deadline("list_topics", timeout, gateway.list_topics())
        .await?
        .into_iter()
        .filter(|name| !is_internal(name))
        .collect();

    if names.is_empty() {
        return Ok(Snapshot::new());
    }

    let descriptions =
        with_deadline("describe_topics", timeout, gateway.describe_topics(&names)).await?;

    let describe_one = |name: &String| {
        let name = name.clone();
        async move {
            let single = BTreeSet::from([name.clone()]);
            let mut configs =
                with_deadline("describe_configs", timeout, gateway.describe_configs(&single))
                    .await?;
            let entries = configs.remove(&name).unwrap_or_default();
            Ok::<_, GatewayError>((name, entries))
        }
    };
    let mut configs = combined(names.iter().map(describe_one), to_btree_map()).await?;

    let mut snapshot = Snapshot::new();
    for name in names {
        let Some(description) = descriptions.get(&name).copied() else {
            warn!("Topic {name} disappeared while describing the cluster");
            continue;
        };
        let entries = configs.remove(&name).unwrap_or_default();
        snapshot.insert(name.clone(), ObservedTopic::new(name, description, entries));
    }

    debug!("Observed {} topic(s)", snapshot.len());
    Ok(snapshot)
}

/// Observe the cluster, plan, and apply every stage
///
/// Only a failure to observe the cluster is returned as an error; stage
/// failures are recorded in the summary and do not stop later stages.
pub async fn execute<G, P>(
    gateway: &G,
    desired: &BTreeMap<String, TopicDefinition>,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ExecuteSummary, GatewayError>
where
    G: ClusterAdmin + ?Sized,
    P: ProgressCallback + ?Sized,
{
    progress.on_snapshot_start();
    let snapshot = match fetch_snapshot(gateway, opts.timeout).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            progress.on_snapshot_failed(&e);
            return Err(e);
        }
    };
    progress.on_snapshot(&snapshot);

    let plan = Plan::build(&snapshot, desired);
    for note in &plan.notes {
        debug!("{note}");
    }
    progress.on_plan(&plan);

    Ok(apply_plan(gateway, &plan, opts, progress).await)
}

/// Apply an already computed plan, one stage at a time
pub async fn apply_plan<G, P>(
    gateway: &G,
    plan: &Plan,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> ExecuteSummary
where
    G: ClusterAdmin + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let mut summary = ExecuteSummary::default();

    for stage in Stage::ALL {
        progress.on_stage_start(stage, plan);
        let outcome = run_stage(gateway, stage, plan, opts).await;
        match &outcome {
            StageOutcome::Failed { .. } | StageOutcome::Skipped { .. } => {
                warn!("{stage}: {outcome}");
            }
            _ => info!("{stage}: {outcome}"),
        }
        progress.on_stage_complete(stage, &outcome);
        summary.record(stage, outcome);
    }

    summary
}

async fn run_stage<G>(gateway: &G, stage: Stage, plan: &Plan, opts: &ExecuteOptions) -> StageOutcome
where
    G: ClusterAdmin + ?Sized,
{
    let count = plan.stage_len(stage);
    if count == 0 {
        return StageOutcome::NoChange;
    }

    let timeout = opts.timeout;
    let result = match stage {
        Stage::Create => {
            with_deadline(
                "create_topics",
                timeout,
                gateway.create_topics(&plan.to_create, opts.dry_run),
            )
            .await
        }
        Stage::Reconfigure => {
            with_deadline(
                "alter_configs",
                timeout,
                gateway.alter_configs(&plan.to_reconfigure, opts.dry_run),
            )
            .await
        }
        Stage::GrowPartitions => {
            if opts.dry_run {
                return StageOutcome::Skipped {
                    reason: "dry run, partition growth cannot be validated".into(),
                };
            }
            let targets = plan.grow_targets();
            with_deadline(
                "create_partitions",
                timeout,
                gateway.create_partitions(&targets),
            )
            .await
        }
        Stage::Delete => {
            if !opts.remove_topics {
                return StageOutcome::Skipped {
                    reason: "topic removal is disabled".into(),
                };
            }
            with_deadline("delete_topics", timeout, gateway.delete_topics(&plan.to_delete)).await
        }
    };

    match result {
        Ok(()) if opts.dry_run && matches!(stage, Stage::Create | Stage::Reconfigure) => {
            StageOutcome::Validated { count }
        }
        Ok(()) => StageOutcome::Applied { count },
        Err(e) => StageOutcome::Failed {
            error: e.to_string(),
        },
    }
}

/// Simple execution without progress reporting
pub async fn execute_simple<G>(
    gateway: &G,
    desired: &BTreeMap<String, TopicDefinition>,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary, GatewayError>
where
    G: ClusterAdmin + ?Sized,
{
    execute(gateway, desired, opts, &mut NoProgress).await
}
