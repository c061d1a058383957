use crate::autosquash::build_plan;
use crate::commit_range::resolve_commit_range;
use crate::head_swap::{HeadSwapParams, swap_head};
use crate::intercept::SwapIntercept;
use crate::model::{CancellationFlag, RebaseError};
use crate::replay::{ReplayParams, replay_plan};
use forge_client::forge_client::ForgeClient;
use forge_client::model::CommitId;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument};

/// Namespace transient references are created under when the caller does
/// not designate one
pub const DEFAULT_TEMP_REF_NAMESPACE: &str = "temp/rebase";

/// Options for a rebase run
pub struct RebaseOptions<'a> {
  /// Prefix the transient merge references are created under. A namespace
  /// unique to this run is derived beneath it.
  pub temp_ref_namespace: String,
  /// Cooperative cancellation, checked between plan items
  pub cancellation: CancellationFlag,
  /// Test hook fired after replay completes and before the final
  /// compare-and-swap re-read. Production callers leave this unset.
  pub intercept: Option<&'a dyn SwapIntercept>,
}

impl Default for RebaseOptions<'_> {
  fn default() -> Self {
    Self {
      temp_ref_namespace: DEFAULT_TEMP_REF_NAMESPACE.to_string(),
      cancellation: CancellationFlag::new(),
      intercept: None,
    }
  }
}

/// Rebase the pull request's head branch onto the current tip of its base
/// branch, folding autosquash directives, and atomically swap the head
/// reference onto the rewritten history. Returns the new head sha.
///
/// On any failure the head reference still points at the sha observed when
/// the operation started.
#[instrument(skip(forge, options))]
pub async fn rebase_pull_request<C: ForgeClient>(forge: &C, pr_number: u64, options: &RebaseOptions<'_>) -> Result<CommitId, RebaseError> {
  let pull_request = forge.get_pull_request(pr_number).await?;
  info!(
    head_ref = %pull_request.head_ref,
    base_ref = %pull_request.base_ref,
    head = %pull_request.head_sha.short(),
    base = %pull_request.base_sha.short(),
    "starting rebase"
  );

  let range = resolve_commit_range(forge, &pull_request).await?;
  let plan = build_plan(&range.commits)?;

  let namespace = run_namespace(&options.temp_ref_namespace, pr_number);
  debug!(namespace = %namespace, "replaying onto base");

  let new_head = replay_plan(
    forge,
    ReplayParams {
      plan: &plan,
      base_sha: &range.base_sha,
      temp_ref_namespace: &namespace,
      cancellation: &options.cancellation,
    },
  )
  .await?;

  swap_head(
    forge,
    HeadSwapParams {
      head_ref: &pull_request.head_ref,
      witness: &range.witness,
      new_head: &new_head,
      intercept: options.intercept,
    },
  )
  .await
}

/// Namespace unique to this run so concurrent rebases of different pull
/// requests in the same repository cannot collide
fn run_namespace(prefix: &str, pr_number: u64) -> String {
  let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_nanos()).unwrap_or(0);
  format!("{}/{pr_number}/{nanos}", prefix.trim_end_matches('/'))
}
