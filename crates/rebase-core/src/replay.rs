use crate::autosquash::{Plan, PlanAction};
use crate::model::{CancellationFlag, RebaseError};
use forge_client::forge_client::{ForgeClient, MergeOutcome};
use forge_client::model::{Commit, CommitId, Identity, NewCommit, TreeId};
use tracing::{debug, instrument, warn};

/// Parameters for replaying a plan on top of a new base
pub struct ReplayParams<'a> {
  pub plan: &'a Plan,
  /// Tip the rewritten history grows from; the cursor starts here
  pub base_sha: &'a CommitId,
  /// Unique per-run namespace for the transient references used to drive
  /// the forge's three-way merge
  pub temp_ref_namespace: &'a str,
  /// Checked between plan items
  pub cancellation: &'a CancellationFlag,
}

/// The pick most recently written to the rewritten history. Directives
/// replace it in place: same parent, same message, same author.
struct LastPick {
  parent: CommitId,
  message: String,
  author: Identity,
}

/// Sequentially apply the plan, advancing a cursor commit one pick at a
/// time. Returns the final cursor, the tip of the rewritten history.
///
/// No user-visible reference is modified here; the only observable side
/// effects are new commit objects and transient references under the
/// per-run namespace, which are removed again before the next item.
#[instrument(skip(forge, params), fields(items = params.plan.items.len(), base = %params.base_sha.short()))]
pub async fn replay_plan<C: ForgeClient>(forge: &C, params: ReplayParams<'_>) -> Result<CommitId, RebaseError> {
  let ReplayParams {
    plan,
    base_sha,
    temp_ref_namespace,
    cancellation,
  } = params;

  if let Some(first) = plan.items.first()
    && !matches!(first.action, PlanAction::Pick { .. })
  {
    return Err(RebaseError::AutosquashUnresolved {
      subject: first.source.subject().to_string(),
    });
  }

  let mut cursor = base_sha.clone();
  let mut last_pick: Option<LastPick> = None;

  for (step, item) in plan.items.iter().enumerate() {
    if cancellation.is_cancelled() {
      debug!(step, "cancellation requested, stopping replay");
      return Err(RebaseError::Cancelled);
    }

    let temp_ref = format!("{temp_ref_namespace}/{step}");
    let tree = merge_source_tree(forge, &temp_ref, &cursor, &item.source).await?;

    let (parent, message, author) = match &item.action {
      PlanAction::Pick { message } => (cursor.clone(), message.clone(), item.source.author.clone()),
      PlanAction::Fixup { .. } | PlanAction::Squash { .. } => {
        let Some(pick) = last_pick.as_ref() else {
          return Err(RebaseError::AutosquashUnresolved {
            subject: item.source.subject().to_string(),
          });
        };
        (pick.parent.clone(), pick.message.clone(), pick.author.clone())
      }
    };

    let parents = [parent.clone()];
    let new_id = forge
      .create_commit(NewCommit {
        tree: &tree,
        parents: &parents,
        message: &message,
        author: &author,
      })
      .await?;

    debug!(step, source = %item.source.id.short(), commit = %new_id.short(), "replayed commit");

    cursor = new_id;
    last_pick = Some(LastPick { parent, message, author });
  }

  Ok(cursor)
}

/// Apply `source` on top of `cursor` through the forge's three-way merge
/// primitive and return the resulting tree. The merge base is the source's
/// parent, so only the source's own change is carried over. The transient
/// branch exists only for the duration of the merge.
async fn merge_source_tree<C: ForgeClient>(forge: &C, temp_ref: &str, cursor: &CommitId, source: &Commit) -> Result<TreeId, RebaseError> {
  forge.create_reference(temp_ref, cursor).await?;
  let outcome = merge_and_read_tree(forge, temp_ref, source).await;
  cleanup_reference(forge, temp_ref).await;

  match outcome? {
    Some(tree) => Ok(tree),
    None => {
      debug!(source = %source.id.short(), "three-way merge conflicted");
      Err(RebaseError::MergeConflict { source: source.id.clone() })
    }
  }
}

async fn merge_and_read_tree<C: ForgeClient>(forge: &C, temp_ref: &str, source: &Commit) -> Result<Option<TreeId>, RebaseError> {
  match forge.merge_three_way(source.parents.first(), temp_ref, &source.id).await? {
    MergeOutcome::Merged(merge_id) => Ok(Some(forge.get_commit(&merge_id).await?.tree)),
    MergeOutcome::Conflict => Ok(None),
  }
}

/// Best-effort removal of a transient reference; not retried
async fn cleanup_reference<C: ForgeClient>(forge: &C, ref_name: &str) {
  if let Err(e) = forge.delete_reference(ref_name).await {
    warn!(ref_name, error = %e, "failed to delete temporary reference");
  }
}
