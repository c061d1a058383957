use crate::model::RebaseError;
use forge_client::forge_client::ForgeClient;
use forge_client::model::{Commit, CommitId, PullRequest};
use tracing::{debug, instrument};

/// The linear series of feature commits to replay and the base commit they
/// must land upon.
#[derive(Debug, Clone)]
pub struct CommitRange {
  /// Current tip of the base branch; the replay cursor starts here
  pub base_sha: CommitId,
  /// Head sha observed at resolution time, used as the compare-and-swap
  /// witness for the final reference update
  pub witness: CommitId,
  /// Feature commits in application order, oldest first
  pub commits: Vec<Commit>,
}

/// Resolve the commits reachable from the pull request's head but not from
/// its base, in first-parent order. A merge commit anywhere in the range
/// makes the history unsupported.
#[instrument(skip(forge, pull_request), fields(pr = pull_request.number))]
pub async fn resolve_commit_range<C: ForgeClient>(forge: &C, pull_request: &PullRequest) -> Result<CommitRange, RebaseError> {
  let commits = forge.list_commits_between(&pull_request.base_sha, &pull_request.head_sha).await?;

  if let Some(merge) = commits.iter().find(|commit| commit.is_merge()) {
    return Err(RebaseError::UnsupportedHistory { commit: merge.id.clone() });
  }

  debug!(
    commit_count = commits.len(),
    base = %pull_request.base_sha.short(),
    head = %pull_request.head_sha.short(),
    "resolved commit range"
  );

  Ok(CommitRange {
    base_sha: pull_request.base_sha.clone(),
    witness: pull_request.head_sha.clone(),
    commits,
  })
}
