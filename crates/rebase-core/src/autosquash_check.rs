use crate::autosquash::split_directive;
use crate::commit_range::resolve_commit_range;
use crate::model::RebaseError;
use forge_client::forge_client::ForgeClient;
use tracing::instrument;

/// Report whether rebasing the pull request with autosquash would have any
/// effect: true iff any commit subject in the feature range carries a
/// `fixup!` or `squash!` directive. Pure query, performs no writes.
#[instrument(skip(forge))]
pub async fn needs_autosquash<C: ForgeClient>(forge: &C, pr_number: u64) -> Result<bool, RebaseError> {
  let pull_request = forge.get_pull_request(pr_number).await?;
  let range = resolve_commit_range(forge, &pull_request).await?;

  Ok(range.commits.iter().any(|commit| split_directive(commit.subject()).is_some()))
}
