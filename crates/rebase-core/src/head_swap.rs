use crate::intercept::SwapIntercept;
use crate::model::RebaseError;
use forge_client::forge_client::{ForgeClient, ForgeError};
use forge_client::model::CommitId;
use tracing::{info, instrument};

/// Parameters for the final head reference update
pub struct HeadSwapParams<'a> {
  pub head_ref: &'a str,
  /// Head sha observed when the rebase started
  pub witness: &'a CommitId,
  /// Tip of the rewritten history
  pub new_head: &'a CommitId,
  /// Test hook fired before the compare-and-swap re-read
  pub intercept: Option<&'a dyn SwapIntercept>,
}

/// Swap the head reference onto the rewritten history, guarded by a
/// compare-and-swap against the witness sha. Nothing before the final
/// update mutates the reference, so any failure leaves it at the witness.
#[instrument(skip(forge, params), fields(head_ref = params.head_ref, new_head = %params.new_head.short()))]
pub async fn swap_head<C: ForgeClient>(forge: &C, params: HeadSwapParams<'_>) -> Result<CommitId, RebaseError> {
  let HeadSwapParams {
    head_ref,
    witness,
    new_head,
    intercept,
  } = params;

  if let Some(intercept) = intercept {
    intercept.before_swap().await.map_err(|e| RebaseError::Forge(ForgeError::Other(e)))?;
  }

  let current = forge.get_reference_sha(head_ref).await?;
  if current != *witness {
    return Err(RebaseError::HeadChanged {
      expected: witness.clone(),
      actual: current,
    });
  }

  forge.update_reference(head_ref, new_head, true).await?;
  info!(head_ref, old = %witness.short(), new = %new_head.short(), "head reference updated");
  Ok(new_head.clone())
}
