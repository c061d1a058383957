use crate::model::{Commit, CommitId, NewCommit, PullRequest};
use async_trait::async_trait;

/// Error surface of a forge client implementation.
///
/// Transport-level failures (timeouts, connection errors, rate limiting)
/// are carried through `Other` unchanged; callers do not retry.
#[derive(Debug)]
pub enum ForgeError {
  /// The named object or reference does not exist on the forge
  NotFound(String),
  /// The credentials are not allowed to perform the operation
  Forbidden(String),
  /// The forge rejected the request payload
  Validation(String),
  /// A reference could not be created or updated because of its current state,
  /// e.g. the name is taken or a non-force update is not a fast-forward
  RefConflict(String),
  Other(anyhow::Error),
}

impl From<anyhow::Error> for ForgeError {
  fn from(err: anyhow::Error) -> Self {
    ForgeError::Other(err)
  }
}

impl std::fmt::Display for ForgeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ForgeError::NotFound(what) => write!(f, "not found: {what}"),
      ForgeError::Forbidden(what) => write!(f, "forbidden: {what}"),
      ForgeError::Validation(what) => write!(f, "validation failed: {what}"),
      ForgeError::RefConflict(what) => write!(f, "reference conflict: {what}"),
      ForgeError::Other(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for ForgeError {}

/// Result of a three-way merge request.
///
/// A merge conflict is a distinguished outcome, not an error: the forge
/// handled the request, the trees just cannot be combined automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
  /// The forge created a merge commit on the target branch
  Merged(CommitId),
  Conflict,
}

/// Capability set the rebase engine consumes. Any transport that can read
/// and create commit objects, merge three-way and update references under
/// a compare-and-swap discipline satisfies it.
#[async_trait]
pub trait ForgeClient: Send + Sync {
  /// Read a pull request including the current head and base tips
  async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError>;

  /// Read the sha a branch currently points at
  async fn get_reference_sha(&self, ref_name: &str) -> Result<CommitId, ForgeError>;

  /// List the commits reachable from `head` but not from `base`, oldest
  /// first, in first-parent order. `base` itself is excluded.
  async fn list_commits_between(&self, base: &CommitId, head: &CommitId) -> Result<Vec<Commit>, ForgeError>;

  /// Read a single commit object
  async fn get_commit(&self, id: &CommitId) -> Result<Commit, ForgeError>;

  /// Create a commit object and return its id. The committer is the
  /// authenticated identity at the moment of creation.
  async fn create_commit(&self, commit: NewCommit<'_>) -> Result<CommitId, ForgeError>;

  /// Merge `head` into `branch`, resolving three-way against the tree of
  /// the `base` commit (the empty tree when `None`). On success the branch
  /// is advanced to the new merge commit.
  async fn merge_three_way(&self, base: Option<&CommitId>, branch: &str, head: &CommitId) -> Result<MergeOutcome, ForgeError>;

  /// Create a branch pointing at `sha`. Fails with `RefConflict` if the
  /// name is already taken.
  async fn create_reference(&self, ref_name: &str, sha: &CommitId) -> Result<(), ForgeError>;

  /// Delete a branch
  async fn delete_reference(&self, ref_name: &str) -> Result<(), ForgeError>;

  /// Point a branch at `sha`. Without `force` the update succeeds only if
  /// it is a fast-forward of the current tip.
  async fn update_reference(&self, ref_name: &str, sha: &CommitId, force: bool) -> Result<(), ForgeError>;
}
