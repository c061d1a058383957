use forge_client::forge_client::ForgeError;
use forge_client::model::CommitId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Error surface of the rebase engine.
///
/// Every variant is fatal: the engine performs no retries, and on any
/// failure the pull request's head reference is left at the sha observed
/// when the operation started.
#[derive(Debug)]
pub enum RebaseError {
  /// The feature range contains a merge commit; only linear histories of
  /// non-merge commits are rebased
  UnsupportedHistory { commit: CommitId },
  /// An autosquash directive has no matching anchor commit, or the replay
  /// plan does not start with a pick
  AutosquashUnresolved { subject: String },
  /// The forge signalled a conflict while replaying the given source commit
  MergeConflict { source: CommitId },
  /// The head reference moved while the rebase was running
  HeadChanged { expected: CommitId, actual: CommitId },
  /// Cooperative cancellation fired between plan items
  Cancelled,
  /// Pass-through forge client failure (transport, auth, validation)
  Forge(ForgeError),
}

impl From<ForgeError> for RebaseError {
  fn from(err: ForgeError) -> Self {
    RebaseError::Forge(err)
  }
}

impl std::fmt::Display for RebaseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RebaseError::UnsupportedHistory { commit } => {
        write!(f, "cannot rebase: commit {} is a merge commit", commit.short())
      }
      RebaseError::AutosquashUnresolved { subject } => {
        write!(f, "no anchor commit found for autosquash directive: {subject}")
      }
      RebaseError::MergeConflict { source } => {
        write!(f, "merge conflict while replaying commit {}", source.short())
      }
      RebaseError::HeadChanged { expected, actual } => {
        write!(f, "head reference moved during rebase: expected {}, found {}", expected.short(), actual.short())
      }
      RebaseError::Cancelled => write!(f, "rebase cancelled"),
      RebaseError::Forge(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for RebaseError {}

/// Cooperative cancellation signal shared between the caller and a running
/// rebase. The engine checks it between plan items and stops with
/// `RebaseError::Cancelled` without touching the head reference.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag {
  cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Relaxed)
  }
}
