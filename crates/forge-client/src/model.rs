use serde::{Deserialize, Serialize};

/// Opaque content hash of a commit object, assigned by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
  pub fn new(sha: impl Into<String>) -> Self {
    Self(sha.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Abbreviated form for log output
  pub fn short(&self) -> &str {
    if self.0.len() >= 7 { &self.0[..7] } else { &self.0 }
  }
}

impl std::fmt::Display for CommitId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Opaque content hash of a tree object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for TreeId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Author or committer identity as the forge reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub name: String,
  pub email: String,
}

impl Identity {
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
    }
  }
}

/// A commit object as read from the forge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
  pub id: CommitId,
  pub parents: Vec<CommitId>,
  pub tree: TreeId,
  pub message: String,
  pub author: Identity,
  pub committer: Identity,
}

impl Commit {
  /// First line of the commit message
  pub fn subject(&self) -> &str {
    self.message.lines().next().unwrap_or("")
  }

  /// Message body below the subject line, without the separating blank lines
  pub fn body(&self) -> &str {
    match self.message.split_once('\n') {
      Some((_, rest)) => rest.trim_start_matches('\n'),
      None => "",
    }
  }

  /// Merge commits cannot be replayed; only linear history is supported
  pub fn is_merge(&self) -> bool {
    self.parents.len() > 1
  }
}

/// Read-only snapshot of a pull request. The forge reports the current
/// tips of both the head and the base reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
  pub number: u64,
  pub head_ref: String,
  pub head_sha: CommitId,
  pub base_ref: String,
  pub base_sha: CommitId,
}

/// Parameters for creating a commit object on the forge.
///
/// There is no committer field: the forge attaches the authenticated
/// identity as the committer at creation time.
#[derive(Debug)]
pub struct NewCommit<'a> {
  pub tree: &'a TreeId,
  pub parents: &'a [CommitId],
  pub message: &'a str,
  pub author: &'a Identity,
}
