use crate::tree_merge::{TreeEntries, merge_trees};
use async_trait::async_trait;
use forge_client::forge_client::{ForgeClient, ForgeError, MergeOutcome};
use forge_client::model::{Commit, CommitId, Identity, NewCommit, PullRequest, TreeId};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredCommit {
  parents: Vec<CommitId>,
  tree: TreeId,
  message: String,
  author: Identity,
  committer: Identity,
}

#[derive(Debug, Clone)]
struct PullRequestRecord {
  head_ref: String,
  base_ref: String,
}

#[derive(Debug, Default)]
struct ForgeState {
  commits: IndexMap<CommitId, StoredCommit>,
  trees: IndexMap<TreeId, TreeEntries>,
  refs: IndexMap<String, CommitId>,
  pull_requests: IndexMap<u64, PullRequestRecord>,
}

/// In-memory stand-in for a hosted forge: an object store, mutable
/// references with fast-forward discipline, pull request records and a
/// three-way merge over flattened trees.
///
/// Seeding and inspection helpers panic on misuse; they are test plumbing,
/// not part of the client contract.
pub struct InMemoryForge {
  state: Mutex<ForgeState>,
  next_object: AtomicU64,
  write_count: AtomicU64,
  authenticated: Identity,
}

impl Default for InMemoryForge {
  fn default() -> Self {
    Self::new()
  }
}

impl InMemoryForge {
  pub fn new() -> Self {
    Self::with_authenticated_user(Identity::new("Forge Bot", "bot@forge.example"))
  }

  /// The identity the forge attaches as committer to every commit it creates
  pub fn with_authenticated_user(identity: Identity) -> Self {
    Self {
      state: Mutex::new(ForgeState::default()),
      next_object: AtomicU64::new(1),
      write_count: AtomicU64::new(0),
      authenticated: identity,
    }
  }

  pub fn authenticated_user(&self) -> Identity {
    self.authenticated.clone()
  }

  /// Number of mutations performed so far (commits, merges, reference
  /// writes). Lets tests assert an operation was write-free.
  pub fn write_count(&self) -> u64 {
    self.write_count.load(Ordering::Relaxed)
  }

  /// Creates a commit on a branch, updating `filename` relative to the
  /// branch tip's tree. A branch that does not exist yet is created with
  /// this commit as its root.
  pub fn commit_file(&self, branch: &str, message: &str, filename: &str, content: &str) -> CommitId {
    let author = self.authenticated.clone();
    self.commit_file_with_author(branch, message, filename, content, &author)
  }

  pub fn commit_file_with_author(&self, branch: &str, message: &str, filename: &str, content: &str, author: &Identity) -> CommitId {
    let mut state = self.state();
    let parent = state.refs.get(branch).cloned();

    let mut entries = match &parent {
      Some(tip) => Self::entries_of(&state, tip),
      None => TreeEntries::new(),
    };
    entries.insert(filename.to_string(), content.to_string());

    let tree = self.intern_tree(&mut state, entries);
    let id = self.next_commit_id();
    state.commits.insert(
      id.clone(),
      StoredCommit {
        parents: parent.into_iter().collect(),
        tree,
        message: message.to_string(),
        author: author.clone(),
        committer: self.authenticated.clone(),
      },
    );
    state.refs.insert(branch.to_string(), id.clone());
    self.record_write();
    id
  }

  /// Creates a branch pointing to a specific commit
  pub fn create_branch_at(&self, branch: &str, sha: &CommitId) -> Result<(), String> {
    let mut state = self.state();
    if state.refs.contains_key(branch) {
      return Err(format!("branch {branch} already exists"));
    }
    if !state.commits.contains_key(sha) {
      return Err(format!("unknown commit {sha}"));
    }
    state.refs.insert(branch.to_string(), sha.clone());
    self.record_write();
    Ok(())
  }

  pub fn branch_exists(&self, branch: &str) -> bool {
    self.state().refs.contains_key(branch)
  }

  /// Registers a pull request from `head_ref` into `base_ref`. The sha
  /// fields reported by `get_pull_request` always reflect the current tips.
  pub fn open_pull_request(&self, number: u64, head_ref: &str, base_ref: &str) {
    let mut state = self.state();
    state.pull_requests.insert(
      number,
      PullRequestRecord {
        head_ref: head_ref.to_string(),
        base_ref: base_ref.to_string(),
      },
    );
  }

  pub fn reference_sha(&self, branch: &str) -> Option<CommitId> {
    self.state().refs.get(branch).cloned()
  }

  /// Every reference currently alive, in creation order
  pub fn reference_names(&self) -> Vec<String> {
    self.state().refs.keys().cloned().collect()
  }

  /// Reads a commit, panicking when it does not exist
  pub fn commit(&self, id: &CommitId) -> Commit {
    let state = self.state();
    let stored = state.commits.get(id).unwrap_or_else(|| panic!("unknown commit {id}"));
    Self::public_commit(id, stored)
  }

  /// Flattened tree of a commit, panicking when it does not exist
  pub fn tree_entries(&self, id: &CommitId) -> TreeEntries {
    let state = self.state();
    Self::entries_of(&state, id)
  }

  /// First-parent history of a branch, oldest first, root included
  pub fn first_parent_log(&self, branch: &str) -> Vec<Commit> {
    let state = self.state();
    let mut current = state.refs.get(branch).cloned();
    let mut log = Vec::new();

    while let Some(id) = current {
      let stored = state.commits.get(&id).unwrap_or_else(|| panic!("unknown commit {id}"));
      log.push(Self::public_commit(&id, stored));
      current = stored.parents.first().cloned();
    }

    log.reverse();
    log
  }

  fn state(&self) -> MutexGuard<'_, ForgeState> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn next_commit_id(&self) -> CommitId {
    CommitId::new(format!("{:040x}", self.next_object.fetch_add(1, Ordering::Relaxed)))
  }

  fn record_write(&self) {
    self.write_count.fetch_add(1, Ordering::Relaxed);
  }

  /// Content-addressed tree storage: identical entries map to one id, so
  /// tests can compare trees by id the way the real forge allows
  fn intern_tree(&self, state: &mut ForgeState, entries: TreeEntries) -> TreeId {
    if let Some((id, _)) = state.trees.iter().find(|(_, existing)| **existing == entries) {
      return id.clone();
    }
    let id = TreeId::new(format!("{:040x}", self.next_object.fetch_add(1, Ordering::Relaxed)));
    state.trees.insert(id.clone(), entries);
    id
  }

  fn entries_of(state: &ForgeState, id: &CommitId) -> TreeEntries {
    let stored = state.commits.get(id).unwrap_or_else(|| panic!("unknown commit {id}"));
    state.trees.get(&stored.tree).cloned().unwrap_or_else(|| panic!("unknown tree {}", stored.tree))
  }

  fn public_commit(id: &CommitId, stored: &StoredCommit) -> Commit {
    Commit {
      id: id.clone(),
      parents: stored.parents.clone(),
      tree: stored.tree.clone(),
      message: stored.message.clone(),
      author: stored.author.clone(),
      committer: stored.committer.clone(),
    }
  }

  fn ancestor_set(state: &ForgeState, id: &CommitId) -> HashSet<CommitId> {
    let mut seen = HashSet::new();
    let mut queue = vec![id.clone()];

    while let Some(current) = queue.pop() {
      if !seen.insert(current.clone()) {
        continue;
      }
      if let Some(stored) = state.commits.get(&current) {
        queue.extend(stored.parents.iter().cloned());
      }
    }

    seen
  }

  fn is_ancestor(state: &ForgeState, ancestor: &CommitId, descendant: &CommitId) -> bool {
    Self::ancestor_set(state, descendant).contains(ancestor)
  }
}

#[async_trait]
impl ForgeClient for InMemoryForge {
  async fn get_pull_request(&self, number: u64) -> Result<PullRequest, ForgeError> {
    let state = self.state();
    let record = state
      .pull_requests
      .get(&number)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("pull request #{number}")))?;

    let head_sha = state
      .refs
      .get(&record.head_ref)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("reference {}", record.head_ref)))?;
    let base_sha = state
      .refs
      .get(&record.base_ref)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("reference {}", record.base_ref)))?;

    Ok(PullRequest {
      number,
      head_ref: record.head_ref,
      head_sha,
      base_ref: record.base_ref,
      base_sha,
    })
  }

  async fn get_reference_sha(&self, ref_name: &str) -> Result<CommitId, ForgeError> {
    self
      .state()
      .refs
      .get(ref_name)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("reference {ref_name}")))
  }

  async fn list_commits_between(&self, base: &CommitId, head: &CommitId) -> Result<Vec<Commit>, ForgeError> {
    let state = self.state();
    if !state.commits.contains_key(head) {
      return Err(ForgeError::NotFound(format!("commit {head}")));
    }

    let base_ancestors = Self::ancestor_set(&state, base);
    let mut commits = Vec::new();
    let mut current = Some(head.clone());

    while let Some(id) = current {
      if base_ancestors.contains(&id) {
        break;
      }
      let stored = state.commits.get(&id).ok_or_else(|| ForgeError::NotFound(format!("commit {id}")))?;
      commits.push(Self::public_commit(&id, stored));
      current = stored.parents.first().cloned();
    }

    commits.reverse();
    Ok(commits)
  }

  async fn get_commit(&self, id: &CommitId) -> Result<Commit, ForgeError> {
    let state = self.state();
    let stored = state.commits.get(id).ok_or_else(|| ForgeError::NotFound(format!("commit {id}")))?;
    Ok(Self::public_commit(id, stored))
  }

  async fn create_commit(&self, commit: NewCommit<'_>) -> Result<CommitId, ForgeError> {
    let mut state = self.state();
    if !state.trees.contains_key(commit.tree) {
      return Err(ForgeError::Validation(format!("unknown tree {}", commit.tree)));
    }
    for parent in commit.parents {
      if !state.commits.contains_key(parent) {
        return Err(ForgeError::Validation(format!("unknown parent {parent}")));
      }
    }

    let id = self.next_commit_id();
    state.commits.insert(
      id.clone(),
      StoredCommit {
        parents: commit.parents.to_vec(),
        tree: commit.tree.clone(),
        message: commit.message.to_string(),
        author: commit.author.clone(),
        committer: self.authenticated.clone(),
      },
    );
    self.record_write();
    Ok(id)
  }

  async fn merge_three_way(&self, base: Option<&CommitId>, branch: &str, head: &CommitId) -> Result<MergeOutcome, ForgeError> {
    let mut state = self.state();
    let tip = state
      .refs
      .get(branch)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("reference {branch}")))?;
    if !state.commits.contains_key(head) {
      return Err(ForgeError::NotFound(format!("commit {head}")));
    }

    let base_entries = match base {
      Some(id) => {
        if !state.commits.contains_key(id) {
          return Err(ForgeError::NotFound(format!("commit {id}")));
        }
        Self::entries_of(&state, id)
      }
      None => TreeEntries::new(),
    };
    let our_entries = Self::entries_of(&state, &tip);
    let their_entries = Self::entries_of(&state, head);

    let Some(merged) = merge_trees(&base_entries, &our_entries, &their_entries) else {
      debug!(branch, head = %head.short(), "three-way merge conflicted");
      return Ok(MergeOutcome::Conflict);
    };

    let tree = self.intern_tree(&mut state, merged);
    let id = self.next_commit_id();
    state.commits.insert(
      id.clone(),
      StoredCommit {
        parents: vec![tip, head.clone()],
        tree,
        message: format!("Merge {} into {branch}", head.short()),
        author: self.authenticated.clone(),
        committer: self.authenticated.clone(),
      },
    );
    state.refs.insert(branch.to_string(), id.clone());
    self.record_write();
    Ok(MergeOutcome::Merged(id))
  }

  async fn create_reference(&self, ref_name: &str, sha: &CommitId) -> Result<(), ForgeError> {
    let mut state = self.state();
    if state.refs.contains_key(ref_name) {
      return Err(ForgeError::RefConflict(format!("reference {ref_name} already exists")));
    }
    if !state.commits.contains_key(sha) {
      return Err(ForgeError::NotFound(format!("commit {sha}")));
    }
    state.refs.insert(ref_name.to_string(), sha.clone());
    self.record_write();
    Ok(())
  }

  async fn delete_reference(&self, ref_name: &str) -> Result<(), ForgeError> {
    let mut state = self.state();
    if state.refs.shift_remove(ref_name).is_none() {
      return Err(ForgeError::NotFound(format!("reference {ref_name}")));
    }
    self.record_write();
    Ok(())
  }

  async fn update_reference(&self, ref_name: &str, sha: &CommitId, force: bool) -> Result<(), ForgeError> {
    let mut state = self.state();
    let current = state
      .refs
      .get(ref_name)
      .cloned()
      .ok_or_else(|| ForgeError::NotFound(format!("reference {ref_name}")))?;
    if !state.commits.contains_key(sha) {
      return Err(ForgeError::NotFound(format!("commit {sha}")));
    }
    if !force && !Self::is_ancestor(&state, &current, sha) {
      return Err(ForgeError::RefConflict(format!("non-fast-forward update of {ref_name}")));
    }

    state.refs.insert(ref_name.to_string(), sha.clone());
    self.record_write();
    Ok(())
  }
}
