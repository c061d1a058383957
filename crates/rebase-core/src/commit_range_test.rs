use crate::commit_range::resolve_commit_range;
use crate::model::RebaseError;
use forge_client::forge_client::ForgeClient;
use pretty_assertions::assert_eq;
use test_forge::in_memory_forge::InMemoryForge;

#[tokio::test]
async fn test_resolves_feature_commits_and_witness() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  forge.commit_file("feature", "feature 1st", "a.txt", "1\n");
  let head = forge.commit_file("feature", "feature 2nd", "b.txt", "2\n");
  forge.open_pull_request(1, "feature", "master");

  let pull_request = forge.get_pull_request(1).await.unwrap();
  let range = resolve_commit_range(&forge, &pull_request).await.unwrap();

  assert_eq!(range.base_sha, initial);
  assert_eq!(range.witness, head);
  let subjects: Vec<&str> = range.commits.iter().map(|commit| commit.subject()).collect();
  assert_eq!(subjects, vec!["feature 1st", "feature 2nd"]);
}

#[tokio::test]
async fn test_empty_range_when_head_equals_base() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  forge.open_pull_request(1, "feature", "master");

  let pull_request = forge.get_pull_request(1).await.unwrap();
  let range = resolve_commit_range(&forge, &pull_request).await.unwrap();

  assert!(range.commits.is_empty());
}

#[tokio::test]
async fn test_merge_commit_in_range_is_unsupported() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  forge.commit_file("feature", "feature 1st", "a.txt", "1\n");
  let master = forge.commit_file("master", "master 1st", "b.txt", "2\n");

  // Merge the advanced base back into the feature branch
  let outcome = forge.merge_three_way(Some(&initial), "feature", &master).await.unwrap();
  let merge_id = match outcome {
    forge_client::forge_client::MergeOutcome::Merged(id) => id,
    other => panic!("expected a merge commit, got {other:?}"),
  };

  forge.open_pull_request(1, "feature", "master");
  let pull_request = forge.get_pull_request(1).await.unwrap();
  let err = resolve_commit_range(&forge, &pull_request).await.unwrap_err();

  match err {
    RebaseError::UnsupportedHistory { commit } => assert_eq!(commit, merge_id),
    other => panic!("expected UnsupportedHistory, got {other:?}"),
  }
}
