use crate::in_memory_forge::InMemoryForge;
use forge_client::forge_client::{ForgeClient, ForgeError, MergeOutcome};
use forge_client::model::{Identity, NewCommit};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_commit_file_advances_branch_and_builds_history() {
  let forge = InMemoryForge::new();
  let root = forge.commit_file("master", "initial", "file.txt", "I\n");
  let tip = forge.commit_file("master", "second", "file.txt", "II\n");

  assert_eq!(forge.reference_sha("master"), Some(tip.clone()));

  let log = forge.first_parent_log("master");
  let messages: Vec<&str> = log.iter().map(|commit| commit.message.as_str()).collect();
  assert_eq!(messages, vec!["initial", "second"]);
  assert_eq!(log[1].parents, vec![root]);
}

#[tokio::test]
async fn test_list_commits_between_excludes_base_and_orders_oldest_first() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  forge.commit_file("feature", "feature 1st", "a.txt", "1\n");
  forge.commit_file("feature", "feature 2nd", "b.txt", "2\n");

  let base = forge.reference_sha("master").unwrap();
  let head = forge.reference_sha("feature").unwrap();
  let commits = forge.list_commits_between(&base, &head).await.unwrap();

  let subjects: Vec<&str> = commits.iter().map(|commit| commit.subject()).collect();
  assert_eq!(subjects, vec!["feature 1st", "feature 2nd"]);
}

#[tokio::test]
async fn test_merge_three_way_advances_branch_and_records_both_parents() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\nI\n");
  forge.create_branch_at("feature", &initial).unwrap();
  let feature = forge.commit_file("feature", "feature 1st", "file.txt", "F1\nI\n");
  let master = forge.commit_file("master", "master 1st", "file.txt", "I\nM1\n");

  let outcome = forge.merge_three_way(Some(&initial), "master", &feature).await.unwrap();
  let MergeOutcome::Merged(merge_id) = outcome else {
    panic!("expected a merge commit, got {outcome:?}");
  };

  assert_eq!(forge.reference_sha("master"), Some(merge_id.clone()));
  let merge = forge.commit(&merge_id);
  assert_eq!(merge.parents, vec![master, feature]);
  assert_eq!(merge.committer, forge.authenticated_user());
  assert_eq!(forge.tree_entries(&merge_id).get("file.txt").map(String::as_str), Some("F1\nM1\n"));
}

#[tokio::test]
async fn test_merge_conflict_leaves_branch_untouched() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  let feature = forge.commit_file("feature", "feature 1st", "file.txt", "F1\n");
  let master = forge.commit_file("master", "master 1st", "file.txt", "M1\n");

  let outcome = forge.merge_three_way(Some(&initial), "master", &feature).await.unwrap();

  assert_eq!(outcome, MergeOutcome::Conflict);
  assert_eq!(forge.reference_sha("master"), Some(master));
}

#[tokio::test]
async fn test_non_fast_forward_update_is_rejected_without_force() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  let feature = forge.commit_file("feature", "feature 1st", "file.txt", "F1\n");
  forge.commit_file("master", "master 1st", "file.txt", "M1\n");

  let denied = forge.update_reference("master", &feature, false).await;
  assert!(matches!(denied, Err(ForgeError::RefConflict(_))), "expected a reference conflict, got {denied:?}");

  forge.update_reference("master", &feature, true).await.unwrap();
  assert_eq!(forge.reference_sha("master"), Some(feature));
}

#[tokio::test]
async fn test_create_reference_rejects_taken_names() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");

  let denied = forge.create_reference("master", &initial).await;
  assert!(matches!(denied, Err(ForgeError::RefConflict(_))), "expected a reference conflict, got {denied:?}");
}

#[tokio::test]
async fn test_pull_request_reports_current_tips() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();
  forge.open_pull_request(7, "feature", "master");

  let head = forge.commit_file("feature", "feature 1st", "a.txt", "1\n");
  let base = forge.commit_file("master", "master 1st", "b.txt", "2\n");

  let pull_request = forge.get_pull_request(7).await.unwrap();
  assert_eq!(pull_request.number, 7);
  assert_eq!(pull_request.head_sha, head);
  assert_eq!(pull_request.base_sha, base);
}

#[tokio::test]
async fn test_created_commits_carry_author_and_authenticated_committer() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  let author = Identity::new("Feature Author", "author@example.com");

  let tree = forge.commit(&initial).tree;
  let parents = [initial.clone()];
  let id = forge
    .create_commit(NewCommit {
      tree: &tree,
      parents: &parents,
      message: "authored elsewhere",
      author: &author,
    })
    .await
    .unwrap();

  let commit = forge.commit(&id);
  assert_eq!(commit.author, author);
  assert_eq!(commit.committer, forge.authenticated_user());
}

#[tokio::test]
async fn test_identical_trees_share_one_id() {
  let forge = InMemoryForge::new();
  let initial = forge.commit_file("master", "initial", "file.txt", "I\n");
  forge.create_branch_at("feature", &initial).unwrap();

  let ours = forge.commit_file("master", "same change", "file.txt", "X\n");
  let theirs = forge.commit_file("feature", "same change again", "file.txt", "X\n");

  assert_eq!(forge.commit(&ours).tree, forge.commit(&theirs).tree);
}
