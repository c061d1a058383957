use crate::model::RebaseError;
use forge_client::model::Commit;
use tracing::{debug, instrument};

/// Autosquash directive carried in a commit subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
  Fixup,
  Squash,
}

/// Split a subject line into its autosquash directive and the target
/// subject it refers to. Returns `None` for ordinary subjects and for a
/// bare prefix with an empty target.
pub fn split_directive(subject: &str) -> Option<(Directive, &str)> {
  let (directive, target) = if let Some(rest) = subject.strip_prefix("fixup! ") {
    (Directive::Fixup, rest)
  } else if let Some(rest) = subject.strip_prefix("squash! ") {
    (Directive::Squash, rest)
  } else {
    return None;
  };

  if target.is_empty() { None } else { Some((directive, target)) }
}

/// What the replay engine does with one plan item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
  /// Place as its own commit. The message already carries the folded text
  /// of every squash anchored to this pick.
  Pick { message: String },
  /// Fold the source's tree change into the pick at `anchor`, discarding
  /// the source's message
  Fixup { anchor: usize },
  /// Fold the source's tree change into the pick at `anchor`; the message
  /// text was folded into the anchor's message at planning time
  Squash { anchor: usize },
}

/// One step of the replay plan
#[derive(Debug, Clone)]
pub struct PlanItem {
  pub source: Commit,
  pub action: PlanAction,
}

/// Ordered replay plan derived from the feature commit range.
///
/// Directives sit directly behind the pick they are anchored to, in their
/// original relative order, so the replay engine's last-created pick is
/// always the directive's anchor.
#[derive(Debug, Clone, Default)]
pub struct Plan {
  pub items: Vec<PlanItem>,
}

impl Plan {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn pick_count(&self) -> usize {
    self.items.iter().filter(|item| matches!(item.action, PlanAction::Pick { .. })).count()
  }
}

/// Build the replay plan for an ordered commit list, oldest first.
///
/// Anchor resolution walks backwards over the original subjects, following
/// chains of directives that target other directives until it reaches a
/// pick. A directive with no anchor fails the whole plan.
#[instrument(skip(commits), fields(commit_count = commits.len()))]
pub fn build_plan(commits: &[Commit]) -> Result<Plan, RebaseError> {
  // For each commit: None for a pick, or the directive together with the
  // original index of the pick it resolves to.
  let mut directives: Vec<Option<(Directive, usize)>> = Vec::with_capacity(commits.len());

  for (index, commit) in commits.iter().enumerate() {
    let Some((directive, target)) = split_directive(commit.subject()) else {
      directives.push(None);
      continue;
    };

    let anchor = commits[..index]
      .iter()
      .rposition(|prior| prior.subject() == target)
      .map(|position| match directives[position] {
        // Target is itself a directive: follow the chain to its pick
        Some((_, anchor)) => anchor,
        None => position,
      });

    match anchor {
      Some(anchor) => directives.push(Some((directive, anchor))),
      None => {
        return Err(RebaseError::AutosquashUnresolved {
          subject: commit.subject().to_string(),
        });
      }
    }
  }

  // Emit each pick followed by the directives anchored to it, folding
  // squash message bodies into the pick's message left-to-right.
  let mut items: Vec<PlanItem> = Vec::with_capacity(commits.len());

  for (pick_index, pick) in commits.iter().enumerate() {
    if directives[pick_index].is_some() {
      continue;
    }

    let plan_anchor = items.len();
    let mut message = pick.message.clone();
    let mut anchored: Vec<PlanItem> = Vec::new();

    for (index, commit) in commits.iter().enumerate().skip(pick_index + 1) {
      let Some((directive, anchor)) = directives[index] else { continue };
      if anchor != pick_index {
        continue;
      }

      let action = match directive {
        Directive::Fixup => PlanAction::Fixup { anchor: plan_anchor },
        Directive::Squash => {
          let body = commit.body();
          if !body.is_empty() {
            message = format!("{message}\n\n{body}");
          }
          PlanAction::Squash { anchor: plan_anchor }
        }
      };

      anchored.push(PlanItem {
        source: commit.clone(),
        action,
      });
    }

    items.push(PlanItem {
      source: pick.clone(),
      action: PlanAction::Pick { message },
    });
    items.extend(anchored);
  }

  let plan = Plan { items };
  debug!(items = plan.items.len(), picks = plan.pick_count(), "built replay plan");
  Ok(plan)
}
