//! Post lifecycle: time-driven visibility derived from inactivity.
//!
//! A post moves through four phases as time passes since its last activity:
//!
//! | Phase      | Elapsed since last activity | Effect |
//! |------------|-----------------------------|--------|
//! | `Open`     | up to `close_after`         | accepts comments |
//! | `Closed`   | `> close_after`             | `is_closed` flag persisted; comments rejected |
//! | `Archived` | `> archive_after`           | archive badge shown at read time; never persisted |
//! | `Expired`  | `> purge_after`             | row removed from the store |
//!
//! Only an explicit reopen by the owner clears a closed post. A reply to an
//! open post restarts its clock.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  post::{Post, PostView},
};

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Where a post sits on the inactivity timeline. Ordered by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Open,
  Closed,
  Archived,
  Expired,
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Inactivity thresholds. All comparisons are strict: a post exactly
/// `close_after` old is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
  pub close_after:   TimeDelta,
  pub archive_after: TimeDelta,
  pub purge_after:   TimeDelta,
}

impl Default for LifecyclePolicy {
  fn default() -> Self {
    Self {
      close_after:   TimeDelta::days(30),
      archive_after: TimeDelta::days(90),
      purge_after:   TimeDelta::days(120),
    }
  }
}

impl LifecyclePolicy {
  /// Build a policy from day counts, requiring `0 < close <= archive <= purge`.
  pub fn from_days(close: u32, archive: u32, purge: u32) -> Result<Self> {
    if close == 0 {
      return Err(Error::InvalidPolicy("close_after_days must be positive".into()));
    }
    if !(close <= archive && archive <= purge) {
      return Err(Error::InvalidPolicy(format!(
        "thresholds must be ordered close <= archive <= purge, got {close}/{archive}/{purge}"
      )));
    }
    Ok(Self {
      close_after:   TimeDelta::days(close.into()),
      archive_after: TimeDelta::days(archive.into()),
      purge_after:   TimeDelta::days(purge.into()),
    })
  }

  pub fn phase(&self, last_activity_at: DateTime<Utc>, now: DateTime<Utc>) -> Phase {
    let elapsed = now - last_activity_at;
    if elapsed > self.purge_after {
      Phase::Expired
    } else if elapsed > self.archive_after {
      Phase::Archived
    } else if elapsed > self.close_after {
      Phase::Closed
    } else {
      Phase::Open
    }
  }

  /// Whether the persisted closed flag should be flipped on now.
  pub fn should_close(&self, post: &Post, now: DateTime<Utc>) -> bool {
    !post.is_closed && self.phase(post.last_activity_at, now) >= Phase::Closed
  }

  pub fn is_archived(&self, post: &Post, now: DateTime<Utc>) -> bool {
    self.phase(post.last_activity_at, now) >= Phase::Archived
  }

  pub fn is_expired(&self, post: &Post, now: DateTime<Utc>) -> bool {
    self.phase(post.last_activity_at, now) == Phase::Expired
  }

  /// Posts last active strictly before this instant are due to close.
  pub fn close_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> { now - self.close_after }

  /// Posts last active strictly before this instant are due for removal.
  pub fn purge_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> { now - self.purge_after }

  /// Present `post` to a reader at `now`. A post past the close threshold
  /// reads as closed even before its flag has been persisted.
  pub fn view(&self, mut post: Post, now: DateTime<Utc>) -> PostView {
    post.is_closed |= self.should_close(&post, now);
    let archived = self.is_archived(&post, now);
    PostView { post, archived }
  }
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

/// Outcome of one lifecycle sweep over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
  /// Posts whose closed flag was flipped on.
  pub closed: usize,
  /// Posts (with their comments and notifications) removed.
  pub purged: usize,
}
