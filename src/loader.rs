//! Cloud loader
//!
//! Hydrates the local store from the remote store at session start. Reads
//! fan out concurrently over every collection; each failed read is recorded
//! and leaves that local collection untouched (fail-open, no retry, no
//! rollback of the collections that did load). Merge policy: a remote
//! entity overwrites the local entity with the same id, local-only entities
//! are preserved as not-yet-synced creations, and remote deletions are not
//! propagated (no tombstones exist on this wire).

use std::collections::HashMap;

use futures::future::join_all;
use serde::de::DeserializeOwned;

use crate::backend::SyncBackend;
use crate::error::BackendError;
use crate::models::{FocusSession, Goal, Habit, Plan, Reward, Task, UserProfile};
use crate::remote::{
    Collection, FocusSessionRow, GoalRow, HabitRow, PlanRow, ProfileRow, RewardRow, TaskRow,
};
use crate::store::AppState;

/// Outcome of one hydration pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Rows merged per collection.
    pub merged: HashMap<Collection, usize>,
    /// Rows dropped because they failed row-level deserialization.
    pub skipped_rows: usize,
    /// Collections whose read failed; their local state is unchanged.
    pub errors: Vec<(Collection, BackendError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Remote collections fetched and decoded, ready to merge.
#[derive(Debug, Default)]
pub struct RemoteSnapshot {
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    pub goals: Vec<Goal>,
    pub plans: Vec<Plan>,
    pub focus_sessions: Vec<FocusSession>,
    pub rewards: Vec<Reward>,
    pub profile: Option<UserProfile>,
    pub skipped_rows: usize,
    pub errors: Vec<(Collection, BackendError)>,
}

fn decode_rows<R, T>(
    collection: Collection,
    rows: Vec<serde_json::Value>,
    into_local: fn(R) -> T,
    skipped: &mut usize,
) -> Vec<T>
where
    R: DeserializeOwned,
{
    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<R>(row) {
            Ok(row) => decoded.push(into_local(row)),
            Err(error) => {
                // Bad rows are skipped individually, not fatal.
                tracing::warn!(collection = %collection, %error, "Skipping malformed remote row");
                *skipped += 1;
            }
        }
    }
    decoded
}

/// Fetch every collection for `owner` concurrently. Pure read; the local
/// store is not touched until [`merge_snapshot`].
pub async fn fetch_snapshot(backend: &dyn SyncBackend, owner: &str) -> RemoteSnapshot {
    let reads = Collection::ALL
        .iter()
        .map(|collection| async move { (*collection, backend.fetch_rows(*collection, owner).await) });
    let results = join_all(reads).await;

    let mut snapshot = RemoteSnapshot::default();
    for (collection, result) in results {
        let rows = match result {
            Ok(rows) => rows,
            Err(error) => {
                tracing::warn!(collection = %collection, %error, "Cloud load failed, keeping local data");
                snapshot.errors.push((collection, error));
                continue;
            }
        };

        let skipped = &mut snapshot.skipped_rows;
        match collection {
            Collection::Tasks => {
                snapshot.tasks = decode_rows(collection, rows, TaskRow::into_local, skipped)
            }
            Collection::Habits => {
                snapshot.habits = decode_rows(collection, rows, HabitRow::into_local, skipped)
            }
            Collection::Goals => {
                snapshot.goals = decode_rows(collection, rows, GoalRow::into_local, skipped)
            }
            Collection::Plans => {
                snapshot.plans = decode_rows(collection, rows, PlanRow::into_local, skipped)
            }
            Collection::FocusSessions => {
                snapshot.focus_sessions =
                    decode_rows(collection, rows, FocusSessionRow::into_local, skipped)
            }
            Collection::Rewards => {
                snapshot.rewards = decode_rows(collection, rows, RewardRow::into_local, skipped)
            }
            Collection::Profile => {
                snapshot.profile = decode_rows(collection, rows, ProfileRow::into_local, skipped)
                    .into_iter()
                    .next()
            }
        }
    }
    snapshot
}

fn merge_by_id<T>(local: &mut Vec<T>, remote: Vec<T>, id_of: fn(&T) -> &str) -> usize {
    let mut merged = 0;
    for item in remote {
        merged += 1;
        match local.iter().position(|t| id_of(t) == id_of(&item)) {
            Some(i) => local[i] = item,
            None => local.push(item),
        }
    }
    merged
}

/// Merge a fetched snapshot into the local store. Collections that failed
/// to fetch are absent from the snapshot and stay untouched.
pub fn merge_snapshot(state: &mut AppState, snapshot: RemoteSnapshot) -> LoadReport {
    let mut report = LoadReport {
        skipped_rows: snapshot.skipped_rows,
        ..Default::default()
    };
    let failed: Vec<Collection> = snapshot.errors.iter().map(|(c, _)| *c).collect();
    report.errors = snapshot.errors;

    let mut record = |collection: Collection, merged: usize| {
        if !failed.contains(&collection) {
            report.merged.insert(collection, merged);
        }
    };

    record(
        Collection::Tasks,
        merge_by_id(&mut state.tasks, snapshot.tasks, |t| &t.id),
    );
    record(
        Collection::Habits,
        merge_by_id(&mut state.habits, snapshot.habits, |h| &h.id),
    );
    record(
        Collection::Goals,
        merge_by_id(&mut state.goals, snapshot.goals, |g| &g.id),
    );
    record(
        Collection::Plans,
        merge_by_id(&mut state.plans, snapshot.plans, |p| &p.id),
    );
    record(
        Collection::FocusSessions,
        merge_by_id(&mut state.focus_sessions, snapshot.focus_sessions, |s| {
            &s.id
        }),
    );
    record(
        Collection::Rewards,
        merge_by_id(&mut state.rewards, snapshot.rewards, |r| &r.id),
    );

    if let Some(profile) = snapshot.profile {
        state.profile = profile;
        record(Collection::Profile, 1);
    } else if !failed.contains(&Collection::Profile) {
        record(Collection::Profile, 0);
    }

    state.refresh_reward_availability();
    report
}

/// Fetch and merge in one step.
pub async fn load_into(
    backend: &dyn SyncBackend,
    owner: &str,
    state: &mut AppState,
) -> LoadReport {
    let snapshot = fetch_snapshot(backend, owner).await;
    merge_snapshot(state, snapshot)
}
