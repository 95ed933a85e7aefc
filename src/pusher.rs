//! Cloud pusher
//!
//! Serializes each non-empty local collection into remote rows and issues
//! one batch upsert per collection, conflict on id, replacing remote row
//! contents (last-writer-wins; no version vector, no optimistic concurrency
//! check). Empty local collections are skipped so a locally-emptied
//! collection never propagates a bulk delete; removals go through
//! [`delete_entity`], triggered by explicit user delete actions.
//!
//! A failure in one collection's batch is recorded and does not block the
//! others. There is no automatic retry; the next debounce cycle attempts
//! again while the fingerprint still differs.

use std::collections::HashMap;

use serde::Serialize;

use crate::backend::SyncBackend;
use crate::error::BackendError;
use crate::remote::{
    Collection, FocusSessionRow, GoalRow, HabitRow, PlanRow, ProfileRow, RewardRow, TaskRow,
};
use crate::store::AppState;

/// Outcome of one push pass.
#[derive(Debug, Default)]
pub struct PushReport {
    /// Rows upserted per collection (skipped-empty collections are absent).
    pub pushed: HashMap<Collection, usize>,
    /// Collections whose batch failed.
    pub errors: Vec<(Collection, BackendError)>,
}

impl PushReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

fn serialize_rows<R: Serialize>(rows: Vec<R>) -> Result<Vec<serde_json::Value>, BackendError> {
    rows.into_iter()
        .map(|r| serde_json::to_value(r).map_err(BackendError::Json))
        .collect()
}

async fn push_collection(
    backend: &dyn SyncBackend,
    owner: &str,
    collection: Collection,
    rows: Result<Vec<serde_json::Value>, BackendError>,
    report: &mut PushReport,
) {
    let rows = match rows {
        Ok(rows) => rows,
        Err(error) => {
            tracing::warn!(collection = %collection, %error, "Failed to serialize rows");
            report.errors.push((collection, error));
            return;
        }
    };
    if rows.is_empty() {
        return;
    }

    let count = rows.len();
    match backend.upsert_rows(collection, owner, rows).await {
        Ok(()) => {
            report.pushed.insert(collection, count);
        }
        Err(error) => {
            tracing::warn!(collection = %collection, %error, "Cloud push failed for collection");
            report.errors.push((collection, error));
        }
    }
}

/// Push every non-empty collection for `owner`. Batches are issued
/// sequentially; overlap between whole passes is prevented by the
/// orchestrator's in-flight guard, not here.
pub async fn push_state(backend: &dyn SyncBackend, owner: &str, state: &AppState) -> PushReport {
    let mut report = PushReport::default();

    push_collection(
        backend,
        owner,
        Collection::Tasks,
        serialize_rows(state.tasks.iter().map(TaskRow::from_local).collect()),
        &mut report,
    )
    .await;
    push_collection(
        backend,
        owner,
        Collection::Habits,
        serialize_rows(state.habits.iter().map(HabitRow::from_local).collect()),
        &mut report,
    )
    .await;
    push_collection(
        backend,
        owner,
        Collection::Goals,
        serialize_rows(state.goals.iter().map(GoalRow::from_local).collect()),
        &mut report,
    )
    .await;
    push_collection(
        backend,
        owner,
        Collection::Plans,
        serialize_rows(state.plans.iter().map(PlanRow::from_local).collect()),
        &mut report,
    )
    .await;
    push_collection(
        backend,
        owner,
        Collection::FocusSessions,
        serialize_rows(
            state
                .focus_sessions
                .iter()
                .map(FocusSessionRow::from_local)
                .collect(),
        ),
        &mut report,
    )
    .await;
    push_collection(
        backend,
        owner,
        Collection::Rewards,
        serialize_rows(state.rewards.iter().map(RewardRow::from_local).collect()),
        &mut report,
    )
    .await;
    // The profile always has exactly one row.
    push_collection(
        backend,
        owner,
        Collection::Profile,
        serialize_rows(vec![ProfileRow::from_local(&state.profile, owner)]),
        &mut report,
    )
    .await;

    tracing::debug!(
        pushed = report.pushed.values().sum::<usize>(),
        failed_collections = report.errors.len(),
        "Push pass complete"
    );
    report
}

/// Dedicated delete path for explicit user deletions; never part of the
/// bulk sync pass.
pub async fn delete_entity(
    backend: &dyn SyncBackend,
    owner: &str,
    collection: Collection,
    id: &str,
) -> Result<(), BackendError> {
    backend.delete_row(collection, owner, id).await?;
    tracing::info!(collection = %collection, id, "Deleted remote entity");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::models::{Habit, Task};

    #[tokio::test]
    async fn pushed_rows_mirror_local_field_values() {
        let backend = MockBackend::new();
        let mut state = AppState::new();
        let mut task = Task::new("Water plants");
        task.id = "t1".to_string();
        task.reward_points = 10;
        task.completed = true;
        state.add_task(task);

        let report = push_state(&backend, "u1", &state).await;

        assert!(report.is_clean());
        assert_eq!(report.pushed[&Collection::Tasks], 1);
        let rows = backend.rows_for(Collection::Tasks);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "t1");
        assert_eq!(rows[0]["is_completed"], true);
        assert_eq!(rows[0]["reward_points"], 10);
    }

    #[tokio::test]
    async fn empty_collections_are_skipped() {
        let backend = MockBackend::new();
        let state = AppState::new();

        let report = push_state(&backend, "u1", &state).await;

        // Only the profile (always one row) is pushed.
        assert_eq!(backend.upsert_batches(Collection::Tasks), 0);
        assert_eq!(backend.upsert_batches(Collection::Habits), 0);
        assert_eq!(backend.upsert_batches(Collection::Profile), 1);
        assert!(!report.pushed.contains_key(&Collection::Tasks));
    }

    #[tokio::test]
    async fn one_failed_collection_does_not_block_others() {
        let backend = MockBackend::new();
        backend
            .fail_upsert
            .lock()
            .unwrap()
            .insert(Collection::Tasks);

        let mut state = AppState::new();
        state.add_task(Task::new("will fail"));
        state.add_habit(Habit::new("will succeed"));

        let report = push_state(&backend, "u1", &state).await;

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, Collection::Tasks);
        assert_eq!(report.pushed[&Collection::Habits], 1);
        assert_eq!(backend.rows_for(Collection::Habits).len(), 1);
    }

    #[tokio::test]
    async fn upsert_replaces_remote_row_with_same_id() {
        let backend = MockBackend::new();
        let mut state = AppState::new();
        let mut task = Task::new("first title");
        task.id = "t1".to_string();
        state.add_task(task);

        push_state(&backend, "u1", &state).await;
        state.tasks[0].title = "second title".to_string();
        push_state(&backend, "u1", &state).await;

        let rows = backend.rows_for(Collection::Tasks);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "second title");
    }

    #[tokio::test]
    async fn delete_entity_issues_a_single_remote_delete() {
        let backend = MockBackend::new();
        backend.seed(
            Collection::Tasks,
            vec![serde_json::json!({"id": "t1", "title": "x"})],
        );

        delete_entity(&backend, "u1", Collection::Tasks, "t1")
            .await
            .unwrap();

        assert!(backend.rows_for(Collection::Tasks).is_empty());
        assert_eq!(
            backend
                .delete_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }
}
