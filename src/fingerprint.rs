//! Change detection
//!
//! A structural SHA-256 digest over the canonical JSON serialization of
//! every synced collection. Any field edit changes the digest, so an
//! unchanged digest is safe to use as a push short-circuit (the earlier
//! count-based fingerprint could alias two different states with equal
//! item counts and suppress a needed sync).

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::store::AppState;

#[derive(Serialize)]
struct SyncedView<'a> {
    tasks: &'a [crate::models::Task],
    habits: &'a [crate::models::Habit],
    goals: &'a [crate::models::Goal],
    plans: &'a [crate::models::Plan],
    focus_sessions: &'a [crate::models::FocusSession],
    rewards: &'a [crate::models::Reward],
    profile: &'a crate::models::UserProfile,
}

/// Hex-encoded structural digest of the synced collections.
pub fn fingerprint(state: &AppState) -> Result<String, serde_json::Error> {
    let view = SyncedView {
        tasks: &state.tasks,
        habits: &state.habits,
        goals: &state.goals,
        plans: &state.plans,
        focus_sessions: &state.focus_sessions,
        rewards: &state.rewards,
        profile: &state.profile,
    };

    let bytes = serde_json::to_vec(&view)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
