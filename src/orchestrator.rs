//! Sync orchestrator
//!
//! Owns the sync lifecycle for one authenticated session:
//!
//! - `hydrate` runs the cloud loader at most once per session (one-shot
//!   guard); pushing is refused until it has run, so an empty local session
//!   can never clobber remote data.
//! - `mark_dirty` is the explicit signal that a tracked collection mutated;
//!   each call restarts the quiet window.
//! - `tick` is the scheduler entry point: it pushes only when hydrated,
//!   dirty, past the quiet window, structurally changed since the last
//!   successful push, and no push is already in flight. A trigger that
//!   arrives while a push is in flight is dropped, not queued; a dirty
//!   mark that arrives while a push is in flight survives it, so the
//!   post-snapshot mutation is picked up by the next cycle.
//! - `sync_now` bypasses the quiet window and the fingerprint
//!   short-circuit but still respects the hydration and in-flight guards.
//! - `reset` clears the one-shot flag, the dirty state, and the fingerprint
//!   memory on sign-out; an already-in-flight request completes or fails on
//!   its own (no cancellation).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::backend::SyncBackend;
use crate::fingerprint::fingerprint;
use crate::loader::{fetch_snapshot, merge_snapshot, LoadReport};
use crate::pusher::{push_state, PushReport};
use crate::store::AppState;

/// Default quiet window between the last mutation and a scheduled push.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);
/// Default scheduler period for [`SyncOrchestrator::run`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Result of a hydration attempt.
#[derive(Debug)]
pub enum HydrateOutcome {
    Completed(LoadReport),
    /// One-shot guard: this session already hydrated.
    AlreadyHydrated,
}

/// Result of a push attempt. Skips are values, not log lines, so callers
/// and tests can assert on them.
#[derive(Debug)]
pub enum PushOutcome {
    Completed(PushReport),
    /// Never push before at least one load has occurred.
    NotHydrated,
    /// Dropped: a previous push is still in flight.
    AlreadyInFlight,
    /// Structural fingerprint unchanged since the last successful push.
    Clean,
    /// Nothing was marked dirty since the last push.
    NotDirty,
    /// The quiet window has not elapsed yet.
    QuietWindow,
}

/// Sync state surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub hydrated: bool,
    pub in_flight: bool,
    pub dirty: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    hydrated: bool,
    dirty_since: Option<Instant>,
    last_fingerprint: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
}

/// Orchestrates loader and pusher over an injected backend and a shared
/// store.
pub struct SyncOrchestrator {
    backend: Arc<dyn SyncBackend>,
    store: Arc<tokio::sync::Mutex<AppState>>,
    owner: String,
    debounce: Duration,
    inner: Mutex<Inner>,
    in_flight: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        backend: Arc<dyn SyncBackend>,
        store: Arc<tokio::sync::Mutex<AppState>>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            owner: owner.into(),
            debounce: DEFAULT_DEBOUNCE,
            inner: Mutex::new(Inner::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Hydrate the local store from the remote store, once per session.
    ///
    /// The one-shot flag is taken before the network round trip, so a
    /// concurrent second call observes `AlreadyHydrated` rather than
    /// doubling the reads. A hydrate that only hits collection-level read
    /// errors still counts as hydrated (fail-open).
    pub async fn hydrate(&self) -> HydrateOutcome {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.hydrated {
                return HydrateOutcome::AlreadyHydrated;
            }
            inner.hydrated = true;
        }

        let snapshot = fetch_snapshot(self.backend.as_ref(), &self.owner).await;
        let report = {
            let mut store = self.store.lock().await;
            merge_snapshot(&mut store, snapshot)
        };

        tracing::info!(
            merged = report.merged.values().sum::<usize>(),
            skipped_rows = report.skipped_rows,
            failed_collections = report.errors.len(),
            "Cloud hydration complete"
        );
        HydrateOutcome::Completed(report)
    }

    /// Signal that a tracked collection mutated. Restarts the quiet window.
    pub fn mark_dirty(&self) {
        self.inner.lock().unwrap().dirty_since = Some(Instant::now());
    }

    /// Scheduler entry point; call periodically (or via [`Self::run`]).
    pub async fn tick(&self) -> PushOutcome {
        {
            let inner = self.inner.lock().unwrap();
            match inner.dirty_since {
                None => return PushOutcome::NotDirty,
                Some(since) if since.elapsed() < self.debounce => {
                    return PushOutcome::QuietWindow;
                }
                Some(_) => {}
            }
        }
        self.push(false).await
    }

    /// Manual trigger: bypasses the quiet window and the fingerprint
    /// short-circuit, still requires hydration and drops on overlap.
    pub async fn sync_now(&self) -> PushOutcome {
        self.push(true).await
    }

    async fn push(&self, force: bool) -> PushOutcome {
        if !self.inner.lock().unwrap().hydrated {
            return PushOutcome::NotHydrated;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return PushOutcome::AlreadyInFlight;
        }

        let outcome = self.push_guarded(force).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn push_guarded(&self, force: bool) -> PushOutcome {
        // Captured before the snapshot: a mark that lands after this point
        // belongs to a mutation the snapshot may not contain, so it must
        // survive this push and drive the next cycle.
        let dirty_at_snapshot = self.inner.lock().unwrap().dirty_since;
        let snapshot = self.store.lock().await.clone();

        let digest = match fingerprint(&snapshot) {
            Ok(digest) => Some(digest),
            Err(error) => {
                // Treat an unhashable state as changed rather than stuck.
                tracing::warn!(%error, "Fingerprint failed, pushing anyway");
                None
            }
        };

        if !force {
            let mut inner = self.inner.lock().unwrap();
            if digest.is_some() && inner.last_fingerprint == digest {
                if inner.dirty_since == dirty_at_snapshot {
                    inner.dirty_since = None;
                }
                return PushOutcome::Clean;
            }
        }

        let report = push_state(self.backend.as_ref(), &self.owner, &snapshot).await;

        let mut inner = self.inner.lock().unwrap();
        if report.is_clean() {
            inner.last_fingerprint = digest;
            inner.last_synced_at = Some(Utc::now());
            if inner.dirty_since == dirty_at_snapshot {
                inner.dirty_since = None;
            }
        }
        // On failure the fingerprint memory is left as-is, so the next
        // cycle sees a difference and retries.
        PushOutcome::Completed(report)
    }

    /// Sign-out: clear the one-shot flag, dirty state, and fingerprint
    /// memory. In-flight requests are not cancelled.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::default();
        tracing::info!("Sync state reset");
    }

    pub fn status(&self) -> SyncStatus {
        let inner = self.inner.lock().unwrap();
        SyncStatus {
            hydrated: inner.hydrated,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            dirty: inner.dirty_since.is_some(),
            last_synced_at: inner.last_synced_at,
        }
    }

    /// Drive `tick` on a fixed period until `shutdown` resolves.
    pub async fn run(&self, poll_interval: Duration, shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut shutdown = shutdown;
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}
