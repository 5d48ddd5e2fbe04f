//! Resumable fetch pipeline
//!
//! A generic engine that:
//! 1. Restores its store from a snapshot, or starts a fresh one
//! 2. Fetches every pending key under a `FetchGate`
//! 3. Feeds each result back into the store, which may reveal more keys
//! 4. Finishes once every key reachable from the initial set has resolved
//!
//! The store is owned by the task driving the run. Fetch tasks never touch
//! it; they only return `(key, output)` pairs, so every store mutation
//! (including growth) happens in one place, one result at a time.
//!
//! If the run stops for any reason other than success (fetch error, parse
//! error, interrupt, panic, or the run future being dropped) the store is
//! written to the snapshot on the way out.

use crate::crawler::gate::FetchGate;
use crate::crawler::shutdown::Shutdown;
use crate::storage::{JsonSnapshot, SnapshotStore};
use crate::HarvestError;
use futures::future::BoxFuture;
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tokio::task::JoinSet;

/// Resolved and known key counts, for progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u64,
    pub total: u64,
}

/// One key space a pipeline can harvest
pub trait Harvest: 'static {
    /// Unit of fetching
    type Key: Clone + fmt::Debug + Send + 'static;

    /// What one fetch produces
    type Output: Send + 'static;

    /// Accumulated state, persisted as the snapshot
    type Store: Serialize + DeserializeOwned;

    /// Name used in log messages
    fn name(&self) -> &'static str;

    /// Store for a run with no snapshot
    fn initial_store(&self) -> Self::Store;

    /// Keys the store still needs fetched
    fn pending(&self, store: &Self::Store) -> Vec<Self::Key>;

    /// Starts fetching `key`; must not borrow `self`
    fn fetch(&self, key: Self::Key) -> BoxFuture<'static, Result<Self::Output, HarvestError>>;

    /// Records a fetch result and returns the keys it newly revealed
    fn resolve(
        &self,
        store: &mut Self::Store,
        key: Self::Key,
        output: Self::Output,
    ) -> Result<Vec<Self::Key>, HarvestError>;

    fn progress(&self, store: &Self::Store) -> Progress;
}

/// A single run of a `Harvest` against its snapshot
pub struct Pipeline<H: Harvest, S = JsonSnapshot> {
    harvest: H,
    snapshot: S,
    gate: FetchGate,
    shutdown: Shutdown,
    progress: ProgressBar,
}

impl<H, S> Pipeline<H, S>
where
    H: Harvest,
    S: SnapshotStore<H::Store>,
{
    pub fn new(harvest: H, snapshot: S, gate: FetchGate, shutdown: Shutdown) -> Self {
        Self {
            harvest,
            snapshot,
            gate,
            shutdown,
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports progress on `bar` instead of a hidden bar
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Runs to completion and returns the fully resolved store
    ///
    /// On failure the partial store is written to the snapshot and the
    /// original error is returned unchanged. The snapshot is never deleted
    /// here; that is the job's decision once every phase has succeeded.
    pub async fn run(self) -> Result<H::Store, HarvestError> {
        let Pipeline {
            harvest,
            snapshot,
            gate,
            mut shutdown,
            progress,
        } = self;

        let mut store = match snapshot.load()? {
            Some(store) => {
                let restored = harvest.progress(&store);
                tracing::info!(
                    "{}: found {} existing entries out of a known {} entries",
                    harvest.name(),
                    restored.done,
                    restored.total
                );
                store
            }
            None => harvest.initial_store(),
        };

        let fetched = {
            let mut guard = PersistOnExit::new(&mut store, &snapshot, harvest.name());
            let outcome = drive(&harvest, &gate, &mut shutdown, &progress, guard.store()).await;
            if outcome.is_ok() {
                guard.disarm();
            }
            outcome?
        };

        progress.finish_and_clear();
        tracing::info!(
            "{}: complete after {} fetches (peak concurrency {}/{})",
            harvest.name(),
            fetched,
            gate.peak(),
            gate.capacity()
        );
        Ok(store)
    }
}

/// Fetches until no task remains, spawning newly revealed keys as it goes
async fn drive<H: Harvest>(
    harvest: &H,
    gate: &FetchGate,
    shutdown: &mut Shutdown,
    progress: &ProgressBar,
    store: &mut H::Store,
) -> Result<usize, HarvestError> {
    let mut tasks = JoinSet::new();
    for key in harvest.pending(store) {
        spawn_fetch(&mut tasks, harvest, gate, key);
    }
    report(progress, harvest.progress(store));

    let mut fetched = 0;
    while !tasks.is_empty() {
        // Returning early drops `tasks`, which aborts every in-flight fetch.
        let joined = tokio::select! {
            biased;
            _ = shutdown.recv() => return Err(HarvestError::Interrupted),
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else { break };

        let (key, output) = joined.map_err(|e| HarvestError::Task(e.to_string()))??;
        fetched += 1;

        for revealed in harvest.resolve(store, key, output)? {
            spawn_fetch(&mut tasks, harvest, gate, revealed);
        }
        report(progress, harvest.progress(store));
    }

    Ok(fetched)
}

type FetchTasks<H> =
    JoinSet<Result<(<H as Harvest>::Key, <H as Harvest>::Output), HarvestError>>;

fn spawn_fetch<H: Harvest>(tasks: &mut FetchTasks<H>, harvest: &H, gate: &FetchGate, key: H::Key) {
    let fetch = harvest.fetch(key.clone());
    let gate = gate.clone();
    tasks.spawn(async move {
        let _permit = gate.acquire().await?;
        tracing::trace!("fetching {:?}", key);
        let output = fetch.await?;
        Ok((key, output))
    });
}

fn report(bar: &ProgressBar, progress: Progress) {
    bar.set_length(progress.total);
    bar.set_position(progress.done);
}

/// Writes the store to its snapshot when dropped while still armed
struct PersistOnExit<'a, T, S>
where
    S: SnapshotStore<T>,
{
    store: &'a mut T,
    snapshot: &'a S,
    name: &'static str,
    armed: bool,
}

impl<'a, T, S> PersistOnExit<'a, T, S>
where
    S: SnapshotStore<T>,
{
    fn new(store: &'a mut T, snapshot: &'a S, name: &'static str) -> Self {
        Self {
            store,
            snapshot,
            name,
            armed: true,
        }
    }

    fn store(&mut self) -> &mut T {
        &mut *self.store
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<T, S> Drop for PersistOnExit<'_, T, S>
where
    S: SnapshotStore<T>,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!("{}: writing snapshot {}", self.name, self.snapshot.location());
        if let Err(e) = self.snapshot.save(&*self.store) {
            tracing::error!("{}: failed to write snapshot: {}", self.name, e);
        }
    }
}
