//! Fetch gate: a counting permit bounding concurrent outbound requests
//!
//! One gate is created per pipeline run; the crawl and the enrichment lookup
//! never share one. Admission order is whatever the semaphore provides; only
//! the cap is guaranteed.

use crate::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrency gate shared by all fetches of one pipeline run
#[derive(Debug, Clone)]
pub struct FetchGate {
    semaphore: Arc<Semaphore>,
    counters: Arc<GateCounters>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct GateCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Held for the duration of one fetch; releases the gate on drop
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl FetchGate {
    /// Creates a gate admitting at most `capacity` holders (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(GateCounters::default()),
            capacity,
        }
    }

    /// Waits for a free permit
    pub async fn acquire(&self) -> Result<GatePermit, HarvestError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| HarvestError::Interrupted)?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permits_release_on_drop() {
        let gate = FetchGate::new(2);
        let first = gate.acquire().await.unwrap();
        let second = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        assert_eq!(gate.in_flight(), 1);
        drop(second);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.peak(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised_to_one() {
        let gate = FetchGate::new(0);
        assert_eq!(gate.capacity(), 1);
        let _permit = gate.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_cap_holds_under_contention() {
        let gate = FetchGate::new(3);
        let mut handles = Vec::new();

        for _ in 0..20 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                assert!(gate.in_flight() <= 3);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
    }
}
