//! Coalescing of concurrent identical requests.
//!
//! The [`Coalescer`] lets concurrent calls that share a key ride on a single
//! execution of the underlying operation. The first caller (the leader) runs
//! it; callers arriving while it is in flight wait and receive a clone of the
//! leader's output.
//!
//! # Cancellation
//!
//! If the leader's future is dropped before it finishes, the in-flight entry
//! is abandoned and every waiting caller retries, one of them becoming the new
//! leader. Waiters never hang on a cancelled leader.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, OnceCell};

/// Shared state for one in-flight operation.
struct Flight<V> {
    /// `Some` once the leader finished, `None` if it was dropped first.
    outcome: OnceCell<Option<V>>,
    notify: Notify,
}

pub struct Coalescer<K, V> {
    in_flight: Mutex<HashMap<K, Arc<Flight<V>>>>,
}

impl<K, V> Coalescer<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` for `key`, or join the run already in flight for it.
    pub async fn run<F, Fut>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let flight = loop {
            let (flight, is_leader) = self.join(&key);
            if is_leader {
                break flight;
            }
            if let Some(value) = Self::wait(&flight).await {
                return value;
            }
            // Leader was dropped; go around and try to lead.
        };

        let guard = LeaderGuard {
            coalescer: self,
            key,
            flight,
            finished: false,
        };
        let value = f().await;
        guard.finish(value.clone());
        value
    }

    /// Number of operations currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    fn join(&self, key: &K) -> (Arc<Flight<V>>, bool) {
        let mut map = self.in_flight.lock().unwrap();
        if let Some(flight) = map.get(key) {
            return (Arc::clone(flight), false);
        }
        let flight = Arc::new(Flight {
            outcome: OnceCell::new(),
            notify: Notify::new(),
        });
        map.insert(key.clone(), Arc::clone(&flight));
        (flight, true)
    }

    async fn wait(flight: &Flight<V>) -> Option<V> {
        loop {
            // Register before checking so a completion in between is not missed
            let notified = flight.notify.notified();
            if let Some(outcome) = flight.outcome.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }

    fn settle(&self, key: &K, flight: &Arc<Flight<V>>, outcome: Option<V>) {
        let _ = flight.outcome.set(outcome);
        {
            let mut map = self.in_flight.lock().unwrap();
            if map.get(key).is_some_and(|current| Arc::ptr_eq(current, flight)) {
                map.remove(key);
            }
        }
        flight.notify.notify_waiters();
    }
}

impl<K, V> Default for Coalescer<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Settles the flight when the leader finishes or is dropped.
struct LeaderGuard<'a, K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send + Sync,
{
    coalescer: &'a Coalescer<K, V>,
    key: K,
    flight: Arc<Flight<V>>,
    finished: bool,
}

impl<K, V> LeaderGuard<'_, K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send + Sync,
{
    fn finish(mut self, value: V) {
        self.finished = true;
        self.coalescer.settle(&self.key, &self.flight, Some(value));
    }
}

impl<K, V> Drop for LeaderGuard<'_, K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send + Sync,
{
    fn drop(&mut self) {
        if !self.finished {
            self.coalescer.settle(&self.key, &self.flight, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_single_call() {
        let coalescer: Coalescer<String, i32> = Coalescer::new();

        let result = coalescer.run("key".to_string(), || async { 42 }).await;

        assert_eq!(result, 42);
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_runs_once() {
        let coalescer: Arc<Coalescer<String, i32>> = Arc::new(Coalescer::new());
        let call_count = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..5 {
            let coalescer = Arc::clone(&coalescer);
            let call_count = Arc::clone(&call_count);

            handles.push(tokio::spawn(async move {
                coalescer
                    .run("same-key".to_string(), || async move {
                        call_count.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        42
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_run_separately() {
        let coalescer: Arc<Coalescer<String, i32>> = Arc::new(Coalescer::new());
        let call_count = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for i in 0..5 {
            let coalescer = Arc::clone(&coalescer);
            let call_count = Arc::clone(&call_count);
            let key = format!("key-{}", i);

            handles.push(tokio::spawn(async move {
                coalescer
                    .run(key, || async move {
                        call_count.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(50)).await;
                        i
                    })
                    .await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), i as i32);
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let coalescer: Coalescer<&'static str, u32> = Coalescer::new();
        let call_count = AtomicU32::new(0);

        for _ in 0..3 {
            coalescer
                .run("key", || async { call_count.fetch_add(1, Ordering::SeqCst) })
                .await;
        }

        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dropped_leader_hands_over_to_waiter() {
        let coalescer: Arc<Coalescer<String, &'static str>> = Arc::new(Coalescer::new());

        let leader = {
            let coalescer = Arc::clone(&coalescer);
            tokio::spawn(async move {
                coalescer
                    .run("key".to_string(), || async {
                        sleep(Duration::from_secs(60)).await;
                        "leader"
                    })
                    .await
            })
        };
        while coalescer.in_flight_count() == 0 {
            tokio::task::yield_now().await;
        }

        let follower = {
            let coalescer = Arc::clone(&coalescer);
            tokio::spawn(async move {
                coalescer
                    .run("key".to_string(), || async { "follower" })
                    .await
            })
        };
        sleep(Duration::from_millis(20)).await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        assert_eq!(follower.await.unwrap(), "follower");
        assert_eq!(coalescer.in_flight_count(), 0);
    }
}
