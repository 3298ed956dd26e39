//! Cancelable, reschedulable deferred tasks keyed by id.
//!
//! Time is passed in explicitly; nothing here reads a clock. The owner calls
//! [`DeferredTasks::poll`] to collect tasks whose quiet period has elapsed.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    due: Instant,
    task: T,
}

/// Per-key debounced tasks.
#[derive(Debug, Clone)]
pub struct DeferredTasks<K, T> {
    delay: Duration,
    pending: HashMap<K, Pending<T>>,
}

impl<K: Eq + Hash + Clone, T> DeferredTasks<K, T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: HashMap::new() }
    }

    /// Schedule `task` under `key`, replacing any pending task for that key.
    pub fn schedule(&mut self, key: K, task: T, now: Instant) {
        self.pending.insert(key, Pending { due: now + self.delay, task });
    }

    /// Push back the deadline of a pending task, keeping the task itself.
    /// Returns false if nothing is pending under `key`.
    pub fn reschedule(&mut self, key: &K, now: Instant) -> bool {
        match self.pending.get_mut(key) {
            Some(pending) => {
                pending.due = now + self.delay;
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self, key: &K) -> Option<T> {
        self.pending.remove(key).map(|p| p.task)
    }

    /// Drop every pending task without running it. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Remove and return every pending task, earliest deadline first.
    pub fn drain(&mut self) -> Vec<(K, T)> {
        let mut all: Vec<(K, Pending<T>)> = self.pending.drain().collect();
        all.sort_by_key(|(_, p)| p.due);
        all.into_iter().map(|(k, p)| (k, p.task)).collect()
    }

    /// Remove and return the tasks due at `now`, earliest deadline first.
    pub fn poll(&mut self, now: Instant) -> Vec<(K, T)> {
        let due: Vec<K> = self.pending.iter().filter(|(_, p)| p.due <= now).map(|(k, _)| k.clone()).collect();
        let mut fired: Vec<(K, Pending<T>)> =
            due.into_iter().filter_map(|k| self.pending.remove(&k).map(|p| (k, p))).collect();
        fired.sort_by_key(|(_, p)| p.due);
        fired.into_iter().map(|(k, p)| (k, p.task)).collect()
    }

    /// Remove and return the pending tasks matching `take`, due or not,
    /// earliest deadline first.
    pub fn take_where(&mut self, mut take: impl FnMut(&K, &T) -> bool) -> Vec<(K, T)> {
        let keys: Vec<K> = self.pending.iter().filter(|(k, p)| take(*k, &p.task)).map(|(k, _)| k.clone()).collect();
        let mut taken: Vec<(K, Pending<T>)> =
            keys.into_iter().filter_map(|k| self.pending.remove(&k).map(|p| (k, p))).collect();
        taken.sort_by_key(|(_, p)| p.due);
        taken.into_iter().map(|(k, p)| (k, p.task)).collect()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_fires_after_quiet_period() {
        let start = Instant::now();
        let mut tasks = DeferredTasks::new(DELAY);
        tasks.schedule("a", 1, start);
        assert!(tasks.poll(start + Duration::from_millis(499)).is_empty());
        assert_eq!(tasks.poll(start + DELAY), vec![("a", 1)]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_reschedule_keeps_task_and_extends_deadline() {
        let start = Instant::now();
        let mut tasks = DeferredTasks::new(DELAY);
        tasks.schedule("a", 1, start);
        assert!(tasks.reschedule(&"a", start + Duration::from_millis(400)));
        assert_eq!(tasks.next_due(), Some(start + Duration::from_millis(900)));
        assert!(tasks.poll(start + DELAY).is_empty());
        assert!(tasks.is_pending(&"a"));
        assert_eq!(tasks.poll(start + Duration::from_millis(900)), vec![("a", 1)]);
        assert!(!tasks.reschedule(&"a", start));
    }

    #[test]
    fn test_cancel_all_prevents_firing() {
        let start = Instant::now();
        let mut tasks = DeferredTasks::new(DELAY);
        tasks.schedule(1u32, "x", start);
        tasks.schedule(2u32, "y", start);
        assert_eq!(tasks.cancel_all(), 2);
        assert!(tasks.poll(start + DELAY * 2).is_empty());
    }

    #[test]
    fn test_take_where_ignores_deadline() {
        let start = Instant::now();
        let mut tasks = DeferredTasks::new(DELAY);
        tasks.schedule("keep", 1, start);
        tasks.schedule("take", 2, start + Duration::from_secs(10));
        assert_eq!(tasks.take_where(|_, t| *t == 2), vec![("take", 2)]);
        assert!(tasks.is_pending(&"keep"));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_poll_orders_by_deadline() {
        let start = Instant::now();
        let mut tasks = DeferredTasks::new(DELAY);
        tasks.schedule("late", 2, start + Duration::from_millis(100));
        tasks.schedule("early", 1, start);
        let fired: Vec<i32> = tasks.poll(start + DELAY * 2).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec![1, 2]);
    }
}
