//! Debounce Module
//!
//! Cancel-previous-on-new-input scheduling for classifier calls: a single
//! pending invocation, strictly latest-wins, no queueing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::warn;

use super::client::Categorize;
use super::{DEFAULT_QUIET_PERIOD, MIN_SUGGEST_LEN};

/// Debounced wrapper around a [`Categorize`] implementation
///
/// Each `submit` overwrites the single pending-invocation slot and restarts
/// the quiet-period timer; whatever was pending is abandoned entirely. A
/// call already in flight is not interrupted, but its result is applied only
/// if its generation is still current and the suggester has not been closed
/// - the guard against writing a stale suggestion into a field that no
/// longer exists.
pub struct DebouncedSuggester {
    client: Arc<dyn Categorize + Send + Sync>,
    quiet_period: Duration,
    min_len: usize,
    generation: Arc<AtomicU64>,
    open: Arc<AtomicBool>,
    slot: Arc<Mutex<Option<String>>>,
}

impl DebouncedSuggester {
    /// Creates a suggester with the default quiet period and length threshold
    pub fn new(client: Arc<dyn Categorize + Send + Sync>) -> Self {
        Self::with_timing(client, DEFAULT_QUIET_PERIOD, MIN_SUGGEST_LEN)
    }

    /// Creates a suggester with explicit timing, mainly for tests
    pub fn with_timing(
        client: Arc<dyn Categorize + Send + Sync>,
        quiet_period: Duration,
        min_len: usize,
    ) -> Self {
        Self {
            client,
            quiet_period,
            min_len,
            generation: Arc::new(AtomicU64::new(0)),
            open: Arc::new(AtomicBool::new(true)),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Feeds the latest description text
    ///
    /// Ignored unless the description length exceeds the threshold. Returns
    /// immediately; the suggestion lands in [`Self::latest`] after the quiet
    /// period, unless a newer submit supersedes it first. Failures are
    /// logged and leave the slot untouched; there are no retries.
    pub fn submit(&self, description: &str) {
        if description.chars().count() <= self.min_len {
            return;
        }

        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let description = description.to_string();
        let client = Arc::clone(&self.client);
        let generation = Arc::clone(&self.generation);
        let open = Arc::clone(&self.open);
        let slot = Arc::clone(&self.slot);
        let quiet_period = self.quiet_period;

        thread::spawn(move || {
            thread::sleep(quiet_period);
            if generation.load(Ordering::SeqCst) != my_generation {
                // superseded during the quiet period
                return;
            }

            let result = client.categorize(&description);

            if generation.load(Ordering::SeqCst) != my_generation
                || !open.load(Ordering::SeqCst)
            {
                // stale by the time the classifier answered
                return;
            }

            match result {
                Ok(category) => {
                    *slot.lock().expect("suggestion slot poisoned") = Some(category);
                }
                Err(err) => warn!(%err, "category suggestion failed"),
            }
        });
    }

    /// Most recent successfully applied suggestion
    pub fn latest(&self) -> Option<String> {
        self.slot.lock().expect("suggestion slot poisoned").clone()
    }

    /// Marks the consumer dismantled
    ///
    /// In-flight classifier calls are not interrupted; their results are
    /// discarded instead of applied.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}
