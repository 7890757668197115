//! Search-as-you-type state: debouncing and last-write-wins results
//!
//! Input is debounced so only the query left standing after a quiet period
//! is evaluated. Evaluations that were already running when a newer query
//! arrived are not cancelled; their results are dropped on completion
//! because their ticket is stale.

use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use super::aggregate::SearchResultGroup;
use super::terms::SearchTerms;

/// Quiet period before a typed query is evaluated
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Handle for one issued query evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    terms: SearchTerms,
}

impl SearchTicket {
    pub fn terms(&self) -> &SearchTerms {
        &self.terms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Search state owned by the contact-list controller
#[derive(Debug, Default)]
pub struct SearchSession {
    generation: u64,
    active: Option<SearchTerms>,
    results: Vec<SearchResultGroup>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start evaluating `raw`
    ///
    /// Every call supersedes earlier tickets. An empty query clears the
    /// session and returns `None`.
    pub fn begin(&mut self, raw: &str) -> Option<SearchTicket> {
        self.generation += 1;
        let Some(terms) = SearchTerms::parse(raw) else {
            self.active = None;
            self.results.clear();
            return None;
        };
        self.active = Some(terms.clone());
        Some(SearchTicket {
            generation: self.generation,
            terms,
        })
    }

    /// Record results for `ticket`
    ///
    /// Returns `false` (and keeps the current results) when a newer query
    /// was issued after this ticket.
    pub fn complete(&mut self, ticket: &SearchTicket, results: Vec<SearchResultGroup>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale results for {:?} (generation {} < {})",
                ticket.terms.query(),
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.results = results;
        true
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Drop the query and results, invalidating outstanding tickets
    pub fn clear(&mut self) {
        self.generation += 1;
        self.active = None;
        self.results.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn terms(&self) -> Option<&SearchTerms> {
        self.active.as_ref()
    }

    pub fn results(&self) -> &[SearchResultGroup] {
        &self.results
    }
}

/// Cancellable delayed task
///
/// Each [`schedule`](Debouncer::schedule) aborts the task still waiting from
/// the previous call. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the quiet period unless superseded first
    pub fn schedule<F, Fut>(&mut self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        }));
    }

    /// Abort the pending task, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
