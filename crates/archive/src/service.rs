//! ArchiveService facade
//!
//! Wraps storage, search, conversation rendering and in-conversation
//! navigation behind one stateful object owned by the UI controller. The
//! search session and the navigator live here rather than in globals, so
//! every open conversation gets a clean navigator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::ArchiveSettings;
use crate::error::{ArchiveError, ArchiveResult};
use crate::models::{Counterparty, Profile};
use crate::navigator::{NavigationUpdate, Navigator};
use crate::query::{
    ContactSummary, Conversation, SearchResultRow, list_contacts, local_today, search_result_rows,
};
use crate::search::{
    DEFAULT_DEBOUNCE, Debouncer, SearchContext, SearchResultGroup, SearchSession, SearchTicket,
    search_archive,
};
use crate::storage::{
    ArchiveScope, ArchiveStore, ProfileDirectory, ProfileStore, SqliteArchiveStore,
};

/// Main service object for archive browsing
pub struct ArchiveService {
    store: Arc<dyn ArchiveStore>,
    profiles: Arc<dyn ProfileStore>,
    scope: ArchiveScope,
    data_root: PathBuf,
    search_limit: usize,
    debounce: Duration,
    session: SearchSession,
    conversation: Option<Conversation>,
    navigator: Navigator,
}

impl ArchiveService {
    /// Open the archive described by `settings`
    pub fn open(settings: &ArchiveSettings) -> ArchiveResult<Self> {
        if !settings.database_path.exists() {
            return Err(ArchiveError::data_unavailable(format!(
                "Archive database not found: {}",
                settings.database_path.display()
            )));
        }
        let store = SqliteArchiveStore::open(&settings.database_path)?;
        let profiles = ProfileDirectory::load(&settings.profiles_path());

        let mut service = Self::new(
            Arc::new(store),
            Arc::new(profiles),
            settings.scope(),
            settings.data_root.clone(),
        );
        service.search_limit = settings.search_limit;
        service.debounce = settings.debounce();
        info!("Archive opened for {}", settings.owner);
        Ok(service)
    }

    pub fn new(
        store: Arc<dyn ArchiveStore>,
        profiles: Arc<dyn ProfileStore>,
        scope: ArchiveScope,
        data_root: PathBuf,
    ) -> Self {
        Self {
            store,
            profiles,
            scope,
            data_root,
            search_limit: crate::search::SEARCH_LIMIT,
            debounce: DEFAULT_DEBOUNCE,
            session: SearchSession::new(),
            conversation: None,
            navigator: Navigator::new(),
        }
    }

    pub fn scope(&self) -> &ArchiveScope {
        &self.scope
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn profile(&self, identity: &str) -> Profile {
        self.profiles.get_profile(identity)
    }

    // ========================================================================
    // Contact List
    // ========================================================================

    /// Contacts in scope, newest conversation first
    pub fn list_contacts(&self) -> ArchiveResult<Vec<ContactSummary>> {
        Ok(list_contacts(
            self.store.as_ref(),
            self.profiles.as_ref(),
            &self.scope,
            &self.data_root,
        )?)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Run a search to completion and return its result rows
    ///
    /// A blank query clears the search and returns no rows.
    pub fn search(&mut self, query: &str) -> ArchiveResult<Vec<SearchResultRow>> {
        let Some(ticket) = self.begin_search(query) else {
            return Ok(Vec::new());
        };
        let groups = search_archive(
            self.store.as_ref(),
            &self.scope,
            ticket.terms(),
            self.search_limit,
        )?;
        self.complete_search(&ticket, groups);
        Ok(self.search_results())
    }

    /// Issue a ticket for `query`, superseding any outstanding one
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        self.session.begin(query)
    }

    /// Accept results for `ticket` unless a newer query was issued since
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        groups: Vec<SearchResultGroup>,
    ) -> bool {
        self.session.complete(ticket, groups)
    }

    /// Result rows for the current query
    pub fn search_results(&self) -> Vec<SearchResultRow> {
        match self.session.terms() {
            Some(terms) => search_result_rows(
                self.session.results(),
                terms,
                self.profiles.as_ref(),
                &self.data_root,
            ),
            None => Vec::new(),
        }
    }

    pub fn is_searching(&self) -> bool {
        self.session.is_active()
    }

    pub fn clear_search(&mut self) {
        self.session.clear();
    }

    /// Shared store handle for off-thread evaluation
    pub fn store(&self) -> Arc<dyn ArchiveStore> {
        Arc::clone(&self.store)
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    /// Debouncer for typed queries, using the configured quiet period
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::new(self.debounce)
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    /// Open the conversation with `counterparty`
    ///
    /// Any previous conversation and its navigation state are discarded
    /// first. With a search context the bodies are highlighted and the
    /// navigator is set up; the returned update (if any) is the initial
    /// current occurrence.
    pub fn open_conversation(
        &mut self,
        counterparty: &str,
        search: Option<SearchContext>,
        now: Instant,
    ) -> ArchiveResult<Option<NavigationUpdate>> {
        self.close_conversation();
        if counterparty.trim().is_empty() {
            return Err(ArchiveError::InvalidArgument {
                message: "counterparty must not be empty".to_string(),
            });
        }

        let counterparty = Counterparty::new(counterparty);
        let messages = self.store.list_messages(&self.scope, &counterparty)?;
        debug!(
            "Opening conversation with {} ({} messages)",
            counterparty,
            messages.len()
        );

        let conversation = Conversation::build(
            counterparty,
            &messages,
            &self.scope.owner,
            search,
            local_today(),
        );
        let update = self.navigator.open(&conversation, now);
        self.conversation = Some(conversation);
        Ok(update)
    }

    /// Drop the open conversation and reset navigation
    pub fn close_conversation(&mut self) {
        self.navigator.deactivate();
        self.conversation = None;
    }

    /// Leave search mode in the open conversation
    ///
    /// Navigation is reset and the conversation is rebuilt without
    /// highlights.
    pub fn dismiss_search(&mut self) -> ArchiveResult<()> {
        let Some(conversation) = self.conversation.take() else {
            self.navigator.deactivate();
            return Ok(());
        };
        let counterparty = conversation.counterparty.as_str().to_string();
        self.open_conversation(&counterparty, None, Instant::now())?;
        Ok(())
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn next_occurrence(&mut self) -> Option<NavigationUpdate> {
        self.navigator.next()
    }

    pub fn previous_occurrence(&mut self) -> Option<NavigationUpdate> {
        self.navigator.previous()
    }

    /// Drop the arrival emphasis once expired; returns the affected bubble
    pub fn expire_arrival(&mut self, now: Instant) -> Option<usize> {
        self.navigator.expire_arrival(now)
    }
}

/// Evaluate a search ticket on the blocking pool
///
/// The ticket is handed back with the groups so the caller can offer both
/// to [`ArchiveService::complete_search`], which drops stale results.
pub async fn evaluate_search(
    store: Arc<dyn ArchiveStore>,
    scope: ArchiveScope,
    ticket: SearchTicket,
    limit: usize,
) -> ArchiveResult<(SearchTicket, Vec<SearchResultGroup>)> {
    let joined = tokio::task::spawn_blocking(move || {
        search_archive(store.as_ref(), &scope, ticket.terms(), limit).map(|groups| (ticket, groups))
    })
    .await;

    match joined {
        Ok(result) => Ok(result?),
        Err(e) => {
            warn!("Search task failed: {}", e);
            Err(ArchiveError::data_unavailable(format!("Search task failed: {}", e)))
        }
    }
}
