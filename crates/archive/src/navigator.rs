//! In-conversation navigation between search occurrences
//!
//! A conversation opened from a search result records every highlighted
//! bubble as an occurrence and lets the user step through them, wrapping
//! at both ends. Each conversation gets a fresh navigator; nothing carries
//! over when another conversation opens.

use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::Timestamp;
use crate::query::Conversation;

/// How long the deep-link target keeps its arrival emphasis
pub const ARRIVAL_HIGHLIGHT: Duration = Duration::from_secs(3);

/// A highlighted bubble that navigation can move to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOccurrence {
    /// Index of the bubble within its conversation
    pub bubble_index: usize,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NavigatorState {
    #[default]
    Inactive,
    /// Query known, occurrences not yet collected (or none found)
    ActiveUnresolved { query: String },
    /// `current` is always a valid index into `occurrences`
    ActiveResolved {
        query: String,
        occurrences: Vec<SearchOccurrence>,
        current: usize,
    },
}

/// What the view must change after the current occurrence moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationUpdate {
    /// Bubble losing the "current" emphasis
    pub previous: Option<usize>,
    /// Bubble gaining the "current" emphasis, to be scrolled to the centre
    pub current: usize,
    /// 1-based position among the occurrences
    pub position: usize,
    pub total: usize,
}

impl NavigationUpdate {
    /// Position indicator, e.g. `2 of 5`
    pub fn position_text(&self) -> String {
        format!("{} of {}", self.position, self.total)
    }
}

/// One-time emphasis on the bubble a search result pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalHighlight {
    pub bubble_index: usize,
    pub expires_at: Instant,
}

impl ArrivalHighlight {
    pub fn new(bubble_index: usize, now: Instant) -> Self {
        Self {
            bubble_index,
            expires_at: now + ARRIVAL_HIGHLIGHT,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Navigation state for the open conversation
#[derive(Debug, Default)]
pub struct Navigator {
    state: NavigatorState,
    arrival: Option<ArrivalHighlight>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up navigation for a freshly built conversation
    ///
    /// Returns the initial update when the conversation has occurrences.
    pub fn open(&mut self, conversation: &Conversation, now: Instant) -> Option<NavigationUpdate> {
        self.deactivate();
        let search = conversation.search.as_ref()?;
        let arrival = conversation
            .target_bubble()
            .map(|bubble| ArrivalHighlight::new(bubble.index, now));
        let activated = self.activate(&search.query);
        // The target bubble is emphasised even when there is nothing to navigate
        self.arrival = arrival;
        if !activated {
            return None;
        }
        self.resolve(conversation.occurrences(), search.target.as_ref())
    }

    /// Start navigating for `query`; a blank query leaves the navigator inactive
    pub fn activate(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            self.deactivate();
            return false;
        }
        self.state = NavigatorState::ActiveUnresolved {
            query: query.to_string(),
        };
        self.arrival = None;
        true
    }

    /// Record the occurrences of the rendered conversation
    ///
    /// The current occurrence starts at the first one matching `target`,
    /// else at the first one. With no occurrences the navigator stays
    /// unresolved and no controls are shown.
    pub fn resolve(
        &mut self,
        occurrences: Vec<SearchOccurrence>,
        target: Option<&Timestamp>,
    ) -> Option<NavigationUpdate> {
        let NavigatorState::ActiveUnresolved { query } = &self.state else {
            return None;
        };
        let query = query.clone();
        if occurrences.is_empty() {
            debug!("No occurrences of {:?} in conversation", query);
            return None;
        }

        let current = target
            .and_then(|t| occurrences.iter().position(|o| &o.timestamp == t))
            .unwrap_or(0);
        let update = NavigationUpdate {
            previous: None,
            current: occurrences[current].bubble_index,
            position: current + 1,
            total: occurrences.len(),
        };
        self.state = NavigatorState::ActiveResolved {
            query,
            occurrences,
            current,
        };
        Some(update)
    }

    pub fn next(&mut self) -> Option<NavigationUpdate> {
        self.step(|current, len| (current + 1) % len)
    }

    pub fn previous(&mut self) -> Option<NavigationUpdate> {
        self.step(|current, len| (current + len - 1) % len)
    }

    fn step(&mut self, advance: impl FnOnce(usize, usize) -> usize) -> Option<NavigationUpdate> {
        let NavigatorState::ActiveResolved {
            occurrences,
            current,
            ..
        } = &mut self.state
        else {
            return None;
        };
        let previous = occurrences[*current].bubble_index;
        *current = advance(*current, occurrences.len());
        Some(NavigationUpdate {
            previous: Some(previous),
            current: occurrences[*current].bubble_index,
            position: *current + 1,
            total: occurrences.len(),
        })
    }

    /// Return to inactive, dropping occurrences, query and emphasis
    pub fn deactivate(&mut self) {
        self.state = NavigatorState::Inactive;
        self.arrival = None;
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, NavigatorState::Inactive)
    }

    /// Whether navigation controls should be shown
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, NavigatorState::ActiveResolved { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match &self.state {
            NavigatorState::Inactive => None,
            NavigatorState::ActiveUnresolved { query }
            | NavigatorState::ActiveResolved { query, .. } => Some(query),
        }
    }

    pub fn occurrences(&self) -> &[SearchOccurrence] {
        match &self.state {
            NavigatorState::ActiveResolved { occurrences, .. } => occurrences,
            _ => &[],
        }
    }

    /// Current occurrence index, or -1 when there is none
    pub fn current_index(&self) -> isize {
        match &self.state {
            NavigatorState::ActiveResolved { current, .. } => *current as isize,
            _ => -1,
        }
    }

    pub fn current(&self) -> Option<&SearchOccurrence> {
        match &self.state {
            NavigatorState::ActiveResolved {
                occurrences,
                current,
                ..
            } => occurrences.get(*current),
            _ => None,
        }
    }

    pub fn position_text(&self) -> Option<String> {
        match &self.state {
            NavigatorState::ActiveResolved {
                occurrences,
                current,
                ..
            } => Some(format!("{} of {}", current + 1, occurrences.len())),
            _ => None,
        }
    }

    pub fn arrival(&self) -> Option<&ArrivalHighlight> {
        self.arrival.as_ref()
    }

    /// Drop the arrival emphasis once its time is up
    ///
    /// Returns the bubble that lost the emphasis.
    pub fn expire_arrival(&mut self, now: Instant) -> Option<usize> {
        match self.arrival {
            Some(arrival) if arrival.is_expired(now) => {
                self.arrival = None;
                Some(arrival.bubble_index)
            }
            _ => None,
        }
    }
}
