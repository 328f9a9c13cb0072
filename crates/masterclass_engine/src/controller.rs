/* 📖 # How does the query controller handle overlapping searches?

Every keystroke that produces a long-enough query issues a `QueryTicket` with
a fresh sequence number. A fetch may finish after a later keystroke has already
started another one; `complete()` only applies an outcome whose ticket is the
latest one still pending, so results can never appear out of order. Going back
to `Idle` (short input or escape) invalidates every outstanding ticket.
*/

use std::sync::Arc;

use tracing::{debug, warn};

use masterclass_base::PalHandle;

use crate::cards::{CardRow, NO_RESULTS_HTML, build_card_rows, render_cards_html};
use crate::persistence::QueryPersistence;
use crate::ranking::filter;
use crate::record::ResultRecord;
use crate::source::{IndexSource, SourceError, fetch_results};
use crate::terms::extract_terms;

/// Queries shorter than this (in characters) do not trigger a search.
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 3;

/// The observable state of the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// No search is active.
    Idle,
    /// A fetch is outstanding.
    Pending,
    /// At least one result is shown.
    Rendered(Vec<CardRow>),
    /// The last search produced no results.
    Empty,
}

/// Identifies one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    sequence: u64,
    terms: Vec<String>,
}

impl QueryTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Drives term extraction, fetching, ranking and rendering for one search box.
#[derive(Debug)]
pub struct QueryController {
    pal: PalHandle,
    source: IndexSource,
    persistence: Arc<dyn QueryPersistence>,
    min_query_length: usize,
    state: QueryState,
    input: String,
    last_sequence: u64,
    pending: Option<u64>,
}

impl QueryController {
    pub fn new(
        pal: PalHandle,
        source: IndexSource,
        persistence: Arc<dyn QueryPersistence>,
    ) -> Self {
        Self {
            pal,
            source,
            persistence,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            state: QueryState::Idle,
            input: String::new(),
            last_sequence: 0,
            pending: None,
        }
    }

    pub fn with_min_query_length(mut self, min_query_length: usize) -> Self {
        self.min_query_length = min_query_length;
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// The raw text last typed.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    /// Markup for the results area in the current state.
    pub fn render_html(&self) -> String {
        match &self.state {
            QueryState::Idle | QueryState::Pending => String::new(),
            QueryState::Rendered(rows) => render_cards_html(rows),
            QueryState::Empty => NO_RESULTS_HTML.to_string(),
        }
    }

    /// Record new input; returns a ticket if a fetch should be started.
    pub fn on_input(&mut self, input: &str) -> Option<QueryTicket> {
        self.input = input.to_string();
        self.persistence.write(input);

        if input.chars().count() < self.min_query_length {
            debug!(input, "query below minimum length");
            self.reset();
            return None;
        }

        self.last_sequence += 1;
        self.pending = Some(self.last_sequence);
        self.state = QueryState::Pending;
        let ticket = QueryTicket {
            sequence: self.last_sequence,
            terms: extract_terms(input),
        };
        debug!(sequence = ticket.sequence, terms = ?ticket.terms, "issued query ticket");
        Some(ticket)
    }

    /// Apply the fetch outcome for `ticket`.
    ///
    /// Returns `false` if the ticket was superseded and the outcome discarded.
    pub fn complete(
        &mut self,
        ticket: QueryTicket,
        outcome: Result<Vec<ResultRecord>, SourceError>,
    ) -> bool {
        if self.pending != Some(ticket.sequence) {
            debug!(sequence = ticket.sequence, "discarding stale search outcome");
            return false;
        }
        self.pending = None;

        self.state = match outcome {
            Ok(records) => {
                let matched = filter(&ticket.terms, &records);
                debug!(
                    sequence = ticket.sequence,
                    total = records.len(),
                    matched = matched.len(),
                    "ranked query index"
                );
                let rows = build_card_rows(&ticket.terms, &matched);
                if rows.is_empty() {
                    QueryState::Empty
                } else {
                    QueryState::Rendered(rows)
                }
            }
            Err(e) => {
                warn!(sequence = ticket.sequence, error = %e, "search failed, showing no results");
                QueryState::Empty
            }
        };
        true
    }

    /// Run the whole pipeline for `input` synchronously.
    pub fn search(&mut self, input: &str) -> &QueryState {
        if let Some(ticket) = self.on_input(input) {
            let outcome = fetch_results(&self.pal, &self.source);
            self.complete(ticket, outcome);
        }
        &self.state
    }

    /// Clear the search, as when the user presses Escape.
    pub fn on_escape(&mut self) {
        debug!("search cleared");
        self.reset();
    }

    /// Re-run the persisted query, if there is one.
    pub fn restore(&mut self) -> &QueryState {
        match self.persistence.read() {
            Some(query) => {
                debug!(query = %query, "restoring persisted query");
                self.search(&query)
            }
            None => &self.state,
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.state = QueryState::Idle;
        self.persistence.clear();
    }
}
