use crate::{FetchError, Metadata, UrlValidator, Validity};
use tracing::{debug, instrument};

/// Identifies one issued fetch: a sequence number plus the link it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub link: String,
}

/// Inbound events of the card state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// Raw clipboard text from a paste.
    Paste(String),
    /// A fetch issued for `ticket` finished.
    FetchCompleted {
        ticket: FetchTicket,
        outcome: Result<Metadata, FetchError>,
    },
}

/// Everything the card knows about the current link.
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    raw_link: String,
    is_loading: bool,
    metadata: Option<Metadata>,
    in_flight: Option<FetchTicket>,
    next_seq: u64,
    last_error: Option<FetchError>,
    validator: UrlValidator,
}

impl PreviewState {
    pub fn new(validator: UrlValidator) -> Self {
        Self {
            validator,
            ..Self::default()
        }
    }

    pub fn raw_link(&self) -> &str {
        &self.raw_link
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// The fetch whose result may still commit, if any.
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn validity(&self) -> Validity {
        self.validator.classify(&self.raw_link)
    }

    fn paste(mut self, text: &str) -> Self {
        self.raw_link = text.trim().to_string();
        self.metadata = None;
        self.last_error = None;

        match self.validity() {
            Validity::Valid => {
                self.next_seq += 1;
                let ticket = FetchTicket {
                    seq: self.next_seq,
                    link: self.raw_link.clone(),
                };
                debug!(seq = ticket.seq, link = %ticket.link, "Issuing metadata fetch");
                self.in_flight = Some(ticket);
                self.is_loading = true;
            }
            validity => {
                if let Err(e) = self.validator.validate(&self.raw_link) {
                    e.log();
                }
                if let Some(ticket) = self.in_flight.take() {
                    debug!(seq = ticket.seq, ?validity, "In-flight fetch superseded");
                }
                self.is_loading = false;
            }
        }
        self
    }

    fn complete(mut self, ticket: FetchTicket, outcome: Result<Metadata, FetchError>) -> Self {
        if self.in_flight.as_ref() != Some(&ticket) {
            debug!(
                seq = ticket.seq,
                link = %ticket.link,
                current = ?self.in_flight.as_ref().map(|t| t.seq),
                "Discarding stale fetch result"
            );
            return self;
        }

        self.in_flight = None;
        self.is_loading = false;
        match outcome {
            Ok(metadata) => {
                self.metadata = Some(metadata);
            }
            Err(e) => {
                e.log();
                self.metadata = None;
                self.last_error = Some(e);
            }
        }
        self
    }
}

/// Applies one event and returns the next state.
#[instrument(level = "trace", skip(state))]
pub fn apply_event(state: PreviewState, event: Event) -> PreviewState {
    match event {
        Event::Paste(text) => state.paste(&text),
        Event::FetchCompleted { ticket, outcome } => state.complete(ticket, outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(title: &str) -> Metadata {
        Metadata {
            title: Some(title.to_string()),
            ..Metadata::default()
        }
    }

    fn paste(state: PreviewState, text: &str) -> PreviewState {
        apply_event(state, Event::Paste(text.to_string()))
    }

    fn complete(
        state: PreviewState,
        ticket: FetchTicket,
        outcome: Result<Metadata, FetchError>,
    ) -> PreviewState {
        apply_event(state, Event::FetchCompleted { ticket, outcome })
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = PreviewState::default();
        assert_eq!(state.validity(), Validity::Empty);
        assert!(!state.is_loading());
        assert!(state.metadata().is_none());
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn test_valid_paste_issues_ticket_and_loads() {
        let state = paste(PreviewState::default(), "  https://a.b/c \n");

        assert_eq!(state.raw_link(), "https://a.b/c");
        assert!(state.is_loading());
        assert_eq!(
            state.in_flight(),
            Some(&FetchTicket {
                seq: 1,
                link: "https://a.b/c".to_string()
            })
        );
    }

    #[test]
    fn test_success_commits_metadata() {
        let state = paste(PreviewState::default(), "https://a.b/c");
        let ticket = state.in_flight().cloned().unwrap();
        let state = complete(state, ticket, Ok(metadata("A")));

        assert!(!state.is_loading());
        assert!(state.in_flight().is_none());
        assert_eq!(state.metadata(), Some(&metadata("A")));
    }

    #[test]
    fn test_failure_clears_loading_and_metadata() {
        let state = paste(PreviewState::default(), "https://a.b/c");
        let ticket = state.in_flight().cloned().unwrap();
        let state = complete(state, ticket, Err(FetchError::HttpStatus(500)));

        assert!(!state.is_loading());
        assert!(state.metadata().is_none());
        assert_eq!(state.last_error(), Some(&FetchError::HttpStatus(500)));
        assert_eq!(state.validity(), Validity::Valid);
    }

    #[test]
    fn test_newer_paste_supersedes_older_fetch() {
        let state = paste(PreviewState::default(), "https://one.example/");
        let first = state.in_flight().cloned().unwrap();
        let state = paste(state, "https://two.example/");
        let second = state.in_flight().cloned().unwrap();
        assert!(second.seq > first.seq);

        let state = complete(state, second, Ok(metadata("two")));
        let state = complete(state, first, Ok(metadata("one")));

        assert_eq!(state.metadata(), Some(&metadata("two")));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_result_does_not_end_current_loading() {
        let state = paste(PreviewState::default(), "https://one.example/");
        let first = state.in_flight().cloned().unwrap();
        let state = paste(state, "https://two.example/");

        let state = complete(state, first, Ok(metadata("one")));

        assert!(state.is_loading());
        assert!(state.metadata().is_none());
    }

    #[test]
    fn test_same_link_pasted_twice_gets_fresh_ticket() {
        let state = paste(PreviewState::default(), "https://a.b/");
        let first = state.in_flight().cloned().unwrap();
        let state = paste(state, "https://a.b/");
        let second = state.in_flight().cloned().unwrap();

        assert_eq!(first.link, second.link);
        assert_ne!(first, second);

        let state = complete(state, first, Ok(metadata("old")));
        assert!(state.metadata().is_none());
    }

    #[test]
    fn test_empty_paste_resets_without_fetch() {
        let state = paste(PreviewState::default(), "https://a.b/c");
        let ticket = state.in_flight().cloned().unwrap();
        let state = complete(state, ticket, Ok(metadata("A")));

        let state = paste(state, "");
        assert_eq!(state.validity(), Validity::Empty);
        assert!(state.metadata().is_none());
        assert!(!state.is_loading());
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn test_invalid_paste_during_loading_drops_in_flight() {
        let state = paste(PreviewState::default(), "https://a.b/c");
        let ticket = state.in_flight().cloned().unwrap();
        let state = paste(state, "not a url");

        assert_eq!(state.validity(), Validity::Invalid);
        assert!(!state.is_loading());

        let state = complete(state, ticket, Ok(metadata("late")));
        assert!(state.metadata().is_none());
    }

    #[test]
    fn test_paste_clears_previous_error() {
        let state = paste(PreviewState::default(), "https://a.b/c");
        let ticket = state.in_flight().cloned().unwrap();
        let state = complete(state, ticket, Err(FetchError::Network("boom".into())));
        assert!(state.last_error().is_some());

        let state = paste(state, "https://d.e/f");
        assert!(state.last_error().is_none());
    }
}
