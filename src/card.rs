use crate::{
    apply_event, derive, CardConfig, DefaultColor, Event, FetchError, FetchTicket, Fetcher,
    MetadataExtractor, MetadataSource, PreviewError, PreviewState, RenderModel, UrlValidator,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One mounted preview card: its state, its default color and its metadata source.
pub struct LinkPreviewCard<S> {
    config: CardConfig,
    source: Arc<S>,
    state: PreviewState,
    default_color: DefaultColor,
}

impl LinkPreviewCard<Fetcher> {
    /// Mounts a card that talks to the configured metadata service.
    pub fn mount(config: CardConfig) -> Result<Self, PreviewError> {
        config.check()?;
        let fetcher = Fetcher::new_with_config(config.fetcher_config())?
            .with_extractor(MetadataExtractor::with_rules(config.key_rules.clone()));
        Self::with_source(config, fetcher)
    }
}

/// Owns the ticket of a fetch started by [`LinkPreviewCard::paste`].
///
/// Dropped before [`PendingFetch::finish`] means the paste future was
/// cancelled; the ticket is then completed as a failure so loading ends.
struct PendingFetch<'a, S: MetadataSource> {
    card: &'a mut LinkPreviewCard<S>,
    ticket: Option<FetchTicket>,
}

impl<S: MetadataSource> PendingFetch<'_, S> {
    fn finish(mut self, outcome: Result<crate::Metadata, FetchError>) {
        if let Some(ticket) = self.ticket.take() {
            self.card.apply(Event::FetchCompleted { ticket, outcome });
        }
    }
}

impl<S: MetadataSource> Drop for PendingFetch<'_, S> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            debug!(seq = ticket.seq, link = %ticket.link, "Paste cancelled before fetch finished");
            self.card.apply(Event::FetchCompleted {
                ticket,
                outcome: Err(FetchError::Network("fetch cancelled".into())),
            });
        }
    }
}

impl<S: MetadataSource> LinkPreviewCard<S> {
    pub fn with_source(config: CardConfig, source: S) -> Result<Self, PreviewError> {
        let default_color = DefaultColor::random(&config.palette);
        Self::with_default_color(config, source, default_color)
    }

    pub fn with_default_color(
        config: CardConfig,
        source: S,
        default_color: DefaultColor,
    ) -> Result<Self, PreviewError> {
        config.check()?;
        debug!(color = %default_color.as_str(), "Mounting link preview card");
        let state = PreviewState::new(UrlValidator::new(config.validator_config()));
        Ok(Self {
            config,
            source: Arc::new(source),
            state,
            default_color,
        })
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn default_color(&self) -> &DefaultColor {
        &self.default_color
    }

    pub fn apply(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = apply_event(state, event);
    }

    /// Records a paste; returns the ticket to fetch when the link is valid.
    pub fn on_paste(&mut self, clipboard_text: &str) -> Option<FetchTicket> {
        self.apply(Event::Paste(clipboard_text.to_string()));
        self.state.in_flight().cloned()
    }

    /// Runs the fetch for `ticket` without borrowing the card.
    pub fn fetch_future(&self, ticket: FetchTicket) -> impl Future<Output = Event> + Send + 'static
    where
        S: Send + Sync + 'static,
    {
        let source = Arc::clone(&self.source);
        async move {
            let outcome = source.fetch(&ticket.link).await;
            Event::FetchCompleted { ticket, outcome }
        }
    }

    /// Completes the current fetch as cancelled, if one is outstanding.
    pub fn cancel_in_flight(&mut self) {
        if let Some(ticket) = self.state.in_flight().cloned() {
            self.apply(Event::FetchCompleted {
                ticket,
                outcome: Err(FetchError::Network("fetch cancelled".into())),
            });
        }
    }

    /// Paste, fetch and commit in one step.
    ///
    /// Dropping the returned future mid-fetch still ends the loading state.
    #[instrument(level = "debug", skip(self))]
    pub async fn paste(&mut self, clipboard_text: &str) -> RenderModel {
        if let Some(ticket) = self.on_paste(clipboard_text) {
            let source = Arc::clone(&self.source);
            let link = ticket.link.clone();
            let pending = PendingFetch {
                card: &mut *self,
                ticket: Some(ticket),
            };
            let outcome = source.fetch(&link).await;
            pending.finish(outcome);
        }
        self.render()
    }

    pub fn render(&self) -> RenderModel {
        derive(&self.state, &self.config, &self.default_color)
    }
}
