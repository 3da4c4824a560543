use crate::{Event, FetchError, LinkPreviewCard, MetadataSource, PreviewError, RenderModel};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tracing::{debug, instrument, warn};

/// Host side of a running card: send pastes, watch render models.
#[derive(Clone)]
pub struct CardHandle {
    pastes: mpsc::UnboundedSender<String>,
    render: watch::Receiver<RenderModel>,
}

impl CardHandle {
    pub fn paste(&self, clipboard_text: impl Into<String>) -> Result<(), PreviewError> {
        self.pastes
            .send(clipboard_text.into())
            .map_err(|_| PreviewError::DriverStopped)
    }

    pub fn current(&self) -> RenderModel {
        self.render.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderModel> {
        self.render.clone()
    }
}

/// Single-task event loop for one card.
///
/// Pastes are handled while fetches are outstanding; every fetch completion
/// goes back through the reducer, which drops superseded results.
pub struct CardDriver<S> {
    card: LinkPreviewCard<S>,
    pastes: mpsc::UnboundedReceiver<String>,
    render: watch::Sender<RenderModel>,
}

impl<S> CardDriver<S>
where
    S: MetadataSource + Send + Sync + 'static,
{
    pub fn new(card: LinkPreviewCard<S>) -> (Self, CardHandle) {
        let (paste_tx, paste_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = watch::channel(card.render());

        let driver = Self {
            card,
            pastes: paste_rx,
            render: render_tx,
        };
        let handle = CardHandle {
            pastes: paste_tx,
            render: render_rx,
        };
        (driver, handle)
    }

    /// Runs until every [`CardHandle`] is dropped, then hands the card back.
    ///
    /// Each fetch runs on its own task, so a source that panics fails only
    /// that fetch. Fetches still outstanding at shutdown are aborted and the
    /// returned card is no longer loading.
    #[instrument(level = "debug", skip(self))]
    pub async fn run(mut self) -> LinkPreviewCard<S> {
        let mut in_flight = FuturesUnordered::new();
        let mut tasks: Vec<AbortHandle> = Vec::new();

        loop {
            tokio::select! {
                paste = self.pastes.recv() => {
                    let Some(text) = paste else {
                        debug!(abandoned = in_flight.len(), "All card handles dropped, stopping");
                        break;
                    };
                    if let Some(ticket) = self.card.on_paste(&text) {
                        let task = tokio::spawn(self.card.fetch_future(ticket.clone()));
                        tasks.retain(|t| !t.is_finished());
                        tasks.push(task.abort_handle());
                        in_flight.push(async move {
                            match task.await {
                                Ok(event) => event,
                                Err(e) => {
                                    warn!(seq = ticket.seq, error = %e, "Fetch task did not complete");
                                    Event::FetchCompleted {
                                        ticket,
                                        outcome: Err(FetchError::Network(format!(
                                            "fetch task failed: {e}"
                                        ))),
                                    }
                                }
                            }
                        });
                    }
                    self.publish();
                }
                Some(event) = in_flight.next(), if !in_flight.is_empty() => {
                    self.card.apply(event);
                    self.publish();
                }
            }
        }

        for task in &tasks {
            task.abort();
        }
        self.card.cancel_in_flight();
        self.publish();
        self.card
    }

    fn publish(&self) {
        self.render.send_replace(self.card.render());
    }
}
