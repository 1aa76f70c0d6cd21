// Stats panel - Recomputes occupancy bundles whenever the selection changes
use crate::application::series_provider::OccupancySeriesProvider;
use crate::domain::dashboard::PanelBundle;
use crate::domain::selection::SelectionEvent;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct StatsPanel {
    provider: Arc<dyn OccupancySeriesProvider>,
}

impl StatsPanel {
    pub fn new(provider: Arc<dyn OccupancySeriesProvider>) -> Self {
        Self { provider }
    }

    pub fn is_synthetic(&self) -> bool {
        self.provider.is_synthetic()
    }

    /// Fetch the series for `event` and summarize it into one bundle
    pub async fn render(&self, event: &SelectionEvent) -> PanelBundle {
        let series = self.provider.generate_series(&event.key).await;
        if let Err(e) = &series {
            tracing::warn!(generation = event.generation, "Occupancy series unavailable: {}", e);
        }

        let bundle = PanelBundle::assemble(event, series, self.provider.is_synthetic());
        tracing::debug!(
            generation = bundle.generation,
            points = bundle.series.len(),
            status = ?bundle.status,
            "Rendered occupancy panel"
        );
        bundle
    }

    /// Render the current selection, then keep the returned receiver in step with every later selection.
    pub async fn spawn(self, mut selections: watch::Receiver<SelectionEvent>) -> watch::Receiver<PanelBundle> {
        let initial_event = selections.borrow_and_update().clone();
        let initial = self.render(&initial_event).await;
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(async move {
            self.run(selections, tx).await;
        });

        rx
    }

    async fn run(self, mut selections: watch::Receiver<SelectionEvent>, bundles: watch::Sender<PanelBundle>) {
        loop {
            if selections.changed().await.is_err() {
                break;
            }
            let mut event = selections.borrow_and_update().clone();

            // A newer selection drops the in-flight render for the older one.
            let bundle = loop {
                tokio::select! {
                    bundle = self.render(&event) => break Some(bundle),
                    changed = selections.changed() => {
                        if changed.is_err() {
                            break None;
                        }
                        tracing::debug!(superseded = event.generation, "Dropping stale occupancy render");
                        event = selections.borrow_and_update().clone();
                    }
                }
            };

            match bundle {
                Some(bundle) => {
                    publish(&bundles, bundle);
                }
                None => break,
            }
        }

        tracing::debug!("Selection channel closed, stats panel stopped");
    }
}

/// Publish unless a newer generation is already visible
fn publish(bundles: &watch::Sender<PanelBundle>, bundle: PanelBundle) -> bool {
    bundles.send_if_modified(|current| {
        if bundle.generation >= current.generation {
            *current = bundle;
            true
        } else {
            false
        }
    })
}
