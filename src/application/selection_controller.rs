// Selection controller - Single owner of the selection state
use crate::domain::dashboard::PanelBundle;
use crate::domain::error::DashboardError;
use crate::domain::occupancy::Granularity;
use crate::domain::selection::{SelectionEvent, SelectionState};
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Year(String),
    Granularity(Granularity),
    Month(u32),
}

enum SelectionCommand {
    Apply {
        change: SelectionChange,
        reply: oneshot::Sender<Result<SelectionEvent, DashboardError>>,
    },
    Current {
        reply: oneshot::Sender<SelectionEvent>,
    },
}

#[derive(Clone)]
pub struct SelectionHandle {
    tx: mpsc::Sender<SelectionCommand>,
}

/// Move `state` into its own task. Returns the command handle and the change feed.
pub fn spawn(state: SelectionState) -> (SelectionHandle, watch::Receiver<SelectionEvent>) {
    let selections = state.subscribe();
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

    tokio::spawn(run(state, rx));

    (SelectionHandle { tx }, selections)
}

async fn run(mut state: SelectionState, mut rx: mpsc::Receiver<SelectionCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            SelectionCommand::Apply { change, reply } => {
                let result = apply(&mut state, change);
                if let Err(e) = &result {
                    tracing::info!("Selection rejected: {}", e);
                }
                let _ = reply.send(result);
            }
            SelectionCommand::Current { reply } => {
                let _ = reply.send(state.event());
            }
        }
    }

    tracing::debug!("All selection handles dropped, controller stopped");
}

pub fn apply(state: &mut SelectionState, change: SelectionChange) -> Result<SelectionEvent, DashboardError> {
    match change {
        SelectionChange::Year(year) => state.set_year(&year),
        SelectionChange::Granularity(granularity) => Ok(state.set_granularity(granularity)),
        SelectionChange::Month(month) => state.set_month(month),
    }
}

impl SelectionHandle {
    pub async fn apply(&self, change: SelectionChange) -> Result<SelectionEvent, DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SelectionCommand::Apply { change, reply })
            .await
            .map_err(|_| DashboardError::ControllerUnavailable)?;
        rx.await.map_err(|_| DashboardError::ControllerUnavailable)?
    }

    pub async fn current(&self) -> Result<SelectionEvent, DashboardError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SelectionCommand::Current { reply })
            .await
            .map_err(|_| DashboardError::ControllerUnavailable)?;
        rx.await.map_err(|_| DashboardError::ControllerUnavailable)
    }

    /// Apply `change`, then wait for the panel bundle that reflects it (or a newer one)
    pub async fn apply_and_wait(
        &self,
        change: SelectionChange,
        bundles: &mut watch::Receiver<PanelBundle>,
    ) -> Result<PanelBundle, DashboardError> {
        let event = self.apply(change).await?;
        let bundle = bundles
            .wait_for(|b| b.generation >= event.generation)
            .await
            .map_err(|_| DashboardError::ControllerUnavailable)?;
        Ok((*bundle).clone())
    }
}
