//! Runs a prediction on a worker thread so the UI keeps drawing.

use crate::client::PredictionClient;
use crate::controller::PredictionTicket;
use crate::error::PredictError;
use crate::types::Prediction;
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

pub type Outcome = Result<Prediction, PredictError>;

/// A request on its way. Poll with [`PendingPrediction::try_take`].
pub struct PendingPrediction {
    ticket: Option<PredictionTicket>,
    rx: Receiver<Outcome>,
}

impl PendingPrediction {
    pub fn spawn(client: Arc<dyn PredictionClient>, ticket: PredictionTicket) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let fallback = tx.clone();
        let upload = ticket.upload().clone();

        let spawned = thread::Builder::new()
            .name("leaf-predict".into())
            .spawn(move || {
                let outcome = client.predict(&upload);
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            tracing::error!("failed to start prediction worker: {e}");
            let _ = fallback.try_send(Err(PredictError::Transport(format!(
                "failed to start prediction worker: {e}"
            ))));
        }

        Self {
            ticket: Some(ticket),
            rx,
        }
    }

    /// Returns the ticket and outcome once the worker is done; `None` while
    /// it is still running or after the outcome was taken.
    pub fn try_take(&mut self) -> Option<(PredictionTicket, Outcome)> {
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(PredictError::Transport(
                "prediction worker stopped without an answer".into(),
            )),
        };
        self.ticket.take().map(|ticket| (ticket, outcome))
    }

    /// Blocks until the worker answers. `None` if the outcome was already taken.
    pub fn wait(self) -> Option<(PredictionTicket, Outcome)> {
        let ticket = self.ticket?;
        let outcome = self.rx.recv().unwrap_or_else(|_| {
            Err(PredictError::Transport(
                "prediction worker stopped without an answer".into(),
            ))
        });
        Some((ticket, outcome))
    }
}
