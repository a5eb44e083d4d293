mod panels;
mod previews;

pub use previews::TexturePreviews;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use eframe::{App, Frame, egui};
use leaf_core::{
    Controller, FileCandidate, HttpPredictionClient, PendingPrediction, PredictError,
    PredictionClient, SelectError,
};
use rfd::FileDialog;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the user asked for during a frame; applied after drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    PickFile,
    ClearImage,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ServiceHealth {
    Checking,
    Reachable,
    Unreachable(String),
}

pub struct LeafApp {
    controller: Controller<TexturePreviews>,
    client: Arc<HttpPredictionClient>,
    pending: Option<PendingPrediction>,
    ping: Option<Receiver<Result<(), PredictError>>>,
    service: ServiceHealth,
    status: String,
}

impl LeafApp {
    pub fn new(ctx: egui::Context, client: HttpPredictionClient) -> Self {
        let client = Arc::new(client);
        let ping = spawn_ping(client.clone(), ctx.clone());
        Self {
            controller: Controller::new(TexturePreviews::new(ctx)),
            client,
            pending: None,
            ping: Some(ping),
            service: ServiceHealth::Checking,
            status: String::new(),
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::PickFile => {
                if let Some(path) = FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file()
                {
                    self.load_path(&path);
                }
            }
            Action::ClearImage => {
                self.controller.clear_image();
                self.status.clear();
            }
            Action::Submit => self.submit(),
        }
    }

    fn load_path(&mut self, path: &Path) {
        let candidate = FileCandidate::from_path(path)
            .with_context(|| format!("cannot read {}", path.display()));
        match candidate {
            Ok(candidate) => {
                let result = self.controller.select_image(candidate);
                self.report_selection(result);
            }
            Err(e) => {
                tracing::warn!("{e:#}");
                self.status = format!("{e:#}");
            }
        }
    }

    fn report_selection(&mut self, result: Result<(), SelectError>) {
        self.status = match result {
            Ok(()) => match self.controller.selected() {
                Some(image) => format!("Selected {}", image.file_name()),
                None => String::new(),
            },
            Err(e) => e.to_string(),
        };
    }

    fn submit(&mut self) {
        match self.controller.submit() {
            Ok(ticket) => {
                let client: Arc<dyn PredictionClient> = self.client.clone();
                self.pending = Some(PendingPrediction::spawn(client, ticket));
                self.status = "Predicting...".to_string();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn poll_pending(&mut self) {
        if let Some(pending) = self.pending.as_mut()
            && let Some((ticket, outcome)) = pending.try_take()
        {
            self.pending = None;
            self.controller.complete(ticket, outcome);
            self.status = match self.controller.prediction() {
                Some(p) => format!("Prediction: {} ({})", p.label, p.confidence),
                None => String::new(),
            };
        }
    }

    fn poll_ping(&mut self) {
        let Some(rx) = self.ping.as_ref() else {
            return;
        };
        let health = match rx.try_recv() {
            Ok(Ok(())) => ServiceHealth::Reachable,
            Ok(Err(e)) => ServiceHealth::Unreachable(e.to_string()),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                ServiceHealth::Unreachable("health check did not run".to_string())
            }
        };
        if let ServiceHealth::Unreachable(reason) = &health {
            tracing::warn!("prediction service health check failed: {reason}");
        }
        self.service = health;
        self.ping = None;
    }

    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });

        if !dropped.is_empty() {
            match first_dropped(dropped) {
                Ok(first) => {
                    let result = self.controller.drop_files(first);
                    self.report_selection(result);
                }
                Err(e) => {
                    tracing::warn!("Failed to read dropped file: {e:#}");
                    self.controller.drag_leave();
                    self.status = format!("{e:#}");
                }
            }
        } else if hovering {
            if self.controller.is_drag_hover() {
                self.controller.drag_over();
            } else {
                self.controller.drag_enter();
            }
        } else if self.controller.is_drag_hover() {
            self.controller.drag_leave();
        }
    }
}

impl App for LeafApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_ping();
        self.poll_pending();
        self.handle_drag_and_drop(ctx);

        let view = self.controller.view();
        let mut action = None;

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.render_status_bar(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            action = self.render_main(ui, &view);
        });

        if let Some(action) = action {
            self.apply(action);
        }
        if self.pending.is_some() || self.ping.is_some() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

fn spawn_ping(
    client: Arc<HttpPredictionClient>,
    ctx: egui::Context,
) -> Receiver<Result<(), PredictError>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let spawned = thread::Builder::new()
        .name("leaf-ping".into())
        .spawn(move || {
            let _ = tx.send(client.ping());
            ctx.request_repaint();
        });
    if let Err(e) = spawned {
        tracing::warn!("could not start health check: {e}");
    }
    rx
}

/// Only the first dropped item is read; the rest are ignored.
fn first_dropped(files: Vec<egui::DroppedFile>) -> Result<Option<FileCandidate>> {
    files.into_iter().next().map(dropped_candidate).transpose()
}

fn dropped_candidate(file: egui::DroppedFile) -> Result<FileCandidate> {
    let reported = Some(file.mime.as_str()).filter(|m| !m.is_empty());
    if let Some(bytes) = file.bytes {
        return Ok(FileCandidate::with_reported_type(file.name, reported, bytes));
    }
    let path = file
        .path
        .context("dropped item has neither contents nor a path")?;
    let bytes = std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = if file.name.is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    } else {
        file.name
    };
    Ok(FileCandidate::with_reported_type(name, reported, bytes))
}
