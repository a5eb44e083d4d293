//! Upload-and-predict state machine.
//!
//! The controller owns every piece of client-visible state. Hosts feed it
//! events (file picked, drag hover, drop, submit click, request outcome)
//! and render [`Controller::view`] each frame. Preview creation and release
//! go through an injected [`PreviewStore`]; the network call goes through a
//! [`PredictionClient`] driven by the host, tied back with a
//! [`PredictionTicket`].

use crate::client::PredictionClient;
use crate::error::{PredictError, PreviewError, SelectError, SubmitError, VALIDATION_NOTICE};
use crate::types::{FileCandidate, Health, ImageUpload, Prediction, PreviewId, SelectedImage};

/// Creates and releases transient previews for selected files.
pub trait PreviewStore {
    fn create(&mut self, file_name: &str, bytes: &[u8]) -> Result<PreviewId, PreviewError>;
    fn release(&mut self, id: PreviewId);
}

/// State as the user perceives it. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Idle,
    ImageSelected,
    Submitting,
    ResultShown,
    ErrorShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Failure,
}

/// Message for the user about the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Proof that a request was started; hand it back to [`Controller::complete`].
#[derive(Debug)]
pub struct PredictionTicket {
    generation: u64,
    upload: ImageUpload,
}

impl PredictionTicket {
    pub fn upload(&self) -> &ImageUpload {
        &self.upload
    }
}

/// Result card contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub label: String,
    pub confidence: String,
    pub health: Health,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub state: UiState,
    pub show_upload: bool,
    pub preview: Option<PreviewId>,
    pub file_name: Option<String>,
    pub can_choose_different: bool,
    pub can_submit: bool,
    pub show_progress: bool,
    /// A request for an earlier image is still running.
    pub awaiting_previous: bool,
    pub drag_hover: bool,
    pub result: Option<ResultCard>,
    pub notice: Option<Notice>,
}

pub struct Controller<S: PreviewStore> {
    previews: S,
    selected: Option<SelectedImage>,
    prediction: Option<Prediction>,
    notice: Option<Notice>,
    drag_hover: bool,
    /// Bumped whenever the selected image changes.
    generation: u64,
    /// Generation of the request currently on the wire.
    in_flight: Option<u64>,
}

impl<S: PreviewStore> Controller<S> {
    pub fn new(previews: S) -> Self {
        Self {
            previews,
            selected: None,
            prediction: None,
            notice: None,
            drag_hover: false,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn previews(&self) -> &S {
        &self.previews
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_drag_hover(&self) -> bool {
        self.drag_hover
    }

    pub fn state(&self) -> UiState {
        if self.selected.is_none() {
            UiState::Idle
        } else if self.is_submitting() {
            UiState::Submitting
        } else if self.prediction.is_some() {
            UiState::ResultShown
        } else if self.notice.is_some() {
            UiState::ErrorShown
        } else {
            UiState::ImageSelected
        }
    }

    /// Takes a picked file. Non-images are rejected without touching state.
    pub fn select_image(&mut self, candidate: FileCandidate) -> Result<(), SelectError> {
        if !candidate.is_image() {
            tracing::warn!(
                file = candidate.file_name(),
                media_type = candidate.media_type(),
                "ignoring non-image file"
            );
            return Err(SelectError::UnsupportedMedia {
                file_name: candidate.file_name().to_string(),
                media_type: candidate.media_type().to_string(),
            });
        }

        let preview = self
            .previews
            .create(candidate.file_name(), candidate.bytes())?;
        let image = candidate.into_selected(preview);
        tracing::info!(
            file = image.file_name(),
            media_type = image.media_type(),
            bytes = image.len(),
            "image selected"
        );
        self.replace_selected(Some(image));
        Ok(())
    }

    /// Back to `Idle`.
    pub fn clear_image(&mut self) {
        if self.selected.is_some() {
            tracing::info!("image cleared");
        }
        self.replace_selected(None);
    }

    fn replace_selected(&mut self, image: Option<SelectedImage>) {
        if let Some(old) = std::mem::replace(&mut self.selected, image) {
            self.previews.release(old.preview());
        }
        self.prediction = None;
        self.notice = None;
        self.generation += 1;
    }

    /// Starts a request for the selected image.
    pub fn submit(&mut self) -> Result<PredictionTicket, SubmitError> {
        let Some(image) = self.selected.as_ref() else {
            self.notice = Some(Notice {
                kind: NoticeKind::Validation,
                message: VALIDATION_NOTICE.to_string(),
            });
            return Err(SubmitError::Validation);
        };
        if self.in_flight.is_some() {
            return Err(SubmitError::Busy);
        }

        let ticket = PredictionTicket {
            generation: self.generation,
            upload: image.upload().clone(),
        };
        tracing::info!(file = image.file_name(), "submitting image for prediction");
        self.in_flight = Some(self.generation);
        self.prediction = None;
        self.notice = None;
        Ok(ticket)
    }

    /// Applies the outcome of the request behind `ticket`.
    pub fn complete(&mut self, ticket: PredictionTicket, outcome: Result<Prediction, PredictError>) {
        if self.in_flight != Some(ticket.generation) {
            tracing::warn!(generation = ticket.generation, "ignoring outcome for unknown request");
            return;
        }
        self.in_flight = None;

        if ticket.generation != self.generation {
            tracing::debug!(
                file = %ticket.upload.file_name,
                "discarding outcome for an image that is no longer selected"
            );
            return;
        }

        match outcome {
            Ok(prediction) => {
                tracing::info!(
                    label = %prediction.label,
                    confidence = prediction.confidence.percent(),
                    "prediction received"
                );
                self.prediction = Some(prediction);
                self.notice = None;
            }
            Err(err) => {
                tracing::warn!("prediction failed: {err}");
                self.notice = Some(Notice {
                    kind: NoticeKind::Failure,
                    message: err.user_message().to_string(),
                });
            }
        }
    }

    /// Runs a full round trip on the calling thread.
    pub fn submit_with(&mut self, client: &dyn PredictionClient) -> Result<UiState, SubmitError> {
        let ticket = self.submit()?;
        let outcome = client.predict(ticket.upload());
        self.complete(ticket, outcome);
        Ok(self.state())
    }

    pub fn drag_enter(&mut self) {
        self.drag_hover = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_hover = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_hover = false;
    }

    /// Handles a drop; only the first item is considered.
    pub fn drop_files<I>(&mut self, items: I) -> Result<(), SelectError>
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        self.drag_hover = false;
        let first = items
            .into_iter()
            .next()
            .ok_or(SelectError::NothingDropped)?;
        self.select_image(first)
    }

    pub fn view(&self) -> ViewModel {
        let submitting = self.is_submitting();
        let has_image = self.selected.is_some();
        let current = self.in_flight == Some(self.generation);
        ViewModel {
            state: self.state(),
            show_upload: !has_image,
            preview: self.selected.as_ref().map(SelectedImage::preview),
            file_name: self.selected.as_ref().map(|s| s.file_name().to_string()),
            can_choose_different: has_image,
            can_submit: has_image && !submitting,
            show_progress: has_image && current,
            awaiting_previous: has_image && submitting && !current,
            drag_hover: self.drag_hover,
            result: self.prediction.as_ref().map(|p| ResultCard {
                label: p.label.clone(),
                confidence: p.confidence.to_string(),
                health: p.health(),
            }),
            notice: self.notice.clone(),
        }
    }
}

impl<S: PreviewStore> Drop for Controller<S> {
    fn drop(&mut self) {
        if let Some(image) = self.selected.take() {
            self.previews.release(image.preview());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FAILURE_NOTICE;
    use crate::types::{Confidence, ConfidenceScale};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Ledger {
        created: Vec<PreviewId>,
        released: Vec<PreviewId>,
    }

    /// Shares its ledger so tests can inspect it after the controller is dropped.
    #[derive(Default, Clone)]
    struct RecordingPreviews {
        ledger: Rc<RefCell<Ledger>>,
        fail: bool,
    }

    impl RecordingPreviews {
        fn live(&self) -> Vec<PreviewId> {
            let ledger = self.ledger.borrow();
            ledger
                .created
                .iter()
                .copied()
                .filter(|id| !ledger.released.contains(id))
                .collect()
        }
    }

    impl PreviewStore for RecordingPreviews {
        fn create(&mut self, file_name: &str, _bytes: &[u8]) -> Result<PreviewId, PreviewError> {
            if self.fail {
                return Err(PreviewError(format!("cannot render {file_name}")));
            }
            let mut ledger = self.ledger.borrow_mut();
            let id = PreviewId::new(ledger.created.len() as u64 + 1);
            ledger.created.push(id);
            Ok(id)
        }

        fn release(&mut self, id: PreviewId) {
            self.ledger.borrow_mut().released.push(id);
        }
    }

    struct StubClient {
        calls: AtomicUsize,
        outcome: Result<Prediction, PredictError>,
    }

    impl StubClient {
        fn answering(label: &str, confidence: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(prediction(label, confidence)),
            }
        }

        fn failing(err: PredictError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Err(err),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PredictionClient for StubClient {
        fn predict(&self, _upload: &ImageUpload) -> Result<Prediction, PredictError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn prediction(label: &str, confidence: f64) -> Prediction {
        Prediction::new(
            label,
            Confidence::from_raw(confidence, ConfidenceScale::Percent).unwrap(),
        )
    }

    fn jpeg(name: &str) -> FileCandidate {
        FileCandidate::new(name, vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn controller() -> (Controller<RecordingPreviews>, RecordingPreviews) {
        let previews = RecordingPreviews::default();
        (Controller::new(previews.clone()), previews)
    }

    #[test]
    fn starts_idle_with_upload_affordance() {
        let (c, _) = controller();
        let view = c.view();
        assert_eq!(view.state, UiState::Idle);
        assert!(view.show_upload);
        assert!(!view.can_submit);
        assert!(view.result.is_none());
    }

    #[test]
    fn selecting_an_image_stores_it_with_a_preview() {
        let (mut c, previews) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();

        let selected = c.selected().unwrap();
        assert_eq!(selected.file_name(), "leaf.jpg");
        assert_eq!(selected.media_type(), "image/jpeg");
        assert_eq!(selected.len(), 4);
        assert!(!selected.is_empty());
        assert_eq!(previews.live(), vec![selected.preview()]);
        assert_eq!(c.state(), UiState::ImageSelected);

        let view = c.view();
        assert!(!view.show_upload);
        assert!(view.can_submit);
        assert!(view.can_choose_different);
        assert_eq!(view.file_name.as_deref(), Some("leaf.jpg"));
    }

    #[test]
    fn non_image_is_rejected_and_state_kept() {
        let (mut c, previews) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let client = StubClient::answering("Healthy", 99.0);
        c.submit_with(&client).unwrap();

        let err = c
            .select_image(FileCandidate::new("notes.txt", b"hello".to_vec()))
            .unwrap_err();
        assert_eq!(
            err,
            SelectError::UnsupportedMedia {
                file_name: "notes.txt".into(),
                media_type: "text/plain".into(),
            }
        );
        assert_eq!(c.selected().unwrap().file_name(), "leaf.jpg");
        assert!(c.prediction().is_some());
        assert_eq!(previews.live().len(), 1);
    }

    #[test]
    fn preview_failure_rejects_selection() {
        let previews = RecordingPreviews {
            fail: true,
            ..Default::default()
        };
        let mut c = Controller::new(previews);
        assert!(matches!(
            c.select_image(jpeg("leaf.jpg")),
            Err(SelectError::Preview(_))
        ));
        assert!(c.selected().is_none());
    }

    #[test]
    fn second_selection_clears_result_and_releases_first_preview() {
        let (mut c, previews) = controller();
        c.select_image(jpeg("first.jpg")).unwrap();
        let first = c.selected().unwrap().preview();
        c.submit_with(&StubClient::answering("Early Blight", 77.0))
            .unwrap();
        assert!(c.prediction().is_some());

        c.select_image(jpeg("second.jpg")).unwrap();
        let second = c.selected().unwrap().preview();

        assert!(c.prediction().is_none());
        assert_ne!(first, second);
        assert_eq!(previews.ledger.borrow().released, vec![first]);
        assert_eq!(previews.live(), vec![second]);
    }

    #[test]
    fn clear_releases_preview_once() {
        let (mut c, previews) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let id = c.selected().unwrap().preview();

        c.clear_image();
        c.clear_image();

        assert_eq!(c.state(), UiState::Idle);
        assert_eq!(previews.ledger.borrow().released, vec![id]);
    }

    #[test]
    fn dropping_the_controller_releases_the_held_preview() {
        let (mut c, previews) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        drop(c);
        assert!(previews.live().is_empty());
        assert_eq!(previews.ledger.borrow().released.len(), 1);
    }

    #[test]
    fn submit_without_image_is_a_validation_error() {
        let (mut c, _) = controller();
        let client = StubClient::answering("Healthy", 99.0);

        assert_eq!(c.submit_with(&client), Err(SubmitError::Validation));
        assert_eq!(client.calls(), 0);
        let notice = c.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Validation);
        assert_eq!(notice.message, VALIDATION_NOTICE);
    }

    #[test]
    fn submit_while_submitting_is_refused() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let ticket = c.submit().unwrap();
        assert_eq!(c.state(), UiState::Submitting);
        assert!(c.view().show_progress);
        assert!(!c.view().can_submit);

        let client = StubClient::answering("Healthy", 99.0);
        assert_eq!(c.submit_with(&client), Err(SubmitError::Busy));
        assert_eq!(client.calls(), 0);

        c.complete(ticket, Ok(prediction("Healthy", 99.0)));
        assert!(!c.is_submitting());
        assert_eq!(c.submit_with(&client), Ok(UiState::ResultShown));
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn healthy_result_is_classified_and_formatted() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        c.submit_with(&StubClient::answering("Healthy", 98.2))
            .unwrap();

        let card = c.view().result.unwrap();
        assert_eq!(card.health, Health::Healthy);
        assert_eq!(card.confidence, "98.2%");
    }

    #[test]
    fn disease_result_is_classified() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        c.submit_with(&StubClient::answering("Apple Scab", 87.5))
            .unwrap();

        let card = c.view().result.unwrap();
        assert_eq!(card.label, "Apple Scab");
        assert_eq!(card.health, Health::Diseased);
    }

    #[test]
    fn transport_failure_keeps_image_for_retry() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let client = StubClient::failing(PredictError::Transport("connection refused".into()));

        assert_eq!(c.submit_with(&client), Ok(UiState::ErrorShown));
        assert!(!c.is_submitting());
        assert!(c.prediction().is_none());
        assert!(c.selected().is_some());
        let notice = c.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Failure);
        assert_eq!(notice.message, FAILURE_NOTICE);

        let retry = StubClient::answering("Late Blight", 91.0);
        assert_eq!(c.submit_with(&retry), Ok(UiState::ResultShown));
        assert!(c.notice().is_none());
    }

    #[test]
    fn failed_resubmit_shows_error_not_the_old_result() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let client = StubClient::answering("Late Blight", 91.0);
        assert_eq!(c.submit_with(&client), Ok(UiState::ResultShown));

        let ticket = c.submit().unwrap();
        assert_eq!(c.state(), UiState::Submitting);
        assert!(c.view().result.is_none());

        c.complete(ticket, Err(PredictError::Transport("connection reset".into())));
        assert_eq!(c.state(), UiState::ErrorShown);
        let view = c.view();
        assert!(view.result.is_none());
        assert_eq!(view.notice.unwrap().kind, NoticeKind::Failure);
    }

    #[test]
    fn malformed_response_is_shown_like_transport_failure() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let client = StubClient::failing(PredictError::MalformedResponse("missing field".into()));
        c.submit_with(&client).unwrap();
        assert_eq!(c.notice().unwrap().message, FAILURE_NOTICE);
    }

    #[test]
    fn outcome_for_replaced_image_is_discarded() {
        let (mut c, _) = controller();
        c.select_image(jpeg("first.jpg")).unwrap();
        let ticket = c.submit().unwrap();

        c.select_image(jpeg("second.jpg")).unwrap();
        assert!(c.is_submitting());
        assert!(matches!(c.submit(), Err(SubmitError::Busy)));

        c.complete(ticket, Ok(prediction("Late Blight", 91.0)));
        assert!(!c.is_submitting());
        assert!(c.prediction().is_none());
        assert_eq!(c.state(), UiState::ImageSelected);
    }

    #[test]
    fn new_image_does_not_show_progress_for_earlier_request() {
        let (mut c, _) = controller();
        c.select_image(jpeg("first.jpg")).unwrap();
        let ticket = c.submit().unwrap();
        let view = c.view();
        assert!(view.show_progress);
        assert!(!view.awaiting_previous);

        c.select_image(jpeg("second.jpg")).unwrap();
        let view = c.view();
        assert!(!view.show_progress);
        assert!(view.awaiting_previous);
        assert!(!view.can_submit);

        c.complete(ticket, Err(PredictError::Transport("timed out".into())));
        let view = c.view();
        assert!(!view.awaiting_previous);
        assert!(view.can_submit);
        assert!(view.notice.is_none());
    }

    #[test]
    fn clearing_during_submit_leaves_idle() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let ticket = c.submit().unwrap();
        c.clear_image();
        assert_eq!(c.state(), UiState::Idle);

        c.complete(ticket, Err(PredictError::Transport("timed out".into())));
        assert_eq!(c.state(), UiState::Idle);
        assert!(c.notice().is_none());
    }

    #[test]
    fn drag_hover_does_not_touch_other_state() {
        let (mut c, _) = controller();
        c.select_image(jpeg("leaf.jpg")).unwrap();
        let before = c.view();

        c.drag_enter();
        c.drag_over();
        assert!(c.is_drag_hover());
        let during = c.view();
        assert_eq!(during.preview, before.preview);
        assert_eq!(during.state, before.state);

        c.drag_leave();
        assert_eq!(c.view(), before);
    }

    #[test]
    fn drop_uses_first_item_only() {
        let (mut c, _) = controller();
        c.drag_enter();
        c.drop_files(vec![jpeg("dropped.jpg"), jpeg("ignored.jpg")])
            .unwrap();
        assert!(!c.is_drag_hover());
        assert_eq!(c.selected().unwrap().file_name(), "dropped.jpg");
    }

    #[test]
    fn drop_of_non_image_first_item_is_ignored() {
        let (mut c, _) = controller();
        c.drag_enter();
        let items = vec![
            FileCandidate::with_reported_type("clip.mp4", Some("video/mp4"), vec![0u8; 8]),
            jpeg("leaf.jpg"),
        ];
        assert!(matches!(
            c.drop_files(items),
            Err(SelectError::UnsupportedMedia { .. })
        ));
        assert!(!c.is_drag_hover());
        assert!(c.selected().is_none());
    }

    #[test]
    fn empty_drop_reports_nothing_dropped() {
        let (mut c, _) = controller();
        c.drag_enter();
        assert_eq!(c.drop_files(Vec::new()), Err(SelectError::NothingDropped));
        assert!(!c.is_drag_hover());
    }
}
