use serde::{Deserialize, Serialize};

use super::domain::{ResultsPayload, ScholarshipResult};

/// Wheel movement at or below this magnitude is treated as incidental.
const WHEEL_DELTA_THRESHOLD: f64 = 10.0;

/// Gestures observed over the locked-cards region.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockedAreaInteraction {
    Tap,
    Scroll,
    #[serde(rename = "touch")]
    Touch,
    Wheel {
        delta: f64,
    },
}

impl LockedAreaInteraction {
    fn qualifies(self) -> bool {
        match self {
            Self::Tap | Self::Scroll | Self::Touch => true,
            Self::Wheel { delta } => delta.abs() > WHEEL_DELTA_THRESHOLD,
        }
    }
}

/// Which overlay is currently presented, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalState {
    None,
    UnlockTeaser,
    LeadForm,
}

/// Presentation state for the results stage.
///
/// Owns the payload, the partition into top pick and locked cards, the
/// one-shot unlock-prompt latch, and the modal ladder. Signals travel back to
/// the caller as return values; the presenter never mutates session state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPresenter {
    payload: ResultsPayload,
    prompt_shown: bool,
    modal: ModalState,
    lead_error: Option<String>,
}

impl ResultsPresenter {
    /// Builds a presenter for a non-empty payload; `None` when there is
    /// nothing to show, which callers must route to the empty-state branch.
    pub fn new(payload: ResultsPayload) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }
        Some(Self {
            payload,
            prompt_shown: false,
            modal: ModalState::None,
            lead_error: None,
        })
    }

    pub fn payload(&self) -> &ResultsPayload {
        &self.payload
    }

    pub fn top_pick(&self) -> &ScholarshipResult {
        &self.payload.scholarships[0]
    }

    pub fn locked(&self) -> &[ScholarshipResult] {
        &self.payload.scholarships[1..]
    }

    pub fn has_locked(&self) -> bool {
        !self.locked().is_empty()
    }

    pub fn modal(&self) -> ModalState {
        self.modal
    }

    /// Feeds a gesture into the unlock-prompt latch.
    ///
    /// The teaser opens on the first qualifying interaction only; once the
    /// latch is set every later gesture is a no-op, including after the
    /// teaser has been dismissed. Returns whether the teaser opened.
    pub fn observe(&mut self, interaction: LockedAreaInteraction) -> bool {
        if !self.has_locked() || self.prompt_shown || !interaction.qualifies() {
            return false;
        }
        self.prompt_shown = true;
        self.modal = ModalState::UnlockTeaser;
        true
    }

    /// Advances to the lead-capture form.
    ///
    /// With locked cards present the form is only reachable through the
    /// teaser; with nothing locked the capture action is offered directly.
    pub fn request_lead_form(&mut self) -> bool {
        if self.modal == ModalState::UnlockTeaser || !self.has_locked() {
            self.modal = ModalState::LeadForm;
            return true;
        }
        false
    }

    /// Closes whichever modal is open. The prompt latch is deliberately left
    /// set so the teaser never reappears within the session.
    pub fn dismiss_modal(&mut self) {
        self.modal = ModalState::None;
        self.lead_error = None;
    }

    pub fn note_lead_error(&mut self, message: String) {
        self.lead_error = Some(message);
    }

    /// Successful capture closes all modals and clears any inline error.
    pub fn complete_lead(&mut self) {
        self.modal = ModalState::None;
        self.lead_error = None;
    }

    pub fn view(&self) -> ResultsView {
        ResultsView {
            matches_found: self.payload.scholarships.len(),
            summary_probability: self.payload.summary_probability,
            top_pick: TopPickView::from(self.top_pick()),
            locked: self
                .locked()
                .iter()
                .map(|scholarship| LockedCardView {
                    match_score: scholarship.match_score,
                })
                .collect(),
            modal: self.modal,
            lead_error: self.lead_error.clone(),
        }
    }
}

/// Fully visible card for the first match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPickView {
    pub name: String,
    pub amount: String,
    pub deadline: String,
    pub match_score: u8,
    pub one_liner_reason: String,
}

impl From<&ScholarshipResult> for TopPickView {
    fn from(result: &ScholarshipResult) -> Self {
        Self {
            name: result.name.clone(),
            amount: result.amount.clone(),
            deadline: result.deadline.clone(),
            match_score: result.match_score,
            one_liner_reason: result.one_liner_reason.clone(),
        }
    }
}

/// Obscured card; only the match score is exposed before lead capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockedCardView {
    pub match_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub matches_found: usize,
    pub summary_probability: u8,
    pub top_pick: TopPickView,
    pub locked: Vec<LockedCardView>,
    pub modal: ModalState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scholarship(name: &str, score: u8) -> ScholarshipResult {
        ScholarshipResult {
            name: name.to_string(),
            amount: "$500".to_string(),
            deadline: "2025-01-01".to_string(),
            match_score: score,
            one_liner_reason: "strong fit".to_string(),
        }
    }

    fn payload(count: usize) -> ResultsPayload {
        ResultsPayload {
            scholarships: (0..count)
                .map(|idx| scholarship(&format!("S{idx}"), 90 - idx as u8))
                .collect(),
            summary_probability: 80,
        }
    }

    fn presenter(count: usize) -> ResultsPresenter {
        ResultsPresenter::new(payload(count)).expect("non-empty payload")
    }

    #[test]
    fn empty_payload_has_no_presenter() {
        assert!(ResultsPresenter::new(payload(0)).is_none());
    }

    #[test]
    fn partitions_top_pick_from_locked() {
        let presenter = presenter(4);
        assert_eq!(presenter.top_pick().name, "S0");
        assert_eq!(presenter.locked().len(), 3);

        let view = presenter.view();
        assert_eq!(view.matches_found, 4);
        assert_eq!(view.locked.len(), 3);
        assert_eq!(view.locked[0].match_score, 89);
    }

    #[test]
    fn single_match_has_no_locked_cards() {
        let presenter = presenter(1);
        assert_eq!(presenter.top_pick().name, "S0");
        assert!(presenter.locked().is_empty());
    }

    #[test]
    fn first_qualifying_interaction_opens_teaser_once() {
        let mut presenter = presenter(3);

        assert!(presenter.observe(LockedAreaInteraction::Tap));
        assert_eq!(presenter.modal(), ModalState::UnlockTeaser);

        presenter.dismiss_modal();
        assert!(!presenter.observe(LockedAreaInteraction::Scroll));
        assert!(!presenter.observe(LockedAreaInteraction::Tap));
        assert_eq!(presenter.modal(), ModalState::None);
    }

    #[test]
    fn wheel_below_threshold_does_not_trip_the_latch() {
        let mut presenter = presenter(3);

        assert!(!presenter.observe(LockedAreaInteraction::Wheel { delta: 4.0 }));
        assert!(!presenter.observe(LockedAreaInteraction::Wheel { delta: -10.0 }));
        assert_eq!(presenter.modal(), ModalState::None);

        assert!(presenter.observe(LockedAreaInteraction::Wheel { delta: -12.5 }));
        assert_eq!(presenter.modal(), ModalState::UnlockTeaser);
    }

    #[test]
    fn interactions_are_noops_without_locked_cards() {
        let mut presenter = presenter(1);
        assert!(!presenter.observe(LockedAreaInteraction::Tap));
        assert_eq!(presenter.modal(), ModalState::None);
    }

    #[test]
    fn lead_form_requires_teaser_when_cards_are_locked() {
        let mut presenter = presenter(3);
        assert!(!presenter.request_lead_form());

        presenter.observe(LockedAreaInteraction::Touch);
        assert!(presenter.request_lead_form());
        assert_eq!(presenter.modal(), ModalState::LeadForm);
    }

    #[test]
    fn lead_form_is_offered_directly_without_locked_cards() {
        let mut presenter = presenter(1);
        assert!(presenter.request_lead_form());
        assert_eq!(presenter.modal(), ModalState::LeadForm);
    }

    #[test]
    fn completing_lead_clears_modal_and_error() {
        let mut presenter = presenter(2);
        presenter.observe(LockedAreaInteraction::Scroll);
        presenter.request_lead_form();
        presenter.note_lead_error("Failed to submit form".to_string());
        assert_eq!(
            presenter.view().lead_error.as_deref(),
            Some("Failed to submit form")
        );

        presenter.complete_lead();
        assert_eq!(presenter.modal(), ModalState::None);
        assert!(presenter.view().lead_error.is_none());
    }

    #[test]
    fn interaction_payloads_deserialize() {
        let tap: LockedAreaInteraction =
            serde_json::from_str(r#"{"kind":"tap"}"#).expect("tap decodes");
        assert_eq!(tap, LockedAreaInteraction::Tap);

        let wheel: LockedAreaInteraction =
            serde_json::from_str(r#"{"kind":"wheel","delta":14.0}"#).expect("wheel decodes");
        assert_eq!(wheel, LockedAreaInteraction::Wheel { delta: 14.0 });

        let touch: LockedAreaInteraction =
            serde_json::from_str(r#"{"kind":"touch"}"#).expect("touch decodes");
        assert_eq!(touch, LockedAreaInteraction::Touch);
    }
}
