use serde::Serialize;
use tracing::{debug, info};

use super::domain::{LeadContact, Profile};
use super::presenter::{LockedAreaInteraction, ResultsPresenter, ResultsView};
use super::upstream::{
    JsonGateway, LeadSubmissionClient, QueryError, QueryOutcome, ScholarshipQueryClient,
};

/// Message shown when a calculation succeeds but matches nothing.
pub const NO_MATCHES_MESSAGE: &str = "No direct matches found. Consultation recommended.";

/// Top-level phase of a funnel session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Results,
    ThankYou,
}

impl Stage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Results => "Results",
            Self::ThankYou => "Thank You",
        }
    }
}

/// Tag for an issued calculation request. A resolution whose ticket is no
/// longer the latest one issued is discarded, so a slow first response can
/// never overwrite the state of a later resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    seq: u64,
}

/// Owner of all session state: stage, profile, results presentation, and the
/// loading/error flags. No other component writes this state.
pub struct FunnelController<G> {
    scholarships: ScholarshipQueryClient<G>,
    leads: LeadSubmissionClient<G>,
    stage: Stage,
    profile: Option<Profile>,
    presenter: Option<ResultsPresenter>,
    loading: bool,
    error: Option<String>,
    request_seq: u64,
}

impl<G: JsonGateway> FunnelController<G> {
    pub fn new(scholarships: ScholarshipQueryClient<G>, leads: LeadSubmissionClient<G>) -> Self {
        Self {
            scholarships,
            leads,
            stage: Stage::Input,
            profile: None,
            presenter: None,
            loading: false,
            error: None,
            request_seq: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn presenter(&self) -> Option<&ResultsPresenter> {
        self.presenter.as_ref()
    }

    /// Submits the profile and applies the response to session state.
    ///
    /// A completed session is terminal: once the stage is ThankYou the
    /// submission is ignored and no upstream call is made.
    pub async fn submit_profile(&mut self, profile: Profile) {
        if self.stage == Stage::ThankYou {
            debug!("ignoring profile submission on a completed session");
            return;
        }
        let ticket = self.begin_query();
        let outcome = self.scholarships.query(&profile).await;
        self.resolve_query(ticket, profile, outcome);
    }

    /// Marks a calculation in flight and hands back its ticket.
    pub fn begin_query(&mut self) -> QueryTicket {
        self.loading = true;
        self.error = None;
        self.request_seq += 1;
        QueryTicket {
            seq: self.request_seq,
        }
    }

    /// Applies a finished calculation unless a newer request has been issued.
    pub fn resolve_query(
        &mut self,
        ticket: QueryTicket,
        profile: Profile,
        outcome: Result<QueryOutcome, QueryError>,
    ) {
        if ticket.seq != self.request_seq {
            debug!(
                ticket = ticket.seq,
                current = self.request_seq,
                "discarding stale calculation response"
            );
            return;
        }
        if self.stage == Stage::ThankYou {
            debug!("discarding calculation response for a completed session");
            self.loading = false;
            return;
        }

        self.loading = false;
        match outcome {
            Ok(QueryOutcome::Matches(payload)) => match ResultsPresenter::new(payload) {
                Some(presenter) => {
                    info!(
                        matches = presenter.payload().scholarships.len(),
                        "entering results stage"
                    );
                    self.profile = Some(profile);
                    self.presenter = Some(presenter);
                    self.stage = Stage::Results;
                }
                None => self.error = Some(NO_MATCHES_MESSAGE.to_string()),
            },
            Ok(QueryOutcome::NoMatches) => self.error = Some(NO_MATCHES_MESSAGE.to_string()),
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    /// Routes a locked-area gesture to the presenter; no-op outside Results.
    pub fn observe_interaction(&mut self, interaction: LockedAreaInteraction) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => presenter.observe(interaction),
            None => false,
        }
    }

    pub fn request_lead_form(&mut self) -> bool {
        match self.presenter.as_mut() {
            Some(presenter) => presenter.request_lead_form(),
            None => false,
        }
    }

    pub fn dismiss_modal(&mut self) {
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.dismiss_modal();
        }
    }

    /// Submits the captured contact; on success the session advances to the
    /// thank-you stage. Returns whether the stage advanced.
    pub async fn capture_lead(&mut self, contact: LeadContact) -> bool {
        if self.stage != Stage::Results {
            return false;
        }
        let (profile, results) = match (&self.profile, &self.presenter) {
            (Some(profile), Some(presenter)) => (profile.clone(), presenter.payload().clone()),
            _ => return false,
        };

        match self.leads.submit(&contact, &profile, &results).await {
            Ok(()) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.complete_lead();
                }
                self.advance_to_thank_you();
                true
            }
            Err(err) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.note_lead_error(err.to_string());
                }
                false
            }
        }
    }

    /// Results -> ThankYou; a no-op from any other stage.
    pub fn advance_to_thank_you(&mut self) {
        if self.stage == Stage::Results {
            info!("entering thank-you stage");
            self.stage = Stage::ThankYou;
        }
    }

    pub fn view(&self) -> FunnelView {
        let results = match self.stage {
            Stage::Results => self.presenter.as_ref().map(ResultsPresenter::view),
            Stage::Input | Stage::ThankYou => None,
        };
        FunnelView {
            stage: self.stage,
            loading: self.loading,
            error: self.error.clone(),
            results,
        }
    }
}

/// Serializable snapshot of a session, rendered by the API and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelView {
    pub stage: Stage,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsView>,
}
