//! Scholarship lead funnel: profile intake, results presentation, and
//! lead capture against the two upstream endpoints.

pub mod controller;
pub mod domain;
pub mod presenter;
pub mod router;
pub mod session;
pub mod upstream;

#[cfg(test)]
mod tests;

pub use controller::{FunnelController, FunnelView, QueryTicket, Stage, NO_MATCHES_MESSAGE};
pub use domain::{
    LeadContact, LeadSubmission, LeadValidationError, Profile, ResultsPayload, ScholarshipResult,
};
pub use presenter::{
    LockedAreaInteraction, LockedCardView, ModalState, ResultsPresenter, ResultsView, TopPickView,
};
pub use router::{funnel_router, FunnelService, ModalAction, SessionView};
pub use session::{FunnelSession, SessionStore};
pub use upstream::{
    GatewayError, HttpJsonGateway, JsonGateway, JsonReply, LeadError, LeadSubmissionClient,
    QueryError, QueryOutcome, ScholarshipQueryClient,
};
