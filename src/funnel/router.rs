use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::UpstreamConfig;

use super::controller::{FunnelController, FunnelView};
use super::domain::{LeadContact, Profile};
use super::presenter::LockedAreaInteraction;
use super::session::{FunnelSession, SessionStore};
use super::upstream::{JsonGateway, LeadSubmissionClient, ScholarshipQueryClient};

/// Shared state for the funnel API: the upstream gateway, endpoint
/// configuration, and the live session registry.
pub struct FunnelService<G> {
    gateway: Arc<G>,
    upstream: UpstreamConfig,
    store: SessionStore<G>,
}

/// Snapshot returned by every session route.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub funnel: FunnelView,
}

/// Modal controls issued from the teaser and lead-form overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModalAction {
    /// "Continue to Unlock": teaser advances to the lead form.
    Continue,
    Dismiss,
}

impl<G: JsonGateway> FunnelService<G> {
    pub fn new(gateway: Arc<G>, upstream: UpstreamConfig) -> Self {
        Self {
            gateway,
            upstream,
            store: SessionStore::new(),
        }
    }

    pub fn store(&self) -> &SessionStore<G> {
        &self.store
    }

    fn controller(&self) -> FunnelController<G> {
        FunnelController::new(
            ScholarshipQueryClient::new(
                self.gateway.clone(),
                self.upstream.scholarship_base_url.clone(),
            ),
            LeadSubmissionClient::new(self.gateway.clone(), self.upstream.lead_base_url.clone()),
        )
    }

    pub async fn create_session(&self) -> SessionView {
        let session = self.store.create(self.controller());
        let session = session.lock().await;
        view_of(&session)
    }

    pub async fn session_view(&self, id: u64) -> Option<SessionView> {
        let session = self.store.get(id)?;
        let session = session.lock().await;
        Some(view_of(&session))
    }

    pub async fn submit_profile(&self, id: u64, profile: Profile) -> Option<SessionView> {
        let session = self.store.get(id)?;
        let mut session = session.lock().await;
        session.controller.submit_profile(profile).await;
        Some(view_of(&session))
    }

    pub async fn interact(
        &self,
        id: u64,
        interaction: LockedAreaInteraction,
    ) -> Option<SessionView> {
        let session = self.store.get(id)?;
        let mut session = session.lock().await;
        session.controller.observe_interaction(interaction);
        Some(view_of(&session))
    }

    pub async fn modal(&self, id: u64, action: ModalAction) -> Option<SessionView> {
        let session = self.store.get(id)?;
        let mut session = session.lock().await;
        match action {
            ModalAction::Continue => {
                session.controller.request_lead_form();
            }
            ModalAction::Dismiss => session.controller.dismiss_modal(),
        }
        Some(view_of(&session))
    }

    pub async fn capture_lead(&self, id: u64, contact: LeadContact) -> Option<SessionView> {
        let session = self.store.get(id)?;
        let mut session = session.lock().await;
        session.controller.capture_lead(contact).await;
        Some(view_of(&session))
    }
}

fn view_of<G: JsonGateway>(session: &FunnelSession<G>) -> SessionView {
    SessionView {
        session_id: session.id,
        created_at: session.created_at,
        funnel: session.controller.view(),
    }
}

/// Router builder exposing the funnel session endpoints.
pub fn funnel_router<G: JsonGateway + 'static>(service: Arc<FunnelService<G>>) -> Router {
    Router::new()
        .route("/api/v1/funnel/sessions", post(create_session_handler::<G>))
        .route(
            "/api/v1/funnel/sessions/:session_id",
            get(session_view_handler::<G>),
        )
        .route(
            "/api/v1/funnel/sessions/:session_id/profile",
            post(submit_profile_handler::<G>),
        )
        .route(
            "/api/v1/funnel/sessions/:session_id/interactions",
            post(interaction_handler::<G>),
        )
        .route(
            "/api/v1/funnel/sessions/:session_id/modal",
            post(modal_handler::<G>),
        )
        .route(
            "/api/v1/funnel/sessions/:session_id/lead",
            post(lead_handler::<G>),
        )
        .with_state(service)
}

pub(crate) async fn create_session_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
) -> Response {
    let view = service.create_session().await;
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn session_view_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
    Path(session_id): Path<u64>,
) -> Response {
    match service.session_view(session_id).await {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => not_found(session_id),
    }
}

pub(crate) async fn submit_profile_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
    Path(session_id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let profile = match body {
        Value::Object(fields) => Profile(fields),
        _ => {
            let payload = json!({ "error": "profile must be a JSON object" });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    match service.submit_profile(session_id, profile).await {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => not_found(session_id),
    }
}

pub(crate) async fn interaction_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
    Path(session_id): Path<u64>,
    Json(interaction): Json<LockedAreaInteraction>,
) -> Response {
    match service.interact(session_id, interaction).await {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => not_found(session_id),
    }
}

pub(crate) async fn modal_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
    Path(session_id): Path<u64>,
    Json(action): Json<ModalAction>,
) -> Response {
    match service.modal(session_id, action).await {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => not_found(session_id),
    }
}

pub(crate) async fn lead_handler<G: JsonGateway + 'static>(
    State(service): State<Arc<FunnelService<G>>>,
    Path(session_id): Path<u64>,
    Json(contact): Json<LeadContact>,
) -> Response {
    match service.capture_lead(session_id, contact).await {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => not_found(session_id),
    }
}

fn not_found(session_id: u64) -> Response {
    let payload = json!({
        "error": "session not found",
        "session_id": session_id,
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}
