use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use peerly_core::{AttemptId, BookingId, Error, FilterCriteria, SlotId, StudentId, TutorId};
use peerly_engine::BookingService;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;

// Request bodies
#[derive(Deserialize)]
struct BeginBookingRequest {
    student_id: StudentId,
    tutor_id: TutorId,
    subject_code: String,
}

#[derive(Deserialize)]
struct SelectSlotRequest {
    slot_id: SlotId,
}

#[derive(Deserialize)]
struct BookingsParams {
    #[serde(default)]
    student: Option<StudentId>,
    #[serde(default)]
    tutor: Option<TutorId>,
}

pub struct PeerlyServer {
    pub service: Arc<BookingService>,
}

#[derive(Clone)]
struct AppState {
    server: Arc<PeerlyServer>,
}

impl PeerlyServer {
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }

    pub fn router(self: Arc<Self>) -> Router {
        let app_state = AppState { server: self };

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handle_info))
            // Discovery
            .route("/api/search", post(api_search))
            .route("/api/tutors/:id", get(api_get_tutor))
            .route("/api/slots/:id/availability", get(api_slot_availability))
            // Booking attempts
            .route("/api/attempts", post(api_begin_booking))
            .route("/api/attempts/:id", get(api_get_attempt).delete(api_abort_attempt))
            .route("/api/attempts/:id/slot", post(api_select_slot))
            .route("/api/attempts/:id/commit", post(api_commit_attempt))
            // Booking records
            .route("/api/bookings", get(api_list_bookings))
            .route("/api/bookings/:id", get(api_get_booking))
            .route("/api/bookings/:id/approve", post(api_approve_booking))
            .route("/api/bookings/:id/decline", post(api_decline_booking))
            .route("/api/bookings/:id/cancel", post(api_cancel_booking))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(app_state)
    }

    pub async fn serve(service: Arc<BookingService>, host: &str, port: u16) -> anyhow::Result<()> {
        let app = Arc::new(Self::new(service)).router();

        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await?;

        info!("peerly server listening on {}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// GET /health - Server info
async fn handle_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let directory = state.server.service.directory().await;
    Json(serde_json::json!({
        "name": "peerly",
        "version": env!("CARGO_PKG_VERSION"),
        "tutors": directory.len(),
    }))
}

// ============================================================================
// Discovery
// ============================================================================

/// POST /api/search - Filter (and optionally rank) tutors
async fn api_search(
    State(state): State<AppState>,
    payload: Result<Json<FilterCriteria>, JsonRejection>,
) -> Response {
    let criteria = match payload {
        Ok(Json(criteria)) => criteria,
        Err(rejection) => return ApiError(Error::InvalidValue(rejection.body_text())).into_response(),
    };
    let tutors = state.server.service.search(&criteria).await;
    Json(tutors).into_response()
}

/// GET /api/tutors/:id - Tutor profile with its slots
async fn api_get_tutor(State(state): State<AppState>, Path(id): Path<TutorId>) -> Response {
    match state.server.service.tutor(&id).await {
        Ok(tutor) => Json(tutor).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/slots/:id/availability - Seats left on a slot
async fn api_slot_availability(State(state): State<AppState>, Path(id): Path<SlotId>) -> Response {
    match state.server.service.availability(&id) {
        Ok(availability) => Json(availability).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

// ============================================================================
// Booking attempts
// ============================================================================

/// POST /api/attempts - Start booking a tutor for a subject
async fn api_begin_booking(
    State(state): State<AppState>,
    Json(req): Json<BeginBookingRequest>,
) -> Response {
    match state
        .server
        .service
        .begin_booking(req.student_id, &req.tutor_id, &req.subject_code)
        .await
    {
        Ok(attempt) => (StatusCode::CREATED, Json(attempt)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/attempts/:id - Current state of an attempt
async fn api_get_attempt(State(state): State<AppState>, Path(id): Path<AttemptId>) -> Response {
    match state.server.service.attempt(&id) {
        Ok(attempt) => Json(attempt).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/attempts/:id/slot - Pick (or re-pick) the slot
async fn api_select_slot(
    State(state): State<AppState>,
    Path(id): Path<AttemptId>,
    Json(req): Json<SelectSlotRequest>,
) -> Response {
    match state.server.service.select_slot(&id, &req.slot_id).await {
        Ok(attempt) => Json(attempt).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/attempts/:id/commit - Take the seat and create the booking
async fn api_commit_attempt(State(state): State<AppState>, Path(id): Path<AttemptId>) -> Response {
    match state.server.service.commit(&id).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// DELETE /api/attempts/:id - Abandon an attempt before commit
async fn api_abort_attempt(State(state): State<AppState>, Path(id): Path<AttemptId>) -> Response {
    match state.server.service.abort(&id) {
        Ok(()) => Json(serde_json::json!({
            "message": format!("Attempt '{}' aborted", id)
        }))
        .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

// ============================================================================
// Booking records
// ============================================================================

/// GET /api/bookings?student=&tutor= - Booking history of a party
async fn api_list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingsParams>,
) -> Response {
    let service = &state.server.service;
    let result = match (params.student, params.tutor) {
        (Some(student), tutor) => service.bookings_for_student(&student).await.map(|records| {
            records
                .into_iter()
                .filter(|record| tutor.as_ref().is_none_or(|t| &record.tutor_id == t))
                .collect::<Vec<_>>()
        }),
        (None, Some(tutor)) => service.bookings_for_tutor(&tutor).await,
        (None, None) => {
            return (StatusCode::BAD_REQUEST, "Query parameter 'student' or 'tutor' is required")
                .into_response();
        }
    };

    match result {
        Ok(records) => Json(records).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /api/bookings/:id - One booking record
async fn api_get_booking(State(state): State<AppState>, Path(id): Path<BookingId>) -> Response {
    match state.server.service.booking(&id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/bookings/:id/approve - Tutor accepts a pending booking
async fn api_approve_booking(State(state): State<AppState>, Path(id): Path<BookingId>) -> Response {
    match state.server.service.approve(&id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/bookings/:id/decline - Tutor rejects a pending booking
async fn api_decline_booking(State(state): State<AppState>, Path(id): Path<BookingId>) -> Response {
    match state.server.service.decline(&id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// POST /api/bookings/:id/cancel - Either party cancels
async fn api_cancel_booking(State(state): State<AppState>, Path(id): Path<BookingId>) -> Response {
    match state.server.service.cancel(&id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
