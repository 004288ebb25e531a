//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{
    EnrollmentDetailListResponse, EnrollmentListResponse, EnrollmentPatch, HealthResponse,
    MessageResponse, NewEnrollment, NewRoom, RoomListResponse, SlotDraft, SlotListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{EnrollmentId, RoomId, TeacherId, TimeSlotId};
use crate::models::{Modalidad, Room, Schedule, Subject, TimeSlot};
use crate::services::EnrollmentDetail;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is
/// accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Time Slots
// =============================================================================

/// POST /v1/horarios
pub async fn create_slot(
    State(state): State<AppState>,
    Json(draft): Json<SlotDraft>,
) -> HandlerResult<TimeSlot> {
    let slot = state.slots().create_slot(draft).await?;
    Ok(Json(slot))
}

/// GET /v1/horarios
pub async fn list_slots(State(state): State<AppState>) -> HandlerResult<SlotListResponse> {
    let horarios = state.slots().list_slots().await?;
    let total = horarios.len();
    Ok(Json(SlotListResponse { horarios, total }))
}

/// GET /v1/horarios/{id}
pub async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<TimeSlot> {
    let slot = state.slots().get_slot(TimeSlotId::new(id)).await?;
    Ok(Json(slot))
}

/// GET /v1/horarios/modalidad/{modalidad}
pub async fn list_slots_by_modalidad(
    State(state): State<AppState>,
    Path(modalidad): Path<String>,
) -> HandlerResult<SlotListResponse> {
    let modalidad: Modalidad = modalidad
        .parse()
        .map_err(AppError::BadRequest)?;
    let horarios = state.slots().list_slots_by_modalidad(modalidad).await?;
    let total = horarios.len();
    Ok(Json(SlotListResponse { horarios, total }))
}

/// PUT /v1/horarios/{id}
pub async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<SlotDraft>,
) -> HandlerResult<TimeSlot> {
    let slot = state.slots().update_slot(TimeSlotId::new(id), draft).await?;
    Ok(Json(slot))
}

/// DELETE /v1/horarios/{id}
pub async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let slot = state.slots().remove_slot(TimeSlotId::new(id)).await?;
    Ok(Json(MessageResponse::new(format!(
        "horario for {} removed",
        slot.dia
    ))))
}

// =============================================================================
// Rooms
// =============================================================================

/// POST /v1/aulas
pub async fn create_room(
    State(state): State<AppState>,
    Json(room): Json<NewRoom>,
) -> HandlerResult<Room> {
    let room = state.slots().create_room(room).await?;
    Ok(Json(room))
}

/// GET /v1/aulas
pub async fn list_rooms(State(state): State<AppState>) -> HandlerResult<RoomListResponse> {
    let aulas = state.slots().list_rooms().await?;
    let total = aulas.len();
    Ok(Json(RoomListResponse { aulas, total }))
}

/// GET /v1/aulas/{id}
pub async fn get_room(State(state): State<AppState>, Path(id): Path<i64>) -> HandlerResult<Room> {
    let room = state.slots().get_room(RoomId::new(id)).await?;
    Ok(Json(room))
}

// =============================================================================
// Enrollments
// =============================================================================

/// POST /v1/matriculas
pub async fn create_enrollment(
    State(state): State<AppState>,
    Json(input): Json<NewEnrollment>,
) -> HandlerResult<EnrollmentDetail> {
    let detail = state.enrollments().create(input).await?;
    Ok(Json(detail))
}

/// GET /v1/matriculas
pub async fn list_enrollments(
    State(state): State<AppState>,
) -> HandlerResult<EnrollmentListResponse> {
    let matriculas = state.enrollments().find_all().await?;
    let total = matriculas.len();
    Ok(Json(EnrollmentListResponse { matriculas, total }))
}

/// GET /v1/matriculas/{id}
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<EnrollmentDetail> {
    let detail = state.enrollments().find_one(EnrollmentId::new(id)).await?;
    Ok(Json(detail))
}

/// PATCH /v1/matriculas/{id}
pub async fn update_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<EnrollmentPatch>,
) -> HandlerResult<EnrollmentDetail> {
    let detail = state
        .enrollments()
        .update(EnrollmentId::new(id), patch)
        .await?;
    Ok(Json(detail))
}

/// DELETE /v1/matriculas/{id}
pub async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    let id = state.enrollments().remove(EnrollmentId::new(id)).await?;
    Ok(Json(MessageResponse::new(format!(
        "matricula {} removed",
        id
    ))))
}

/// GET /v1/matriculas/{id}/horarios
pub async fn get_enrollment_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Schedule> {
    let schedule = state
        .enrollments()
        .schedule_by_enrollment(EnrollmentId::new(id))
        .await?;
    Ok(Json(schedule))
}

/// GET /v1/matriculas/{id}/materias
pub async fn get_enrollment_subjects(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Vec<Subject>> {
    let subjects = state
        .enrollments()
        .subjects_by_enrollment(EnrollmentId::new(id))
        .await?;
    Ok(Json(subjects))
}

/// GET /v1/usuarios/{id}/matriculas
pub async fn list_enrollments_by_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<EnrollmentDetailListResponse> {
    let matriculas = state
        .enrollments()
        .list_by_teacher(TeacherId::new(id))
        .await?;
    let total = matriculas.len();
    Ok(Json(EnrollmentDetailListResponse { matriculas, total }))
}
