//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies reuse the domain input types (`SlotDraft`,
//! `NewEnrollment`, `EnrollmentPatch`, `NewRoom`), which already carry the
//! wire field names of the relational schema. This module adds the response
//! envelopes.

use serde::{Deserialize, Serialize};

use crate::models::{Enrollment, Room, TimeSlot};
use crate::services::EnrollmentDetail;

pub use crate::models::{EnrollmentPatch, NewEnrollment, NewRoom, SlotDraft};

/// Human-readable confirmation for mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Slot list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    pub horarios: Vec<TimeSlot>,
    pub total: usize,
}

/// Room list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub aulas: Vec<Room>,
    pub total: usize,
}

/// Enrollment list response (no relations loaded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentListResponse {
    pub matriculas: Vec<Enrollment>,
    pub total: usize,
}

/// Enrollment list response with relations loaded.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetailListResponse {
    pub matriculas: Vec<EnrollmentDetail>,
    pub total: usize,
}
