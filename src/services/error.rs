//! Business-rule error taxonomy for the enrollment services.
//!
//! Every variant carries a message fit for direct display: it names the
//! offending entity, day or time without needing re-interpretation by the
//! caller. Validation failures abort the enclosing transaction; none are
//! retried, because conflicts here are semantic (duplicate data), not
//! transient.

use crate::api::RoomId;
use crate::db::repository::RepositoryError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {message}")]
    NotFound {
        /// Entity class ("estudiante", "usuario", "materia", "matricula", ...)
        entity: &'static str,
        message: String,
    },

    /// An in-person slot was submitted without a room reference.
    #[error("a room must be specified for the presencial modality")]
    RoomRequired,

    /// The referenced room id does not resolve to an active room.
    #[error("aula {0} not found")]
    RoomNotFound(RoomId),

    /// The candidate slot duplicates an existing allocation.
    #[error("schedule conflict: {reason}")]
    ScheduleConflict { reason: String },

    /// A schedule's slot id list resolved to zero active slots.
    #[error("no time slots exist for the requested schedule")]
    SlotsNotFound,

    /// Storage-layer failure, passed through unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            message: message.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::ScheduleConflict {
            reason: reason.into(),
        }
    }
}
