//! Public API surface for the enrollment backend.
//!
//! Identifier newtypes for every persisted entity. All types derive
//! Serialize/Deserialize for JSON serialization.

use crate::define_id_type;

define_id_type!(i64, StudentId);
define_id_type!(i64, TeacherId);
define_id_type!(i64, SubjectId);
define_id_type!(i64, RoomId);
define_id_type!(i64, TimeSlotId);
define_id_type!(i64, ScheduleId);
define_id_type!(i64, EnrollmentId);

pub use crate::models::time::TimeOfDay;
