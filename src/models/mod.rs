//! Domain model: time-of-day arithmetic and the enrollment entity graph.

pub mod macros;

pub mod enrollment;
pub mod time;

pub use enrollment::{
    merge_enrollment, Dia, Enrollment, EnrollmentPatch, Modalidad, NewEnrollment, NewRoom, Room,
    Schedule, ScheduleDraft, SlotDraft, Student, Subject, Teacher, TimeSlot, Turno,
};
pub use time::{daily_hours, round2, TimeOfDay};
