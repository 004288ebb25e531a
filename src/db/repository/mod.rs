//! Repository trait definitions for the enrollment store.
//!
//! Storage backends implement these traits; business logic in
//! `crate::services` depends only on the trait objects. Read-side resolvers
//! return `Option`/empty collections on a miss and never error for absence —
//! mapping absence into the service error taxonomy is the caller's job.
//!
//! Writes that must be atomic go through [`RepositoryTransaction`]: the
//! lifecycle manager stages its persistence primitives against one
//! transaction handle and the backend applies them all-or-nothing on
//! `commit`.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::api::{EnrollmentId, RoomId, ScheduleId, StudentId, SubjectId, TeacherId, TimeSlotId};
use crate::models::{
    Enrollment, Modalidad, NewRoom, Room, Schedule, SlotDraft, Student, Subject, Teacher, TimeSlot,
};

/// Read access to the catalog entities the enrollment core references but
/// does not own: students, teachers, subjects and rooms.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Resolve a student by id. `None` on miss.
    async fn find_student(&self, id: StudentId) -> RepositoryResult<Option<Student>>;

    /// Resolve a teacher by id. `None` on miss.
    async fn find_teacher(&self, id: TeacherId) -> RepositoryResult<Option<Teacher>>;

    /// Resolve a set of subjects. Unknown ids are silently dropped; the
    /// result may be smaller than the input.
    async fn find_subjects(&self, ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>>;

    /// Resolve an active room by id. `None` on miss or soft-deleted.
    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>>;

    /// Create a room.
    async fn create_room(&self, room: &NewRoom) -> RepositoryResult<Room>;

    /// List active rooms in id order.
    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>>;
}

/// Persistence for individual time slots.
///
/// Slot-level conflict gating happens in the service layer before any of
/// the write methods here run.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Resolve one slot by id, soft-deleted included (historical schedules
    /// must keep resolving).
    async fn find_slot(&self, id: TimeSlotId) -> RepositoryResult<Option<TimeSlot>>;

    /// Resolve a set of slot ids to their active slots. Unknown or deleted
    /// ids are dropped; the result may be smaller than the input.
    async fn find_slots(&self, ids: &[TimeSlotId]) -> RepositoryResult<Vec<TimeSlot>>;

    /// List active slots in id order.
    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>>;

    /// List active slots with the given modality, in id order.
    async fn list_slots_by_modalidad(&self, modalidad: Modalidad)
        -> RepositoryResult<Vec<TimeSlot>>;

    /// Insert a new slot. `draft.aula_id` must already be normalized by the
    /// caller (present iff presencial); `horas_diarias` is the derived
    /// duration.
    async fn create_slot(&self, draft: &SlotDraft, horas_diarias: f64)
        -> RepositoryResult<TimeSlot>;

    /// Persist a full slot row (update by `id_horario`).
    async fn update_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot>;

    /// Soft-delete a slot. Fails `NotFound` if the id does not resolve.
    async fn soft_delete_slot(&self, id: TimeSlotId) -> RepositoryResult<()>;
}

/// Read access to enrollments and their schedules.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Resolve an active enrollment by id. `None` on miss or soft-deleted.
    async fn find_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Option<Enrollment>>;

    /// List active enrollments, newest id first.
    async fn list_enrollments(&self) -> RepositoryResult<Vec<Enrollment>>;

    /// List active enrollments taught by the given teacher, newest id first.
    async fn list_enrollments_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> RepositoryResult<Vec<Enrollment>>;

    /// Resolve a schedule with its slot set loaded. Soft-deleted schedules
    /// return `None`; soft-deleted member slots are retained so historical
    /// reads stay complete.
    async fn find_schedule(&self, id: ScheduleId) -> RepositoryResult<Option<Schedule>>;
}

/// One atomic unit of work against the store.
///
/// Operations stage writes; nothing is visible to readers until `commit`,
/// and `commit` applies every staged write or none of them. Dropping the
/// handle without committing discards the staged writes.
///
/// Id-allocating operations (`create_schedule`, `create_enrollment`) hand
/// out their ids eagerly, sequence-style: a rolled-back transaction burns
/// the ids it allocated.
#[async_trait]
pub trait RepositoryTransaction: Send {
    /// Create a schedule owning the given slot id set. Returns the new id.
    async fn create_schedule(&mut self, slot_ids: &[TimeSlotId]) -> RepositoryResult<ScheduleId>;

    /// Replace a schedule's slot set wholesale.
    async fn replace_schedule_slots(
        &mut self,
        schedule: ScheduleId,
        slot_ids: &[TimeSlotId],
    ) -> RepositoryResult<()>;

    /// Insert a new enrollment row. The `id_matricula` field of the passed
    /// value is ignored; the allocated id is returned.
    async fn create_enrollment(&mut self, enrollment: &Enrollment)
        -> RepositoryResult<EnrollmentId>;

    /// Persist a full enrollment row (update by `id_matricula`).
    async fn save_enrollment(&mut self, enrollment: &Enrollment) -> RepositoryResult<()>;

    /// Delete the join rows linking a schedule to its slots.
    async fn delete_schedule_slot_links(&mut self, schedule: ScheduleId) -> RepositoryResult<()>;

    /// Soft-delete every enrollment referencing the schedule.
    async fn soft_delete_enrollments_by_schedule(
        &mut self,
        schedule: ScheduleId,
    ) -> RepositoryResult<()>;

    /// Soft-delete the schedule itself.
    async fn soft_delete_schedule(&mut self, schedule: ScheduleId) -> RepositoryResult<()>;

    /// Soft-delete one enrollment.
    async fn soft_delete_enrollment(&mut self, id: EnrollmentId) -> RepositoryResult<()>;

    /// Apply all staged writes atomically.
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// Discard all staged writes.
    async fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Entry point for atomic units of work.
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    /// Open a new transaction handle.
    async fn begin(&self) -> RepositoryResult<Box<dyn RepositoryTransaction>>;
}

/// Umbrella trait: everything a backend must provide.
#[async_trait]
pub trait FullRepository:
    CatalogRepository + SlotRepository + EnrollmentRepository + TransactionalRepository
{
    /// Verify the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
