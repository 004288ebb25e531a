//! In-memory repository implementation for unit testing and local
//! development.
//!
//! State lives in a single `parking_lot::RwLock`-guarded store of id-keyed
//! maps. Transactions stage their writes and apply them on `commit` against
//! a clone of the store under one write lock, so a failing op leaves the
//! visible state untouched (all-or-nothing, matching the relational
//! backends).
//!
//! Catalog entities (students, teachers, subjects) are owned by other
//! systems in production; the `seed_*` helpers here exist so tests and
//! local development can populate them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::api::{EnrollmentId, RoomId, ScheduleId, StudentId, SubjectId, TeacherId, TimeSlotId};
use crate::db::repository::{
    CatalogRepository, EnrollmentRepository, ErrorContext, FullRepository, RepositoryError,
    RepositoryResult, RepositoryTransaction, SlotRepository, TransactionalRepository,
};
use crate::models::{
    Enrollment, Modalidad, NewRoom, Room, Schedule, SlotDraft, Student, Subject, Teacher, TimeSlot,
};

#[derive(Debug, Clone)]
struct ScheduleRecord {
    id: i64,
    slot_ids: Vec<i64>,
    deleted_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Store {
    students: HashMap<i64, Student>,
    teachers: HashMap<i64, Teacher>,
    subjects: HashMap<i64, Subject>,
    rooms: HashMap<i64, Room>,
    slots: HashMap<i64, TimeSlot>,
    schedules: HashMap<i64, ScheduleRecord>,
    enrollments: HashMap<i64, Enrollment>,
}

#[derive(Debug, Default)]
struct IdSequences {
    student: AtomicI64,
    teacher: AtomicI64,
    subject: AtomicI64,
    room: AtomicI64,
    slot: AtomicI64,
    schedule: AtomicI64,
    enrollment: AtomicI64,
}

impl IdSequences {
    fn next(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// In-memory implementation of [`FullRepository`].
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    store: Arc<RwLock<Store>>,
    ids: Arc<IdSequences>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a student into the catalog. Returns the stored entity.
    pub fn seed_student(&self, nombre: &str, apellido: &str) -> Student {
        let id = IdSequences::next(&self.ids.student);
        let student = Student {
            id_estudiante: StudentId::new(id),
            nombre: nombre.to_string(),
            apellido: apellido.to_string(),
        };
        self.store.write().students.insert(id, student.clone());
        student
    }

    /// Seed a teacher into the catalog.
    pub fn seed_teacher(&self, nombre: &str, email: &str) -> Teacher {
        let id = IdSequences::next(&self.ids.teacher);
        let teacher = Teacher {
            id_usuario: TeacherId::new(id),
            nombre: nombre.to_string(),
            email: email.to_string(),
        };
        self.store.write().teachers.insert(id, teacher.clone());
        teacher
    }

    /// Seed a subject into the catalog.
    pub fn seed_subject(&self, nombre: &str) -> Subject {
        let id = IdSequences::next(&self.ids.subject);
        let subject = Subject {
            id_materia: SubjectId::new(id),
            nombre: nombre.to_string(),
        };
        self.store.write().subjects.insert(id, subject.clone());
        subject
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn find_student(&self, id: StudentId) -> RepositoryResult<Option<Student>> {
        Ok(self.store.read().students.get(&id.value()).cloned())
    }

    async fn find_teacher(&self, id: TeacherId) -> RepositoryResult<Option<Teacher>> {
        Ok(self.store.read().teachers.get(&id.value()).cloned())
    }

    async fn find_subjects(&self, ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>> {
        let store = self.store.read();
        let mut found: Vec<Subject> = ids
            .iter()
            .filter_map(|id| store.subjects.get(&id.value()).cloned())
            .collect();
        found.sort_by_key(|s| s.id_materia.value());
        found.dedup_by_key(|s| s.id_materia.value());
        Ok(found)
    }

    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>> {
        Ok(self
            .store
            .read()
            .rooms
            .get(&id.value())
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn create_room(&self, room: &NewRoom) -> RepositoryResult<Room> {
        let id = IdSequences::next(&self.ids.room);
        let stored = Room {
            id_aula: RoomId::new(id),
            nombre_aula: room.nombre_aula.clone(),
            capacidad: room.capacidad,
            tipo_aula: room.tipo_aula.clone(),
            deleted_at: None,
        };
        self.store.write().rooms.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        let store = self.store.read();
        let mut rooms: Vec<Room> = store
            .rooms
            .values()
            .filter(|r| r.deleted_at.is_none())
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id_aula.value());
        Ok(rooms)
    }
}

#[async_trait]
impl SlotRepository for LocalRepository {
    async fn find_slot(&self, id: TimeSlotId) -> RepositoryResult<Option<TimeSlot>> {
        Ok(self.store.read().slots.get(&id.value()).cloned())
    }

    async fn find_slots(&self, ids: &[TimeSlotId]) -> RepositoryResult<Vec<TimeSlot>> {
        let store = self.store.read();
        let mut slots: Vec<TimeSlot> = ids
            .iter()
            .filter_map(|id| store.slots.get(&id.value()))
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.id_horario.value());
        slots.dedup_by_key(|s| s.id_horario.value());
        Ok(slots)
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        let store = self.store.read();
        let mut slots: Vec<TimeSlot> = store
            .slots
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.id_horario.value());
        Ok(slots)
    }

    async fn list_slots_by_modalidad(
        &self,
        modalidad: Modalidad,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        let mut slots = self.list_slots().await?;
        slots.retain(|s| s.modalidad == modalidad);
        Ok(slots)
    }

    async fn create_slot(
        &self,
        draft: &SlotDraft,
        horas_diarias: f64,
    ) -> RepositoryResult<TimeSlot> {
        let id = IdSequences::next(&self.ids.slot);
        let slot = TimeSlot {
            id_horario: TimeSlotId::new(id),
            dia: draft.dia,
            hora_inicio: draft.hora_inicio,
            hora_salida: draft.hora_salida,
            horas_diarias,
            modalidad: draft.modalidad,
            aula: draft.aula_id,
            deleted_at: None,
        };
        self.store.write().slots.insert(id, slot.clone());
        Ok(slot)
    }

    async fn update_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        let mut store = self.store.write();
        let id = slot.id_horario.value();
        if !store.slots.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                format!("horario {} does not exist", id),
                ErrorContext::new("update_slot").with_entity("horario").with_entity_id(id),
            ));
        }
        store.slots.insert(id, slot.clone());
        Ok(slot.clone())
    }

    async fn soft_delete_slot(&self, id: TimeSlotId) -> RepositoryResult<()> {
        let mut store = self.store.write();
        match store.slots.get_mut(&id.value()) {
            Some(slot) => {
                slot.deleted_at = Some(Utc::now());
                Ok(())
            }
            None => Err(RepositoryError::not_found_with_context(
                format!("horario {} does not exist", id),
                ErrorContext::new("soft_delete_slot")
                    .with_entity("horario")
                    .with_entity_id(id),
            )),
        }
    }
}

#[async_trait]
impl EnrollmentRepository for LocalRepository {
    async fn find_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Option<Enrollment>> {
        Ok(self
            .store
            .read()
            .enrollments
            .get(&id.value())
            .filter(|e| e.is_active())
            .cloned())
    }

    async fn list_enrollments(&self) -> RepositoryResult<Vec<Enrollment>> {
        let store = self.store.read();
        let mut enrollments: Vec<Enrollment> = store
            .enrollments
            .values()
            .filter(|e| e.is_active())
            .cloned()
            .collect();
        enrollments.sort_by_key(|e| std::cmp::Reverse(e.id_matricula.value()));
        Ok(enrollments)
    }

    async fn list_enrollments_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        let mut enrollments = self.list_enrollments().await?;
        enrollments.retain(|e| e.profesor == teacher);
        Ok(enrollments)
    }

    async fn find_schedule(&self, id: ScheduleId) -> RepositoryResult<Option<Schedule>> {
        let store = self.store.read();
        let record = match store.schedules.get(&id.value()) {
            Some(r) if r.deleted_at.is_none() => r,
            _ => return Ok(None),
        };
        // Soft-deleted member slots stay visible here so historical
        // enrollments keep resolving their full schedule.
        let mut horario: Vec<TimeSlot> = record
            .slot_ids
            .iter()
            .filter_map(|sid| store.slots.get(sid))
            .cloned()
            .collect();
        horario.sort_by_key(|s| s.id_horario.value());
        Ok(Some(Schedule {
            id_programacion: ScheduleId::new(record.id),
            horario,
            deleted_at: record.deleted_at,
        }))
    }
}

enum TxOp {
    InsertSchedule { id: i64, slot_ids: Vec<i64> },
    ReplaceScheduleSlots { id: i64, slot_ids: Vec<i64> },
    InsertEnrollment { enrollment: Enrollment },
    SaveEnrollment { enrollment: Enrollment },
    DeleteScheduleSlotLinks { schedule: i64 },
    SoftDeleteEnrollmentsBySchedule { schedule: i64 },
    SoftDeleteSchedule { schedule: i64 },
    SoftDeleteEnrollment { id: i64 },
}

/// Staged-write transaction over the in-memory store.
pub struct LocalTransaction {
    store: Arc<RwLock<Store>>,
    ids: Arc<IdSequences>,
    ops: Vec<TxOp>,
}

impl LocalTransaction {
    fn apply(store: &mut Store, op: &TxOp) -> RepositoryResult<()> {
        let now = Utc::now();
        match op {
            TxOp::InsertSchedule { id, slot_ids } => {
                store.schedules.insert(
                    *id,
                    ScheduleRecord {
                        id: *id,
                        slot_ids: slot_ids.clone(),
                        deleted_at: None,
                    },
                );
            }
            TxOp::ReplaceScheduleSlots { id, slot_ids } => {
                let record = store.schedules.get_mut(id).ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("programacion {} does not exist", id),
                        ErrorContext::new("replace_schedule_slots")
                            .with_entity("programacion")
                            .with_entity_id(*id),
                    )
                })?;
                record.slot_ids = slot_ids.clone();
            }
            TxOp::InsertEnrollment { enrollment } => {
                let mut stored = enrollment.clone();
                stored.created_at = now;
                stored.updated_at = now;
                store.enrollments.insert(stored.id_matricula.value(), stored);
            }
            TxOp::SaveEnrollment { enrollment } => {
                let id = enrollment.id_matricula.value();
                if !store.enrollments.contains_key(&id) {
                    return Err(RepositoryError::not_found_with_context(
                        format!("matricula {} does not exist", id),
                        ErrorContext::new("save_enrollment")
                            .with_entity("matricula")
                            .with_entity_id(id),
                    ));
                }
                let mut stored = enrollment.clone();
                stored.updated_at = now;
                store.enrollments.insert(id, stored);
            }
            TxOp::DeleteScheduleSlotLinks { schedule } => {
                if let Some(record) = store.schedules.get_mut(schedule) {
                    record.slot_ids.clear();
                }
            }
            TxOp::SoftDeleteEnrollmentsBySchedule { schedule } => {
                for enrollment in store.enrollments.values_mut() {
                    if enrollment.programacion.value() == *schedule && enrollment.is_active() {
                        enrollment.deleted_at = Some(now);
                        enrollment.is_active = false;
                    }
                }
            }
            TxOp::SoftDeleteSchedule { schedule } => {
                let record = store.schedules.get_mut(schedule).ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("programacion {} does not exist", schedule),
                        ErrorContext::new("soft_delete_schedule")
                            .with_entity("programacion")
                            .with_entity_id(*schedule),
                    )
                })?;
                record.deleted_at = Some(now);
            }
            TxOp::SoftDeleteEnrollment { id } => {
                let enrollment = store.enrollments.get_mut(id).ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("matricula {} does not exist", id),
                        ErrorContext::new("soft_delete_enrollment")
                            .with_entity("matricula")
                            .with_entity_id(*id),
                    )
                })?;
                enrollment.deleted_at = Some(now);
                enrollment.is_active = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryTransaction for LocalTransaction {
    async fn create_schedule(&mut self, slot_ids: &[TimeSlotId]) -> RepositoryResult<ScheduleId> {
        let id = IdSequences::next(&self.ids.schedule);
        self.ops.push(TxOp::InsertSchedule {
            id,
            slot_ids: slot_ids.iter().map(|s| s.value()).collect(),
        });
        Ok(ScheduleId::new(id))
    }

    async fn replace_schedule_slots(
        &mut self,
        schedule: ScheduleId,
        slot_ids: &[TimeSlotId],
    ) -> RepositoryResult<()> {
        self.ops.push(TxOp::ReplaceScheduleSlots {
            id: schedule.value(),
            slot_ids: slot_ids.iter().map(|s| s.value()).collect(),
        });
        Ok(())
    }

    async fn create_enrollment(
        &mut self,
        enrollment: &Enrollment,
    ) -> RepositoryResult<EnrollmentId> {
        let id = EnrollmentId::new(IdSequences::next(&self.ids.enrollment));
        let mut staged = enrollment.clone();
        staged.id_matricula = id;
        self.ops.push(TxOp::InsertEnrollment { enrollment: staged });
        Ok(id)
    }

    async fn save_enrollment(&mut self, enrollment: &Enrollment) -> RepositoryResult<()> {
        self.ops.push(TxOp::SaveEnrollment {
            enrollment: enrollment.clone(),
        });
        Ok(())
    }

    async fn delete_schedule_slot_links(&mut self, schedule: ScheduleId) -> RepositoryResult<()> {
        self.ops.push(TxOp::DeleteScheduleSlotLinks {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_enrollments_by_schedule(
        &mut self,
        schedule: ScheduleId,
    ) -> RepositoryResult<()> {
        self.ops.push(TxOp::SoftDeleteEnrollmentsBySchedule {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_schedule(&mut self, schedule: ScheduleId) -> RepositoryResult<()> {
        self.ops.push(TxOp::SoftDeleteSchedule {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_enrollment(&mut self, id: EnrollmentId) -> RepositoryResult<()> {
        self.ops.push(TxOp::SoftDeleteEnrollment { id: id.value() });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let mut guard = self.store.write();
        // Apply against a clone so a failing op leaves visible state intact.
        let mut staged = guard.clone();
        for op in &self.ops {
            Self::apply(&mut staged, op)?;
        }
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionalRepository for LocalRepository {
    async fn begin(&self) -> RepositoryResult<Box<dyn RepositoryTransaction>> {
        Ok(Box::new(LocalTransaction {
            store: Arc::clone(&self.store),
            ids: Arc::clone(&self.ids),
            ops: Vec::new(),
        }))
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
