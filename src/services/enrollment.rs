//! Enrollment lifecycle manager.
//!
//! Orchestrates create/update/delete of enrollments across the schedule
//! aggregate and the pricing engine, keeping every linked record consistent
//! inside one repository transaction. A transaction handle dropped before
//! `commit` discards its staged writes, so early `?` returns roll back.
//!
//! Slots are assumed to have passed the conflict gate when they were
//! created individually; this manager only enforces schedule completeness
//! before pricing runs.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::api::{EnrollmentId, TeacherId};
use crate::db::repository::FullRepository;
use crate::models::time::round2;
use crate::models::{
    merge_enrollment, Enrollment, EnrollmentPatch, NewEnrollment, Room, Schedule, Student, Subject,
    Teacher, TimeSlot,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::pricing;

/// An enrollment with its relations loaded explicitly.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetail {
    pub matricula: Enrollment,
    pub alumno: Student,
    pub profesor: Teacher,
    pub materias: Vec<Subject>,
    pub programacion: Schedule,
    /// Rooms referenced by the schedule's presencial slots
    pub aulas: Vec<Room>,
}

/// Enrollment operations against a repository backend.
pub struct EnrollmentService {
    repository: Arc<dyn FullRepository>,
}

impl EnrollmentService {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// Create an enrollment and its schedule in one transaction.
    ///
    /// Resolution order: student, teacher, subjects, slots. The schedule is
    /// persisted first and the enrollment second; if the enrollment write
    /// fails, the schedule write never becomes visible.
    pub async fn create(&self, input: NewEnrollment) -> ServiceResult<EnrollmentDetail> {
        let repo = self.repository.as_ref();

        let student = repo.find_student(input.id_estudiante).await?.ok_or_else(|| {
            ServiceError::not_found(
                "estudiante",
                format!("estudiante {} does not exist", input.id_estudiante),
            )
        })?;
        let teacher = repo.find_teacher(input.id_usuario).await?.ok_or_else(|| {
            ServiceError::not_found(
                "usuario",
                format!("usuario {} does not exist", input.id_usuario),
            )
        })?;
        let subjects = repo.find_subjects(&input.id_materias).await?;
        if subjects.is_empty() {
            return Err(ServiceError::not_found(
                "materia",
                "none of the requested subjects exist",
            ));
        }
        let slots = repo.find_slots(&input.programacion.horario_id).await?;
        if slots.is_empty() {
            return Err(ServiceError::SlotsNotFound);
        }

        let quote = pricing::quote(input.precio, &slots, input.valor_materiales, input.con_iva);

        let mut tx = repo.begin().await?;
        let schedule_id = tx
            .create_schedule(&slots.iter().map(|s| s.id_horario).collect::<Vec<_>>())
            .await?;

        let now = Utc::now();
        let enrollment = Enrollment {
            id_matricula: EnrollmentId::new(0),
            fecha: input.fecha,
            fecha_inicio: input.fecha_inicio,
            fecha_final: input.fecha_final,
            turno: input.turno,
            cantidad: quote.cantidad,
            precio: input.precio,
            valor_horas: quote.valor_horas,
            valor_materiales: input.valor_materiales,
            con_iva: input.con_iva,
            // Re-rounded at the persistence boundary; idempotent on an
            // already-rounded quote.
            valor_total: round2(quote.valor_total),
            observaciones: input.observaciones,
            is_active: true,
            alumno: student.id_estudiante,
            profesor: teacher.id_usuario,
            materias: subjects.iter().map(|s| s.id_materia).collect(),
            programacion: schedule_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = tx.create_enrollment(&enrollment).await?;
        tx.commit().await?;

        log::info!("created matricula {} (total {})", id, enrollment.valor_total);
        self.find_one(id).await
    }

    /// Fetch one enrollment with its full object graph.
    pub async fn find_one(&self, id: EnrollmentId) -> ServiceResult<EnrollmentDetail> {
        let enrollment = self.repository.find_enrollment(id).await?.ok_or_else(|| {
            ServiceError::not_found("matricula", format!("matricula {} does not exist", id))
        })?;
        self.load_detail(enrollment).await
    }

    /// List active enrollments, newest first. No relations are loaded.
    pub async fn find_all(&self) -> ServiceResult<Vec<Enrollment>> {
        let enrollments = self.repository.list_enrollments().await?;
        if enrollments.is_empty() {
            return Err(ServiceError::not_found("matricula", "no enrollments exist"));
        }
        Ok(enrollments)
    }

    /// List enrollments taught by one teacher, relations loaded.
    pub async fn list_by_teacher(&self, teacher: TeacherId) -> ServiceResult<Vec<EnrollmentDetail>> {
        let enrollments = self.repository.list_enrollments_by_teacher(teacher).await?;
        if enrollments.is_empty() {
            return Err(ServiceError::not_found(
                "matricula",
                format!("no enrollments exist for usuario {}", teacher),
            ));
        }
        let mut details = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            details.push(self.load_detail(enrollment).await?);
        }
        Ok(details)
    }

    /// The active slots of an enrollment's schedule.
    pub async fn schedule_by_enrollment(&self, id: EnrollmentId) -> ServiceResult<Schedule> {
        let enrollment = self.repository.find_enrollment(id).await?.ok_or_else(|| {
            ServiceError::not_found("matricula", format!("matricula {} does not exist", id))
        })?;
        let mut schedule = self.load_schedule(&enrollment).await?;
        schedule.horario.retain(|slot| slot.is_active());
        if schedule.horario.is_empty() {
            return Err(ServiceError::SlotsNotFound);
        }
        Ok(schedule)
    }

    /// The subjects of an enrollment.
    pub async fn subjects_by_enrollment(&self, id: EnrollmentId) -> ServiceResult<Vec<Subject>> {
        let enrollment = self.repository.find_enrollment(id).await?.ok_or_else(|| {
            ServiceError::not_found("matricula", format!("matricula {} does not exist", id))
        })?;
        let subjects = self.repository.find_subjects(&enrollment.materias).await?;
        if subjects.is_empty() {
            return Err(ServiceError::not_found(
                "materia",
                format!("matricula {} has no subjects", id),
            ));
        }
        Ok(subjects)
    }

    /// Partially update an enrollment.
    ///
    /// Identifier fields present in the patch replace the relation; absent
    /// fields retain prior values. A supplied slot list replaces the
    /// schedule's set wholesale. Pricing recomputes unconditionally — the
    /// schedule may have changed even when no priced field did.
    pub async fn update(
        &self,
        id: EnrollmentId,
        patch: EnrollmentPatch,
    ) -> ServiceResult<EnrollmentDetail> {
        let repo = self.repository.as_ref();
        let existing = repo.find_enrollment(id).await?.ok_or_else(|| {
            ServiceError::not_found("matricula", format!("matricula {} does not exist", id))
        })?;

        let alumno = match patch.id_estudiante {
            Some(sid) => {
                repo.find_student(sid)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::not_found(
                            "estudiante",
                            format!("estudiante {} does not exist", sid),
                        )
                    })?
                    .id_estudiante
            }
            None => existing.alumno,
        };
        let profesor = match patch.id_usuario {
            Some(tid) => {
                repo.find_teacher(tid)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::not_found("usuario", format!("usuario {} does not exist", tid))
                    })?
                    .id_usuario
            }
            None => existing.profesor,
        };
        let materias = match patch.id_materias {
            Some(ref ids) => {
                let subjects = repo.find_subjects(ids).await?;
                if subjects.is_empty() {
                    return Err(ServiceError::not_found(
                        "materia",
                        "none of the requested subjects exist",
                    ));
                }
                subjects.iter().map(|s| s.id_materia).collect()
            }
            None => existing.materias.clone(),
        };

        let replacement_slots = match patch.programacion {
            Some(ref schedule) => {
                let slots = repo.find_slots(&schedule.horario_id).await?;
                if slots.is_empty() {
                    return Err(ServiceError::SlotsNotFound);
                }
                Some(slots)
            }
            None => None,
        };

        let mut tx = repo.begin().await?;
        let priced_slots: Vec<TimeSlot> = match replacement_slots {
            Some(slots) => {
                tx.replace_schedule_slots(
                    existing.programacion,
                    &slots.iter().map(|s| s.id_horario).collect::<Vec<_>>(),
                )
                .await?;
                slots
            }
            None => {
                let schedule = self.load_schedule(&existing).await?;
                schedule
                    .horario
                    .into_iter()
                    .filter(|slot| slot.is_active())
                    .collect()
            }
        };

        let mut merged = merge_enrollment(&existing, &patch);
        merged.alumno = alumno;
        merged.profesor = profesor;
        merged.materias = materias;

        let quote = pricing::quote(
            merged.precio,
            &priced_slots,
            merged.valor_materiales,
            merged.con_iva,
        );
        merged.cantidad = quote.cantidad;
        merged.valor_horas = quote.valor_horas;
        merged.valor_total = round2(quote.valor_total);

        tx.save_enrollment(&merged).await?;
        tx.commit().await?;

        log::info!("updated matricula {} (total {})", id, merged.valor_total);
        self.find_one(id).await
    }

    /// Cascading soft-delete of an enrollment.
    ///
    /// One transaction, in order: schedule↔slot join rows, every enrollment
    /// referencing the schedule, the schedule, the target enrollment. Child
    /// join rows go first so referential integrity holds under soft-delete.
    /// Rooms and subjects are shared resources and are never cascaded.
    pub async fn remove(&self, id: EnrollmentId) -> ServiceResult<EnrollmentId> {
        let repo = self.repository.as_ref();
        let existing = repo.find_enrollment(id).await?.ok_or_else(|| {
            ServiceError::not_found("matricula", format!("matricula {} does not exist", id))
        })?;

        let schedule_id = existing.programacion;
        let mut tx = repo.begin().await?;
        tx.delete_schedule_slot_links(schedule_id).await?;
        tx.soft_delete_enrollments_by_schedule(schedule_id).await?;
        tx.soft_delete_schedule(schedule_id).await?;
        tx.soft_delete_enrollment(id).await?;
        tx.commit().await?;

        log::info!("soft-deleted matricula {} and programacion {}", id, schedule_id);
        Ok(id)
    }

    async fn load_schedule(&self, enrollment: &Enrollment) -> ServiceResult<Schedule> {
        self.repository
            .find_schedule(enrollment.programacion)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(
                    "programacion",
                    format!("programacion {} does not exist", enrollment.programacion),
                )
            })
    }

    async fn load_detail(&self, enrollment: Enrollment) -> ServiceResult<EnrollmentDetail> {
        let repo = self.repository.as_ref();
        let alumno = repo.find_student(enrollment.alumno).await?.ok_or_else(|| {
            ServiceError::not_found(
                "estudiante",
                format!("estudiante {} does not exist", enrollment.alumno),
            )
        })?;
        let profesor = repo.find_teacher(enrollment.profesor).await?.ok_or_else(|| {
            ServiceError::not_found(
                "usuario",
                format!("usuario {} does not exist", enrollment.profesor),
            )
        })?;
        let materias = repo.find_subjects(&enrollment.materias).await?;
        let programacion = self.load_schedule(&enrollment).await?;

        let mut aulas: Vec<Room> = Vec::new();
        for slot in &programacion.horario {
            if let Some(aula_id) = slot.aula {
                if aulas.iter().any(|room| room.id_aula == aula_id) {
                    continue;
                }
                if let Some(room) = repo.find_room(aula_id).await? {
                    aulas.push(room);
                }
            }
        }

        Ok(EnrollmentDetail {
            matricula: enrollment,
            alumno,
            profesor,
            materias,
            programacion,
            aulas,
        })
    }
}
