//! Repository-level behavior of the in-memory backend: transaction
//! atomicity, soft-delete filtering, and join-row handling.

use std::sync::Arc;

use chrono::NaiveDate;
use matriculas_rust::api::{EnrollmentId, ScheduleId, TimeSlotId};
use matriculas_rust::db::repositories::LocalRepository;
use matriculas_rust::db::repository::{
    EnrollmentRepository, FullRepository, RepositoryError, SlotRepository,
    TransactionalRepository,
};
use matriculas_rust::models::{Dia, Enrollment, Modalidad, SlotDraft, Turno};

fn draft(dia: Dia, inicio: &str, salida: &str) -> SlotDraft {
    SlotDraft {
        dia,
        hora_inicio: inicio.parse().unwrap(),
        hora_salida: salida.parse().unwrap(),
        modalidad: Modalidad::Virtual,
        aula_id: None,
    }
}

fn enrollment_for(repo: &LocalRepository, schedule: ScheduleId) -> Enrollment {
    let student = repo.seed_student("Eva", "Paz");
    let teacher = repo.seed_teacher("Raul", "raul@academia.ec");
    let subject = repo.seed_subject("Quimica");
    Enrollment {
        id_matricula: EnrollmentId::new(0),
        fecha: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        fecha_inicio: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        fecha_final: NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
        turno: Turno::Tarde,
        cantidad: 2.0,
        precio: 10.0,
        valor_horas: 20.0,
        valor_materiales: None,
        con_iva: false,
        valor_total: 20.0,
        observaciones: "".to_string(),
        is_active: true,
        alumno: student.id_estudiante,
        profesor: teacher.id_usuario,
        materias: vec![subject.id_materia],
        programacion: schedule,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        deleted_at: None,
    }
}

#[tokio::test]
async fn test_commit_makes_staged_writes_visible_atomically() {
    let repo = LocalRepository::new();
    let slot = repo.create_slot(&draft(Dia::Lunes, "08:00", "10:00"), 2.0).await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let schedule_id = tx.create_schedule(&[slot.id_horario]).await.unwrap();
    let enrollment_id = tx
        .create_enrollment(&enrollment_for(&repo, schedule_id))
        .await
        .unwrap();

    // Nothing visible before commit.
    assert!(repo.find_schedule(schedule_id).await.unwrap().is_none());
    assert!(repo.find_enrollment(enrollment_id).await.unwrap().is_none());

    tx.commit().await.unwrap();

    let schedule = repo.find_schedule(schedule_id).await.unwrap().unwrap();
    assert_eq!(schedule.horario.len(), 1);
    assert!(repo.find_enrollment(enrollment_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rollback_discards_staged_writes() {
    let repo = LocalRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let schedule_id = tx.create_schedule(&[]).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(repo.find_schedule(schedule_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failing_op_rolls_back_the_whole_commit() {
    let repo = LocalRepository::new();

    let mut tx = repo.begin().await.unwrap();
    let schedule_id = tx.create_schedule(&[]).await.unwrap();
    // Saving an enrollment that was never created must fail the commit ...
    let mut ghost = enrollment_for(&repo, schedule_id);
    ghost.id_matricula = EnrollmentId::new(404);
    tx.save_enrollment(&ghost).await.unwrap();

    let result = tx.commit().await;
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

    // ... leaving the schedule insert invisible too.
    assert!(repo.find_schedule(schedule_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_dropped_transaction_commits_nothing() {
    let repo = LocalRepository::new();
    let schedule_id;
    {
        let mut tx = repo.begin().await.unwrap();
        schedule_id = tx.create_schedule(&[]).await.unwrap();
        // dropped without commit
    }
    assert!(repo.find_schedule(schedule_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_schedule_slot_links_keeps_slots() {
    let repo = LocalRepository::new();
    let slot = repo.create_slot(&draft(Dia::Lunes, "08:00", "10:00"), 2.0).await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let schedule_id = tx.create_schedule(&[slot.id_horario]).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    tx.delete_schedule_slot_links(schedule_id).await.unwrap();
    tx.commit().await.unwrap();

    let schedule = repo.find_schedule(schedule_id).await.unwrap().unwrap();
    assert!(schedule.horario.is_empty());
    // The slot row itself is untouched.
    assert!(repo.find_slot(slot.id_horario).await.unwrap().is_some());
}

#[tokio::test]
async fn test_soft_delete_cascade_order() {
    let repo = LocalRepository::new();
    let slot = repo.create_slot(&draft(Dia::Lunes, "08:00", "10:00"), 2.0).await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let schedule_id = tx.create_schedule(&[slot.id_horario]).await.unwrap();
    let enrollment_id = tx
        .create_enrollment(&enrollment_for(&repo, schedule_id))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    tx.delete_schedule_slot_links(schedule_id).await.unwrap();
    tx.soft_delete_enrollments_by_schedule(schedule_id).await.unwrap();
    tx.soft_delete_schedule(schedule_id).await.unwrap();
    tx.soft_delete_enrollment(enrollment_id).await.unwrap();
    tx.commit().await.unwrap();

    assert!(repo.find_enrollment(enrollment_id).await.unwrap().is_none());
    assert!(repo.find_schedule(schedule_id).await.unwrap().is_none());
    assert!(repo.find_slot(slot.id_horario).await.unwrap().is_some());
}

#[tokio::test]
async fn test_find_slots_drops_unknown_and_deleted_ids() {
    let repo = LocalRepository::new();
    let keep = repo.create_slot(&draft(Dia::Lunes, "08:00", "10:00"), 2.0).await.unwrap();
    let gone = repo.create_slot(&draft(Dia::Martes, "08:00", "10:00"), 2.0).await.unwrap();
    repo.soft_delete_slot(gone.id_horario).await.unwrap();

    let slots = repo
        .find_slots(&[keep.id_horario, gone.id_horario, TimeSlotId::new(999)])
        .await
        .unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].id_horario, keep.id_horario);
}

#[tokio::test]
async fn test_soft_deleted_slot_still_findable_by_id() {
    let repo = LocalRepository::new();
    let slot = repo.create_slot(&draft(Dia::Lunes, "08:00", "10:00"), 2.0).await.unwrap();
    repo.soft_delete_slot(slot.id_horario).await.unwrap();

    // find_slot keeps resolving tombstones for historical schedules.
    let found = repo.find_slot(slot.id_horario).await.unwrap().unwrap();
    assert!(found.deleted_at.is_some());
    // Active listings exclude it.
    assert!(repo.list_slots().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_resolvers_return_absent_on_miss() {
    let repo = LocalRepository::new();
    use matriculas_rust::api::{RoomId, StudentId, SubjectId, TeacherId};
    use matriculas_rust::db::repository::CatalogRepository;

    assert!(repo.find_student(StudentId::new(1)).await.unwrap().is_none());
    assert!(repo.find_teacher(TeacherId::new(1)).await.unwrap().is_none());
    assert!(repo.find_room(RoomId::new(1)).await.unwrap().is_none());
    assert!(repo
        .find_subjects(&[SubjectId::new(1), SubjectId::new(2)])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_health_check() {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    assert!(repo.health_check().await.unwrap());
}
