//! Enrollment lifecycle: create/update/cascading-delete through the service
//! layer against the in-memory repository.

use std::sync::Arc;

use chrono::NaiveDate;
use matriculas_rust::api::{EnrollmentId, StudentId, SubjectId, TeacherId, TimeSlotId};
use matriculas_rust::db::repositories::LocalRepository;
use matriculas_rust::db::repository::{EnrollmentRepository, FullRepository};
use matriculas_rust::models::{
    Dia, EnrollmentPatch, Modalidad, NewEnrollment, NewRoom, ScheduleDraft, SlotDraft, Turno,
};
use matriculas_rust::services::{EnrollmentService, ServiceError, SlotService};

struct Fixture {
    repo: Arc<LocalRepository>,
    enrollments: EnrollmentService,
    slots: SlotService,
    student: StudentId,
    teacher: TeacherId,
    subjects: Vec<SubjectId>,
}

async fn fixture() -> Fixture {
    let repo = Arc::new(LocalRepository::new());
    let full = Arc::clone(&repo) as Arc<dyn FullRepository>;
    let enrollments = EnrollmentService::new(Arc::clone(&full));
    let slots = SlotService::new(full);

    let student = repo.seed_student("Ana", "Mora").id_estudiante;
    let teacher = repo.seed_teacher("Luis", "luis@academia.ec").id_usuario;
    let subjects = vec![
        repo.seed_subject("Matematicas").id_materia,
        repo.seed_subject("Fisica").id_materia,
    ];

    Fixture {
        repo,
        enrollments,
        slots,
        student,
        teacher,
        subjects,
    }
}

async fn virtual_slot(fx: &Fixture, dia: Dia, inicio: &str, salida: &str) -> TimeSlotId {
    fx.slots
        .create_slot(SlotDraft {
            dia,
            hora_inicio: inicio.parse().unwrap(),
            hora_salida: salida.parse().unwrap(),
            modalidad: Modalidad::Virtual,
            aula_id: None,
        })
        .await
        .unwrap()
        .id_horario
}

fn new_enrollment(fx: &Fixture, slot_ids: Vec<TimeSlotId>) -> NewEnrollment {
    NewEnrollment {
        fecha: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        fecha_inicio: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        fecha_final: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        turno: Turno::Manana,
        id_estudiante: fx.student,
        id_usuario: fx.teacher,
        id_materias: fx.subjects.clone(),
        programacion: ScheduleDraft {
            horario_id: slot_ids,
        },
        precio: 10.0,
        valor_materiales: Some(20.0),
        con_iva: true,
        observaciones: "".to_string(),
    }
}

#[tokio::test]
async fn test_create_computes_pricing_and_links_schedule() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;
    let s2 = virtual_slot(&fx, Dia::Martes, "14:00", "17:00").await;

    let detail = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1, s2]))
        .await
        .unwrap();

    // unitPrice=10, 5 hours, materials=20, VAT → 80.50
    let m = &detail.matricula;
    assert_eq!(m.cantidad, 5.0);
    assert_eq!(m.valor_horas, 50.0);
    assert_eq!(m.valor_total, 80.5);
    assert!(m.is_active);

    assert_eq!(detail.alumno.id_estudiante, fx.student);
    assert_eq!(detail.profesor.id_usuario, fx.teacher);
    assert_eq!(detail.materias.len(), 2);
    assert_eq!(detail.programacion.horario.len(), 2);
}

#[tokio::test]
async fn test_create_fails_naming_the_missing_entity() {
    let fx = fixture().await;
    let slot = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;

    let mut missing_student = new_enrollment(&fx, vec![slot]);
    missing_student.id_estudiante = StudentId::new(999);
    match fx.enrollments.create(missing_student).await {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "estudiante"),
        other => panic!("expected estudiante NotFound, got {:?}", other.map(|d| d.matricula)),
    }

    let mut missing_teacher = new_enrollment(&fx, vec![slot]);
    missing_teacher.id_usuario = TeacherId::new(999);
    match fx.enrollments.create(missing_teacher).await {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "usuario"),
        other => panic!("expected usuario NotFound, got {:?}", other.map(|d| d.matricula)),
    }

    let mut missing_subjects = new_enrollment(&fx, vec![slot]);
    missing_subjects.id_materias = vec![SubjectId::new(999)];
    match fx.enrollments.create(missing_subjects).await {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "materia"),
        other => panic!("expected materia NotFound, got {:?}", other.map(|d| d.matricula)),
    }

    let missing_slots = new_enrollment(&fx, vec![TimeSlotId::new(999)]);
    assert!(matches!(
        fx.enrollments.create(missing_slots).await,
        Err(ServiceError::SlotsNotFound)
    ));
}

#[tokio::test]
async fn test_schedule_replacement_reprices_unchanged_fields() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;
    let s2 = virtual_slot(&fx, Dia::Martes, "14:00", "17:00").await;
    let s3 = virtual_slot(&fx, Dia::Viernes, "09:00", "12:00").await;

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1, s2]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;

    // Scenario D: only the schedule changes (now 3 hours); price, materials
    // and VAT are untouched but everything derived recomputes.
    let patch = EnrollmentPatch {
        programacion: Some(ScheduleDraft {
            horario_id: vec![s3],
        }),
        ..Default::default()
    };
    let updated = fx.enrollments.update(id, patch).await.unwrap();

    let m = &updated.matricula;
    assert_eq!(m.cantidad, 3.0);
    assert_eq!(m.valor_horas, 30.0);
    // (30 + 20) * 1.15 = 57.50
    assert_eq!(m.valor_total, 57.5);
    // The slot set was replaced, not merged.
    assert_eq!(updated.programacion.horario.len(), 1);
    assert_eq!(updated.programacion.horario[0].id_horario, s3);
}

#[tokio::test]
async fn test_partial_update_retains_absent_fields() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;

    let other_teacher = fx.repo.seed_teacher("Marta", "marta@academia.ec").id_usuario;
    let patch = EnrollmentPatch {
        id_usuario: Some(other_teacher),
        precio: Some(12.0),
        ..Default::default()
    };
    let updated = fx.enrollments.update(id, patch).await.unwrap();

    let m = &updated.matricula;
    assert_eq!(m.profesor, other_teacher);
    assert_eq!(m.precio, 12.0);
    // Retained from the original request:
    assert_eq!(m.alumno, fx.student);
    assert_eq!(m.turno, Turno::Manana);
    assert_eq!(m.valor_materiales, Some(20.0));
    assert!(m.con_iva);
    // Repriced with the old schedule: (12 * 2 + 20) * 1.15 = 50.60
    assert_eq!(m.cantidad, 2.0);
    assert_eq!(m.valor_horas, 24.0);
    assert_eq!(m.valor_total, 50.6);
}

#[tokio::test]
async fn test_update_with_empty_patch_keeps_total_stable() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;
    let s2 = virtual_slot(&fx, Dia::Martes, "14:00", "17:00").await;

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1, s2]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;

    // Recomputation always runs, and is idempotent on unchanged inputs.
    let updated = fx.enrollments.update(id, EnrollmentPatch::default()).await.unwrap();
    assert_eq!(updated.matricula.valor_total, created.matricula.valor_total);
    assert_eq!(updated.matricula.cantidad, created.matricula.cantidad);
}

#[tokio::test]
async fn test_update_unknown_enrollment_is_not_found() {
    let fx = fixture().await;
    let result = fx
        .enrollments
        .update(EnrollmentId::new(41), EnrollmentPatch::default())
        .await;
    match result {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "matricula"),
        other => panic!("expected matricula NotFound, got {:?}", other.map(|d| d.matricula)),
    }
}

#[tokio::test]
async fn test_cascading_delete_spares_rooms_and_slots() {
    let fx = fixture().await;

    let room = fx
        .slots
        .create_room(NewRoom {
            nombre_aula: "A-101".to_string(),
            capacidad: 30,
            tipo_aula: "teorica".to_string(),
        })
        .await
        .unwrap();
    let presencial = fx
        .slots
        .create_slot(SlotDraft {
            dia: Dia::Lunes,
            hora_inicio: "08:00".parse().unwrap(),
            hora_salida: "10:00".parse().unwrap(),
            modalidad: Modalidad::Presencial,
            aula_id: Some(room.id_aula),
        })
        .await
        .unwrap();

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![presencial.id_horario]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;
    let schedule_id = created.matricula.programacion;

    fx.enrollments.remove(id).await.unwrap();

    // Scenario E: the enrollment and its schedule are gone ...
    match fx.enrollments.find_one(id).await {
        Err(ServiceError::NotFound { entity, .. }) => assert_eq!(entity, "matricula"),
        other => panic!("expected matricula NotFound, got {:?}", other.map(|d| d.matricula)),
    }
    let full = Arc::clone(&fx.repo) as Arc<dyn FullRepository>;
    assert!(full.find_schedule(schedule_id).await.unwrap().is_none());

    // ... but the shared room and the slot itself are unaffected.
    assert!(fx.slots.get_room(room.id_aula).await.is_ok());
    assert!(fx.slots.get_slot(presencial.id_horario).await.is_ok());
}

#[tokio::test]
async fn test_reads_by_teacher_and_projections() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;

    let by_teacher = fx.enrollments.list_by_teacher(fx.teacher).await.unwrap();
    assert_eq!(by_teacher.len(), 1);
    assert_eq!(by_teacher[0].matricula.id_matricula, id);

    let schedule = fx.enrollments.schedule_by_enrollment(id).await.unwrap();
    assert_eq!(schedule.horario.len(), 1);
    assert_eq!(schedule.horario[0].id_horario, s1);

    let subjects = fx.enrollments.subjects_by_enrollment(id).await.unwrap();
    assert_eq!(subjects.len(), 2);

    // Unknown teacher → NotFound, matching the empty-read policy.
    assert!(matches!(
        fx.enrollments.list_by_teacher(TeacherId::new(77)).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_find_all_orders_newest_first() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;
    let s2 = virtual_slot(&fx, Dia::Martes, "08:00", "10:00").await;

    let first = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1]))
        .await
        .unwrap();
    let second = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s2]))
        .await
        .unwrap();

    let all = fx.enrollments.find_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id_matricula, second.matricula.id_matricula);
    assert_eq!(all[1].id_matricula, first.matricula.id_matricula);
}

#[tokio::test]
async fn test_deleted_slot_still_resolves_in_old_schedule() {
    let fx = fixture().await;
    let s1 = virtual_slot(&fx, Dia::Lunes, "08:00", "10:00").await;
    let s2 = virtual_slot(&fx, Dia::Martes, "14:00", "17:00").await;

    let created = fx
        .enrollments
        .create(new_enrollment(&fx, vec![s1, s2]))
        .await
        .unwrap();
    let id = created.matricula.id_matricula;

    // Soft-deleting a slot keeps it out of active reads ...
    fx.slots.remove_slot(s2).await.unwrap();
    let schedule = fx.enrollments.schedule_by_enrollment(id).await.unwrap();
    assert_eq!(schedule.horario.len(), 1);

    // ... while the full detail graph still resolves the historical member.
    let detail = fx.enrollments.find_one(id).await.unwrap();
    assert_eq!(detail.programacion.horario.len(), 2);
}
