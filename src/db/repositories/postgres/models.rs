//! Row structs for the Postgres backend and their domain conversions.
//!
//! Enum-ish columns (`dia`, `modalidad`, `turno`) and the time-of-day
//! columns are stored as text; converting a row into a domain value parses
//! them and surfaces corrupt data as an internal repository error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{aula, estudiante, horario, materia, matricula, usuario};
use crate::api::{EnrollmentId, RoomId, ScheduleId, StudentId, SubjectId, TeacherId, TimeSlotId};
use crate::db::repository::RepositoryError;
use crate::models::{Enrollment, Room, Student, Subject, Teacher, TimeSlot};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = estudiante)]
pub struct EstudianteRow {
    pub id_estudiante: i64,
    pub nombre: String,
    pub apellido: String,
}

impl From<EstudianteRow> for Student {
    fn from(row: EstudianteRow) -> Self {
        Student {
            id_estudiante: StudentId::new(row.id_estudiante),
            nombre: row.nombre,
            apellido: row.apellido,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = usuario)]
pub struct UsuarioRow {
    pub id_usuario: i64,
    pub nombre: String,
    pub email: String,
}

impl From<UsuarioRow> for Teacher {
    fn from(row: UsuarioRow) -> Self {
        Teacher {
            id_usuario: TeacherId::new(row.id_usuario),
            nombre: row.nombre,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = materia)]
pub struct MateriaRow {
    pub id_materia: i64,
    pub nombre: String,
}

impl From<MateriaRow> for Subject {
    fn from(row: MateriaRow) -> Self {
        Subject {
            id_materia: SubjectId::new(row.id_materia),
            nombre: row.nombre,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = aula)]
pub struct AulaRow {
    pub id_aula: i64,
    pub nombre_aula: String,
    pub capacidad: i32,
    pub tipo_aula: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<AulaRow> for Room {
    fn from(row: AulaRow) -> Self {
        Room {
            id_aula: RoomId::new(row.id_aula),
            nombre_aula: row.nombre_aula,
            capacidad: row.capacidad,
            tipo_aula: row.tipo_aula,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = aula)]
pub struct NewAulaRow {
    pub nombre_aula: String,
    pub capacidad: i32,
    pub tipo_aula: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = horario)]
pub struct HorarioRow {
    pub id_horario: i64,
    pub dia: String,
    pub hora_inicio: String,
    pub hora_salida: String,
    pub horas_diarias: f64,
    pub modalidad: String,
    pub aula: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<HorarioRow> for TimeSlot {
    type Error = RepositoryError;

    fn try_from(row: HorarioRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, err: String| {
            RepositoryError::internal(format!(
                "horario {}: corrupt {} column: {}",
                row.id_horario, field, err
            ))
        };
        Ok(TimeSlot {
            id_horario: TimeSlotId::new(row.id_horario),
            dia: row.dia.parse().map_err(|e| corrupt("dia", e))?,
            hora_inicio: row
                .hora_inicio
                .parse()
                .map_err(|e| corrupt("hora_inicio", e))?,
            hora_salida: row
                .hora_salida
                .parse()
                .map_err(|e| corrupt("hora_salida", e))?,
            horas_diarias: row.horas_diarias,
            modalidad: row.modalidad.parse().map_err(|e| corrupt("modalidad", e))?,
            aula: row.aula.map(RoomId::new),
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = horario)]
pub struct NewHorarioRow {
    pub dia: String,
    pub hora_inicio: String,
    pub hora_salida: String,
    pub horas_diarias: f64,
    pub modalidad: String,
    pub aula: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = matricula)]
pub struct MatriculaRow {
    pub id_matricula: i64,
    pub fecha: NaiveDate,
    pub fecha_inicio: NaiveDate,
    pub fecha_final: NaiveDate,
    pub turno: String,
    pub cantidad: f64,
    pub precio: f64,
    pub valor_horas: f64,
    pub valor_materiales: Option<f64>,
    pub con_iva: bool,
    pub valor_total: f64,
    pub observaciones: String,
    pub is_active: bool,
    pub alumno: i64,
    pub profesor: i64,
    pub programacion_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MatriculaRow {
    /// Combine with the enrollment's subject ids into a domain value.
    pub fn into_enrollment(self, materias: Vec<i64>) -> Result<Enrollment, RepositoryError> {
        let turno = self.turno.parse().map_err(|e| {
            RepositoryError::internal(format!(
                "matricula {}: corrupt turno column: {}",
                self.id_matricula, e
            ))
        })?;
        Ok(Enrollment {
            id_matricula: EnrollmentId::new(self.id_matricula),
            fecha: self.fecha,
            fecha_inicio: self.fecha_inicio,
            fecha_final: self.fecha_final,
            turno,
            cantidad: self.cantidad,
            precio: self.precio,
            valor_horas: self.valor_horas,
            valor_materiales: self.valor_materiales,
            con_iva: self.con_iva,
            valor_total: self.valor_total,
            observaciones: self.observaciones,
            is_active: self.is_active,
            alumno: StudentId::new(self.alumno),
            profesor: TeacherId::new(self.profesor),
            materias: materias.into_iter().map(SubjectId::new).collect(),
            programacion: ScheduleId::new(self.programacion_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matricula)]
pub struct NewMatriculaRow {
    pub id_matricula: i64,
    pub fecha: NaiveDate,
    pub fecha_inicio: NaiveDate,
    pub fecha_final: NaiveDate,
    pub turno: String,
    pub cantidad: f64,
    pub precio: f64,
    pub valor_horas: f64,
    pub valor_materiales: Option<f64>,
    pub con_iva: bool,
    pub valor_total: f64,
    pub observaciones: String,
    pub is_active: bool,
    pub alumno: i64,
    pub profesor: i64,
    pub programacion_id: i64,
}

impl NewMatriculaRow {
    pub fn from_domain(enrollment: &Enrollment, id: i64) -> Self {
        Self {
            id_matricula: id,
            fecha: enrollment.fecha,
            fecha_inicio: enrollment.fecha_inicio,
            fecha_final: enrollment.fecha_final,
            turno: enrollment.turno.to_string(),
            cantidad: enrollment.cantidad,
            precio: enrollment.precio,
            valor_horas: enrollment.valor_horas,
            valor_materiales: enrollment.valor_materiales,
            con_iva: enrollment.con_iva,
            valor_total: enrollment.valor_total,
            observaciones: enrollment.observaciones.clone(),
            is_active: enrollment.is_active,
            alumno: enrollment.alumno.value(),
            profesor: enrollment.profesor.value(),
            programacion_id: enrollment.programacion.value(),
        }
    }
}
