//! Domain entities for enrollments, schedules, time slots and rooms.
//!
//! Field names follow the relational schema (`fecha`, `precio`,
//! `valor_total`, ...) since the persisted shape is the contract other
//! components honor. Relations are carried as explicit id references;
//! loading the referenced objects is a named repository call, never an
//! implicit eager fetch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{EnrollmentId, RoomId, ScheduleId, StudentId, SubjectId, TeacherId, TimeSlotId};
use crate::models::time::TimeOfDay;

/// Day of week for a time slot (`dia` column, Spanish lowercase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dia {
    Lunes,
    Martes,
    Miercoles,
    Jueves,
    Viernes,
    Sabado,
    Domingo,
}

impl Dia {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dia::Lunes => "lunes",
            Dia::Martes => "martes",
            Dia::Miercoles => "miercoles",
            Dia::Jueves => "jueves",
            Dia::Viernes => "viernes",
            Dia::Sabado => "sabado",
            Dia::Domingo => "domingo",
        }
    }
}

impl std::fmt::Display for Dia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dia {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lunes" => Ok(Dia::Lunes),
            "martes" => Ok(Dia::Martes),
            "miercoles" => Ok(Dia::Miercoles),
            "jueves" => Ok(Dia::Jueves),
            "viernes" => Ok(Dia::Viernes),
            "sabado" => Ok(Dia::Sabado),
            "domingo" => Ok(Dia::Domingo),
            other => Err(format!("unknown day: {}", other)),
        }
    }
}

/// Delivery mode of a slot (`modalidad` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modalidad {
    /// In-person, bound to a room
    Presencial,
    /// Room-free remote delivery
    Virtual,
}

impl Modalidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modalidad::Presencial => "presencial",
            Modalidad::Virtual => "virtual",
        }
    }
}

impl std::fmt::Display for Modalidad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modalidad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presencial" => Ok(Modalidad::Presencial),
            "virtual" => Ok(Modalidad::Virtual),
            other => Err(format!("unknown modality: {}", other)),
        }
    }
}

/// Enrollment shift (`turno` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turno {
    #[serde(rename = "mañana")]
    Manana,
    #[serde(rename = "tarde")]
    Tarde,
    #[serde(rename = "noche")]
    Noche,
}

impl Turno {
    pub fn as_str(&self) -> &'static str {
        match self {
            Turno::Manana => "mañana",
            Turno::Tarde => "tarde",
            Turno::Noche => "noche",
        }
    }
}

impl std::fmt::Display for Turno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Turno {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mañana" => Ok(Turno::Manana),
            "tarde" => Ok(Turno::Tarde),
            "noche" => Ok(Turno::Noche),
            other => Err(format!("unknown shift: {}", other)),
        }
    }
}

/// Physical classroom. Referenced by in-person slots, never owned by them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id_aula: RoomId,
    pub nombre_aula: String,
    /// Positive seat count
    pub capacidad: i32,
    pub tipo_aula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub nombre_aula: String,
    pub capacidad: i32,
    pub tipo_aula: String,
}

/// One day/time/modality allocation (`horario` row).
///
/// `horas_diarias` is derived from the start/end times on every write and
/// never trusted from input. Slots are soft-deleted only, so historical
/// enrollments keep resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id_horario: TimeSlotId,
    pub dia: Dia,
    pub hora_inicio: TimeOfDay,
    pub hora_salida: TimeOfDay,
    pub horas_diarias: f64,
    pub modalidad: Modalidad,
    /// Room reference, present iff `modalidad` is presencial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aula: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TimeSlot {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for creating or fully updating a time slot.
///
/// `horas_diarias` is absent on purpose: it is always recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDraft {
    pub dia: Dia,
    pub hora_inicio: TimeOfDay,
    pub hora_salida: TimeOfDay,
    pub modalidad: Modalidad,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aula_id: Option<RoomId>,
}

/// The weekly schedule of one enrollment: an owned set of slot references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id_programacion: ScheduleId,
    /// Resolved slots, in slot-id order
    pub horario: Vec<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Schedule input: the complete desired slot id list.
///
/// Updates replace the schedule's slot set wholesale; there is no merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub horario_id: Vec<TimeSlotId>,
}

/// Catalog entity: enrolled student (`estudiante` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id_estudiante: StudentId,
    pub nombre: String,
    pub apellido: String,
}

/// Catalog entity: teacher (`usuario` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id_usuario: TeacherId,
    pub nombre: String,
    pub email: String,
}

/// Catalog entity: subject (`materia` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id_materia: SubjectId,
    pub nombre: String,
}

/// A priced, time-scheduled binding of one student to one teacher and a set
/// of subjects for a period (`matricula` row).
///
/// `cantidad`, `valor_horas` and `valor_total` are derived by the pricing
/// engine; callers never supply them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id_matricula: EnrollmentId,
    pub fecha: NaiveDate,
    pub fecha_inicio: NaiveDate,
    pub fecha_final: NaiveDate,
    pub turno: Turno,
    /// Billable quantity: sum of the schedule's daily hours
    pub cantidad: f64,
    /// Unit price per hour
    pub precio: f64,
    /// precio * cantidad
    pub valor_horas: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_materiales: Option<f64>,
    pub con_iva: bool,
    pub valor_total: f64,
    pub observaciones: String,
    pub is_active: bool,
    pub alumno: StudentId,
    pub profesor: TeacherId,
    pub materias: Vec<SubjectId>,
    pub programacion: ScheduleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for creating an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub fecha: NaiveDate,
    pub fecha_inicio: NaiveDate,
    pub fecha_final: NaiveDate,
    pub turno: Turno,
    pub id_estudiante: StudentId,
    pub id_usuario: TeacherId,
    pub id_materias: Vec<SubjectId>,
    pub programacion: ScheduleDraft,
    pub precio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_materiales: Option<f64>,
    #[serde(default)]
    pub con_iva: bool,
    #[serde(default)]
    pub observaciones: String,
}

/// Partial update for an enrollment. Absent fields retain prior values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_final: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turno: Option<Turno>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_estudiante: Option<StudentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<TeacherId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_materias: Option<Vec<SubjectId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programacion: Option<ScheduleDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_materiales: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub con_iva: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

/// Apply a partial update to an enrollment, returning the merged copy.
///
/// Pure: only fields present in the patch are replaced. Derived pricing
/// fields (`cantidad`, `valor_horas`, `valor_total`) are NOT touched here;
/// the lifecycle manager recomputes them after every merge. The schedule
/// relation is likewise rewired by the caller, since slot resolution needs
/// the repository.
pub fn merge_enrollment(existing: &Enrollment, patch: &EnrollmentPatch) -> Enrollment {
    let mut merged = existing.clone();
    if let Some(fecha) = patch.fecha {
        merged.fecha = fecha;
    }
    if let Some(fecha_inicio) = patch.fecha_inicio {
        merged.fecha_inicio = fecha_inicio;
    }
    if let Some(fecha_final) = patch.fecha_final {
        merged.fecha_final = fecha_final;
    }
    if let Some(turno) = patch.turno {
        merged.turno = turno;
    }
    if let Some(alumno) = patch.id_estudiante {
        merged.alumno = alumno;
    }
    if let Some(profesor) = patch.id_usuario {
        merged.profesor = profesor;
    }
    if let Some(ref materias) = patch.id_materias {
        merged.materias = materias.clone();
    }
    if let Some(precio) = patch.precio {
        merged.precio = precio;
    }
    if let Some(valor_materiales) = patch.valor_materiales {
        merged.valor_materiales = Some(valor_materiales);
    }
    if let Some(con_iva) = patch.con_iva {
        merged.con_iva = con_iva;
    }
    if let Some(ref observaciones) = patch.observaciones {
        merged.observaciones = observaciones.clone();
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_enrollment() -> Enrollment {
        Enrollment {
            id_matricula: EnrollmentId::new(1),
            fecha: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            fecha_final: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            turno: Turno::Manana,
            cantidad: 5.0,
            precio: 10.0,
            valor_horas: 50.0,
            valor_materiales: Some(20.0),
            con_iva: true,
            valor_total: 80.5,
            observaciones: "".to_string(),
            is_active: true,
            alumno: StudentId::new(7),
            profesor: TeacherId::new(3),
            materias: vec![SubjectId::new(1), SubjectId::new(2)],
            programacion: ScheduleId::new(9),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_merge_empty_patch_keeps_everything() {
        let existing = sample_enrollment();
        let merged = merge_enrollment(&existing, &EnrollmentPatch::default());
        assert_eq!(merged.precio, existing.precio);
        assert_eq!(merged.alumno, existing.alumno);
        assert_eq!(merged.materias, existing.materias);
        assert_eq!(merged.con_iva, existing.con_iva);
    }

    #[test]
    fn test_merge_applies_only_present_fields() {
        let existing = sample_enrollment();
        let patch = EnrollmentPatch {
            precio: Some(12.0),
            id_usuario: Some(TeacherId::new(4)),
            ..Default::default()
        };
        let merged = merge_enrollment(&existing, &patch);
        assert_eq!(merged.precio, 12.0);
        assert_eq!(merged.profesor, TeacherId::new(4));
        // untouched
        assert_eq!(merged.alumno, existing.alumno);
        assert_eq!(merged.turno, existing.turno);
        assert_eq!(merged.valor_materiales, Some(20.0));
    }

    #[test]
    fn test_merge_never_touches_derived_fields() {
        let existing = sample_enrollment();
        let patch = EnrollmentPatch {
            precio: Some(99.0),
            ..Default::default()
        };
        let merged = merge_enrollment(&existing, &patch);
        assert_eq!(merged.cantidad, existing.cantidad);
        assert_eq!(merged.valor_horas, existing.valor_horas);
        assert_eq!(merged.valor_total, existing.valor_total);
    }

    #[test]
    fn test_turno_wire_names() {
        assert_eq!(serde_json::to_string(&Turno::Manana).unwrap(), "\"mañana\"");
        assert_eq!(serde_json::to_string(&Turno::Noche).unwrap(), "\"noche\"");
        let parsed: Turno = serde_json::from_str("\"tarde\"").unwrap();
        assert_eq!(parsed, Turno::Tarde);
    }

    #[test]
    fn test_dia_wire_names() {
        assert_eq!(serde_json::to_string(&Dia::Miercoles).unwrap(), "\"miercoles\"");
        let parsed: Dia = serde_json::from_str("\"sabado\"").unwrap();
        assert_eq!(parsed, Dia::Sabado);
    }
}
