//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic migration execution on startup
//! - Blocking Diesel work wrapped in `tokio::task::spawn_blocking`
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//!
//! ## Transactions
//!
//! [`PostgresTransaction`] stages the lifecycle manager's writes and runs
//! them inside one `conn.transaction` at commit. Ids for new schedules and
//! enrollments are drawn from the backing sequences when the op is staged,
//! so callers can wire foreign keys before committing; a rolled-back
//! transaction burns its ids, exactly as a plain sequence would.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::BigInt;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::task;

use crate::api::{EnrollmentId, RoomId, ScheduleId, StudentId, SubjectId, TeacherId, TimeSlotId};
use crate::db::repository::{
    CatalogRepository, EnrollmentRepository, FullRepository, RepositoryError, RepositoryResult,
    RepositoryTransaction, SlotRepository, TransactionalRepository,
};
use crate::models::{
    Enrollment, Modalidad, NewRoom, Room, Schedule, SlotDraft, Student, Subject, Teacher, TimeSlot,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let parse_var = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse_var("PG_POOL_MAX", 10) as u32,
            min_pool_size: parse_var("PG_POOL_MIN", 1) as u32,
            connection_timeout_sec: parse_var("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: parse_var("PG_IDLE_TIMEOUT_SEC", 600),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .build(manager)?;

        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::configuration(format!("Failed to run migrations: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Run a blocking Diesel closure on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))?
    }
}

fn next_sequence_value(conn: &mut PgConnection, sequence: &str) -> RepositoryResult<i64> {
    diesel::select(sql::<BigInt>(&format!("nextval('{}')", sequence)))
        .get_result(conn)
        .map_err(RepositoryError::from)
}

fn load_subject_ids(conn: &mut PgConnection, enrollment_id: i64) -> RepositoryResult<Vec<i64>> {
    matricula_materia::table
        .filter(matricula_materia::matricula_id.eq(enrollment_id))
        .select(matricula_materia::materia_id)
        .order(matricula_materia::materia_id.asc())
        .load(conn)
        .map_err(RepositoryError::from)
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn find_student(&self, id: StudentId) -> RepositoryResult<Option<Student>> {
        self.run(move |conn| {
            let row: Option<EstudianteRow> = estudiante::table
                .find(id.value())
                .first(conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn find_teacher(&self, id: TeacherId) -> RepositoryResult<Option<Teacher>> {
        self.run(move |conn| {
            let row: Option<UsuarioRow> = usuario::table.find(id.value()).first(conn).optional()?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn find_subjects(&self, ids: &[SubjectId]) -> RepositoryResult<Vec<Subject>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        self.run(move |conn| {
            let rows: Vec<MateriaRow> = materia::table
                .filter(materia::id_materia.eq_any(&ids))
                .order(materia::id_materia.asc())
                .load(conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>> {
        self.run(move |conn| {
            let row: Option<AulaRow> = aula::table
                .find(id.value())
                .filter(aula::deleted_at.is_null())
                .first(conn)
                .optional()?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn create_room(&self, room: &NewRoom) -> RepositoryResult<Room> {
        let new_row = NewAulaRow {
            nombre_aula: room.nombre_aula.clone(),
            capacidad: room.capacidad,
            tipo_aula: room.tipo_aula.clone(),
        };
        self.run(move |conn| {
            let row: AulaRow = diesel::insert_into(aula::table)
                .values(&new_row)
                .get_result(conn)?;
            Ok(row.into())
        })
        .await
    }

    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        self.run(move |conn| {
            let rows: Vec<AulaRow> = aula::table
                .filter(aula::deleted_at.is_null())
                .order(aula::id_aula.asc())
                .load(conn)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}

#[async_trait]
impl SlotRepository for PostgresRepository {
    async fn find_slot(&self, id: TimeSlotId) -> RepositoryResult<Option<TimeSlot>> {
        self.run(move |conn| {
            let row: Option<HorarioRow> = horario::table.find(id.value()).first(conn).optional()?;
            row.map(TryInto::try_into).transpose()
        })
        .await
    }

    async fn find_slots(&self, ids: &[TimeSlotId]) -> RepositoryResult<Vec<TimeSlot>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        self.run(move |conn| {
            let rows: Vec<HorarioRow> = horario::table
                .filter(horario::id_horario.eq_any(&ids))
                .filter(horario::deleted_at.is_null())
                .order(horario::id_horario.asc())
                .load(conn)?;
            rows.into_iter().map(TryInto::try_into).collect()
        })
        .await
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        self.run(move |conn| {
            let rows: Vec<HorarioRow> = horario::table
                .filter(horario::deleted_at.is_null())
                .order(horario::id_horario.asc())
                .load(conn)?;
            rows.into_iter().map(TryInto::try_into).collect()
        })
        .await
    }

    async fn list_slots_by_modalidad(
        &self,
        modalidad: Modalidad,
    ) -> RepositoryResult<Vec<TimeSlot>> {
        self.run(move |conn| {
            let rows: Vec<HorarioRow> = horario::table
                .filter(horario::deleted_at.is_null())
                .filter(horario::modalidad.eq(modalidad.as_str()))
                .order(horario::id_horario.asc())
                .load(conn)?;
            rows.into_iter().map(TryInto::try_into).collect()
        })
        .await
    }

    async fn create_slot(
        &self,
        draft: &SlotDraft,
        horas_diarias: f64,
    ) -> RepositoryResult<TimeSlot> {
        let new_row = NewHorarioRow {
            dia: draft.dia.to_string(),
            hora_inicio: draft.hora_inicio.to_string(),
            hora_salida: draft.hora_salida.to_string(),
            horas_diarias,
            modalidad: draft.modalidad.to_string(),
            aula: draft.aula_id.map(|id| id.value()),
        };
        self.run(move |conn| {
            let row: HorarioRow = diesel::insert_into(horario::table)
                .values(&new_row)
                .get_result(conn)?;
            row.try_into()
        })
        .await
    }

    async fn update_slot(&self, slot: &TimeSlot) -> RepositoryResult<TimeSlot> {
        let slot = slot.clone();
        self.run(move |conn| {
            let row: HorarioRow = diesel::update(horario::table.find(slot.id_horario.value()))
                .set((
                    horario::dia.eq(slot.dia.to_string()),
                    horario::hora_inicio.eq(slot.hora_inicio.to_string()),
                    horario::hora_salida.eq(slot.hora_salida.to_string()),
                    horario::horas_diarias.eq(slot.horas_diarias),
                    horario::modalidad.eq(slot.modalidad.to_string()),
                    horario::aula.eq(slot.aula.map(|id| id.value())),
                ))
                .get_result(conn)?;
            row.try_into()
        })
        .await
    }

    async fn soft_delete_slot(&self, id: TimeSlotId) -> RepositoryResult<()> {
        self.run(move |conn| {
            let affected = diesel::update(horario::table.find(id.value()))
                .set(horario::deleted_at.eq(Some(Utc::now())))
                .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "horario {} does not exist",
                    id
                )));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresRepository {
    async fn find_enrollment(&self, id: EnrollmentId) -> RepositoryResult<Option<Enrollment>> {
        self.run(move |conn| {
            let row: Option<MatriculaRow> = matricula::table
                .find(id.value())
                .filter(matricula::deleted_at.is_null())
                .first(conn)
                .optional()?;
            match row {
                Some(row) => {
                    let materias = load_subject_ids(conn, row.id_matricula)?;
                    Ok(Some(row.into_enrollment(materias)?))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_enrollments(&self) -> RepositoryResult<Vec<Enrollment>> {
        self.run(move |conn| {
            let rows: Vec<MatriculaRow> = matricula::table
                .filter(matricula::deleted_at.is_null())
                .order(matricula::id_matricula.desc())
                .load(conn)?;
            rows.into_iter()
                .map(|row| {
                    let materias = load_subject_ids(conn, row.id_matricula)?;
                    row.into_enrollment(materias)
                })
                .collect()
        })
        .await
    }

    async fn list_enrollments_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.run(move |conn| {
            let rows: Vec<MatriculaRow> = matricula::table
                .filter(matricula::deleted_at.is_null())
                .filter(matricula::profesor.eq(teacher.value()))
                .order(matricula::id_matricula.desc())
                .load(conn)?;
            rows.into_iter()
                .map(|row| {
                    let materias = load_subject_ids(conn, row.id_matricula)?;
                    row.into_enrollment(materias)
                })
                .collect()
        })
        .await
    }

    async fn find_schedule(&self, id: ScheduleId) -> RepositoryResult<Option<Schedule>> {
        self.run(move |conn| {
            let record: Option<(i64, Option<chrono::DateTime<Utc>>)> = programacion::table
                .find(id.value())
                .filter(programacion::deleted_at.is_null())
                .first(conn)
                .optional()?;
            let (schedule_id, deleted_at) = match record {
                Some(r) => r,
                None => return Ok(None),
            };

            let slot_ids: Vec<i64> = programacion_horario::table
                .filter(programacion_horario::programacion_id.eq(schedule_id))
                .select(programacion_horario::horario_id)
                .load(conn)?;

            // Soft-deleted member slots stay visible so historical
            // enrollments keep resolving their full schedule.
            let rows: Vec<HorarioRow> = horario::table
                .filter(horario::id_horario.eq_any(&slot_ids))
                .order(horario::id_horario.asc())
                .load(conn)?;
            let horario = rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<RepositoryResult<Vec<TimeSlot>>>()?;

            Ok(Some(Schedule {
                id_programacion: ScheduleId::new(schedule_id),
                horario,
                deleted_at,
            }))
        })
        .await
    }
}

enum PgTxOp {
    InsertSchedule { id: i64, slot_ids: Vec<i64> },
    ReplaceScheduleSlots { id: i64, slot_ids: Vec<i64> },
    InsertEnrollment { row: NewMatriculaRow, materias: Vec<i64> },
    SaveEnrollment { row: NewMatriculaRow, materias: Vec<i64> },
    DeleteScheduleSlotLinks { schedule: i64 },
    SoftDeleteEnrollmentsBySchedule { schedule: i64 },
    SoftDeleteSchedule { schedule: i64 },
    SoftDeleteEnrollment { id: i64 },
}

/// Staged-write transaction over Postgres; executes in one Diesel
/// transaction at commit.
pub struct PostgresTransaction {
    pool: PgPool,
    ops: Vec<PgTxOp>,
}

impl PostgresTransaction {
    async fn next_id(&self, sequence: &'static str) -> RepositoryResult<i64> {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            next_sequence_value(&mut conn, sequence)
        })
        .await
        .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))?
    }

    fn insert_schedule_links(
        conn: &mut PgConnection,
        schedule: i64,
        slot_ids: &[i64],
    ) -> Result<(), diesel::result::Error> {
        let rows: Vec<_> = slot_ids
            .iter()
            .map(|sid| {
                (
                    programacion_horario::programacion_id.eq(schedule),
                    programacion_horario::horario_id.eq(*sid),
                )
            })
            .collect();
        diesel::insert_into(programacion_horario::table)
            .values(&rows)
            .execute(conn)?;
        Ok(())
    }

    fn insert_subject_links(
        conn: &mut PgConnection,
        enrollment: i64,
        materias: &[i64],
    ) -> Result<(), diesel::result::Error> {
        let rows: Vec<_> = materias
            .iter()
            .map(|mid| {
                (
                    matricula_materia::matricula_id.eq(enrollment),
                    matricula_materia::materia_id.eq(*mid),
                )
            })
            .collect();
        diesel::insert_into(matricula_materia::table)
            .values(&rows)
            .execute(conn)?;
        Ok(())
    }

    fn apply(conn: &mut PgConnection, op: &PgTxOp) -> Result<(), diesel::result::Error> {
        match op {
            PgTxOp::InsertSchedule { id, slot_ids } => {
                diesel::insert_into(programacion::table)
                    .values(programacion::id_programacion.eq(*id))
                    .execute(conn)?;
                Self::insert_schedule_links(conn, *id, slot_ids)?;
            }
            PgTxOp::ReplaceScheduleSlots { id, slot_ids } => {
                diesel::delete(
                    programacion_horario::table
                        .filter(programacion_horario::programacion_id.eq(*id)),
                )
                .execute(conn)?;
                Self::insert_schedule_links(conn, *id, slot_ids)?;
            }
            PgTxOp::InsertEnrollment { row, materias } => {
                diesel::insert_into(matricula::table)
                    .values(row)
                    .execute(conn)?;
                Self::insert_subject_links(conn, row.id_matricula, materias)?;
            }
            PgTxOp::SaveEnrollment { row, materias } => {
                diesel::update(matricula::table.find(row.id_matricula))
                    .set((
                        matricula::fecha.eq(row.fecha),
                        matricula::fecha_inicio.eq(row.fecha_inicio),
                        matricula::fecha_final.eq(row.fecha_final),
                        matricula::turno.eq(row.turno.clone()),
                        matricula::cantidad.eq(row.cantidad),
                        matricula::precio.eq(row.precio),
                        matricula::valor_horas.eq(row.valor_horas),
                        matricula::valor_materiales.eq(row.valor_materiales),
                        matricula::con_iva.eq(row.con_iva),
                        matricula::valor_total.eq(row.valor_total),
                        matricula::observaciones.eq(row.observaciones.clone()),
                        matricula::is_active.eq(row.is_active),
                        matricula::alumno.eq(row.alumno),
                        matricula::profesor.eq(row.profesor),
                        matricula::programacion_id.eq(row.programacion_id),
                        matricula::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                diesel::delete(
                    matricula_materia::table
                        .filter(matricula_materia::matricula_id.eq(row.id_matricula)),
                )
                .execute(conn)?;
                Self::insert_subject_links(conn, row.id_matricula, materias)?;
            }
            PgTxOp::DeleteScheduleSlotLinks { schedule } => {
                diesel::delete(
                    programacion_horario::table
                        .filter(programacion_horario::programacion_id.eq(*schedule)),
                )
                .execute(conn)?;
            }
            PgTxOp::SoftDeleteEnrollmentsBySchedule { schedule } => {
                diesel::update(
                    matricula::table
                        .filter(matricula::programacion_id.eq(*schedule))
                        .filter(matricula::deleted_at.is_null()),
                )
                .set((
                    matricula::deleted_at.eq(Some(Utc::now())),
                    matricula::is_active.eq(false),
                ))
                .execute(conn)?;
            }
            PgTxOp::SoftDeleteSchedule { schedule } => {
                diesel::update(programacion::table.find(*schedule))
                    .set(programacion::deleted_at.eq(Some(Utc::now())))
                    .execute(conn)?;
            }
            PgTxOp::SoftDeleteEnrollment { id } => {
                diesel::update(matricula::table.find(*id))
                    .set((
                        matricula::deleted_at.eq(Some(Utc::now())),
                        matricula::is_active.eq(false),
                    ))
                    .execute(conn)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryTransaction for PostgresTransaction {
    async fn create_schedule(&mut self, slot_ids: &[TimeSlotId]) -> RepositoryResult<ScheduleId> {
        let id = self.next_id("programacion_id_programacion_seq").await?;
        self.ops.push(PgTxOp::InsertSchedule {
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
        self.ops.push(PgTxOp::ReplaceScheduleSlots {
            id: schedule.value(),
            slot_ids: slot_ids.iter().map(|s| s.value()).collect(),
        });
        Ok(())
    }

    async fn create_enrollment(
        &mut self,
        enrollment: &Enrollment,
    ) -> RepositoryResult<EnrollmentId> {
        let id = self.next_id("matricula_id_matricula_seq").await?;
        self.ops.push(PgTxOp::InsertEnrollment {
            row: NewMatriculaRow::from_domain(enrollment, id),
            materias: enrollment.materias.iter().map(|m| m.value()).collect(),
        });
        Ok(EnrollmentId::new(id))
    }

    async fn save_enrollment(&mut self, enrollment: &Enrollment) -> RepositoryResult<()> {
        self.ops.push(PgTxOp::SaveEnrollment {
            row: NewMatriculaRow::from_domain(enrollment, enrollment.id_matricula.value()),
            materias: enrollment.materias.iter().map(|m| m.value()).collect(),
        });
        Ok(())
    }

    async fn delete_schedule_slot_links(&mut self, schedule: ScheduleId) -> RepositoryResult<()> {
        self.ops.push(PgTxOp::DeleteScheduleSlotLinks {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_enrollments_by_schedule(
        &mut self,
        schedule: ScheduleId,
    ) -> RepositoryResult<()> {
        self.ops.push(PgTxOp::SoftDeleteEnrollmentsBySchedule {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_schedule(&mut self, schedule: ScheduleId) -> RepositoryResult<()> {
        self.ops.push(PgTxOp::SoftDeleteSchedule {
            schedule: schedule.value(),
        });
        Ok(())
    }

    async fn soft_delete_enrollment(&mut self, id: EnrollmentId) -> RepositoryResult<()> {
        self.ops.push(PgTxOp::SoftDeleteEnrollment { id: id.value() });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let pool = self.pool.clone();
        let ops = self.ops;
        task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                for op in &ops {
                    Self::apply(conn, op)?;
                }
                Ok(())
            })
            .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))?
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionalRepository for PostgresRepository {
    async fn begin(&self) -> RepositoryResult<Box<dyn RepositoryTransaction>> {
        Ok(Box::new(PostgresTransaction {
            pool: self.pool.clone(),
            ops: Vec::new(),
        }))
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.run(|conn| {
            diesel::select(sql::<diesel::sql_types::Bool>("1 = 1"))
                .get_result::<bool>(conn)
                .map_err(RepositoryError::from)
        })
        .await
    }
}
