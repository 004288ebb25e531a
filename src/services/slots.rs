//! Time-slot management: creation, update and removal gated by the
//! conflict detector, plus the read projections and room management.
//!
//! Writes only reach the repository after a clean conflict decision;
//! `horas_diarias` is recomputed from the submitted times on every write.

use std::sync::Arc;

use crate::api::{RoomId, TimeSlotId};
use crate::db::repository::FullRepository;
use crate::models::time::daily_hours;
use crate::models::{Modalidad, NewRoom, Room, SlotDraft, TimeSlot};
use crate::services::conflict;
use crate::services::error::{ServiceError, ServiceResult};

/// Slot and room operations against a repository backend.
pub struct SlotService {
    repository: Arc<dyn FullRepository>,
}

impl SlotService {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// Create a slot.
    ///
    /// Order of evaluation: room requirement (presencial), duplicate check
    /// against the active population, then room resolution. Virtual drafts
    /// have any stray room reference cleared before persisting.
    pub async fn create_slot(&self, draft: SlotDraft) -> ServiceResult<TimeSlot> {
        let mut draft = draft;
        if draft.modalidad == Modalidad::Virtual {
            draft.aula_id = None;
        }
        let horas_diarias = daily_hours(draft.hora_inicio, draft.hora_salida);

        let existing = self.repository.list_slots().await?;
        conflict::check_create(&draft, horas_diarias, &existing)?;

        if let Some(aula_id) = draft.aula_id {
            self.resolve_room(aula_id).await?;
        }

        let slot = self.repository.create_slot(&draft, horas_diarias).await?;
        log::info!(
            "created {} slot {} on {} {}-{}",
            slot.modalidad,
            slot.id_horario,
            slot.dia,
            slot.hora_inicio,
            slot.hora_salida
        );
        Ok(slot)
    }

    /// Update a slot in place.
    ///
    /// The slot is excluded from its own conflict checks. Updates must name
    /// a resolvable room whichever modality they target; the stored
    /// reference survives only when the result is presencial.
    pub async fn update_slot(&self, id: TimeSlotId, draft: SlotDraft) -> ServiceResult<TimeSlot> {
        let current = self
            .repository
            .find_slot(id)
            .await?
            .filter(|slot| slot.is_active())
            .ok_or_else(|| {
                ServiceError::not_found("horario", format!("horario {} does not exist", id))
            })?;

        let horas_diarias = daily_hours(draft.hora_inicio, draft.hora_salida);
        let existing = self.repository.list_slots().await?;

        // Presencial conflicts need the room id; reject its absence before
        // the detector runs so virtual targets get the same gate.
        let aula_id = draft.aula_id.ok_or(ServiceError::RoomRequired)?;
        conflict::check_update(&current, &draft, horas_diarias, &existing)?;
        let room = self.resolve_room(aula_id).await?;

        let updated = TimeSlot {
            id_horario: current.id_horario,
            dia: draft.dia,
            hora_inicio: draft.hora_inicio,
            hora_salida: draft.hora_salida,
            horas_diarias,
            modalidad: draft.modalidad,
            aula: match draft.modalidad {
                Modalidad::Presencial => Some(room.id_aula),
                Modalidad::Virtual => None,
            },
            deleted_at: current.deleted_at,
        };
        let stored = self.repository.update_slot(&updated).await?;
        log::info!("updated slot {}", stored.id_horario);
        Ok(stored)
    }

    /// Soft-delete a slot. Historical schedules keep referencing it.
    pub async fn remove_slot(&self, id: TimeSlotId) -> ServiceResult<TimeSlot> {
        let slot = self.get_slot(id).await?;
        self.repository.soft_delete_slot(id).await?;
        log::info!("soft-deleted slot {}", id);
        Ok(slot)
    }

    /// Fetch one active slot.
    pub async fn get_slot(&self, id: TimeSlotId) -> ServiceResult<TimeSlot> {
        self.repository
            .find_slot(id)
            .await?
            .filter(|slot| slot.is_active())
            .ok_or_else(|| {
                ServiceError::not_found("horario", format!("horario {} does not exist", id))
            })
    }

    /// List all active slots in id order.
    pub async fn list_slots(&self) -> ServiceResult<Vec<TimeSlot>> {
        let slots = self.repository.list_slots().await?;
        if slots.is_empty() {
            return Err(ServiceError::not_found("horario", "no slots exist"));
        }
        Ok(slots)
    }

    /// List active slots of one modality.
    pub async fn list_slots_by_modalidad(
        &self,
        modalidad: Modalidad,
    ) -> ServiceResult<Vec<TimeSlot>> {
        let slots = self.repository.list_slots_by_modalidad(modalidad).await?;
        if slots.is_empty() {
            return Err(ServiceError::not_found(
                "horario",
                format!("no {} slots exist", modalidad),
            ));
        }
        Ok(slots)
    }

    /// Create a room.
    pub async fn create_room(&self, room: NewRoom) -> ServiceResult<Room> {
        let stored = self.repository.create_room(&room).await?;
        log::info!("created room {} ({})", stored.id_aula, stored.nombre_aula);
        Ok(stored)
    }

    /// List active rooms.
    pub async fn list_rooms(&self) -> ServiceResult<Vec<Room>> {
        let rooms = self.repository.list_rooms().await?;
        if rooms.is_empty() {
            return Err(ServiceError::not_found("aula", "no rooms exist"));
        }
        Ok(rooms)
    }

    /// Fetch one active room.
    pub async fn get_room(&self, id: RoomId) -> ServiceResult<Room> {
        self.resolve_room(id).await
    }

    async fn resolve_room(&self, id: RoomId) -> ServiceResult<Room> {
        self.repository
            .find_room(id)
            .await?
            .ok_or(ServiceError::RoomNotFound(id))
    }
}
