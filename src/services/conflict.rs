//! Duplicate-slot conflict detection.
//!
//! Pure decision functions over the candidate slot and the existing slot
//! population; the caller persists only after a clean result. Uniqueness is
//! modality-specific:
//!
//! - virtual slots are unique on (dia, hora_inicio, hora_salida,
//!   horas_diarias) among virtual slots — rooms are irrelevant;
//! - presencial slots are unique on the same key *plus* the room, so two
//!   rooms may hold identical day/times side by side;
//! - on update, if the day or either time changed, a broader
//!   modality-agnostic check on exact (dia, hora_inicio, hora_salida) runs
//!   in addition to the rules above.
//!
//! Soft-deleted slots never participate, and a slot under update is
//! excluded from its own checks by identity.

use crate::models::{Modalidad, SlotDraft, TimeSlot};
use crate::services::error::{ServiceError, ServiceResult};

fn same_interval(slot: &TimeSlot, draft: &SlotDraft, horas_diarias: f64) -> bool {
    slot.dia == draft.dia
        && slot.hora_inicio == draft.hora_inicio
        && slot.hora_salida == draft.hora_salida
        && slot.horas_diarias == horas_diarias
}

fn modality_conflict(
    draft: &SlotDraft,
    horas_diarias: f64,
    existing: &[TimeSlot],
    exclude: Option<crate::api::TimeSlotId>,
) -> ServiceResult<()> {
    let candidates = existing
        .iter()
        .filter(|slot| slot.is_active())
        .filter(|slot| Some(slot.id_horario) != exclude);

    match draft.modalidad {
        Modalidad::Virtual => {
            for slot in candidates {
                if slot.modalidad == Modalidad::Virtual && same_interval(slot, draft, horas_diarias)
                {
                    return Err(ServiceError::conflict(format!(
                        "a virtual slot already exists on {} from {} to {}",
                        draft.dia, draft.hora_inicio, draft.hora_salida
                    )));
                }
            }
        }
        Modalidad::Presencial => {
            // The caller resolves the room; absence is rejected before any
            // conflict evaluation.
            let aula = draft.aula_id.ok_or(ServiceError::RoomRequired)?;
            for slot in candidates {
                if slot.modalidad == Modalidad::Presencial
                    && slot.aula == Some(aula)
                    && same_interval(slot, draft, horas_diarias)
                {
                    return Err(ServiceError::conflict(format!(
                        "aula {} is already booked on {} from {} to {}",
                        aula, draft.dia, draft.hora_inicio, draft.hora_salida
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Gate a new slot against the existing population under the
/// modality-specific uniqueness rules.
pub fn check_create(
    draft: &SlotDraft,
    horas_diarias: f64,
    existing: &[TimeSlot],
) -> ServiceResult<()> {
    modality_conflict(draft, horas_diarias, existing, None)
}

/// Gate an update of `current` to the values in `draft`.
///
/// Runs the modality-specific rule with the slot excluded from its own
/// check, then, when the day or times changed, the modality-agnostic
/// exact-interval check.
pub fn check_update(
    current: &TimeSlot,
    draft: &SlotDraft,
    horas_diarias: f64,
    existing: &[TimeSlot],
) -> ServiceResult<()> {
    modality_conflict(draft, horas_diarias, existing, Some(current.id_horario))?;

    let interval_changed = current.dia != draft.dia
        || current.hora_inicio != draft.hora_inicio
        || current.hora_salida != draft.hora_salida;

    if interval_changed {
        let duplicate = existing
            .iter()
            .filter(|slot| slot.is_active())
            .filter(|slot| slot.id_horario != current.id_horario)
            .find(|slot| {
                slot.dia == draft.dia
                    && slot.hora_inicio == draft.hora_inicio
                    && slot.hora_salida == draft.hora_salida
            });
        if duplicate.is_some() {
            return Err(ServiceError::conflict(format!(
                "a slot already exists on {} from {} to {}",
                draft.dia, draft.hora_inicio, draft.hora_salida
            )));
        }
    }
    Ok(())
}
